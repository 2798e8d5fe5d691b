// SPDX-License-Identifier: AGPL-3.0
// Sharesink CLI - Filesystem content provider
//
// `file://` references are document-style. A document with a sibling
// `<name>.exports.json` manifest is virtual: it has no bytes of its own and
// is exported through the files the manifest lists.

use serde::{Deserialize, Serialize};
use sharesink_core::provider::{
    ANY_MIME_TYPE, COLUMN_DISPLAY_NAME, COLUMN_FLAGS, COLUMN_SIZE, FLAG_VIRTUAL_DOCUMENT,
};
use sharesink_core::{
    AppError, ColumnValue, ContentProvider, DestinationStream, DocumentTree, PermissionGrants,
    ProviderRow, ResourceRef, SourceStream,
};
use std::fs::{self, File, OpenOptions};
use std::io::{self, ErrorKind};
use std::path::{Path, PathBuf};

const MANIFEST_SUFFIX: &str = ".exports.json";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportManifest {
    /// Declared type of the virtual document itself
    #[serde(default)]
    pub mime_type: Option<String>,
    pub exports: Vec<ExportEntry>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportEntry {
    pub mime_type: String,
    /// Relative paths resolve against the manifest's directory
    pub path: PathBuf,
}

/// Convert a path into a `file://` reference
pub fn file_ref(path: &Path) -> ResourceRef {
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .map(|cwd| cwd.join(path))
            .unwrap_or_else(|_| path.to_path_buf())
    };
    ResourceRef::new(format!("file://{}", absolute.display()))
}

/// Local path a reference points at
pub fn local_path(resource: &ResourceRef) -> io::Result<PathBuf> {
    match resource.scheme() {
        None | Some("file") => Ok(PathBuf::from(resource.path_part())),
        Some(other) => Err(io::Error::new(
            ErrorKind::NotFound,
            format!("unsupported scheme: {}", other),
        )),
    }
}

fn mime_matches(filter: &str, mime_type: &str) -> bool {
    if filter == ANY_MIME_TYPE {
        return true;
    }
    match filter.strip_suffix("/*") {
        Some(major) => mime_type
            .split_once('/')
            .map(|(m, _)| m.eq_ignore_ascii_case(major))
            .unwrap_or(false),
        None => filter.eq_ignore_ascii_case(mime_type),
    }
}

fn split_file_name(name: &str) -> (&str, &str) {
    if let Some((stem, ext)) = name.rsplit_once('.') {
        if !stem.is_empty() {
            return (stem, ext);
        }
    }
    (name, "")
}

fn sanitize_file_name(name: &str) -> String {
    let file_name = Path::new(name.trim())
        .file_name()
        .and_then(|n| n.to_str())
        .map(str::trim)
        .filter(|n| !n.is_empty() && *n != "." && *n != "..");

    file_name.unwrap_or("shared_file").to_string()
}

fn size_column(len: u64) -> ColumnValue {
    i64::try_from(len)
        .map(ColumnValue::Integer)
        .unwrap_or(ColumnValue::Null)
}

/// Create a new empty file for `name` in `dir`, appending " (n)" to the stem
/// until the name is free. Existing files are never opened.
pub fn create_unique_file(dir: &Path, name: &str) -> io::Result<PathBuf> {
    let base_name = sanitize_file_name(name);
    let (stem, ext) = split_file_name(&base_name);

    for index in 0..1000 {
        let candidate = if index == 0 {
            base_name.clone()
        } else if ext.is_empty() {
            format!("{} ({})", stem, index)
        } else {
            format!("{} ({}).{}", stem, index, ext)
        };

        let path = dir.join(&candidate);
        match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(_) => return Ok(path),
            Err(e) if e.kind() == ErrorKind::AlreadyExists => continue,
            Err(e) => return Err(e),
        }
    }

    Err(io::Error::new(
        ErrorKind::AlreadyExists,
        format!("too many filename conflicts for {} in {:?}", base_name, dir),
    ))
}

/// Content provider over the local filesystem
#[derive(Debug, Default, Clone)]
pub struct FsProvider;

impl FsProvider {
    pub fn new() -> Self {
        Self
    }

    fn manifest_path(path: &Path) -> PathBuf {
        let mut name = path.as_os_str().to_os_string();
        name.push(MANIFEST_SUFFIX);
        PathBuf::from(name)
    }

    fn load_manifest(path: &Path) -> io::Result<Option<ExportManifest>> {
        let manifest_path = Self::manifest_path(path);
        if !manifest_path.exists() {
            return Ok(None);
        }

        let content = fs::read_to_string(&manifest_path)?;
        let mut manifest: ExportManifest = serde_json::from_str(&content)
            .map_err(|e| io::Error::new(ErrorKind::InvalidData, e))?;

        let base = manifest_path.parent().unwrap_or(Path::new("."));
        for entry in manifest.exports.iter_mut() {
            if entry.path.is_relative() {
                entry.path = base.join(&entry.path);
            }
        }
        Ok(Some(manifest))
    }
}

impl ContentProvider for FsProvider {
    fn is_document_uri(&self, resource: &ResourceRef) -> bool {
        resource.scheme() == Some("file")
    }

    fn get_type(&self, resource: &ResourceRef) -> Option<String> {
        let path = local_path(resource).ok()?;
        if let Ok(Some(manifest)) = Self::load_manifest(&path) {
            if let Some(declared) = manifest.mime_type {
                return Some(declared);
            }
        }
        mime_guess::from_path(&path).first().map(|m| m.to_string())
    }

    fn query(&self, resource: &ResourceRef, columns: &[&str]) -> io::Result<Option<ProviderRow>> {
        let path = local_path(resource)?;
        let manifest = Self::load_manifest(&path)?;
        let file_meta = fs::metadata(&path).ok().filter(|m| m.is_file());

        if manifest.is_none() && file_meta.is_none() {
            return Ok(None);
        }

        let mut row = ProviderRow::new();
        for column in columns {
            let value = match *column {
                COLUMN_DISPLAY_NAME => path
                    .file_name()
                    .map(|n| ColumnValue::Text(n.to_string_lossy().into_owned()))
                    .unwrap_or(ColumnValue::Null),
                COLUMN_SIZE => match (&manifest, &file_meta) {
                    (None, Some(meta)) => size_column(meta.len()),
                    _ => ColumnValue::Null,
                },
                COLUMN_FLAGS => ColumnValue::Integer(if manifest.is_some() {
                    FLAG_VIRTUAL_DOCUMENT
                } else {
                    0
                }),
                _ => ColumnValue::Null,
            };
            row.insert(column, value);
        }
        Ok(Some(row))
    }

    fn stream_types(&self, resource: &ResourceRef, filter: &str) -> io::Result<Option<Vec<String>>> {
        let path = local_path(resource)?;
        Ok(Self::load_manifest(&path)?.map(|manifest| {
            manifest
                .exports
                .into_iter()
                .map(|e| e.mime_type)
                .filter(|m| mime_matches(filter, m))
                .collect()
        }))
    }

    fn open_typed_stream(
        &self,
        resource: &ResourceRef,
        mime_type: &str,
    ) -> io::Result<Option<SourceStream>> {
        let path = local_path(resource)?;
        let Some(manifest) = Self::load_manifest(&path)? else {
            return Ok(None);
        };

        match manifest.exports.into_iter().find(|e| e.mime_type == mime_type) {
            Some(entry) => Ok(Some(Box::new(File::open(entry.path)?))),
            None => Ok(None),
        }
    }

    fn open_input(&self, resource: &ResourceRef) -> io::Result<SourceStream> {
        let path = local_path(resource)?;
        Ok(Box::new(File::open(path)?))
    }

    fn open_output(&self, resource: &ResourceRef) -> io::Result<DestinationStream> {
        let path = local_path(resource)?;
        Ok(Box::new(File::create(path)?))
    }
}

impl DocumentTree for FsProvider {
    fn create_file(&self, tree: &ResourceRef, _mime_type: &str, display_name: &str) -> Option<ResourceRef> {
        let dir = local_path(tree).ok()?;
        match create_unique_file(&dir, display_name) {
            Ok(path) => Some(file_ref(&path)),
            Err(e) => {
                tracing::warn!("Failed to create {} in {}: {}", display_name, tree, e);
                None
            }
        }
    }
}

impl PermissionGrants for FsProvider {
    fn take_write_grant(&self, location: &ResourceRef) -> Result<(), AppError> {
        let dir = local_path(location)?;
        let meta = fs::metadata(&dir)?;
        if !meta.is_dir() {
            return Err(AppError::InvalidConfig(format!("{} is not a directory", location)));
        }
        if meta.permissions().readonly() {
            return Err(AppError::InvalidConfig(format!("{} is read-only", location)));
        }
        tracing::debug!("Write access confirmed for {}", location);
        Ok(())
    }

    fn release_grant(&self, location: &ResourceRef) -> Result<(), AppError> {
        tracing::debug!("Released {}", location);
        Ok(())
    }
}
