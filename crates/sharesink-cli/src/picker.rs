// SPDX-License-Identifier: AGPL-3.0
// Sharesink CLI - Destination picker and notices

use crate::fs_provider::{create_unique_file, file_ref, local_path};
use sharesink_core::{DestinationPicker, Notifier, ResourceRef, SaveNotice};
use std::fs::OpenOptions;
use std::io::{self, BufRead, ErrorKind, Write};
use std::path::{Path, PathBuf};

/// Picks a destination from a command-line target or by prompting
pub struct CliPicker {
    target: Option<PathBuf>,
    interactive: bool,
}

impl CliPicker {
    pub fn new(target: Option<PathBuf>, interactive: bool) -> Self {
        Self { target, interactive }
    }

    /// Ask for a destination. An empty answer keeps `start_dir`.
    fn prompt(&self, start_dir: &Path, suggested_name: &str) -> Option<PathBuf> {
        if !self.interactive {
            return None;
        }

        print!(
            "Save as [{}] (empty to accept, '-' to cancel): ",
            start_dir.join(suggested_name).display()
        );
        io::stdout().flush().ok()?;

        let mut line = String::new();
        io::stdin().lock().read_line(&mut line).ok()?;
        let answer = line.trim();

        match answer {
            "-" => None,
            "" => Some(start_dir.to_path_buf()),
            other => Some(PathBuf::from(other)),
        }
    }
}

/// Turn a chosen path into a freshly created document.
///
/// A directory gets a unique file named after `suggested_name`; a file path
/// must not exist yet.
fn create_new_document(chosen: &Path, suggested_name: &str) -> Option<PathBuf> {
    if chosen.is_dir() {
        return match create_unique_file(chosen, suggested_name) {
            Ok(path) => Some(path),
            Err(e) => {
                tracing::warn!("Failed to create {} in {:?}: {}", suggested_name, chosen, e);
                None
            }
        };
    }

    if let Some(parent) = chosen.parent().filter(|p| !p.as_os_str().is_empty()) {
        if !parent.is_dir() {
            tracing::warn!("Destination directory {:?} does not exist", parent);
            return None;
        }
    }

    match OpenOptions::new().write(true).create_new(true).open(chosen) {
        Ok(_) => Some(chosen.to_path_buf()),
        Err(e) if e.kind() == ErrorKind::AlreadyExists => {
            tracing::warn!("{:?} already exists; refusing to overwrite it", chosen);
            eprintln!("Refusing to overwrite existing file {}", chosen.display());
            None
        }
        Err(e) => {
            tracing::warn!("Failed to create {:?}: {}", chosen, e);
            None
        }
    }
}

impl DestinationPicker for CliPicker {
    fn create_document(
        &self,
        mime_type: &str,
        suggested_name: &str,
        initial_location: Option<&ResourceRef>,
    ) -> Option<ResourceRef> {
        tracing::debug!("Picking destination for {} ({})", suggested_name, mime_type);

        let chosen = match &self.target {
            Some(target) => target.clone(),
            None => {
                let start_dir = initial_location
                    .and_then(|loc| local_path(loc).ok())
                    .unwrap_or_else(|| PathBuf::from("."));
                self.prompt(&start_dir, suggested_name)?
            }
        };

        create_new_document(&chosen, suggested_name).map(|path| file_ref(&path))
    }
}

/// Prints one line per finished save
pub struct ConsoleNotifier;

impl Notifier for ConsoleNotifier {
    fn notify(&self, notice: SaveNotice) {
        match notice {
            SaveNotice::Saved => println!("{}", notice.message()),
            SaveNotice::Failed => eprintln!("{}", notice.message()),
        }
    }
}
