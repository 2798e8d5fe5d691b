// SPDX-License-Identifier: AGPL-3.0
// Sharesink Core - Metadata and preview extraction
//
// Best effort only. Missing columns become empty fields and any preview
// failure degrades to "no preview".

use crate::provider::{ContentProvider, ANY_MIME_TYPE, COLUMN_DISPLAY_NAME, COLUMN_SIZE};
use crate::types::{AppError, PreviewImage, ResourceMetadata, ResourceRef};
use image::{GenericImageView, ImageFormat};
use std::io::{Cursor, Read};

/// Longest edge of a generated preview, in pixels
pub const PREVIEW_MAX_EDGE: u32 = 512;

/// Sources larger than this are not decoded for preview
const PREVIEW_MAX_SOURCE_BYTES: u64 = 32 * 1024 * 1024;

/// Take a metadata snapshot of a shared resource.
///
/// Returns `None` when the provider has no row for the resource.
pub fn get_resource_metadata(
    provider: &dyn ContentProvider,
    resource: &ResourceRef,
    with_preview: bool,
) -> Option<ResourceMetadata> {
    let mime_type = provider
        .get_type(resource)
        .unwrap_or_else(|| ANY_MIME_TYPE.to_string());

    let row = match provider.query(resource, &[COLUMN_DISPLAY_NAME, COLUMN_SIZE]) {
        Ok(Some(row)) => row,
        Ok(None) => {
            tracing::warn!("Provider returned no metadata for {}", resource);
            return None;
        }
        Err(e) => {
            tracing::warn!("Metadata query failed for {}: {}", resource, e);
            return None;
        }
    };

    let display_name = row.get_text(COLUMN_DISPLAY_NAME);
    let size_bytes = row
        .get_i64(COLUMN_SIZE)
        .and_then(|size| u64::try_from(size).ok());

    let preview_image = if with_preview {
        match load_preview(provider, resource) {
            Ok(preview) => Some(preview),
            Err(e) => {
                tracing::warn!("No preview for {}: {}", resource, e);
                None
            }
        }
    } else {
        None
    };

    Some(ResourceMetadata {
        display_name,
        mime_type,
        size_bytes,
        preview_image,
    })
}

fn load_preview(
    provider: &dyn ContentProvider,
    resource: &ResourceRef,
) -> Result<PreviewImage, AppError> {
    let mut bytes = Vec::new();
    provider
        .open_input(resource)?
        .take(PREVIEW_MAX_SOURCE_BYTES)
        .read_to_end(&mut bytes)?;

    render_preview(&bytes, PREVIEW_MAX_EDGE)
}

/// Decode image bytes and re-encode them as a PNG no larger than `max_edge`
pub fn render_preview(bytes: &[u8], max_edge: u32) -> Result<PreviewImage, AppError> {
    let decoded =
        image::load_from_memory(bytes).map_err(|e| AppError::Decode(e.to_string()))?;

    let (width, height) = decoded.dimensions();
    let scaled = if width > max_edge || height > max_edge {
        decoded.thumbnail(max_edge, max_edge)
    } else {
        decoded
    };

    let mut png = Vec::new();
    scaled
        .write_to(&mut Cursor::new(&mut png), ImageFormat::Png)
        .map_err(|e| AppError::Decode(e.to_string()))?;

    let (width, height) = scaled.dimensions();
    Ok(PreviewImage { width, height, png })
}

/// Human-readable size, e.g. `33.6 MiB`
pub fn format_size(bytes: u64) -> String {
    const UNITS: [&str; 5] = ["B", "KiB", "MiB", "GiB", "TiB"];

    if bytes < 1024 {
        return format!("{} B", bytes);
    }

    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    format!("{:.1} {}", value, UNITS[unit])
}
