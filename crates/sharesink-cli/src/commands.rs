// SPDX-License-Identifier: AGPL-3.0
// Sharesink CLI - Command handlers
//
// Each save runs on a blocking worker; the async side only waits for the
// outcome.

use crate::fs_provider::{file_ref, FsProvider};
use crate::picker::{CliPicker, ConsoleNotifier};
use sharesink_core::metadata::format_size;
use sharesink_core::{
    get_resource_metadata, AppError, AppSettings, ResourceMetadata, ResourceRef, SessionOptions,
    SessionOutcome, SettingsStore, ShareAction, ShareIntent, ShareSession,
};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Where and how a save should land
#[derive(Debug, Clone)]
pub struct SaveTarget {
    pub to: Option<PathBuf>,
    pub interactive: bool,
    pub preview_out: Option<PathBuf>,
}

/// Interpret a command-line source as a resource reference
pub fn parse_source(source: &str) -> ResourceRef {
    if source.contains("://") {
        ResourceRef::new(source)
    } else {
        file_ref(Path::new(source))
    }
}

pub fn file_intent(action: ShareAction, source: ResourceRef, mime_type: Option<String>) -> ShareIntent {
    let (stream, data) = match action {
        ShareAction::View => (None, Some(source)),
        _ => (Some(source), None),
    };
    ShareIntent {
        action,
        mime_type,
        text: None,
        stream,
        data,
    }
}

pub fn text_intent(text: String) -> ShareIntent {
    ShareIntent {
        action: ShareAction::Send,
        mime_type: Some(sharesink_core::routing::TEXT_MIME_TYPE.to_string()),
        text: Some(text),
        stream: None,
        data: None,
    }
}

/// Handle one share end to end on a background worker
pub async fn handle_share(
    intent: ShareIntent,
    settings: AppSettings,
    target: SaveTarget,
) -> Result<SessionOutcome, AppError> {
    if intent.action == ShareAction::View && !settings.intercept_view_intents {
        return Err(AppError::InvalidConfig(
            "View requests are disabled; enable interceptViewIntents first".to_string(),
        ));
    }

    let worker = tokio::task::spawn_blocking(move || {
        let provider = Arc::new(FsProvider::new());
        let options = SessionOptions::from(&settings);
        let session = ShareSession::new(provider.clone(), &intent, options);

        if !session.options().skip_file_details {
            if let Some(meta) = session.metadata() {
                print_details(meta);
                if let (Some(preview), Some(out)) = (&meta.preview_image, &target.preview_out) {
                    write_preview(out, &preview.png);
                }
            }
        }

        let picker = CliPicker::new(target.to.clone(), target.interactive);
        session.run(&picker, provider.as_ref(), &ConsoleNotifier)
    });

    let outcome = worker
        .await
        .map_err(|e| AppError::Io(format!("Save worker failed: {}", e)))?;

    match &outcome {
        SessionOutcome::Saved(dest) => tracing::info!("Saved to {}", dest),
        SessionOutcome::Failed(dest) => tracing::error!("Failed to save to {}", dest),
        SessionOutcome::Cancelled => tracing::info!("Cancelled"),
        SessionOutcome::NothingToSave => tracing::warn!("Nothing to save"),
    }
    Ok(outcome)
}

/// Print metadata for a source without saving it
pub async fn handle_info(
    source: ResourceRef,
    with_preview: bool,
    preview_out: Option<PathBuf>,
) -> Result<(), AppError> {
    let meta = tokio::task::spawn_blocking(move || {
        get_resource_metadata(&FsProvider::new(), &source, with_preview)
            .ok_or_else(|| AppError::NotFound(source.to_string()))
    })
    .await
    .map_err(|e| AppError::Io(format!("Metadata worker failed: {}", e)))??;

    print_details(&meta);
    if let (Some(preview), Some(out)) = (&meta.preview_image, &preview_out) {
        write_preview(out, &preview.png);
    }
    Ok(())
}

fn print_details(meta: &ResourceMetadata) {
    println!("Name: {}", meta.display_name.as_deref().unwrap_or("(unknown)"));
    println!("Type: {}", meta.mime_type);
    match meta.size_bytes {
        Some(size) => println!("Size: {} ({} bytes)", format_size(size), size),
        None => println!("Size: (unknown)"),
    }
    if let Some(preview) = &meta.preview_image {
        println!("Preview: {}x{}", preview.width, preview.height);
    }
}

fn write_preview(path: &Path, png: &[u8]) {
    match fs::write(path, png) {
        Ok(()) => println!("Preview written to {}", path.display()),
        Err(e) => tracing::warn!("Failed to write preview {:?}: {}", path, e),
    }
}

/// Settings changes requested on the command line
#[derive(Debug, Default, Clone)]
pub struct SettingsChange {
    pub skip_file_picker: Option<bool>,
    pub skip_file_details: Option<bool>,
    pub show_file_preview: Option<bool>,
    pub intercept_view_intents: Option<bool>,
    pub default_save_location: Option<PathBuf>,
    pub clear_default_save_location: bool,
}

pub fn apply_settings(store: &SettingsStore, change: SettingsChange) -> Result<(), AppError> {
    let provider = FsProvider::new();

    // The location needs a write grant, so it goes first; a bad directory
    // leaves every other setting untouched.
    if change.clear_default_save_location {
        store.clear_default_save_location(&provider)?;
    } else if let Some(dir) = change.default_save_location {
        store.update_default_save_location(Some(file_ref(&dir)), &provider)?;
    }

    if let Some(value) = change.skip_file_picker {
        store.set_skip_file_picker(value)?;
    }
    if let Some(value) = change.skip_file_details {
        store.set_skip_file_details(value)?;
    }
    if let Some(value) = change.show_file_preview {
        store.set_show_file_preview(value)?;
    }
    if let Some(value) = change.intercept_view_intents {
        store.set_intercept_view_intents(value)?;
    }
    Ok(())
}

pub fn show_settings(store: &SettingsStore) -> Result<(), AppError> {
    println!("# {}", store.path().display());
    println!("{}", serde_json::to_string_pretty(&store.get())?);
    Ok(())
}
