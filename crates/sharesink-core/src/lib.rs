// SPDX-License-Identifier: AGPL-3.0
// Sharesink Core - Shared logic for all front ends
//
// This crate provides:
// - Source resolution, including virtual documents exported by type
// - The transfer engine copying a source into a destination
// - Metadata and preview snapshots of shared items
// - Share routing from an incoming request to a single save notice
// - SettingsStore for persistent preferences
//
// The host (storage, picker UI, permissions) is reached through traits.

pub mod metadata;
pub mod provider;
pub mod resolver;
pub mod routing;
pub mod settings;
pub mod transfer;
pub mod types;

#[cfg(test)]
mod testing;

// Re-export commonly used items
pub use metadata::get_resource_metadata;
pub use provider::{ColumnValue, ContentProvider, DestinationStream, ProviderRow, SourceStream};
pub use resolver::{is_virtual, open_source_stream};
pub use routing::{
    DestinationPicker, DocumentTree, Notifier, SaveNotice, SessionOptions, SessionOutcome,
    ShareAction, ShareIntent, SharePayload, ShareSession,
};
pub use settings::{AppSettings, PermissionGrants, SettingsStore};
pub use transfer::{copy, save_file_to_file, save_text_to_file, try_copy};
pub use types::{AppError, PreviewImage, ResourceMetadata, ResourceRef};
