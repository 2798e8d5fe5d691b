// SPDX-License-Identifier: AGPL-3.0
// Sharesink Core - Share routing
//
// Turns an incoming share into a save: pick the payload out of the request,
// snapshot its metadata, ask the host for a destination, run the transfer and
// report a single outcome.

use crate::metadata;
use crate::provider::ContentProvider;
use crate::settings::AppSettings;
use crate::transfer;
use crate::types::{ResourceMetadata, ResourceRef};
use std::sync::Arc;

/// MIME type of shared plain text
pub const TEXT_MIME_TYPE: &str = "text/plain";
/// File name suggested when saving shared text
pub const TEXT_FILE_NAME: &str = "text.txt";

const FALLBACK_FILE_NAME: &str = "shared_file";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShareAction {
    Send,
    View,
    Other,
}

/// Incoming share request as delivered by the host
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShareIntent {
    pub action: ShareAction,
    pub mime_type: Option<String>,
    pub text: Option<String>,
    pub stream: Option<ResourceRef>,
    pub data: Option<ResourceRef>,
}

/// What a share request carries
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SharePayload {
    Text(String),
    File(ResourceRef),
    Nothing,
}

impl ShareIntent {
    pub fn payload(&self) -> SharePayload {
        match self.action {
            ShareAction::Send => {
                if self.mime_type.as_deref() == Some(TEXT_MIME_TYPE) {
                    if let Some(text) = &self.text {
                        return SharePayload::Text(text.clone());
                    }
                }
                self.stream
                    .clone()
                    .map(SharePayload::File)
                    .unwrap_or(SharePayload::Nothing)
            }
            ShareAction::View => self
                .data
                .clone()
                .map(SharePayload::File)
                .unwrap_or(SharePayload::Nothing),
            ShareAction::Other => SharePayload::Nothing,
        }
    }
}

/// Host document-creation UI
pub trait DestinationPicker {
    /// Ask the user for a new document. `None` means the user cancelled.
    fn create_document(
        &self,
        mime_type: &str,
        suggested_name: &str,
        initial_location: Option<&ResourceRef>,
    ) -> Option<ResourceRef>;
}

/// Host access to a remembered directory tree
pub trait DocumentTree {
    /// Create a new file inside `tree` without asking the user
    fn create_file(&self, tree: &ResourceRef, mime_type: &str, display_name: &str)
        -> Option<ResourceRef>;
}

/// User-visible result of a save
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveNotice {
    Saved,
    Failed,
}

impl SaveNotice {
    pub fn from_success(success: bool) -> Self {
        if success {
            SaveNotice::Saved
        } else {
            SaveNotice::Failed
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            SaveNotice::Saved => "File saved",
            SaveNotice::Failed => "Failed to save file",
        }
    }
}

pub trait Notifier {
    fn notify(&self, notice: SaveNotice);
}

/// Session behaviour derived from settings
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SessionOptions {
    pub default_save_location: Option<ResourceRef>,
    pub skip_file_picker: bool,
    pub skip_file_details: bool,
    pub show_file_preview: bool,
    pub finish_after_save: bool,
}

impl From<&AppSettings> for SessionOptions {
    fn from(settings: &AppSettings) -> Self {
        let location = settings.default_save_location.clone();
        // The picker can only be skipped when there is somewhere to save to
        let skip_file_picker = location.is_some() && settings.skip_file_picker;
        let skip_file_details = settings.skip_file_details;

        Self {
            default_save_location: location,
            skip_file_picker,
            skip_file_details,
            show_file_preview: !skip_file_details && settings.show_file_preview,
            finish_after_save: skip_file_details || skip_file_picker,
        }
    }
}

/// How a session ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionOutcome {
    Saved(ResourceRef),
    Failed(ResourceRef),
    Cancelled,
    NothingToSave,
}

/// One share being handled, from request to notification
pub struct ShareSession {
    provider: Arc<dyn ContentProvider>,
    options: SessionOptions,
    payload: SharePayload,
    metadata: Option<ResourceMetadata>,
}

impl ShareSession {
    pub fn new(
        provider: Arc<dyn ContentProvider>,
        intent: &ShareIntent,
        options: SessionOptions,
    ) -> Self {
        let payload = intent.payload();
        tracing::debug!("Share action {:?}, payload {:?}", intent.action, payload);

        let metadata = match &payload {
            SharePayload::File(resource) => {
                metadata::get_resource_metadata(provider.as_ref(), resource, options.show_file_preview)
            }
            _ => None,
        };

        Self {
            provider,
            options,
            payload,
            metadata,
        }
    }

    pub fn payload(&self) -> &SharePayload {
        &self.payload
    }

    pub fn metadata(&self) -> Option<&ResourceMetadata> {
        self.metadata.as_ref()
    }

    pub fn options(&self) -> &SessionOptions {
        &self.options
    }

    pub fn should_finish_after_save(&self) -> bool {
        self.options.finish_after_save
    }

    /// Whether there is anything this session could write
    pub fn can_save(&self) -> bool {
        match &self.payload {
            SharePayload::Text(_) => true,
            SharePayload::File(_) => self.metadata.is_some(),
            SharePayload::Nothing => false,
        }
    }

    pub fn mime_type(&self) -> &str {
        match &self.payload {
            SharePayload::Text(_) => TEXT_MIME_TYPE,
            _ => self
                .metadata
                .as_ref()
                .map(|m| m.mime_type.as_str())
                .unwrap_or(crate::provider::ANY_MIME_TYPE),
        }
    }

    /// Name offered to the picker
    pub fn suggested_name(&self) -> String {
        match &self.payload {
            SharePayload::Text(_) => TEXT_FILE_NAME.to_string(),
            SharePayload::File(resource) => self
                .metadata
                .as_ref()
                .and_then(|m| m.display_name.clone())
                .or_else(|| last_segment(resource))
                .unwrap_or_else(|| FALLBACK_FILE_NAME.to_string()),
            SharePayload::Nothing => FALLBACK_FILE_NAME.to_string(),
        }
    }

    /// Ask the host where to save. `None` means cancelled or nothing to save.
    pub fn resolve_destination(
        &self,
        picker: &dyn DestinationPicker,
        tree: &dyn DocumentTree,
    ) -> Option<ResourceRef> {
        if !self.can_save() {
            return None;
        }

        let name = self.suggested_name();
        let location = self.options.default_save_location.as_ref();

        match (&self.payload, location) {
            (SharePayload::File(_), Some(dir)) if self.options.skip_file_picker => {
                let created = tree.create_file(dir, self.mime_type(), &name);
                if created.is_none() {
                    tracing::warn!("Could not create {} in {}", name, dir);
                }
                created
            }
            _ => picker.create_document(self.mime_type(), &name, location),
        }
    }

    /// Write the payload into an already validated destination
    pub fn save_to(&self, destination: &ResourceRef) -> bool {
        match &self.payload {
            SharePayload::Text(text) => {
                transfer::save_text_to_file(self.provider.as_ref(), destination, text)
            }
            SharePayload::File(source) => {
                transfer::save_file_to_file(self.provider.as_ref(), source, destination)
            }
            SharePayload::Nothing => false,
        }
    }

    /// Run the whole flow synchronously and notify once
    pub fn run(
        &self,
        picker: &dyn DestinationPicker,
        tree: &dyn DocumentTree,
        notifier: &dyn Notifier,
    ) -> SessionOutcome {
        if !self.can_save() {
            tracing::info!("Nothing to save");
            return SessionOutcome::NothingToSave;
        }

        let Some(destination) = self.resolve_destination(picker, tree) else {
            tracing::info!("Save cancelled");
            return SessionOutcome::Cancelled;
        };

        let success = self.save_to(&destination);
        notifier.notify(SaveNotice::from_success(success));

        if success {
            SessionOutcome::Saved(destination)
        } else {
            SessionOutcome::Failed(destination)
        }
    }
}

fn last_segment(resource: &ResourceRef) -> Option<String> {
    resource
        .path_part()
        .rsplit('/')
        .next()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}
