// SPDX-License-Identifier: AGPL-3.0
// Sharesink Core - Type definitions

use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque reference to a shared or writable resource (a URI on the host)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResourceRef(String);

impl ResourceRef {
    pub fn new(uri: impl Into<String>) -> Self {
        Self(uri.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// URI scheme, if the reference has one (`file`, `content`, ...)
    pub fn scheme(&self) -> Option<&str> {
        self.0
            .split_once("://")
            .map(|(scheme, _)| scheme)
            .filter(|s| !s.is_empty())
    }

    /// Everything after `scheme://`, or the whole reference when there is no scheme
    pub fn path_part(&self) -> &str {
        self.0
            .split_once("://")
            .map(|(_, rest)| rest)
            .unwrap_or(&self.0)
    }
}

impl fmt::Display for ResourceRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ResourceRef {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for ResourceRef {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Decoded preview of an image resource, re-encoded as PNG
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreviewImage {
    pub width: u32,
    pub height: u32,
    pub png: Vec<u8>,
}

/// Snapshot of a shared item, taken once when the share is received
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceMetadata {
    /// Name reported by the provider, if any
    pub display_name: Option<String>,
    /// MIME type reported by the provider, `*/*` when unknown
    pub mime_type: String,
    /// Size in bytes reported by the provider, if any
    pub size_bytes: Option<u64>,
    /// Optional decoded preview
    pub preview_image: Option<PreviewImage>,
}

/// Error types for the application
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("No exportable type for virtual document: {0}")]
    NoExportableType(String),

    #[error("I/O error: {0}")]
    Io(String),

    #[error("Preview decode failed: {0}")]
    Decode(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

impl AppError {
    /// Whether the error means the resource could not be resolved to a stream
    pub fn is_not_found(&self) -> bool {
        matches!(self, AppError::NotFound(_) | AppError::NoExportableType(_))
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::NotFound => AppError::NotFound(err.to_string()),
            _ => AppError::Io(err.to_string()),
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}
