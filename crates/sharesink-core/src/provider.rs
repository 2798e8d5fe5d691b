// SPDX-License-Identifier: AGPL-3.0
// Sharesink Core - Host content provider interface
//
// The core never opens storage itself. Everything it reads or writes goes
// through a ContentProvider implemented by the host.

use crate::types::ResourceRef;
use std::collections::HashMap;
use std::io::{self, Read, Write};

/// Display name column of an openable resource
pub const COLUMN_DISPLAY_NAME: &str = "_display_name";
/// Size column of an openable resource, in bytes
pub const COLUMN_SIZE: &str = "_size";
/// Document flags column
pub const COLUMN_FLAGS: &str = "flags";

/// Flag bit marking a document that has no direct byte stream
pub const FLAG_VIRTUAL_DOCUMENT: i64 = 1 << 9;

/// Wildcard filter used when asking a provider what it can export
pub const ANY_MIME_TYPE: &str = "*/*";

pub type SourceStream = Box<dyn Read + Send>;
pub type DestinationStream = Box<dyn Write + Send>;

/// A single value returned by a provider query
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColumnValue {
    Null,
    Integer(i64),
    Text(String),
}

impl ColumnValue {
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            ColumnValue::Integer(v) => Some(*v),
            ColumnValue::Text(s) => s.trim().parse().ok(),
            ColumnValue::Null => None,
        }
    }

    pub fn as_text(&self) -> Option<String> {
        match self {
            ColumnValue::Text(s) => Some(s.clone()),
            ColumnValue::Integer(v) => Some(v.to_string()),
            ColumnValue::Null => None,
        }
    }
}

/// One row of a provider query, keyed by column name
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProviderRow {
    columns: HashMap<String, ColumnValue>,
}

impl ProviderRow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, column: &str, value: ColumnValue) -> Self {
        self.columns.insert(column.to_string(), value);
        self
    }

    pub fn insert(&mut self, column: &str, value: ColumnValue) {
        self.columns.insert(column.to_string(), value);
    }

    /// Value of a column; absent columns read as `None`
    pub fn get(&self, column: &str) -> Option<&ColumnValue> {
        self.columns.get(column)
    }

    pub fn get_i64(&self, column: &str) -> Option<i64> {
        self.get(column).and_then(ColumnValue::as_i64)
    }

    pub fn get_text(&self, column: &str) -> Option<String> {
        self.get(column).and_then(ColumnValue::as_text)
    }
}

/// Host-side access to shared resources
pub trait ContentProvider: Send + Sync {
    /// Whether the reference is a document-style URI known to the document framework
    fn is_document_uri(&self, resource: &ResourceRef) -> bool;

    /// MIME type the host reports for the resource
    fn get_type(&self, resource: &ResourceRef) -> Option<String>;

    /// Query the requested columns. `Ok(None)` means no row.
    fn query(&self, resource: &ResourceRef, columns: &[&str]) -> io::Result<Option<ProviderRow>>;

    /// MIME types the provider can materialise for the resource, in provider order.
    /// `Ok(None)` means the provider does not advertise any.
    fn stream_types(&self, resource: &ResourceRef, filter: &str) -> io::Result<Option<Vec<String>>>;

    /// Open a stream of the resource exported as `mime_type`
    fn open_typed_stream(
        &self,
        resource: &ResourceRef,
        mime_type: &str,
    ) -> io::Result<Option<SourceStream>>;

    /// Open the resource's own byte stream for reading
    fn open_input(&self, resource: &ResourceRef) -> io::Result<SourceStream>;

    /// Open a validated destination for writing
    fn open_output(&self, resource: &ResourceRef) -> io::Result<DestinationStream>;
}
