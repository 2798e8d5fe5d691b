// SPDX-License-Identifier: AGPL-3.0
// Sharesink Core - Source resolution
//
// Turns a shared reference into a readable stream. Virtual documents have no
// byte stream of their own and are exported through the first type their
// provider advertises.

use crate::provider::{
    ContentProvider, SourceStream, ANY_MIME_TYPE, COLUMN_FLAGS, FLAG_VIRTUAL_DOCUMENT,
};
use crate::types::{AppError, ResourceRef};

/// Check whether a reference is a virtual document.
///
/// Non-document references short-circuit without a provider query. A failed
/// query or an empty result counts as "not virtual".
pub fn is_virtual(provider: &dyn ContentProvider, resource: &ResourceRef) -> bool {
    if !provider.is_document_uri(resource) {
        return false;
    }

    let flags = match provider.query(resource, &[COLUMN_FLAGS]) {
        Ok(Some(row)) => row.get_i64(COLUMN_FLAGS).unwrap_or(0),
        Ok(None) => {
            tracing::debug!("No flags row for {}", resource);
            0
        }
        Err(e) => {
            tracing::warn!("Flags query failed for {}: {}", resource, e);
            0
        }
    };

    flags & FLAG_VIRTUAL_DOCUMENT != 0
}

/// MIME type a virtual document would be exported as, if it advertises any
pub fn negotiated_type(provider: &dyn ContentProvider, resource: &ResourceRef) -> Option<String> {
    match provider.stream_types(resource, ANY_MIME_TYPE) {
        Ok(Some(types)) => types.into_iter().next(),
        Ok(None) => None,
        Err(e) => {
            tracing::warn!("Type negotiation failed for {}: {}", resource, e);
            None
        }
    }
}

/// Open a readable stream for a shared reference
pub fn open_source_stream(
    provider: &dyn ContentProvider,
    resource: &ResourceRef,
) -> Result<SourceStream, AppError> {
    if is_virtual(provider, resource) {
        tracing::debug!("{} is a virtual document", resource);
        return open_virtual_stream(provider, resource);
    }

    provider.open_input(resource).map_err(AppError::from)
}

fn open_virtual_stream(
    provider: &dyn ContentProvider,
    resource: &ResourceRef,
) -> Result<SourceStream, AppError> {
    let mime_type = negotiated_type(provider, resource)
        .ok_or_else(|| AppError::NoExportableType(resource.to_string()))?;

    tracing::debug!("Exporting {} as {}", resource, mime_type);

    match provider.open_typed_stream(resource, &mime_type) {
        Ok(Some(stream)) => Ok(stream),
        Ok(None) => Err(AppError::NotFound(format!(
            "{} has no stream for {}",
            resource, mime_type
        ))),
        Err(e) => Err(e.into()),
    }
}
