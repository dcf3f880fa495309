//! In-memory mutations on a loaded collection, shared by every store
//! implementation.

use std::collections::HashSet;

use crate::document::{Document, DocumentStatus};
use crate::error::StoreError;

pub fn find<'a>(documents: &'a [Document], id: &str) -> Result<&'a Document, StoreError> {
    documents
        .iter()
        .find(|doc| doc.id == id)
        .ok_or_else(|| StoreError::NotFound(id.to_string()))
}

/// Flips the status of `id` and returns the new value.
pub fn toggle_status(documents: &mut [Document], id: &str) -> Result<DocumentStatus, StoreError> {
    let doc = documents
        .iter_mut()
        .find(|doc| doc.id == id)
        .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
    doc.status = doc.status.toggled();
    Ok(doc.status)
}

/// Sets `status` on every listed document that differs, returning the ids
/// actually changed.
pub fn set_status(
    documents: &mut [Document],
    ids: &HashSet<String>,
    status: DocumentStatus,
) -> Vec<String> {
    documents
        .iter_mut()
        .filter(|doc| ids.contains(&doc.id) && doc.status != status)
        .map(|doc| {
            doc.status = status;
            doc.id.clone()
        })
        .collect()
}

/// Splits the collection into (kept, removed), preserving order on both sides.
pub fn partition(
    documents: Vec<Document>,
    ids: &HashSet<String>,
) -> (Vec<Document>, Vec<Document>) {
    documents
        .into_iter()
        .partition(|doc| !ids.contains(&doc.id))
}
