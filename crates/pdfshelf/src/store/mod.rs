//! The document store: the authoritative catalog plus the binaries it
//! references.

use std::collections::HashSet;

use serde::Serialize;

use crate::document::{Document, DocumentStatus};
use crate::error::StoreError;
use crate::upload::{CreateOutcome, CreateRequest};

pub mod collection;
pub mod filesystem;
pub mod memory;
pub mod writer;

pub use filesystem::FsDocumentStore;
pub use memory::InMemoryStore;
pub use writer::SerializedStore;

/// Operations every document store provides.
///
/// Each mutating call performs its own load, mutate and store cycle. Wrap an
/// implementation in [`SerializedStore`] when calls may arrive concurrently.
pub trait DocumentStore: Send + Sync {
    /// Returns the full collection, newest first.
    fn list(&self) -> Result<Vec<Document>, StoreError>;

    /// Stores every file of the batch independently and records the ones
    /// that succeeded with a single metadata write.
    ///
    /// Validation failures are returned as [`StoreError::Validation`] before
    /// anything is written.
    fn create(&self, request: CreateRequest) -> Result<CreateOutcome, StoreError>;

    /// Flips paid/due and returns the new status.
    fn toggle_status(&self, id: &str) -> Result<DocumentStatus, StoreError>;

    /// Returns how many documents actually changed.
    fn bulk_set_status(
        &self,
        ids: &HashSet<String>,
        status: DocumentStatus,
    ) -> Result<usize, StoreError>;

    fn delete(&self, id: &str) -> Result<DeleteOutcome, StoreError>;

    fn bulk_delete(&self, ids: &HashSet<String>) -> Result<BulkDeleteOutcome, StoreError>;

    /// Reads the stored binary of `document`.
    fn read_binary(&self, document: &Document) -> Result<Vec<u8>, StoreError>;
}

/// What happened to the binary of a deleted document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase", tag = "result", content = "error")]
pub enum FileRemoval {
    Removed,
    AlreadyAbsent,
    /// Removal failed; the metadata entry was removed regardless.
    Failed(String),
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteOutcome {
    pub id: String,
    pub file: FileRemoval,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileError {
    pub file_name: String,
    pub error: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkDeleteOutcome {
    /// False when the final metadata write failed.
    pub success: bool,
    pub message: String,
    /// Zero whenever `success` is false.
    pub metadata_removed_count: usize,
    pub files_deleted_count: usize,
    pub file_errors: Vec<FileError>,
}

impl BulkDeleteOutcome {
    pub fn committed(
        metadata_removed_count: usize,
        files_deleted_count: usize,
        file_errors: Vec<FileError>,
    ) -> Self {
        let mut message = format!(
            "{} document record(s) removed from metadata. {} physical file(s) confirmed deleted.",
            metadata_removed_count, files_deleted_count
        );
        if !file_errors.is_empty() {
            message.push_str(&format!(
                " Encountered {} error(s) deleting physical files.",
                file_errors.len()
            ));
        }

        Self {
            success: true,
            message,
            metadata_removed_count,
            files_deleted_count,
            file_errors,
        }
    }

    /// The metadata write failed: nothing counts as removed and the caller
    /// should retry the whole bulk delete.
    pub fn uncommitted(
        reason: &StoreError,
        files_deleted_count: usize,
        file_errors: Vec<FileError>,
    ) -> Self {
        Self {
            success: false,
            message: format!(
                "Failed to update metadata after attempting bulk delete: {}. Physical files may have been deleted.",
                reason
            ),
            metadata_removed_count: 0,
            files_deleted_count,
            file_errors,
        }
    }
}
