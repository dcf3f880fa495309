//! Upload requests, the validation policy they must pass, and the itemized
//! outcome of a batch upload.

use std::path::Path;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::document::{parse_related_persons, Document, DocumentStatus};
use crate::error::{StorageError, ValidationErrors};
use crate::week;

pub const PDF_MIME_TYPE: &str = "application/pdf";

/// Limits enforced on every upload batch.
///
/// Checks are policy only: the declared MIME type is trusted, content is not
/// sniffed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadPolicy {
    #[serde(default = "default_max_files")]
    pub max_files: usize,
    #[serde(default = "default_max_file_size")]
    pub max_file_size: u64,
    #[serde(default = "default_allowed_mime_types")]
    pub allowed_mime_types: Vec<String>,
}

fn default_max_files() -> usize {
    20
}

fn default_max_file_size() -> u64 {
    10 * 1024 * 1024
}

fn default_allowed_mime_types() -> Vec<String> {
    vec![PDF_MIME_TYPE.to_string()]
}

impl Default for UploadPolicy {
    fn default() -> Self {
        Self {
            max_files: default_max_files(),
            max_file_size: default_max_file_size(),
            allowed_mime_types: default_allowed_mime_types(),
        }
    }
}

/// One file submitted for upload.
#[derive(Debug, Clone)]
pub struct UploadFile {
    pub bytes: Vec<u8>,
    pub declared_name: String,
    pub mime_type: String,
}

impl UploadFile {
    pub fn new(
        declared_name: impl Into<String>,
        mime_type: impl Into<String>,
        bytes: Vec<u8>,
    ) -> Self {
        Self {
            bytes,
            declared_name: declared_name.into(),
            mime_type: mime_type.into(),
        }
    }

    /// Reads a local file, guessing the MIME type from its extension.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, StorageError> {
        let path = path.as_ref();
        let bytes = std::fs::read(path).map_err(|e| StorageError::ReadFile {
            path: path.to_path_buf(),
            source: e,
        })?;
        let declared_name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .ok_or_else(|| StorageError::InvalidFileName(path.display().to_string()))?;
        let mime_type = mime_guess::from_path(path)
            .first_or_octet_stream()
            .essence_str()
            .to_string();

        Ok(Self {
            bytes,
            declared_name,
            mime_type,
        })
    }

    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }
}

/// A batch upload: the files plus the metadata shared by all of them.
#[derive(Debug, Clone)]
pub struct CreateRequest {
    pub files: Vec<UploadFile>,
    pub week: String,
    pub status: DocumentStatus,
    /// Comma-separated names.
    pub related_persons: String,
}

/// Metadata shared by every document of a validated batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreparedBatch {
    pub week: String,
    pub status: DocumentStatus,
    pub related_persons: Vec<String>,
}

impl UploadPolicy {
    /// Checks the whole batch, collecting every problem before failing.
    /// Relative weeks are resolved against `today`.
    pub fn validate(
        &self,
        request: &CreateRequest,
        today: NaiveDate,
    ) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();

        if request.files.is_empty() {
            errors.add("files", "At least one PDF file is required.");
        }
        if request.files.len() > self.max_files {
            errors.add(
                "files",
                format!(
                    "You can upload a maximum of {} files at a time.",
                    self.max_files
                ),
            );
        }
        if let Some(file) = request
            .files
            .iter()
            .find(|f| !self.allowed_mime_types.iter().any(|m| m == &f.mime_type))
        {
            errors.add(
                "files",
                format!(
                    "Only PDF files are allowed ('{}' is {}).",
                    file.declared_name, file.mime_type
                ),
            );
        }
        if let Some(file) = request
            .files
            .iter()
            .find(|f| f.size() > self.max_file_size)
        {
            errors.add(
                "files",
                format!(
                    "Each file must be {} or less ('{}' is {} bytes).",
                    human_size(self.max_file_size),
                    file.declared_name,
                    file.size()
                ),
            );
        }
        if request
            .files
            .iter()
            .any(|f| f.declared_name.trim().is_empty())
        {
            errors.add("files", "Every file must have a name.");
        }

        if request.week.trim().is_empty() {
            errors.add("week", "Week selection is required.");
        } else if week::canonicalize(&request.week, today).is_none() {
            errors.add(
                "week",
                format!("Unrecognized week '{}'.", request.week.trim()),
            );
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Validates the batch and resolves the shared metadata. Legacy week
    /// identifiers are migrated to their canonical Monday against `today`.
    pub fn prepare(
        &self,
        request: &CreateRequest,
        today: NaiveDate,
    ) -> Result<PreparedBatch, ValidationErrors> {
        self.validate(request, today)?;

        let week = week::canonicalize(&request.week, today).ok_or_else(|| {
            let mut errors = ValidationErrors::new();
            errors.add("week", format!("Unrecognized week '{}'.", request.week.trim()));
            errors
        })?;

        Ok(PreparedBatch {
            week,
            status: request.status,
            related_persons: parse_related_persons(&request.related_persons),
        })
    }
}

fn human_size(bytes: u64) -> String {
    const MIB: u64 = 1024 * 1024;
    if bytes % MIB == 0 {
        format!("{}MB", bytes / MIB)
    } else {
        format!("{} bytes", bytes)
    }
}

/// Result for one file of a batch upload.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileOutcome {
    /// The name the file was submitted under.
    pub file_name: String,
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub document: Option<Document>,
}

impl FileOutcome {
    pub fn stored(file_name: &str, document: Document) -> Self {
        Self {
            file_name: file_name.to_string(),
            success: true,
            message: "Uploaded successfully.".to_string(),
            document: Some(document),
        }
    }

    pub fn failed(file_name: &str, message: impl Into<String>) -> Self {
        Self {
            file_name: file_name.to_string(),
            success: false,
            message: message.into(),
            document: None,
        }
    }
}

/// Overall result of a batch upload.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOutcome {
    /// True only when every file was stored and recorded.
    pub success: bool,
    pub message: String,
    pub results: Vec<FileOutcome>,
}

impl CreateOutcome {
    /// Summarizes per-file results after the metadata write succeeded.
    pub fn recorded(results: Vec<FileOutcome>) -> Self {
        let succeeded = results.iter().filter(|r| r.success).count();
        let failed = results.len() - succeeded;

        let message = if failed == 0 {
            if results.len() > 1 {
                "All files uploaded successfully!".to_string()
            } else {
                "File uploaded successfully!".to_string()
            }
        } else {
            format!(
                "{} file(s) uploaded successfully. {} file(s) failed. Check details below.",
                succeeded, failed
            )
        };

        Self {
            success: failed == 0,
            message,
            results,
        }
    }

    /// Downgrades every stored file to failed: the binaries exist on disk but
    /// the metadata that makes them visible could not be written.
    pub fn unrecorded(mut results: Vec<FileOutcome>, reason: &str) -> Self {
        for result in results.iter_mut().filter(|r| r.success) {
            result.success = false;
            result.document = None;
            result.message = format!("Saved to disk but not recorded in metadata: {}", reason);
        }

        Self {
            success: false,
            message: format!(
                "Failed to save metadata after uploads. Some files may have been saved to disk but not recorded. Error: {}",
                reason
            ),
            results,
        }
    }

    pub fn documents(&self) -> impl Iterator<Item = &Document> {
        self.results.iter().filter_map(|r| r.document.as_ref())
    }

    pub fn succeeded(&self) -> usize {
        self.results.iter().filter(|r| r.success).count()
    }
}
