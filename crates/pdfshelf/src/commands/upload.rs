//! Upload commands: in-memory files from a form, or local paths picked with
//! a native file dialog.

use chrono::Utc;
use serde::{Deserialize, Serialize};

use super::{run_blocking, ApiResponse, CommandFailure, SharedStore};
use crate::document::DocumentStatus;
use crate::error::{StoreError, ValidationErrors};
use crate::upload::{CreateOutcome, CreateRequest, FileOutcome, UploadFile};
use crate::week::{self, WeekOption};

// ============================================================================
// Request / Response Types
// ============================================================================

/// The metadata fields of the upload form.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadForm {
    pub week: String,
    pub status: DocumentStatus,
    /// Comma-separated names.
    #[serde(default)]
    pub related_persons: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResult {
    pub success: bool,
    pub message: String,
    /// Field-keyed validation messages; empty once validation passed.
    #[serde(skip_serializing_if = "ValidationErrors::is_empty")]
    pub errors: ValidationErrors,
    pub results: Vec<FileOutcome>,
}

impl UploadResult {
    fn invalid(errors: ValidationErrors) -> Self {
        Self {
            success: false,
            message: "Validation failed. Please check your inputs.".to_string(),
            errors,
            results: Vec::new(),
        }
    }
}

impl From<CreateOutcome> for UploadResult {
    fn from(outcome: CreateOutcome) -> Self {
        Self {
            success: outcome.success,
            message: outcome.message,
            errors: ValidationErrors::new(),
            results: outcome.results,
        }
    }
}

// ============================================================================
// Commands
// ============================================================================

/// Validates and stores a batch. Validation problems come back as data with
/// `success: false`, not as an error response.
pub async fn upload_documents(
    store: &SharedStore,
    files: Vec<UploadFile>,
    form: UploadForm,
) -> ApiResponse<UploadResult> {
    let request = CreateRequest {
        files,
        week: form.week,
        status: form.status,
        related_persons: form.related_persons,
    };

    match run_blocking(store, move |s| s.create(request)).await {
        Ok(outcome) => ApiResponse::ok(outcome.into()),
        Err(CommandFailure::Store(StoreError::Validation(errors))) => {
            ApiResponse::ok(UploadResult::invalid(errors))
        }
        Err(e) => e.into_response("Failed to prepare for upload"),
    }
}

/// Reads local files and uploads them as one batch.
pub async fn upload_files(
    store: &SharedStore,
    file_paths: Vec<String>,
    form: UploadForm,
) -> ApiResponse<UploadResult> {
    let read = tokio::task::spawn_blocking(move || {
        let mut files = Vec::with_capacity(file_paths.len());
        let mut errors = Vec::new();
        for path in &file_paths {
            match UploadFile::from_path(path) {
                Ok(file) => files.push(file),
                Err(e) => errors.push(e.to_string()),
            }
        }
        (files, errors)
    })
    .await;

    let (files, errors) = match read {
        Ok(read) => read,
        Err(e) => {
            log::error!("Reading upload files did not complete: {}", e);
            return ApiResponse::err("Failed to read files for upload");
        }
    };
    if !errors.is_empty() {
        return ApiResponse::err(errors.join("; "));
    }

    upload_documents(store, files, form).await
}

/// The weeks offered by the upload form, current week included.
pub async fn list_upload_weeks() -> ApiResponse<Vec<WeekOption>> {
    ApiResponse::ok(week::upload_week_options(Utc::now().date_naive()))
}
