//! Catalog commands: listing, queries, status changes, deletion and download.

use std::collections::HashSet;

use chrono::Utc;
use serde::{Deserialize, Serialize};

use super::{run_blocking, ApiResponse, CommandFailure, SharedStore};
use crate::catalog::{self, DocumentFilter, SortOrder, WeekFilter, WeekFilterOption};
use crate::document::{Document, DocumentStatus};
use crate::error::StoreError;
use crate::store::{BulkDeleteOutcome, FileRemoval};

// ============================================================================
// Response Types
// ============================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteResult {
    pub message: String,
    pub file: FileRemoval,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusResult {
    pub message: String,
    pub new_status: DocumentStatus,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkStatusResult {
    pub message: String,
    pub updated_count: usize,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DownloadedDocument {
    pub document: Document,
    pub content: Vec<u8>,
}

/// User view query: a free-text term and an optional week filter key.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchQuery {
    #[serde(default)]
    pub term: String,
    #[serde(default)]
    pub week: Option<String>,
}

impl SearchQuery {
    /// True when neither a term nor a week filter is set.
    pub fn is_blank(&self) -> bool {
        self.term.trim().is_empty() && self.week.as_deref().and_then(WeekFilter::parse).is_none()
    }
}

// ============================================================================
// Commands
// ============================================================================

pub async fn list_documents(store: &SharedStore) -> ApiResponse<Vec<Document>> {
    match run_blocking(store, |s| s.list()).await {
        Ok(docs) => ApiResponse::ok(docs),
        Err(e) => e.into_response("Failed to list documents"),
    }
}

/// Admin view: every document matching all criteria of `filter`.
pub async fn filter_documents(
    store: &SharedStore,
    filter: DocumentFilter,
) -> ApiResponse<Vec<Document>> {
    let today = Utc::now().date_naive();
    match run_blocking(store, |s| s.list()).await {
        Ok(docs) => ApiResponse::ok(filter.apply(&docs, today).into_iter().cloned().collect()),
        Err(e) => e.into_response("Failed to list documents"),
    }
}

/// User view: nothing is shown until a term or a week is selected.
pub async fn search_documents(
    store: &SharedStore,
    query: SearchQuery,
) -> ApiResponse<Vec<Document>> {
    if query.is_blank() {
        return ApiResponse::ok(Vec::new());
    }

    let today = Utc::now().date_naive();
    let week = query.week.as_deref().and_then(WeekFilter::parse);
    match run_blocking(store, |s| s.list()).await {
        Ok(docs) => ApiResponse::ok(
            docs.into_iter()
                .filter(|d| catalog::matches_search(d, &query.term))
                .filter(|d| week.as_ref().map_or(true, |w| w.matches(d, today)))
                .collect(),
        ),
        Err(e) => e.into_response("Failed to search documents"),
    }
}

pub async fn list_week_filters(
    store: &SharedStore,
    order: SortOrder,
) -> ApiResponse<Vec<WeekFilterOption>> {
    let today = Utc::now().date_naive();
    match run_blocking(store, |s| s.list()).await {
        Ok(docs) => ApiResponse::ok(catalog::week_filter_options(&docs, today, order)),
        Err(e) => e.into_response("Failed to list weeks"),
    }
}

pub async fn delete_document(store: &SharedStore, id: String) -> ApiResponse<DeleteResult> {
    match run_blocking(store, move |s| s.delete(&id)).await {
        Ok(outcome) => ApiResponse::ok(DeleteResult {
            message: "PDF deleted successfully.".to_string(),
            file: outcome.file,
        }),
        Err(e) => e.into_response("Failed to delete PDF"),
    }
}

pub async fn toggle_document_status(store: &SharedStore, id: String) -> ApiResponse<StatusResult> {
    match run_blocking(store, move |s| s.toggle_status(&id)).await {
        Ok(new_status) => ApiResponse::ok(StatusResult {
            message: "Status updated successfully.".to_string(),
            new_status,
        }),
        Err(e) => e.into_response("Failed to update status"),
    }
}

pub async fn bulk_update_status(
    store: &SharedStore,
    ids: Vec<String>,
    status: DocumentStatus,
) -> ApiResponse<BulkStatusResult> {
    let ids: HashSet<String> = ids.into_iter().collect();
    match run_blocking(store, move |s| s.bulk_set_status(&ids, status)).await {
        Ok(0) => ApiResponse::ok(BulkStatusResult {
            message: "No documents required status updates.".to_string(),
            updated_count: 0,
        }),
        Ok(updated_count) => ApiResponse::ok(BulkStatusResult {
            message: format!(
                "{} document(s) updated to {} successfully.",
                updated_count, status
            ),
            updated_count,
        }),
        Err(e) => e.into_response("Failed to bulk update statuses"),
    }
}

/// The outcome carries its own success flag; a metadata write failure is
/// reported there rather than as an error response.
pub async fn bulk_delete_documents(
    store: &SharedStore,
    ids: Vec<String>,
) -> ApiResponse<BulkDeleteOutcome> {
    let ids: HashSet<String> = ids.into_iter().collect();
    match run_blocking(store, move |s| s.bulk_delete(&ids)).await {
        Ok(outcome) => ApiResponse::ok(outcome),
        Err(e) => e.into_response("Failed to prepare for bulk delete"),
    }
}

/// Returns the document and its binary. Only paid documents are served.
pub async fn download_document(
    store: &SharedStore,
    id: String,
) -> ApiResponse<DownloadedDocument> {
    let result = run_blocking(store, move |s| {
        let docs = s.list()?;
        let document = docs
            .into_iter()
            .find(|d| d.id == id)
            .ok_or_else(|| StoreError::NotFound(id.clone()))?;
        if !catalog::is_downloadable(&document) {
            return Err(StoreError::NotDownloadable(id));
        }
        let content = s.read_binary(&document)?;
        Ok(DownloadedDocument { document, content })
    })
    .await;

    match result {
        Ok(download) => ApiResponse::ok(download),
        Err(CommandFailure::Store(StoreError::NotDownloadable(_))) => {
            ApiResponse::err("This document is marked as due and cannot be downloaded.")
        }
        Err(e) => e.into_response("Failed to download PDF"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{DocumentStore, InMemoryStore};
    use crate::upload::{CreateRequest, UploadFile, PDF_MIME_TYPE};
    use std::sync::Arc;

    fn seeded(statuses: &[DocumentStatus]) -> (SharedStore, Vec<Document>) {
        let store = InMemoryStore::new();
        let mut docs = Vec::new();
        for (i, status) in statuses.iter().enumerate() {
            let outcome = store
                .create(CreateRequest {
                    files: vec![UploadFile::new(
                        format!("doc-{}.pdf", i),
                        PDF_MIME_TYPE,
                        vec![i as u8; 4],
                    )],
                    week: "2024-01-08".to_string(),
                    status: *status,
                    related_persons: "Alice".to_string(),
                })
                .unwrap();
            docs.extend(outcome.documents().cloned());
        }
        (Arc::new(store), docs)
    }

    #[tokio::test]
    async fn test_list_documents() {
        let (store, _) = seeded(&[DocumentStatus::Paid, DocumentStatus::Due]);

        let response = list_documents(&store).await;

        assert!(response.success);
        assert_eq!(response.data.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_toggle_and_missing_document() {
        let (store, docs) = seeded(&[DocumentStatus::Due]);

        let response = toggle_document_status(&store, docs[0].id.clone()).await;
        assert_eq!(response.data.unwrap().new_status, DocumentStatus::Paid);

        let missing = toggle_document_status(&store, "nope".to_string()).await;
        assert!(!missing.success);
        assert_eq!(missing.error.as_deref(), Some("Document not found."));
    }

    #[tokio::test]
    async fn test_bulk_update_status_messages() {
        let (store, docs) = seeded(&[DocumentStatus::Due, DocumentStatus::Paid]);
        let ids: Vec<String> = docs.iter().map(|d| d.id.clone()).collect();

        let response = bulk_update_status(&store, ids.clone(), DocumentStatus::Paid).await;
        let data = response.data.unwrap();
        assert_eq!(data.updated_count, 1);
        assert_eq!(data.message, "1 document(s) updated to paid successfully.");

        let again = bulk_update_status(&store, ids, DocumentStatus::Paid).await;
        assert_eq!(again.data.unwrap().message, "No documents required status updates.");
    }

    #[tokio::test]
    async fn test_download_requires_paid() {
        let (store, docs) = seeded(&[DocumentStatus::Paid, DocumentStatus::Due]);

        let paid = download_document(&store, docs[0].id.clone()).await;
        let data = paid.data.unwrap();
        assert_eq!(data.document.id, docs[0].id);
        assert_eq!(data.content, vec![0u8; 4]);

        let due = download_document(&store, docs[1].id.clone()).await;
        assert!(!due.success);
        assert!(due.error.unwrap().contains("cannot be downloaded"));

        let missing = download_document(&store, "nope".to_string()).await;
        assert_eq!(missing.error.as_deref(), Some("Document not found."));
    }

    #[tokio::test]
    async fn test_search_documents_blank_query_shows_nothing() {
        let (store, _) = seeded(&[DocumentStatus::Paid, DocumentStatus::Due]);

        let blank = search_documents(&store, SearchQuery::default()).await;
        assert!(blank.data.unwrap().is_empty());

        let by_term = search_documents(
            &store,
            SearchQuery {
                term: "DOC-1".to_string(),
                week: None,
            },
        )
        .await;
        assert_eq!(by_term.data.unwrap().len(), 1);

        let by_week = search_documents(
            &store,
            SearchQuery {
                term: String::new(),
                week: Some("2024-01-08".to_string()),
            },
        )
        .await;
        assert_eq!(by_week.data.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_filter_and_week_options() {
        let (store, _) = seeded(&[DocumentStatus::Paid, DocumentStatus::Due]);

        let filtered = filter_documents(
            &store,
            DocumentFilter {
                status: Some(DocumentStatus::Due),
                ..Default::default()
            },
        )
        .await;
        assert_eq!(filtered.data.unwrap().len(), 1);

        let weeks = list_week_filters(&store, SortOrder::Descending).await;
        let weeks = weeks.data.unwrap();
        assert_eq!(weeks.len(), 1);
        assert_eq!(weeks[0].label, "08/01/2024 - 14/01/2024");
    }

    #[tokio::test]
    async fn test_delete_commands() {
        let (store, docs) = seeded(&[DocumentStatus::Paid, DocumentStatus::Due, DocumentStatus::Due]);

        let single = delete_document(&store, docs[0].id.clone()).await;
        assert_eq!(single.data.unwrap().file, FileRemoval::Removed);

        let bulk = bulk_delete_documents(
            &store,
            vec![docs[1].id.clone(), docs[2].id.clone(), "unknown".to_string()],
        )
        .await;
        let outcome = bulk.data.unwrap();
        assert!(outcome.success);
        assert_eq!(outcome.metadata_removed_count, 2);

        assert!(list_documents(&store).await.data.unwrap().is_empty());
    }
}
