//! Async command handlers for a front end.
//!
//! Commands are organized by concern:
//! - `documents`: listing, queries, status changes, deletion and download
//! - `upload`: batch uploads from in-memory files or local paths
//!
//! Every command returns plain serializable data wrapped in [`ApiResponse`].
//! Store calls block on the filesystem, so they run on tokio's blocking pool.

pub mod documents;
pub mod upload;

pub use documents::*;
pub use upload::*;

use std::sync::Arc;

use serde::Serialize;

use crate::error::StoreError;
use crate::store::DocumentStore;

/// The store handle shared by all commands.
pub type SharedStore = Arc<dyn DocumentStore>;

/// Response wrapper for API calls.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn err(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }
}

/// Failure of a command before it produced data.
#[derive(Debug)]
pub(crate) enum CommandFailure {
    Store(StoreError),
    Join(tokio::task::JoinError),
}

impl CommandFailure {
    pub(crate) fn into_response<T>(self, context: &str) -> ApiResponse<T> {
        match self {
            CommandFailure::Store(e) if e.is_not_found() => {
                ApiResponse::err("Document not found.")
            }
            CommandFailure::Store(e) => ApiResponse::err(format!("{}: {}", context, e)),
            CommandFailure::Join(e) => {
                log::error!("Store task did not complete: {}", e);
                ApiResponse::err(format!("{}: store task did not complete", context))
            }
        }
    }
}

/// Runs a store call on the blocking pool.
pub(crate) async fn run_blocking<T, F>(store: &SharedStore, f: F) -> Result<T, CommandFailure>
where
    T: Send + 'static,
    F: FnOnce(&dyn DocumentStore) -> Result<T, StoreError> + Send + 'static,
{
    let store = Arc::clone(store);
    tokio::task::spawn_blocking(move || f(store.as_ref()))
        .await
        .map_err(CommandFailure::Join)?
        .map_err(CommandFailure::Store)
}
