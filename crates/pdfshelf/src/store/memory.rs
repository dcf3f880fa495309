//! In-memory document store for tests and front-end development.

use std::collections::{HashMap, HashSet};
use std::path::PathBuf;
use std::sync::{Mutex, MutexGuard};

use chrono::Utc;

use crate::config::DEFAULT_PUBLIC_PREFIX;
use crate::document::{upload_timestamp, Document, DocumentStatus};
use crate::error::StoreError;
use crate::sanitize;
use crate::upload::{CreateOutcome, CreateRequest, FileOutcome, UploadPolicy};

use super::{collection, BulkDeleteOutcome, DeleteOutcome, DocumentStore, FileRemoval};

#[derive(Default)]
struct State {
    documents: Vec<Document>,
    binaries: HashMap<String, Vec<u8>>,
    fail_persist: bool,
}

/// Keeps the collection and binaries in memory with the same semantics as
/// the filesystem store. Persist failures can be simulated.
pub struct InMemoryStore {
    state: Mutex<State>,
    policy: UploadPolicy,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::with_policy(UploadPolicy::default())
    }

    pub fn with_policy(policy: UploadPolicy) -> Self {
        Self {
            state: Mutex::new(State::default()),
            policy,
        }
    }

    /// Seeds the collection. Every seeded document gets an empty binary.
    pub fn with_documents(documents: Vec<Document>) -> Self {
        let store = Self::new();
        {
            let mut state = store.lock();
            for doc in &documents {
                state.binaries.insert(doc.file_name.clone(), Vec::new());
            }
            state.documents = documents;
        }
        store
    }

    /// When set, every metadata write fails after the in-memory mutation was
    /// computed, leaving the committed collection untouched.
    pub fn fail_persist(&self, fail: bool) {
        self.lock().fail_persist = fail;
    }

    pub fn binary_count(&self) -> usize {
        self.lock().binaries.len()
    }

    /// Drops the binary of `file_name` to simulate a file removed behind the
    /// store's back.
    pub fn forget_binary(&self, file_name: &str) {
        self.lock().binaries.remove(file_name);
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

fn persist(state: &mut State, documents: Vec<Document>) -> Result<(), StoreError> {
    if state.fail_persist {
        return Err(StoreError::PersistFailed {
            path: PathBuf::from("memory://metadata.json"),
            source: std::io::Error::other("simulated persist failure"),
        });
    }
    state.documents = documents;
    Ok(())
}

impl DocumentStore for InMemoryStore {
    fn list(&self) -> Result<Vec<Document>, StoreError> {
        Ok(self.lock().documents.clone())
    }

    fn create(&self, request: CreateRequest) -> Result<CreateOutcome, StoreError> {
        let uploaded_at = upload_timestamp(Utc::now());
        let batch = self
            .policy
            .prepare(&request, uploaded_at.date_naive())
            .map_err(StoreError::Validation)?;

        let mut state = self.lock();
        let mut documents = state.documents.clone();
        let mut results = Vec::with_capacity(request.files.len());

        for file in &request.files {
            let id = uuid::Uuid::new_v4().to_string();
            let file_name = sanitize::stored_file_name(&id, &file.declared_name);
            let document = Document {
                path: format!("{}/{}", DEFAULT_PUBLIC_PREFIX, file_name),
                id,
                file_name: file_name.clone(),
                original_name: file.declared_name.clone(),
                week: batch.week.clone(),
                status: batch.status,
                upload_date: uploaded_at,
                size: file.size(),
                related_persons: Some(batch.related_persons.clone()),
            };
            state.binaries.insert(file_name, file.bytes.clone());
            documents.insert(0, document.clone());
            results.push(FileOutcome::stored(&file.declared_name, document));
        }

        match persist(&mut state, documents) {
            Ok(()) => Ok(CreateOutcome::recorded(results)),
            Err(e) => Ok(CreateOutcome::unrecorded(results, &e.to_string())),
        }
    }

    fn toggle_status(&self, id: &str) -> Result<DocumentStatus, StoreError> {
        let mut state = self.lock();
        let mut documents = state.documents.clone();
        let status = collection::toggle_status(&mut documents, id)?;
        persist(&mut state, documents)?;
        Ok(status)
    }

    fn bulk_set_status(
        &self,
        ids: &HashSet<String>,
        status: DocumentStatus,
    ) -> Result<usize, StoreError> {
        let mut state = self.lock();
        let mut documents = state.documents.clone();
        let changed = collection::set_status(&mut documents, ids, status);
        if changed.is_empty() {
            return Ok(0);
        }
        persist(&mut state, documents)?;
        Ok(changed.len())
    }

    fn delete(&self, id: &str) -> Result<DeleteOutcome, StoreError> {
        let mut state = self.lock();
        let document = collection::find(&state.documents, id)?.clone();

        let file = match state.binaries.remove(&document.file_name) {
            Some(_) => FileRemoval::Removed,
            None => FileRemoval::AlreadyAbsent,
        };
        let remaining = state
            .documents
            .iter()
            .filter(|d| d.id != id)
            .cloned()
            .collect();
        persist(&mut state, remaining)?;

        Ok(DeleteOutcome {
            id: id.to_string(),
            file,
        })
    }

    fn bulk_delete(&self, ids: &HashSet<String>) -> Result<BulkDeleteOutcome, StoreError> {
        let mut state = self.lock();
        let (remaining, removed) = collection::partition(state.documents.clone(), ids);

        let files_deleted = removed
            .iter()
            .filter(|d| state.binaries.remove(&d.file_name).is_some())
            .count();

        if removed.is_empty() {
            return Ok(BulkDeleteOutcome::committed(0, 0, Vec::new()));
        }
        match persist(&mut state, remaining) {
            Ok(()) => Ok(BulkDeleteOutcome::committed(
                removed.len(),
                files_deleted,
                Vec::new(),
            )),
            Err(e) => Ok(BulkDeleteOutcome::uncommitted(&e, files_deleted, Vec::new())),
        }
    }

    fn read_binary(&self, document: &Document) -> Result<Vec<u8>, StoreError> {
        self.lock()
            .binaries
            .get(&document.file_name)
            .cloned()
            .ok_or_else(|| StoreError::BinaryMissing {
                id: document.id.clone(),
                path: PathBuf::from(&document.file_name),
            })
    }
}
