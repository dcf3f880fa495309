use std::collections::HashSet;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use log::{error, info, warn};
use tracing::info_span;

use crate::broadcast::CatalogBroadcaster;
use crate::config::{StoreConfig, DEFAULT_PUBLIC_PREFIX};
use crate::document::{upload_timestamp, Document, DocumentStatus};
use crate::error::{StorageError, StoreError};
use crate::sanitize;
use crate::storage::{verify_writable, ContentDirectory, MetadataFile, Removal};
use crate::upload::{
    CreateOutcome, CreateRequest, FileOutcome, PreparedBatch, UploadFile, UploadPolicy,
};

use super::{collection, BulkDeleteOutcome, DeleteOutcome, DocumentStore, FileError, FileRemoval};

/// Document store backed by a JSON metadata file and an upload directory.
///
/// Nothing is cached: every call re-reads the metadata file. Concurrent
/// mutations race on the whole file (last writer wins).
pub struct FsDocumentStore {
    metadata: MetadataFile,
    content: ContentDirectory,
    public_prefix: String,
    policy: UploadPolicy,
    verify_writable: bool,
    broadcaster: Option<CatalogBroadcaster>,
}

impl FsDocumentStore {
    pub fn new<M: AsRef<Path>, U: AsRef<Path>>(metadata_path: M, upload_directory: U) -> Self {
        Self {
            metadata: MetadataFile::new(metadata_path),
            content: ContentDirectory::new(upload_directory),
            public_prefix: DEFAULT_PUBLIC_PREFIX.to_string(),
            policy: UploadPolicy::default(),
            verify_writable: true,
            broadcaster: None,
        }
    }

    pub fn from_config(config: &StoreConfig) -> Self {
        Self::new(config.metadata_path(), &config.upload_directory)
            .with_public_prefix(config.public_prefix.clone())
            .with_policy(config.upload.clone())
            .with_write_check(config.verify_writable)
    }

    pub fn with_broadcaster(mut self, broadcaster: CatalogBroadcaster) -> Self {
        self.broadcaster = Some(broadcaster);
        self
    }

    pub fn with_policy(mut self, policy: UploadPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_public_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.public_prefix = prefix.into();
        self
    }

    /// Enables or disables the write-permission probe run before mutations.
    pub fn with_write_check(mut self, enabled: bool) -> Self {
        self.verify_writable = enabled;
        self
    }

    pub fn metadata_path(&self) -> &Path {
        self.metadata.path()
    }

    pub fn upload_directory(&self) -> &Path {
        self.content.root()
    }

    /// Where the binary of `document` lives on disk.
    pub fn binary_path(&self, document: &Document) -> Result<PathBuf, StoreError> {
        self.content
            .path_for(&document.file_name)
            .map_err(|_| StoreError::BinaryMissing {
                id: document.id.clone(),
                path: self.content.root().to_path_buf(),
            })
    }

    fn public_path(&self, file_name: &str) -> String {
        format!("{}/{}", self.public_prefix.trim_end_matches('/'), file_name)
    }

    fn prepare_data_directory(&self) -> Result<(), StoreError> {
        if self.verify_writable {
            verify_writable(self.metadata.directory())
        } else {
            self.metadata.ensure_directory()
        }
    }

    fn prepare_upload_directory(&self) -> Result<(), StoreError> {
        if self.verify_writable {
            verify_writable(self.content.root())
        } else {
            self.content.ensure_directory()
        }
    }

    fn store_file(
        &self,
        file: &UploadFile,
        batch: &PreparedBatch,
        uploaded_at: DateTime<Utc>,
    ) -> Result<Document, StorageError> {
        let id = uuid::Uuid::new_v4().to_string();
        let file_name = sanitize::stored_file_name(&id, &file.declared_name);

        self.content.write(&file_name, &file.bytes)?;

        Ok(Document {
            path: self.public_path(&file_name),
            id,
            file_name,
            original_name: file.declared_name.clone(),
            week: batch.week.clone(),
            status: batch.status,
            upload_date: uploaded_at,
            size: file.size(),
            related_persons: Some(batch.related_persons.clone()),
        })
    }

    /// Best-effort binary removal. Failures are logged and reported but never
    /// stop the metadata update.
    fn remove_binary(&self, document: &Document) -> FileRemoval {
        match self.content.remove(&document.file_name) {
            Ok(Removal::Removed) => FileRemoval::Removed,
            Ok(Removal::AlreadyAbsent) => FileRemoval::AlreadyAbsent,
            Err(e) => {
                warn!(
                    "Could not delete file for document {}: {}. Proceeding to update metadata.",
                    document.id, e
                );
                FileRemoval::Failed(e.to_string())
            }
        }
    }

    fn notify(&self, f: impl FnOnce(&CatalogBroadcaster)) {
        if let Some(broadcaster) = &self.broadcaster {
            f(broadcaster);
        }
    }
}

impl DocumentStore for FsDocumentStore {
    fn list(&self) -> Result<Vec<Document>, StoreError> {
        let _span = info_span!("store.list").entered();
        self.metadata.load()
    }

    fn create(&self, request: CreateRequest) -> Result<CreateOutcome, StoreError> {
        let _span = info_span!("store.create", files = request.files.len()).entered();

        let uploaded_at = upload_timestamp(Utc::now());
        let batch = self
            .policy
            .prepare(&request, uploaded_at.date_naive())
            .map_err(StoreError::Validation)?;

        self.prepare_data_directory()?;
        self.prepare_upload_directory()?;
        let mut documents = self.metadata.load()?;

        let mut results = Vec::with_capacity(request.files.len());
        let mut created_ids = Vec::new();

        for file in &request.files {
            match self.store_file(file, &batch, uploaded_at) {
                Ok(document) => {
                    info!(
                        "Stored {} as {} ({} bytes)",
                        file.declared_name, document.file_name, document.size
                    );
                    created_ids.push(document.id.clone());
                    documents.insert(0, document.clone());
                    results.push(FileOutcome::stored(&file.declared_name, document));
                }
                Err(e) => {
                    error!("Failed to upload {}: {}", file.declared_name, e);
                    results.push(FileOutcome::failed(
                        &file.declared_name,
                        format!("Upload failed for {}: {}", file.declared_name, e),
                    ));
                }
            }
        }

        if created_ids.is_empty() {
            return Ok(CreateOutcome::recorded(results));
        }

        if let Err(e) = self.metadata.save(&documents) {
            error!("Failed to record {} upload(s): {}", created_ids.len(), e);
            return Ok(CreateOutcome::unrecorded(results, &e.to_string()));
        }

        self.notify(|b| b.created(created_ids));
        Ok(CreateOutcome::recorded(results))
    }

    fn toggle_status(&self, id: &str) -> Result<DocumentStatus, StoreError> {
        let _span = info_span!("store.toggle_status", id = %id).entered();

        self.prepare_data_directory()?;
        let mut documents = self.metadata.load()?;
        let status = collection::toggle_status(&mut documents, id)?;
        self.metadata.save(&documents)?;

        info!("Document {} is now {}", id, status);
        self.notify(|b| b.status_changed(vec![id.to_string()], status));
        Ok(status)
    }

    fn bulk_set_status(
        &self,
        ids: &HashSet<String>,
        status: DocumentStatus,
    ) -> Result<usize, StoreError> {
        let _span = info_span!("store.bulk_set_status", ids = ids.len(), status = %status).entered();

        self.prepare_data_directory()?;
        let mut documents = self.metadata.load()?;
        let changed = collection::set_status(&mut documents, ids, status);
        if changed.is_empty() {
            info!("No documents required a status update");
            return Ok(0);
        }

        self.metadata.save(&documents)?;

        info!("{} document(s) updated to {}", changed.len(), status);
        let count = changed.len();
        self.notify(|b| b.status_changed(changed, status));
        Ok(count)
    }

    fn delete(&self, id: &str) -> Result<DeleteOutcome, StoreError> {
        let _span = info_span!("store.delete", id = %id).entered();

        self.prepare_data_directory()?;
        let documents = self.metadata.load()?;
        let document = collection::find(&documents, id)?.clone();

        let file = self.remove_binary(&document);

        let remaining: Vec<Document> = documents.into_iter().filter(|d| d.id != id).collect();
        self.metadata.save(&remaining)?;

        info!("Deleted document {} ({})", id, document.original_name);
        self.notify(|b| b.deleted(vec![id.to_string()]));
        Ok(DeleteOutcome {
            id: id.to_string(),
            file,
        })
    }

    fn bulk_delete(&self, ids: &HashSet<String>) -> Result<BulkDeleteOutcome, StoreError> {
        let _span = info_span!("store.bulk_delete", ids = ids.len()).entered();

        self.prepare_data_directory()?;
        let documents = self.metadata.load()?;
        let (remaining, removed) = collection::partition(documents, ids);

        let mut files_deleted = 0;
        let mut file_errors = Vec::new();
        for document in &removed {
            match self.remove_binary(document) {
                FileRemoval::Removed => files_deleted += 1,
                FileRemoval::AlreadyAbsent => {}
                FileRemoval::Failed(error) => file_errors.push(FileError {
                    file_name: document.file_name.clone(),
                    error,
                }),
            }
        }

        if removed.is_empty() {
            return Ok(BulkDeleteOutcome::committed(0, 0, file_errors));
        }

        if let Err(e) = self.metadata.save(&remaining) {
            error!("Failed to update metadata after bulk delete: {}", e);
            return Ok(BulkDeleteOutcome::uncommitted(&e, files_deleted, file_errors));
        }

        info!(
            "Bulk delete removed {} record(s), {} file(s)",
            removed.len(),
            files_deleted
        );
        self.notify(|b| b.deleted(removed.iter().map(|d| d.id.clone()).collect()));
        Ok(BulkDeleteOutcome::committed(
            removed.len(),
            files_deleted,
            file_errors,
        ))
    }

    fn read_binary(&self, document: &Document) -> Result<Vec<u8>, StoreError> {
        let path = self.binary_path(document)?;
        match self.content.read(&document.file_name) {
            Ok(bytes) => Ok(bytes),
            Err(StorageError::ReadFile { source, .. }) if source.kind() == ErrorKind::NotFound => {
                Err(StoreError::BinaryMissing {
                    id: document.id.clone(),
                    path,
                })
            }
            Err(StorageError::ReadFile { path, source }) => {
                Err(StoreError::StoreUnavailable { path, source })
            }
            Err(_) => Err(StoreError::BinaryMissing {
                id: document.id.clone(),
                path,
            }),
        }
    }
}
