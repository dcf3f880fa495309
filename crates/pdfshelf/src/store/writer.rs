//! Single-writer queue in front of a document store.
//!
//! One dedicated thread owns the inner store and executes every call in the
//! order it was submitted, so two overlapping requests can no longer
//! interleave their load/mutate/store cycles.

use std::collections::HashSet;
use std::thread::{self, JoinHandle};

use crossbeam_channel::{bounded, Sender};
use log::{debug, error, info};

use crate::document::{Document, DocumentStatus};
use crate::error::StoreError;
use crate::upload::{CreateOutcome, CreateRequest};

use super::{BulkDeleteOutcome, DeleteOutcome, DocumentStore};

type Task = Box<dyn FnOnce(&dyn DocumentStore) + Send>;

pub struct SerializedStore {
    sender: Option<Sender<Task>>,
    writer: Option<JoinHandle<()>>,
}

impl SerializedStore {
    /// Moves `store` onto a dedicated writer thread.
    ///
    /// # Panics
    /// Panics if `queue_capacity` is 0.
    pub fn spawn<S>(store: S, queue_capacity: usize) -> Self
    where
        S: DocumentStore + 'static,
    {
        assert!(queue_capacity > 0, "queue_capacity must be > 0");
        let (sender, receiver) = bounded::<Task>(queue_capacity);

        let writer = thread::Builder::new()
            .name("pdfshelf-writer".to_string())
            .spawn(move || {
                debug!("Store writer started");
                for task in receiver {
                    task(&store as &dyn DocumentStore);
                }
                debug!("Store writer stopped");
            });

        let writer = match writer {
            Ok(handle) => Some(handle),
            Err(e) => {
                error!("Failed to spawn store writer thread: {}", e);
                None
            }
        };

        info!("Store writer queue ready (capacity {})", queue_capacity);
        Self {
            sender: writer.as_ref().map(|_| sender),
            writer,
        }
    }

    /// Runs `f` on the writer thread and waits for its result.
    fn execute<T, F>(&self, f: F) -> Result<T, StoreError>
    where
        T: Send + 'static,
        F: FnOnce(&dyn DocumentStore) -> Result<T, StoreError> + Send + 'static,
    {
        let sender = self.sender.as_ref().ok_or(StoreError::WriterClosed)?;
        let (reply_tx, reply_rx) = bounded(1);

        sender
            .send(Box::new(move |store: &dyn DocumentStore| {
                // The caller may have gone away; nothing to do then
                let _ = reply_tx.send(f(store));
            }))
            .map_err(|_| StoreError::WriterClosed)?;

        reply_rx.recv().map_err(|_| StoreError::WriterClosed)?
    }

    /// Stops accepting work and waits for queued calls to finish.
    pub fn shutdown(mut self) {
        self.stop();
    }

    fn stop(&mut self) {
        // Dropping the sender ends the writer loop once the queue drains
        self.sender.take();
        if let Some(writer) = self.writer.take() {
            if writer.join().is_err() {
                error!("Store writer thread panicked");
            }
        }
    }
}

impl Drop for SerializedStore {
    fn drop(&mut self) {
        self.stop();
    }
}

impl DocumentStore for SerializedStore {
    fn list(&self) -> Result<Vec<Document>, StoreError> {
        self.execute(|store| store.list())
    }

    fn create(&self, request: CreateRequest) -> Result<CreateOutcome, StoreError> {
        self.execute(move |store| store.create(request))
    }

    fn toggle_status(&self, id: &str) -> Result<DocumentStatus, StoreError> {
        let id = id.to_string();
        self.execute(move |store| store.toggle_status(&id))
    }

    fn bulk_set_status(
        &self,
        ids: &HashSet<String>,
        status: DocumentStatus,
    ) -> Result<usize, StoreError> {
        let ids = ids.clone();
        self.execute(move |store| store.bulk_set_status(&ids, status))
    }

    fn delete(&self, id: &str) -> Result<DeleteOutcome, StoreError> {
        let id = id.to_string();
        self.execute(move |store| store.delete(&id))
    }

    fn bulk_delete(&self, ids: &HashSet<String>) -> Result<BulkDeleteOutcome, StoreError> {
        let ids = ids.clone();
        self.execute(move |store| store.bulk_delete(&ids))
    }

    fn read_binary(&self, document: &Document) -> Result<Vec<u8>, StoreError> {
        let document = document.clone();
        self.execute(move |store| store.read_binary(&document))
    }
}
