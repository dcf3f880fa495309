pub mod broadcast;
pub mod catalog;
pub mod commands;
pub mod config;
pub mod document;
pub mod error;
pub mod logging;
pub mod sanitize;
pub mod storage;
pub mod store;
pub mod upload;
pub mod week;

pub use broadcast::{CatalogBroadcaster, CatalogChange, CatalogEvent};
pub use catalog::{DocumentFilter, SortOrder, WeekFilter};
pub use config::{load_config, StoreConfig};
pub use document::{Document, DocumentStatus};
pub use error::{ConfigError, PdfShelfError, Result, StorageError, StoreError, ValidationErrors};
pub use store::{
    BulkDeleteOutcome, DeleteOutcome, DocumentStore, FileRemoval, FsDocumentStore, InMemoryStore,
    SerializedStore,
};
pub use upload::{CreateOutcome, CreateRequest, UploadFile, UploadPolicy};
pub use week::{WeekId, WeekRange};

/// Opens the filesystem store described by `config` behind a single-writer
/// queue, publishing changes on `broadcaster`.
pub fn open_store(config: &StoreConfig, broadcaster: CatalogBroadcaster) -> SerializedStore {
    let store = FsDocumentStore::from_config(config).with_broadcaster(broadcaster);
    SerializedStore::spawn(store, config.writer_queue_capacity.max(1))
}

/// Loads the config file at `path` and opens its store.
pub fn open_store_from_file<P: AsRef<std::path::Path>>(
    path: P,
    broadcaster: CatalogBroadcaster,
) -> Result<SerializedStore> {
    let config = load_config(path)?;
    log::info!(
        "Opening document store at {}",
        sanitize::redact_path(&config.metadata_path())
    );
    Ok(open_store(&config, broadcaster))
}
