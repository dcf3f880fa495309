use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use log::{debug, info};

use crate::document::Document;
use crate::error::StoreError;

const PREVIEW_CHARS: usize = 100;

/// The JSON file holding the full document collection.
///
/// Every save rewrites the whole array through a temporary sibling file and
/// a rename, so readers never observe a half-written collection.
pub struct MetadataFile {
    path: PathBuf,
}

impl MetadataFile {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn directory(&self) -> &Path {
        self.path.parent().unwrap_or_else(|| Path::new("."))
    }

    /// Creates the containing directory if needed.
    pub fn ensure_directory(&self) -> Result<(), StoreError> {
        let dir = self.directory();
        std::fs::create_dir_all(dir).map_err(|e| StoreError::StoreUnavailable {
            path: dir.to_path_buf(),
            source: e,
        })
    }

    /// Reads the collection, initializing an empty one when the file does not
    /// exist yet.
    pub fn load(&self) -> Result<Vec<Document>, StoreError> {
        self.ensure_directory()?;

        let raw = match std::fs::read(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                info!(
                    "Metadata file not found at {}, creating an empty collection",
                    self.path.display()
                );
                write_atomic(&self.path, b"[]").map_err(|e| StoreError::StoreUnavailable {
                    path: self.path.clone(),
                    source: e,
                })?;
                return Ok(Vec::new());
            }
            Err(e) => {
                return Err(StoreError::StoreUnavailable {
                    path: self.path.clone(),
                    source: e,
                })
            }
        };

        let documents: Vec<Document> =
            serde_json::from_slice(&raw).map_err(|e| StoreError::CorruptMetadata {
                path: self.path.clone(),
                preview: preview(&String::from_utf8_lossy(&raw)),
                source: e,
            })?;

        debug!(
            "Loaded {} document(s) from {}",
            documents.len(),
            self.path.display()
        );
        Ok(documents)
    }

    /// Rewrites the whole collection as pretty-printed JSON.
    pub fn save(&self, documents: &[Document]) -> Result<(), StoreError> {
        let json = serde_json::to_string_pretty(documents).map_err(|e| StoreError::PersistFailed {
            path: self.path.clone(),
            source: std::io::Error::new(ErrorKind::InvalidData, e),
        })?;

        write_atomic(&self.path, json.as_bytes()).map_err(|e| StoreError::PersistFailed {
            path: self.path.clone(),
            source: e,
        })?;

        debug!(
            "Saved {} document(s) to {}",
            documents.len(),
            self.path.display()
        );
        Ok(())
    }
}

fn preview(raw: &str) -> String {
    let mut preview: String = raw.chars().take(PREVIEW_CHARS).collect();
    if raw.chars().count() > PREVIEW_CHARS {
        preview.push_str("...");
    }
    preview
}

/// Writes `content` to a temporary file next to `path` and renames it into
/// place.
fn write_atomic(path: &Path, content: &[u8]) -> std::io::Result<()> {
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| "metadata.json".to_string());
    let tmp_path = path.with_file_name(format!(".{}.{}.tmp", file_name, uuid::Uuid::new_v4()));

    let result = (|| {
        let mut file = std::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&tmp_path)?;
        file.write_all(content)?;
        file.sync_all()?;
        std::fs::rename(&tmp_path, path)
    })();

    if result.is_err() {
        let _ = std::fs::remove_file(&tmp_path);
    }
    result
}
