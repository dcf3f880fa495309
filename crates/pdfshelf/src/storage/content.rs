use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use log::{debug, info, warn};

use crate::error::{StorageError, StoreError};
use crate::sanitize;

const WRITE_PROBE_NAME: &str = ".writable_test";

/// What happened when a binary was removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Removal {
    Removed,
    AlreadyAbsent,
}

/// The directory holding one binary file per document.
pub struct ContentDirectory {
    root: PathBuf,
}

impl ContentDirectory {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Full path for a stored file name. Names that are not a single path
    /// component are rejected so a record can never point outside the root.
    pub fn path_for(&self, file_name: &str) -> Result<PathBuf, StorageError> {
        if !sanitize::is_single_component(file_name) {
            return Err(StorageError::InvalidFileName(file_name.to_string()));
        }
        Ok(self.root.join(file_name))
    }

    pub fn ensure_directory(&self) -> Result<(), StoreError> {
        std::fs::create_dir_all(&self.root).map_err(|e| StoreError::StoreUnavailable {
            path: self.root.clone(),
            source: e,
        })
    }

    /// Writes `content` under `file_name`. Fails if the file already exists.
    ///
    /// A partially written file is removed before the error is returned.
    pub fn write(&self, file_name: &str, content: &[u8]) -> Result<PathBuf, StorageError> {
        let path = self.path_for(file_name)?;

        let mut file = std::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .map_err(|e| StorageError::WriteFile {
                path: path.clone(),
                source: e,
            })?;

        if let Err(e) = file.write_all(content).and_then(|_| file.sync_all()) {
            drop(file);
            if let Err(cleanup) = std::fs::remove_file(&path) {
                warn!(
                    "Could not remove partially written file {}: {}",
                    path.display(),
                    cleanup
                );
            }
            return Err(StorageError::WriteFile { path, source: e });
        }

        debug!("Wrote {} bytes to {}", content.len(), path.display());
        Ok(path)
    }

    /// Removes a stored file. A file that is already gone is not an error.
    pub fn remove(&self, file_name: &str) -> Result<Removal, StorageError> {
        let path = self.path_for(file_name)?;
        match std::fs::remove_file(&path) {
            Ok(()) => {
                info!("Deleted file {}", path.display());
                Ok(Removal::Removed)
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                info!(
                    "File {} not found for deletion, presumed already deleted",
                    path.display()
                );
                Ok(Removal::AlreadyAbsent)
            }
            Err(e) => Err(StorageError::RemoveFile { path, source: e }),
        }
    }

    pub fn read(&self, file_name: &str) -> Result<Vec<u8>, StorageError> {
        let path = self.path_for(file_name)?;
        std::fs::read(&path).map_err(|e| StorageError::ReadFile { path, source: e })
    }
}

/// Creates `dir` if needed and proves it is writable by writing and removing
/// a probe file. Permission problems on mounted volumes surface here with the
/// offending path instead of halfway through a mutation.
pub fn verify_writable(dir: &Path) -> Result<(), StoreError> {
    let unavailable = |e: std::io::Error| StoreError::StoreUnavailable {
        path: dir.to_path_buf(),
        source: e,
    };

    std::fs::create_dir_all(dir).map_err(unavailable)?;
    let probe = dir.join(WRITE_PROBE_NAME);
    std::fs::write(&probe, b"writable").map_err(unavailable)?;
    std::fs::remove_file(&probe).map_err(unavailable)?;
    Ok(())
}
