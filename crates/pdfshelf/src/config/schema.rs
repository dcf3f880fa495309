use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::upload::UploadPolicy;

pub const DEFAULT_PUBLIC_PREFIX: &str = "/uploads/pdfs";
pub const DEFAULT_METADATA_FILE: &str = "metadata.json";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Directory holding the metadata file.
    #[serde(default = "default_data_directory")]
    pub data_directory: PathBuf,
    #[serde(default = "default_metadata_file")]
    pub metadata_file: String,
    /// Directory holding one binary per document.
    #[serde(default = "default_upload_directory")]
    pub upload_directory: PathBuf,
    /// Public URL prefix the upload directory is served under.
    #[serde(default = "default_public_prefix")]
    pub public_prefix: String,
    /// Probe both directories for write permission before each mutation.
    #[serde(default = "default_true")]
    pub verify_writable: bool,
    #[serde(default)]
    pub upload: UploadPolicy,
    #[serde(default = "default_writer_queue_capacity")]
    pub writer_queue_capacity: usize,
}

fn base_directory() -> PathBuf {
    dirs::home_dir()
        .map(|h| h.join(".pdfshelf"))
        .unwrap_or_else(|| PathBuf::from(".pdfshelf"))
}

fn default_data_directory() -> PathBuf {
    base_directory().join("data")
}

fn default_upload_directory() -> PathBuf {
    base_directory().join("uploads").join("pdfs")
}

fn default_metadata_file() -> String {
    DEFAULT_METADATA_FILE.to_string()
}

fn default_public_prefix() -> String {
    DEFAULT_PUBLIC_PREFIX.to_string()
}

fn default_true() -> bool {
    true
}

fn default_writer_queue_capacity() -> usize {
    64
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            data_directory: default_data_directory(),
            metadata_file: default_metadata_file(),
            upload_directory: default_upload_directory(),
            public_prefix: default_public_prefix(),
            verify_writable: true,
            upload: UploadPolicy::default(),
            writer_queue_capacity: default_writer_queue_capacity(),
        }
    }
}

impl StoreConfig {
    /// Config rooted at `base`: `base/data/metadata.json` and
    /// `base/uploads/pdfs`.
    pub fn rooted_at<P: Into<PathBuf>>(base: P) -> Self {
        let base = base.into();
        Self {
            data_directory: base.join("data"),
            upload_directory: base.join("uploads").join("pdfs"),
            ..Self::default()
        }
    }

    pub fn metadata_path(&self) -> PathBuf {
        self.data_directory.join(&self.metadata_file)
    }
}
