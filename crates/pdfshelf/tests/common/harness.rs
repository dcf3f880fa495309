//! Test harness for isolated store execution.
//!
//! The `TestHarness` roots a filesystem store in a temp directory laid out
//! like a deployment: `data/metadata.json` plus `uploads/pdfs/`.

#![allow(dead_code)]

use std::path::{Path, PathBuf};

use tempfile::TempDir;

use pdfshelf::{Document, FsDocumentStore, StoreConfig};

pub struct TestHarness {
    temp_dir: TempDir,
    pub config: StoreConfig,
}

impl TestHarness {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let config = StoreConfig::rooted_at(temp_dir.path());
        Self { temp_dir, config }
    }

    /// A harness whose metadata file has the given name. The file is created
    /// with an empty collection.
    pub fn with_metadata_file(name: &str) -> Self {
        let mut harness = Self::new();
        harness.config.metadata_file = name.to_string();
        harness.write_metadata("[]");
        harness
    }

    pub fn temp_path(&self) -> &Path {
        self.temp_dir.path()
    }

    pub fn store(&self) -> FsDocumentStore {
        FsDocumentStore::from_config(&self.config)
    }

    pub fn metadata_path(&self) -> PathBuf {
        self.config.metadata_path()
    }

    pub fn upload_dir(&self) -> &Path {
        &self.config.upload_directory
    }

    pub fn binary_path(&self, document: &Document) -> PathBuf {
        self.upload_dir().join(&document.file_name)
    }

    /// Raw metadata file content.
    pub fn read_metadata(&self) -> String {
        std::fs::read_to_string(self.metadata_path()).expect("Failed to read metadata")
    }

    pub fn write_metadata(&self, content: &str) {
        let path = self.metadata_path();
        std::fs::create_dir_all(path.parent().expect("metadata has a parent"))
            .expect("Failed to create data dir");
        std::fs::write(&path, content).expect("Failed to write metadata");
    }

    pub fn seed(&self, documents: &[Document]) {
        let json = serde_json::to_string_pretty(documents).expect("Failed to serialize documents");
        self.write_metadata(&json);
    }

    /// Write a binary directly into the upload directory.
    pub fn write_binary(&self, file_name: &str, content: &[u8]) -> PathBuf {
        std::fs::create_dir_all(self.upload_dir()).expect("Failed to create upload dir");
        let path = self.upload_dir().join(file_name);
        std::fs::write(&path, content).expect("Failed to write binary");
        path
    }

    /// Names of every file in the upload directory, sorted.
    pub fn stored_files(&self) -> Vec<String> {
        let Ok(entries) = std::fs::read_dir(self.upload_dir()) else {
            return Vec::new();
        };
        let mut names: Vec<String> = entries
            .filter_map(|e| e.ok())
            .map(|e| e.file_name().to_string_lossy().to_string())
            .collect();
        names.sort();
        names
    }
}

impl Default for TestHarness {
    fn default() -> Self {
        Self::new()
    }
}
