//! Builders for upload requests and stored documents.

#![allow(dead_code)]

use chrono::{DateTime, TimeZone, Utc};

use pdfshelf::upload::PDF_MIME_TYPE;
use pdfshelf::{CreateRequest, Document, DocumentStatus, UploadFile};

/// A PDF upload of `size` bytes with recognizable content.
pub fn pdf(name: &str, size: usize) -> UploadFile {
    let mut bytes = b"%PDF-1.4\n".to_vec();
    bytes.resize(size.max(bytes.len()), b'x');
    bytes.truncate(size);
    UploadFile::new(name, PDF_MIME_TYPE, bytes)
}

/// Builder for creating `CreateRequest` instances.
pub struct RequestBuilder {
    files: Vec<UploadFile>,
    week: String,
    status: DocumentStatus,
    related_persons: String,
}

impl RequestBuilder {
    /// Empty batch for week 2024-01-08, due, nobody related.
    pub fn new() -> Self {
        Self {
            files: Vec::new(),
            week: "2024-01-08".to_string(),
            status: DocumentStatus::Due,
            related_persons: String::new(),
        }
    }

    pub fn file(mut self, file: UploadFile) -> Self {
        self.files.push(file);
        self
    }

    /// Add `count` small PDFs named `file-{n}.pdf`.
    pub fn pdfs(mut self, count: usize) -> Self {
        for n in 0..count {
            self.files.push(pdf(&format!("file-{}.pdf", n), 64));
        }
        self
    }

    pub fn week(mut self, week: &str) -> Self {
        self.week = week.to_string();
        self
    }

    pub fn status(mut self, status: DocumentStatus) -> Self {
        self.status = status;
        self
    }

    pub fn related_persons(mut self, names: &str) -> Self {
        self.related_persons = names.to_string();
        self
    }

    pub fn build(self) -> CreateRequest {
        CreateRequest {
            files: self.files,
            week: self.week,
            status: self.status,
            related_persons: self.related_persons,
        }
    }
}

impl Default for RequestBuilder {
    fn default() -> Self {
        Self::new()
    }
}

pub fn timestamp(y: i32, m: u32, d: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, 9, 30, 0).unwrap()
}

/// A metadata record as an earlier deployment might have written it.
pub fn legacy_document(id: &str, week: &str, status: DocumentStatus) -> Document {
    let file_name = format!("{}-legacy.pdf", id);
    Document {
        id: id.to_string(),
        path: format!("/uploads/pdfs/{}", file_name),
        file_name,
        original_name: "legacy.pdf".to_string(),
        week: week.to_string(),
        status,
        upload_date: timestamp(2023, 5, 2),
        size: 3,
        related_persons: None,
    }
}
