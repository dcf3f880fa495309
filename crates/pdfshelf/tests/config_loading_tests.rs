//! Table-driven tests for configuration loading and validation.

mod common;

use std::path::PathBuf;

use assert_fs::prelude::*;
use serial_test::serial;

use pdfshelf::config::{load_config, load_config_from_str};
use pdfshelf::{open_store_from_file, CatalogBroadcaster, DocumentStore, PdfShelfError, StoreConfig};

/// Represents a single config loading test case.
struct ConfigTestCase {
    name: &'static str,
    config_json: &'static str,
    should_succeed: bool,
    /// Expected error substring (if should_succeed is false).
    expected_error: Option<&'static str>,
}

const JSON_CONFIG_TESTS: &[ConfigTestCase] = &[
    ConfigTestCase {
        name: "empty_object",
        config_json: "{}",
        should_succeed: true,
        expected_error: None,
    },
    ConfigTestCase {
        name: "valid_full",
        config_json: r#"{
            "data_directory": "/srv/shelf/data",
            "metadata_file": "metadata.json",
            "upload_directory": "/srv/shelf/public/uploads/pdfs",
            "public_prefix": "/uploads/pdfs",
            "verify_writable": true,
            "upload": {
                "max_files": 20,
                "max_file_size": 10485760,
                "allowed_mime_types": ["application/pdf"]
            },
            "writer_queue_capacity": 16
        }"#,
        should_succeed: true,
        expected_error: None,
    },
    ConfigTestCase {
        name: "nested_metadata_file",
        config_json: r#"{ "metadata_file": "nested/metadata.json" }"#,
        should_succeed: false,
        expected_error: Some("metadata_file"),
    },
    ConfigTestCase {
        name: "relative_public_prefix",
        config_json: r#"{ "public_prefix": "uploads/pdfs" }"#,
        should_succeed: false,
        expected_error: Some("public_prefix"),
    },
    ConfigTestCase {
        name: "zero_max_files",
        config_json: r#"{ "upload": { "max_files": 0 } }"#,
        should_succeed: false,
        expected_error: Some("max_files"),
    },
    ConfigTestCase {
        name: "zero_queue_capacity",
        config_json: r#"{ "writer_queue_capacity": 0 }"#,
        should_succeed: false,
        expected_error: Some("writer_queue_capacity"),
    },
    ConfigTestCase {
        name: "wrong_type",
        config_json: r#"{ "verify_writable": "yes" }"#,
        should_succeed: false,
        expected_error: Some("parse"),
    },
];

#[test]
fn test_json_config_cases() {
    for case in JSON_CONFIG_TESTS {
        let result = load_config_from_str(case.config_json);
        match (case.should_succeed, result) {
            (true, Ok(_)) => {}
            (true, Err(e)) => panic!("case {}: unexpected error {}", case.name, e),
            (false, Ok(_)) => panic!("case {}: expected an error", case.name),
            (false, Err(e)) => {
                if let Some(expected) = case.expected_error {
                    assert!(
                        e.to_string().contains(expected),
                        "case {}: '{}' does not contain '{}'",
                        case.name,
                        e,
                        expected
                    );
                }
            }
        }
    }
}

#[test]
fn test_relative_directories_resolve_against_config_file() {
    let temp = assert_fs::TempDir::new().unwrap();
    let config_file = temp.child("shelf.json");
    config_file
        .write_str(r#"{ "data_directory": "data", "upload_directory": "public/uploads/pdfs" }"#)
        .unwrap();

    let config = load_config(config_file.path()).unwrap();

    assert_eq!(config.data_directory, temp.path().join("data"));
    assert_eq!(
        config.upload_directory,
        temp.path().join("public/uploads/pdfs")
    );
    assert_eq!(config.metadata_path(), temp.path().join("data/metadata.json"));
}

#[test]
fn test_missing_config_file() {
    let temp = assert_fs::TempDir::new().unwrap();
    let err = load_config(temp.child("absent.json").path()).unwrap_err();

    assert!(err.to_string().contains("absent.json"));
}

#[test]
fn test_open_store_from_file() {
    let temp = assert_fs::TempDir::new().unwrap();
    let config_file = temp.child("shelf.json");
    config_file
        .write_str(r#"{ "data_directory": "data", "upload_directory": "uploads" }"#)
        .unwrap();

    let store = open_store_from_file(config_file.path(), CatalogBroadcaster::default()).unwrap();
    assert!(store.list().unwrap().is_empty());
    store.shutdown();

    temp.child("data/metadata.json").assert("[]");
}

#[test]
fn test_open_store_from_invalid_file() {
    let temp = assert_fs::TempDir::new().unwrap();
    let config_file = temp.child("shelf.json");
    config_file.write_str("not json").unwrap();

    let result = open_store_from_file(config_file.path(), CatalogBroadcaster::default());
    assert!(matches!(result, Err(PdfShelfError::Config(_))));
}

#[test]
#[serial]
fn test_defaults_live_under_home() {
    let temp = assert_fs::TempDir::new().unwrap();
    let previous = std::env::var_os("HOME");
    std::env::set_var("HOME", temp.path());

    let config = StoreConfig::default();

    match previous {
        Some(home) => std::env::set_var("HOME", home),
        None => std::env::remove_var("HOME"),
    }

    let base: PathBuf = temp.path().join(".pdfshelf");
    assert_eq!(config.metadata_path(), base.join("data/metadata.json"));
    assert_eq!(config.upload_directory, base.join("uploads/pdfs"));
    assert_eq!(config.public_prefix, "/uploads/pdfs");
}
