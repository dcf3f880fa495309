use std::path::Path;

use crate::config::schema::StoreConfig;
use crate::error::ConfigError;
use crate::sanitize;

pub fn load_config<P: AsRef<Path>>(path: P) -> Result<StoreConfig, ConfigError> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadFile {
        path: path.to_path_buf(),
        source: e,
    })?;

    let mut config = load_config_from_str(&content)?;

    // Relative directories are relative to the config file
    if let Some(base) = path.parent() {
        if config.data_directory.is_relative() {
            config.data_directory = base.join(&config.data_directory);
        }
        if config.upload_directory.is_relative() {
            config.upload_directory = base.join(&config.upload_directory);
        }
    }

    Ok(config)
}

pub fn load_config_from_str(content: &str) -> Result<StoreConfig, ConfigError> {
    let config: StoreConfig = serde_json::from_str(content)?;

    validate_config(&config)?;

    Ok(config)
}

fn validate_config(config: &StoreConfig) -> Result<(), ConfigError> {
    if !sanitize::is_single_component(&config.metadata_file) {
        return Err(ConfigError::Validation {
            message: format!(
                "metadata_file must be a plain file name, got '{}'",
                config.metadata_file
            ),
        });
    }

    if !config.public_prefix.starts_with('/') {
        return Err(ConfigError::Validation {
            message: format!(
                "public_prefix must start with '/', got '{}'",
                config.public_prefix
            ),
        });
    }

    if config.upload.max_files == 0 {
        return Err(ConfigError::Validation {
            message: "upload.max_files must be at least 1".to_string(),
        });
    }

    if config.upload.max_file_size == 0 {
        return Err(ConfigError::Validation {
            message: "upload.max_file_size must be at least 1 byte".to_string(),
        });
    }

    if config.upload.allowed_mime_types.is_empty() {
        return Err(ConfigError::Validation {
            message: "upload.allowed_mime_types must not be empty".to_string(),
        });
    }

    if config.writer_queue_capacity == 0 {
        return Err(ConfigError::Validation {
            message: "writer_queue_capacity must be at least 1".to_string(),
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::{DEFAULT_METADATA_FILE, DEFAULT_PUBLIC_PREFIX};
    use crate::upload::PDF_MIME_TYPE;

    #[test]
    fn test_empty_object_uses_defaults() {
        let config = load_config_from_str("{}").unwrap();

        assert_eq!(config.metadata_file, DEFAULT_METADATA_FILE);
        assert_eq!(config.public_prefix, DEFAULT_PUBLIC_PREFIX);
        assert!(config.verify_writable);
        assert_eq!(config.upload.max_files, 20);
        assert_eq!(config.upload.max_file_size, 10 * 1024 * 1024);
        assert_eq!(config.upload.allowed_mime_types, vec![PDF_MIME_TYPE]);
        assert_eq!(config.writer_queue_capacity, 64);
    }

    #[test]
    fn test_load_full_config() {
        let config_json = r#"
        {
            "data_directory": "/srv/pdfshelf/data",
            "metadata_file": "catalog.json",
            "upload_directory": "/srv/pdfshelf/public/uploads/pdfs",
            "public_prefix": "/files",
            "verify_writable": false,
            "upload": {
                "max_files": 5,
                "max_file_size": 1048576
            },
            "writer_queue_capacity": 8
        }
        "#;

        let config = load_config_from_str(config_json).unwrap();
        assert_eq!(
            config.metadata_path(),
            Path::new("/srv/pdfshelf/data/catalog.json")
        );
        assert_eq!(config.public_prefix, "/files");
        assert!(!config.verify_writable);
        assert_eq!(config.upload.max_files, 5);
        assert_eq!(config.upload.allowed_mime_types, vec![PDF_MIME_TYPE]);
        assert_eq!(config.writer_queue_capacity, 8);
    }

    #[test]
    fn test_invalid_json() {
        assert!(matches!(
            load_config_from_str("{ not json"),
            Err(ConfigError::ParseJson(_))
        ));
    }

    #[test]
    fn test_metadata_file_must_be_plain_name() {
        let err = load_config_from_str(r#"{ "metadata_file": "../escape.json" }"#).unwrap_err();
        assert!(matches!(err, ConfigError::Validation { .. }));
    }

    #[test]
    fn test_public_prefix_must_be_absolute() {
        let err = load_config_from_str(r#"{ "public_prefix": "uploads" }"#).unwrap_err();
        assert!(err.to_string().contains("public_prefix"));
    }

    #[test]
    fn test_zero_limits_rejected() {
        assert!(load_config_from_str(r#"{ "upload": { "max_files": 0 } }"#).is_err());
        assert!(load_config_from_str(r#"{ "writer_queue_capacity": 0 }"#).is_err());
        assert!(load_config_from_str(r#"{ "upload": { "allowed_mime_types": [] } }"#).is_err());
    }
}
