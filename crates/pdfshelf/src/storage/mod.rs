pub mod content;
pub mod metadata;

pub use content::{verify_writable, ContentDirectory, Removal};
pub use metadata::MetadataFile;
