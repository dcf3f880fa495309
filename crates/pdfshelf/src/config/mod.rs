pub mod loader;
pub mod schema;

pub use loader::{load_config, load_config_from_str};
pub use schema::{StoreConfig, DEFAULT_METADATA_FILE, DEFAULT_PUBLIC_PREFIX};
