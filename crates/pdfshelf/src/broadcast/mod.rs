//! Broadcasting modules for change notifications.

pub mod catalog_events;

pub use catalog_events::{CatalogBroadcaster, CatalogChange, CatalogEvent};
