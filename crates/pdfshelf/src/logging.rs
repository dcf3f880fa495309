//! Process-wide log/tracing setup.
//!
//! Store code logs through the `log` macros and opens `tracing` spans; both
//! end up in the same subscriber once [`init`] has run.

use std::sync::OnceLock;

use tracing_log::LogTracer;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::{fmt, EnvFilter};

pub const DEFAULT_FILTER: &str = "pdfshelf=info";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

static INSTALLED: OnceLock<bool> = OnceLock::new();

/// Installs the global subscriber. `RUST_LOG` overrides `default_filter`.
///
/// Only the first call has an effect; it returns whether the subscriber was
/// installed. Later calls return the same value.
pub fn init(default_filter: &str, format: LogFormat) -> bool {
    *INSTALLED.get_or_init(|| install(default_filter, format))
}

pub fn is_initialized() -> bool {
    INSTALLED.get().copied().unwrap_or(false)
}

fn install(default_filter: &str, format: LogFormat) -> bool {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    let registry = tracing_subscriber::registry().with(filter);

    let result = match format {
        LogFormat::Text => tracing::subscriber::set_global_default(registry.with(fmt::layer())),
        LogFormat::Json => {
            tracing::subscriber::set_global_default(registry.with(fmt::layer().json()))
        }
    };
    if let Err(e) = result {
        eprintln!("pdfshelf: tracing subscriber already installed: {}", e);
        return false;
    }

    // Another `log` backend may own the facade already
    if let Err(e) = LogTracer::init() {
        tracing::warn!("log records will not be forwarded to tracing: {}", e);
    }
    true
}
