//! Shared test utilities for pdfshelf integration tests.
//!
//! This module provides:
//! - `TestHarness` for an isolated store rooted in a temp directory
//! - Builders for upload requests and seeded documents

pub mod builders;
pub mod harness;

pub use builders::*;
pub use harness::TestHarness;
