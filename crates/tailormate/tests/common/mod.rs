//! Common test utilities for tailormate integration tests.
//!
//! This module provides:
//! - `TestHarness`: a pipeline over an in-memory database with fake services
//! - Test doubles for storage, extraction and the record store
//! - Builders for extraction results and selected files

pub mod builders;
pub mod doubles;
pub mod harness;

pub use builders::*;
pub use doubles::*;
pub use harness::{tailor, TestHarness, TAILOR_ID};
