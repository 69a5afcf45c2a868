//! Test Utilities Crate
//!
//! Provides shared test infrastructure, fixtures, and helpers for the
//! CRM entity bridge test suite.
//!
//! # Modules
//!
//! - `fixtures`: CRM field metadata, option lists and records for common entity kinds
//! - `builders`: Builder patterns for metadata and fully wired storage harnesses
//! - `assertions`: Custom assertion helpers for descriptors and CRM params
//! - `generators`: Property-based test data generators
//! - `logging`: One-time tracing subscriber installation for tests

pub mod fixtures;
pub mod builders;
pub mod assertions;
pub mod generators;
pub mod logging;

pub use fixtures::*;
pub use builders::*;
pub use assertions::*;
pub use generators::*;
pub use logging::init_test_tracing;
