//! Test Utilities Crate
//!
//! Provides shared test infrastructure, fixtures, and helpers for the
//! TISS codec test suite.
//!
//! # Modules
//!
//! - `fixtures`: Pre-built claim records, bundles and dates
//! - `builders`: Builder patterns for claim bundles and records
//! - `assertions`: Occurrence and ordering checks over generated XML
//! - `generators`: Property-based test data generators

pub mod fixtures;
pub mod builders;
pub mod assertions;
pub mod generators;

pub use fixtures::*;
pub use builders::*;
pub use assertions::*;
pub use generators::*;
