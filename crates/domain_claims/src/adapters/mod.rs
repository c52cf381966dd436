//! Adapters for the claims record port
//!
//! - **InMemoryClaimRecords**: records held in process memory, optionally
//!   seeded from a JSON snapshot. Used by the server binary when no external
//!   store is wired in, and throughout the test suite.

pub mod in_memory;

pub use in_memory::{InMemoryClaimRecords, RecordSnapshot};
