//! In-process backend.
//!
//! [InMemoryStore] evaluates the native operator documents this crate
//! renders: filters, updates, projections, sorts and aggregation pipelines.
//! It backs the test suites and is usable wherever a throwaway store is
//! enough.

mod aggregation;
mod collection;
mod connector;
mod matcher;
mod query;
mod store;
mod updater;

pub use collection::InMemoryCollection;
pub use connector::*;
pub use store::InMemoryStore;
