//! Aggregation pipelines.
//!
//! A [Pipeline] is an ordered list of [Stage]s, each rendered as a single key
//! document such as `{"$match": {...}}`. Stages are passed to the store
//! untouched; their semantics are the store's concern.

mod pipeline;

pub use pipeline::*;
