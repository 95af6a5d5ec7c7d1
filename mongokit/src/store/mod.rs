//! The store capability this layer drives.
//!
//! A backend implements [DocumentStoreProvider], [StoreCollectionProvider]
//! and [ResultStream]. Every method receives filters, updates and pipelines
//! already rendered into the store's native document form, so a backend
//! only needs to evaluate `$` operator documents. Errors from a backend are
//! propagated to callers unchanged.
//!
//! [memory] contains a complete in-process backend.

mod document_store;
mod find_query;
pub mod memory;
mod result_stream;
mod store_collection;
mod store_connector;

pub use document_store::*;
pub use find_query::*;
pub use result_stream::*;
pub use store_collection::*;
pub use store_connector::*;
