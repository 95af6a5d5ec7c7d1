use crate::collection::{Document, IndexOptions, UpdateResult};
use crate::common::{ProjectionSpec, Value};
use crate::errors::MongoKitResult;
use crate::store::{FindQuery, ResultStream};
use std::ops::Deref;
use std::sync::Arc;

/// One collection of a [DocumentStore](crate::store::DocumentStore).
///
/// Filters, updates and pipeline stages arrive in native form. Methods that
/// return documents lazily return an open [ResultStream] which the caller
/// must close.
pub trait StoreCollectionProvider: Send + Sync {
    fn database_name(&self) -> &str;

    fn name(&self) -> &str;

    fn count(&self, filter: &Document) -> MongoKitResult<u64>;

    fn find(&self, query: &FindQuery) -> MongoKitResult<Box<dyn ResultStream>>;

    fn aggregate(&self, pipeline: &[Document]) -> MongoKitResult<Box<dyn ResultStream>>;

    /// Streams one description document per index, each with at least
    /// `name` and `key`.
    fn list_indexes(&self) -> MongoKitResult<Box<dyn ResultStream>>;

    /// Persists a copy of `document`, assigning `_id` to the copy when it has
    /// none, and returns that `_id`. The argument is never modified.
    fn insert_one(&self, document: &Document) -> MongoKitResult<Value>;

    fn insert_many(&self, documents: &[Document]) -> MongoKitResult<Vec<Value>>;

    fn update_one(
        &self,
        filter: &Document,
        update: &Document,
        upsert: bool,
    ) -> MongoKitResult<UpdateResult>;

    fn update_many(
        &self,
        filter: &Document,
        update: &Document,
        upsert: bool,
    ) -> MongoKitResult<UpdateResult>;

    /// Updates the first match, or every match when `multi` is set, and
    /// returns the first one as modified, projected with `projection`. Never
    /// upserts. `None` when nothing matched.
    fn find_and_update(
        &self,
        filter: &Document,
        update: &Document,
        multi: bool,
        projection: Option<&ProjectionSpec>,
    ) -> MongoKitResult<Option<Document>>;

    /// Returns the number of documents removed.
    fn delete_one(&self, filter: &Document) -> MongoKitResult<u64>;

    fn delete_many(&self, filter: &Document) -> MongoKitResult<u64>;

    /// Distinct values of `field` over the matching documents. Array values
    /// contribute their elements.
    fn distinct(&self, field: &str, filter: &Document) -> MongoKitResult<Vec<Value>>;

    /// Creates an index over `keys` (field → 1 / -1) and returns its name.
    fn create_index(&self, keys: &Document, options: &IndexOptions) -> MongoKitResult<String>;

    fn drop_index(&self, name: &str) -> MongoKitResult<()>;

    /// Drops every index except the one on `_id`.
    fn drop_indexes(&self) -> MongoKitResult<()>;

    fn drop_collection(&self) -> MongoKitResult<()>;
}

/// Shared handle to a [StoreCollectionProvider].
#[derive(Clone)]
pub struct StoreCollection {
    inner: Arc<dyn StoreCollectionProvider>,
}

impl StoreCollection {
    pub fn new<T: StoreCollectionProvider + 'static>(inner: T) -> Self {
        StoreCollection {
            inner: Arc::new(inner),
        }
    }
}

impl Deref for StoreCollection {
    type Target = Arc<dyn StoreCollectionProvider>;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}
