use crate::errors::MongoKitResult;
use crate::options::CollectionSettings;
use crate::store::StoreCollection;
use std::ops::Deref;
use std::sync::Arc;

/// A connection to a document store.
///
/// # Thread Safety
/// Implementers must be `Send + Sync`; one connection is shared by every
/// handle created from it.
pub trait DocumentStoreProvider: Send + Sync {
    /// Names of the databases holding at least one collection.
    fn list_database_names(&self) -> MongoKitResult<Vec<String>>;

    fn list_collection_names(&self, database: &str) -> MongoKitResult<Vec<String>>;

    fn drop_database(&self, database: &str) -> MongoKitResult<()>;

    /// Opens a collection with resolved settings. Collections are created
    /// lazily by the store on first write.
    fn collection(
        &self,
        database: &str,
        name: &str,
        settings: &CollectionSettings,
    ) -> MongoKitResult<StoreCollection>;

    /// Releases the connection. Later calls fail with `ConnectionError`.
    fn close(&self) -> MongoKitResult<()>;

    fn is_closed(&self) -> bool;
}

/// Shared handle to a [DocumentStoreProvider].
///
/// Cloning is cheap; all clones use the same connection.
#[derive(Clone)]
pub struct DocumentStore {
    inner: Arc<dyn DocumentStoreProvider>,
}

impl DocumentStore {
    pub fn new<T: DocumentStoreProvider + 'static>(inner: T) -> Self {
        DocumentStore {
            inner: Arc::new(inner),
        }
    }
}

impl Deref for DocumentStore {
    type Target = Arc<dyn DocumentStoreProvider>;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}
