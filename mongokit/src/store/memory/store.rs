use crate::common::{atomic, Atomic};
use crate::errors::{ErrorKind, MongoKitError, MongoKitResult};
use crate::options::CollectionSettings;
use crate::store::memory::collection::{CollectionData, InMemoryCollection};
use crate::store::{DocumentStoreProvider, StoreCollection, StreamTracker};
use dashmap::DashMap;
use itertools::Itertools;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

type CollectionKey = (String, String);

fn key(database: &str, collection: &str) -> CollectionKey {
    (database.to_string(), collection.to_string())
}

/// In-process document store.
///
/// All data lives in memory and is shared by every clone of the store and
/// every connection a [InMemoryConnector](crate::store::memory::InMemoryConnector)
/// hands out for it. Nothing is persisted.
///
/// Besides the store capability it exposes what a test needs to observe:
/// the [StreamTracker] counting open result streams and the settings each
/// collection was opened with.
#[derive(Clone, Default)]
pub struct InMemoryStore {
    inner: Arc<InMemoryStoreInner>,
}

impl InMemoryStore {
    pub fn new() -> InMemoryStore {
        InMemoryStore::default()
    }

    pub fn tracker(&self) -> &StreamTracker {
        self.inner.tracker()
    }

    /// Settings `database.collection` was last opened with.
    pub fn collection_settings(&self, database: &str, collection: &str) -> Option<CollectionSettings> {
        self.inner
            .opened_settings
            .get(&key(database, collection))
            .map(|entry| *entry.value())
    }

    /// Reopens a closed store, keeping its data.
    pub fn reopen(&self) {
        self.inner.closed.store(false, Ordering::SeqCst);
    }
}

impl DocumentStoreProvider for InMemoryStore {
    fn list_database_names(&self) -> MongoKitResult<Vec<String>> {
        self.inner.ensure_open()?;
        Ok(self
            .inner
            .collections
            .iter()
            .map(|entry| entry.key().0.clone())
            .sorted()
            .dedup()
            .collect())
    }

    fn list_collection_names(&self, database: &str) -> MongoKitResult<Vec<String>> {
        self.inner.ensure_open()?;
        Ok(self
            .inner
            .collections
            .iter()
            .filter(|entry| entry.key().0 == database)
            .map(|entry| entry.key().1.clone())
            .sorted()
            .collect())
    }

    fn drop_database(&self, database: &str) -> MongoKitResult<()> {
        self.inner.ensure_open()?;
        self.inner.collections.retain(|(db, _), _| db != database);
        log::debug!("Dropped database {}", database);
        Ok(())
    }

    fn collection(&self, database: &str, name: &str, settings: &CollectionSettings) -> MongoKitResult<StoreCollection> {
        self.inner.ensure_open()?;
        self.inner.opened_settings.insert(key(database, name), *settings);
        Ok(StoreCollection::new(InMemoryCollection::new(
            self.inner.clone(),
            database,
            name,
            *settings,
        )))
    }

    fn close(&self) -> MongoKitResult<()> {
        self.inner.closed.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn is_closed(&self) -> bool {
        self.inner.closed.load(Ordering::SeqCst)
    }
}

#[derive(Default)]
pub(crate) struct InMemoryStoreInner {
    collections: DashMap<CollectionKey, Atomic<CollectionData>>,
    opened_settings: DashMap<CollectionKey, CollectionSettings>,
    closed: AtomicBool,
    tracker: StreamTracker,
}

impl InMemoryStoreInner {
    pub(crate) fn ensure_open(&self) -> MongoKitResult<()> {
        if self.closed.load(Ordering::SeqCst) {
            log::error!("In-memory store is closed");
            return Err(MongoKitError::new(
                "In-memory store is closed",
                ErrorKind::ConnectionError,
            ));
        }
        Ok(())
    }

    pub(crate) fn tracker(&self) -> &StreamTracker {
        &self.tracker
    }

    pub(crate) fn data(&self, database: &str, collection: &str) -> Option<Atomic<CollectionData>> {
        self.collections
            .get(&key(database, collection))
            .map(|entry| entry.value().clone())
    }

    pub(crate) fn data_or_create(&self, database: &str, collection: &str) -> Atomic<CollectionData> {
        self.collections
            .entry(key(database, collection))
            .or_insert_with(|| atomic(CollectionData::new()))
            .value()
            .clone()
    }

    pub(crate) fn remove(&self, database: &str, collection: &str) {
        self.collections.remove(&key(database, collection));
    }
}
