use crate::collection::CollectionHandle;
use crate::common::require_non_blank;
use crate::connection::ConnectionSettings;
use crate::errors::MongoKitResult;
use crate::options::CollectionSettings;
use crate::store::DocumentStore;
use std::sync::Arc;

/// A handle to one database of a store.
///
/// Collection handles it creates resolve their settings from the
/// descriptor's per-collection override, then its per-database override,
/// then its defaults.
#[derive(Clone)]
pub struct DatabaseHandle {
    inner: Arc<DatabaseHandleInner>,
}

struct DatabaseHandleInner {
    name: String,
    store: DocumentStore,
    settings: Arc<ConnectionSettings>,
}

impl DatabaseHandle {
    pub(crate) fn new(name: &str, store: DocumentStore, settings: Arc<ConnectionSettings>) -> Self {
        DatabaseHandle {
            inner: Arc::new(DatabaseHandleInner {
                name: name.to_string(),
                store,
                settings,
            }),
        }
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Settings a collection named `name` would be opened with.
    pub fn collection_settings(&self, name: &str) -> CollectionSettings {
        let settings = &self.inner.settings;
        CollectionSettings::resolve(
            &settings.default_collection_settings(),
            settings.database_options(&self.inner.name),
            name,
        )
    }

    /// Opens a handle to the collection `name`. The collection itself is
    /// created by the store on first write.
    pub fn collection(&self, name: &str) -> MongoKitResult<CollectionHandle> {
        let name = require_non_blank(name, "collection name")?;
        let settings = self.collection_settings(name);
        log::debug!(
            "Opening collection {}.{} with {:?}",
            self.inner.name,
            name,
            settings
        );

        let collection = self.inner.store.collection(&self.inner.name, name, &settings)?;
        Ok(CollectionHandle::new(collection, settings))
    }

    pub fn collection_names(&self) -> MongoKitResult<Vec<String>> {
        self.inner.store.list_collection_names(&self.inner.name)
    }

    pub fn is_collection(&self, name: &str) -> MongoKitResult<bool> {
        Ok(self.collection_names()?.iter().any(|c| c == name))
    }

    /// Drops the database with all its collections.
    pub fn drop(&self) -> MongoKitResult<()> {
        log::info!("Dropping database {}", self.inner.name);
        self.inner.store.drop_database(&self.inner.name)
    }
}
