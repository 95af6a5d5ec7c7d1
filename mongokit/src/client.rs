use crate::collection::DatabaseHandle;
use crate::common::require_non_blank;
use crate::connection::ConnectionSettings;
use crate::errors::MongoKitResult;
use crate::store::DocumentStore;
use std::sync::Arc;

/// An open connection to a store, created by a
/// [Descriptor](crate::Descriptor).
///
/// Cloning is cheap; all clones share the connection.
#[derive(Clone)]
pub struct Client {
    inner: Arc<ClientInner>,
}

struct ClientInner {
    store: DocumentStore,
    settings: Arc<ConnectionSettings>,
}

impl Client {
    pub fn new(store: DocumentStore, settings: ConnectionSettings) -> Self {
        Client {
            inner: Arc::new(ClientInner {
                store,
                settings: Arc::new(settings),
            }),
        }
    }

    pub fn settings(&self) -> &ConnectionSettings {
        &self.inner.settings
    }

    pub fn database_names(&self) -> MongoKitResult<Vec<String>> {
        self.inner.store.list_database_names()
    }

    pub fn database(&self, name: &str) -> MongoKitResult<DatabaseHandle> {
        let name = require_non_blank(name, "database name")?;
        Ok(DatabaseHandle::new(
            name,
            self.inner.store.clone(),
            self.inner.settings.clone(),
        ))
    }

    /// The database named by the descriptor's default database setting.
    pub fn default_database(&self) -> MongoKitResult<DatabaseHandle> {
        self.database(self.inner.settings.default_database())
    }

    pub fn close(&self) -> MongoKitResult<()> {
        if self.inner.store.is_closed() {
            return Ok(());
        }
        log::info!("Closing connection to {:?}", self.inner.settings.addresses());
        self.inner.store.close()
    }

    pub fn is_closed(&self) -> bool {
        self.inner.store.is_closed()
    }
}
