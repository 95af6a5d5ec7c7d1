use crate::connection::ConnectionSettings;
use crate::errors::MongoKitResult;
use crate::store::memory::InMemoryStore;
use crate::store::{DocumentStore, DocumentStoreProvider, StoreConnector};

/// Connects descriptors to an [InMemoryStore].
///
/// Every connection handed out shares the connector's store, so data
/// written through one descriptor is visible through any other descriptor
/// built with the same connector.
#[derive(Clone, Default)]
pub struct InMemoryConnector {
    store: InMemoryStore,
}

impl InMemoryConnector {
    pub fn new() -> Self {
        InMemoryConnector::default()
    }

    pub fn with_store(store: InMemoryStore) -> Self {
        InMemoryConnector { store }
    }

    pub fn store(&self) -> &InMemoryStore {
        &self.store
    }
}

impl StoreConnector for InMemoryConnector {
    fn connect(&self, settings: &ConnectionSettings) -> MongoKitResult<DocumentStore> {
        let addresses = settings.addresses().iter().map(|a| a.to_string()).collect::<Vec<_>>();
        log::debug!(
            "Opening in-memory connection for {} (pool size {})",
            addresses.join(","),
            settings.pool_size()
        );
        // a connection closed earlier is reopened with its data
        if self.store.is_closed() {
            self.store.reopen();
        }
        Ok(DocumentStore::new(self.store.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::doc;
    use crate::options::CollectionSettings;

    #[test]
    fn connections_share_the_store() {
        let connector = InMemoryConnector::new();
        let first = connector.connect(&ConnectionSettings::default()).unwrap();
        let second = connector.connect(&ConnectionSettings::default()).unwrap();

        first
            .collection("db", "c", &CollectionSettings::default())
            .unwrap()
            .insert_one(&doc! { n: 1 })
            .unwrap();
        assert_eq!(second.list_collection_names("db").unwrap(), vec!["c"]);
    }

    #[test]
    fn reconnect_reopens() {
        let connector = InMemoryConnector::new();
        let store = connector.connect(&ConnectionSettings::default()).unwrap();
        store.close().unwrap();
        assert!(store.is_closed());

        let store = connector.connect(&ConnectionSettings::default()).unwrap();
        assert!(!store.is_closed());
    }
}
