use crate::client::Client;
use crate::connection::{ConnectionSettings, Credential, ServerAddress};
use crate::descriptor_builder::DescriptorBuilder;
use crate::errors::MongoKitResult;
use crate::store::StoreConnector;
use parking_lot::Mutex;
use std::fmt::{Debug, Formatter};
use std::sync::Arc;
use std::time::Duration;

/// A named set of connection parameters with its override tree.
///
/// A descriptor connects lazily: the first call to [Descriptor::client]
/// opens the connection through the descriptor's [StoreConnector] and later
/// calls reuse it until the descriptor is closed.
///
/// # Examples
///
/// ```rust,ignore
/// use mongokit::{Descriptor, options::{DatabaseOptions, CollectionOptions}};
/// use mongokit::store::memory::InMemoryConnector;
///
/// let descriptor = Descriptor::builder("main")
///     .address("db1.example.com:27017")
///     .pool_size(20)
///     .default_database("app")
///     .database(
///         "app",
///         DatabaseOptions::new()
///             .create_id(false)
///             .collection("users", CollectionOptions::new().create_id(true)),
///     )
///     .connector(InMemoryConnector::new())
///     .build()?;
///
/// let users = descriptor.client()?.default_database()?.collection("users")?;
/// ```
#[derive(Clone)]
pub struct Descriptor {
    inner: Arc<DescriptorInner>,
}

struct DescriptorInner {
    name: String,
    settings: ConnectionSettings,
    connector: Arc<dyn StoreConnector>,
    client: Mutex<Option<Client>>,
}

impl Descriptor {
    pub fn builder(name: &str) -> DescriptorBuilder {
        DescriptorBuilder::new(name)
    }

    pub(crate) fn new(name: String, settings: ConnectionSettings, connector: Arc<dyn StoreConnector>) -> Self {
        Descriptor {
            inner: Arc::new(DescriptorInner {
                name,
                settings,
                connector,
                client: Mutex::new(None),
            }),
        }
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    pub fn settings(&self) -> &ConnectionSettings {
        &self.inner.settings
    }

    pub fn addresses(&self) -> Vec<ServerAddress> {
        self.inner.settings.addresses()
    }

    pub fn credentials(&self) -> &[Credential] {
        self.inner.settings.credentials()
    }

    pub fn pool_size(&self) -> u32 {
        self.inner.settings.pool_size()
    }

    pub fn connect_timeout(&self) -> Duration {
        self.inner.settings.connect_timeout()
    }

    pub fn multiplier(&self) -> u32 {
        self.inner.settings.multiplier()
    }

    pub fn default_database(&self) -> &str {
        self.inner.settings.default_database()
    }

    pub fn create_id(&self) -> bool {
        self.inner.settings.create_id()
    }

    pub fn is_replica_set(&self) -> bool {
        self.inner.settings.is_replica_set()
    }

    /// The connected client, connecting on first use.
    pub fn client(&self) -> MongoKitResult<Client> {
        let mut guard = self.inner.client.lock();
        if let Some(client) = guard.as_ref() {
            if !client.is_closed() {
                return Ok(client.clone());
            }
        }

        log::info!(
            "Connecting descriptor {} to {:?}",
            self.inner.name,
            self.inner.settings.addresses()
        );
        let store = self.inner.connector.connect(&self.inner.settings)?;
        let client = Client::new(store, self.inner.settings.clone());
        *guard = Some(client.clone());
        Ok(client)
    }

    /// Whether a client was created and is still open.
    pub fn is_connected(&self) -> bool {
        self.inner
            .client
            .lock()
            .as_ref()
            .map(|client| !client.is_closed())
            .unwrap_or(false)
    }

    /// Closes the client if one was created. A later [Descriptor::client]
    /// call connects again.
    pub fn close(&self) -> MongoKitResult<()> {
        let client = self.inner.client.lock().take();
        match client {
            Some(client) => {
                log::info!("Closing descriptor {}", self.inner.name);
                client.close()
            }
            None => Ok(()),
        }
    }
}

impl Debug for Descriptor {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Descriptor")
            .field("name", &self.inner.name)
            .field("settings", &self.inner.settings)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::doc;
    use crate::errors::{ErrorKind, MongoKitError};
    use crate::store::memory::InMemoryConnector;
    use crate::store::DocumentStore;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingConnector {
        delegate: InMemoryConnector,
        connects: Arc<AtomicUsize>,
    }

    impl StoreConnector for CountingConnector {
        fn connect(&self, settings: &ConnectionSettings) -> MongoKitResult<DocumentStore> {
            self.connects.fetch_add(1, Ordering::SeqCst);
            self.delegate.connect(settings)
        }
    }

    struct RefusingConnector;

    impl StoreConnector for RefusingConnector {
        fn connect(&self, _settings: &ConnectionSettings) -> MongoKitResult<DocumentStore> {
            Err(MongoKitError::new("connection refused", ErrorKind::ConnectionError))
        }
    }

    #[test]
    fn connects_lazily_once() {
        let connects = Arc::new(AtomicUsize::new(0));
        let descriptor = Descriptor::builder("main")
            .connector(CountingConnector {
                delegate: InMemoryConnector::new(),
                connects: connects.clone(),
            })
            .build()
            .unwrap();

        assert!(!descriptor.is_connected());
        assert_eq!(connects.load(Ordering::SeqCst), 0);

        let client = descriptor.client().unwrap();
        client
            .default_database()
            .unwrap()
            .collection("c")
            .unwrap()
            .insert_one(doc! { n: 1 })
            .unwrap();
        descriptor.client().unwrap();
        assert!(descriptor.is_connected());
        assert_eq!(connects.load(Ordering::SeqCst), 1);

        descriptor.close().unwrap();
        assert!(!descriptor.is_connected());
        assert!(client.is_closed());
        descriptor.close().unwrap();

        let count = descriptor
            .client()
            .unwrap()
            .default_database()
            .unwrap()
            .collection("c")
            .unwrap()
            .count()
            .unwrap();
        assert_eq!(count, 1);
        assert_eq!(connects.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn connect_errors_propagate() {
        let descriptor = Descriptor::builder("main")
            .connector(RefusingConnector)
            .build()
            .unwrap();
        let err = descriptor.client().err().unwrap();
        assert_eq!(err.kind(), &ErrorKind::ConnectionError);
        assert!(!descriptor.is_connected());
        descriptor.close().unwrap();
    }

    #[test]
    fn accessors_expose_settings() {
        let descriptor = Descriptor::builder("main")
            .address("db:27018")
            .pool_size(5)
            .replicas(true)
            .connector(InMemoryConnector::new())
            .build()
            .unwrap();
        assert_eq!(descriptor.name(), "main");
        assert_eq!(descriptor.addresses(), vec![ServerAddress::new("db", 27018)]);
        assert_eq!(descriptor.pool_size(), 5);
        assert!(descriptor.is_replica_set());
        assert_eq!(descriptor.default_database(), "test");
        assert!(!format!("{:?}", descriptor).is_empty());
    }
}
