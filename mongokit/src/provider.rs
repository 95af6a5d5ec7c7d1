use crate::common::{atomic, require_non_blank, Atomic, Guarded};
use crate::descriptor::Descriptor;
use crate::errors::{ErrorKind, MongoKitError, MongoKitResult};
use indexmap::IndexMap;

/// Outcome of [DescriptorProvider::close].
#[derive(Clone, Debug, Default)]
pub struct CloseReport {
    closed: Vec<String>,
    failures: Vec<(String, MongoKitError)>,
}

impl CloseReport {
    /// Descriptors closed without error, in registration order.
    pub fn closed(&self) -> &[String] {
        &self.closed
    }

    /// Descriptors whose close failed, with the error.
    pub fn failures(&self) -> &[(String, MongoKitError)] {
        &self.failures
    }

    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Registry of descriptors keyed by name.
///
/// Descriptors are registered explicitly at startup. One name is the
/// default, returned by [DescriptorProvider::default_descriptor].
///
/// Cloning is cheap; clones share the registry.
#[derive(Clone)]
pub struct DescriptorProvider {
    default_name: String,
    descriptors: Atomic<IndexMap<String, Descriptor>>,
}

impl DescriptorProvider {
    pub fn new(default_name: &str) -> Self {
        DescriptorProvider {
            default_name: default_name.trim().to_string(),
            descriptors: atomic(IndexMap::new()),
        }
    }

    pub fn default_name(&self) -> &str {
        &self.default_name
    }

    /// Registers `descriptor` under its name. A name can be registered once.
    pub fn register(&self, descriptor: Descriptor) -> MongoKitResult<()> {
        let name = descriptor.name().to_string();
        self.descriptors.write_with(|descriptors| {
            if descriptors.contains_key(&name) {
                log::error!("Descriptor {} is already registered", name);
                return Err(MongoKitError::new(
                    &format!("Descriptor {} is already registered", name),
                    ErrorKind::InvalidOperation,
                ));
            }
            log::info!("Registered descriptor {}", name);
            descriptors.insert(name.clone(), descriptor);
            Ok(())
        })
    }

    /// The descriptor named `name`; `None` when unknown. A blank name fails.
    pub fn descriptor(&self, name: &str) -> MongoKitResult<Option<Descriptor>> {
        let name = require_non_blank(name, "descriptor name")?;
        Ok(self.descriptors.read_with(|descriptors| descriptors.get(name).cloned()))
    }

    pub fn default_descriptor(&self) -> Option<Descriptor> {
        self.descriptors
            .read_with(|descriptors| descriptors.get(&self.default_name).cloned())
    }

    pub fn descriptor_names(&self) -> Vec<String> {
        self.descriptors
            .read_with(|descriptors| descriptors.keys().cloned().collect())
    }

    pub fn len(&self) -> usize {
        self.descriptors.read_with(|descriptors| descriptors.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Closes every descriptor. A failing descriptor is logged and reported
    /// and does not stop the others from closing.
    pub fn close(&self) -> CloseReport {
        let descriptors: Vec<Descriptor> = self
            .descriptors
            .read_with(|descriptors| descriptors.values().cloned().collect());

        let mut report = CloseReport::default();
        for descriptor in descriptors {
            match descriptor.close() {
                Ok(()) => report.closed.push(descriptor.name().to_string()),
                Err(err) => {
                    log::error!("Error while closing descriptor {}: {}", descriptor.name(), err);
                    report.failures.push((descriptor.name().to_string(), err));
                }
            }
        }
        log::info!(
            "Closed {} descriptors, {} failed",
            report.closed.len(),
            report.failures.len()
        );
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::ConnectionSettings;
    use crate::options::CollectionSettings;
    use crate::store::memory::InMemoryConnector;
    use crate::store::{DocumentStore, DocumentStoreProvider, StoreCollection, StoreConnector};

    fn descriptor(name: &str) -> Descriptor {
        Descriptor::builder(name)
            .connector(InMemoryConnector::new())
            .build()
            .unwrap()
    }

    /// A store whose close always fails.
    struct StuckStore;

    impl DocumentStoreProvider for StuckStore {
        fn list_database_names(&self) -> MongoKitResult<Vec<String>> {
            Ok(Vec::new())
        }

        fn list_collection_names(&self, _database: &str) -> MongoKitResult<Vec<String>> {
            Ok(Vec::new())
        }

        fn drop_database(&self, _database: &str) -> MongoKitResult<()> {
            Ok(())
        }

        fn collection(&self, _database: &str, _name: &str, _settings: &CollectionSettings) -> MongoKitResult<StoreCollection> {
            Err(MongoKitError::new("unsupported", ErrorKind::StoreError))
        }

        fn close(&self) -> MongoKitResult<()> {
            Err(MongoKitError::new("socket stuck", ErrorKind::ConnectionError))
        }

        fn is_closed(&self) -> bool {
            false
        }
    }

    struct StuckConnector;

    impl StoreConnector for StuckConnector {
        fn connect(&self, _settings: &ConnectionSettings) -> MongoKitResult<DocumentStore> {
            Ok(DocumentStore::new(StuckStore))
        }
    }

    #[test]
    fn register_and_lookup() {
        let provider = DescriptorProvider::new("main");
        assert!(provider.is_empty());
        assert!(provider.default_descriptor().is_none());

        provider.register(descriptor("main")).unwrap();
        provider.register(descriptor("reporting")).unwrap();
        assert_eq!(provider.descriptor_names(), vec!["main", "reporting"]);
        assert_eq!(provider.default_descriptor().unwrap().name(), "main");
        assert_eq!(provider.descriptor("reporting").unwrap().unwrap().name(), "reporting");
        assert!(provider.descriptor("missing").unwrap().is_none());
        assert_eq!(
            provider.descriptor(" ").unwrap_err().kind(),
            &ErrorKind::InvalidArgument
        );
    }

    #[test]
    fn duplicate_registration_fails() {
        let provider = DescriptorProvider::new("main");
        provider.register(descriptor("main")).unwrap();
        let err = provider.register(descriptor("main")).unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::InvalidOperation);
        assert_eq!(provider.len(), 1);
    }

    #[test]
    fn close_attempts_every_descriptor() {
        let provider = DescriptorProvider::new("first");
        let stuck = Descriptor::builder("stuck").connector(StuckConnector).build().unwrap();
        let first = descriptor("first");
        let last = descriptor("last");
        provider.register(first.clone()).unwrap();
        provider.register(stuck.clone()).unwrap();
        provider.register(last.clone()).unwrap();

        first.client().unwrap();
        stuck.client().unwrap();
        last.client().unwrap();

        let report = provider.close();
        assert!(!report.is_clean());
        assert_eq!(report.closed(), &["first".to_string(), "last".to_string()]);
        assert_eq!(report.failures().len(), 1);
        assert_eq!(report.failures()[0].0, "stuck");
        assert_eq!(report.failures()[0].1.kind(), &ErrorKind::ConnectionError);
        assert!(!first.is_connected());
        assert!(!last.is_connected());
    }
}
