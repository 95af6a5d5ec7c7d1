use crate::common::trimmed;
use crate::connection::{ConnectionSettings, Credential, ServerAddress};
use crate::descriptor::Descriptor;
use crate::errors::{ErrorKind, MongoKitError, MongoKitResult};
use crate::options::{DatabaseOptions, ReadPreference, WriteConcern};
use crate::store::StoreConnector;
use std::sync::Arc;
use std::time::Duration;

fn configuration_error(message: &str) -> MongoKitError {
    log::error!("{}", message);
    MongoKitError::new(message, ErrorKind::ConfigurationError)
}

/// Builds a [Descriptor].
///
/// Setters never fail; the first invalid value is kept and returned by
/// [DescriptorBuilder::build].
pub struct DescriptorBuilder {
    error: Option<MongoKitError>,
    name: String,
    settings: ConnectionSettings,
    connector: Option<Arc<dyn StoreConnector>>,
}

impl DescriptorBuilder {
    pub(crate) fn new(name: &str) -> Self {
        let mut builder = DescriptorBuilder {
            error: None,
            name: name.trim().to_string(),
            settings: ConnectionSettings::default(),
            connector: None,
        };
        if builder.name.is_empty() {
            builder.error = Some(configuration_error("Descriptor name cannot be blank"));
        }
        builder
    }

    fn capture<F>(mut self, f: F) -> Self
    where
        F: FnOnce(&mut ConnectionSettings) -> MongoKitResult<()>,
    {
        if self.error.is_none() {
            if let Err(e) = f(&mut self.settings) {
                self.error = Some(e);
            }
        }
        self
    }

    /// Adds a server by host and port. A blank host is ignored.
    pub fn host(self, host: &str, port: u16) -> Self {
        self.capture(|settings| {
            match trimmed(host) {
                Some(host) => settings.addresses.push(ServerAddress::new(host, port)),
                None => log::warn!("Ignoring blank host"),
            }
            Ok(())
        })
    }

    /// Adds a server given as `host[:port]`. A blank address is ignored.
    pub fn address(self, address: &str) -> Self {
        self.capture(|settings| {
            if trimmed(address).is_none() {
                log::warn!("Ignoring blank server address");
                return Ok(());
            }
            settings.addresses.push(ServerAddress::parse(address)?);
            Ok(())
        })
    }

    pub fn addresses(self, addresses: &[&str]) -> Self {
        addresses.iter().fold(self, |builder, address| builder.address(address))
    }

    pub fn credential(self, username: &str, source: &str, password: &str) -> Self {
        self.capture(|settings| {
            settings.credentials.push(Credential::new(username, source, password)?);
            Ok(())
        })
    }

    /// Maximum pooled connections; raised to 1 when lower.
    pub fn pool_size(self, pool_size: u32) -> Self {
        self.capture(|settings| {
            settings.pool_size = pool_size.max(1);
            Ok(())
        })
    }

    pub fn connect_timeout(self, timeout: Duration) -> Self {
        self.capture(|settings| {
            settings.connect_timeout = timeout;
            Ok(())
        })
    }

    /// Threads allowed to wait for a connection, per pooled connection.
    pub fn multiplier(self, multiplier: u32) -> Self {
        self.capture(|settings| {
            settings.multiplier = multiplier;
            Ok(())
        })
    }

    pub fn replicas(self, replicas: bool) -> Self {
        self.capture(|settings| {
            settings.replicas = replicas;
            Ok(())
        })
    }

    pub fn default_database(self, name: &str) -> Self {
        self.capture(|settings| {
            let name = trimmed(name)
                .ok_or_else(|| configuration_error("Default database name cannot be blank"))?;
            settings.default_database = name.to_string();
            Ok(())
        })
    }

    /// Whether collections create identifiers unless overridden.
    pub fn create_id(self, create_id: bool) -> Self {
        self.capture(|settings| {
            settings.create_id = create_id;
            Ok(())
        })
    }

    pub fn read_preference(self, read_preference: ReadPreference) -> Self {
        self.capture(|settings| {
            settings.read_preference = read_preference;
            Ok(())
        })
    }

    pub fn write_concern(self, write_concern: WriteConcern) -> Self {
        self.capture(|settings| {
            settings.write_concern = write_concern;
            Ok(())
        })
    }

    /// Sets the overrides of database `name`, replacing earlier ones.
    pub fn database(self, name: &str, options: DatabaseOptions) -> Self {
        self.capture(|settings| {
            let name = trimmed(name)
                .ok_or_else(|| configuration_error("Database name cannot be blank"))?;
            settings.databases.insert(name.to_string(), options);
            Ok(())
        })
    }

    pub fn connector<C: StoreConnector + 'static>(self, connector: C) -> Self {
        self.shared_connector(Arc::new(connector))
    }

    /// Uses a connector shared with other descriptors.
    pub fn shared_connector(mut self, connector: Arc<dyn StoreConnector>) -> Self {
        self.connector = Some(connector);
        self
    }

    pub fn build(self) -> MongoKitResult<Descriptor> {
        if let Some(error) = self.error {
            return Err(error);
        }
        let Some(connector) = self.connector else {
            return Err(configuration_error(&format!(
                "Descriptor {} has no store connector",
                self.name
            )));
        };
        Ok(Descriptor::new(self.name, self.settings, connector))
    }
}
