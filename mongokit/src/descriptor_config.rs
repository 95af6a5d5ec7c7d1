//! Descriptor settings as plain data, for loading from configuration files.
//!
//! Any serde format works; the library reads no files itself.
//!
//! ```rust,ignore
//! let config: DescriptorConfig = serde_json::from_str(r#"{
//!     "name": "main",
//!     "hosts": ["db1:27017", "db2:27017"],
//!     "pool_size": 20,
//!     "default_database": "app",
//!     "databases": {
//!         "app": { "create_id": false, "collections": { "users": { "create_id": true } } }
//!     }
//! }"#)?;
//! let descriptor = Descriptor::from_config(&config, Arc::new(InMemoryConnector::new()))?;
//! ```

use crate::descriptor::Descriptor;
use crate::descriptor_builder::DescriptorBuilder;
use crate::errors::MongoKitResult;
use crate::options::{DatabaseOptions, ReadPreference, WriteConcern};
use crate::store::StoreConnector;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt::{Debug, Formatter};
use std::sync::Arc;
use std::time::Duration;

#[derive(Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CredentialConfig {
    pub username: String,
    pub source: String,
    pub password: String,
}

impl Debug for CredentialConfig {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialConfig")
            .field("username", &self.username)
            .field("source", &self.source)
            .field("password", &"***")
            .finish()
    }
}

/// Serializable form of a descriptor. Unset values keep the builder's
/// defaults.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DescriptorConfig {
    pub name: String,
    pub hosts: Vec<String>,
    pub credentials: Vec<CredentialConfig>,
    pub pool_size: Option<u32>,
    pub connect_timeout_ms: Option<u64>,
    pub multiplier: Option<u32>,
    pub default_database: Option<String>,
    pub create_id: Option<bool>,
    pub replicas: bool,
    pub read_preference: Option<ReadPreference>,
    pub write_concern: Option<WriteConcern>,
    pub databases: IndexMap<String, DatabaseOptions>,
}

impl DescriptorConfig {
    /// A builder preloaded with this configuration; the connector is still
    /// to be set.
    pub fn to_builder(&self) -> DescriptorBuilder {
        let mut builder = Descriptor::builder(&self.name);
        for host in &self.hosts {
            builder = builder.address(host);
        }
        for credential in &self.credentials {
            builder = builder.credential(&credential.username, &credential.source, &credential.password);
        }
        if let Some(pool_size) = self.pool_size {
            builder = builder.pool_size(pool_size);
        }
        if let Some(timeout) = self.connect_timeout_ms {
            builder = builder.connect_timeout(Duration::from_millis(timeout));
        }
        if let Some(multiplier) = self.multiplier {
            builder = builder.multiplier(multiplier);
        }
        if let Some(database) = &self.default_database {
            builder = builder.default_database(database);
        }
        if let Some(create_id) = self.create_id {
            builder = builder.create_id(create_id);
        }
        if let Some(read_preference) = self.read_preference {
            builder = builder.read_preference(read_preference);
        }
        if let Some(write_concern) = self.write_concern {
            builder = builder.write_concern(write_concern);
        }
        for (name, options) in &self.databases {
            builder = builder.database(name, options.clone());
        }
        builder.replicas(self.replicas)
    }
}

impl Descriptor {
    pub fn from_config(config: &DescriptorConfig, connector: Arc<dyn StoreConnector>) -> MongoKitResult<Descriptor> {
        config.to_builder().shared_connector(connector).build()
    }
}
