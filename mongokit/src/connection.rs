use crate::common::{
    DEFAULT_CONNECT_TIMEOUT_MS, DEFAULT_DATABASE, DEFAULT_HOST, DEFAULT_MULTIPLIER,
    DEFAULT_POOL_SIZE, DEFAULT_PORT,
};
use crate::errors::{ErrorKind, MongoKitError, MongoKitResult};
use crate::options::{CollectionSettings, DatabaseOptions, ReadPreference, WriteConcern};
use indexmap::IndexMap;
use secure_string::SecureString;
use std::fmt::{Display, Formatter};
use std::str::FromStr;
use std::time::Duration;

/// A store server to connect to.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct ServerAddress {
    host: String,
    port: u16,
}

impl ServerAddress {
    /// A blank host falls back to `localhost`.
    pub fn new(host: &str, port: u16) -> Self {
        let host = host.trim();
        ServerAddress {
            host: if host.is_empty() {
                DEFAULT_HOST.to_string()
            } else {
                host.to_string()
            },
            port,
        }
    }

    /// Parses `host` or `host:port`; the port defaults to 27017.
    pub fn parse(address: &str) -> MongoKitResult<ServerAddress> {
        let address = address.trim();
        match address.rsplit_once(':') {
            Some((host, port)) => {
                let port = port.trim().parse::<u16>().map_err(|err| {
                    log::error!("Invalid port in server address {:?}: {}", address, err);
                    MongoKitError::new(
                        &format!("Invalid port in server address {:?}", address),
                        ErrorKind::ConfigurationError,
                    )
                })?;
                Ok(ServerAddress::new(host, port))
            }
            None => Ok(ServerAddress::new(address, DEFAULT_PORT)),
        }
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }
}

impl Default for ServerAddress {
    fn default() -> Self {
        ServerAddress::new(DEFAULT_HOST, DEFAULT_PORT)
    }
}

impl Display for ServerAddress {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

impl FromStr for ServerAddress {
    type Err = MongoKitError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ServerAddress::parse(s)
    }
}

/// Login credentials for one authentication database.
///
/// The password is held in a [SecureString]: it is zeroed on drop and never
/// shows up in `Debug` output.
#[derive(Clone, Debug)]
pub struct Credential {
    username: String,
    source: String,
    password: SecureString,
}

impl Credential {
    /// `source` is the database the user is defined in.
    pub fn new(username: &str, source: &str, password: &str) -> MongoKitResult<Credential> {
        if username.trim().is_empty() || source.trim().is_empty() {
            log::error!("Credential user name and source database cannot be blank");
            return Err(MongoKitError::new(
                "Credential user name and source database cannot be blank",
                ErrorKind::ConfigurationError,
            ));
        }

        Ok(Credential {
            username: username.to_string(),
            source: source.to_string(),
            password: SecureString::from(password.to_string()),
        })
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// The clear text password, for handing to the transport.
    pub fn password(&self) -> &str {
        self.password.unsecure()
    }
}

impl PartialEq for Credential {
    fn eq(&self, other: &Self) -> bool {
        self.username == other.username
            && self.source == other.source
            && self.password.unsecure() == other.password.unsecure()
    }
}

/// Everything a [StoreConnector](crate::store::StoreConnector) needs to open
/// a connection, plus the defaults handles resolve their settings from.
#[derive(Clone, Debug, PartialEq)]
pub struct ConnectionSettings {
    pub(crate) addresses: Vec<ServerAddress>,
    pub(crate) credentials: Vec<Credential>,
    pub(crate) pool_size: u32,
    pub(crate) connect_timeout: Duration,
    pub(crate) multiplier: u32,
    pub(crate) replicas: bool,
    pub(crate) default_database: String,
    pub(crate) create_id: bool,
    pub(crate) read_preference: ReadPreference,
    pub(crate) write_concern: WriteConcern,
    pub(crate) databases: IndexMap<String, DatabaseOptions>,
}

impl ConnectionSettings {
    /// Addresses to connect to; `localhost:27017` when none were given.
    pub fn addresses(&self) -> Vec<ServerAddress> {
        if self.addresses.is_empty() {
            vec![ServerAddress::default()]
        } else {
            self.addresses.clone()
        }
    }

    pub fn credentials(&self) -> &[Credential] {
        &self.credentials
    }

    pub fn pool_size(&self) -> u32 {
        self.pool_size
    }

    pub fn connect_timeout(&self) -> Duration {
        self.connect_timeout
    }

    /// How many threads may block waiting for a pooled connection, per
    /// pooled connection.
    pub fn multiplier(&self) -> u32 {
        self.multiplier
    }

    pub fn is_replica_set(&self) -> bool {
        self.replicas
    }

    pub fn default_database(&self) -> &str {
        &self.default_database
    }

    pub fn create_id(&self) -> bool {
        self.create_id
    }

    pub fn database_options(&self, name: &str) -> Option<&DatabaseOptions> {
        self.databases.get(name)
    }

    pub fn databases(&self) -> &IndexMap<String, DatabaseOptions> {
        &self.databases
    }

    /// Descriptor wide defaults every collection starts from.
    pub fn default_collection_settings(&self) -> CollectionSettings {
        CollectionSettings {
            create_id: self.create_id,
            read_preference: self.read_preference,
            write_concern: self.write_concern,
        }
    }
}

impl Default for ConnectionSettings {
    fn default() -> Self {
        ConnectionSettings {
            addresses: Vec::new(),
            credentials: Vec::new(),
            pool_size: DEFAULT_POOL_SIZE,
            connect_timeout: Duration::from_millis(DEFAULT_CONNECT_TIMEOUT_MS),
            multiplier: DEFAULT_MULTIPLIER,
            replicas: false,
            default_database: DEFAULT_DATABASE.to_string(),
            create_id: false,
            read_preference: ReadPreference::default(),
            write_concern: WriteConcern::default(),
            databases: IndexMap::new(),
        }
    }
}
