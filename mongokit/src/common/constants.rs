/// The store's native primary key field.
pub const DOC_ID: &str = "_id";

/// The application identifier field managed by the identifier policy.
pub const ID_FIELD: &str = "id";

/// Separator for addressing nested fields, e.g. `address.city`.
pub const FIELD_SEPARATOR: char = '.';

pub const DEFAULT_HOST: &str = "localhost";
pub const DEFAULT_PORT: u16 = 27017;
pub const DEFAULT_POOL_SIZE: u32 = 100;
pub const DEFAULT_MULTIPLIER: u32 = 100;
pub const DEFAULT_CONNECT_TIMEOUT_MS: u64 = 10_000;
pub const DEFAULT_DATABASE: &str = "test";

/// Name of the index every collection carries on `_id`.
pub const DEFAULT_INDEX_NAME: &str = "_id_";
