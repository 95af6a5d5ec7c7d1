use crate::connection::ConnectionSettings;
use crate::errors::MongoKitResult;
use crate::store::DocumentStore;

/// Opens store connections for a [Descriptor](crate::Descriptor).
///
/// A descriptor calls its connector at most once, the first time a client
/// is requested.
pub trait StoreConnector: Send + Sync {
    fn connect(&self, settings: &ConnectionSettings) -> MongoKitResult<DocumentStore>;
}
