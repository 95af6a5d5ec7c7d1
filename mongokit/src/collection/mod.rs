//! Documents, identifiers and the collection and database handles.
//!
//! ```rust,ignore
//! use mongokit::doc;
//! use mongokit::filter::field;
//!
//! let users = client.database("app")?.collection("users")?;
//! let inserted = users.insert_one(doc! { name: "Alice", age: 30 })?;
//!
//! let adults = users.find(&field("age").gte(18)?)?;
//! for user in adults {
//!     println!("{}", user?);
//! }
//! ```
//!
//! # Identifiers
//!
//! The store keys every document by `_id`, assigning an [Identifier] when a
//! document has none. Independently, a collection whose identifier policy is
//! [IdentifierPolicy::Create] writes an application identifier into the `id`
//! field on insert. Query results leave `_id` out unless asked for.

mod collection_handle;
mod database_handle;
mod document;
pub(crate) mod id_generator;
mod identifier;
mod identifier_policy;
mod find_options;
mod update_options;

pub use collection_handle::*;
pub use database_handle::*;
pub use document::*;
pub use find_options::*;
pub use identifier::*;
pub use identifier_policy::*;
pub use update_options::*;
