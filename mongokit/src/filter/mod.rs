//! Query filters for selecting documents from collections.
//!
//! Filters are immutable trees over a closed set of operators. They are
//! built with the fluent API and rendered into the store's native query form
//! (a document using `$` operators) only when an operation runs.
//!
//! # Creating Filters
//!
//! - `field("age").gt(30)?` - comparison operators
//! - `field("name").eq("Alice")?` - equality checks
//! - `field("tags").in_values(vec!["a", "b"])?` - membership
//! - `and(vec![..])`, `or(vec![..])`, `not(..)` - logical combinations
//! - `all()` - match every document
//! - `raw(doc! {..})` - pass a native filter through untouched
//!
//! Every leaf names exactly one field. A blank field name is rejected with
//! `ErrorKind::InvalidArgument` when the leaf is built, before any I/O.
//!
//! # Examples
//!
//! ```rust,ignore
//! use mongokit::filter::{field, and, not};
//!
//! let adults = field("age").gte(18)?;
//! let active = field("status").eq("active")?;
//! let filter = and(vec![adults, not(active)]);
//! let results = collection.find(&filter)?;
//! ```
//!
//! # Rendering
//!
//! | Filter | Native form |
//! |--------|-------------|
//! | `field("a").eq(1)` | `{"a": {"$eq": 1}}` |
//! | `and([f, g])` | `{"$and": [f, g]}` |
//! | `and([])` / `all()` | `{}` |
//! | `or([f, g])` | `{"$or": [f, g]}` |
//! | `or([])` | `{"$nor": [{}]}` (matches nothing) |
//! | `not(f)` | `{"$nor": [f]}` |

mod filter;
mod fluent;
mod logical_filters;

pub use filter::*;
pub use fluent::*;
pub use logical_filters::*;
