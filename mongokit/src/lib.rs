#![allow(
    clippy::new_without_default,
    clippy::should_implement_trait,
)]
//! # mongokit
//!
//! A typed client-side layer over document stores.
//!
//! mongokit turns filters, sorts, projections, updates and aggregation
//! pipelines built from Rust values into the store's native `$` operator
//! documents, applies per-collection identifier policies, and hands results
//! back through cursors that release their server resources exactly once.
//!
//! ## Key Features
//!
//! - **Fluent filters**: `field("age").gt(30)?`, combined with `and`, `or`
//!   and `not`, validated before any I/O
//! - **Ordered specs**: sort and projection specs with a non-commutative,
//!   remove-then-append merge
//! - **Resource-safe cursors**: auto-close on exhaustion, idempotent close,
//!   close on drop, derived cursors that re-issue the query
//! - **Identifier policy**: optional `id` provisioning per collection,
//!   resolved from collection, database and descriptor settings
//! - **Descriptor registry**: named connection settings connecting lazily,
//!   with best-effort bulk close
//! - **Pluggable stores**: any backend implementing the [store] traits; an
//!   in-memory backend ships in [store::memory]
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use mongokit::{doc, Descriptor, DescriptorProvider};
//! use mongokit::filter::field;
//! use mongokit::store::memory::InMemoryConnector;
//!
//! let provider = DescriptorProvider::new("main");
//! provider.register(
//!     Descriptor::builder("main")
//!         .address("localhost:27017")
//!         .default_database("app")
//!         .create_id(true)
//!         .connector(InMemoryConnector::new())
//!         .build()?,
//! )?;
//!
//! let descriptor = provider.default_descriptor().expect("registered");
//! let users = descriptor.client()?.default_database()?.collection("users")?;
//!
//! let alice = users.insert_one(doc! { name: "Alice", age: 30 })?;
//! println!("assigned id {}", alice.get_string("id").unwrap_or_default());
//!
//! let mut cursor = users.find(&field("age").gte(18)?)?;
//! while cursor.has_next()? {
//!     println!("{}", cursor.next_document()?);
//! }
//!
//! provider.close();
//! ```
//!
//! ## Modules
//!
//! - [collection]: documents, identifiers, collection and database handles
//! - [filter]: the filter tree and its builders
//! - [aggregate]: pipelines and stages
//! - [common]: values, sort and projection specs, cursors
//! - [options]: per-database and per-collection overrides
//! - [store]: the store capability and the in-memory backend
//! - [errors]: the crate error type

use crate::collection::id_generator::IdentifierGenerator;
use std::sync::LazyLock;

pub mod aggregate;
pub mod client;
pub mod collection;
pub mod common;
pub mod connection;
pub mod descriptor;
pub mod descriptor_builder;
#[cfg(feature = "serde")]
pub mod descriptor_config;
pub mod errors;
pub mod filter;
pub mod options;
pub mod provider;
pub mod store;

pub use client::Client;
pub use descriptor::Descriptor;
pub use descriptor_builder::DescriptorBuilder;
#[cfg(feature = "serde")]
pub use descriptor_config::{CredentialConfig, DescriptorConfig};
pub use provider::{CloseReport, DescriptorProvider};

pub(crate) static ID_GENERATOR: LazyLock<IdentifierGenerator> =
    LazyLock::new(IdentifierGenerator::new);
