//! Per-database and per-collection overrides and their resolution.
//!
//! A descriptor carries defaults for identifier creation, read preference
//! and write concern. Any database may override them, and any collection
//! inside a database may override the database. Resolution happens once,
//! when a collection handle is created, and yields [CollectionSettings].

use indexmap::IndexMap;

/// Which members of a replica set serve reads.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum ReadPreference {
    #[default]
    Primary,
    PrimaryPreferred,
    Secondary,
    SecondaryPreferred,
    Nearest,
}

/// The acknowledgement a write waits for.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum WriteConcern {
    Unacknowledged,
    #[default]
    Acknowledged,
    Journaled,
    Majority,
}

/// Overrides for one collection. Unset values inherit from the database.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct CollectionOptions {
    create_id: Option<bool>,
    read_preference: Option<ReadPreference>,
    write_concern: Option<WriteConcern>,
}

impl CollectionOptions {
    pub fn new() -> Self {
        CollectionOptions::default()
    }

    pub fn create_id(mut self, create_id: bool) -> Self {
        self.create_id = Some(create_id);
        self
    }

    pub fn read_preference(mut self, read_preference: ReadPreference) -> Self {
        self.read_preference = Some(read_preference);
        self
    }

    pub fn write_concern(mut self, write_concern: WriteConcern) -> Self {
        self.write_concern = Some(write_concern);
        self
    }

    pub fn create_id_override(&self) -> Option<bool> {
        self.create_id
    }

    pub fn read_preference_override(&self) -> Option<ReadPreference> {
        self.read_preference
    }

    pub fn write_concern_override(&self) -> Option<WriteConcern> {
        self.write_concern
    }
}

/// Overrides for one database and the collections inside it.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct DatabaseOptions {
    create_id: Option<bool>,
    read_preference: Option<ReadPreference>,
    write_concern: Option<WriteConcern>,
    collections: IndexMap<String, CollectionOptions>,
}

impl DatabaseOptions {
    pub fn new() -> Self {
        DatabaseOptions::default()
    }

    pub fn create_id(mut self, create_id: bool) -> Self {
        self.create_id = Some(create_id);
        self
    }

    pub fn read_preference(mut self, read_preference: ReadPreference) -> Self {
        self.read_preference = Some(read_preference);
        self
    }

    pub fn write_concern(mut self, write_concern: WriteConcern) -> Self {
        self.write_concern = Some(write_concern);
        self
    }

    /// Registers overrides for `name`, replacing earlier ones.
    pub fn collection(mut self, name: &str, options: CollectionOptions) -> Self {
        self.collections.insert(name.to_string(), options);
        self
    }

    pub fn collection_options(&self, name: &str) -> Option<&CollectionOptions> {
        self.collections.get(name)
    }

    pub fn collection_names(&self) -> Vec<&str> {
        self.collections.keys().map(String::as_str).collect()
    }

    pub fn create_id_override(&self) -> Option<bool> {
        self.create_id
    }

    pub fn read_preference_override(&self) -> Option<ReadPreference> {
        self.read_preference
    }

    pub fn write_concern_override(&self) -> Option<WriteConcern> {
        self.write_concern
    }
}

/// Fully resolved settings of one collection handle.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct CollectionSettings {
    pub create_id: bool,
    pub read_preference: ReadPreference,
    pub write_concern: WriteConcern,
}

impl CollectionSettings {
    /// Resolves collection override, then database override, then
    /// `defaults`, independently for each setting.
    pub fn resolve(
        defaults: &CollectionSettings,
        database: Option<&DatabaseOptions>,
        collection: &str,
    ) -> CollectionSettings {
        let collection_options = database.and_then(|db| db.collection_options(collection));

        let create_id = collection_options
            .and_then(CollectionOptions::create_id_override)
            .or_else(|| database.and_then(DatabaseOptions::create_id_override))
            .unwrap_or(defaults.create_id);

        let read_preference = collection_options
            .and_then(CollectionOptions::read_preference_override)
            .or_else(|| database.and_then(DatabaseOptions::read_preference_override))
            .unwrap_or(defaults.read_preference);

        let write_concern = collection_options
            .and_then(CollectionOptions::write_concern_override)
            .or_else(|| database.and_then(DatabaseOptions::write_concern_override))
            .unwrap_or(defaults.write_concern);

        CollectionSettings {
            create_id,
            read_preference,
            write_concern,
        }
    }
}
