use crate::common::Value;

/// Options for controlling update operations.
///
/// # Examples
///
/// ```rust,ignore
/// use mongokit::collection::UpdateOptions;
///
/// // update every match, insert when nothing matches
/// let options = UpdateOptions::new(true, true);
///
/// let options = UpdateOptions::just_once();
/// let options = UpdateOptions::insert_if_absent();
/// ```
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct UpdateOptions {
    upsert: bool,
    multi: bool,
}

impl UpdateOptions {
    /// * `upsert` - insert a document built from the filter and the update
    ///   when nothing matches
    /// * `multi` - update every match instead of only the first
    pub fn new(upsert: bool, multi: bool) -> Self {
        UpdateOptions { upsert, multi }
    }

    /// Updates the first match only.
    pub fn just_once() -> Self {
        UpdateOptions::new(false, false)
    }

    /// Updates every match, inserting when nothing matches.
    pub fn insert_if_absent() -> Self {
        UpdateOptions::new(true, true)
    }

    pub fn is_upsert(&self) -> bool {
        self.upsert
    }

    pub fn is_multi(&self) -> bool {
        self.multi
    }
}

/// Outcome of an update as reported by the store.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct UpdateResult {
    matched_count: u64,
    modified_count: u64,
    upserted_id: Option<Value>,
}

impl UpdateResult {
    pub fn new(matched_count: u64, modified_count: u64, upserted_id: Option<Value>) -> Self {
        UpdateResult {
            matched_count,
            modified_count,
            upserted_id,
        }
    }

    pub fn matched_count(&self) -> u64 {
        self.matched_count
    }

    pub fn modified_count(&self) -> u64 {
        self.modified_count
    }

    /// The `_id` of the inserted document when the update upserted.
    pub fn upserted_id(&self) -> Option<&Value> {
        self.upserted_id.as_ref()
    }
}

/// Options for index creation.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct IndexOptions {
    name: Option<String>,
    unique: bool,
}

impl IndexOptions {
    pub fn new() -> Self {
        IndexOptions::default()
    }

    /// Overrides the generated name (`field_direction` pairs joined by `_`).
    pub fn name(mut self, name: &str) -> Self {
        self.name = Some(name.to_string());
        self
    }

    pub fn unique(mut self, unique: bool) -> Self {
        self.unique = unique;
        self
    }

    pub fn index_name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn is_unique(&self) -> bool {
        self.unique
    }
}
