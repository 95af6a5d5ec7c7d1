use crate::common::{
    require_non_blank, Numeric, Value, ValueNormalizer, FIELD_SEPARATOR,
};
use crate::errors::{ErrorKind, MongoKitError, MongoKitResult};
use indexmap::IndexMap;
use itertools::Itertools;
use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};
use std::fmt::{Debug, Display, Formatter};

/// An ordered set of field/value pairs.
///
/// Fields keep their insertion order for iteration and display, but two
/// documents holding the same pairs are equal regardless of order. Keys are
/// never blank.
///
/// Dotted keys address embedded fields: `put("address.city", "NYC")` creates
/// the `address` document when it is missing, and `get("tags.0")` reads the
/// first element of the `tags` array.
///
/// # Examples
///
/// ```rust,ignore
/// use mongokit::doc;
/// use mongokit::collection::Document;
///
/// let mut document = doc! {
///     name: "Alice",
///     address: { city: "New York" },
/// };
/// document.put("address.zip", 10001)?;
/// assert_eq!(document.get_string("address.city"), Some("New York"));
/// ```
#[derive(Clone, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct Document {
    data: IndexMap<String, Value>,
}

impl Document {
    pub fn new() -> Self {
        Document {
            data: IndexMap::new(),
        }
    }

    /// Associates `value` with `key`, replacing any existing value in place.
    ///
    /// A dotted key is stored as an embedded path; missing intermediate
    /// documents are created. Fails with `InvalidArgument` for a blank key or
    /// an empty path segment, and with `InvalidOperation` when the path runs
    /// through a value that is neither a document nor an array.
    pub fn put<T: Into<Value>>(&mut self, key: &str, value: T) -> MongoKitResult<()> {
        require_non_blank(key, "document key")?;
        if !key.contains(FIELD_SEPARATOR) {
            self.data.insert(key.to_string(), value.into());
            return Ok(());
        }

        let segments: Vec<&str> = key.split(FIELD_SEPARATOR).collect();
        if segments.iter().any(|s| s.trim().is_empty()) {
            log::error!("Invalid embedded field path {:?}", key);
            return Err(MongoKitError::new(
                &format!("Invalid embedded field path {:?}", key),
                ErrorKind::InvalidArgument,
            ));
        }
        self.put_path(&segments, value.into())
    }

    /// Converts a wide numeric input with `normalizer` and stores it.
    pub fn put_numeric(
        &mut self,
        key: &str,
        numeric: Numeric,
        normalizer: &dyn ValueNormalizer,
    ) -> MongoKitResult<()> {
        let value = normalizer.normalize(numeric)?;
        self.put(key, value)
    }

    #[doc(hidden)]
    pub fn put_literal(&mut self, key: &str, value: Value) {
        if key.trim().is_empty() {
            log::warn!("Ignoring blank document key");
            return;
        }
        self.data.insert(key.to_string(), value);
    }

    fn put_path(&mut self, segments: &[&str], value: Value) -> MongoKitResult<()> {
        let Some((head, rest)) = segments.split_first() else {
            return Ok(());
        };
        if rest.is_empty() {
            self.data.insert(head.to_string(), value);
            return Ok(());
        }

        let child = self
            .data
            .entry(head.to_string())
            .or_insert_with(|| Value::Document(Document::new()));
        if child.is_null() {
            *child = Value::Document(Document::new());
        }
        put_into_value(child, rest, value)
    }

    /// Returns the value for `key`, following dotted paths through embedded
    /// documents and array positions.
    pub fn get(&self, key: &str) -> Option<&Value> {
        if let Some(value) = self.data.get(key) {
            return Some(value);
        }
        if !key.contains(FIELD_SEPARATOR) {
            return None;
        }

        let mut segments = key.split(FIELD_SEPARATOR);
        let mut current = self.data.get(segments.next()?)?;
        for segment in segments {
            current = match current {
                Value::Document(doc) => doc.data.get(segment)?,
                Value::Array(array) => array.get(segment.parse::<usize>().ok()?)?,
                _ => return None,
            };
        }
        Some(current)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut Value> {
        if self.data.contains_key(key) || !key.contains(FIELD_SEPARATOR) {
            return self.data.get_mut(key);
        }

        let mut segments = key.split(FIELD_SEPARATOR);
        let mut current = self.data.get_mut(segments.next()?)?;
        for segment in segments {
            current = match current {
                Value::Document(doc) => doc.data.get_mut(segment)?,
                Value::Array(array) => array.get_mut(segment.parse::<usize>().ok()?)?,
                _ => return None,
            };
        }
        Some(current)
    }

    pub fn get_string(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(Value::as_str)
    }

    pub fn get_i64(&self, key: &str) -> Option<i64> {
        self.get(key).and_then(Value::as_i64)
    }

    pub fn get_f64(&self, key: &str) -> Option<f64> {
        self.get(key).and_then(Value::as_f64)
    }

    pub fn get_bool(&self, key: &str) -> Option<bool> {
        self.get(key).and_then(Value::as_bool)
    }

    pub fn get_document(&self, key: &str) -> Option<&Document> {
        self.get(key).and_then(Value::as_document)
    }

    pub fn get_array(&self, key: &str) -> Option<&Vec<Value>> {
        self.get(key).and_then(Value::as_array)
    }

    /// Removes the value for `key` and returns it. The remaining fields keep
    /// their relative order.
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        if self.data.contains_key(key) || !key.contains(FIELD_SEPARATOR) {
            return self.data.shift_remove(key);
        }

        let (parent, leaf) = key.rsplit_once(FIELD_SEPARATOR)?;
        match self.get_mut(parent)? {
            Value::Document(doc) => doc.data.shift_remove(leaf),
            _ => None,
        }
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Top level field names in insertion order.
    pub fn fields(&self) -> Vec<String> {
        self.data.keys().cloned().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.data.iter()
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Copies every field of `other` into this document. Embedded documents
    /// present on both sides are merged recursively; anything else is
    /// replaced.
    pub fn merge(&mut self, other: &Document) {
        for (key, value) in &other.data {
            match (self.data.get_mut(key), value) {
                (Some(Value::Document(mine)), Value::Document(theirs)) => mine.merge(theirs),
                _ => {
                    self.data.insert(key.clone(), value.clone());
                }
            }
        }
    }

    fn sorted_entries(&self) -> Vec<(&String, &Value)> {
        self.data.iter().sorted_by(|a, b| a.0.cmp(b.0)).collect()
    }
}

fn put_into_value(target: &mut Value, segments: &[&str], value: Value) -> MongoKitResult<()> {
    match target {
        Value::Document(doc) => doc.put_path(segments, value),
        Value::Array(array) => {
            let Some((head, rest)) = segments.split_first() else {
                return Ok(());
            };
            let index = match head.parse::<usize>() {
                Ok(index) if index < array.len() => index,
                _ => {
                    log::error!("Invalid array position {:?} in embedded field path", head);
                    return Err(MongoKitError::new(
                        &format!("Invalid array position {:?} in embedded field path", head),
                        ErrorKind::InvalidOperation,
                    ));
                }
            };
            if rest.is_empty() {
                array[index] = value;
                Ok(())
            } else {
                put_into_value(&mut array[index], rest, value)
            }
        }
        other => {
            log::error!("Cannot traverse into a {} value", other.type_name());
            Err(MongoKitError::new(
                &format!("Cannot traverse into a {} value", other.type_name()),
                ErrorKind::InvalidOperation,
            ))
        }
    }
}

impl PartialEq for Document {
    fn eq(&self, other: &Self) -> bool {
        // IndexMap equality ignores order
        self.data == other.data
    }
}

impl Eq for Document {}

impl PartialOrd for Document {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Document {
    fn cmp(&self, other: &Self) -> Ordering {
        self.sorted_entries().cmp(&other.sorted_entries())
    }
}

impl Display for Document {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{{{}}}",
            self.data
                .iter()
                .map(|(k, v)| format!("{:?}: {}", k, v))
                .join(", ")
        )
    }
}

impl Debug for Document {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        Display::fmt(self, f)
    }
}

impl IntoIterator for Document {
    type Item = (String, Value);
    type IntoIter = indexmap::map::IntoIter<String, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.data.into_iter()
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Document {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut document = Document::new();
        for (key, value) in iter {
            document.put_literal(&key.into(), value.into());
        }
        document
    }
}

impl From<IndexMap<String, Value>> for Document {
    fn from(map: IndexMap<String, Value>) -> Self {
        map.into_iter().collect()
    }
}

impl From<BTreeMap<String, Value>> for Document {
    fn from(map: BTreeMap<String, Value>) -> Self {
        map.into_iter().collect()
    }
}

impl From<HashMap<String, Value>> for Document {
    fn from(map: HashMap<String, Value>) -> Self {
        map.into_iter().collect()
    }
}

/// Strips the quotes `stringify!` leaves around string literal keys.
#[doc(hidden)]
pub fn normalize(value: &str) -> String {
    value.trim_matches('"').to_string()
}

/// Creates a [Document] with JSON-like syntax.
///
/// # Examples
///
/// ```rust,ignore
/// use mongokit::doc;
///
/// let empty = doc! {};
/// let user = doc! {
///     name: "Alice",
///     "first-name": "Al",
///     age: 30,
///     tags: ["admin", "ops"],
///     address: { city: "New York", zip: 10001 },
///     balance: (-12.5),
/// };
/// ```
///
/// Keys are identifiers or string literals. Values are single token trees:
/// wrap negative numbers or other expressions in parentheses.
#[macro_export]
macro_rules! doc {
    ({}) => {
        $crate::collection::Document::new()
    };

    () => {
        $crate::collection::Document::new()
    };

    ({ $($key:tt : $value:tt),* $(,)? }) => {
        $crate::doc!($($key : $value),*)
    };

    ($($key:tt : $value:tt),* $(,)?) => {
        {
            #[allow(unused_imports)]
            use $crate::doc_value;

            let mut doc = $crate::collection::Document::new();
            $(
                doc.put_literal(&$crate::collection::normalize(stringify!($key)), $crate::doc_value!($value));
            )*
            doc
        }
    };
}

/// Helper macro converting the values of [doc!].
#[macro_export]
macro_rules! doc_value {
    ({ $($key:tt : $value:tt),* $(,)? }) => {
        $crate::common::Value::Document($crate::doc!{ $($key : $value),* })
    };

    ([ $($value:tt),* $(,)? ]) => {
        $crate::common::Value::Array(vec![$($crate::doc_value!($value)),*])
    };

    ($value:expr) => {
        $crate::common::Value::from($value)
    };
}
