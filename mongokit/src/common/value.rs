use crate::collection::{Document, Identifier};
use crate::common::StandardNormalizer;
use itertools::Itertools;
use std::cmp::Ordering;
use std::fmt::{Debug, Display, Formatter};

/// A value stored in a [Document].
///
/// `Value` is the closed set of types the layer exchanges with the store.
/// Integer types up to 32 bits (and `i64`) map to `I64`; wider integers are
/// normalized through [StandardNormalizer]: they stay `I64` when they fit and
/// become `F64` otherwise.
///
/// Numbers compare by numeric value regardless of representation, so
/// `Value::I64(2) == Value::F64(2.0)`. Values of different kinds order by
/// kind first: null, numbers, strings, documents, arrays, identifiers,
/// booleans.
///
/// # Examples
///
/// ```rust,ignore
/// use mongokit::common::Value;
///
/// let small = Value::from(42u8);          // I64(42)
/// let wide = Value::from(u64::MAX);       // F64(1.8446744073709552e19)
/// let text = Value::from("hello");        // String("hello")
/// assert_eq!(Value::from(2), Value::from(2.0));
/// ```
#[derive(Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Value {
    Null,
    Bool(bool),
    I64(i64),
    F64(f64),
    String(String),
    Document(Document),
    Array(Vec<Value>),
    Identifier(Identifier),
}

impl Value {
    #[inline]
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    #[inline]
    pub fn is_number(&self) -> bool {
        matches!(self, Value::I64(_) | Value::F64(_))
    }

    #[inline]
    pub fn is_string(&self) -> bool {
        matches!(self, Value::String(_))
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::I64(i) => Some(*i),
            _ => None,
        }
    }

    /// Returns the numeric value widened to `f64`.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::I64(i) => Some(*i as f64),
            Value::F64(f) => Some(*f),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn as_document(&self) -> Option<&Document> {
        match self {
            Value::Document(d) => Some(d),
            _ => None,
        }
    }

    pub fn as_document_mut(&mut self) -> Option<&mut Document> {
        match self {
            Value::Document(d) => Some(d),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&Vec<Value>> {
        match self {
            Value::Array(a) => Some(a),
            _ => None,
        }
    }

    pub fn as_array_mut(&mut self) -> Option<&mut Vec<Value>> {
        match self {
            Value::Array(a) => Some(a),
            _ => None,
        }
    }

    pub fn as_identifier(&self) -> Option<&Identifier> {
        match self {
            Value::Identifier(id) => Some(id),
            _ => None,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::I64(_) => "long",
            Value::F64(_) => "double",
            Value::String(_) => "string",
            Value::Document(_) => "document",
            Value::Array(_) => "array",
            Value::Identifier(_) => "identifier",
        }
    }

    /// Ordering between values of the same kind, `None` across kinds.
    ///
    /// Range operators in the native query form only match within a kind,
    /// e.g. `{"$gt": 5}` never matches a string.
    pub fn compare_within_kind(&self, other: &Value) -> Option<Ordering> {
        if self.kind_rank() == other.kind_rank() {
            Some(self.cmp(other))
        } else {
            None
        }
    }

    fn kind_rank(&self) -> u8 {
        match self {
            Value::Null => 0,
            Value::I64(_) | Value::F64(_) => 1,
            Value::String(_) => 2,
            Value::Document(_) => 3,
            Value::Array(_) => 4,
            Value::Identifier(_) => 5,
            Value::Bool(_) => 6,
        }
    }
}

fn compare_numbers(left: &Value, right: &Value) -> Ordering {
    match (left, right) {
        (Value::I64(a), Value::I64(b)) => a.cmp(b),
        _ => {
            let a = left.as_f64().unwrap_or(f64::NAN);
            let b = right.as_f64().unwrap_or(f64::NAN);
            a.partial_cmp(&b).unwrap_or_else(|| a.total_cmp(&b))
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Value {}

impl PartialOrd for Value {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Value {
    fn cmp(&self, other: &Self) -> Ordering {
        let rank = self.kind_rank().cmp(&other.kind_rank());
        if rank != Ordering::Equal {
            return rank;
        }

        match (self, other) {
            (Value::Null, Value::Null) => Ordering::Equal,
            (Value::Bool(a), Value::Bool(b)) => a.cmp(b),
            (Value::String(a), Value::String(b)) => a.cmp(b),
            (Value::Document(a), Value::Document(b)) => a.cmp(b),
            (Value::Array(a), Value::Array(b)) => a.cmp(b),
            (Value::Identifier(a), Value::Identifier(b)) => a.cmp(b),
            _ => compare_numbers(self, other),
        }
    }
}

impl Display for Value {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::I64(i) => write!(f, "{}", i),
            Value::F64(v) => write!(f, "{:?}", v),
            Value::String(s) => write!(f, "{:?}", s),
            Value::Document(d) => write!(f, "{}", d),
            Value::Array(a) => write!(f, "[{}]", a.iter().join(", ")),
            Value::Identifier(id) => write!(f, "ObjectId(\"{}\")", id),
        }
    }
}

impl Debug for Value {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        Display::fmt(self, f)
    }
}

impl Default for Value {
    fn default() -> Self {
        Value::Null
    }
}

macro_rules! impl_from_small_integer {
    ($($t:ty),*) => {
        $(
            impl From<$t> for Value {
                fn from(value: $t) -> Self {
                    Value::I64(value as i64)
                }
            }
        )*
    };
}

impl_from_small_integer!(i8, i16, i32, i64, u8, u16, u32);

impl From<u64> for Value {
    fn from(value: u64) -> Self {
        StandardNormalizer::unsigned(value as u128)
    }
}

impl From<usize> for Value {
    fn from(value: usize) -> Self {
        StandardNormalizer::unsigned(value as u128)
    }
}

impl From<i128> for Value {
    fn from(value: i128) -> Self {
        StandardNormalizer::integer(value)
    }
}

impl From<u128> for Value {
    fn from(value: u128) -> Self {
        StandardNormalizer::unsigned(value)
    }
}

impl From<f32> for Value {
    fn from(value: f32) -> Self {
        Value::F64(value as f64)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Value::F64(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(value)
    }
}

impl From<&String> for Value {
    fn from(value: &String) -> Self {
        Value::String(value.clone())
    }
}

impl From<Document> for Value {
    fn from(value: Document) -> Self {
        Value::Document(value)
    }
}

impl From<Identifier> for Value {
    fn from(value: Identifier) -> Self {
        Value::Identifier(value)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(value: Vec<T>) -> Self {
        Value::Array(value.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        match value {
            Some(v) => v.into(),
            None => Value::Null,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::doc;

    #[test]
    fn small_integers_become_i64() {
        assert_eq!(Value::from(7u8).as_i64(), Some(7));
        assert_eq!(Value::from(-7i16).as_i64(), Some(-7));
        assert_eq!(Value::from(u32::MAX).as_i64(), Some(u32::MAX as i64));
    }

    #[test]
    fn wide_integers_are_normalized() {
        assert!(matches!(Value::from(42u64), Value::I64(42)));
        assert!(matches!(Value::from(u64::MAX), Value::F64(_)));
        assert!(matches!(Value::from(-5i128), Value::I64(-5)));
        assert!(matches!(Value::from(i128::MAX), Value::F64(_)));
        assert!(matches!(Value::from(10usize), Value::I64(10)));
    }

    #[test]
    fn numbers_compare_across_representations() {
        assert_eq!(Value::from(2), Value::from(2.0));
        assert!(Value::from(1) < Value::from(1.5));
        assert!(Value::from(3.5) > Value::from(3));
        assert_ne!(Value::from(1), Value::from("1"));
    }

    #[test]
    fn kinds_order_null_number_string() {
        let mut values = vec![
            Value::from(true),
            Value::from("a"),
            Value::from(10),
            Value::Null,
        ];
        values.sort();
        assert!(values[0].is_null());
        assert!(values[1].is_number());
        assert!(values[2].is_string());
        assert_eq!(values[3].as_bool(), Some(true));
    }

    #[test]
    fn compare_within_kind_rejects_mixed_kinds() {
        assert_eq!(
            Value::from(5).compare_within_kind(&Value::from(4.5)),
            Some(Ordering::Greater)
        );
        assert_eq!(Value::from(5).compare_within_kind(&Value::from("5")), None);
    }

    #[test]
    fn option_and_vec_conversions() {
        assert!(Value::from(None::<i32>).is_null());
        assert_eq!(Value::from(Some("x")).as_str(), Some("x"));
        let array = Value::from(vec![1, 2, 3]);
        assert_eq!(array.as_array().map(|a| a.len()), Some(3));
    }

    #[test]
    fn display_is_json_like() {
        let value = Value::from(doc! { name: "a", tags: ["x", 1] });
        assert_eq!(value.to_string(), r#"{"name": "a", "tags": ["x", 1]}"#);
        assert_eq!(Value::from(1.5).to_string(), "1.5");
        assert_eq!(Value::Null.to_string(), "null");
    }

    #[test]
    fn type_names() {
        assert_eq!(Value::from(1).type_name(), "long");
        assert_eq!(Value::from(1.0).type_name(), "double");
        assert_eq!(Value::from(doc! {}).type_name(), "document");
    }
}
