use crate::collection::Document;
use crate::common::{trimmed, SortOrder, Value, DOC_ID};
use indexmap::IndexMap;
use itertools::Itertools;
use std::fmt::{Display, Formatter};

/// Whether a projected field is returned or suppressed.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Projection {
    Include,
    Exclude,
}

/// A directive attached to a field of a [FieldSpec].
pub trait Directive: Copy + PartialEq {
    /// Native rendering of the directive, e.g. `1` or `-1`.
    fn to_value(&self) -> Value;
}

impl Directive for SortOrder {
    fn to_value(&self) -> Value {
        match self {
            SortOrder::Ascending => Value::I64(1),
            SortOrder::Descending => Value::I64(-1),
        }
    }
}

impl Directive for Projection {
    fn to_value(&self) -> Value {
        match self {
            Projection::Include => Value::I64(1),
            Projection::Exclude => Value::I64(0),
        }
    }
}

/// An ordered mapping of field names to directives.
///
/// Order is significant: a sort applies its keys left to right. Specs are
/// combined with [FieldSpec::merge], which processes its inputs in order and,
/// for a field already present, removes it and re-appends it with the later
/// directive. Merging is therefore not commutative:
///
/// ```rust,ignore
/// use mongokit::common::{FieldSpec, SortSpec};
///
/// let merged = FieldSpec::merge([
///     &SortSpec::ascending_by(&["a", "b"]),
///     &SortSpec::descending_by(&["a"]),
/// ]);
/// // b: 1, a: -1
/// ```
///
/// Blank field names are skipped wherever a spec is built or merged.
#[derive(Clone, Debug, PartialEq)]
pub struct FieldSpec<D: Directive> {
    entries: IndexMap<String, D>,
}

/// Sort keys in priority order.
pub type SortSpec = FieldSpec<SortOrder>;

/// Fields to include in or exclude from returned documents.
pub type ProjectionSpec = FieldSpec<Projection>;

impl<D: Directive> FieldSpec<D> {
    pub fn new() -> Self {
        FieldSpec {
            entries: IndexMap::new(),
        }
    }

    /// Builds a spec applying one directive to every field, in order.
    pub fn with_fields(fields: &[&str], directive: D) -> Self {
        let mut spec = FieldSpec::new();
        for field in fields {
            spec.append(field, directive);
        }
        spec
    }

    /// Merges specs left to right using remove-then-append.
    pub fn merge<'a, I>(specs: I) -> Self
    where
        I: IntoIterator<Item = &'a FieldSpec<D>>,
        D: 'a,
    {
        let mut merged = FieldSpec::new();
        for spec in specs {
            for (field, directive) in &spec.entries {
                merged.append(field, *directive);
            }
        }
        merged
    }

    /// Returns `self` merged with `other`; `other` wins on shared fields.
    pub fn then(&self, other: &FieldSpec<D>) -> Self {
        FieldSpec::merge([self, other])
    }

    fn append(&mut self, field: &str, directive: D) {
        if let Some(field) = trimmed(field) {
            self.entries.shift_remove(field);
            self.entries.insert(field.to_string(), directive);
        }
    }

    pub fn directive(&self, field: &str) -> Option<D> {
        self.entries.get(field).copied()
    }

    pub fn contains(&self, field: &str) -> bool {
        self.entries.contains_key(field)
    }

    pub fn fields(&self) -> Vec<&str> {
        self.entries.keys().map(String::as_str).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, D)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), *v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Renders the native form, e.g. `{"a": 1, "b": -1}`.
    pub fn to_document(&self) -> Document {
        self.entries
            .iter()
            .map(|(field, directive)| (field.clone(), directive.to_value()))
            .collect()
    }
}

impl<D: Directive> Default for FieldSpec<D> {
    fn default() -> Self {
        FieldSpec::new()
    }
}

impl<D: Directive> Display for FieldSpec<D> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{{{}}}",
            self.entries
                .iter()
                .map(|(k, v)| format!("{:?}: {}", k, v.to_value()))
                .join(", ")
        )
    }
}

impl FieldSpec<SortOrder> {
    pub fn ascending_by(fields: &[&str]) -> Self {
        FieldSpec::with_fields(fields, SortOrder::Ascending)
    }

    pub fn descending_by(fields: &[&str]) -> Self {
        FieldSpec::with_fields(fields, SortOrder::Descending)
    }

    /// Reads a sort spec back from its native form; non-numeric or zero
    /// directives are skipped.
    pub fn from_document(document: &Document) -> Self {
        let mut spec = FieldSpec::new();
        for (field, value) in document.iter() {
            if let Some(order) = SortOrder::from_native(value) {
                spec.append(field, order);
            }
        }
        spec
    }
}

impl FieldSpec<Projection> {
    pub fn include(fields: &[&str]) -> Self {
        FieldSpec::with_fields(fields, Projection::Include)
    }

    pub fn exclude(fields: &[&str]) -> Self {
        FieldSpec::with_fields(fields, Projection::Exclude)
    }

    /// The default projection: everything except the store's `_id`.
    pub fn excluding_identifier() -> Self {
        FieldSpec::exclude(&[DOC_ID])
    }

    /// Whether documents projected with this spec keep `_id`.
    pub fn returns_identifier(&self) -> bool {
        self.directive(DOC_ID) != Some(Projection::Exclude)
    }

    /// Reads a projection back from its native form. Truthy values include,
    /// falsy values exclude.
    pub fn from_document(document: &Document) -> Self {
        let mut spec = FieldSpec::new();
        for (field, value) in document.iter() {
            let include = match value {
                Value::Bool(b) => *b,
                other => other.as_f64().map(|n| n != 0.0).unwrap_or(true),
            };
            let directive = if include {
                Projection::Include
            } else {
                Projection::Exclude
            };
            spec.append(field, directive);
        }
        spec
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::doc;

    #[test]
    fn merge_removes_then_appends() {
        let merged = FieldSpec::merge([
            &SortSpec::ascending_by(&["a", "b"]),
            &SortSpec::descending_by(&["a"]),
        ]);
        assert_eq!(merged.fields(), vec!["b", "a"]);
        assert_eq!(merged.directive("b"), Some(SortOrder::Ascending));
        assert_eq!(merged.directive("a"), Some(SortOrder::Descending));
    }

    #[test]
    fn merge_is_not_commutative() {
        let left = SortSpec::ascending_by(&["a", "b"]);
        let right = SortSpec::descending_by(&["a"]);
        assert_ne!(left.then(&right), right.then(&left));
        assert_eq!(right.then(&left).fields(), vec!["a", "b"]);
    }

    #[test]
    fn blank_fields_are_skipped() {
        let spec = SortSpec::ascending_by(&["a", " ", "", "b"]);
        assert_eq!(spec.fields(), vec!["a", "b"]);
        let merged = spec.then(&SortSpec::descending_by(&["   "]));
        assert_eq!(merged.len(), 2);
    }

    #[test]
    fn renders_native_form() {
        let spec = SortSpec::ascending_by(&["age"]).then(&SortSpec::descending_by(&["name"]));
        assert_eq!(spec.to_document(), doc! { age: 1, name: (-1) });
        assert_eq!(spec.to_string(), r#"{"age": 1, "name": -1}"#);
    }

    #[test]
    fn projection_identifier_sentinel() {
        let default = ProjectionSpec::excluding_identifier();
        assert_eq!(default.to_document(), doc! { "_id": 0 });
        assert!(!default.returns_identifier());

        let with_id = default.then(&ProjectionSpec::include(&["_id"]));
        assert!(with_id.returns_identifier());
        assert!(ProjectionSpec::include(&["name"]).returns_identifier());
    }

    #[test]
    fn sort_from_document_round_trips_order() {
        let spec = SortSpec::from_document(&doc! { b: (-1), a: 1, c: "x" });
        assert_eq!(spec.fields(), vec!["b", "a"]);
    }

    #[test]
    fn projection_from_document() {
        let spec = ProjectionSpec::from_document(&doc! { name: 1, secret: false });
        assert_eq!(spec.directive("name"), Some(Projection::Include));
        assert_eq!(spec.directive("secret"), Some(Projection::Exclude));
    }
}
