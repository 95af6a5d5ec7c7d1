use crate::collection::Document;
use crate::common::{require_non_blank, Value};
use crate::errors::MongoKitResult;
use itertools::Itertools;
use std::fmt::{Display, Formatter};

/// A validated, non-blank field name.
///
/// Dotted names address embedded fields, e.g. `address.city`.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct FieldName(String);

impl FieldName {
    /// Fails with `InvalidArgument` when `name` is blank.
    pub fn new(name: &str) -> MongoKitResult<FieldName> {
        let name = require_non_blank(name, "field name")?;
        Ok(FieldName(name.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for FieldName {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A query predicate over documents.
///
/// `Filter` is a closed sum type. Leaves compare one field against a value;
/// `And`, `Or` and `Not` combine sub filters; `Raw` carries a native filter
/// document as is. Filters are values: combining two filters builds a new
/// tree and never mutates either input.
///
/// Two filters that select the same documents need not be equal, e.g.
/// `and([f, g])` and `and([g, f])` are different trees.
#[derive(Clone, Debug, PartialEq)]
pub enum Filter {
    Eq(FieldName, Value),
    Ne(FieldName, Value),
    Gt(FieldName, Value),
    Gte(FieldName, Value),
    Lt(FieldName, Value),
    Lte(FieldName, Value),
    In(FieldName, Vec<Value>),
    Nin(FieldName, Vec<Value>),
    Exists(FieldName, bool),
    And(Vec<Filter>),
    Or(Vec<Filter>),
    Not(Box<Filter>),
    Raw(Document),
}

impl Filter {
    /// Combines two filters with logical AND.
    ///
    /// An `And` receiver is extended rather than nested.
    pub fn and(self, other: Filter) -> Filter {
        match self {
            Filter::And(mut filters) => {
                filters.push(other);
                Filter::And(filters)
            }
            filter => Filter::And(vec![filter, other]),
        }
    }

    /// Combines two filters with logical OR.
    ///
    /// An `Or` receiver is extended rather than nested.
    pub fn or(self, other: Filter) -> Filter {
        match self {
            Filter::Or(mut filters) => {
                filters.push(other);
                Filter::Or(filters)
            }
            filter => Filter::Or(vec![filter, other]),
        }
    }

    /// Negates this filter.
    pub fn not(self) -> Filter {
        Filter::Not(Box::new(self))
    }

    /// The field a leaf filter references, `None` for combinators and raw
    /// filters.
    pub fn field_name(&self) -> Option<&FieldName> {
        match self {
            Filter::Eq(field, _)
            | Filter::Ne(field, _)
            | Filter::Gt(field, _)
            | Filter::Gte(field, _)
            | Filter::Lt(field, _)
            | Filter::Lte(field, _)
            | Filter::In(field, _)
            | Filter::Nin(field, _)
            | Filter::Exists(field, _) => Some(field),
            _ => None,
        }
    }

    /// Whether this filter is the vacuous `And([])`.
    pub fn matches_all(&self) -> bool {
        matches!(self, Filter::And(filters) if filters.is_empty())
    }

    /// Renders the store's native query document.
    pub fn to_document(&self) -> Document {
        match self {
            Filter::Eq(field, value) => leaf(field, "$eq", value.clone()),
            Filter::Ne(field, value) => leaf(field, "$ne", value.clone()),
            Filter::Gt(field, value) => leaf(field, "$gt", value.clone()),
            Filter::Gte(field, value) => leaf(field, "$gte", value.clone()),
            Filter::Lt(field, value) => leaf(field, "$lt", value.clone()),
            Filter::Lte(field, value) => leaf(field, "$lte", value.clone()),
            Filter::In(field, values) => leaf(field, "$in", Value::Array(values.clone())),
            Filter::Nin(field, values) => leaf(field, "$nin", Value::Array(values.clone())),
            Filter::Exists(field, exists) => leaf(field, "$exists", Value::Bool(*exists)),
            Filter::And(filters) if filters.is_empty() => Document::new(),
            Filter::And(filters) => combinator("$and", filters),
            // an empty disjunction is false: nothing satisfies "none of {}"
            Filter::Or(filters) if filters.is_empty() => combinator("$nor", &[Filter::Raw(Document::new())]),
            Filter::Or(filters) => combinator("$or", filters),
            Filter::Not(filter) => combinator("$nor", std::slice::from_ref(filter.as_ref())),
            Filter::Raw(document) => document.clone(),
        }
    }
}

fn leaf(field: &FieldName, operator: &str, value: Value) -> Document {
    let mut condition = Document::new();
    condition.put_literal(operator, value);

    let mut document = Document::new();
    document.put_literal(field.as_str(), Value::Document(condition));
    document
}

fn combinator(operator: &str, filters: &[Filter]) -> Document {
    let rendered = filters
        .iter()
        .map(|f| Value::Document(f.to_document()))
        .collect_vec();

    let mut document = Document::new();
    document.put_literal(operator, Value::Array(rendered));
    document
}

impl Display for Filter {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_document())
    }
}

impl From<Document> for Filter {
    fn from(document: Document) -> Self {
        Filter::Raw(document)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::doc;
    use crate::errors::ErrorKind;
    use crate::filter::{all, and, field, not, or};

    #[test]
    fn field_name_rejects_blank() {
        assert!(FieldName::new("a.b").is_ok());
        let err = FieldName::new("  ").unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::InvalidArgument);
    }

    #[test]
    fn leaves_render_operator_documents() {
        let filter = field("age").gt(30).unwrap();
        assert_eq!(filter.to_document(), doc! { age: { "$gt": 30 } });

        let filter = field("tags").in_values(vec!["a", "b"]).unwrap();
        assert_eq!(filter.to_document(), doc! { tags: { "$in": ["a", "b"] } });

        let filter = field("deleted").exists(false).unwrap();
        assert_eq!(filter.to_document(), doc! { deleted: { "$exists": false } });
    }

    #[test]
    fn combinators_render_arrays() {
        let a = field("a").eq(1).unwrap();
        let b = field("b").ne(2).unwrap();
        assert_eq!(
            and(vec![a.clone(), b.clone()]).to_document(),
            doc! { "$and": [{ a: { "$eq": 1 } }, { b: { "$ne": 2 } }] }
        );
        assert_eq!(
            or(vec![a.clone(), b]).to_document(),
            doc! { "$or": [{ a: { "$eq": 1 } }, { b: { "$ne": 2 } }] }
        );
        assert_eq!(
            not(a).to_document(),
            doc! { "$nor": [{ a: { "$eq": 1 } }] }
        );
    }

    #[test]
    fn empty_combinators() {
        assert_eq!(all().to_document(), Document::new());
        assert!(all().matches_all());
        assert_eq!(or(vec![]).to_document(), doc! { "$nor": [{}] });
    }

    #[test]
    fn and_order_changes_structure() {
        let f1 = field("a").eq(1).unwrap();
        let f2 = field("b").eq(2).unwrap();
        assert_ne!(
            and(vec![f1.clone(), f2.clone()]),
            and(vec![f2, f1])
        );
    }

    #[test]
    fn method_combinators_flatten() {
        let filter = field("a")
            .eq(1)
            .unwrap()
            .and(field("b").eq(2).unwrap())
            .and(field("c").eq(3).unwrap());
        match filter {
            Filter::And(filters) => assert_eq!(filters.len(), 3),
            other => panic!("unexpected {:?}", other),
        }

        let filter = field("a").eq(1).unwrap().or(field("b").eq(2).unwrap()).not();
        assert!(matches!(filter, Filter::Not(_)));
    }

    #[test]
    fn raw_passes_through() {
        let native = doc! { name: { "$regex": "^A" } };
        assert_eq!(Filter::from(native.clone()).to_document(), native);
    }

    #[test]
    fn field_name_accessor() {
        let filter = field("age").lt(3).unwrap();
        assert_eq!(filter.field_name().map(FieldName::as_str), Some("age"));
        assert!(all().field_name().is_none());
    }
}
