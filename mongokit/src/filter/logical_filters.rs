use crate::collection::Document;

use super::Filter;

/// Creates a filter matching documents that satisfy every filter in
/// `filters`. With no filters it matches every document.
#[inline]
pub fn and(filters: Vec<Filter>) -> Filter {
    Filter::And(filters)
}

/// Creates a filter matching documents that satisfy at least one filter in
/// `filters`. With no filters it matches nothing.
#[inline]
pub fn or(filters: Vec<Filter>) -> Filter {
    Filter::Or(filters)
}

/// Creates a filter matching documents that do not satisfy `filter`.
#[inline]
pub fn not(filter: Filter) -> Filter {
    Filter::Not(Box::new(filter))
}

/// Creates a filter matching every document.
#[inline]
pub fn all() -> Filter {
    Filter::And(Vec::new())
}

/// Wraps a native filter document. The document is not validated.
#[inline]
pub fn raw(document: Document) -> Filter {
    Filter::Raw(document)
}
