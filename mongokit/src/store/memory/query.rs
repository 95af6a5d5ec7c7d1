use crate::collection::Document;
use crate::common::{Projection, ProjectionSpec, SortOrder, SortSpec, Value, DOC_ID};
use crate::errors::{ErrorKind, MongoKitError, MongoKitResult};
use crate::store::memory::matcher::Matcher;
use crate::store::FindQuery;
use std::cmp::Ordering;

/// Runs a find over a snapshot of a collection.
pub(crate) fn execute_find(documents: Vec<Document>, query: &FindQuery) -> MongoKitResult<Vec<Document>> {
    let matcher = Matcher::parse(&query.filter)?;
    let mut selected: Vec<Document> = documents.into_iter().filter(|d| matcher.matches(d)).collect();

    if let Some(sort) = &query.sort {
        sort_documents(&mut selected, sort);
    }

    let skip = query.skip.unwrap_or(0) as usize;
    let limit = match query.limit {
        Some(0) | None => usize::MAX,
        Some(n) => n as usize,
    };
    let page = selected.into_iter().skip(skip).take(limit);

    match &query.projection {
        Some(projection) => page.map(|d| project(&d, projection)).collect(),
        None => Ok(page.collect()),
    }
}

/// Stable sort by every key of `sort`, in order. Missing fields sort as null.
pub(crate) fn sort_documents(documents: &mut [Document], sort: &SortSpec) {
    documents.sort_by(|a, b| compare_by(a, b, sort));
}

fn compare_by(a: &Document, b: &Document, sort: &SortSpec) -> Ordering {
    for (field, order) in sort.iter() {
        let left = a.get(field).unwrap_or(&Value::Null);
        let right = b.get(field).unwrap_or(&Value::Null);
        let ordering = match order {
            SortOrder::Ascending => left.cmp(right),
            SortOrder::Descending => right.cmp(left),
        };
        if ordering != Ordering::Equal {
            return ordering;
        }
    }
    Ordering::Equal
}

/// Applies a projection.
///
/// A projection that includes any field other than `_id` returns only the
/// included fields (plus `_id` unless excluded); otherwise the listed
/// fields are removed. Mixing inclusion and exclusion of other fields is
/// rejected.
pub(crate) fn project(document: &Document, projection: &ProjectionSpec) -> MongoKitResult<Document> {
    let includes: Vec<&str> = projection
        .iter()
        .filter(|(field, directive)| *field != DOC_ID && *directive == Projection::Include)
        .map(|(field, _)| field)
        .collect();
    let excludes: Vec<&str> = projection
        .iter()
        .filter(|(field, directive)| *field != DOC_ID && *directive == Projection::Exclude)
        .map(|(field, _)| field)
        .collect();

    if !includes.is_empty() && !excludes.is_empty() {
        log::error!("Cannot mix inclusion and exclusion in projection {}", projection);
        return Err(MongoKitError::new(
            &format!("Cannot mix inclusion and exclusion in projection {}", projection),
            ErrorKind::StoreError,
        ));
    }

    if includes.is_empty() {
        let mut projected = document.clone();
        for field in excludes {
            projected.remove(field);
        }
        if !projection.returns_identifier() {
            projected.remove(DOC_ID);
        }
        return Ok(projected);
    }

    let mut projected = Document::new();
    if projection.returns_identifier() {
        if let Some(id) = document.get(DOC_ID) {
            projected.put_literal(DOC_ID, id.clone());
        }
    }
    for field in includes {
        if let Some(value) = document.get(field) {
            projected.put(field, value.clone())?;
        }
    }
    Ok(projected)
}
