use crate::collection::Document;
use crate::common::{ProjectionSpec, SortSpec};

/// A find request in native form.
///
/// A query is a value: cursors derive new queries from it with the `with_*`
/// methods and re-issue them, leaving the original untouched.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FindQuery {
    pub filter: Document,
    pub projection: Option<ProjectionSpec>,
    pub sort: Option<SortSpec>,
    pub skip: Option<u64>,
    pub limit: Option<u64>,
}

impl FindQuery {
    pub fn new(filter: Document) -> Self {
        FindQuery {
            filter,
            ..FindQuery::default()
        }
    }

    /// Replaces the skip clause.
    pub fn with_skip(&self, skip: u64) -> FindQuery {
        FindQuery {
            skip: Some(skip),
            ..self.clone()
        }
    }

    /// Replaces the limit clause. `0` means no limit.
    pub fn with_limit(&self, limit: u64) -> FindQuery {
        FindQuery {
            limit: Some(limit),
            ..self.clone()
        }
    }

    /// Replaces the sort clause.
    pub fn with_sort(&self, sort: &SortSpec) -> FindQuery {
        FindQuery {
            sort: Some(sort.clone()),
            ..self.clone()
        }
    }

    /// Merges `projection` after the existing projection clause.
    pub fn with_projection(&self, projection: &ProjectionSpec) -> FindQuery {
        let projection = match &self.projection {
            Some(existing) => existing.then(projection),
            None => projection.clone(),
        };
        FindQuery {
            projection: Some(projection),
            ..self.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::SortOrder;
    use crate::doc;

    #[test]
    fn with_methods_leave_original_untouched() {
        let query = FindQuery::new(doc! { a: 1 }).with_limit(5);
        let derived = query.with_limit(1).with_skip(2);
        assert_eq!(query.limit, Some(5));
        assert_eq!(query.skip, None);
        assert_eq!(derived.limit, Some(1));
        assert_eq!(derived.skip, Some(2));
        assert_eq!(derived.filter, query.filter);
    }

    #[test]
    fn sort_replaces_and_projection_merges() {
        let query = FindQuery::new(Document::new())
            .with_sort(&SortSpec::ascending_by(&["a", "b"]))
            .with_sort(&SortSpec::descending_by(&["c"]));
        let sort = query.sort.unwrap();
        assert_eq!(sort.fields(), vec!["c"]);
        assert_eq!(sort.directive("c"), Some(SortOrder::Descending));
        assert_eq!(sort.directive("a"), None);

        let query = FindQuery::new(Document::new())
            .with_projection(&ProjectionSpec::excluding_identifier())
            .with_projection(&ProjectionSpec::exclude(&["secret"]));
        assert_eq!(query.projection.unwrap().fields(), vec!["_id", "secret"]);
    }
}
