use crate::common::{Projection, ProjectionSpec, SortOrder, SortSpec, DOC_ID};

/// Options for controlling find operations.
///
/// Unless `include_id` is set or the projection explicitly includes `_id`,
/// found documents come back without the store's `_id` field.
///
/// # Examples
///
/// ```rust,ignore
/// use mongokit::collection::FindOptions;
/// use mongokit::common::SortOrder;
///
/// let options = FindOptions::new()
///     .sort_by("age", SortOrder::Descending)
///     .skip(10)
///     .limit(20);
///
/// let options = order_by("name", SortOrder::Ascending);
/// let options = skip_by(5);
/// let options = limit_to(100);
/// ```
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FindOptions {
    pub(crate) sort: Option<SortSpec>,
    pub(crate) projection: Option<ProjectionSpec>,
    pub(crate) include_id: bool,
    pub(crate) skip: Option<u64>,
    pub(crate) limit: Option<u64>,
}

/// Creates `FindOptions` sorting by a single field.
pub fn order_by(field_name: &str, sort_order: SortOrder) -> FindOptions {
    FindOptions::new().sort_by(field_name, sort_order)
}

/// Creates `FindOptions` that skips the first `skip` results.
pub fn skip_by(skip: u64) -> FindOptions {
    FindOptions::new().skip(skip)
}

/// Creates `FindOptions` returning at most `limit` results.
pub fn limit_to(limit: u64) -> FindOptions {
    FindOptions::new().limit(limit)
}

impl FindOptions {
    pub fn new() -> FindOptions {
        FindOptions::default()
    }

    pub fn skip(mut self, skip: u64) -> FindOptions {
        self.skip = Some(skip);
        self
    }

    /// Sets the maximum number of documents to return. `0` means no limit.
    pub fn limit(mut self, limit: u64) -> FindOptions {
        self.limit = Some(limit);
        self
    }

    /// Appends a sort key; a field sorted earlier moves to the end.
    pub fn sort_by(mut self, field_name: &str, sort_order: SortOrder) -> FindOptions {
        let key = SortSpec::with_fields(&[field_name], sort_order);
        self.sort = Some(match self.sort {
            Some(sort) => sort.then(&key),
            None => key,
        });
        self
    }

    /// Merges `sort` after any sort already configured.
    pub fn sort(mut self, sort: &SortSpec) -> FindOptions {
        self.sort = Some(match self.sort {
            Some(existing) => existing.then(sort),
            None => sort.clone(),
        });
        self
    }

    /// Merges `projection` after any projection already configured.
    pub fn projection(mut self, projection: &ProjectionSpec) -> FindOptions {
        self.projection = Some(match self.projection {
            Some(existing) => existing.then(projection),
            None => projection.clone(),
        });
        self
    }

    /// Asks for the store's `_id` field to be returned.
    pub fn include_id(mut self, include_id: bool) -> FindOptions {
        self.include_id = include_id;
        self
    }

    pub fn sort_spec(&self) -> Option<&SortSpec> {
        self.sort.as_ref()
    }

    pub fn skip_count(&self) -> Option<u64> {
        self.skip
    }

    pub fn limit_count(&self) -> Option<u64> {
        self.limit
    }

    /// The projection sent to the store: the caller's projection with `_id`
    /// excluded in front of it, unless the identifier was requested.
    pub fn effective_projection(&self) -> Option<ProjectionSpec> {
        if self.include_id {
            return self.projection.clone();
        }

        let base = ProjectionSpec::excluding_identifier();
        match &self.projection {
            Some(projection) if projection.directive(DOC_ID) == Some(Projection::Include) => {
                Some(projection.clone())
            }
            Some(projection) => Some(base.then(projection)),
            None => Some(base),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_projection_excludes_identifier() {
        let options = FindOptions::new();
        assert_eq!(
            options.effective_projection(),
            Some(ProjectionSpec::excluding_identifier())
        );
    }

    #[test]
    fn include_id_keeps_caller_projection() {
        assert_eq!(FindOptions::new().include_id(true).effective_projection(), None);

        let projection = ProjectionSpec::include(&["name"]);
        let options = FindOptions::new().include_id(true).projection(&projection);
        assert_eq!(options.effective_projection(), Some(projection));
    }

    #[test]
    fn explicit_identifier_inclusion_wins() {
        let projection = ProjectionSpec::include(&["_id", "name"]);
        let options = FindOptions::new().projection(&projection);
        assert_eq!(options.effective_projection(), Some(projection));
    }

    #[test]
    fn exclusion_projection_is_merged_behind_identifier() {
        let options = FindOptions::new().projection(&ProjectionSpec::exclude(&["secret"]));
        let effective = options.effective_projection().unwrap();
        assert_eq!(effective.fields(), vec!["_id", "secret"]);
    }

    #[test]
    fn sort_by_merges_keys() {
        let options = FindOptions::new()
            .sort_by("a", SortOrder::Ascending)
            .sort_by("b", SortOrder::Descending)
            .sort_by("a", SortOrder::Descending);
        let sort = options.sort_spec().unwrap();
        assert_eq!(sort.fields(), vec!["b", "a"]);
        assert_eq!(sort.directive("a"), Some(SortOrder::Descending));
    }

    #[test]
    fn convenience_constructors() {
        assert_eq!(skip_by(5).skip_count(), Some(5));
        assert_eq!(limit_to(7).limit_count(), Some(7));
        assert_eq!(
            order_by("name", SortOrder::Ascending).sort_spec().map(|s| s.len()),
            Some(1)
        );
    }
}
