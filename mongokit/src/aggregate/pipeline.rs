use crate::collection::Document;
use crate::common::{ProjectionSpec, SortSpec, Value};
use crate::filter::Filter;
use itertools::Itertools;
use std::fmt::{Display, Formatter};

pub const MATCH: &str = "$match";
pub const GROUP: &str = "$group";
pub const SORT: &str = "$sort";
pub const PROJECT: &str = "$project";
pub const SKIP: &str = "$skip";
pub const LIMIT: &str = "$limit";
pub const COUNT: &str = "$count";

/// One step of an aggregation [Pipeline].
#[derive(Clone, Debug, PartialEq)]
pub struct Stage {
    operator: String,
    spec: Value,
}

impl Stage {
    /// A stage with an arbitrary operator, e.g. `Stage::new("$unwind", "$tags")`.
    pub fn new<T: Into<Value>>(operator: &str, spec: T) -> Stage {
        Stage {
            operator: operator.to_string(),
            spec: spec.into(),
        }
    }

    /// A `$match` stage over a native filter document or any map convertible
    /// into one.
    pub fn matching<D: Into<Document>>(filter: D) -> Stage {
        Stage::new(MATCH, filter.into())
    }

    /// A `$match` stage over a typed filter.
    pub fn match_filter(filter: &Filter) -> Stage {
        Stage::new(MATCH, filter.to_document())
    }

    /// A `$group` stage, e.g. `{"_id": "$city", "total": {"$sum": "$amount"}}`.
    pub fn group<D: Into<Document>>(spec: D) -> Stage {
        Stage::new(GROUP, spec.into())
    }

    pub fn sort(spec: &SortSpec) -> Stage {
        Stage::new(SORT, spec.to_document())
    }

    pub fn project(spec: &ProjectionSpec) -> Stage {
        Stage::new(PROJECT, spec.to_document())
    }

    pub fn skip(count: u64) -> Stage {
        Stage::new(SKIP, count)
    }

    pub fn limit(count: u64) -> Stage {
        Stage::new(LIMIT, count)
    }

    /// A `$count` stage writing the number of input documents into `field`.
    pub fn count(field: &str) -> Stage {
        Stage::new(COUNT, field)
    }

    /// Wraps an already rendered stage document. A single key document
    /// becomes an operator/spec pair; anything else passes through as the
    /// spec of an empty operator and renders unchanged.
    pub fn raw(document: Document) -> Stage {
        if document.len() == 1 {
            if let Some((operator, spec)) = document.iter().next() {
                return Stage::new(operator, spec.clone());
            }
        }
        Stage {
            operator: String::new(),
            spec: Value::Document(document),
        }
    }

    pub fn operator(&self) -> &str {
        &self.operator
    }

    pub fn spec(&self) -> &Value {
        &self.spec
    }

    pub fn to_document(&self) -> Document {
        if self.operator.is_empty() {
            if let Value::Document(document) = &self.spec {
                return document.clone();
            }
        }

        let mut document = Document::new();
        document.put_literal(&self.operator, self.spec.clone());
        document
    }
}

/// An ordered sequence of aggregation stages.
///
/// Pipelines are immutable values; [Pipeline::then] returns a new pipeline.
/// An empty pipeline is legal and returns the collection as is.
///
/// # Examples
///
/// ```rust,ignore
/// use mongokit::aggregate::{Pipeline, Stage};
/// use mongokit::doc;
///
/// let pipeline = Pipeline::new()
///     .then(Stage::match_filter(&field("status").eq("A")?))
///     .then(Stage::group(doc! { "_id": "$cust_id", total: { "$sum": "$amount" } }))
///     .then(Stage::sort(&SortSpec::descending_by(&["total"])));
///
/// let cursor = collection.aggregate(&pipeline)?;
/// ```
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Pipeline {
    stages: Vec<Stage>,
}

impl Pipeline {
    pub fn new() -> Pipeline {
        Pipeline { stages: Vec::new() }
    }

    pub fn from_stages<I: IntoIterator<Item = Stage>>(stages: I) -> Pipeline {
        Pipeline {
            stages: stages.into_iter().collect(),
        }
    }

    /// Returns a new pipeline with `stage` appended.
    pub fn then(&self, stage: Stage) -> Pipeline {
        let mut stages = self.stages.clone();
        stages.push(stage);
        Pipeline { stages }
    }

    pub fn stages(&self) -> &[Stage] {
        &self.stages
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// Renders every stage, in order.
    pub fn to_documents(&self) -> Vec<Document> {
        self.stages.iter().map(Stage::to_document).collect()
    }
}

impl Display for Pipeline {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "[{}]",
            self.stages.iter().map(|s| s.to_document().to_string()).join(", ")
        )
    }
}

impl FromIterator<Stage> for Pipeline {
    fn from_iter<I: IntoIterator<Item = Stage>>(iter: I) -> Self {
        Pipeline::from_stages(iter)
    }
}
