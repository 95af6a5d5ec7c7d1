use crate::collection::Document;
use crate::common::{ProjectionSpec, SortSpec, StandardNormalizer, Value, DOC_ID};
use crate::errors::{ErrorKind, MongoKitError, MongoKitResult};
use crate::store::memory::matcher::Matcher;
use crate::store::memory::query::{project, sort_documents};
use std::collections::BTreeMap;

fn bad_stage(message: String) -> MongoKitError {
    log::error!("{}", message);
    MongoKitError::new(&message, ErrorKind::StoreError)
}

/// Runs pipeline stages over a snapshot of a collection.
///
/// Supported stages: `$match $group $sort $skip $limit $project $count
/// $unwind`. Group accumulators: `$sum $avg $min $max $first $last $push
/// $addToSet`.
pub(crate) fn run_pipeline(documents: Vec<Document>, stages: &[Document]) -> MongoKitResult<Vec<Document>> {
    let mut current = documents;
    for stage in stages {
        if stage.len() != 1 {
            return Err(bad_stage(
                "a pipeline stage specification object must contain exactly one field".to_string(),
            ));
        }
        let Some((operator, spec)) = stage.iter().next() else {
            continue;
        };

        current = match operator.as_str() {
            "$match" => match_stage(current, spec)?,
            "$group" => group_stage(current, spec)?,
            "$sort" => {
                let sort = SortSpec::from_document(stage_document(operator, spec)?);
                if sort.is_empty() {
                    return Err(bad_stage("$sort stage must have at least one sort key".to_string()));
                }
                sort_documents(&mut current, &sort);
                current
            }
            "$skip" => {
                let skip = non_negative(operator, spec)?;
                current.into_iter().skip(skip).collect()
            }
            "$limit" => {
                let limit = non_negative(operator, spec)?;
                if limit == 0 {
                    return Err(bad_stage("the limit must be positive".to_string()));
                }
                current.into_iter().take(limit).collect()
            }
            "$project" => project_stage(current, stage_document(operator, spec)?)?,
            "$count" => count_stage(current, spec)?,
            "$unwind" => unwind_stage(current, spec)?,
            other => {
                return Err(bad_stage(format!("unrecognized pipeline stage name: '{}'", other)))
            }
        };
    }
    Ok(current)
}

fn stage_document<'a>(operator: &str, spec: &'a Value) -> MongoKitResult<&'a Document> {
    spec.as_document()
        .ok_or_else(|| bad_stage(format!("the {} stage specification must be an object", operator)))
}

fn non_negative(operator: &str, spec: &Value) -> MongoKitResult<usize> {
    match spec.as_f64() {
        Some(n) if n >= 0.0 && n.fract() == 0.0 => Ok(n as usize),
        _ => Err(bad_stage(format!(
            "invalid argument to {} stage: expected a non-negative whole number, found {}",
            operator, spec
        ))),
    }
}

fn match_stage(documents: Vec<Document>, spec: &Value) -> MongoKitResult<Vec<Document>> {
    let matcher = Matcher::parse(stage_document("$match", spec)?)?;
    Ok(documents.into_iter().filter(|d| matcher.matches(d)).collect())
}

/// Evaluates an aggregation expression: `"$path"` reads a field, documents
/// evaluate field by field, anything else is a literal.
fn evaluate(expression: &Value, document: &Document) -> Value {
    match expression {
        Value::String(path) if path.starts_with('$') => document
            .get(&path[1..])
            .cloned()
            .unwrap_or(Value::Null),
        Value::Document(fields) => {
            let mut evaluated = Document::new();
            for (key, value) in fields.iter() {
                evaluated.put_literal(key, evaluate(value, document));
            }
            Value::Document(evaluated)
        }
        literal => literal.clone(),
    }
}

fn field_reference(expression: &Value) -> Option<&str> {
    match expression {
        Value::String(path) if path.starts_with('$') => Some(&path[1..]),
        _ => None,
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Accumulator {
    Sum,
    Avg,
    Min,
    Max,
    First,
    Last,
    Push,
    AddToSet,
}

impl Accumulator {
    fn parse(operator: &str) -> MongoKitResult<Accumulator> {
        Ok(match operator {
            "$sum" => Accumulator::Sum,
            "$avg" => Accumulator::Avg,
            "$min" => Accumulator::Min,
            "$max" => Accumulator::Max,
            "$first" => Accumulator::First,
            "$last" => Accumulator::Last,
            "$push" => Accumulator::Push,
            "$addToSet" => Accumulator::AddToSet,
            other => return Err(bad_stage(format!("unknown group operator '{}'", other))),
        })
    }

    fn compute(&self, expression: &Value, members: &[&Document]) -> Value {
        let present = || {
            members.iter().filter_map(move |d| match evaluate(expression, d) {
                Value::Null => None,
                value => Some(value),
            })
        };

        match self {
            Accumulator::Sum => sum(members.iter().map(|d| evaluate(expression, d))),
            Accumulator::Avg => {
                let numbers: Vec<f64> = present().filter_map(|v| v.as_f64()).collect();
                if numbers.is_empty() {
                    Value::Null
                } else {
                    Value::F64(numbers.iter().sum::<f64>() / numbers.len() as f64)
                }
            }
            Accumulator::Min => present().min().unwrap_or(Value::Null),
            Accumulator::Max => present().max().unwrap_or(Value::Null),
            Accumulator::First => members
                .first()
                .map(|d| evaluate(expression, d))
                .unwrap_or(Value::Null),
            Accumulator::Last => members
                .last()
                .map(|d| evaluate(expression, d))
                .unwrap_or(Value::Null),
            Accumulator::Push => Value::Array(present().collect()),
            Accumulator::AddToSet => {
                let mut unique: Vec<Value> = Vec::new();
                for value in present() {
                    if !unique.contains(&value) {
                        unique.push(value);
                    }
                }
                Value::Array(unique)
            }
        }
    }
}

/// Sums the numeric values, staying integral while every addend is an
/// integer and the total fits.
fn sum<I: Iterator<Item = Value>>(values: I) -> Value {
    let mut integral: i128 = 0;
    let mut floating = 0.0;
    let mut is_float = false;
    for value in values {
        match value {
            Value::I64(i) => integral += i as i128,
            Value::F64(f) => {
                floating += f;
                is_float = true;
            }
            _ => {}
        }
    }

    if is_float {
        Value::F64(floating + integral as f64)
    } else {
        StandardNormalizer::integer(integral)
    }
}

fn group_stage(documents: Vec<Document>, spec: &Value) -> MongoKitResult<Vec<Document>> {
    let spec = stage_document("$group", spec)?;
    let Some(key_expression) = spec.get(DOC_ID) else {
        return Err(bad_stage("a group specification must include an _id".to_string()));
    };

    let mut accumulators = Vec::new();
    for (field, definition) in spec.iter() {
        if field == DOC_ID {
            continue;
        }
        let operand = definition
            .as_document()
            .filter(|d| d.len() == 1)
            .and_then(|d| d.iter().next())
            .ok_or_else(|| {
                bad_stage(format!("the field '{}' must be an accumulator object", field))
            })?;
        accumulators.push((field.clone(), Accumulator::parse(operand.0)?, operand.1.clone()));
    }

    // groups in first seen order
    let mut index: BTreeMap<Value, usize> = BTreeMap::new();
    let mut groups: Vec<(Value, Vec<&Document>)> = Vec::new();
    for document in &documents {
        let key = evaluate(key_expression, document);
        match index.get(&key) {
            Some(position) => groups[*position].1.push(document),
            None => {
                index.insert(key.clone(), groups.len());
                groups.push((key, vec![document]));
            }
        }
    }

    Ok(groups
        .into_iter()
        .map(|(key, members)| {
            let mut grouped = Document::new();
            grouped.put_literal(DOC_ID, key);
            for (field, accumulator, expression) in &accumulators {
                grouped.put_literal(field, accumulator.compute(expression, &members));
            }
            grouped
        })
        .collect())
}

fn project_stage(documents: Vec<Document>, spec: &Document) -> MongoKitResult<Vec<Document>> {
    let mut computed = Vec::new();
    let mut plain = Document::new();
    for (field, value) in spec.iter() {
        match field_reference(value) {
            Some(_) => computed.push((field.clone(), value.clone())),
            None => plain.put_literal(field, value.clone()),
        }
    }
    if plain.is_empty() && computed.is_empty() {
        return Err(bad_stage("$project requires at least one output field".to_string()));
    }

    let mut projection = ProjectionSpec::from_document(&plain);
    if !computed.is_empty() && projection.iter().all(|(f, _)| f == DOC_ID) {
        // computed fields alone put the stage in inclusion mode
        let names: Vec<&str> = computed.iter().map(|(f, _)| f.as_str()).collect();
        projection = projection.then(&ProjectionSpec::include(&names));
    }

    documents
        .iter()
        .map(|document| {
            let mut projected = project(document, &projection)?;
            for (field, expression) in &computed {
                projected.put(field, evaluate(expression, document))?;
            }
            Ok(projected)
        })
        .collect()
}

fn count_stage(documents: Vec<Document>, spec: &Value) -> MongoKitResult<Vec<Document>> {
    let field = match spec.as_str() {
        Some(f) if !f.trim().is_empty() && !f.starts_with('$') && !f.contains('.') => f,
        _ => {
            return Err(bad_stage(
                "the count field must be a non-empty string without '$' or '.'".to_string(),
            ))
        }
    };

    if documents.is_empty() {
        return Ok(Vec::new());
    }
    let mut counted = Document::new();
    counted.put_literal(field, Value::from(documents.len()));
    Ok(vec![counted])
}

fn unwind_stage(documents: Vec<Document>, spec: &Value) -> MongoKitResult<Vec<Document>> {
    let path = match spec {
        Value::Document(options) => options.get("path"),
        other => Some(other),
    }
    .and_then(field_reference)
    .ok_or_else(|| bad_stage("$unwind requires a path prefixed with '$'".to_string()))?;

    let mut unwound = Vec::new();
    for document in documents {
        match document.get(path) {
            Some(Value::Array(items)) => {
                for item in items.clone() {
                    let mut copy = document.clone();
                    copy.put(path, item)?;
                    unwound.push(copy);
                }
            }
            Some(Value::Null) | None => {}
            Some(_) => unwound.push(document),
        }
    }
    Ok(unwound)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::doc;

    fn orders() -> Vec<Document> {
        vec![
            doc! { cust: "A", amount: 50, status: "A", items: ["x", "y"] },
            doc! { cust: "A", amount: 100, status: "A", items: ["y"] },
            doc! { cust: "B", amount: 25, status: "A" },
            doc! { cust: "B", amount: 10.5, status: "D", items: [] },
            doc! { cust: "C", amount: 70, status: "A", items: ["z"] },
        ]
    }

    #[test]
    fn match_group_sort() {
        let stages = vec![
            doc! { "$match": { status: "A" } },
            doc! { "$group": { "_id": "$cust", total: { "$sum": "$amount" }, n: { "$sum": 1 } } },
            doc! { "$sort": { total: (-1) } },
        ];
        let result = run_pipeline(orders(), &stages).unwrap();
        assert_eq!(
            result,
            vec![
                doc! { "_id": "A", total: 150, n: 2 },
                doc! { "_id": "C", total: 70, n: 1 },
                doc! { "_id": "B", total: 25, n: 1 },
            ]
        );
    }

    #[test]
    fn group_accumulators() {
        let stages = vec![doc! {
            "$group": {
                "_id": (Value::Null),
                avg: { "$avg": "$amount" },
                min: { "$min": "$amount" },
                max: { "$max": "$amount" },
                first: { "$first": "$cust" },
                last: { "$last": "$cust" },
                custs: { "$addToSet": "$cust" },
                total: { "$sum": "$amount" },
            }
        }];
        let result = run_pipeline(orders(), &stages).unwrap();
        assert_eq!(result.len(), 1);
        let group = &result[0];
        assert_eq!(group.get_f64("avg"), Some(51.1));
        assert_eq!(group.get_f64("min"), Some(10.5));
        assert_eq!(group.get_i64("max"), Some(100));
        assert_eq!(group.get_string("first"), Some("A"));
        assert_eq!(group.get_string("last"), Some("C"));
        assert_eq!(group.get("custs"), Some(&Value::from(vec!["A", "B", "C"])));
        assert_eq!(group.get_f64("total"), Some(255.5));
    }

    #[test]
    fn skip_limit_count() {
        let stages = vec![doc! { "$skip": 1 }, doc! { "$limit": 3 }, doc! { "$count": "n" }];
        assert_eq!(run_pipeline(orders(), &stages).unwrap(), vec![doc! { n: 3 }]);

        let stages = vec![doc! { "$match": { cust: "Z" } }, doc! { "$count": "n" }];
        assert!(run_pipeline(orders(), &stages).unwrap().is_empty());
    }

    #[test]
    fn project_with_computed_fields() {
        let stages = vec![doc! { "$project": { customer: "$cust", amount: 1 } }];
        let result = run_pipeline(orders(), &stages).unwrap();
        assert_eq!(result[0], doc! { amount: 50, customer: "A" });
    }

    #[test]
    fn unwind_arrays() {
        let stages = vec![doc! { "$unwind": "$items" }, doc! { "$project": { items: 1 } }];
        let result = run_pipeline(orders(), &stages).unwrap();
        let items: Vec<&str> = result.iter().filter_map(|d| d.get_string("items")).collect();
        assert_eq!(items, vec!["x", "y", "y", "z"]);
    }

    #[test]
    fn empty_pipeline_is_identity() {
        assert_eq!(run_pipeline(orders(), &[]).unwrap(), orders());
    }

    #[test]
    fn invalid_stages_are_rejected() {
        for stage in [
            doc! { "$bogus": {} },
            doc! { "$limit": 0 },
            doc! { "$skip": (-1) },
            doc! { "$group": { total: { "$sum": 1 } } },
            doc! { "$group": { "_id": 1, total: { "$median": 1 } } },
            doc! { "$count": "$n" },
            doc! { "$sort": {} },
            doc! { "$match": 1 },
            doc! { a: 1, b: 2 },
        ] {
            let err = run_pipeline(orders(), &[stage]).unwrap_err();
            assert_eq!(err.kind(), &ErrorKind::StoreError);
        }
    }
}
