use crate::collection::Document;
use crate::common::{Value, DOC_ID};
use crate::errors::{ErrorKind, MongoKitError, MongoKitResult};

fn bad_update(message: String) -> MongoKitError {
    log::error!("{}", message);
    MongoKitError::new(&message, ErrorKind::StoreError)
}

/// Whether `update` uses `$` operators rather than being a replacement.
pub(crate) fn is_operator_update(update: &Document) -> bool {
    update.iter().next().map(|(k, _)| k.starts_with('$')).unwrap_or(false)
}

/// Applies `update` to `document`.
///
/// Operator updates support `$set $unset $inc $push` (and `$setOnInsert`
/// when `inserting`). Replacement documents replace every field but `_id`.
/// `_id` can never change.
pub(crate) fn apply_update(document: &mut Document, update: &Document, inserting: bool) -> MongoKitResult<()> {
    if update.is_empty() {
        return Err(bad_update("update document must not be empty".to_string()));
    }

    let original_id = document.get(DOC_ID).cloned();
    if is_operator_update(update) {
        apply_operators(document, update, inserting)?;
    } else {
        replace(document, update)?;
    }

    if document.get(DOC_ID).cloned() != original_id {
        return Err(bad_update(
            "performing an update on the path '_id' would modify the immutable field '_id'".to_string(),
        ));
    }
    Ok(())
}

fn replace(document: &mut Document, replacement: &Document) -> MongoKitResult<()> {
    if let Some((key, _)) = replacement.iter().find(|(k, _)| k.starts_with('$')) {
        return Err(bad_update(format!(
            "replacement document must not contain operator {}",
            key
        )));
    }

    let mut replaced = Document::new();
    let id = document.get(DOC_ID).or_else(|| replacement.get(DOC_ID));
    if let Some(id) = id {
        replaced.put_literal(DOC_ID, id.clone());
    }
    for (key, value) in replacement.iter() {
        if key != DOC_ID {
            replaced.put_literal(key, value.clone());
        } else if replaced.get(DOC_ID) != Some(value) {
            // surfaces as an _id modification
            replaced.put_literal(DOC_ID, value.clone());
        }
    }
    *document = replaced;
    Ok(())
}

fn apply_operators(document: &mut Document, update: &Document, inserting: bool) -> MongoKitResult<()> {
    for (operator, spec) in update.iter() {
        let Value::Document(fields) = spec else {
            return Err(bad_update(format!(
                "modifiers operate on fields but {} was given a {}",
                operator,
                spec.type_name()
            )));
        };

        match operator.as_str() {
            "$set" => {
                for (path, value) in fields.iter() {
                    document.put(path, value.clone())?;
                }
            }
            "$setOnInsert" => {
                if inserting {
                    for (path, value) in fields.iter() {
                        document.put(path, value.clone())?;
                    }
                }
            }
            "$unset" => {
                for (path, _) in fields.iter() {
                    document.remove(path);
                }
            }
            "$inc" => {
                for (path, delta) in fields.iter() {
                    let incremented = increment(document.get(path), delta, path)?;
                    document.put(path, incremented)?;
                }
            }
            "$push" => {
                for (path, value) in fields.iter() {
                    match document.get_mut(path) {
                        Some(Value::Array(items)) => items.push(value.clone()),
                        None => document.put(path, Value::Array(vec![value.clone()]))?,
                        Some(other) => {
                            return Err(bad_update(format!(
                                "the field '{}' must be an array but is of type {}",
                                path,
                                other.type_name()
                            )))
                        }
                    }
                }
            }
            other => {
                if !other.starts_with('$') {
                    return Err(bad_update(format!(
                        "update document mixes operators and the field {}",
                        other
                    )));
                }
                return Err(bad_update(format!("unknown modifier: {}", other)));
            }
        }
    }
    Ok(())
}

fn increment(current: Option<&Value>, delta: &Value, path: &str) -> MongoKitResult<Value> {
    if !delta.is_number() {
        return Err(bad_update(format!(
            "cannot increment with non-numeric argument: {{{}: {}}}",
            path, delta
        )));
    }

    match (current, delta) {
        (None, _) => Ok(delta.clone()),
        (Some(Value::I64(a)), Value::I64(b)) => Ok(match a.checked_add(*b) {
            Some(sum) => Value::I64(sum),
            None => Value::F64(*a as f64 + *b as f64),
        }),
        (Some(value), _) if value.is_number() => {
            let a = value.as_f64().unwrap_or_default();
            let b = delta.as_f64().unwrap_or_default();
            Ok(Value::F64(a + b))
        }
        (Some(other), _) => Err(bad_update(format!(
            "cannot apply $inc to a value of non-numeric type {}",
            other.type_name()
        ))),
    }
}

/// Builds the document an upsert starts from: the equality clauses of
/// `filter`, including those nested in `$and`.
pub(crate) fn upsert_seed(filter: &Document) -> MongoKitResult<Document> {
    let mut seed = Document::new();
    collect_equalities(filter, &mut seed)?;
    Ok(seed)
}

fn collect_equalities(filter: &Document, seed: &mut Document) -> MongoKitResult<()> {
    for (key, value) in filter.iter() {
        if key == "$and" {
            if let Value::Array(items) = value {
                for item in items {
                    if let Value::Document(clause) = item {
                        collect_equalities(clause, seed)?;
                    }
                }
            }
            continue;
        }
        if key.starts_with('$') {
            continue;
        }

        match value {
            Value::Document(condition) if is_operator_update(condition) => {
                if let Some(eq) = condition.get("$eq") {
                    seed.put(key, eq.clone())?;
                }
            }
            other => seed.put(key, other.clone())?,
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::doc;

    #[test]
    fn set_unset_inc_push() {
        let mut document = doc! { "_id": 1, name: "a", count: 1, tags: ["x"], gone: true };
        apply_update(
            &mut document,
            &doc! {
                "$set": { name: "b", "address.city": "NYC" },
                "$unset": { gone: "" },
                "$inc": { count: 2, visits: 1 },
                "$push": { tags: "y" },
            },
            false,
        )
        .unwrap();

        assert_eq!(
            document,
            doc! {
                "_id": 1, name: "b", count: 3, tags: ["x", "y"],
                address: { city: "NYC" }, visits: 1,
            }
        );
    }

    #[test]
    fn inc_mixes_integers_and_doubles() {
        let mut document = doc! { n: 1 };
        apply_update(&mut document, &doc! { "$inc": { n: 0.5 } }, false).unwrap();
        assert_eq!(document.get_f64("n"), Some(1.5));

        let err = apply_update(&mut document, &doc! { "$inc": { n: "x" } }, false).unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::StoreError);
    }

    #[test]
    fn set_on_insert_only_when_inserting() {
        let mut document = doc! { a: 1 };
        apply_update(&mut document, &doc! { "$setOnInsert": { b: 2 } }, false).unwrap();
        assert!(!document.contains_key("b"));
        apply_update(&mut document, &doc! { "$setOnInsert": { b: 2 } }, true).unwrap();
        assert_eq!(document.get_i64("b"), Some(2));
    }

    #[test]
    fn replacement_keeps_identifier() {
        let mut document = doc! { "_id": 7, a: 1, b: 2 };
        apply_update(&mut document, &doc! { c: 3 }, false).unwrap();
        assert_eq!(document, doc! { "_id": 7, c: 3 });
    }

    #[test]
    fn identifier_is_immutable() {
        let mut document = doc! { "_id": 7, a: 1 };
        let err = apply_update(&mut document, &doc! { "$set": { "_id": 8 } }, false).unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::StoreError);

        let mut document = doc! { "_id": 7, a: 1 };
        assert!(apply_update(&mut document, &doc! { "_id": 8, a: 2 }, false).is_err());
    }

    #[test]
    fn invalid_updates_are_rejected() {
        let mut document = doc! { a: 1 };
        assert!(apply_update(&mut document, &Document::new(), false).is_err());
        assert!(apply_update(&mut document, &doc! { "$rename": { a: "b" } }, false).is_err());
        assert!(apply_update(&mut document, &doc! { "$set": 1 }, false).is_err());
        assert!(apply_update(&mut document, &doc! { "$set": { b: 1 }, c: 1 }, false).is_err());
        assert!(apply_update(&mut document, &doc! { "$push": { a: 1 } }, false).is_err());
    }

    #[test]
    fn upsert_seed_collects_equalities() {
        let filter = doc! {
            "$and": [{ name: { "$eq": "a" } }, { age: { "$gt": 3 } }],
            city: "NYC",
            "$or": [{ x: 1 }],
        };
        assert_eq!(upsert_seed(&filter).unwrap(), doc! { name: "a", city: "NYC" });
    }
}
