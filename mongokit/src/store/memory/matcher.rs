use crate::collection::Document;
use crate::common::Value;
use crate::errors::{ErrorKind, MongoKitError, MongoKitResult};
use regex::{Regex, RegexBuilder};
use std::cmp::Ordering;

/// A condition on one field, parsed from `{"$op": operand}`.
#[derive(Debug, Clone)]
enum Condition {
    Eq(Value),
    Ne(Value),
    Gt(Value),
    Gte(Value),
    Lt(Value),
    Lte(Value),
    In(Vec<Value>),
    Nin(Vec<Value>),
    Exists(bool),
    Regex(Regex),
    Not(Vec<Condition>),
}

#[derive(Debug, Clone)]
enum Predicate {
    Field(String, Vec<Condition>),
    And(Vec<Matcher>),
    Or(Vec<Matcher>),
    Nor(Vec<Matcher>),
}

/// Evaluates a native filter document against documents.
///
/// Top level entries are implicitly AND-ed. Supported: implicit equality,
/// `$eq $ne $gt $gte $lt $lte $in $nin $exists $regex $not` on fields and
/// `$and $or $nor` at the top level. A field holding an array matches when
/// the array itself or any of its elements satisfies the condition.
#[derive(Debug, Clone)]
pub(crate) struct Matcher {
    predicates: Vec<Predicate>,
}

fn bad_query(message: String) -> MongoKitError {
    log::error!("{}", message);
    MongoKitError::new(&message, ErrorKind::StoreError)
}

impl Matcher {
    pub(crate) fn parse(filter: &Document) -> MongoKitResult<Matcher> {
        let mut predicates = Vec::with_capacity(filter.len());
        for (field, condition) in filter.iter() {
            if field.starts_with('$') {
                predicates.push(Matcher::parse_logical(field, condition)?);
            } else {
                predicates.push(Predicate::Field(
                    field.clone(),
                    Matcher::parse_conditions(condition)?,
                ));
            }
        }
        Ok(Matcher { predicates })
    }

    fn parse_logical(operator: &str, operand: &Value) -> MongoKitResult<Predicate> {
        let Value::Array(items) = operand else {
            return Err(bad_query(format!("{} must be an array", operator)));
        };

        let mut matchers = Vec::with_capacity(items.len());
        for item in items {
            match item {
                Value::Document(doc) => matchers.push(Matcher::parse(doc)?),
                other => {
                    return Err(bad_query(format!(
                        "{} entries must be documents, found {}",
                        operator,
                        other.type_name()
                    )))
                }
            }
        }

        match operator {
            "$and" | "$or" | "$nor" if matchers.is_empty() => Err(bad_query(format!(
                "{} must be a nonempty array",
                operator
            ))),
            "$and" => Ok(Predicate::And(matchers)),
            "$or" => Ok(Predicate::Or(matchers)),
            "$nor" => Ok(Predicate::Nor(matchers)),
            _ => Err(bad_query(format!("unknown top level operator: {}", operator))),
        }
    }

    fn parse_conditions(operand: &Value) -> MongoKitResult<Vec<Condition>> {
        let Value::Document(spec) = operand else {
            return Ok(vec![Condition::Eq(operand.clone())]);
        };
        let is_operator_doc = spec
            .iter()
            .next()
            .map(|(k, _)| k.starts_with('$'))
            .unwrap_or(false);
        if !is_operator_doc {
            return Ok(vec![Condition::Eq(operand.clone())]);
        }

        let options = spec.get_string("$options").unwrap_or("");
        let mut conditions = Vec::with_capacity(spec.len());
        for (operator, value) in spec.iter() {
            let condition = match operator.as_str() {
                "$eq" => Condition::Eq(value.clone()),
                "$ne" => Condition::Ne(value.clone()),
                "$gt" => Condition::Gt(value.clone()),
                "$gte" => Condition::Gte(value.clone()),
                "$lt" => Condition::Lt(value.clone()),
                "$lte" => Condition::Lte(value.clone()),
                "$in" | "$nin" => {
                    let Value::Array(values) = value else {
                        return Err(bad_query(format!("{} needs an array", operator)));
                    };
                    if operator == "$in" {
                        Condition::In(values.clone())
                    } else {
                        Condition::Nin(values.clone())
                    }
                }
                "$exists" => Condition::Exists(match value {
                    Value::Bool(b) => *b,
                    Value::Null => false,
                    other => other.as_f64().map(|n| n != 0.0).unwrap_or(true),
                }),
                "$regex" => {
                    let Value::String(pattern) = value else {
                        return Err(bad_query("$regex has to be a string".to_string()));
                    };
                    Condition::Regex(build_regex(pattern, options)?)
                }
                "$options" => continue,
                "$not" => Condition::Not(Matcher::parse_conditions(value)?),
                other => return Err(bad_query(format!("unknown operator: {}", other))),
            };
            conditions.push(condition);
        }
        Ok(conditions)
    }

    pub(crate) fn matches(&self, document: &Document) -> bool {
        self.predicates.iter().all(|p| match p {
            Predicate::Field(field, conditions) => {
                let value = document.get(field);
                conditions.iter().all(|c| condition_matches(c, value))
            }
            Predicate::And(matchers) => matchers.iter().all(|m| m.matches(document)),
            Predicate::Or(matchers) => matchers.iter().any(|m| m.matches(document)),
            Predicate::Nor(matchers) => !matchers.iter().any(|m| m.matches(document)),
        })
    }
}

fn build_regex(pattern: &str, options: &str) -> MongoKitResult<Regex> {
    let mut builder = RegexBuilder::new(pattern);
    for option in options.chars() {
        match option {
            'i' => builder.case_insensitive(true),
            'm' => builder.multi_line(true),
            's' => builder.dot_matches_new_line(true),
            'x' => builder.ignore_whitespace(true),
            other => return Err(bad_query(format!("invalid regex option: {}", other))),
        };
    }
    Ok(builder.build()?)
}

/// Whether `value` or, for arrays, any element satisfies `test`.
fn any_candidate(value: &Value, test: &dyn Fn(&Value) -> bool) -> bool {
    if test(value) {
        return true;
    }
    match value {
        Value::Array(items) => items.iter().any(test),
        _ => false,
    }
}

fn equals(value: Option<&Value>, target: &Value) -> bool {
    match value {
        // a missing field equals null
        None => target.is_null(),
        Some(v) => any_candidate(v, &|candidate| candidate == target),
    }
}

fn compares(value: Option<&Value>, target: &Value, accept: &[Ordering]) -> bool {
    match value {
        None => false,
        Some(v) => any_candidate(v, &|candidate| {
            candidate
                .compare_within_kind(target)
                .map(|ordering| accept.contains(&ordering))
                .unwrap_or(false)
        }),
    }
}

fn condition_matches(condition: &Condition, value: Option<&Value>) -> bool {
    match condition {
        Condition::Eq(target) => equals(value, target),
        Condition::Ne(target) => !equals(value, target),
        Condition::Gt(target) => compares(value, target, &[Ordering::Greater]),
        Condition::Gte(target) => compares(value, target, &[Ordering::Greater, Ordering::Equal]),
        Condition::Lt(target) => compares(value, target, &[Ordering::Less]),
        Condition::Lte(target) => compares(value, target, &[Ordering::Less, Ordering::Equal]),
        Condition::In(targets) => targets.iter().any(|t| equals(value, t)),
        Condition::Nin(targets) => !targets.iter().any(|t| equals(value, t)),
        Condition::Exists(should_exist) => value.is_some() == *should_exist,
        Condition::Regex(regex) => match value {
            None => false,
            Some(v) => any_candidate(v, &|candidate| {
                candidate.as_str().map(|s| regex.is_match(s)).unwrap_or(false)
            }),
        },
        Condition::Not(conditions) => !conditions.iter().all(|c| condition_matches(c, value)),
    }
}
