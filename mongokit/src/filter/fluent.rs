use crate::common::Value;
use crate::errors::MongoKitResult;

use super::{FieldName, Filter};

/// Creates a fluent filter builder for the specified field name.
///
/// The name is validated when an operator is applied, so
/// `field(" ").eq(1)` fails with `InvalidArgument`.
///
/// # Examples
///
/// ```rust,ignore
/// use mongokit::filter::field;
///
/// let filter = field("age").gte(18)?.and(field("age").lt(65)?);
/// ```
pub fn field(field_name: &str) -> FluentFilter {
    FluentFilter {
        field_name: field_name.to_string(),
    }
}

/// A fluent builder for filters on a single field.
pub struct FluentFilter {
    field_name: String,
}

impl FluentFilter {
    fn name(&self) -> MongoKitResult<FieldName> {
        FieldName::new(&self.field_name)
    }

    /// Matches documents where the field equals `value`.
    #[inline]
    pub fn eq<T: Into<Value>>(self, value: T) -> MongoKitResult<Filter> {
        Ok(Filter::Eq(self.name()?, value.into()))
    }

    /// Matches documents where the field does not equal `value`, including
    /// documents without the field.
    #[inline]
    pub fn ne<T: Into<Value>>(self, value: T) -> MongoKitResult<Filter> {
        Ok(Filter::Ne(self.name()?, value.into()))
    }

    #[inline]
    pub fn gt<T: Into<Value>>(self, value: T) -> MongoKitResult<Filter> {
        Ok(Filter::Gt(self.name()?, value.into()))
    }

    #[inline]
    pub fn gte<T: Into<Value>>(self, value: T) -> MongoKitResult<Filter> {
        Ok(Filter::Gte(self.name()?, value.into()))
    }

    #[inline]
    pub fn lt<T: Into<Value>>(self, value: T) -> MongoKitResult<Filter> {
        Ok(Filter::Lt(self.name()?, value.into()))
    }

    #[inline]
    pub fn lte<T: Into<Value>>(self, value: T) -> MongoKitResult<Filter> {
        Ok(Filter::Lte(self.name()?, value.into()))
    }

    /// Matches documents where the field equals any of `values`.
    pub fn in_values<T: Into<Value>>(self, values: Vec<T>) -> MongoKitResult<Filter> {
        Ok(Filter::In(
            self.name()?,
            values.into_iter().map(Into::into).collect(),
        ))
    }

    /// Matches documents where the field equals none of `values`.
    pub fn not_in<T: Into<Value>>(self, values: Vec<T>) -> MongoKitResult<Filter> {
        Ok(Filter::Nin(
            self.name()?,
            values.into_iter().map(Into::into).collect(),
        ))
    }

    /// Matches documents that have (or lack) the field, whatever its value.
    #[inline]
    pub fn exists(self, exists: bool) -> MongoKitResult<Filter> {
        Ok(Filter::Exists(self.name()?, exists))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ErrorKind;

    #[test]
    fn every_operator_validates_the_name() {
        let failures = vec![
            field("").eq(1),
            field(" ").ne(1),
            field("\t").gt(1),
            field("").gte(1),
            field("").lt(1),
            field("").lte(1),
            field("").in_values(vec![1]),
            field("").not_in(vec![1]),
            field("").exists(true),
        ];
        for result in failures {
            assert_eq!(result.unwrap_err().kind(), &ErrorKind::InvalidArgument);
        }
    }

    #[test]
    fn operators_build_matching_variants() {
        assert!(matches!(field("a").eq(1).unwrap(), Filter::Eq(_, Value::I64(1))));
        assert!(matches!(field("a").ne("x").unwrap(), Filter::Ne(_, Value::String(_))));
        assert!(matches!(field("a").gt(1.5).unwrap(), Filter::Gt(_, Value::F64(_))));
        assert!(matches!(field("a").gte(1).unwrap(), Filter::Gte(..)));
        assert!(matches!(field("a").lt(1).unwrap(), Filter::Lt(..)));
        assert!(matches!(field("a").lte(1).unwrap(), Filter::Lte(..)));
        assert!(matches!(field("a").not_in(vec![1, 2]).unwrap(), Filter::Nin(_, v) if v.len() == 2));
        assert!(matches!(field("a").exists(true).unwrap(), Filter::Exists(_, true)));
    }

    #[test]
    fn name_is_trimmed() {
        let filter = field(" age ").eq(1).unwrap();
        assert_eq!(filter.field_name().map(|f| f.as_str()), Some("age"));
    }
}
