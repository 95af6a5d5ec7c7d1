use crate::common::Value;
use crate::errors::{ErrorKind, MongoKitError, MongoKitResult};

/// A numeric input that may not fit the store's native number types.
///
/// Arbitrary precision values arrive as text, e.g. from a decimal library or
/// a wire format, and are converted at the document boundary by a
/// [ValueNormalizer].
#[derive(Clone, Debug, PartialEq)]
pub enum Numeric {
    Integer(i128),
    Unsigned(u128),
    BigInteger(String),
    Decimal(String),
    Float(f64),
}

impl From<i128> for Numeric {
    fn from(value: i128) -> Self {
        Numeric::Integer(value)
    }
}

impl From<u128> for Numeric {
    fn from(value: u128) -> Self {
        Numeric::Unsigned(value)
    }
}

impl From<f64> for Numeric {
    fn from(value: f64) -> Self {
        Numeric::Float(value)
    }
}

/// Converts wide numeric inputs into native [Value]s.
///
/// Implementations are passed explicitly to
/// [Document::put_numeric](crate::collection::Document::put_numeric), so
/// different callers can use different policies side by side.
pub trait ValueNormalizer: Send + Sync {
    fn normalize(&self, numeric: Numeric) -> MongoKitResult<Value>;
}

/// The default normalization policy.
///
/// Integers that fit in 64 bits become `I64`, larger ones become `F64`;
/// decimals always become `F64`.
#[derive(Clone, Copy, Debug, Default)]
pub struct StandardNormalizer;

impl StandardNormalizer {
    pub fn integer(value: i128) -> Value {
        match i64::try_from(value) {
            Ok(v) => Value::I64(v),
            Err(_) => Value::F64(value as f64),
        }
    }

    pub fn unsigned(value: u128) -> Value {
        match i64::try_from(value) {
            Ok(v) => Value::I64(v),
            Err(_) => Value::F64(value as f64),
        }
    }

    fn big_integer(text: &str) -> MongoKitResult<Value> {
        let text = text.trim();
        let digits = text.strip_prefix(['-', '+']).unwrap_or(text);
        if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
            log::error!("Invalid integer literal {:?}", text);
            return Err(MongoKitError::new(
                &format!("Invalid integer literal {:?}", text),
                ErrorKind::InvalidArgument,
            ));
        }

        match text.parse::<i64>() {
            Ok(v) => Ok(Value::I64(v)),
            Err(_) => Ok(Value::F64(text.parse::<f64>()?)),
        }
    }

    fn decimal(text: &str) -> MongoKitResult<Value> {
        let parsed = text.trim().parse::<f64>().map_err(|err| {
            log::error!("Invalid decimal literal {:?}: {}", text, err);
            MongoKitError::from(err)
        })?;
        Ok(Value::F64(parsed))
    }
}

impl ValueNormalizer for StandardNormalizer {
    fn normalize(&self, numeric: Numeric) -> MongoKitResult<Value> {
        match numeric {
            Numeric::Integer(v) => Ok(StandardNormalizer::integer(v)),
            Numeric::Unsigned(v) => Ok(StandardNormalizer::unsigned(v)),
            Numeric::BigInteger(text) => StandardNormalizer::big_integer(&text),
            Numeric::Decimal(text) => StandardNormalizer::decimal(&text),
            Numeric::Float(v) => Ok(Value::F64(v)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integer_fitting_i64_stays_integral() {
        let value = StandardNormalizer.normalize(Numeric::Integer(-42)).unwrap();
        assert!(matches!(value, Value::I64(-42)));
    }

    #[test]
    fn integer_overflowing_i64_becomes_double() {
        let value = StandardNormalizer
            .normalize(Numeric::Unsigned(u64::MAX as u128 + 1))
            .unwrap();
        assert!(matches!(value, Value::F64(_)));
        assert_eq!(value.as_f64(), Some(18446744073709551616.0));
    }

    #[test]
    fn big_integer_text() {
        let small = StandardNormalizer
            .normalize(Numeric::BigInteger("9007199254740993".into()))
            .unwrap();
        assert!(matches!(small, Value::I64(9007199254740993)));

        let large = StandardNormalizer
            .normalize(Numeric::BigInteger("123456789012345678901234567890".into()))
            .unwrap();
        assert!(matches!(large, Value::F64(_)));

        let err = StandardNormalizer
            .normalize(Numeric::BigInteger("12a".into()))
            .unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::InvalidArgument);
    }

    #[test]
    fn decimal_text_becomes_double() {
        let value = StandardNormalizer
            .normalize(Numeric::Decimal("3.14159".into()))
            .unwrap();
        assert_eq!(value.as_f64(), Some(3.14159));

        let err = StandardNormalizer
            .normalize(Numeric::Decimal("pi".into()))
            .unwrap_err();
        assert_eq!(err.kind(), &ErrorKind::InvalidArgument);
    }

    struct StringifyingNormalizer;

    impl ValueNormalizer for StringifyingNormalizer {
        fn normalize(&self, numeric: Numeric) -> MongoKitResult<Value> {
            Ok(match numeric {
                Numeric::BigInteger(s) | Numeric::Decimal(s) => Value::String(s),
                other => StandardNormalizer.normalize(other)?,
            })
        }
    }

    #[test]
    fn custom_normalizer_can_be_injected() {
        let normalizer: &dyn ValueNormalizer = &StringifyingNormalizer;
        let value = normalizer.normalize(Numeric::Decimal("0.1".into())).unwrap();
        assert_eq!(value.as_str(), Some("0.1"));
    }
}
