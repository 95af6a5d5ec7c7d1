use crate::errors::{ErrorKind, MongoKitError, MongoKitResult};

/// Returns the trimmed name, or `None` when it is blank.
pub fn trimmed(name: &str) -> Option<&str> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed)
    }
}

/// Validates that `value` is not blank and returns it trimmed.
///
/// `what` names the argument in the error message, e.g. `"field name"`.
pub fn require_non_blank<'a>(value: &'a str, what: &str) -> MongoKitResult<&'a str> {
    match trimmed(value) {
        Some(v) => Ok(v),
        None => {
            log::error!("{} cannot be blank", what);
            Err(MongoKitError::new(
                &format!("{} cannot be blank", what),
                ErrorKind::InvalidArgument,
            ))
        }
    }
}
