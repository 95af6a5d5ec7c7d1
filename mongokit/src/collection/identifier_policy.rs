use crate::collection::{Document, Identifier};
use crate::common::{Value, ID_FIELD};

/// Decides whether documents lacking an application identifier get one
/// before they are persisted.
///
/// Under [IdentifierPolicy::Create] a document whose `id` field is absent,
/// blank or not a string receives a freshly generated [Identifier] in hex
/// form. Under [IdentifierPolicy::Preserve] documents pass through untouched.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum IdentifierPolicy {
    Create,
    Preserve,
}

impl IdentifierPolicy {
    pub fn from_flag(create_id: bool) -> Self {
        if create_id {
            IdentifierPolicy::Create
        } else {
            IdentifierPolicy::Preserve
        }
    }

    pub fn creates_identifiers(&self) -> bool {
        *self == IdentifierPolicy::Create
    }

    /// Whether `document` has no usable `id`.
    pub fn needs_identifier(document: &Document) -> bool {
        match document.get(ID_FIELD) {
            Some(Value::String(id)) => id.trim().is_empty(),
            _ => true,
        }
    }

    /// Applies the policy and reports whether an identifier was assigned.
    pub fn apply(&self, document: &mut Document) -> bool {
        if self.creates_identifiers() && IdentifierPolicy::needs_identifier(document) {
            document.put_literal(ID_FIELD, Value::String(Identifier::new().to_hex()));
            true
        } else {
            false
        }
    }
}

impl Default for IdentifierPolicy {
    fn default() -> Self {
        IdentifierPolicy::Preserve
    }
}
