use crate::common::Value;

/// Sort direction for a field in a [SortSpec](crate::common::SortSpec).
///
/// Renders as `1` (ascending) or `-1` (descending) in the store's native form.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SortOrder {
    Ascending,
    Descending,
}

impl SortOrder {
    pub fn from_native(value: &Value) -> Option<SortOrder> {
        match value.as_f64() {
            Some(n) if n > 0.0 => Some(SortOrder::Ascending),
            Some(n) if n < 0.0 => Some(SortOrder::Descending),
            _ => None,
        }
    }
}

impl Default for SortOrder {
    fn default() -> Self {
        SortOrder::Ascending
    }
}
