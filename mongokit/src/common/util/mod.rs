mod string_utils;
mod sync_utils;

pub use string_utils::*;
pub use sync_utils::*;
