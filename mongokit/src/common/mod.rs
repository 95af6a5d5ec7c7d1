mod constants;
mod fields;
mod normalize;
mod sort_order;
pub mod stream;
pub mod util;
mod value;

pub use constants::*;
pub use fields::*;
pub use normalize::*;
pub use sort_order::*;
pub use stream::*;
pub use util::*;
pub use value::*;
