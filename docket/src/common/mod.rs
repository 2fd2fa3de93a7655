mod constants;
mod value;

pub use constants::*;
pub use value::*;
