//! Records and collections.
//!
//! - [`Record`]: a schemaless field/value mapping, built with [`crate::record!`]
//! - [`DocketCollection`]: a handle to a named collection exposing
//!   insert, find and update

mod collection;
mod operations;
mod record;

pub use collection::*;
pub(crate) use operations::*;
pub use record::*;
