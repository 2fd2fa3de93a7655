//! Query filters for selecting records from collections.
//!
//! A [Filter] has four independent parts:
//!
//! - `eq`: field/value pairs used for matching. A record matches when **any**
//!   pair matches (logical OR); an empty `eq` matches every record.
//! - `select`: the fields to keep in each result; empty keeps all fields.
//! - `limit` and `sort`: applied by `find` only, after matching.
//!
//! # Examples
//!
//! ```rust,ignore
//! use docket::filter::{all, Filter};
//!
//! // every record
//! let everything = all();
//!
//! // records named Foo or aged 10, projected to their name
//! let filter = Filter::new().eq("name", "Foo").eq("age", 10).select(&["name"]);
//!
//! // the two youngest
//! let youngest = all().sort_by("age").limit(2);
//! ```

mod evaluator;
mod filter;

pub use evaluator::*;
pub use filter::*;
