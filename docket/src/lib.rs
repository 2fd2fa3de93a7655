//! # Docket - Embedded Document Store
//!
//! Docket is a minimal embedded document store layered on top of an ordered,
//! transactional key-value substrate. It groups schemaless records into named
//! collections, assigns them sequential ids on insert, and retrieves and
//! patches them through simple equality filters.
//!
//! ## Key Features
//!
//! - **Embedded**: no separate server process
//! - **Pluggable record codecs**: whole-record JSON or per-field typed binary,
//!   chosen once per database
//! - **Transactional operations**: every insert, find and update runs in a
//!   single substrate transaction and either commits or leaves no trace
//! - **Pluggable substrates**: in-memory by default, fjall through the
//!   `docket-fjall-adapter` crate
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use docket::codec::CodecKind;
//! use docket::docket::Docket;
//! use docket::filter::{all, Filter};
//! use docket::record;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let db = Docket::builder()
//!     .name("webbr")
//!     .extension("db")
//!     .codec(CodecKind::TypedField)
//!     .open_or_create()?;
//!
//! let id = db.insert("users", record! { "name": "Foo", "age": 10 })?;
//! assert_eq!(id, 1);
//!
//! let found = db.find("users", &Filter::new().eq("name", "Foo"))?;
//! let updated = db.update("users", &all(), &record! { "age": 11 })?;
//!
//! db.close()?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Module Organization
//!
//! - [`codec`] - Record codecs and the value type tag
//! - [`collection`] - Records and collection handles
//! - [`common`] - Values and constants
//! - [`docket`] - The database facade
//! - [`docket_builder`] - Fluent builder for opening a database
//! - [`docket_config`] - Validated database configuration
//! - [`errors`] - Error types and result definitions
//! - [`filter`] - Query filters and their evaluation
//! - [`metadata`] - Database metadata
//! - [`store`] - Substrate abstractions and the in-memory substrate

pub mod codec;
pub mod collection;
pub mod common;
pub mod docket;
pub mod docket_builder;
pub mod docket_config;
pub mod errors;
pub mod filter;
pub mod metadata;
pub mod store;

pub use common::Value;
