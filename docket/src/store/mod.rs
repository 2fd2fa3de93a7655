//! Substrate abstractions.
//!
//! The document layer reaches the transactional key-value substrate only
//! through the types in this module:
//!
//! - [`DocketStoreProvider`] / [`DocketStore`]: lifecycle and `begin`
//! - [`Transaction`]: a scoped substrate transaction, rolled back on drop
//! - [`Bucket`]: one collection namespace, with the [`RecordStore`] and
//!   [`FieldStore`] capabilities used by the record codecs
//! - [`WriterGate`]: the single-writer gate substrates share
//!
//! Docket ships two substrates: the in-memory store in [`memory`] and the
//! fjall-backed store in the `docket-fjall-adapter` crate.

mod bucket;
mod docket_store;
pub mod memory;
mod record_key;
mod store_module;
mod transaction;
mod writer_gate;

pub use bucket::*;
pub use docket_store::*;
pub use record_key::*;
pub use store_module::*;
pub use transaction::*;
pub use writer_gate::*;
