//! Storage layer for entitystore
//!
//! This crate implements the reference backend for the Store contract:
//! - MemoryStore: BTreeMap-based storage with RwLock
//! - EntityIndex: entity name to resources, for scoped scans
//! - query: predicate, sort and pagination pipeline over scanned records
//!
//! Other backends (relational, document) implement the same
//! [`Store`](entitystore_core::Store) trait and may reuse [`query::execute`]
//! when they evaluate fetch requests by scanning.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod index;
pub mod memory;
pub mod query;

pub use index::EntityIndex;
pub use memory::MemoryStore;
