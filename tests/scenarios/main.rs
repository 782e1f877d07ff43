//! End-to-end scenarios
//!
//! Drives the public API the way an application would: build a schema,
//! open a repository over the reference store, then exchange JSON.
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test --test scenarios
//!
//! # With logs
//! RUST_LOG=entitystore=trace cargo test --test scenarios -- --nocapture
//! ```

mod common;

mod binary_wire_format;
mod config_file;
mod relationship_integrity;
mod schema_driven_decode;
