//! JSON codec for entitystore
//!
//! Converts between JSON documents and values objects. Decoding is driven by
//! an [`Entity`](entitystore_core::Entity) declaration and is all-or-nothing;
//! encoding needs no schema and cannot fail.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod json;

pub use json::{
    decode, decode_attribute, decode_changes, decode_relationship, decode_str, encode,
    encode_string, encode_value,
};
