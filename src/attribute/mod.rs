//! Attribute value model
//!
//! The tagged-union wire type of the store and its type tags.
//!
//! # Invariants
//!
//! - Exactly one variant is populated (enforced by the enum and by
//!   deserialization)
//! - Equality is structural over the populated variant

mod plain;
mod value;

pub use plain::{from_plain, item_from_plain, item_to_plain, to_plain, PlainError};
pub use value::{AttributeType, AttributeValue, Item};
