//! Links to objects in blob storage
//!
//! [`S3Link`] is a scalar attribute type; the bytes it points at live in an
//! [`ObjectStore`], never in the item.

mod errors;
mod link;
mod store;

pub use errors::{ObjectStoreError, ObjectStoreResult};
pub use link::{S3Link, DEFAULT_REGION};
pub use store::{LocalObjectStore, ObjectStore};
