//! dynamap - typed attribute marshalling for document tables
//!
//! Converts registered Rust types to and from typed attribute items under a
//! selectable conversion schema, maps them onto tables through a client
//! seam, and scans tables in parallel segments.
//!
//! - [`attribute`]: the typed wire value and its plain JSON bridge
//! - [`mapping`]: domain values, declared types and document models
//! - [`convert`]: marshallers, conversion schemas and the item converter
//! - [`s3link`]: object references stored as JSON text
//! - [`scan`]: segmented parallel scans
//! - [`mapper`]: save, load, delete and scan of documents
//! - [`observability`]: counters and observation scopes

pub mod attribute;
pub mod cli;
pub mod convert;
pub mod mapper;
pub mod mapping;
pub mod observability;
pub mod s3link;
pub mod scan;
