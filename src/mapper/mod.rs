//! Document mapper over a table client
//!
//! - [`Mapper`]: save, load, delete and parallel scans of documents
//! - [`MapperConfig`]: schema choice, table naming and scan settings
//! - [`TableClient`]: the table service seam, with an in-memory client

mod client;
mod config;
mod errors;
mod mapper;

pub use client::{MemoryTableClient, TableClient};
pub use config::MapperConfig;
pub use errors::{MapperError, MapperResult};
pub use mapper::Mapper;
