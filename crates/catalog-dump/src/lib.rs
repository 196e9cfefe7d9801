//! # catalog-dump
//!
//! Schema metadata extraction for Greenplum and PostgreSQL catalogs.
//!
//! This library reads object definitions from a live catalog and writes a
//! dependency-ordered stream of DDL statements, together with a table of
//! contents mapping every object to its exact byte range:
//!
//! - **Version strategies** for pre-6, 6 and 7+ catalog layouts
//! - **Classification** of external tables, partition levels and implicit indexes
//! - **Ordering** of partition indexes, inherited tables and sequence owners
//! - **Byte-accurate TOC** for selective restore
//!
//! ## Example
//!
//! ```rust,no_run
//! use catalog_dump::{Config, MetadataDump};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::load("config.yaml")?;
//!     let summary = MetadataDump::new(config)?.run().await?;
//!     println!("Wrote {} objects", summary.toc_entries);
//!     Ok(())
//! }
//! ```

pub mod catalog;
pub mod classify;
pub mod config;
pub mod ddl;
pub mod dump;
pub mod error;
pub mod ident;
pub mod resolve;

// Re-exports for convenience
pub use catalog::{CatalogClient, EngineVersion, PgCatalogClient, QueryFamily, QueryStrategy};
pub use config::{Config, FilterConfig};
pub use ddl::{MetadataEntry, MetadataWriter, Section, Toc};
pub use dump::{CatalogSnapshot, DumpSummary, MetadataDump, ObjectCounts};
pub use error::{DumpError, Result};
