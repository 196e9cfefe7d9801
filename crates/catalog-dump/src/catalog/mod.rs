//! Catalog query layer.
//!
//! Every object class is read through a [`CatalogClient`] using SQL chosen
//! by the per-version [`QueryStrategy`], and decoded into the typed records
//! in [`model`]. A failed query aborts the run; rows whose definition
//! disappeared between enumeration and lookup are skipped with a warning.

pub mod client;
pub mod externals;
pub mod filter;
pub mod metadata;
pub mod model;
pub mod postdata;
pub mod relations;
pub mod row;
pub mod strategy;
pub mod tls;
pub mod version;

pub use client::{select, CatalogClient, PgCatalogClient};
pub use externals::{get_external_protocols, get_external_table_definitions, get_function_info};
pub use filter::{ObjectFilter, SchemaRelationFilter};
pub use metadata::{get_metadata_for_object_type, MetadataMap, ObjectMetadata};
pub use postdata::{
    get_event_triggers, get_implicit_index_names, get_indexes, get_rules, get_triggers,
};
pub use relations::{
    get_all_sequence_relations, get_all_sequences, get_all_user_tables, get_column_definitions,
    get_distribution_policies, get_foreign_table_definitions, get_inheritance_links,
    get_partition_links, get_partition_table_map, get_sequence_definition,
    get_sequence_owner_rows, get_table_inheritance, get_table_storage, get_views,
};
pub use row::{CatalogRow, CatalogValue, FromCatalogRow, Oid};
pub use strategy::{CatalogQueries, QueryStrategy};
pub use version::{detect_version, EngineVersion, QueryFamily};
