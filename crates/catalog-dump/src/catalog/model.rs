//! Typed catalog records.
//!
//! Every family of catalog queries returns the same column names for a given
//! object class, so each record has exactly one decoder. Names are already
//! quoted by the server.

use serde::Serialize;

use super::row::{CatalogRow, FromCatalogRow, Oid};
use crate::error::Result;
use crate::ident::make_fqn;

/// A table, sequence or view. Identity is the oid, not the name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Relation {
    pub oid: Oid,
    pub schema_oid: Oid,
    pub schema: String,
    pub name: String,
}

impl Relation {
    pub fn new(oid: Oid, schema: &str, name: &str) -> Self {
        Self {
            oid,
            schema_oid: 0,
            schema: schema.to_string(),
            name: name.to_string(),
        }
    }

    pub fn fqn(&self) -> String {
        make_fqn(&self.schema, &self.name)
    }
}

impl FromCatalogRow for Relation {
    fn from_row(row: &CatalogRow) -> Result<Self> {
        Ok(Self {
            oid: row.oid("oid")?,
            schema_oid: row.oid("schemaoid")?,
            schema: row.text("schema")?,
            name: row.text("name")?,
        })
    }
}

/// An index and the attributes needed to recreate it.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct IndexDefinition {
    pub oid: Oid,
    pub name: String,
    pub owning_schema: String,
    pub owning_table: String,
    pub tablespace: String,
    /// None when the index was dropped after enumeration.
    pub def: Option<String>,
    pub is_clustered: bool,
    pub supports_constraint: bool,
    pub is_replica_identity: bool,
    /// Parent partition index, 0 when none.
    pub parent_index: Oid,
    /// Filled in by the resolver for attached partition indexes.
    pub parent_index_fqn: Option<String>,
}

impl IndexDefinition {
    pub fn fqn(&self) -> String {
        make_fqn(&self.owning_schema, &self.name)
    }

    pub fn table_fqn(&self) -> String {
        make_fqn(&self.owning_schema, &self.owning_table)
    }
}

impl FromCatalogRow for IndexDefinition {
    fn from_row(row: &CatalogRow) -> Result<Self> {
        Ok(Self {
            oid: row.oid("oid")?,
            name: row.text("name")?,
            owning_schema: row.text("owningschema")?,
            owning_table: row.text("owningtable")?,
            tablespace: row.text_or_empty("tablespace")?,
            def: row.opt_text("def")?,
            is_clustered: row.bool("isclustered")?,
            supports_constraint: row.bool("supportsconstraint")?,
            is_replica_identity: row.bool("isreplicaidentity")?,
            parent_index: row.oid("parentindex")?,
            parent_index_fqn: None,
        })
    }
}

/// A rule or trigger: a named object hanging off one table.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TableObjectDefinition {
    pub oid: Oid,
    pub name: String,
    pub owning_schema: String,
    pub owning_table: String,
    /// None when the object was dropped after enumeration.
    pub def: Option<String>,
}

impl TableObjectDefinition {
    pub fn table_fqn(&self) -> String {
        make_fqn(&self.owning_schema, &self.owning_table)
    }
}

impl FromCatalogRow for TableObjectDefinition {
    fn from_row(row: &CatalogRow) -> Result<Self> {
        Ok(Self {
            oid: row.oid("oid")?,
            name: row.text("name")?,
            owning_schema: row.text("owningschema")?,
            owning_table: row.text("owningtable")?,
            def: row.opt_text("def")?,
        })
    }
}

pub type RuleDefinition = TableObjectDefinition;
pub type TriggerDefinition = TableObjectDefinition;

/// A database-wide event trigger.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct EventTrigger {
    pub oid: Oid,
    pub name: String,
    pub event: String,
    pub function_name: String,
    /// `O` (origin), `D` (disabled), `R` (replica) or `A` (always).
    pub enabled: String,
    /// Already-quoted tag literals joined with `, `.
    pub event_tags: String,
}

impl FromCatalogRow for EventTrigger {
    fn from_row(row: &CatalogRow) -> Result<Self> {
        Ok(Self {
            oid: row.oid("oid")?,
            name: row.text("name")?,
            event: row.text("event")?,
            function_name: row.text("functionname")?,
            enabled: row.text("enabled")?,
            event_tags: row.text_or_empty("eventtags")?,
        })
    }
}

/// Raw external-table attributes. Type and protocol are derived by the classifier.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ExternalTableDefinition {
    pub oid: Oid,
    /// First location URI, empty for EXECUTE tables.
    pub location: String,
    pub uris: Vec<String>,
    pub exec_location: String,
    pub format_type: String,
    pub format_opts: String,
    pub options: String,
    pub command: String,
    pub reject_limit: i64,
    pub reject_limit_type: String,
    pub log_errors: bool,
    pub encoding: String,
    pub writable: bool,
}

impl FromCatalogRow for ExternalTableDefinition {
    fn from_row(row: &CatalogRow) -> Result<Self> {
        Ok(Self {
            oid: row.oid("oid")?,
            location: row.text_or_empty("location")?,
            uris: row.text_array("urilocation")?,
            exec_location: row.text_or_empty("execlocation")?,
            format_type: row.text_or_empty("formattype")?,
            format_opts: row.text_or_empty("formatopts")?,
            options: row.text_or_empty("options")?,
            command: row.text_or_empty("command")?,
            reject_limit: row.i64("rejectlimit")?,
            reject_limit_type: row.text_or_empty("rejectlimittype")?,
            log_errors: row.bool("logerrors")?,
            encoding: row.text_or_empty("encoding")?,
            writable: row.bool("writable")?,
        })
    }
}

/// A custom external protocol.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ProtocolDefinition {
    pub oid: Oid,
    pub name: String,
    pub owner: String,
    pub trusted: bool,
    pub read_function: Oid,
    pub write_function: Oid,
    pub validator: Oid,
}

impl FromCatalogRow for ProtocolDefinition {
    fn from_row(row: &CatalogRow) -> Result<Self> {
        Ok(Self {
            oid: row.oid("oid")?,
            name: row.text("name")?,
            owner: row.text_or_empty("owner")?,
            trusted: row.bool("trusted")?,
            read_function: row.oid("readfunction")?,
            write_function: row.oid("writefunction")?,
            validator: row.oid("validatorfunction")?,
        })
    }
}

/// Enough about a function to reference it and tell built-ins apart.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FunctionInfo {
    pub oid: Oid,
    pub qualified_name: String,
    pub is_internal: bool,
}

impl FromCatalogRow for FunctionInfo {
    fn from_row(row: &CatalogRow) -> Result<Self> {
        Ok(Self {
            oid: row.oid("oid")?,
            qualified_name: row.text("name")?,
            is_internal: row.bool("isinternal")?,
        })
    }
}

/// Foreign-table server binding.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ForeignTableDefinition {
    pub oid: Oid,
    pub server: String,
    pub options: String,
}

impl FromCatalogRow for ForeignTableDefinition {
    fn from_row(row: &CatalogRow) -> Result<Self> {
        Ok(Self {
            oid: row.oid("oid")?,
            server: row.text("server")?,
            options: row.text_or_empty("options")?,
        })
    }
}

/// Sequence parameters and current position.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SequenceDefinition {
    pub last_value: i64,
    pub start_value: i64,
    pub increment: i64,
    pub max_value: i64,
    pub min_value: i64,
    pub cache_value: i64,
    pub is_cycled: bool,
    pub is_called: bool,
}

impl FromCatalogRow for SequenceDefinition {
    fn from_row(row: &CatalogRow) -> Result<Self> {
        Ok(Self {
            last_value: row.i64("lastval")?,
            start_value: row.i64("startval")?,
            increment: row.i64("increment")?,
            max_value: row.i64("maxval")?,
            min_value: row.i64("minval")?,
            cache_value: row.i64("cacheval")?,
            is_cycled: row.bool("iscycled")?,
            is_called: row.bool("iscalled")?,
        })
    }
}

/// A sequence relation paired with its parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sequence {
    pub relation: Relation,
    pub definition: SequenceDefinition,
}

/// A view or materialized view.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ViewDefinition {
    pub oid: Oid,
    pub schema: String,
    pub name: String,
    pub options: String,
    pub tablespace: String,
    /// None when the view was dropped after enumeration.
    pub definition: Option<String>,
    pub is_materialized: bool,
}

impl ViewDefinition {
    pub fn fqn(&self) -> String {
        make_fqn(&self.schema, &self.name)
    }
}

impl FromCatalogRow for ViewDefinition {
    fn from_row(row: &CatalogRow) -> Result<Self> {
        Ok(Self {
            oid: row.oid("oid")?,
            schema: row.text("schema")?,
            name: row.text("name")?,
            options: row.text_or_empty("options")?,
            tablespace: row.text_or_empty("tablespace")?,
            definition: row.opt_text("definition")?,
            is_materialized: row.bool("ismaterialized")?,
        })
    }
}

/// One column of a table.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ColumnDefinition {
    /// Owning table.
    pub oid: Oid,
    pub num: i64,
    pub name: String,
    pub type_name: String,
    pub not_null: bool,
    pub default_value: Option<String>,
}

impl FromCatalogRow for ColumnDefinition {
    fn from_row(row: &CatalogRow) -> Result<Self> {
        Ok(Self {
            oid: row.oid("oid")?,
            num: row.i64("num")?,
            name: row.text("name")?,
            type_name: row.text("type")?,
            not_null: row.bool("notnull")?,
            default_value: row.opt_text("defaultval")?,
        })
    }
}

/// Storage attributes of a table.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TableStorage {
    pub oid: Oid,
    pub tablespace: String,
    pub storage_options: String,
    /// Partition clause for a partitioned table.
    pub partition_def: String,
    /// Bound expression for an attached partition (7+).
    pub partition_bound: String,
}

impl FromCatalogRow for TableStorage {
    fn from_row(row: &CatalogRow) -> Result<Self> {
        Ok(Self {
            oid: row.oid("oid")?,
            tablespace: row.text_or_empty("tablespace")?,
            storage_options: row.text_or_empty("storageoptions")?,
            partition_def: row.text_or_empty("partitiondef")?,
            partition_bound: row.text_or_empty("partitionbound")?,
        })
    }
}

/// A raw parent/child edge of a partition hierarchy.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PartitionLink {
    pub oid: Oid,
    pub parent_oid: Oid,
    pub parent_schema: String,
    pub parent_name: String,
    /// Quoted partition name before 7; empty for unnamed partitions.
    pub partition_name: String,
    /// Position among range siblings before 7; 0 when not addressable by rank.
    pub partition_rank: i64,
}

impl PartitionLink {
    pub fn parent_fqn(&self) -> String {
        make_fqn(&self.parent_schema, &self.parent_name)
    }
}

impl FromCatalogRow for PartitionLink {
    fn from_row(row: &CatalogRow) -> Result<Self> {
        Ok(Self {
            oid: row.oid("oid")?,
            parent_oid: row.oid("parentoid")?,
            parent_schema: row.text("parentschema")?,
            parent_name: row.text("parentname")?,
            partition_name: row.text_or_empty("partitionname")?,
            partition_rank: row.i64("partitionrank")?,
        })
    }
}

/// A raw table-inheritance edge, in `inhseqno` order per child.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct InheritanceLink {
    pub oid: Oid,
    pub parent_oid: Oid,
    pub parent_fqn: String,
}

impl FromCatalogRow for InheritanceLink {
    fn from_row(row: &CatalogRow) -> Result<Self> {
        Ok(Self {
            oid: row.oid("oid")?,
            parent_oid: row.oid("parentoid")?,
            parent_fqn: row.text("referencedobject")?,
        })
    }
}

/// A sequence-to-column ownership edge.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SequenceOwnerRow {
    pub sequence_schema: String,
    pub sequence_name: String,
    pub table_oid: Oid,
    pub table_schema: String,
    pub table_name: String,
    pub column_name: String,
}

impl SequenceOwnerRow {
    pub fn sequence_fqn(&self) -> String {
        make_fqn(&self.sequence_schema, &self.sequence_name)
    }

    pub fn table_fqn(&self) -> String {
        make_fqn(&self.table_schema, &self.table_name)
    }
}

impl FromCatalogRow for SequenceOwnerRow {
    fn from_row(row: &CatalogRow) -> Result<Self> {
        Ok(Self {
            sequence_schema: row.text("schema")?,
            sequence_name: row.text("name")?,
            table_oid: row.oid("tableoid")?,
            table_schema: row.text("tableschema")?,
            table_name: row.text("tablename")?,
            column_name: row.text("columnname")?,
        })
    }
}

/// An (oid, text) pair, used for single-valued lookups such as distribution policies.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct OidText {
    pub oid: Oid,
    pub value: String,
}

impl FromCatalogRow for OidText {
    fn from_row(row: &CatalogRow) -> Result<Self> {
        Ok(Self {
            oid: row.oid("oid")?,
            value: row.text_or_empty("value")?,
        })
    }
}
