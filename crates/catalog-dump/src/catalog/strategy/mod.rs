//! Version-specific catalog queries (Strategy pattern).
//!
//! Catalog column names and constraint semantics differ between the pre-6,
//! 6 and 7+ engines. Each family implements [`CatalogQueries`]; queries that
//! are identical everywhere live in the trait's default methods. Every family
//! returns the same column names for an object class so one decoder serves all.
//!
//! The strategy is chosen once per run from the detected [`EngineVersion`]:
//!
//! ```rust,ignore
//! let strategy = QueryStrategy::for_version(&version);
//! let sql = strategy.indexes(&filter, &implicit_names);
//! ```

mod pre6;
mod v6;
mod v7;

pub use pre6::Pre6Queries;
pub use v6::V6Queries;
pub use v7::V7Queries;

use std::collections::BTreeSet;

use super::filter::{extension_clause, ObjectFilter};
use super::metadata::MetadataQueryParams;
use super::version::{EngineVersion, QueryFamily};
use crate::ident::quote_literal;

/// Oids below this belong to the system.
pub const FIRST_NORMAL_OBJECT_ID: u32 = 16384;

/// SQL builders for every catalog object class.
pub trait CatalogQueries: Send + Sync {
    /// The family this strategy serves.
    fn family(&self) -> QueryFamily;

    /// Columns backing unique constraints, from which the names of
    /// implicitly created indexes are rebuilt. Only legacy engines need this.
    fn unique_constraint_columns(&self) -> Option<String> {
        None
    }

    /// Indexes, ordered by name.
    fn indexes(&self, filter: &dyn ObjectFilter, implicit_index_names: &BTreeSet<String>)
        -> String;

    /// User rules; built-in `_RETURN` and `pg_*` rules are skipped.
    fn rules(&self, filter: &dyn ObjectFilter) -> String {
        format!(
            r#"
SELECT r.oid AS oid,
	quote_ident(r.rulename) AS name,
	quote_ident(n.nspname) AS owningschema,
	quote_ident(c.relname) AS owningtable,
	pg_get_ruledef(r.oid) AS def
FROM pg_rewrite r
	JOIN pg_class c ON c.oid = r.ev_class
	JOIN pg_namespace n ON c.relnamespace = n.oid
WHERE {}
	AND rulename NOT LIKE '%RETURN'
	AND rulename NOT LIKE 'pg_%'
	AND {}
ORDER BY rulename"#,
            filter.relation_clause("n", "c"),
            extension_clause("c")
        )
    }

    /// Predicate excluding constraint triggers.
    fn trigger_constraint_clause(&self) -> &'static str {
        "NOT tgisinternal"
    }

    /// User triggers, ordered by name.
    fn triggers(&self, filter: &dyn ObjectFilter) -> String {
        format!(
            r#"
SELECT t.oid AS oid,
	quote_ident(t.tgname) AS name,
	quote_ident(n.nspname) AS owningschema,
	quote_ident(c.relname) AS owningtable,
	pg_get_triggerdef(t.oid) AS def
FROM pg_trigger t
	JOIN pg_class c ON c.oid = t.tgrelid
	JOIN pg_namespace n ON c.relnamespace = n.oid
WHERE {}
	AND tgname NOT LIKE 'pg_%'
	AND {}
	AND {}
ORDER BY tgname"#,
            filter.relation_clause("n", "c"),
            self.trigger_constraint_clause(),
            extension_clause("c")
        )
    }

    /// Event triggers. None when the engine has no event triggers.
    fn event_triggers(&self) -> Option<String> {
        Some(format!(
            r#"
SELECT et.oid AS oid,
	quote_ident(et.evtname) AS name,
	et.evtevent AS event,
	array_to_string(array(select quote_literal(x) from unnest(evttags) as t(x)), ', ') AS eventtags,
	et.evtfoid::regproc::text AS functionname,
	et.evtenabled::text AS enabled
FROM pg_event_trigger et
WHERE {}
ORDER BY name"#,
            extension_clause("et")
        ))
    }

    /// `relkind` values that make up the table working set.
    fn table_relkinds(&self) -> &'static str;

    /// Candidate tables in dumped schemas. Relation filtering happens when
    /// the working set is selected.
    fn user_tables(&self, filter: &dyn ObjectFilter) -> String {
        format!(
            r#"
SELECT n.oid AS schemaoid,
	c.oid AS oid,
	quote_ident(n.nspname) AS schema,
	quote_ident(c.relname) AS name
FROM pg_class c
	JOIN pg_namespace n ON c.relnamespace = n.oid
WHERE {}
	AND c.relkind IN ({})
	AND {}
ORDER BY c.oid"#,
            filter.schema_clause("n"),
            self.table_relkinds(),
            extension_clause("c")
        )
    }

    /// Raw partition parent/child edges.
    fn partition_links(&self) -> String;

    /// Columns of every table in dumped schemas.
    fn columns(&self, filter: &dyn ObjectFilter) -> String {
        format!(
            r#"
SELECT a.attrelid AS oid,
	a.attnum AS num,
	quote_ident(a.attname) AS name,
	a.attnotnull AS notnull,
	pg_catalog.format_type(a.atttypid, a.atttypmod) AS type,
	pg_catalog.pg_get_expr(ad.adbin, ad.adrelid) AS defaultval
FROM pg_attribute a
	JOIN pg_class c ON c.oid = a.attrelid
	JOIN pg_namespace n ON n.oid = c.relnamespace
	LEFT JOIN pg_attrdef ad ON ad.adrelid = a.attrelid AND ad.adnum = a.attnum
WHERE {}
	AND c.relkind IN ({})
	AND a.attnum > 0
	AND NOT a.attisdropped
ORDER BY a.attrelid, a.attnum"#,
            filter.schema_clause("n"),
            self.table_relkinds()
        )
    }

    /// `DISTRIBUTED ...` clause per table.
    fn distribution_policies(&self) -> String {
        r#"
SELECT p.localoid AS oid,
	pg_get_table_distributedby(p.localoid) AS value
FROM gp_distribution_policy p"#
            .to_string()
    }

    /// Tablespace, storage options and partition clauses per table.
    fn table_storage(&self, filter: &dyn ObjectFilter) -> String;

    /// Non-partition inheritance edges in `inhseqno` order.
    fn table_inheritance(&self) -> String;

    /// Sequence relations.
    fn sequences(&self, filter: &dyn ObjectFilter) -> String {
        format!(
            r#"
SELECT n.oid AS schemaoid,
	c.oid AS oid,
	quote_ident(n.nspname) AS schema,
	quote_ident(c.relname) AS name
FROM pg_class c
	JOIN pg_namespace n ON c.relnamespace = n.oid
WHERE c.relkind = 'S'
	AND {}
	AND {}
ORDER BY n.nspname, c.relname"#,
            filter.relation_clause("n", "c"),
            extension_clause("c")
        )
    }

    /// Parameters and position of one sequence.
    fn sequence_definition(&self, sequence_fqn: &str) -> String;

    /// Sequence-to-column ownership edges.
    fn sequence_owners(&self) -> String {
        r#"
SELECT quote_ident(n.nspname) AS schema,
	quote_ident(s.relname) AS name,
	t.oid AS tableoid,
	quote_ident(tn.nspname) AS tableschema,
	quote_ident(t.relname) AS tablename,
	quote_ident(a.attname) AS columnname
FROM pg_depend d
	JOIN pg_attribute a ON a.attrelid = d.refobjid AND a.attnum = d.refobjsubid
	JOIN pg_class s ON s.oid = d.objid
	JOIN pg_namespace n ON n.oid = s.relnamespace
	JOIN pg_class t ON t.oid = d.refobjid
	JOIN pg_namespace tn ON tn.oid = t.relnamespace
WHERE s.relkind = 'S'
	AND d.deptype = 'a'
	AND d.classid = 'pg_class'::regclass
ORDER BY n.nspname, s.relname"#
            .to_string()
    }

    /// Views (and materialized views where supported).
    fn views(&self, filter: &dyn ObjectFilter) -> String;

    /// External table attributes.
    fn external_tables(&self) -> String;

    /// Custom external protocols.
    fn external_protocols(&self) -> String {
        format!(
            r#"
SELECT p.oid AS oid,
	quote_ident(p.ptcname) AS name,
	quote_ident(pg_get_userbyid(p.ptcowner)) AS owner,
	p.ptctrusted AS trusted,
	p.ptcreadfn AS readfunction,
	p.ptcwritefn AS writefunction,
	p.ptcvalidatorfn AS validatorfunction
FROM pg_extprotocol p
WHERE {}
ORDER BY p.ptcname"#,
            extension_clause("p")
        )
    }

    /// Qualified names of functions and whether they are built in.
    fn function_info(&self) -> String {
        format!(
            r#"
SELECT p.oid AS oid,
	quote_ident(n.nspname) || '.' || quote_ident(p.proname) AS name,
	(n.nspname = 'pg_catalog' OR p.oid < {}) AS isinternal
FROM pg_proc p
	JOIN pg_namespace n ON p.pronamespace = n.oid"#,
            FIRST_NORMAL_OBJECT_ID
        )
    }

    /// Foreign-table server bindings. None when the engine has no foreign tables.
    fn foreign_tables(&self) -> Option<String> {
        None
    }

    /// Owner, privileges and comment per object of one class.
    fn metadata(&self, params: &MetadataQueryParams, filter: &dyn ObjectFilter) -> String {
        let owner = params
            .owner_column
            .map(|c| format!("quote_ident(pg_get_userbyid(o.{}))", c))
            .unwrap_or_else(|| "''::text".to_string());
        let privileges = params
            .acl_column
            .map(|c| format!("coalesce(array_to_string(o.{}, ','), '')", c))
            .unwrap_or_else(|| "''::text".to_string());

        let mut sql = format!(
            r#"
SELECT o.{oid} AS oid,
	{owner} AS owner,
	{privileges} AS privileges,
	coalesce(d.description, '') AS comment
FROM {table} o
	LEFT JOIN pg_description d ON d.objoid = o.{oid} AND d.classoid = {regclass}::regclass AND d.objsubid = 0"#,
            oid = params.oid_column,
            owner = owner,
            privileges = privileges,
            table = params.catalog_table,
            regclass = quote_literal(params.catalog_table),
        );
        if let Some(ns) = params.namespace_column {
            sql.push_str(&format!(
                "\n\tJOIN pg_namespace n ON o.{} = n.oid\nWHERE {}",
                ns,
                filter.schema_clause("n")
            ));
        } else {
            sql.push_str("\nWHERE true");
        }
        if let Some(condition) = params.condition {
            sql.push_str(&format!("\n\tAND {}", condition));
        }
        sql.push_str(&format!("\n\tAND {}", extension_clause("o")));
        sql
    }
}

/// Manual dispatch over the three query families.
#[derive(Debug, Clone)]
pub enum QueryStrategy {
    Pre6(Pre6Queries),
    V6(V6Queries),
    V7Plus(V7Queries),
}

impl QueryStrategy {
    /// Select the strategy for an engine version.
    pub fn for_version(version: &EngineVersion) -> Self {
        match version.family() {
            QueryFamily::Pre6 => QueryStrategy::Pre6(Pre6Queries),
            QueryFamily::V6 => QueryStrategy::V6(V6Queries),
            QueryFamily::V7Plus => QueryStrategy::V7Plus(V7Queries),
        }
    }

    fn inner(&self) -> &dyn CatalogQueries {
        match self {
            QueryStrategy::Pre6(q) => q,
            QueryStrategy::V6(q) => q,
            QueryStrategy::V7Plus(q) => q,
        }
    }
}

impl CatalogQueries for QueryStrategy {
    fn family(&self) -> QueryFamily {
        self.inner().family()
    }

    fn unique_constraint_columns(&self) -> Option<String> {
        self.inner().unique_constraint_columns()
    }

    fn indexes(&self, filter: &dyn ObjectFilter, implicit: &BTreeSet<String>) -> String {
        self.inner().indexes(filter, implicit)
    }

    fn rules(&self, filter: &dyn ObjectFilter) -> String {
        self.inner().rules(filter)
    }

    fn trigger_constraint_clause(&self) -> &'static str {
        self.inner().trigger_constraint_clause()
    }

    fn triggers(&self, filter: &dyn ObjectFilter) -> String {
        self.inner().triggers(filter)
    }

    fn event_triggers(&self) -> Option<String> {
        self.inner().event_triggers()
    }

    fn table_relkinds(&self) -> &'static str {
        self.inner().table_relkinds()
    }

    fn user_tables(&self, filter: &dyn ObjectFilter) -> String {
        self.inner().user_tables(filter)
    }

    fn partition_links(&self) -> String {
        self.inner().partition_links()
    }

    fn columns(&self, filter: &dyn ObjectFilter) -> String {
        self.inner().columns(filter)
    }

    fn distribution_policies(&self) -> String {
        self.inner().distribution_policies()
    }

    fn table_storage(&self, filter: &dyn ObjectFilter) -> String {
        self.inner().table_storage(filter)
    }

    fn table_inheritance(&self) -> String {
        self.inner().table_inheritance()
    }

    fn sequences(&self, filter: &dyn ObjectFilter) -> String {
        self.inner().sequences(filter)
    }

    fn sequence_definition(&self, sequence_fqn: &str) -> String {
        self.inner().sequence_definition(sequence_fqn)
    }

    fn sequence_owners(&self) -> String {
        self.inner().sequence_owners()
    }

    fn views(&self, filter: &dyn ObjectFilter) -> String {
        self.inner().views(filter)
    }

    fn external_tables(&self) -> String {
        self.inner().external_tables()
    }

    fn external_protocols(&self) -> String {
        self.inner().external_protocols()
    }

    fn function_info(&self) -> String {
        self.inner().function_info()
    }

    fn foreign_tables(&self) -> Option<String> {
        self.inner().foreign_tables()
    }

    fn metadata(&self, params: &MetadataQueryParams, filter: &dyn ObjectFilter) -> String {
        self.inner().metadata(params, filter)
    }
}

/// Options column shared by external and foreign table queries.
pub(crate) fn options_array(column: &str, separator: &str) -> String {
    format!(
        "coalesce(array_to_string(ARRAY(SELECT pg_catalog.quote_ident(option_name) || ' ' || pg_catalog.quote_literal(option_value) FROM pg_options_to_table({}) ORDER BY option_name), {}), '')",
        column, separator
    )
}
