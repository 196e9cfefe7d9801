//! Queries for 6.x engines.

use std::collections::BTreeSet;

use super::pre6::{external_tables_sql, pre7_partition_links, pre7_table_inheritance, pre7_table_storage};
use super::{options_array, CatalogQueries};
use crate::catalog::filter::{extension_clause, ObjectFilter};
use crate::catalog::version::QueryFamily;

/// 6.x catalog layout: legacy partitioning, replica identity and
/// constraint-backed index detection through `pg_constraint.conindid`.
#[derive(Debug, Clone, Copy, Default)]
pub struct V6Queries;

impl CatalogQueries for V6Queries {
    fn family(&self) -> QueryFamily {
        QueryFamily::V6
    }

    fn indexes(&self, filter: &dyn ObjectFilter, _implicit: &BTreeSet<String>) -> String {
        format!(
            r#"
SELECT DISTINCT i.indexrelid AS oid,
	quote_ident(ic.relname) AS name,
	quote_ident(n.nspname) AS owningschema,
	quote_ident(c.relname) AS owningtable,
	coalesce(quote_ident(s.spcname), '') AS tablespace,
	pg_get_indexdef(i.indexrelid) AS def,
	i.indisclustered AS isclustered,
	i.indisreplident AS isreplicaidentity,
	0::oid AS parentindex,
	CASE
		WHEN conindid > 0 THEN 't'
		ELSE 'f'
	END as supportsconstraint
FROM pg_index i
	JOIN pg_class ic ON ic.oid = i.indexrelid
	JOIN pg_namespace n ON ic.relnamespace = n.oid
	JOIN pg_class c ON c.oid = i.indrelid
	LEFT JOIN pg_tablespace s ON ic.reltablespace = s.oid
	LEFT JOIN pg_constraint con ON i.indexrelid = con.conindid
WHERE {}
	AND i.indisvalid
	AND i.indisready
	AND i.indisprimary = 'f'
	AND NOT EXISTS (SELECT 1 FROM pg_partition_rule r WHERE r.parchildrelid = c.oid)
	AND {}
ORDER BY name"#,
            filter.relation_clause("n", "c"),
            extension_clause("c")
        )
    }

    fn table_relkinds(&self) -> &'static str {
        "'r', 'f'"
    }

    fn partition_links(&self) -> String {
        pre7_partition_links()
    }

    fn table_storage(&self, filter: &dyn ObjectFilter) -> String {
        pre7_table_storage(filter)
    }

    fn table_inheritance(&self) -> String {
        pre7_table_inheritance()
    }

    fn sequence_definition(&self, sequence_fqn: &str) -> String {
        format!(
            r#"
SELECT last_value AS lastval,
	start_value AS startval,
	increment_by AS increment,
	max_value AS maxval,
	min_value AS minval,
	cache_value AS cacheval,
	is_cycled AS iscycled,
	is_called AS iscalled
FROM {}"#,
            sequence_fqn
        )
    }

    fn views(&self, filter: &dyn ObjectFilter) -> String {
        views_with_options(filter)
    }

    fn external_tables(&self) -> String {
        external_tables_sql("e.logerrors")
    }

    fn foreign_tables(&self) -> Option<String> {
        Some(foreign_tables_sql(""))
    }
}

/// View query for engines that store view options and materialized views.
pub(super) fn views_with_options(filter: &dyn ObjectFilter) -> String {
    format!(
        r#"
SELECT c.oid AS oid,
	quote_ident(n.nspname) AS schema,
	quote_ident(c.relname) AS name,
	coalesce(array_to_string(c.reloptions, ', '), '') AS options,
	coalesce(quote_ident(t.spcname), '') AS tablespace,
	pg_get_viewdef(c.oid) AS definition,
	c.relkind = 'm' AS ismaterialized
FROM pg_class c
	JOIN pg_namespace n ON n.oid = c.relnamespace
	LEFT JOIN pg_tablespace t ON t.oid = c.reltablespace
WHERE c.relkind IN ('v', 'm')
	AND {}
	AND {}
ORDER BY c.oid"#,
        filter.relation_clause("n", "c"),
        extension_clause("c")
    )
}

pub(super) fn foreign_tables_sql(extra_condition: &str) -> String {
    format!(
        r#"
SELECT ft.ftrelid AS oid,
	quote_ident(fs.srvname) AS server,
	{} AS options
FROM pg_foreign_table ft
	JOIN pg_foreign_server fs ON ft.ftserver = fs.oid{}"#,
        options_array("ft.ftoptions", "', '"),
        extra_condition
    )
}
