//! Queries for engines before 6.

use std::collections::BTreeSet;

use super::{options_array, CatalogQueries};
use crate::catalog::filter::{extension_clause, ObjectFilter};
use crate::catalog::version::QueryFamily;
use crate::ident::{literal_list, quote_literal};

/// Pre-6 catalog layout: partitions in `pg_partition_rule`, no replica
/// identity, implicit unique-constraint indexes detected by name.
#[derive(Debug, Clone, Copy, Default)]
pub struct Pre6Queries;

impl CatalogQueries for Pre6Queries {
    fn family(&self) -> QueryFamily {
        QueryFamily::Pre6
    }

    fn unique_constraint_columns(&self) -> Option<String> {
        Some(
            r#"
SELECT DISTINCT
	n.nspname AS schema,
	t.relname AS tablename,
	a.attname AS columnname
FROM pg_constraint c
	JOIN pg_class t ON c.conrelid = t.oid
	JOIN pg_namespace n ON t.relnamespace = n.oid
	JOIN pg_attribute a ON c.conrelid = a.attrelid
	JOIN pg_index i ON i.indrelid = c.conrelid
WHERE a.attnum > 0
	AND a.attnum = ANY(c.conkey)
	AND c.contype = 'u'
	AND i.indisunique = 't'
	AND i.indisprimary = 'f'"#
                .to_string(),
        )
    }

    fn indexes(&self, filter: &dyn ObjectFilter, implicit_index_names: &BTreeSet<String>) -> String {
        let implicit = if implicit_index_names.is_empty() {
            String::new()
        } else {
            format!(
                "OR n.nspname || '.' || ic.relname IN ({})",
                literal_list(implicit_index_names)
            )
        };
        format!(
            r#"
SELECT DISTINCT i.indexrelid AS oid,
	quote_ident(ic.relname) AS name,
	quote_ident(n.nspname) AS owningschema,
	quote_ident(c.relname) AS owningtable,
	coalesce(quote_ident(s.spcname), '') AS tablespace,
	pg_get_indexdef(i.indexrelid) AS def,
	i.indisclustered AS isclustered,
	false AS isreplicaidentity,
	0::oid AS parentindex,
	CASE
		WHEN i.indisprimary = 't' {} THEN 't'
		ELSE 'f'
	END AS supportsconstraint
FROM pg_index i
	JOIN pg_class ic ON (ic.oid = i.indexrelid)
	JOIN pg_namespace n ON (ic.relnamespace = n.oid)
	JOIN pg_class c ON (c.oid = i.indrelid)
	LEFT JOIN pg_tablespace s ON (ic.reltablespace = s.oid)
WHERE {}
	AND i.indisvalid
	AND NOT EXISTS (SELECT 1 FROM pg_partition_rule r WHERE r.parchildrelid = c.oid)
	AND {}
ORDER BY name"#,
            implicit,
            filter.relation_clause("n", "c"),
            extension_clause("c")
        )
    }

    fn trigger_constraint_clause(&self) -> &'static str {
        "tgisconstraint = 'f'"
    }

    fn event_triggers(&self) -> Option<String> {
        None
    }

    fn table_relkinds(&self) -> &'static str {
        "'r'"
    }

    fn partition_links(&self) -> String {
        pre7_partition_links()
    }

    fn distribution_policies(&self) -> String {
        r#"
SELECT p.localoid AS oid,
	CASE
		WHEN p.attrnums IS NULL THEN 'DISTRIBUTED RANDOMLY'
		ELSE 'DISTRIBUTED BY (' || array_to_string(ARRAY(
			SELECT quote_ident(a.attname)
			FROM pg_attribute a
			WHERE a.attrelid = p.localoid AND a.attnum = ANY(p.attrnums)
			ORDER BY a.attnum), ', ') || ')'
	END AS value
FROM gp_distribution_policy p"#
            .to_string()
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
	0::bigint AS startval,
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
        format!(
            r#"
SELECT c.oid AS oid,
	quote_ident(n.nspname) AS schema,
	quote_ident(c.relname) AS name,
	''::text AS options,
	''::text AS tablespace,
	pg_get_viewdef(c.oid) AS definition,
	false AS ismaterialized
FROM pg_class c
	JOIN pg_namespace n ON n.oid = c.relnamespace
WHERE c.relkind = 'v'
	AND {}
	AND {}
ORDER BY c.oid"#,
            filter.relation_clause("n", "c"),
            extension_clause("c")
        )
    }

    fn external_tables(&self) -> String {
        external_tables_sql("coalesce(e.fmterrtbl = e.reloid, false)")
    }
}

/// External-table query shared by the pre-7 families; they differ in how
/// LOG ERRORS is recorded.
pub(super) fn external_tables_sql(log_errors: &str) -> String {
    format!(
        r#"
SELECT e.reloid AS oid,
	CASE WHEN e.urilocation IS NOT NULL THEN e.urilocation[1] ELSE '' END AS location,
	coalesce(e.urilocation, '{{}}') AS urilocation,
	coalesce(array_to_string(e.execlocation, ','), '') AS execlocation,
	e.fmttype::text AS formattype,
	coalesce(e.fmtopts, '') AS formatopts,
	{} AS options,
	coalesce(e.command, '') AS command,
	coalesce(e.rejectlimit, 0) AS rejectlimit,
	coalesce(e.rejectlimittype::text, '') AS rejectlimittype,
	{} AS logerrors,
	pg_encoding_to_char(e.encoding)::text AS encoding,
	e.writable AS writable
FROM pg_exttable e"#,
        options_array("e.options", "E',\\n\\t'"),
        log_errors
    )
}

pub(super) fn pre7_partition_links() -> String {
    r#"
SELECT r.parchildrelid AS oid,
	pc.oid AS parentoid,
	quote_ident(pn.nspname) AS parentschema,
	quote_ident(pc.relname) AS parentname,
	CASE WHEN coalesce(r.parname, '') = '' THEN ''::text ELSE quote_ident(r.parname) END AS partitionname,
	CASE WHEN p.parkind <> 'r' OR r.parisdefault THEN 0
		ELSE rank() OVER (PARTITION BY r.paroid, r.parparentrule ORDER BY r.parruleord)
	END AS partitionrank
FROM pg_partition_rule r
	JOIN pg_partition p ON p.oid = r.paroid
	LEFT JOIN pg_partition_rule pr ON pr.oid = r.parparentrule
	JOIN pg_class pc ON pc.oid = CASE WHEN r.parparentrule = 0 THEN p.parrelid ELSE pr.parchildrelid END
	JOIN pg_namespace pn ON pn.oid = pc.relnamespace
WHERE r.parchildrelid != 0
	AND NOT p.paristemplate
ORDER BY r.parchildrelid"#
        .to_string()
}

pub(super) fn pre7_table_storage(filter: &dyn ObjectFilter) -> String {
    format!(
        r#"
SELECT c.oid AS oid,
	coalesce(quote_ident(t.spcname), '') AS tablespace,
	coalesce(array_to_string(c.reloptions, ', '), '') AS storageoptions,
	coalesce(pg_get_partition_def(c.oid, true, true), '') AS partitiondef,
	''::text AS partitionbound
FROM pg_class c
	JOIN pg_namespace n ON n.oid = c.relnamespace
	LEFT JOIN pg_tablespace t ON t.oid = c.reltablespace
WHERE c.relkind = 'r'
	AND {}"#,
        filter.schema_clause("n")
    )
}

pub(super) fn pre7_table_inheritance() -> String {
    r#"
SELECT i.inhrelid AS oid,
	i.inhparent AS parentoid,
	quote_ident(n.nspname) || '.' || quote_ident(p.relname) AS referencedobject
FROM pg_inherits i
	JOIN pg_class p ON i.inhparent = p.oid
	JOIN pg_namespace n ON p.relnamespace = n.oid
WHERE NOT EXISTS (SELECT 1 FROM pg_partition_rule r WHERE r.parchildrelid = i.inhrelid)
ORDER BY i.inhrelid, i.inhseqno"#
        .to_string()
}

/// Literal form of a sequence name for `::regclass` casts.
pub(super) fn regclass_literal(sequence_fqn: &str) -> String {
    quote_literal(sequence_fqn)
}
