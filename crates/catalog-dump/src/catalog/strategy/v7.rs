//! Queries for 7+ engines.

use std::collections::BTreeSet;

use super::pre6::regclass_literal;
use super::v6::{foreign_tables_sql, views_with_options};
use super::{options_array, CatalogQueries, FIRST_NORMAL_OBJECT_ID};
use crate::catalog::filter::{extension_clause, ObjectFilter};
use crate::catalog::version::QueryFamily;

/// 7+ catalog layout: declarative partitioning through `pg_inherits`,
/// attachable partition indexes, sequences in `pg_sequence` and external
/// tables served through `gp_exttable_server`.
#[derive(Debug, Clone, Copy, Default)]
pub struct V7Queries;

impl CatalogQueries for V7Queries {
    fn family(&self) -> QueryFamily {
        QueryFamily::V7Plus
    }

    fn indexes(&self, filter: &dyn ObjectFilter, _implicit: &BTreeSet<String>) -> String {
        format!(
            r#"
SELECT DISTINCT i.indexrelid AS oid,
	coalesce(inh.inhparent, '0') AS parentindex,
	quote_ident(ic.relname) AS name,
	quote_ident(n.nspname) AS owningschema,
	quote_ident(c.relname) AS owningtable,
	coalesce(quote_ident(s.spcname), '') AS tablespace,
	pg_get_indexdef(i.indexrelid) AS def,
	i.indisclustered AS isclustered,
	i.indisreplident AS isreplicaidentity,
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
	LEFT JOIN pg_catalog.pg_inherits inh ON inh.inhrelid = i.indexrelid
WHERE {}
	AND i.indisvalid
	AND i.indisready
	AND i.indisprimary = 'f'
	AND i.indexrelid >= {}
	AND {}
ORDER BY name"#,
            filter.schema_clause("n"),
            FIRST_NORMAL_OBJECT_ID,
            extension_clause("c")
        )
    }

    fn table_relkinds(&self) -> &'static str {
        "'r', 'p', 'f'"
    }

    fn partition_links(&self) -> String {
        r#"
SELECT i.inhrelid AS oid,
	i.inhparent AS parentoid,
	quote_ident(pn.nspname) AS parentschema,
	quote_ident(pc.relname) AS parentname,
	''::text AS partitionname,
	0::bigint AS partitionrank
FROM pg_inherits i
	JOIN pg_class c ON c.oid = i.inhrelid
	JOIN pg_class pc ON pc.oid = i.inhparent
	JOIN pg_namespace pn ON pn.oid = pc.relnamespace
WHERE c.relispartition
	AND c.relkind IN ('r', 'p', 'f')
ORDER BY i.inhrelid"#
            .to_string()
    }

    fn table_storage(&self, filter: &dyn ObjectFilter) -> String {
        format!(
            r#"
SELECT c.oid AS oid,
	coalesce(quote_ident(t.spcname), '') AS tablespace,
	coalesce(array_to_string(c.reloptions, ', '), '') AS storageoptions,
	CASE WHEN c.relkind = 'p' THEN 'PARTITION BY ' || pg_get_partkeydef(c.oid) ELSE '' END AS partitiondef,
	CASE WHEN c.relispartition THEN pg_get_expr(c.relpartbound, c.oid) ELSE '' END AS partitionbound
FROM pg_class c
	JOIN pg_namespace n ON n.oid = c.relnamespace
	LEFT JOIN pg_tablespace t ON t.oid = c.reltablespace
WHERE c.relkind IN ('r', 'p')
	AND {}"#,
            filter.schema_clause("n")
        )
    }

    fn table_inheritance(&self) -> String {
        r#"
SELECT i.inhrelid AS oid,
	i.inhparent AS parentoid,
	quote_ident(n.nspname) || '.' || quote_ident(p.relname) AS referencedobject
FROM pg_inherits i
	JOIN pg_class c ON c.oid = i.inhrelid
	JOIN pg_class p ON i.inhparent = p.oid
	JOIN pg_namespace n ON p.relnamespace = n.oid
WHERE NOT c.relispartition
	AND c.relkind IN ('r', 'p', 'f')
ORDER BY i.inhrelid, i.inhseqno"#
            .to_string()
    }

    fn sequence_definition(&self, sequence_fqn: &str) -> String {
        format!(
            r#"
SELECT r.last_value AS lastval,
	s.seqstart AS startval,
	s.seqincrement AS increment,
	s.seqmax AS maxval,
	s.seqmin AS minval,
	s.seqcache AS cacheval,
	s.seqcycle AS iscycled,
	r.is_called AS iscalled
FROM {} r
	JOIN pg_sequence s ON s.seqrelid = {}::regclass"#,
            sequence_fqn,
            regclass_literal(sequence_fqn)
        )
    }

    fn views(&self, filter: &dyn ObjectFilter) -> String {
        views_with_options(filter)
    }

    fn external_tables(&self) -> String {
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
	e.logerrors::text IN ('t', 'p', 'true') AS logerrors,
	pg_encoding_to_char(e.encoding)::text AS encoding,
	e.writable AS writable
FROM pg_exttable e"#,
            options_array("e.options", "E',\\n\\t'")
        )
    }

    fn foreign_tables(&self) -> Option<String> {
        Some(foreign_tables_sql(
            "\nWHERE fs.srvname != 'gp_exttable_server'",
        ))
    }
}
