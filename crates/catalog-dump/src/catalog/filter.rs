//! Schema and relation filtering.
//!
//! Filtering is explicit configuration passed into the query layer and the
//! resolver. Queries splice in the SQL clauses produced here; the working-set
//! selection asks the same filter about individual relations.

use std::collections::HashSet;

use crate::config::FilterConfig;
use crate::error::Result;
use crate::ident::{literal_list, make_fqn, quote_ident, split_relation};

/// Schemas that never hold user objects.
const SYSTEM_SCHEMAS: &[&str] = &[
    "gp_toolkit",
    "information_schema",
    "pg_aoseg",
    "pg_bitmapindex",
    "pg_catalog",
];

/// Predicate over (schema, relation) pairs.
///
/// Names handed to `includes_relation`/`excludes_relation` are in the
/// catalog's quoted form, as returned by `quote_ident`.
pub trait ObjectFilter: Send + Sync {
    /// SQL restricting `<namespace_alias>.nspname` to dumped schemas.
    fn schema_clause(&self, namespace_alias: &str) -> String;

    /// SQL restricting a relation (namespace and class aliases) to dumped
    /// relations, including the schema restriction.
    fn relation_clause(&self, namespace_alias: &str, class_alias: &str) -> String;

    /// Whether an explicit relation include list is configured.
    fn has_relation_includes(&self) -> bool;

    /// Whether the relation is on the include list. Always true without one.
    fn includes_relation(&self, schema: &str, name: &str) -> bool;

    /// Whether the relation is on the exclude list.
    fn excludes_relation(&self, schema: &str, name: &str) -> bool;

    /// Whether leaf partitions join the working set.
    fn leaf_partition_data(&self) -> bool;
}

/// Skip objects that belong to an extension.
pub fn extension_clause(alias: &str) -> String {
    format!(
        "{}.oid NOT IN (select objid from pg_depend where deptype = 'e')",
        alias
    )
}

/// [`ObjectFilter`] built from [`FilterConfig`].
#[derive(Debug, Clone, Default)]
pub struct SchemaRelationFilter {
    include_schemas: Vec<String>,
    exclude_schemas: Vec<String>,
    include_relations: Vec<(String, String)>,
    exclude_relations: Vec<(String, String)>,
    included: HashSet<String>,
    excluded: HashSet<String>,
    leaf_partition_data: bool,
}

impl SchemaRelationFilter {
    pub fn new(config: &FilterConfig) -> Result<Self> {
        let parse = |entries: &[String]| -> Result<Vec<(String, String)>> {
            entries
                .iter()
                .map(|e| split_relation(e).map(|(s, n)| (s.to_string(), n.to_string())))
                .collect()
        };
        let include_relations = parse(&config.include_relations)?;
        let exclude_relations = parse(&config.exclude_relations)?;
        let quoted = |rels: &[(String, String)]| -> HashSet<String> {
            rels.iter()
                .map(|(s, n)| make_fqn(&quote_ident(s), &quote_ident(n)))
                .collect()
        };

        Ok(Self {
            include_schemas: config.include_schemas.clone(),
            exclude_schemas: config.exclude_schemas.clone(),
            included: quoted(&include_relations),
            excluded: quoted(&exclude_relations),
            include_relations,
            exclude_relations,
            leaf_partition_data: config.leaf_partition_data,
        })
    }

    fn relation_list(rels: &[(String, String)]) -> String {
        literal_list(rels.iter().map(|(s, n)| format!("{}.{}", s, n)))
    }
}

impl ObjectFilter for SchemaRelationFilter {
    fn schema_clause(&self, ns: &str) -> String {
        let mut clause = format!(
            "{ns}.nspname NOT LIKE 'pg_temp_%' AND {ns}.nspname NOT LIKE 'pg_toast%' AND {ns}.nspname NOT IN ({})",
            literal_list(SYSTEM_SCHEMAS),
            ns = ns
        );
        if !self.include_schemas.is_empty() {
            clause.push_str(&format!(
                "\n\tAND {}.nspname IN ({})",
                ns,
                literal_list(&self.include_schemas)
            ));
        }
        if !self.exclude_schemas.is_empty() {
            clause.push_str(&format!(
                "\n\tAND {}.nspname NOT IN ({})",
                ns,
                literal_list(&self.exclude_schemas)
            ));
        }
        clause
    }

    fn relation_clause(&self, ns: &str, class: &str) -> String {
        let mut clause = self.schema_clause(ns);
        if !self.include_relations.is_empty() {
            clause.push_str(&format!(
                "\n\tAND {}.nspname || '.' || {}.relname IN ({})",
                ns,
                class,
                Self::relation_list(&self.include_relations)
            ));
        }
        if !self.exclude_relations.is_empty() {
            clause.push_str(&format!(
                "\n\tAND {}.nspname || '.' || {}.relname NOT IN ({})",
                ns,
                class,
                Self::relation_list(&self.exclude_relations)
            ));
        }
        clause
    }

    fn has_relation_includes(&self) -> bool {
        !self.included.is_empty()
    }

    fn includes_relation(&self, schema: &str, name: &str) -> bool {
        self.included.is_empty() || self.included.contains(&make_fqn(schema, name))
    }

    fn excludes_relation(&self, schema: &str, name: &str) -> bool {
        self.excluded.contains(&make_fqn(schema, name))
    }

    fn leaf_partition_data(&self) -> bool {
        self.leaf_partition_data
    }
}
