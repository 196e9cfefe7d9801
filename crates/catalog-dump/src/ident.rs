//! Identifier and literal quoting.
//!
//! Catalog queries return names already passed through the server's
//! `quote_ident`, so rendering mostly joins them. The helpers here cover the
//! places where names come from configuration instead: filter clauses and
//! include lists that must compare equal to what the catalog returns.

use crate::error::{DumpError, Result};

/// PostgreSQL's NAMEDATALEN - 1.
const MAX_IDENTIFIER_LENGTH: usize = 63;

/// Validate an identifier taken from configuration.
///
/// Rejects empty names, null bytes and names longer than the server accepts.
pub fn validate_identifier(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(DumpError::Config("Identifier cannot be empty".to_string()));
    }

    if name.contains('\0') {
        return Err(DumpError::Config(format!(
            "Identifier contains null byte: {:?}",
            name
        )));
    }

    if name.len() > MAX_IDENTIFIER_LENGTH {
        return Err(DumpError::Config(format!(
            "Identifier exceeds maximum length of {} bytes (got {} bytes): {:?}",
            MAX_IDENTIFIER_LENGTH,
            name.len(),
            name
        )));
    }

    Ok(())
}

/// Keywords the server's `quote_ident` always quotes: the reserved,
/// column-name and type/function-name categories.
const QUOTED_KEYWORDS: &[&str] = &[
    // reserved
    "all", "analyse", "analyze", "and", "any", "array", "as", "asc", "asymmetric", "both",
    "case", "cast", "check", "collate", "column", "constraint", "create", "current_catalog",
    "current_date", "current_role", "current_time", "current_timestamp", "current_user",
    "default", "deferrable", "desc", "distinct", "distributed", "do", "else", "end", "except",
    "false", "fetch", "for", "foreign", "from", "grant", "group", "having", "in", "initially",
    "intersect", "into", "lateral", "leading", "limit", "localtime", "localtimestamp", "not",
    "null", "offset", "on", "only", "or", "order", "placing", "primary", "references",
    "returning", "scatter", "select", "session_user", "some", "symmetric", "table", "then",
    "to", "trailing", "true", "union", "unique", "user", "using", "variadic", "when", "where",
    "window", "with",
    // type and function names
    "authorization", "binary", "collation", "concurrently", "cross", "current_schema",
    "freeze", "full", "ilike", "inner", "is", "isnull", "join", "left", "like", "natural",
    "notnull", "outer", "overlaps", "right", "similar", "tablesample", "verbose",
    // column names
    "between", "bigint", "bit", "boolean", "char", "character", "coalesce", "dec", "decimal",
    "exists", "extract", "float", "greatest", "grouping", "inout", "int", "integer",
    "interval", "least", "national", "nchar", "none", "nullif", "numeric", "out", "overlay",
    "position", "precision", "real", "row", "setof", "smallint", "substring", "time",
    "timestamp", "treat", "trim", "values", "varchar", "xmlattributes", "xmlconcat",
    "xmlelement", "xmlexists", "xmlforest", "xmlparse", "xmlpi", "xmlroot", "xmlserialize",
];

/// Quote an identifier the way the server's `quote_ident` does.
///
/// Lowercase names made of letters, digits and underscores pass through
/// untouched unless they are keywords; anything else is wrapped in double
/// quotes with embedded quotes doubled.
pub fn quote_ident(name: &str) -> String {
    let mut chars = name.chars();
    let safe = match chars.next() {
        Some(first) => {
            (first.is_ascii_lowercase() || first == '_')
                && chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
                && !QUOTED_KEYWORDS.contains(&name)
        }
        None => false,
    };
    if safe {
        name.to_string()
    } else {
        format!("\"{}\"", name.replace('"', "\"\""))
    }
}

/// Join two already-quoted names into `schema.name`.
pub fn make_fqn(schema: &str, name: &str) -> String {
    format!("{}.{}", schema, name)
}

/// Suffix of the staging table an external leaf partition is exchanged in from.
const EXT_PART_SUFFIX: &str = "_ext_part_";

/// Name of the staging table for an external leaf partition.
///
/// The name is truncated so the suffixed result still fits in an identifier.
/// Quoted names keep their quotes around the suffixed text.
pub fn append_ext_part_suffix(name: &str) -> String {
    let limit = MAX_IDENTIFIER_LENGTH - EXT_PART_SUFFIX.len();
    let truncate = |s: &str| -> String {
        let mut end = s.len().min(limit);
        while !s.is_char_boundary(end) {
            end -= 1;
        }
        s[..end].to_string()
    };
    match name.strip_prefix('"').and_then(|n| n.strip_suffix('"')) {
        Some(inner) => format!("\"{}{}\"", truncate(inner), EXT_PART_SUFFIX),
        None => format!("{}{}", truncate(name), EXT_PART_SUFFIX),
    }
}

/// Render a string literal, doubling embedded single quotes.
pub fn quote_literal(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

/// Render a list of values as a comma-separated list of literals.
pub fn literal_list<I, S>(values: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    values
        .into_iter()
        .map(|v| quote_literal(v.as_ref()))
        .collect::<Vec<_>>()
        .join(",")
}

/// Split an unquoted `schema.name` entry from configuration.
pub fn split_relation(entry: &str) -> Result<(&str, &str)> {
    let (schema, name) = entry.split_once('.').ok_or_else(|| {
        DumpError::Config(format!(
            "Relation '{}' must be written as schema.name",
            entry
        ))
    })?;
    validate_identifier(schema)?;
    validate_identifier(name)?;
    Ok((schema, name))
}
