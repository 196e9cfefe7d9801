//! Implicit unique-constraint index detection for legacy engines.
//!
//! A unique constraint creates its index implicitly, named
//! `table_column_key`. Recreating the constraint recreates the index, so the
//! index itself must not be emitted. Names are unquoted, matching
//! `nspname || '.' || relname` on the server.

use std::collections::BTreeSet;

use crate::catalog::row::{CatalogRow, FromCatalogRow};
use crate::error::Result;

/// Raw constraint column as returned by the catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConstraintColumn {
    pub schema: String,
    pub table: String,
    pub column: String,
}

impl FromCatalogRow for ConstraintColumn {
    fn from_row(row: &CatalogRow) -> Result<Self> {
        Ok(Self {
            schema: row.text("schema")?,
            table: row.text("tablename")?,
            column: row.text("columnname")?,
        })
    }
}

/// `schema.table_column_key`.
pub fn implicit_index_name(schema: &str, table: &str, column: &str) -> String {
    format!("{}.{}_{}_key", schema, table, column)
}

/// Build the set of implicit index names.
pub fn implicit_index_names(columns: &[ConstraintColumn]) -> BTreeSet<String> {
    columns
        .iter()
        .map(|c| implicit_index_name(&c.schema, &c.table, &c.column))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_naming_convention() {
        assert_eq!(
            implicit_index_name("public", "orders", "order_no"),
            "public.orders_order_no_key"
        );
    }

    #[test]
    fn test_names_are_deduplicated_and_sorted() {
        let col = |t: &str, c: &str| ConstraintColumn {
            schema: "public".into(),
            table: t.into(),
            column: c.into(),
        };
        let names = implicit_index_names(&[col("b", "x"), col("a", "y"), col("b", "x")]);
        assert_eq!(
            names.into_iter().collect::<Vec<_>>(),
            vec!["public.a_y_key".to_string(), "public.b_x_key".to_string()]
        );
    }
}
