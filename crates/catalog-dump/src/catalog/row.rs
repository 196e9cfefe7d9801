//! Untyped catalog rows and their decoding into typed records.
//!
//! Catalog queries return a handful of column types (oid, bool, integers, text
//! and text arrays). [`CatalogRow`] captures a result row by column name so the
//! typed records in [`super::model`] can be decoded the same way whether the
//! row came from a live server or from a test fixture.

use tokio_postgres::Row;

use crate::error::{DumpError, Result};

/// Object identifier as stored in the catalog.
pub type Oid = u32;

/// A single catalog column value.
#[derive(Debug, Clone, PartialEq)]
pub enum CatalogValue {
    /// SQL NULL.
    Null,
    /// Boolean value.
    Bool(bool),
    /// Any integer column (int2/int4/int8).
    Int(i64),
    /// Object identifier.
    Oid(Oid),
    /// Floating point value.
    Float(f64),
    /// Text, name, char and varchar columns.
    Text(String),
    /// Text arrays. NULL elements are dropped.
    TextArray(Vec<String>),
}

impl From<bool> for CatalogValue {
    fn from(v: bool) -> Self {
        CatalogValue::Bool(v)
    }
}

impl From<i64> for CatalogValue {
    fn from(v: i64) -> Self {
        CatalogValue::Int(v)
    }
}

impl From<Oid> for CatalogValue {
    fn from(v: Oid) -> Self {
        CatalogValue::Oid(v)
    }
}

impl From<&str> for CatalogValue {
    fn from(v: &str) -> Self {
        CatalogValue::Text(v.to_string())
    }
}

impl From<String> for CatalogValue {
    fn from(v: String) -> Self {
        CatalogValue::Text(v)
    }
}

impl From<Vec<String>> for CatalogValue {
    fn from(v: Vec<String>) -> Self {
        CatalogValue::TextArray(v)
    }
}

impl<T: Into<CatalogValue>> From<Option<T>> for CatalogValue {
    fn from(v: Option<T>) -> Self {
        v.map(Into::into).unwrap_or(CatalogValue::Null)
    }
}

/// One row of a catalog query, addressed by column name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CatalogRow {
    columns: Vec<(String, CatalogValue)>,
}

impl CatalogRow {
    /// Create an empty row.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a column, builder style.
    pub fn with(mut self, column: &str, value: impl Into<CatalogValue>) -> Self {
        self.columns.push((column.to_string(), value.into()));
        self
    }

    /// Decode a tokio-postgres row.
    pub fn from_pg_row(row: &Row) -> Result<Self> {
        let mut columns = Vec::with_capacity(row.len());
        for (idx, col) in row.columns().iter().enumerate() {
            let value: CatalogValue = match col.type_().name() {
                "bool" => row.try_get::<_, Option<bool>>(idx)?.into(),
                "int2" => row
                    .try_get::<_, Option<i16>>(idx)?
                    .map(|v| CatalogValue::Int(v as i64))
                    .unwrap_or(CatalogValue::Null),
                "int4" => row
                    .try_get::<_, Option<i32>>(idx)?
                    .map(|v| CatalogValue::Int(v as i64))
                    .unwrap_or(CatalogValue::Null),
                "int8" => row.try_get::<_, Option<i64>>(idx)?.into(),
                "oid" => row.try_get::<_, Option<u32>>(idx)?.into(),
                "float4" => row
                    .try_get::<_, Option<f32>>(idx)?
                    .map(|v| CatalogValue::Float(v as f64))
                    .unwrap_or(CatalogValue::Null),
                "float8" => row
                    .try_get::<_, Option<f64>>(idx)?
                    .map(CatalogValue::Float)
                    .unwrap_or(CatalogValue::Null),
                // The single-byte "char" type.
                "char" => row
                    .try_get::<_, Option<i8>>(idx)?
                    .map(|v| CatalogValue::Text((v as u8 as char).to_string()))
                    .unwrap_or(CatalogValue::Null),
                "text" | "name" | "varchar" | "bpchar" | "unknown" => {
                    row.try_get::<_, Option<String>>(idx)?.into()
                }
                "_text" | "_name" | "_varchar" => row
                    .try_get::<_, Option<Vec<Option<String>>>>(idx)?
                    .map(|v| CatalogValue::TextArray(v.into_iter().flatten().collect()))
                    .unwrap_or(CatalogValue::Null),
                other => {
                    return Err(DumpError::decode(
                        col.name(),
                        format!("unsupported catalog column type '{}'", other),
                    ))
                }
            };
            columns.push((col.name().to_string(), value));
        }
        Ok(Self { columns })
    }

    /// Look up a column value by name.
    pub fn value(&self, column: &str) -> Result<&CatalogValue> {
        self.columns
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, v)| v)
            .ok_or_else(|| DumpError::decode(column, "column not present in result"))
    }

    /// Whether the column is present and NULL.
    pub fn is_null(&self, column: &str) -> Result<bool> {
        Ok(matches!(self.value(column)?, CatalogValue::Null))
    }

    /// Non-null text column.
    pub fn text(&self, column: &str) -> Result<String> {
        self.opt_text(column)?
            .ok_or_else(|| DumpError::decode(column, "unexpected NULL"))
    }

    /// Nullable text column.
    pub fn opt_text(&self, column: &str) -> Result<Option<String>> {
        match self.value(column)? {
            CatalogValue::Null => Ok(None),
            CatalogValue::Text(s) => Ok(Some(s.clone())),
            CatalogValue::Int(v) => Ok(Some(v.to_string())),
            CatalogValue::Oid(v) => Ok(Some(v.to_string())),
            other => Err(type_mismatch(column, "text", other)),
        }
    }

    /// Text column where NULL reads as the empty string.
    pub fn text_or_empty(&self, column: &str) -> Result<String> {
        Ok(self.opt_text(column)?.unwrap_or_default())
    }

    /// Boolean column. Legacy queries return `'t'`/`'f'` text.
    pub fn bool(&self, column: &str) -> Result<bool> {
        match self.value(column)? {
            CatalogValue::Bool(b) => Ok(*b),
            CatalogValue::Text(s) => match s.as_str() {
                "t" | "true" => Ok(true),
                "f" | "false" => Ok(false),
                _ => Err(DumpError::decode(column, format!("'{}' is not a boolean", s))),
            },
            CatalogValue::Null => Ok(false),
            other => Err(type_mismatch(column, "bool", other)),
        }
    }

    /// Object identifier column.
    pub fn oid(&self, column: &str) -> Result<Oid> {
        match self.value(column)? {
            CatalogValue::Oid(v) => Ok(*v),
            CatalogValue::Int(v) => Oid::try_from(*v)
                .map_err(|_| DumpError::decode(column, format!("{} is not a valid oid", v))),
            CatalogValue::Null => Ok(0),
            other => Err(type_mismatch(column, "oid", other)),
        }
    }

    /// Integer column.
    pub fn i64(&self, column: &str) -> Result<i64> {
        match self.value(column)? {
            CatalogValue::Int(v) => Ok(*v),
            CatalogValue::Oid(v) => Ok(*v as i64),
            CatalogValue::Text(s) => s
                .trim()
                .parse()
                .map_err(|_| DumpError::decode(column, format!("'{}' is not an integer", s))),
            other => Err(type_mismatch(column, "integer", other)),
        }
    }

    /// Text array column; NULL reads as empty.
    pub fn text_array(&self, column: &str) -> Result<Vec<String>> {
        match self.value(column)? {
            CatalogValue::TextArray(v) => Ok(v.clone()),
            CatalogValue::Null => Ok(Vec::new()),
            other => Err(type_mismatch(column, "text[]", other)),
        }
    }
}

fn type_mismatch(column: &str, expected: &str, got: &CatalogValue) -> DumpError {
    DumpError::decode(column, format!("expected {}, got {:?}", expected, got))
}

/// Decode a typed record from a catalog row.
pub trait FromCatalogRow: Sized {
    fn from_row(row: &CatalogRow) -> Result<Self>;
}
