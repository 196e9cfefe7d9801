//! Configuration type definitions.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Catalog connection settings.
    pub connection: ConnectionConfig,

    /// Inclusion/exclusion filters for schemas and relations.
    #[serde(default)]
    pub filter: FilterConfig,

    /// Output file locations.
    #[serde(default)]
    pub output: OutputConfig,

    /// Engine version override (e.g. "6.20.0"). Detected from the server when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub engine_version: Option<String>,
}

/// Catalog database connection configuration.
#[derive(Clone, Serialize, Deserialize)]
pub struct ConnectionConfig {
    /// Database host.
    pub host: String,

    /// Database port (default: 5432).
    #[serde(default = "default_pg_port")]
    pub port: u16,

    /// Database name.
    pub database: String,

    /// Username.
    pub user: String,

    /// Password. Never written back out.
    #[serde(default, skip_serializing)]
    pub password: String,

    /// SSL mode (default: "disable").
    #[serde(default = "default_disable")]
    pub ssl_mode: String,

    /// Pool size. The dump itself runs on a single connection.
    #[serde(default = "default_max_connections")]
    pub max_connections: usize,
}

impl fmt::Debug for ConnectionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("database", &self.database)
            .field("user", &self.user)
            .field("password", &"[REDACTED]")
            .field("ssl_mode", &self.ssl_mode)
            .field("max_connections", &self.max_connections)
            .finish()
    }
}

/// Schema and relation filters.
///
/// Relation entries are unquoted `schema.name` pairs.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct FilterConfig {
    /// Only dump objects in these schemas.
    #[serde(default)]
    pub include_schemas: Vec<String>,

    /// Skip objects in these schemas.
    #[serde(default)]
    pub exclude_schemas: Vec<String>,

    /// Only dump these relations (and objects hanging off them).
    #[serde(default)]
    pub include_relations: Vec<String>,

    /// Skip these relations.
    #[serde(default)]
    pub exclude_relations: Vec<String>,

    /// Include leaf partitions of partitioned tables in the working set.
    #[serde(default)]
    pub leaf_partition_data: bool,
}

/// Output file configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Statement stream destination (default: "metadata.sql").
    #[serde(default = "default_metadata_file")]
    pub metadata_file: String,

    /// TOC destination (default: "toc.yaml").
    #[serde(default = "default_toc_file")]
    pub toc_file: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            metadata_file: default_metadata_file(),
            toc_file: default_toc_file(),
        }
    }
}

fn default_pg_port() -> u16 {
    5432
}

fn default_disable() -> String {
    "disable".to_string()
}

fn default_max_connections() -> usize {
    1
}

fn default_metadata_file() -> String {
    "metadata.sql".to_string()
}

fn default_toc_file() -> String {
    "toc.yaml".to_string()
}
