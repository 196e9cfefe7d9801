//! Configuration loading and validation.

mod types;
mod validation;

pub use types::*;

use crate::error::Result;
use sha2::{Digest, Sha256};
use std::path::Path;

impl Config {
    /// Load configuration from a YAML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Parse configuration from a YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: Config = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        validation::validate(self)
    }

    /// Compute a SHA256 hash of the configuration, recorded in the TOC header.
    pub fn hash(&self) -> String {
        let yaml = serde_yaml::to_string(self).unwrap_or_default();
        let mut hasher = Sha256::new();
        hasher.update(yaml.as_bytes());
        format!("{:x}", hasher.finalize())
    }
}

impl ConnectionConfig {
    /// Build a connection string for tokio-postgres.
    pub fn connection_string(&self) -> String {
        format!(
            "host={} port={} dbname={} user={} password={} sslmode={}",
            self.host, self.port, self.database, self.user, self.password, self.ssl_mode
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const YAML: &str = r#"
connection:
  host: mdw
  database: warehouse
  user: gpadmin
  password: changeme
filter:
  include_schemas: [sales]
  exclude_relations: [sales.staging]
"#;

    #[test]
    fn test_from_yaml_applies_defaults() {
        let config = Config::from_yaml(YAML).unwrap();
        assert_eq!(config.connection.port, 5432);
        assert_eq!(config.connection.ssl_mode, "disable");
        assert_eq!(config.output.metadata_file, "metadata.sql");
        assert_eq!(config.output.toc_file, "toc.yaml");
        assert_eq!(config.filter.include_schemas, vec!["sales".to_string()]);
        assert!(!config.filter.leaf_partition_data);
        assert!(config.engine_version.is_none());
    }

    #[test]
    fn test_hash_is_stable_and_sensitive() {
        let a = Config::from_yaml(YAML).unwrap();
        let mut b = a.clone();
        assert_eq!(a.hash(), b.hash());
        b.filter.leaf_partition_data = true;
        assert_ne!(a.hash(), b.hash());
    }

    #[test]
    fn test_from_yaml_rejects_missing_database() {
        let yaml = "connection:\n  host: mdw\n  database: ''\n  user: gpadmin\n";
        assert!(Config::from_yaml(yaml).is_err());
    }
}
