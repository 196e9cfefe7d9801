//! Configuration validation.

use super::Config;
use crate::error::{DumpError, Result};

/// Validate the configuration.
pub fn validate(config: &Config) -> Result<()> {
    if config.connection.host.is_empty() {
        return Err(DumpError::Config("connection.host is required".into()));
    }
    if config.connection.database.is_empty() {
        return Err(DumpError::Config("connection.database is required".into()));
    }
    if config.connection.user.is_empty() {
        return Err(DumpError::Config("connection.user is required".into()));
    }
    if config.connection.max_connections == 0 {
        return Err(DumpError::Config(
            "connection.max_connections must be at least 1".into(),
        ));
    }

    let filter = &config.filter;
    if let Some(schema) = filter
        .include_schemas
        .iter()
        .find(|s| filter.exclude_schemas.contains(s))
    {
        return Err(DumpError::Config(format!(
            "schema '{}' is both included and excluded",
            schema
        )));
    }
    if let Some(rel) = filter
        .include_relations
        .iter()
        .find(|r| filter.exclude_relations.contains(r))
    {
        return Err(DumpError::Config(format!(
            "relation '{}' is both included and excluded",
            rel
        )));
    }
    for rel in filter
        .include_relations
        .iter()
        .chain(filter.exclude_relations.iter())
    {
        validate_relation_name(rel)?;
    }

    if config.output.metadata_file.is_empty() {
        return Err(DumpError::Config("output.metadata_file is required".into()));
    }
    if config.output.metadata_file == config.output.toc_file {
        return Err(DumpError::Config(
            "output.metadata_file and output.toc_file must differ".into(),
        ));
    }

    Ok(())
}

/// Relation filter entries must be `schema.name` with both parts present.
fn validate_relation_name(rel: &str) -> Result<()> {
    crate::ident::split_relation(rel).map(|_| ())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ConnectionConfig, FilterConfig, OutputConfig};

    fn valid_config() -> Config {
        Config {
            connection: ConnectionConfig {
                host: "localhost".to_string(),
                port: 5432,
                database: "warehouse".to_string(),
                user: "gpadmin".to_string(),
                password: "password".to_string(),
                ssl_mode: "disable".to_string(),
                max_connections: 1,
            },
            filter: FilterConfig::default(),
            output: OutputConfig::default(),
            engine_version: None,
        }
    }

    #[test]
    fn test_valid_config() {
        let config = valid_config();
        assert!(validate(&config).is_ok());
    }

    #[test]
    fn test_missing_host() {
        let mut config = valid_config();
        config.connection.host = "".to_string();
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_schema_both_included_and_excluded() {
        let mut config = valid_config();
        config.filter.include_schemas = vec!["sales".into()];
        config.filter.exclude_schemas = vec!["sales".into()];
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_relation_filter_needs_schema() {
        let mut config = valid_config();
        config.filter.include_relations = vec!["orders".into()];
        assert!(validate(&config).is_err());

        config.filter.include_relations = vec!["public.orders".into()];
        assert!(validate(&config).is_ok());
    }

    #[test]
    fn test_output_files_must_differ() {
        let mut config = valid_config();
        config.output.toc_file = config.output.metadata_file.clone();
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_connection_debug_redacts_password() {
        let mut config = valid_config();
        config.connection.password = "super_secret_password_123".to_string();
        let debug_output = format!("{:?}", config.connection);
        assert!(debug_output.contains("[REDACTED]"));
        assert!(!debug_output.contains("super_secret_password_123"));
    }

    #[test]
    fn test_password_not_serialized() {
        let mut config = valid_config();
        config.connection.password = "super_secret".to_string();
        let json = serde_json::to_string(&config).unwrap();
        assert!(!json.contains("super_secret"), "Password was serialized: {}", json);
    }
}
