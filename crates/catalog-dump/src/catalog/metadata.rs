//! Owner, privilege and comment metadata per object.

use std::collections::HashMap;

use tracing::debug;

use super::client::{select, CatalogClient};
use super::filter::ObjectFilter;
use super::row::{CatalogRow, FromCatalogRow, Oid};
use super::strategy::{CatalogQueries, QueryStrategy};
use crate::classify::acl::{parse_acl_list, Acl};
use crate::error::Result;

/// Auxiliary metadata for one object. Empty fields emit nothing.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ObjectMetadata {
    pub owner: String,
    pub comment: String,
    pub privileges: Vec<Acl>,
}

impl ObjectMetadata {
    pub fn with_comment(comment: &str) -> Self {
        Self {
            comment: comment.to_string(),
            ..Default::default()
        }
    }
}

/// Metadata keyed by object oid. A missing key means nothing to emit.
pub type MetadataMap = HashMap<Oid, ObjectMetadata>;

struct MetadataRow {
    oid: Oid,
    metadata: ObjectMetadata,
}

impl FromCatalogRow for MetadataRow {
    fn from_row(row: &CatalogRow) -> Result<Self> {
        Ok(Self {
            oid: row.oid("oid")?,
            metadata: ObjectMetadata {
                owner: row.text_or_empty("owner")?,
                comment: row.text_or_empty("comment")?,
                privileges: parse_acl_list(&row.text_or_empty("privileges")?)?,
            },
        })
    }
}

/// Where one object class keeps its owner, ACL and namespace.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MetadataQueryParams {
    pub object_type: &'static str,
    pub catalog_table: &'static str,
    pub oid_column: &'static str,
    pub owner_column: Option<&'static str>,
    pub acl_column: Option<&'static str>,
    pub namespace_column: Option<&'static str>,
    pub condition: Option<&'static str>,
}

const fn relation_params(object_type: &'static str, condition: &'static str) -> MetadataQueryParams {
    MetadataQueryParams {
        object_type,
        catalog_table: "pg_class",
        oid_column: "oid",
        owner_column: Some("relowner"),
        acl_column: Some("relacl"),
        namespace_column: Some("relnamespace"),
        condition: Some(condition),
    }
}

pub const TABLE_METADATA: MetadataQueryParams =
    relation_params("TABLE", "o.relkind IN ('r', 'p', 'f')");

pub const SEQUENCE_METADATA: MetadataQueryParams = relation_params("SEQUENCE", "o.relkind = 'S'");

pub const VIEW_METADATA: MetadataQueryParams = relation_params("VIEW", "o.relkind IN ('v', 'm')");

pub const INDEX_METADATA: MetadataQueryParams = MetadataQueryParams {
    object_type: "INDEX",
    catalog_table: "pg_class",
    oid_column: "oid",
    owner_column: None,
    acl_column: None,
    namespace_column: Some("relnamespace"),
    condition: Some("o.relkind = 'i'"),
};

pub const RULE_METADATA: MetadataQueryParams = MetadataQueryParams {
    object_type: "RULE",
    catalog_table: "pg_rewrite",
    oid_column: "oid",
    owner_column: None,
    acl_column: None,
    namespace_column: None,
    condition: None,
};

pub const TRIGGER_METADATA: MetadataQueryParams = MetadataQueryParams {
    object_type: "TRIGGER",
    catalog_table: "pg_trigger",
    oid_column: "oid",
    owner_column: None,
    acl_column: None,
    namespace_column: None,
    condition: None,
};

pub const EVENT_TRIGGER_METADATA: MetadataQueryParams = MetadataQueryParams {
    object_type: "EVENT TRIGGER",
    catalog_table: "pg_event_trigger",
    oid_column: "oid",
    owner_column: Some("evtowner"),
    acl_column: None,
    namespace_column: None,
    condition: None,
};

pub const PROTOCOL_METADATA: MetadataQueryParams = MetadataQueryParams {
    object_type: "PROTOCOL",
    catalog_table: "pg_extprotocol",
    oid_column: "oid",
    owner_column: Some("ptcowner"),
    acl_column: Some("ptcacl"),
    namespace_column: None,
    condition: None,
};

/// Fetch owner, privileges and comments for one object class.
pub async fn get_metadata_for_object_type<C>(
    client: &C,
    strategy: &QueryStrategy,
    filter: &dyn ObjectFilter,
    params: &MetadataQueryParams,
) -> Result<MetadataMap>
where
    C: CatalogClient + ?Sized,
{
    let object_class = format!("{} metadata", params.object_type.to_lowercase());
    let rows: Vec<MetadataRow> =
        select(client, &object_class, &strategy.metadata(params, filter)).await?;
    let map: MetadataMap = rows
        .into_iter()
        .filter(|r| r.metadata != ObjectMetadata::default())
        .map(|r| (r.oid, r.metadata))
        .collect();
    debug!("Found metadata for {} {} objects", map.len(), params.object_type);
    Ok(map)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::client::mock::MockCatalogClient;
    use crate::catalog::filter::SchemaRelationFilter;
    use crate::catalog::version::EngineVersion;

    #[tokio::test]
    async fn test_metadata_map_skips_empty_rows() {
        let client = MockCatalogClient::new("").respond(
            "FROM pg_class o",
            vec![
                CatalogRow::new()
                    .with("oid", 10u32)
                    .with("owner", "gpadmin")
                    .with("privileges", "gpadmin=arwdDxt/gpadmin,=r/gpadmin")
                    .with("comment", "fact table"),
                CatalogRow::new()
                    .with("oid", 11u32)
                    .with("owner", "")
                    .with("privileges", "")
                    .with("comment", ""),
            ],
        );
        let strategy = QueryStrategy::for_version(&EngineVersion::new(6, 0, 0));
        let filter = SchemaRelationFilter::default();
        let map = get_metadata_for_object_type(&client, &strategy, &filter, &TABLE_METADATA)
            .await
            .unwrap();
        assert_eq!(map.len(), 1);
        let meta = &map[&10];
        assert_eq!(meta.owner, "gpadmin");
        assert_eq!(meta.comment, "fact table");
        assert_eq!(meta.privileges.len(), 2);
        assert!(meta.privileges[1].is_public());
    }
}
