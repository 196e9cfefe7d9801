//! Metadata dump pipeline.
//!
//! One run reads every object class to completion over a single catalog
//! snapshot, classifies and orders the records, then renders predata and
//! postdata statements into the metadata file while the TOC records each
//! object's byte range.

use std::collections::{HashMap, HashSet};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::time::Instant;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::catalog::metadata::{
    get_metadata_for_object_type, MetadataMap, EVENT_TRIGGER_METADATA, INDEX_METADATA,
    PROTOCOL_METADATA, RULE_METADATA, SEQUENCE_METADATA, TABLE_METADATA, TRIGGER_METADATA,
    VIEW_METADATA,
};
use crate::catalog::model::{
    EventTrigger, FunctionInfo, IndexDefinition, InheritanceLink, PartitionLink,
    ProtocolDefinition, Relation, RuleDefinition, Sequence, TriggerDefinition, ViewDefinition,
};
use crate::catalog::{
    detect_version, get_all_sequences, get_all_user_tables, get_column_definitions,
    get_distribution_policies, get_event_triggers, get_external_protocols,
    get_external_table_definitions, get_foreign_table_definitions, get_function_info,
    get_indexes, get_inheritance_links, get_partition_links, get_rules, get_sequence_owner_rows,
    get_table_storage, get_triggers, get_views, CatalogClient, CatalogQueries, ObjectFilter, Oid,
    PgCatalogClient, QueryFamily, QueryStrategy, SchemaRelationFilter,
};
use crate::classify::partition::{classify_partition_levels, external_partition_exchange};
use crate::config::Config;
use crate::ddl::{
    print_alter_sequence_owner_statements, print_create_event_trigger_statements,
    print_create_external_protocol_statements, print_create_index_statements,
    print_create_rule_statements, print_create_sequence_statements,
    print_create_table_statements, print_create_trigger_statements, print_create_view_statements,
    MetadataWriter, TableDefinition, TocHeader,
};
use crate::error::Result;
use crate::resolve::{
    resolve_sequence_owners, resolve_table_inheritance, sort_relations_by_inheritance,
    SequenceOwnership,
};

/// Metadata maps per object class.
#[derive(Debug, Clone, Default)]
pub struct SnapshotMetadata {
    pub tables: MetadataMap,
    pub sequences: MetadataMap,
    pub views: MetadataMap,
    pub indexes: MetadataMap,
    pub rules: MetadataMap,
    pub triggers: MetadataMap,
    pub event_triggers: MetadataMap,
    pub protocols: MetadataMap,
}

/// Everything read from the catalog, classified and in emission order.
#[derive(Debug, Clone, Default)]
pub struct CatalogSnapshot {
    pub protocols: Vec<ProtocolDefinition>,
    pub functions: HashMap<Oid, FunctionInfo>,
    pub sequences: Vec<Sequence>,
    pub sequence_ownership: SequenceOwnership,
    /// Tables to create, parents before children.
    pub tables: Vec<(Relation, TableDefinition)>,
    pub views: Vec<ViewDefinition>,
    pub indexes: Vec<IndexDefinition>,
    pub rules: Vec<RuleDefinition>,
    pub triggers: Vec<TriggerDefinition>,
    pub event_triggers: Vec<EventTrigger>,
    pub metadata: SnapshotMetadata,
}

/// Number of top-level objects written per class.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectCounts {
    pub protocols: usize,
    pub sequences: usize,
    pub tables: usize,
    pub external_tables: usize,
    pub foreign_tables: usize,
    pub views: usize,
    pub sequence_owners: usize,
    pub indexes: usize,
    pub rules: usize,
    pub triggers: usize,
    pub event_triggers: usize,
}

/// Result of a dump run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DumpSummary {
    /// Detected or configured engine version.
    pub engine_version: String,

    /// Query family used for the catalog.
    pub query_family: String,

    /// When the dump started.
    pub started_at: DateTime<Utc>,

    /// When the dump completed.
    pub completed_at: DateTime<Utc>,

    /// Total duration in seconds.
    pub duration_seconds: f64,

    pub metadata_file: String,
    pub toc_file: String,

    /// Size of the metadata file.
    pub bytes_written: u64,

    /// Entries recorded in the TOC.
    pub toc_entries: usize,

    pub objects: ObjectCounts,
}

impl DumpSummary {
    /// Convert to JSON string.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Read the whole catalog for one run.
pub async fn collect<C>(
    client: &C,
    strategy: &QueryStrategy,
    filter: &dyn ObjectFilter,
) -> Result<CatalogSnapshot>
where
    C: CatalogClient + ?Sized,
{
    let family = strategy.family();

    let partition_links = get_partition_links(client, strategy).await?;
    let partitions = classify_partition_levels(&partition_links);
    let mut externals = get_external_table_definitions(client, strategy).await?;
    let external_oids: HashSet<Oid> = externals.keys().copied().collect();

    let relations =
        get_all_user_tables(client, strategy, filter, &partitions, &external_oids).await?;
    let working_set: HashSet<Oid> = relations.iter().map(|r| r.oid).collect();

    let mut columns = get_column_definitions(client, strategy, filter).await?;
    let mut policies = get_distribution_policies(client, strategy).await?;
    let mut storage = get_table_storage(client, strategy, filter).await?;
    let mut foreign = get_foreign_table_definitions(client, strategy).await?;
    let inheritance_links = get_inheritance_links(client, strategy).await?;
    let mut inherits = resolve_table_inheritance(&inheritance_links, &working_set);

    // Partition parents order before their children just like inherited parents.
    let mut ordering_links = inheritance_links;
    ordering_links.extend(partition_links.iter().map(|l| InheritanceLink {
        oid: l.oid,
        parent_oid: l.parent_oid,
        parent_fqn: l.parent_fqn(),
    }));
    let relations = sort_relations_by_inheritance(relations, &ordering_links);
    let parent_of: HashMap<Oid, &PartitionLink> =
        partition_links.iter().map(|l| (l.oid, l)).collect();

    let mut tables = Vec::with_capacity(relations.len());
    for relation in relations {
        let external = externals.remove(&relation.oid);
        let mut attach_to = None;
        let mut exchange = None;
        if let Some(info) = partitions.get(&relation.oid).filter(|i| i.is_child()) {
            if family != QueryFamily::V7Plus {
                // The root's partition clause creates every child as a heap
                // table; external leaves are exchanged in over it.
                if external.is_none() {
                    debug!("Partition {} is created by its root {}", relation.fqn(), info.root_name);
                    continue;
                }
                exchange = external_partition_exchange(relation.oid, &parent_of);
            } else if let Some(link) = parent_of.get(&relation.oid) {
                if working_set.contains(&link.parent_oid) {
                    attach_to = Some(link.parent_fqn());
                } else {
                    warn!(
                        "Partition parent {} of {} is not part of the backup; partition will not be attached",
                        link.parent_fqn(),
                        relation.fqn()
                    );
                }
            }
        }

        let definition = TableDefinition {
            columns: columns.remove(&relation.oid).unwrap_or_default(),
            distribution_policy: policies.remove(&relation.oid).unwrap_or_default(),
            storage: storage.remove(&relation.oid).unwrap_or_default(),
            inherits: inherits.remove(&relation.oid).unwrap_or_default(),
            external,
            foreign: foreign.remove(&relation.oid),
            attach_to,
            exchange,
        };
        tables.push((relation, definition));
    }

    let sequences = get_all_sequences(client, strategy, filter).await?;
    let owner_rows = get_sequence_owner_rows(client, strategy).await?;
    let sequence_ownership = resolve_sequence_owners(&owner_rows, &working_set);
    let views = get_views(client, strategy, filter).await?;

    let protocols = get_external_protocols(client, strategy).await?;
    let functions = if protocols.is_empty() {
        HashMap::new()
    } else {
        get_function_info(client, strategy).await?
    };

    // Postdata objects only for relations that are being created.
    let mut owners: HashSet<String> = tables.iter().map(|(r, _)| r.fqn()).collect();
    owners.extend(views.iter().map(|v| v.fqn()));
    let indexes = retain_owned_indexes(get_indexes(client, strategy, filter).await?, &owners);
    let mut rules = get_rules(client, strategy, filter).await?;
    rules.retain(|r| owners.contains(&r.table_fqn()));
    let mut triggers = get_triggers(client, strategy, filter).await?;
    triggers.retain(|t| owners.contains(&t.table_fqn()));
    let event_triggers = get_event_triggers(client, strategy).await?;

    let metadata = SnapshotMetadata {
        tables: get_metadata_for_object_type(client, strategy, filter, &TABLE_METADATA).await?,
        sequences: get_metadata_for_object_type(client, strategy, filter, &SEQUENCE_METADATA)
            .await?,
        views: get_metadata_for_object_type(client, strategy, filter, &VIEW_METADATA).await?,
        indexes: get_metadata_for_object_type(client, strategy, filter, &INDEX_METADATA).await?,
        rules: get_metadata_for_object_type(client, strategy, filter, &RULE_METADATA).await?,
        triggers: get_metadata_for_object_type(client, strategy, filter, &TRIGGER_METADATA)
            .await?,
        event_triggers: if strategy.event_triggers().is_some() {
            get_metadata_for_object_type(client, strategy, filter, &EVENT_TRIGGER_METADATA)
                .await?
        } else {
            MetadataMap::new()
        },
        protocols: if protocols.is_empty() {
            MetadataMap::new()
        } else {
            get_metadata_for_object_type(client, strategy, filter, &PROTOCOL_METADATA).await?
        },
    };

    Ok(CatalogSnapshot {
        protocols,
        functions,
        sequences,
        sequence_ownership,
        tables,
        views,
        indexes,
        rules,
        triggers,
        event_triggers,
        metadata,
    })
}

/// Keep indexes on created relations; an attachment to an index that is
/// not kept is dropped.
fn retain_owned_indexes(
    indexes: Vec<IndexDefinition>,
    owners: &HashSet<String>,
) -> Vec<IndexDefinition> {
    let mut kept: Vec<IndexDefinition> = indexes
        .into_iter()
        .filter(|i| owners.contains(&i.table_fqn()))
        .collect();
    let names: HashSet<String> = kept.iter().map(|i| i.fqn()).collect();
    for index in &mut kept {
        if let Some(parent) = &index.parent_index_fqn {
            if !names.contains(parent) {
                warn!(
                    "Parent index {} of index {} is not part of the backup; index will not be attached",
                    parent,
                    index.fqn()
                );
                index.parent_index_fqn = None;
            }
        }
    }
    kept
}

impl CatalogSnapshot {
    /// Write predata then postdata, in dependency order.
    pub fn render<W: Write>(
        &self,
        writer: &mut MetadataWriter<W>,
        family: QueryFamily,
    ) -> Result<ObjectCounts> {
        let mut counts = ObjectCounts::default();
        let meta = &self.metadata;

        counts.protocols = print_create_external_protocol_statements(
            writer,
            &self.protocols,
            &self.functions,
            &meta.protocols,
        )?;

        print_create_sequence_statements(
            writer,
            &self.sequences,
            family,
            &meta.sequences,
        )?;
        counts.sequences = self.sequences.len();

        print_create_table_statements(
            writer,
            self.tables.iter().map(|(r, d)| (r, d)),
            &meta.tables,
        )?;
        counts.tables = self.tables.len();
        counts.external_tables = self.tables.iter().filter(|(_, d)| d.external.is_some()).count();
        counts.foreign_tables = self.tables.iter().filter(|(_, d)| d.foreign.is_some()).count();

        print_create_view_statements(writer, &self.views, &meta.views)?;
        counts.views = self.views.len();

        counts.sequence_owners = print_alter_sequence_owner_statements(
            writer,
            &self.sequences,
            &self.sequence_ownership,
        )?;

        print_create_index_statements(writer, &self.indexes, &meta.indexes)?;
        counts.indexes = self.indexes.iter().filter(|i| !i.supports_constraint).count();

        print_create_rule_statements(writer, &self.rules, &meta.rules)?;
        counts.rules = self.rules.len();

        print_create_trigger_statements(writer, &self.triggers, &meta.triggers)?;
        counts.triggers = self.triggers.len();

        print_create_event_trigger_statements(
            writer,
            &self.event_triggers,
            family,
            &meta.event_triggers,
        )?;
        counts.event_triggers = self.event_triggers.len();

        Ok(counts)
    }
}

/// Runs a complete metadata dump.
pub struct MetadataDump {
    config: Config,
    filter: SchemaRelationFilter,
}

impl MetadataDump {
    pub fn new(config: Config) -> Result<Self> {
        let filter = SchemaRelationFilter::new(&config.filter)?;
        Ok(Self { config, filter })
    }

    /// Connect, dump, and close the connection.
    pub async fn run(&self) -> Result<DumpSummary> {
        let client = PgCatalogClient::connect(&self.config.connection).await?;
        let result = self.run_with_client(&client).await;
        let closed = client.close().await;
        let summary = result?;
        closed?;
        Ok(summary)
    }

    /// Dump through an existing catalog client.
    pub async fn run_with_client<C>(&self, client: &C) -> Result<DumpSummary>
    where
        C: CatalogClient + ?Sized,
    {
        let started_at = Utc::now();
        let timer = Instant::now();

        let version = detect_version(client, self.config.engine_version.as_deref()).await?;
        let strategy = QueryStrategy::for_version(&version);

        let snapshot = collect(client, &strategy, &self.filter).await?;

        let output = &self.config.output;
        let file = File::create(&output.metadata_file)?;
        let mut writer = MetadataWriter::new(BufWriter::new(file));
        let objects = snapshot.render(&mut writer, strategy.family())?;
        let bytes_written = writer.byte_count();
        let (_, mut toc) = writer.finish()?;

        toc.header = Some(TocHeader {
            engine_version: version.to_string(),
            config_hash: self.config.hash(),
            metadata_file: output.metadata_file.clone(),
            created_at: started_at,
        });
        toc.save(&output.toc_file)?;

        let completed_at = Utc::now();
        let summary = DumpSummary {
            engine_version: version.to_string(),
            query_family: strategy.family().to_string(),
            started_at,
            completed_at,
            duration_seconds: timer.elapsed().as_secs_f64(),
            metadata_file: output.metadata_file.clone(),
            toc_file: output.toc_file.clone(),
            bytes_written,
            toc_entries: toc.len(),
            objects,
        };

        info!(
            "Wrote {} objects ({} bytes) to {} in {:.1}s",
            summary.toc_entries, summary.bytes_written, summary.metadata_file, summary.duration_seconds
        );
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::client::mock::MockCatalogClient;
    use crate::catalog::row::CatalogRow;
    use crate::ddl::{MetadataEntry, Section, Toc};
    use crate::error::DumpError;

    fn config(dir: &std::path::Path) -> Config {
        Config::from_yaml(&format!(
            r#"
connection:
  host: mdw
  database: warehouse
  user: gpadmin
filter:
  exclude_relations: [public.staging]
output:
  metadata_file: {}
  toc_file: {}
"#,
            dir.join("metadata.sql").display(),
            dir.join("toc.yaml").display()
        ))
        .unwrap()
    }

    fn relation_row(oid: u32, name: &str) -> CatalogRow {
        CatalogRow::new()
            .with("schemaoid", 2200u32)
            .with("oid", oid)
            .with("schema", "public")
            .with("name", name)
    }

    fn catalog() -> MockCatalogClient {
        MockCatalogClient::new("PostgreSQL 9.4.26 (Greenplum Database 6.20.0 build commit:abc)")
            .respond(
                "FROM pg_attribute a",
                vec![CatalogRow::new()
                    .with("oid", 10u32)
                    .with("num", 1i64)
                    .with("name", "id")
                    .with("notnull", true)
                    .with("type", "integer")
                    .with("defaultval", None::<String>)],
            )
            .respond(
                "c.relkind IN ('r', 'f')",
                vec![relation_row(10, "orders"), relation_row(11, "staging")],
            )
            .respond(
                "pg_get_table_distributedby",
                vec![CatalogRow::new()
                    .with("oid", 10u32)
                    .with("value", "DISTRIBUTED BY (id)")],
            )
            .respond("WHERE c.relkind = 'S'", vec![relation_row(20, "orders_id_seq")])
            .respond(
                "FROM public.orders_id_seq",
                vec![CatalogRow::new()
                    .with("lastval", 3i64)
                    .with("startval", 1i64)
                    .with("increment", 1i64)
                    .with("maxval", i64::MAX)
                    .with("minval", 1i64)
                    .with("cacheval", 1i64)
                    .with("iscycled", false)
                    .with("iscalled", true)],
            )
            .respond(
                "d.deptype = 'a'",
                vec![CatalogRow::new()
                    .with("schema", "public")
                    .with("name", "orders_id_seq")
                    .with("tableoid", 11u32)
                    .with("tableschema", "public")
                    .with("tablename", "staging")
                    .with("columnname", "id")],
            )
            .respond(
                "FROM pg_index i",
                vec![CatalogRow::new()
                    .with("oid", 30u32)
                    .with("name", "orders_idx")
                    .with("owningschema", "public")
                    .with("owningtable", "orders")
                    .with("tablespace", "")
                    .with("def", "CREATE INDEX orders_idx ON public.orders USING btree(id)")
                    .with("isclustered", false)
                    .with("supportsconstraint", "f")
                    .with("isreplicaidentity", false)
                    .with("parentindex", 0u32)],
            )
            .respond(
                "o.relkind IN ('r', 'p', 'f')",
                vec![CatalogRow::new()
                    .with("oid", 10u32)
                    .with("owner", "")
                    .with("privileges", "")
                    .with("comment", "orders")],
            )
    }

    #[tokio::test]
    async fn test_run_writes_metadata_and_toc() {
        let dir = tempfile::tempdir().unwrap();
        let dump = MetadataDump::new(config(dir.path())).unwrap();
        let summary = dump.run_with_client(&catalog()).await.unwrap();

        assert_eq!(summary.engine_version, "6.20.0");
        assert_eq!(summary.query_family, "6");
        assert_eq!(summary.objects.tables, 1);
        assert_eq!(summary.objects.sequences, 1);
        assert_eq!(summary.objects.sequence_owners, 0);
        assert_eq!(summary.objects.indexes, 1);
        assert_eq!(summary.toc_entries, 3);

        let bytes = std::fs::read(dir.path().join("metadata.sql")).unwrap();
        assert_eq!(bytes.len() as u64, summary.bytes_written);
        let toc = Toc::load(dir.path().join("toc.yaml")).unwrap();
        let header = toc.header.as_ref().unwrap();
        assert_eq!(header.engine_version, "6.20.0");
        assert_eq!(header.config_hash.len(), 64);

        let kinds: Vec<_> = toc
            .predata_entries
            .iter()
            .map(|e| e.object_type.as_str())
            .collect();
        assert_eq!(kinds, vec!["SEQUENCE", "TABLE"]);
        let table = Toc::slice(&bytes, &toc.predata_entries[1]).unwrap();
        assert_eq!(
            std::str::from_utf8(table).unwrap(),
            "CREATE TABLE public.orders (\n\tid integer NOT NULL\n) DISTRIBUTED BY (id);\n\nCOMMENT ON TABLE public.orders IS 'orders';"
        );
        let index = Toc::slice(&bytes, &toc.postdata_entries[0]).unwrap();
        assert_eq!(index, b"CREATE INDEX orders_idx ON public.orders USING btree(id);");
    }

    #[tokio::test]
    async fn test_query_failure_aborts_run() {
        let dir = tempfile::tempdir().unwrap();
        let dump = MetadataDump::new(config(dir.path())).unwrap();
        let err = dump
            .run_with_client(&catalog().fail_on("FROM pg_index i"))
            .await
            .unwrap_err();
        assert!(matches!(err, DumpError::Query { .. }));
        assert!(!dir.path().join("toc.yaml").exists());
    }

    #[test]
    fn test_summary_to_json() {
        let summary = DumpSummary {
            engine_version: "7.1.0".into(),
            query_family: "7+".into(),
            started_at: Utc::now(),
            completed_at: Utc::now(),
            duration_seconds: 0.5,
            metadata_file: "metadata.sql".into(),
            toc_file: "toc.yaml".into(),
            bytes_written: 120,
            toc_entries: 2,
            objects: ObjectCounts::default(),
        };
        let json = summary.to_json().unwrap();
        assert!(json.contains("\"query_family\": \"7+\""));
        assert!(json.contains("\"bytes_written\": 120"));
    }

    fn rendered_snapshot() -> CatalogSnapshot {
        use crate::catalog::model::{ColumnDefinition, SequenceDefinition};

        let orders = Relation::new(10, "public", "orders");
        let table = TableDefinition {
            columns: vec![ColumnDefinition {
                oid: 10,
                num: 1,
                name: "id".into(),
                type_name: "integer".into(),
                not_null: true,
                default_value: None,
            }],
            distribution_policy: "DISTRIBUTED BY (id)".into(),
            ..Default::default()
        };
        let sequence = Sequence {
            relation: Relation::new(20, "public", "orders_id_seq"),
            definition: SequenceDefinition {
                last_value: 1,
                start_value: 1,
                increment: 1,
                max_value: i64::MAX,
                min_value: 1,
                cache_value: 1,
                is_cycled: false,
                is_called: false,
            },
        };
        let mut ownership = SequenceOwnership::default();
        ownership
            .tables
            .insert("public.orders_id_seq".into(), "public.orders".into());
        ownership
            .columns
            .insert("public.orders_id_seq".into(), "public.orders.id".into());

        let index = |oid: Oid, name: &str, parent: Option<&str>| IndexDefinition {
            oid,
            name: name.into(),
            owning_schema: "public".into(),
            owning_table: "orders".into(),
            def: Some(format!("CREATE INDEX {} ON public.orders USING btree(id)", name)),
            parent_index_fqn: parent.map(String::from),
            ..Default::default()
        };

        CatalogSnapshot {
            sequences: vec![sequence],
            sequence_ownership: ownership,
            tables: vec![(orders, table)],
            views: vec![ViewDefinition {
                oid: 30,
                schema: "public".into(),
                name: "recent_orders".into(),
                definition: Some(" SELECT orders.id FROM public.orders;".into()),
                ..Default::default()
            }],
            indexes: vec![
                index(40, "orders_idx", None),
                index(41, "orders_child_idx", Some("public.orders_idx")),
            ],
            ..Default::default()
        }
    }

    #[test]
    fn test_render_byte_ranges_cover_output() {
        let snapshot = rendered_snapshot();
        let mut writer = MetadataWriter::new(Vec::new());
        let counts = snapshot.render(&mut writer, QueryFamily::V6).unwrap();
        let (bytes, toc) = writer.finish().unwrap();

        assert_eq!(counts.sequence_owners, 1);
        assert_eq!(counts.indexes, 2);

        let entries: Vec<_> = toc
            .entries(Section::Predata)
            .iter()
            .chain(toc.entries(Section::Postdata))
            .collect();
        let kinds: Vec<_> = entries.iter().map(|e| e.object_type.as_str()).collect();
        assert_eq!(
            kinds,
            vec!["SEQUENCE", "TABLE", "VIEW", "SEQUENCE OWNER", "INDEX", "INDEX"]
        );

        // Entries tile the file with a blank line between neighbours
        assert_eq!(entries[0].start_byte, 0);
        assert_eq!(entries[entries.len() - 1].end_byte, bytes.len() as u64);
        for pair in entries.windows(2) {
            let gap = &bytes[pair[0].end_byte as usize..pair[1].start_byte as usize];
            assert_eq!(gap, b"\n\n");
        }

        let text = |entry: &MetadataEntry| {
            String::from_utf8(Toc::slice(&bytes, entry).unwrap().to_vec()).unwrap()
        };
        assert!(text(entries[1]).starts_with("CREATE TABLE public.orders ("));
        assert_eq!(
            text(entries[3]),
            "ALTER SEQUENCE public.orders_id_seq OWNED BY public.orders.id;"
        );
        assert_eq!(entries[3].reference_object, "public.orders");

        // Parent index precedes its attached child
        assert_eq!(entries[4].name, "orders_idx");
        assert_eq!(entries[5].name, "orders_child_idx");
        assert!(text(entries[5])
            .ends_with("\nALTER INDEX public.orders_idx ATTACH PARTITION public.orders_child_idx;"));
    }
}
