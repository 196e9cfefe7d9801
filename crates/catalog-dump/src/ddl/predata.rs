//! Tables, sequences and views.

use std::io::Write;

use super::externals::render_external_table;
use super::metadata::{render_object_metadata, ObjectKind};
use super::toc::Section;
use super::writer::{EntryKey, MetadataWriter};
use crate::catalog::metadata::MetadataMap;
use crate::catalog::model::{
    ColumnDefinition, ExternalTableDefinition, ForeignTableDefinition, Relation, Sequence,
    TableStorage, ViewDefinition,
};
use crate::catalog::version::QueryFamily;
use crate::classify::partition::PartitionExchange;
use crate::error::Result;
use crate::ident::{append_ext_part_suffix, quote_literal};
use crate::resolve::SequenceOwnership;

/// Everything needed to recreate one table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TableDefinition {
    pub columns: Vec<ColumnDefinition>,
    pub distribution_policy: String,
    pub storage: TableStorage,
    /// Inherited parents, in inheritance sequence order.
    pub inherits: Vec<String>,
    pub external: Option<ExternalTableDefinition>,
    pub foreign: Option<ForeignTableDefinition>,
    /// Parent to attach to, for partitions created on their own.
    pub attach_to: Option<String>,
    /// Exchange into the root's hierarchy, for external leaves before 7.
    pub exchange: Option<PartitionExchange>,
}

impl TableDefinition {
    pub fn kind(&self) -> ObjectKind {
        if self.external.is_some() {
            ObjectKind::ExternalTable
        } else if self.foreign.is_some() {
            ObjectKind::ForeignTable
        } else {
            ObjectKind::Table
        }
    }
}

/// Tab-indented column list, one column per line, with a trailing newline.
pub fn render_column_definitions(columns: &[ColumnDefinition]) -> String {
    if columns.is_empty() {
        return String::new();
    }
    let lines: Vec<String> = columns
        .iter()
        .map(|c| {
            let mut line = format!("\t{} {}", c.name, c.type_name);
            if c.not_null {
                line.push_str(" NOT NULL");
            }
            if let Some(default) = &c.default_value {
                line.push_str(&format!(" DEFAULT {}", default));
            }
            line
        })
        .collect();
    format!("{}\n", lines.join(",\n"))
}

/// `CREATE TABLE`, `CREATE ... EXTERNAL TABLE` or `CREATE FOREIGN TABLE`,
/// then partition attachment and metadata.
pub fn render_table(relation: &Relation, def: &TableDefinition, metadata: &MetadataMap) -> String {
    let fqn = relation.fqn();
    let mut out = if let Some(ext) = &def.external {
        match &def.exchange {
            Some(exchange) => render_exchanged_external_table(relation, def, ext, exchange),
            None => render_external_table(relation, &def.columns, ext, &def.distribution_policy),
        }
    } else if let Some(foreign) = &def.foreign {
        let mut s = format!(
            "CREATE FOREIGN TABLE {} (\n{}) SERVER {}",
            fqn,
            render_column_definitions(&def.columns),
            foreign.server
        );
        if !foreign.options.is_empty() {
            s.push_str(&format!(" OPTIONS ({})", foreign.options));
        }
        s.push(';');
        s
    } else {
        render_create_table(&fqn, def)
    };

    if let Some(parent) = &def.attach_to {
        out.push_str(&format!(
            "\n\nALTER TABLE {} ATTACH PARTITION {} {};",
            parent, fqn, def.storage.partition_bound
        ));
    }
    out.push_str(&render_object_metadata(
        metadata.get(&relation.oid),
        &fqn,
        def.kind(),
    ));
    out
}

/// Create an external leaf under its staging name, swap it in for the heap
/// leaf the root created, then drop the swapped-out heap table.
fn render_exchanged_external_table(
    relation: &Relation,
    def: &TableDefinition,
    ext: &ExternalTableDefinition,
    exchange: &PartitionExchange,
) -> String {
    let staging = Relation {
        name: append_ext_part_suffix(&relation.name),
        ..relation.clone()
    };
    let staging_fqn = staging.fqn();
    let mut out = render_external_table(&staging, &def.columns, ext, &def.distribution_policy);
    out.push_str(&format!("\n\nALTER TABLE {} ", exchange.root_fqn));
    for step in &exchange.path {
        out.push_str(&format!("ALTER PARTITION {} ", step));
    }
    out.push_str(&format!(
        "EXCHANGE PARTITION {} WITH TABLE {} WITHOUT VALIDATION;",
        exchange.partition, staging_fqn
    ));
    out.push_str(&format!("\n\nDROP TABLE {};", staging_fqn));
    out
}

fn render_create_table(fqn: &str, def: &TableDefinition) -> String {
    let mut out = format!(
        "CREATE TABLE {} (\n{})",
        fqn,
        render_column_definitions(&def.columns)
    );
    if !def.inherits.is_empty() {
        out.push_str(&format!(" INHERITS ({})", def.inherits.join(", ")));
    }
    if !def.storage.storage_options.is_empty() {
        out.push_str(&format!(" WITH ({})", def.storage.storage_options));
    }
    if !def.storage.tablespace.is_empty() {
        out.push_str(&format!(" TABLESPACE {}", def.storage.tablespace));
    }
    if !def.distribution_policy.is_empty() {
        out.push(' ');
        out.push_str(&def.distribution_policy);
    }
    if !def.storage.partition_def.is_empty() {
        out.push(' ');
        out.push_str(&def.storage.partition_def);
    }
    out.push(';');
    out
}

/// Emit tables in the given order, which must already place inherited
/// parents first.
pub fn print_create_table_statements<'a, W, I>(
    writer: &mut MetadataWriter<W>,
    tables: I,
    metadata: &MetadataMap,
) -> Result<()>
where
    W: Write,
    I: IntoIterator<Item = (&'a Relation, &'a TableDefinition)>,
{
    for (relation, def) in tables {
        let key = EntryKey::new(&relation.schema, &relation.name, def.kind().keyword());
        writer.emit(Section::Predata, key, &render_table(relation, def, metadata))?;
    }
    Ok(())
}

/// `CREATE SEQUENCE` and the `setval` restoring its position.
///
/// `START WITH` is only readable from 6 on. Descending sequences default to
/// a minimum of `-i64::MAX` before 7 and `i64::MIN` from 7 on.
pub fn render_sequence(sequence: &Sequence, family: QueryFamily, metadata: &MetadataMap) -> String {
    let def = &sequence.definition;
    let fqn = sequence.relation.fqn();
    let mut out = format!("CREATE SEQUENCE {}\n", fqn);
    if family != QueryFamily::Pre6 {
        out.push_str(&format!("\tSTART WITH {}\n", def.start_value));
    }
    out.push_str(&format!("\tINCREMENT BY {}\n", def.increment));

    let ascending = def.increment > 0;
    let default_max = if ascending { i64::MAX } else { -1 };
    let default_min = match (ascending, family) {
        (true, _) => 1,
        (false, QueryFamily::V7Plus) => i64::MIN,
        (false, _) => -i64::MAX,
    };
    if def.max_value == default_max {
        out.push_str("\tNO MAXVALUE\n");
    } else {
        out.push_str(&format!("\tMAXVALUE {}\n", def.max_value));
    }
    if def.min_value == default_min {
        out.push_str("\tNO MINVALUE\n");
    } else {
        out.push_str(&format!("\tMINVALUE {}\n", def.min_value));
    }
    out.push_str(&format!("\tCACHE {}", def.cache_value));
    if def.is_cycled {
        out.push_str("\n\tCYCLE");
    }
    out.push_str(&format!(
        ";\n\nSELECT pg_catalog.setval({}, {}, {});",
        quote_literal(&fqn),
        def.last_value,
        def.is_called
    ));
    out.push_str(&render_object_metadata(
        metadata.get(&sequence.relation.oid),
        &fqn,
        ObjectKind::Sequence,
    ));
    out
}

pub fn print_create_sequence_statements<W: Write>(
    writer: &mut MetadataWriter<W>,
    sequences: &[Sequence],
    family: QueryFamily,
    metadata: &MetadataMap,
) -> Result<()> {
    for sequence in sequences {
        let key = EntryKey::new(
            &sequence.relation.schema,
            &sequence.relation.name,
            ObjectKind::Sequence.keyword(),
        );
        writer.emit(
            Section::Predata,
            key,
            &render_sequence(sequence, family, metadata),
        )?;
    }
    Ok(())
}

/// `ALTER SEQUENCE ... OWNED BY` for every dumped sequence with an owner
/// in the working set. Returns the number of statements written.
pub fn print_alter_sequence_owner_statements<W: Write>(
    writer: &mut MetadataWriter<W>,
    sequences: &[Sequence],
    ownership: &SequenceOwnership,
) -> Result<usize> {
    let mut emitted = 0;
    for sequence in sequences {
        let fqn = sequence.relation.fqn();
        let (Some(table), Some(column)) = (ownership.tables.get(&fqn), ownership.columns.get(&fqn))
        else {
            continue;
        };
        let key = EntryKey::new(&sequence.relation.schema, &sequence.relation.name, "SEQUENCE OWNER")
            .referencing(table.clone());
        writer.emit(
            Section::Predata,
            key,
            &format!("ALTER SEQUENCE {} OWNED BY {};", fqn, column),
        )?;
        emitted += 1;
    }
    Ok(emitted)
}

/// `CREATE VIEW` or `CREATE MATERIALIZED VIEW ... WITH NO DATA`.
pub fn render_view(view: &ViewDefinition, metadata: &MetadataMap) -> String {
    let fqn = view.fqn();
    let body = view.definition.as_deref().unwrap_or_default().trim();
    let with = if view.options.is_empty() {
        String::new()
    } else {
        format!(" WITH ({})", view.options)
    };

    let (mut out, kind) = if view.is_materialized {
        let mut s = format!("CREATE MATERIALIZED VIEW {}{}", fqn, with);
        if !view.tablespace.is_empty() {
            s.push_str(&format!(" TABLESPACE {}", view.tablespace));
        }
        s.push_str(&format!(
            " AS {}\nWITH NO DATA;",
            body.trim_end_matches(';')
        ));
        (s, ObjectKind::MaterializedView)
    } else {
        let mut s = format!("CREATE VIEW {}{} AS {}", fqn, with, body);
        if !body.ends_with(';') {
            s.push(';');
        }
        (s, ObjectKind::View)
    };
    out.push_str(&render_object_metadata(metadata.get(&view.oid), &fqn, kind));
    out
}

pub fn print_create_view_statements<W: Write>(
    writer: &mut MetadataWriter<W>,
    views: &[ViewDefinition],
    metadata: &MetadataMap,
) -> Result<()> {
    for view in views {
        let object_type = if view.is_materialized {
            ObjectKind::MaterializedView.keyword()
        } else {
            ObjectKind::View.keyword()
        };
        let key = EntryKey::new(&view.schema, &view.name, object_type);
        writer.emit(Section::Predata, key, &render_view(view, metadata))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::metadata::ObjectMetadata;
    use crate::catalog::model::SequenceDefinition;

    fn column(name: &str, type_name: &str) -> ColumnDefinition {
        ColumnDefinition {
            oid: 1,
            name: name.into(),
            type_name: type_name.into(),
            ..Default::default()
        }
    }

    fn table() -> TableDefinition {
        TableDefinition {
            columns: vec![column("i", "integer"), column("j", "character varying(20)")],
            distribution_policy: "DISTRIBUTED BY (i)".into(),
            ..Default::default()
        }
    }

    #[test]
    fn test_column_definitions() {
        let mut columns = vec![column("id", "bigint"), column("created", "timestamp")];
        columns[0].not_null = true;
        columns[1].default_value = Some("now()".into());
        assert_eq!(
            render_column_definitions(&columns),
            "\tid bigint NOT NULL,\n\tcreated timestamp DEFAULT now()\n"
        );
        assert_eq!(render_column_definitions(&[]), "");
    }

    #[test]
    fn test_plain_table() {
        let relation = Relation::new(1, "public", "tablename");
        assert_eq!(
            render_table(&relation, &table(), &MetadataMap::new()),
            "CREATE TABLE public.tablename (\n\ti integer,\n\tj character varying(20)\n) DISTRIBUTED BY (i);"
        );
    }

    #[test]
    fn test_table_clause_order() {
        let relation = Relation::new(1, "public", "child");
        let mut def = table();
        def.inherits = vec!["public.b".into(), "public.a".into()];
        def.storage.storage_options = "appendonly=true, compresslevel=5".into();
        def.storage.tablespace = "fastspace".into();
        def.storage.partition_def = "PARTITION BY RANGE(i) (START (1) END (10) EVERY (5))".into();
        assert_eq!(
            render_table(&relation, &def, &MetadataMap::new()),
            "CREATE TABLE public.child (\n\ti integer,\n\tj character varying(20)\n) \
             INHERITS (public.b, public.a) WITH (appendonly=true, compresslevel=5) TABLESPACE fastspace \
             DISTRIBUTED BY (i) PARTITION BY RANGE(i) (START (1) END (10) EVERY (5));"
        );
    }

    #[test]
    fn test_attached_partition_and_metadata() {
        let relation = Relation::new(7, "public", "sales_2024");
        let mut def = table();
        def.attach_to = Some("public.sales".into());
        def.storage.partition_bound = "FOR VALUES FROM (2024) TO (2025)".into();
        let metadata: MetadataMap = [(7, ObjectMetadata::with_comment("2024"))].into();
        let out = render_table(&relation, &def, &metadata);
        assert!(out.ends_with(
            ";\n\nALTER TABLE public.sales ATTACH PARTITION public.sales_2024 FOR VALUES FROM (2024) TO (2025);\
             \n\nCOMMENT ON TABLE public.sales_2024 IS '2024';"
        ));
    }

    #[test]
    fn test_external_leaf_is_exchanged_into_root() {
        let relation = Relation::new(8, "public", "sales_1_prt_east");
        let def = TableDefinition {
            columns: vec![column("i", "integer")],
            external: Some(ExternalTableDefinition {
                oid: 8,
                command: "echo 1".into(),
                exec_location: "PER_HOST".into(),
                format_type: "c".into(),
                encoding: "UTF8".into(),
                ..Default::default()
            }),
            exchange: Some(PartitionExchange {
                root_fqn: "public.sales".into(),
                path: vec![],
                partition: "east".into(),
            }),
            ..Default::default()
        };
        assert_eq!(def.kind(), ObjectKind::ExternalTable);
        assert_eq!(
            render_table(&relation, &def, &MetadataMap::new()),
            "CREATE READABLE EXTERNAL WEB TABLE public.sales_1_prt_east_ext_part_ (\n\ti integer\n) \
             EXECUTE 'echo 1' ON HOST\nFORMAT 'csv'\nENCODING 'UTF8';\
             \n\nALTER TABLE public.sales EXCHANGE PARTITION east \
             WITH TABLE public.sales_1_prt_east_ext_part_ WITHOUT VALIDATION;\
             \n\nDROP TABLE public.sales_1_prt_east_ext_part_;"
        );
    }

    #[test]
    fn test_nested_external_leaf_descends_through_parents() {
        let relation = Relation::new(9, "public", "sales_1_prt_2_2_prt_east");
        let def = TableDefinition {
            external: Some(ExternalTableDefinition {
                command: "echo 1".into(),
                format_type: "t".into(),
                encoding: "UTF8".into(),
                ..Default::default()
            }),
            exchange: Some(PartitionExchange {
                root_fqn: "public.sales".into(),
                path: vec!["FOR (RANK(2))".into()],
                partition: "east".into(),
            }),
            ..Default::default()
        };
        assert!(render_table(&relation, &def, &MetadataMap::new()).contains(
            "\n\nALTER TABLE public.sales ALTER PARTITION FOR (RANK(2)) EXCHANGE PARTITION east \
             WITH TABLE public.sales_1_prt_2_2_prt_east_ext_part_ WITHOUT VALIDATION;"
        ));
    }

    #[test]
    fn test_foreign_table() {
        let relation = Relation::new(1, "public", "remote");
        let def = TableDefinition {
            columns: vec![column("i", "integer")],
            foreign: Some(ForeignTableDefinition {
                oid: 1,
                server: "sv".into(),
                options: "delimiter ','".into(),
            }),
            ..Default::default()
        };
        assert_eq!(def.kind(), ObjectKind::ForeignTable);
        assert_eq!(
            render_table(&relation, &def, &MetadataMap::new()),
            "CREATE FOREIGN TABLE public.remote (\n\ti integer\n) SERVER sv OPTIONS (delimiter ',');"
        );
    }

    fn sequence() -> Sequence {
        Sequence {
            relation: Relation::new(5, "public", "seq_name"),
            definition: SequenceDefinition {
                last_value: 7,
                start_value: 1,
                increment: 1,
                max_value: i64::MAX,
                min_value: 1,
                cache_value: 5,
                is_cycled: false,
                is_called: true,
            },
        }
    }

    #[test]
    fn test_sequence_defaults() {
        assert_eq!(
            render_sequence(&sequence(), QueryFamily::V6, &MetadataMap::new()),
            "CREATE SEQUENCE public.seq_name\n\tSTART WITH 1\n\tINCREMENT BY 1\n\tNO MAXVALUE\n\tNO MINVALUE\n\tCACHE 5;\
             \n\nSELECT pg_catalog.setval('public.seq_name', 7, true);"
        );
    }

    #[test]
    fn test_descending_cycled_sequence_without_start() {
        let mut seq = sequence();
        seq.definition.increment = -2;
        seq.definition.max_value = -1;
        seq.definition.min_value = -100;
        seq.definition.is_cycled = true;
        seq.definition.is_called = false;
        assert_eq!(
            render_sequence(&seq, QueryFamily::Pre6, &MetadataMap::new()),
            "CREATE SEQUENCE public.seq_name\n\tINCREMENT BY -2\n\tNO MAXVALUE\n\tMINVALUE -100\n\tCACHE 5\n\tCYCLE;\
             \n\nSELECT pg_catalog.setval('public.seq_name', 7, false);"
        );
    }

    #[test]
    fn test_descending_minimum_default_depends_on_family() {
        let mut seq = sequence();
        seq.definition.increment = -1;
        seq.definition.max_value = -1;

        seq.definition.min_value = -i64::MAX;
        let v6 = render_sequence(&seq, QueryFamily::V6, &MetadataMap::new());
        assert!(v6.contains("\n\tNO MINVALUE\n"));
        let v7 = render_sequence(&seq, QueryFamily::V7Plus, &MetadataMap::new());
        assert!(v7.contains("\n\tMINVALUE -9223372036854775807\n"));

        seq.definition.min_value = i64::MIN;
        let v7 = render_sequence(&seq, QueryFamily::V7Plus, &MetadataMap::new());
        assert!(v7.contains("\n\tNO MINVALUE\n"));
    }

    #[test]
    fn test_sequence_owner_entries_follow_ownership() {
        let mut ownership = SequenceOwnership::default();
        ownership.tables.insert("public.seq_name".into(), "public.orders".into());
        ownership.columns.insert("public.seq_name".into(), "public.orders.id".into());
        let other = Sequence {
            relation: Relation::new(6, "public", "ownerless"),
            definition: SequenceDefinition::default(),
        };

        let mut writer = MetadataWriter::new(Vec::new());
        let n = print_alter_sequence_owner_statements(&mut writer, &[sequence(), other], &ownership)
            .unwrap();
        assert_eq!(n, 1);
        let (bytes, toc) = writer.finish().unwrap();
        assert_eq!(bytes, b"ALTER SEQUENCE public.seq_name OWNED BY public.orders.id;");
        assert_eq!(toc.predata_entries[0].object_type, "SEQUENCE OWNER");
        assert_eq!(toc.predata_entries[0].reference_object, "public.orders");
    }

    #[test]
    fn test_views() {
        let view = ViewDefinition {
            oid: 3,
            schema: "public".into(),
            name: "v".into(),
            options: "security_barrier=true".into(),
            definition: Some(" SELECT 1;".into()),
            ..Default::default()
        };
        assert_eq!(
            render_view(&view, &MetadataMap::new()),
            "CREATE VIEW public.v WITH (security_barrier=true) AS SELECT 1;"
        );

        let matview = ViewDefinition {
            options: String::new(),
            tablespace: "fastspace".into(),
            is_materialized: true,
            ..view
        };
        assert_eq!(
            render_view(&matview, &MetadataMap::new()),
            "CREATE MATERIALIZED VIEW public.v TABLESPACE fastspace AS SELECT 1\nWITH NO DATA;"
        );
    }
}
