//! End-to-end rendering through the public API.
//!
//! Each test drives classification, resolution and rendering into an
//! in-memory sink and checks the statement text against the TOC ranges.

use std::collections::HashSet;

use catalog_dump::catalog::model::{
    IndexDefinition, Relation, Sequence, SequenceDefinition, SequenceOwnerRow,
};
use catalog_dump::catalog::{MetadataMap, ObjectMetadata, QueryFamily};
use catalog_dump::classify::{
    determine_external_table_characteristics, ExternalProtocol, ExternalTableType,
};
use catalog_dump::ddl::{print_create_index_statements, MetadataWriter, Section, Toc};
use catalog_dump::resolve::{resolve_sequence_owners, sort_partition_indexes};
use catalog_dump::CatalogSnapshot;

fn test_index(oid: u32, name: &str, parent: u32) -> IndexDefinition {
    IndexDefinition {
        oid,
        name: name.into(),
        owning_schema: "public".into(),
        owning_table: "testtable".into(),
        def: Some(format!("CREATE INDEX {} ON public.testtable USING btree(i)", name)),
        parent_index: parent,
        ..Default::default()
    }
}

fn render_indexes(indexes: &[IndexDefinition], metadata: &MetadataMap) -> (String, Toc) {
    let mut writer = MetadataWriter::new(Vec::new());
    print_create_index_statements(&mut writer, indexes, metadata).unwrap();
    let (bytes, toc) = writer.finish().unwrap();
    (String::from_utf8(bytes).unwrap(), toc)
}

#[test]
fn test_single_index_output_and_entry() {
    let (text, toc) = render_indexes(&[test_index(1, "testindex", 0)], &MetadataMap::new());

    assert_eq!(text, "CREATE INDEX testindex ON public.testtable USING btree(i);");
    let entries = toc.entries(Section::Postdata);
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].schema, "public");
    assert_eq!(entries[0].name, "testindex");
    assert_eq!(entries[0].object_type, "INDEX");
    assert_eq!(entries[0].reference_object, "public.testtable");
    assert_eq!(entries[0].start_byte, 0);
    assert_eq!(entries[0].end_byte, text.len() as u64);
}

#[test]
fn test_index_with_tablespace_and_comment() {
    let mut index = test_index(1, "testindex", 0);
    index.tablespace = "test_tablespace".into();
    let mut metadata = MetadataMap::new();
    metadata.insert(1, ObjectMetadata::with_comment("This is an index comment."));

    let (text, toc) = render_indexes(&[index], &metadata);

    assert_eq!(
        text,
        "CREATE INDEX testindex ON public.testtable USING btree(i);\n\
         ALTER INDEX testindex SET TABLESPACE test_tablespace;\n\n\
         COMMENT ON INDEX testindex IS 'This is an index comment.';"
    );
    assert_eq!(toc.entries(Section::Postdata)[0].end_byte, text.len() as u64);
}

#[test]
fn test_web_table_without_location_uses_http() {
    assert_eq!(
        determine_external_table_characteristics("", false),
        (ExternalTableType::ReadableWeb, ExternalProtocol::Http)
    );
    assert_eq!(
        determine_external_table_characteristics("", true),
        (ExternalTableType::WritableWeb, ExternalProtocol::Http)
    );
}

#[test]
fn test_partition_index_parent_emitted_first() {
    let sorted = sort_partition_indexes(vec![
        test_index(1, "idx_a", 0),
        test_index(2, "idx_b", 1),
        test_index(3, "idx_c", 0),
    ]);
    let (text, toc) = render_indexes(&sorted, &MetadataMap::new());

    let names: Vec<_> = toc
        .entries(Section::Postdata)
        .iter()
        .map(|e| e.name.as_str())
        .collect();
    let position = |name: &str| names.iter().position(|n| *n == name).unwrap();
    assert!(position("idx_a") < position("idx_b"));
    assert!(position("idx_a") < position("idx_c"));

    let child = toc.find("public", "idx_b", "INDEX").unwrap().1;
    let child_text = Toc::slice(text.as_bytes(), child).unwrap();
    assert!(std::str::from_utf8(child_text)
        .unwrap()
        .ends_with("\nALTER INDEX public.idx_a ATTACH PARTITION public.idx_b;"));
}

#[test]
fn test_sequence_with_excluded_owner_is_still_dumped() {
    let rows = vec![SequenceOwnerRow {
        sequence_schema: "public".into(),
        sequence_name: "staging_id_seq".into(),
        table_oid: 11,
        table_schema: "public".into(),
        table_name: "staging".into(),
        column_name: "id".into(),
    }];
    let working_set: HashSet<u32> = [10].into_iter().collect();
    let ownership = resolve_sequence_owners(&rows, &working_set);
    assert!(ownership.is_empty());

    let snapshot = CatalogSnapshot {
        sequences: vec![Sequence {
            relation: Relation::new(20, "public", "staging_id_seq"),
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
        }],
        sequence_ownership: ownership,
        ..Default::default()
    };
    let mut writer = MetadataWriter::new(Vec::new());
    let counts = snapshot.render(&mut writer, QueryFamily::V7Plus).unwrap();
    let (bytes, toc) = writer.finish().unwrap();

    assert_eq!(counts.sequences, 1);
    assert_eq!(counts.sequence_owners, 0);
    let entries = toc.entries(Section::Predata);
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].object_type, "SEQUENCE");
    let text = String::from_utf8(bytes).unwrap();
    assert!(text.starts_with("CREATE SEQUENCE public.staging_id_seq\n\tSTART WITH 1\n"));
    assert!(!text.contains("OWNED BY"));
}
