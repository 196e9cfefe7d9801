//! DDL synthesis and TOC recording.
//!
//! Renderers turn classified, ordered records into statement text. The
//! `print_*` functions hand that text to a [`MetadataWriter`], which writes
//! it to the byte sink and records the object's exact byte range in the
//! [`Toc`].

pub mod externals;
pub mod metadata;
pub mod postdata;
pub mod predata;
pub mod sink;
pub mod toc;
pub mod writer;

pub use externals::{print_create_external_protocol_statements, render_external_table, render_protocol};
pub use metadata::{render_object_metadata, ObjectKind};
pub use postdata::{
    print_create_event_trigger_statements, print_create_index_statements,
    print_create_rule_statements, print_create_trigger_statements, render_event_trigger,
    render_index, render_rule, render_trigger,
};
pub use predata::{
    print_alter_sequence_owner_statements, print_create_sequence_statements,
    print_create_table_statements, print_create_view_statements, render_sequence, render_table,
    render_view, TableDefinition,
};
pub use sink::ByteCountingWriter;
pub use toc::{MetadataEntry, Section, Toc, TocHeader};
pub use writer::{EntryKey, MetadataWriter};
