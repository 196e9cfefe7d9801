//! External tables and custom protocols.

use std::collections::HashMap;
use std::io::Write;

use super::metadata::{render_object_metadata, ObjectKind};
use super::predata::render_column_definitions;
use super::toc::Section;
use super::writer::{EntryKey, MetadataWriter};
use crate::catalog::metadata::MetadataMap;
use crate::catalog::model::{
    ColumnDefinition, ExternalTableDefinition, FunctionInfo, ProtocolDefinition, Relation,
};
use crate::catalog::row::Oid;
use crate::classify::external::{classify_external_table, ExternalProtocol, ExternalTableType};
use crate::error::Result;

/// Full `CREATE ... EXTERNAL TABLE` statement.
pub fn render_external_table(
    relation: &Relation,
    columns: &[ColumnDefinition],
    ext: &ExternalTableDefinition,
    distribution_policy: &str,
) -> String {
    let (table_type, protocol) = classify_external_table(ext);
    let mut out = format!(
        "CREATE {} TABLE {} (\n{}) ",
        table_type.keyword(),
        relation.fqn(),
        render_column_definitions(columns)
    );
    out.push_str(&render_external_clauses(ext, table_type, &protocol));
    if ext.writable && !distribution_policy.is_empty() {
        out.push('\n');
        out.push_str(distribution_policy);
    }
    out.push(';');
    out
}

/// Everything between the column list and the distribution policy.
fn render_external_clauses(
    ext: &ExternalTableDefinition,
    table_type: ExternalTableType,
    protocol: &ExternalProtocol,
) -> String {
    let mut out = String::new();

    if table_type != ExternalTableType::WritableWeb && !ext.uris.is_empty() {
        out.push_str(&format!("LOCATION (\n\t'{}'\n)", ext.uris.join("',\n\t'")));
    }
    let on_master_allowed = table_type == ExternalTableType::Readable
        || (table_type == ExternalTableType::WritableWeb && *protocol == ExternalProtocol::S3);
    if on_master_allowed && ext.exec_location == "MASTER_ONLY" {
        out.push_str(" ON MASTER");
    }
    if table_type.is_web() && !ext.command.is_empty() {
        out.push_str(&format!("EXECUTE '{}'", ext.command.replace('\'', "''")));
        out.push_str(&execute_location(&ext.exec_location));
    }
    out.push('\n');

    let format_type = match ext.format_type.as_str() {
        "a" => "avro",
        "b" => "custom",
        "c" => "csv",
        "p" => "parquet",
        "t" => "text",
        _ => "",
    };
    out.push_str(&format!("FORMAT '{}'", format_type));
    // Stored as "formatter 'fn'", but FORMAT expects "formatter='fn'".
    let format_opts = ext.format_opts.replacen("formatter ", "formatter=", 1);
    let format_opts = format_opts.trim();
    if !format_opts.is_empty() {
        out.push_str(&format!(" ({})", format_opts));
    }
    out.push('\n');

    if !ext.options.is_empty() {
        out.push_str(&format!("OPTIONS (\n\t{}\n)\n", ext.options));
    }
    out.push_str(&format!("ENCODING '{}'", ext.encoding));

    if table_type.is_readable() {
        if ext.log_errors {
            out.push_str("\nLOG ERRORS");
        }
        if ext.reject_limit != 0 {
            out.push_str(&format!("\nSEGMENT REJECT LIMIT {} ", ext.reject_limit));
            match ext.reject_limit_type.as_str() {
                "r" => out.push_str("ROWS"),
                "p" => out.push_str("PERCENT"),
                _ => {}
            }
        }
    }
    out
}

/// `ON ...` suffix for an EXECUTE table, from `TYPE[:value]`.
fn execute_location(exec_location: &str) -> String {
    let mut parts = exec_location.splitn(2, ':');
    let kind = parts.next().unwrap_or_default();
    let value = parts.next().unwrap_or_default();
    match kind {
        "HOST" => format!(" ON HOST '{}'", value),
        "MASTER_ONLY" => " ON MASTER".to_string(),
        "PER_HOST" => " ON HOST".to_string(),
        "SEGMENT_ID" => format!(" ON SEGMENT {}", value),
        "TOTAL_SEGS" => format!(" ON {}", value),
        _ => String::new(),
    }
}

/// Whether any of a protocol's functions is user-defined.
fn has_user_defined_function(
    protocol: &ProtocolDefinition,
    functions: &HashMap<Oid, FunctionInfo>,
) -> bool {
    [protocol.read_function, protocol.write_function, protocol.validator]
        .iter()
        .filter_map(|oid| functions.get(oid))
        .any(|f| !f.is_internal)
}

/// `CREATE PROTOCOL` plus metadata. None for protocols built only from
/// internal functions, which the server provides itself.
pub fn render_protocol(
    protocol: &ProtocolDefinition,
    functions: &HashMap<Oid, FunctionInfo>,
    metadata: &MetadataMap,
) -> Option<String> {
    if !has_user_defined_function(protocol, functions) {
        return None;
    }

    let name_of = |oid: Oid| {
        functions
            .get(&oid)
            .map(|f| f.qualified_name.as_str())
            .unwrap_or_default()
    };
    let mut clauses = Vec::new();
    if protocol.read_function != 0 {
        clauses.push(format!("readfunc = {}", name_of(protocol.read_function)));
    }
    if protocol.write_function != 0 {
        clauses.push(format!("writefunc = {}", name_of(protocol.write_function)));
    }
    if protocol.validator != 0 {
        clauses.push(format!("validatorfunc = {}", name_of(protocol.validator)));
    }

    let mut out = String::from("CREATE ");
    if protocol.trusted {
        out.push_str("TRUSTED ");
    }
    out.push_str(&format!("PROTOCOL {} ({});", protocol.name, clauses.join(", ")));
    out.push_str(&render_object_metadata(
        metadata.get(&protocol.oid),
        &protocol.name,
        ObjectKind::Protocol,
    ));
    Some(out)
}

pub fn print_create_external_protocol_statements<W: Write>(
    writer: &mut MetadataWriter<W>,
    protocols: &[ProtocolDefinition],
    functions: &HashMap<Oid, FunctionInfo>,
    metadata: &MetadataMap,
) -> Result<usize> {
    let mut emitted = 0;
    for protocol in protocols {
        if let Some(text) = render_protocol(protocol, functions, metadata) {
            let key = EntryKey::new("", &protocol.name, ObjectKind::Protocol.keyword());
            writer.emit(Section::Predata, key, &text)?;
            emitted += 1;
        }
    }
    Ok(emitted)
}
