//! Indexes, rules, triggers and event triggers.

use std::io::Write;

use super::metadata::{render_object_metadata, ObjectKind};
use super::toc::Section;
use super::writer::{EntryKey, MetadataWriter};
use crate::catalog::metadata::MetadataMap;
use crate::catalog::model::{EventTrigger, IndexDefinition, TableObjectDefinition};
use crate::catalog::version::QueryFamily;
use crate::error::Result;

/// `CREATE INDEX` plus tablespace, attachment, clustering and replica
/// identity, then metadata.
pub fn render_index(index: &IndexDefinition, metadata: &MetadataMap) -> String {
    let mut out = format!("{};", index.def.as_deref().unwrap_or_default());
    if !index.tablespace.is_empty() {
        out.push_str(&format!(
            "\nALTER INDEX {} SET TABLESPACE {};",
            index.name, index.tablespace
        ));
    }
    if let Some(parent) = &index.parent_index_fqn {
        out.push_str(&format!("\nALTER INDEX {} ATTACH PARTITION {};", parent, index.fqn()));
    }
    if index.is_clustered {
        out.push_str(&format!("\nALTER TABLE {} CLUSTER ON {};", index.table_fqn(), index.name));
    }
    if index.is_replica_identity {
        out.push_str(&format!(
            "\nALTER TABLE {} REPLICA IDENTITY USING INDEX {};",
            index.table_fqn(),
            index.name
        ));
    }
    out.push_str(&render_object_metadata(
        metadata.get(&index.oid),
        &index.name,
        ObjectKind::Index,
    ));
    out
}

/// Emit every index that is not backing a constraint.
pub fn print_create_index_statements<W: Write>(
    writer: &mut MetadataWriter<W>,
    indexes: &[IndexDefinition],
    metadata: &MetadataMap,
) -> Result<()> {
    for index in indexes.iter().filter(|i| !i.supports_constraint) {
        let key = EntryKey::new(&index.owning_schema, &index.name, ObjectKind::Index.keyword())
            .referencing(index.table_fqn());
        writer.emit(Section::Postdata, key, &render_index(index, metadata))?;
    }
    Ok(())
}

/// `CREATE RULE` (already terminated by the server) plus metadata.
pub fn render_rule(rule: &TableObjectDefinition, metadata: &MetadataMap) -> String {
    let def = rule.def.as_deref().unwrap_or_default();
    let mut out = def.to_string();
    if !def.ends_with(';') {
        out.push(';');
    }
    out.push_str(&render_object_metadata(
        metadata.get(&rule.oid),
        &format!("{} ON {}", rule.name, rule.table_fqn()),
        ObjectKind::Rule,
    ));
    out
}

pub fn print_create_rule_statements<W: Write>(
    writer: &mut MetadataWriter<W>,
    rules: &[TableObjectDefinition],
    metadata: &MetadataMap,
) -> Result<()> {
    for rule in rules {
        let key = EntryKey::new(&rule.owning_schema, &rule.name, ObjectKind::Rule.keyword())
            .referencing(rule.table_fqn());
        writer.emit(Section::Postdata, key, &render_rule(rule, metadata))?;
    }
    Ok(())
}

/// `CREATE TRIGGER` plus metadata.
pub fn render_trigger(trigger: &TableObjectDefinition, metadata: &MetadataMap) -> String {
    let mut out = format!("{};", trigger.def.as_deref().unwrap_or_default());
    out.push_str(&render_object_metadata(
        metadata.get(&trigger.oid),
        &format!("{} ON {}", trigger.name, trigger.table_fqn()),
        ObjectKind::Trigger,
    ));
    out
}

pub fn print_create_trigger_statements<W: Write>(
    writer: &mut MetadataWriter<W>,
    triggers: &[TableObjectDefinition],
    metadata: &MetadataMap,
) -> Result<()> {
    for trigger in triggers {
        let key = EntryKey::new(
            &trigger.owning_schema,
            &trigger.name,
            ObjectKind::Trigger.keyword(),
        )
        .referencing(trigger.table_fqn());
        writer.emit(Section::Postdata, key, &render_trigger(trigger, metadata))?;
    }
    Ok(())
}

/// `CREATE EVENT TRIGGER`, an enable-state change when needed, then metadata.
pub fn render_event_trigger(
    trigger: &EventTrigger,
    family: QueryFamily,
    metadata: &MetadataMap,
) -> String {
    let mut out = format!("CREATE EVENT TRIGGER {}\nON {}", trigger.name, trigger.event);
    if !trigger.event_tags.is_empty() {
        out.push_str(&format!("\nWHEN TAG IN ({})", trigger.event_tags));
    }
    let execute = match family {
        QueryFamily::V7Plus => "FUNCTION",
        _ => "PROCEDURE",
    };
    out.push_str(&format!("\nEXECUTE {} {}();", execute, trigger.function_name));

    let state = match trigger.enabled.as_str() {
        "D" => Some("DISABLE"),
        "R" => Some("ENABLE REPLICA"),
        "A" => Some("ENABLE ALWAYS"),
        _ => None,
    };
    if let Some(state) = state {
        out.push_str(&format!("\nALTER EVENT TRIGGER {} {};", trigger.name, state));
    }
    out.push_str(&render_object_metadata(
        metadata.get(&trigger.oid),
        &trigger.name,
        ObjectKind::EventTrigger,
    ));
    out
}

pub fn print_create_event_trigger_statements<W: Write>(
    writer: &mut MetadataWriter<W>,
    triggers: &[EventTrigger],
    family: QueryFamily,
    metadata: &MetadataMap,
) -> Result<()> {
    for trigger in triggers {
        let key = EntryKey::new("", &trigger.name, ObjectKind::EventTrigger.keyword());
        writer.emit(
            Section::Postdata,
            key,
            &render_event_trigger(trigger, family, metadata),
        )?;
    }
    Ok(())
}
