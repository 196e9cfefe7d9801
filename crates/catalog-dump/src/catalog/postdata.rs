//! Post-data object classes: indexes, rules, triggers and event triggers.

use std::collections::BTreeSet;

use tracing::{debug, warn};

use super::client::{select, CatalogClient};
use super::filter::ObjectFilter;
use super::model::{
    EventTrigger, IndexDefinition, RuleDefinition, TableObjectDefinition, TriggerDefinition,
};
use super::strategy::{CatalogQueries, QueryStrategy};
use super::version::QueryFamily;
use crate::classify::implicit_index::{implicit_index_names, ConstraintColumn};
use crate::error::Result;
use crate::resolve::sort_partition_indexes;

/// Names of indexes the engine creates implicitly for unique constraints.
///
/// Only legacy engines report these as ordinary indexes; newer families
/// return an empty set.
pub async fn get_implicit_index_names<C>(
    client: &C,
    strategy: &QueryStrategy,
) -> Result<BTreeSet<String>>
where
    C: CatalogClient + ?Sized,
{
    let Some(sql) = strategy.unique_constraint_columns() else {
        return Ok(BTreeSet::new());
    };
    let columns: Vec<ConstraintColumn> = select(client, "unique constraints", &sql).await?;
    Ok(implicit_index_names(&columns))
}

/// Indexes to recreate, ordered by name or, on 7+, parent index first.
pub async fn get_indexes<C>(
    client: &C,
    strategy: &QueryStrategy,
    filter: &dyn ObjectFilter,
) -> Result<Vec<IndexDefinition>>
where
    C: CatalogClient + ?Sized,
{
    let implicit = get_implicit_index_names(client, strategy).await?;
    let rows: Vec<IndexDefinition> =
        select(client, "indexes", &strategy.indexes(filter, &implicit)).await?;

    let indexes: Vec<IndexDefinition> = rows
        .into_iter()
        .filter(|index| {
            if index.def.is_none() {
                warn!(
                    "Index '{}' on table '{}.{}' not backed up, most likely dropped after the dump had begun",
                    index.name, index.owning_schema, index.owning_table
                );
                return false;
            }
            true
        })
        .collect();

    let indexes = if strategy.family() == QueryFamily::V7Plus {
        sort_partition_indexes(indexes)
    } else {
        indexes
    };
    debug!("Found {} indexes", indexes.len());
    Ok(indexes)
}

/// User-defined rules.
pub async fn get_rules<C>(
    client: &C,
    strategy: &QueryStrategy,
    filter: &dyn ObjectFilter,
) -> Result<Vec<RuleDefinition>>
where
    C: CatalogClient + ?Sized,
{
    let rows: Vec<RuleDefinition> = select(client, "rules", &strategy.rules(filter)).await?;
    Ok(drop_stale(rows, "Rule"))
}

/// User-defined triggers, constraint triggers excluded.
pub async fn get_triggers<C>(
    client: &C,
    strategy: &QueryStrategy,
    filter: &dyn ObjectFilter,
) -> Result<Vec<TriggerDefinition>>
where
    C: CatalogClient + ?Sized,
{
    let rows: Vec<TriggerDefinition> =
        select(client, "triggers", &strategy.triggers(filter)).await?;
    Ok(drop_stale(rows, "Trigger"))
}

/// Event triggers. Always empty on engines without them.
pub async fn get_event_triggers<C>(client: &C, strategy: &QueryStrategy) -> Result<Vec<EventTrigger>>
where
    C: CatalogClient + ?Sized,
{
    match strategy.event_triggers() {
        Some(sql) => select(client, "event triggers", &sql).await,
        None => Ok(Vec::new()),
    }
}

fn drop_stale(rows: Vec<TableObjectDefinition>, kind: &str) -> Vec<TableObjectDefinition> {
    rows.into_iter()
        .filter(|object| {
            if object.def.is_none() {
                warn!(
                    "{} '{}' on table '{}.{}' not backed up, most likely dropped after the dump had begun",
                    kind, object.name, object.owning_schema, object.owning_table
                );
                return false;
            }
            true
        })
        .collect()
}
