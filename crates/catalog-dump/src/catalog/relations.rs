//! Tables, partitions, sequences and views.

use std::collections::{HashMap, HashSet};

use tracing::{debug, info, warn};

use super::client::{select, CatalogClient};
use super::filter::ObjectFilter;
use super::model::{
    ColumnDefinition, ForeignTableDefinition, InheritanceLink, OidText, PartitionLink, Relation,
    Sequence, SequenceDefinition, SequenceOwnerRow, TableStorage, ViewDefinition,
};
use super::row::Oid;
use super::strategy::{CatalogQueries, QueryStrategy};
use crate::classify::partition::{classify_partition_levels, PartitionLevelInfo};
use crate::error::Result;
use crate::resolve::{resolve_table_inheritance, select_working_set};

/// Raw partition parent/child edges.
pub async fn get_partition_links<C>(client: &C, strategy: &QueryStrategy) -> Result<Vec<PartitionLink>>
where
    C: CatalogClient + ?Sized,
{
    select(client, "partition links", &strategy.partition_links()).await
}

/// Partition level and root of every partitioned relation.
pub async fn get_partition_table_map<C>(
    client: &C,
    strategy: &QueryStrategy,
) -> Result<HashMap<Oid, PartitionLevelInfo>>
where
    C: CatalogClient + ?Sized,
{
    let links = get_partition_links(client, strategy).await?;
    Ok(classify_partition_levels(&links))
}

/// The table working set: every user table the backup covers.
///
/// `partitions` and `external_oids` come from [`get_partition_table_map`]
/// and the external table definitions; they decide which partition
/// children join their root.
pub async fn get_all_user_tables<C>(
    client: &C,
    strategy: &QueryStrategy,
    filter: &dyn ObjectFilter,
    partitions: &HashMap<Oid, PartitionLevelInfo>,
    external_oids: &HashSet<Oid>,
) -> Result<Vec<Relation>>
where
    C: CatalogClient + ?Sized,
{
    let candidates: Vec<Relation> =
        select(client, "tables", &strategy.user_tables(filter)).await?;
    let total = candidates.len();
    let tables = select_working_set(candidates, partitions, external_oids, filter);
    info!("Selected {} of {} tables", tables.len(), total);
    Ok(tables)
}

/// Columns per table, in attribute order.
pub async fn get_column_definitions<C>(
    client: &C,
    strategy: &QueryStrategy,
    filter: &dyn ObjectFilter,
) -> Result<HashMap<Oid, Vec<ColumnDefinition>>>
where
    C: CatalogClient + ?Sized,
{
    let rows: Vec<ColumnDefinition> = select(client, "columns", &strategy.columns(filter)).await?;
    let mut columns: HashMap<Oid, Vec<ColumnDefinition>> = HashMap::new();
    for column in rows {
        columns.entry(column.oid).or_default().push(column);
    }
    Ok(columns)
}

/// `DISTRIBUTED ...` clause per table.
pub async fn get_distribution_policies<C>(
    client: &C,
    strategy: &QueryStrategy,
) -> Result<HashMap<Oid, String>>
where
    C: CatalogClient + ?Sized,
{
    let rows: Vec<OidText> =
        select(client, "distribution policies", &strategy.distribution_policies()).await?;
    Ok(rows.into_iter().map(|r| (r.oid, r.value)).collect())
}

/// Tablespace, storage options and partition clauses per table.
pub async fn get_table_storage<C>(
    client: &C,
    strategy: &QueryStrategy,
    filter: &dyn ObjectFilter,
) -> Result<HashMap<Oid, TableStorage>>
where
    C: CatalogClient + ?Sized,
{
    let rows: Vec<TableStorage> =
        select(client, "table storage", &strategy.table_storage(filter)).await?;
    Ok(rows.into_iter().map(|r| (r.oid, r)).collect())
}

/// Raw inheritance edges, partition children excluded.
pub async fn get_inheritance_links<C>(
    client: &C,
    strategy: &QueryStrategy,
) -> Result<Vec<InheritanceLink>>
where
    C: CatalogClient + ?Sized,
{
    select(client, "table inheritance", &strategy.table_inheritance()).await
}

/// Direct parents of each working-set table, in inheritance sequence order.
pub async fn get_table_inheritance<C>(
    client: &C,
    strategy: &QueryStrategy,
    working_set: &HashSet<Oid>,
) -> Result<HashMap<Oid, Vec<String>>>
where
    C: CatalogClient + ?Sized,
{
    let links = get_inheritance_links(client, strategy).await?;
    Ok(resolve_table_inheritance(&links, working_set))
}

/// Sequence relations in dumped schemas.
pub async fn get_all_sequence_relations<C>(
    client: &C,
    strategy: &QueryStrategy,
    filter: &dyn ObjectFilter,
) -> Result<Vec<Relation>>
where
    C: CatalogClient + ?Sized,
{
    select(client, "sequences", &strategy.sequences(filter)).await
}

/// Parameters and position of one sequence.
///
/// `None` when the sequence was dropped after enumeration.
pub async fn get_sequence_definition<C>(
    client: &C,
    strategy: &QueryStrategy,
    sequence_fqn: &str,
) -> Result<Option<SequenceDefinition>>
where
    C: CatalogClient + ?Sized,
{
    let rows: Vec<SequenceDefinition> = select(
        client,
        "sequence definition",
        &strategy.sequence_definition(sequence_fqn),
    )
    .await?;
    Ok(rows.into_iter().next())
}

/// Every sequence relation paired with its definition.
pub async fn get_all_sequences<C>(
    client: &C,
    strategy: &QueryStrategy,
    filter: &dyn ObjectFilter,
) -> Result<Vec<Sequence>>
where
    C: CatalogClient + ?Sized,
{
    let relations = get_all_sequence_relations(client, strategy, filter).await?;
    let mut sequences = Vec::with_capacity(relations.len());
    for relation in relations {
        let Some(definition) = get_sequence_definition(client, strategy, &relation.fqn()).await?
        else {
            warn!(
                "Sequence '{}' not backed up, most likely dropped after the dump had begun",
                relation.fqn()
            );
            continue;
        };
        sequences.push(Sequence {
            relation,
            definition,
        });
    }
    debug!("Found {} sequences", sequences.len());
    Ok(sequences)
}

/// Raw sequence ownership edges.
pub async fn get_sequence_owner_rows<C>(
    client: &C,
    strategy: &QueryStrategy,
) -> Result<Vec<SequenceOwnerRow>>
where
    C: CatalogClient + ?Sized,
{
    select(client, "sequence owners", &strategy.sequence_owners()).await
}

/// Views and materialized views, in enumeration order.
pub async fn get_views<C>(
    client: &C,
    strategy: &QueryStrategy,
    filter: &dyn ObjectFilter,
) -> Result<Vec<ViewDefinition>>
where
    C: CatalogClient + ?Sized,
{
    let rows: Vec<ViewDefinition> = select(client, "views", &strategy.views(filter)).await?;
    Ok(rows
        .into_iter()
        .filter(|view| {
            if view.definition.is_none() {
                warn!(
                    "View '{}' not backed up, most likely dropped after the dump had begun",
                    view.fqn()
                );
                return false;
            }
            true
        })
        .collect())
}

/// Foreign-table server bindings. Empty on engines without foreign tables.
pub async fn get_foreign_table_definitions<C>(
    client: &C,
    strategy: &QueryStrategy,
) -> Result<HashMap<Oid, ForeignTableDefinition>>
where
    C: CatalogClient + ?Sized,
{
    let Some(sql) = strategy.foreign_tables() else {
        return Ok(HashMap::new());
    };
    let rows: Vec<ForeignTableDefinition> = select(client, "foreign tables", &sql).await?;
    Ok(rows.into_iter().map(|r| (r.oid, r)).collect())
}
