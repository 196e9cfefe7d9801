//! External tables, custom protocols and the function lookup they need.

use std::collections::HashMap;

use super::client::{select, CatalogClient};
use super::model::{ExternalTableDefinition, FunctionInfo, ProtocolDefinition};
use super::row::Oid;
use super::strategy::{CatalogQueries, QueryStrategy};
use crate::error::Result;

/// External-table attributes keyed by table oid.
pub async fn get_external_table_definitions<C>(
    client: &C,
    strategy: &QueryStrategy,
) -> Result<HashMap<Oid, ExternalTableDefinition>>
where
    C: CatalogClient + ?Sized,
{
    let rows: Vec<ExternalTableDefinition> =
        select(client, "external tables", &strategy.external_tables()).await?;
    Ok(rows.into_iter().map(|r| (r.oid, r)).collect())
}

/// Custom external protocols, ordered by name.
pub async fn get_external_protocols<C>(
    client: &C,
    strategy: &QueryStrategy,
) -> Result<Vec<ProtocolDefinition>>
where
    C: CatalogClient + ?Sized,
{
    select(client, "external protocols", &strategy.external_protocols()).await
}

/// Every function's qualified name, keyed by oid.
pub async fn get_function_info<C>(
    client: &C,
    strategy: &QueryStrategy,
) -> Result<HashMap<Oid, FunctionInfo>>
where
    C: CatalogClient + ?Sized,
{
    let rows: Vec<FunctionInfo> = select(client, "functions", &strategy.function_info()).await?;
    Ok(rows.into_iter().map(|r| (r.oid, r)).collect())
}
