//! Catalog connection seam.
//!
//! [`CatalogClient`] is the only thing the query layer needs from a database
//! connection: run a read-only statement and hand back rows. The production
//! implementation holds one pooled connection inside a single repeatable-read
//! transaction so every object class is read from the same catalog snapshot.

use async_trait::async_trait;
use deadpool_postgres::{Manager, ManagerConfig, Object, Pool, RecyclingMethod};
use tokio_postgres::Config as PgConfig;
use tracing::{debug, info, warn};

use super::row::{CatalogRow, FromCatalogRow};
use super::tls::TlsBuilder;
use crate::config::ConnectionConfig;
use crate::error::{DumpError, Result};

/// Read-only access to a database catalog.
#[async_trait]
pub trait CatalogClient: Send + Sync {
    /// Run a catalog query and return every row.
    async fn query(&self, sql: &str) -> Result<Vec<CatalogRow>>;

    /// The server's `version()` string.
    async fn server_version(&self) -> Result<String> {
        let rows = self.query("SELECT version() AS version").await?;
        rows.first()
            .ok_or_else(|| DumpError::Version("SELECT version() returned no rows".into()))?
            .text("version")
    }
}

/// Run `sql` and decode every row as `T`.
///
/// Any failure is fatal for the run and is reported against `object_class`.
pub async fn select<T, C>(client: &C, object_class: &str, sql: &str) -> Result<Vec<T>>
where
    T: FromCatalogRow,
    C: CatalogClient + ?Sized,
{
    debug!("Querying {}", object_class);
    let rows = client
        .query(sql)
        .await
        .map_err(|e| DumpError::query(object_class, e))?;
    rows.iter()
        .map(T::from_row)
        .collect::<Result<Vec<T>>>()
        .map_err(|e| DumpError::query(object_class, e))
}

/// PostgreSQL/Greenplum catalog client backed by deadpool-postgres.
pub struct PgCatalogClient {
    pool: Pool,
    conn: Object,
}

impl PgCatalogClient {
    /// Connect and open the snapshot transaction.
    pub async fn connect(config: &ConnectionConfig) -> Result<Self> {
        let mut pg_config = PgConfig::new();
        pg_config.host(&config.host);
        pg_config.port(config.port);
        pg_config.dbname(&config.database);
        pg_config.user(&config.user);
        pg_config.password(&config.password);
        pg_config.application_name("catalog-dump");

        let mgr_config = ManagerConfig {
            recycling_method: RecyclingMethod::Fast,
        };

        let pool = match TlsBuilder::parse(&config.ssl_mode)?.build()? {
            Some(tls) => {
                let mgr = Manager::from_config(pg_config, tls, mgr_config);
                Pool::builder(mgr)
                    .max_size(config.max_connections)
                    .build()
                    .map_err(|e| DumpError::pool(e, "creating catalog pool"))?
            }
            None => {
                warn!("TLS is disabled for the catalog connection.");
                let mgr = Manager::from_config(pg_config, tokio_postgres::NoTls, mgr_config);
                Pool::builder(mgr)
                    .max_size(config.max_connections)
                    .build()
                    .map_err(|e| DumpError::pool(e, "creating catalog pool"))?
            }
        };

        let conn = pool
            .get()
            .await
            .map_err(|e| DumpError::pool(e, "opening catalog connection"))?;
        conn.batch_execute("BEGIN ISOLATION LEVEL REPEATABLE READ READ ONLY")
            .await?;

        info!(
            "Connected to catalog: {}:{}/{}",
            config.host, config.port, config.database
        );

        Ok(Self { pool, conn })
    }

    /// End the snapshot transaction and close the pool.
    pub async fn close(self) -> Result<()> {
        self.conn.batch_execute("COMMIT").await?;
        drop(self.conn);
        self.pool.close();
        Ok(())
    }
}

#[async_trait]
impl CatalogClient for PgCatalogClient {
    async fn query(&self, sql: &str) -> Result<Vec<CatalogRow>> {
        let rows = self.conn.query(sql, &[]).await?;
        rows.iter().map(CatalogRow::from_pg_row).collect()
    }
}
