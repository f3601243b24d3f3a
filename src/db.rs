pub mod structs;
use crate::config::Config;
use crate::features::query::FeatureQuery;
use crate::layers::vector_tile::{TileQuery, TILE_SQL};
use anyhow::{Context, Result};
use async_trait::async_trait;
use sqlx::{postgres::PgPoolOptions, query, query_scalar, Pool, Postgres, Row};
pub use structs::{Column, ColumnKind, FeatureRow, TableName};
use tracing::debug;

pub async fn get_db_connector(config: &Config) -> Result<Pool<Postgres>> {
    PgPoolOptions::new()
        .max_connections(config.db_max_connections)
        .connect(&config.db_url)
        .await
        .context("Failed to connect using provided connection string.")
}

/// Read-only access to the indexed railway tables. Reprojection,
/// simplification, index lookups and MVT encoding all happen behind this
/// seam; callers hand over fully validated queries.
#[async_trait]
pub trait IndexedStore: Send + Sync {
    /// Encoded vector tile for the query. An empty buffer means no feature
    /// matched.
    async fn render_tile(&self, query: &TileQuery) -> Result<Vec<u8>, sqlx::Error>;

    async fn fetch_features(&self, query: &FeatureQuery) -> Result<Vec<FeatureRow>, sqlx::Error>;

    /// Whether every railway table exists.
    async fn data_present(&self) -> Result<bool, sqlx::Error>;
}

/// `IndexedStore` backed by PostGIS. The pool hands each concurrent request
/// its own connection.
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: Pool<Postgres>,
}

impl PgStore {
    pub fn new(pool: Pool<Postgres>) -> Self {
        PgStore { pool }
    }
}

#[async_trait]
impl IndexedStore for PgStore {
    async fn render_tile(&self, tile_query: &TileQuery) -> Result<Vec<u8>, sqlx::Error> {
        let row = tile_query
            .bind_to(query(TILE_SQL.as_str()))
            .fetch_one(&self.pool)
            .await?;

        let mvt_bytes: Option<Vec<u8>> = row.try_get(0)?;
        Ok(mvt_bytes.unwrap_or_default())
    }

    async fn fetch_features(
        &self,
        feature_query: &FeatureQuery,
    ) -> Result<Vec<FeatureRow>, sqlx::Error> {
        let mut builder = feature_query.to_query_builder();
        debug!(sql = builder.sql(), "executing feature query");

        builder
            .build()
            .fetch_all(&self.pool)
            .await?
            .iter()
            .map(|row| FeatureRow::from_pg_row(row, feature_query.columns()))
            .collect()
    }

    async fn data_present(&self) -> Result<bool, sqlx::Error> {
        let expected: Vec<&'static str> = TableName::ALL.iter().map(|t| t.name()).collect();
        let expected_count = expected.len() as i64;
        let found: i64 = query_scalar(
            "select count(*) from information_schema.tables
            where table_schema = current_schema() and table_name = any($1)",
        )
        .bind(expected)
        .fetch_one(&self.pool)
        .await?;

        Ok(found == expected_count)
    }
}
