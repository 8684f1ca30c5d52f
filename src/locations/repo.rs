use anyhow::Context;
use async_trait::async_trait;
use sqlx::{types::Json, PgPool};
use uuid::Uuid;

use crate::locations::repo_types::{Location, LocationRow, NewLocation};

#[async_trait]
pub trait LocationRepo: Send + Sync {
    async fn insert(&self, new_location: NewLocation) -> anyhow::Result<Location>;

    /// Newest first. `None` lists every row.
    async fn list_recent(&self, limit: Option<i64>, offset: i64) -> anyhow::Result<Vec<Location>>;
}

pub struct PgLocationRepo {
    db: PgPool,
}

impl PgLocationRepo {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl LocationRepo for PgLocationRepo {
    async fn insert(&self, new_location: NewLocation) -> anyhow::Result<Location> {
        let row = sqlx::query_as::<_, LocationRow>(
            r#"
            INSERT INTO locations (id, created_at, name, locations, raw)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, created_at, name, locations, raw
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(new_location.created_at)
        .bind(new_location.name)
        .bind(Json(new_location.locations))
        .bind(Json(new_location.raw))
        .fetch_one(&self.db)
        .await
        .context("insert location")?;
        Ok(row.into())
    }

    async fn list_recent(&self, limit: Option<i64>, offset: i64) -> anyhow::Result<Vec<Location>> {
        let rows = sqlx::query_as::<_, LocationRow>(
            r#"
            SELECT id, created_at, name, locations, raw
            FROM locations
            ORDER BY created_at DESC
            LIMIT $1 OFFSET $2
            "#,
        )
        // NULL limit means LIMIT ALL.
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.db)
        .await
        .context("list locations")?;
        Ok(rows.into_iter().map(Location::from).collect())
    }
}

#[cfg(test)]
pub use memory::MemoryLocationRepo;
