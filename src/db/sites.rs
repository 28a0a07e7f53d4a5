use anyhow::{Context, Result};
use sqlx::{Pool, Sqlite};

use crate::models::*;

use super::row_helpers::map_site_row;

pub struct SiteRepo;

impl SiteRepo {
    pub async fn list(pool: &Pool<Sqlite>) -> Result<Vec<Site>> {
        let rows = sqlx::query("SELECT id, name, slug FROM sites ORDER BY name")
            .fetch_all(pool)
            .await?;
        Ok(rows.iter().map(map_site_row).collect())
    }

    pub async fn get(pool: &Pool<Sqlite>, id: i64) -> Result<Option<Site>> {
        let row = sqlx::query("SELECT id, name, slug FROM sites WHERE id = ?")
            .bind(id)
            .fetch_optional(pool)
            .await?;
        Ok(row.as_ref().map(map_site_row))
    }

    pub async fn create(pool: &Pool<Sqlite>, name: &str, slug: &str) -> Result<Site> {
        let result = sqlx::query("INSERT INTO sites (name, slug) VALUES (?, ?)")
            .bind(name)
            .bind(slug)
            .execute(pool)
            .await
            .context("Failed to create site")?;

        Self::get(pool, result.last_insert_rowid())
            .await?
            .context("Site not found after creation")
    }
}
