use anyhow::{Context, Result};
use chrono::Utc;
use sqlx::{Pool, Sqlite};

use crate::models::*;

use super::row_helpers::map_device_row;

const SELECT_DEVICE: &str = r#"
    SELECT id, name, site_id, status, created_at, updated_at
    FROM devices
"#;

/// Device database operations
pub struct DeviceRepo;

impl DeviceRepo {
    pub async fn list(pool: &Pool<Sqlite>) -> Result<Vec<Device>> {
        let rows = sqlx::query(&format!("{} ORDER BY name", SELECT_DEVICE))
            .fetch_all(pool)
            .await?;

        Ok(rows.iter().map(map_device_row).collect())
    }

    pub async fn get(pool: &Pool<Sqlite>, id: i64) -> Result<Option<Device>> {
        let row = sqlx::query(&format!("{} WHERE id = ?", SELECT_DEVICE))
            .bind(id)
            .fetch_optional(pool)
            .await?;

        Ok(row.as_ref().map(map_device_row))
    }

    pub async fn count(pool: &Pool<Sqlite>) -> Result<i64> {
        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM devices")
            .fetch_one(pool)
            .await?;
        Ok(count.0)
    }

    pub async fn create(pool: &Pool<Sqlite>, name: &str, site_id: Option<i64>) -> Result<Device> {
        let now = Utc::now();
        let result = sqlx::query(
            r#"
            INSERT INTO devices (name, site_id, status, created_at, updated_at)
            VALUES (?, ?, 'active', ?, ?)
            "#,
        )
        .bind(name)
        .bind(site_id)
        .bind(now)
        .bind(now)
        .execute(pool)
        .await
        .context("Failed to create device")?;

        Self::get(pool, result.last_insert_rowid())
            .await?
            .context("Device not found after creation")
    }
}
