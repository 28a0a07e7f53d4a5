use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use sqlx::{Pool, Sqlite, SqliteConnection};

use crate::models::*;

use super::row_helpers::map_interface_row;
use super::vlans::VlanRepo;

const SELECT_INTERFACE: &str = r#"
    SELECT i.id, i.device_id, d.name AS device_name, d.site_id AS site_id,
           i.name, i.description, i.mode, i.updated_at,
           v.id AS uv_id, v.vid AS uv_vid, v.name AS uv_name,
           v.group_id AS uv_group_id, v.site_id AS uv_site_id
    FROM interfaces i
    JOIN devices d ON d.id = i.device_id
    LEFT JOIN vlans v ON v.id = i.untagged_vlan_id
"#;

/// Interface database operations
pub struct InterfaceRepo;

impl InterfaceRepo {
    pub async fn get(pool: &Pool<Sqlite>, id: i64) -> Result<Option<InterfaceRecord>> {
        let row = sqlx::query(&format!("{} WHERE i.id = ?", SELECT_INTERFACE))
            .bind(id)
            .fetch_optional(pool)
            .await?;

        match row.as_ref().map(map_interface_row) {
            Some(mut iface) => {
                iface.tagged_vlans = VlanRepo::list_tagged(pool, id).await?;
                Ok(Some(iface))
            }
            None => Ok(None),
        }
    }

    pub async fn list_by_device(pool: &Pool<Sqlite>, device_id: i64) -> Result<Vec<InterfaceRecord>> {
        let rows = sqlx::query(&format!("{} WHERE i.device_id = ? ORDER BY i.id", SELECT_INTERFACE))
            .bind(device_id)
            .fetch_all(pool)
            .await?;

        let mut interfaces: Vec<InterfaceRecord> = rows.iter().map(map_interface_row).collect();
        for iface in &mut interfaces {
            if let Some(id) = iface.id {
                iface.tagged_vlans = VlanRepo::list_tagged(pool, id).await?;
            }
        }
        Ok(interfaces)
    }

    pub async fn create(pool: &Pool<Sqlite>, device_id: i64, name: &str) -> Result<i64> {
        let now = Utc::now();
        let result = sqlx::query(
            "INSERT INTO interfaces (device_id, name, created_at, updated_at) VALUES (?, ?, ?, ?)",
        )
        .bind(device_id)
        .bind(name)
        .bind(now)
        .bind(now)
        .execute(pool)
        .await
        .context("Failed to create interface")?;
        Ok(result.last_insert_rowid())
    }

    /// Write description, mode and untagged VLAN of an existing interface
    pub async fn update_fields(
        conn: &mut SqliteConnection,
        id: i64,
        iface: &InterfaceRecord,
        now: DateTime<Utc>,
    ) -> Result<()> {
        let result = sqlx::query(
            r#"
            UPDATE interfaces
            SET description = ?, mode = ?, untagged_vlan_id = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(&iface.description)
        .bind(iface.mode.map(|m| m.as_str()).unwrap_or_default())
        .bind(iface.untagged_vlan.as_ref().map(|v| v.id))
        .bind(now)
        .bind(id)
        .execute(&mut *conn)
        .await?;

        if result.rows_affected() == 0 {
            return Err(super::NotFoundError::new("interface", &id.to_string()).into());
        }
        Ok(())
    }

    /// Replace the tagged VLAN membership of an interface
    pub async fn replace_tagged(
        conn: &mut SqliteConnection,
        id: i64,
        vlan_ids: &[i64],
        now: DateTime<Utc>,
    ) -> Result<()> {
        sqlx::query("DELETE FROM interface_tagged_vlans WHERE interface_id = ?")
            .bind(id)
            .execute(&mut *conn)
            .await?;

        for vlan_id in vlan_ids {
            sqlx::query("INSERT OR IGNORE INTO interface_tagged_vlans (interface_id, vlan_id) VALUES (?, ?)")
                .bind(id)
                .bind(vlan_id)
                .execute(&mut *conn)
                .await
                .with_context(|| format!("Failed to tag VLAN {} on interface {}", vlan_id, id))?;
        }

        sqlx::query("UPDATE interfaces SET updated_at = ? WHERE id = ?")
            .bind(now)
            .bind(id)
            .execute(&mut *conn)
            .await?;
        Ok(())
    }
}
