use anyhow::{Context, Result};
use sqlx::{Pool, QueryBuilder, Sqlite};

use crate::models::*;

use super::row_helpers::{map_vlan_group_row, map_vlan_row};

pub struct VlanGroupRepo;

impl VlanGroupRepo {
    /// List groups, optionally limited to one site (global groups are always included)
    pub async fn list(pool: &Pool<Sqlite>, site_id: Option<i64>) -> Result<Vec<VlanGroup>> {
        let mut query = QueryBuilder::<Sqlite>::new("SELECT id, name, slug, site_id FROM vlan_groups");
        if let Some(site_id) = site_id {
            query.push(" WHERE site_id IS NULL OR site_id = ").push_bind(site_id);
        }
        query.push(" ORDER BY name");

        let rows = query.build().fetch_all(pool).await?;
        Ok(rows.iter().map(map_vlan_group_row).collect())
    }

    pub async fn get(pool: &Pool<Sqlite>, id: i64) -> Result<Option<VlanGroup>> {
        let row = sqlx::query("SELECT id, name, slug, site_id FROM vlan_groups WHERE id = ?")
            .bind(id)
            .fetch_optional(pool)
            .await?;
        Ok(row.as_ref().map(map_vlan_group_row))
    }

    pub async fn create(pool: &Pool<Sqlite>, name: &str, slug: &str, site_id: Option<i64>) -> Result<VlanGroup> {
        let result = sqlx::query("INSERT INTO vlan_groups (name, slug, site_id) VALUES (?, ?, ?)")
            .bind(name)
            .bind(slug)
            .bind(site_id)
            .execute(pool)
            .await
            .context("Failed to create VLAN group")?;

        Self::get(pool, result.last_insert_rowid())
            .await?
            .context("VLAN group not found after creation")
    }
}

pub struct VlanRepo;

impl VlanRepo {
    pub async fn list(pool: &Pool<Sqlite>, scope: &VlanScopeQuery) -> Result<Vec<Vlan>> {
        let mut query = QueryBuilder::<Sqlite>::new("SELECT id, vid, name, group_id, site_id FROM vlans WHERE 1 = 1");
        if let Some(group_id) = scope.group_id {
            query.push(" AND group_id = ").push_bind(group_id);
        }
        if let Some(site_id) = scope.site_id {
            query.push(" AND (site_id IS NULL OR site_id = ").push_bind(site_id).push(")");
        }
        query.push(" ORDER BY vid, id");

        let rows = query.build().fetch_all(pool).await?;
        Ok(rows.iter().map(map_vlan_row).collect())
    }

    pub async fn get(pool: &Pool<Sqlite>, id: i64) -> Result<Option<Vlan>> {
        let row = sqlx::query("SELECT id, vid, name, group_id, site_id FROM vlans WHERE id = ?")
            .bind(id)
            .fetch_optional(pool)
            .await?;
        Ok(row.as_ref().map(map_vlan_row))
    }

    pub async fn list_tagged(pool: &Pool<Sqlite>, interface_id: i64) -> Result<Vec<Vlan>> {
        let rows = sqlx::query(
            r#"
            SELECT v.id, v.vid, v.name, v.group_id, v.site_id
            FROM vlans v
            JOIN interface_tagged_vlans t ON t.vlan_id = v.id
            WHERE t.interface_id = ?
            ORDER BY v.vid, v.id
            "#,
        )
        .bind(interface_id)
        .fetch_all(pool)
        .await?;
        Ok(rows.iter().map(map_vlan_row).collect())
    }

    pub async fn create(
        pool: &Pool<Sqlite>,
        vid: i32,
        name: &str,
        group_id: Option<i64>,
        site_id: Option<i64>,
    ) -> Result<Vlan> {
        let result = sqlx::query("INSERT INTO vlans (vid, name, group_id, site_id) VALUES (?, ?, ?, ?)")
            .bind(vid)
            .bind(name)
            .bind(group_id)
            .bind(site_id)
            .execute(pool)
            .await
            .context("Failed to create VLAN")?;

        Self::get(pool, result.last_insert_rowid())
            .await?
            .context("VLAN not found after creation")
    }
}
