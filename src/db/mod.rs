mod changelog;
mod devices;
mod interfaces;
pub(crate) mod row_helpers;
mod seeds;
mod sites;
mod store_script;
mod vlans;

use anyhow::{Context, Result};
use sqlx::{sqlite::SqlitePoolOptions, Pool, Sqlite};

use crate::models::*;

use changelog::ChangeRepo;
use devices::DeviceRepo;
use interfaces::InterfaceRepo;
use sites::SiteRepo;
use vlans::{VlanGroupRepo, VlanRepo};

/// Typed error for "resource not found"; the API error handler downcasts it to a 404.
#[derive(Debug)]
pub struct NotFoundError {
    pub resource: String,
    pub id: String,
}

impl NotFoundError {
    pub fn new(resource: &str, id: &str) -> Self {
        Self {
            resource: resource.to_string(),
            id: id.to_string(),
        }
    }
}

impl std::fmt::Display for NotFoundError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} not found: {}", self.resource, self.id)
    }
}

impl std::error::Error for NotFoundError {}

/// Store handles all database operations, delegating to per-entity repo modules.
#[derive(Clone)]
pub struct Store {
    pool: Pool<Sqlite>,
    public_url: String,
}

impl Store {
    /// Create a new database store with a specific pool size
    pub async fn with_pool_size(db_path: &str, max_connections: u32) -> Result<Self> {
        let db_url = format!("sqlite:{}?mode=rwc", db_path);

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect(&db_url)
            .await
            .context("Failed to connect to database")?;

        let store = Self {
            pool,
            public_url: String::new(),
        };
        store.migrate().await?;
        Ok(store)
    }

    /// Single-connection in-memory store for tests
    #[cfg(test)]
    pub async fn in_memory() -> Result<Self> {
        Self::with_pool_size(":memory:", 1).await
    }

    /// Prefix used when building change log locators
    pub fn with_public_url(mut self, public_url: &str) -> Self {
        self.public_url = public_url.trim_end_matches('/').to_string();
        self
    }

    /// Run database migrations
    async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .context("Failed to run database migrations")?;
        Ok(())
    }

    // ========== Site Operations ==========

    pub async fn list_sites(&self) -> Result<Vec<Site>> {
        SiteRepo::list(&self.pool).await
    }

    pub async fn get_site(&self, id: i64) -> Result<Option<Site>> {
        SiteRepo::get(&self.pool, id).await
    }

    // ========== Device Operations ==========

    pub async fn list_devices(&self) -> Result<Vec<Device>> {
        DeviceRepo::list(&self.pool).await
    }

    pub async fn get_device(&self, id: i64) -> Result<Option<Device>> {
        DeviceRepo::get(&self.pool, id).await
    }

    // ========== Interface Operations ==========

    pub async fn get_interface(&self, id: i64) -> Result<Option<InterfaceRecord>> {
        InterfaceRepo::get(&self.pool, id).await
    }

    pub async fn list_device_interfaces(&self, device_id: i64) -> Result<Vec<InterfaceRecord>> {
        InterfaceRepo::list_by_device(&self.pool, device_id).await
    }

    // ========== VLAN Operations ==========

    pub async fn list_vlan_groups(&self, site_id: Option<i64>) -> Result<Vec<VlanGroup>> {
        VlanGroupRepo::list(&self.pool, site_id).await
    }

    pub async fn get_vlan_group(&self, id: i64) -> Result<Option<VlanGroup>> {
        VlanGroupRepo::get(&self.pool, id).await
    }

    pub async fn list_vlans(&self, scope: &VlanScopeQuery) -> Result<Vec<Vlan>> {
        VlanRepo::list(&self.pool, scope).await
    }

    pub async fn get_vlan(&self, id: i64) -> Result<Option<Vlan>> {
        VlanRepo::get(&self.pool, id).await
    }

    // ========== Change Log Operations ==========

    pub async fn get_change(&self, id: i64) -> Result<ChangeEntry> {
        ChangeRepo::get(&self.pool, id)
            .await?
            .ok_or_else(|| NotFoundError::new("change log entry", &id.to_string()).into())
    }

    pub async fn list_changes_by_request(&self, request_id: &str) -> Result<Vec<ChangeEntry>> {
        ChangeRepo::list_by_request(&self.pool, request_id).await
    }
}
