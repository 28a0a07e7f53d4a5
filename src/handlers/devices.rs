use axum::{
    extract::{Path, State},
    Json,
};
use std::sync::Arc;

use crate::models::*;
use crate::AppState;

use super::ApiError;

/// List all sites
pub async fn list_sites(State(state): State<Arc<AppState>>) -> Result<Json<Vec<Site>>, ApiError> {
    Ok(Json(state.store.list_sites().await?))
}

/// List all devices
pub async fn list_devices(State(state): State<Arc<AppState>>) -> Result<Json<Vec<Device>>, ApiError> {
    Ok(Json(state.store.list_devices().await?))
}

/// List the interfaces of a device with their VLAN assignments
pub async fn list_device_interfaces(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<Vec<InterfaceRecord>>, ApiError> {
    if state.store.get_device(id).await?.is_none() {
        return Err(ApiError::not_found("device"));
    }
    let interfaces = state.store.list_device_interfaces(id).await?;
    Ok(Json(interfaces))
}
