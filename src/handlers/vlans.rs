use axum::{
    extract::{Query, State},
    Json,
};
use serde::Deserialize;
use std::sync::Arc;

use crate::models::*;
use crate::AppState;

use super::ApiError;

#[derive(Debug, Deserialize)]
pub struct VlanGroupQuery {
    #[serde(default)]
    pub site_id: Option<i64>,
}

/// List VLAN groups, optionally scoped to a site
pub async fn list_vlan_groups(
    State(state): State<Arc<AppState>>,
    Query(query): Query<VlanGroupQuery>,
) -> Result<Json<Vec<VlanGroup>>, ApiError> {
    Ok(Json(state.store.list_vlan_groups(query.site_id).await?))
}

/// List VLANs, optionally scoped to a group or a site
pub async fn list_vlans(
    State(state): State<Arc<AppState>>,
    Query(scope): Query<VlanScopeQuery>,
) -> Result<Json<Vec<Vlan>>, ApiError> {
    Ok(Json(state.store.list_vlans(&scope).await?))
}
