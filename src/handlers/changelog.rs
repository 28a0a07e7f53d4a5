use axum::{
    extract::{Path, Query, State},
    Json,
};
use std::sync::Arc;

use crate::models::*;
use crate::AppState;

use super::ApiError;

/// Get a single change log entry; this is what script log links point at
pub async fn get_change(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<Json<ChangeEntry>, ApiError> {
    Ok(Json(state.store.get_change(id).await?))
}

/// List the change log entries recorded under one request id
pub async fn list_changes(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ChangeLogQuery>,
) -> Result<Json<Vec<ChangeEntry>>, ApiError> {
    if query.request_id.trim().is_empty() {
        return Err(ApiError::bad_request("request_id is required"));
    }
    Ok(Json(state.store.list_changes_by_request(&query.request_id).await?))
}
