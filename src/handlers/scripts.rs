use axum::{
    extract::{OriginalUri, State},
    Json,
};
use std::sync::Arc;

use crate::script::{self, source, FailurePolicy, RunContext, ScriptRequest, ScriptRun};
use crate::AppState;

use super::ApiError;

/// Query string and urlencoded body combined into one pair list
fn combined_input(query: Option<&str>, body: &str) -> String {
    let query = query.unwrap_or_default();
    let body = body.trim();
    match (query.is_empty(), body.is_empty()) {
        (_, true) => query.to_string(),
        (true, false) => body.to_string(),
        (false, false) => format!("{}&{}", query, body),
    }
}

/// Decode the script form without running it
pub async fn describe_update_interfaces(
    State(state): State<Arc<AppState>>,
    OriginalUri(uri): OriginalUri,
) -> Result<Json<ScriptRequest>, ApiError> {
    let request = source::resolve(&state.store, uri.query().unwrap_or_default()).await?;
    Ok(Json(request))
}

/// Run the interface update script
pub async fn run_update_interfaces(
    State(state): State<Arc<AppState>>,
    OriginalUri(uri): OriginalUri,
    body: String,
) -> Result<Json<ScriptRun>, ApiError> {
    let input = combined_input(uri.query(), &body);
    let request = source::resolve(&state.store, &input).await?;

    let policy = request
        .policy
        .unwrap_or_else(|| FailurePolicy::from_fail_fast(state.config.fail_fast));
    let ctx = RunContext::new(uri.path(), request.commit, policy);

    let result = script::run(&request.params, &ctx, &state.store, &state.store).await?;
    if !result.outcome.is_success() {
        tracing::warn!(
            request_id = %result.request_id,
            "Interface update finished with {} failure(s)",
            result.outcome.failures.len()
        );
    }
    Ok(Json(result))
}
