use axum::{
    routing::get,
    Router,
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::AppState;

/// Path the interface update script is served on; rerun links point back here
pub const UPDATE_INTERFACES_PATH: &str = "/api/scripts/update-interfaces";

/// Build the application router with all routes
pub fn build(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/health", get(handlers::healthcheck))
        // Inventory routes
        .route("/api/sites", get(handlers::devices::list_sites))
        .route("/api/devices", get(handlers::devices::list_devices))
        .route("/api/devices/:id/interfaces", get(handlers::devices::list_device_interfaces))
        // VLAN picker routes
        .route("/api/vlan-groups", get(handlers::vlans::list_vlan_groups))
        .route("/api/vlans", get(handlers::vlans::list_vlans))
        // Script routes
        .route(
            UPDATE_INTERFACES_PATH,
            get(handlers::scripts::describe_update_interfaces)
                .post(handlers::scripts::run_update_interfaces),
        )
        // Change log routes
        .route("/api/changelog", get(handlers::changelog::list_changes))
        .route("/api/changelog/:id", get(handlers::changelog::get_change))
        // Add state and middleware
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    use crate::config::Config;
    use crate::db::Store;

    async fn app() -> Router {
        let store = Store::in_memory().await.unwrap().with_public_url("http://localhost:8080");
        store.seed_demo().await.unwrap();
        let config = Config {
            db_path: ":memory:".into(),
            db_max_connections: 1,
            listen_addr: "127.0.0.1:0".into(),
            public_url: "http://localhost:8080".into(),
            seed_demo: true,
            fail_fast: true,
        };
        build(Arc::new(AppState { store, config }))
    }

    async fn json_body(resp: axum::response::Response) -> serde_json::Value {
        let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_device_interfaces() {
        let resp = app()
            .await
            .oneshot(Request::get("/api/devices/1/interfaces").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let body = json_body(resp).await;
        assert_eq!(body.as_array().unwrap().len(), 4);

        let resp = app()
            .await
            .oneshot(Request::get("/api/devices/99/interfaces").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_script_rejects_bad_input() {
        let resp = app()
            .await
            .oneshot(
                Request::post(UPDATE_INTERFACES_PATH)
                    .header("content-type", "application/x-www-form-urlencoded")
                    .body(Body::from("site=1&device=1"))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body = json_body(resp).await;
        assert!(body["error"].as_str().unwrap().starts_with("interfaces:"));
    }

    #[tokio::test]
    async fn test_script_commit_then_follow_changelog() {
        let app = app().await;
        let resp = app
            .clone()
            .oneshot(
                Request::post(format!("{}?commit=true", UPDATE_INTERFACES_PATH))
                    .header("content-type", "application/x-www-form-urlencoded")
                    .body(Body::from(
                        "site=1&device=1&interfaces=4&interface_description=spare&mode=access&untagged_vlan=3",
                    ))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let run = json_body(resp).await;
        assert_eq!(run["commit"], true);
        assert_eq!(run["outcome"]["updated"], serde_json::json!(["eth3"]));
        assert!(run["rerun_link"]
            .as_str()
            .unwrap()
            .starts_with("/api/scripts/update-interfaces?"));
        assert_eq!(
            run["rendered_config"],
            "config\ninterface eth3\n    description spare\n    vlan access 20\n"
        );

        let request_id = run["request_id"].as_str().unwrap().to_string();
        let resp = app
            .oneshot(
                Request::get(format!("/api/changelog?request_id={}", request_id))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let changes = json_body(resp).await;
        assert_eq!(changes.as_array().unwrap().len(), 1);
        assert_eq!(changes[0]["changed_object_id"], 4);
    }
}
