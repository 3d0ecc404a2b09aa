use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::Json;
use serde_json::Value;
use tracing::debug;

use crate::protocol::OperationResponse;
use crate::state::AppState;

// GET /api/health
pub async fn health() -> Json<Value> {
    Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

// POST /api/operations/:name (body: JSON argument object, may be empty)
pub async fn operation(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
    body: Bytes,
) -> Json<OperationResponse> {
    let args = if body.is_empty() {
        Value::Null
    } else {
        match serde_json::from_slice(&body) {
            Ok(v) => v,
            Err(e) => {
                return Json(OperationResponse::err(format!("Invalid arguments: {}", e)));
            }
        }
    };
    debug!(operation = %name, "Operation received");
    Json(state.dispatcher.dispatch(&name, &args).await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use switchyard_core::config::AppConfig;
    use switchyard_flow::{Collaborators, DemoWeatherProvider, Orchestrator, StaticGeocoder};
    use switchyard_test_utils::seeded_store;

    use crate::dispatcher::OperationDispatcher;

    async fn app_state() -> Arc<AppState> {
        let collab = Collaborators::new(
            seeded_store().await,
            Arc::new(StaticGeocoder),
            Arc::new(DemoWeatherProvider),
        );
        let orch = Orchestrator::new(&AppConfig::default(), collab).unwrap();
        Arc::new(AppState {
            dispatcher: OperationDispatcher::new(Arc::new(orch)),
        })
    }

    #[tokio::test]
    async fn test_health() {
        let Json(body) = health().await;
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn test_operation_route() {
        let state = app_state().await;
        let Json(resp) = operation(
            State(state.clone()),
            Path("user_request".to_string()),
            Bytes::from(json!({"user_request": "show correspondent accounts"}).to_string()),
        )
        .await;
        assert!(resp.is_success());
        assert!(resp.data["response"]
            .as_str()
            .unwrap()
            .contains("**Nostro Accounts (all filter):**"));

        let Json(resp) = operation(
            State(state.clone()),
            Path("health_check".to_string()),
            Bytes::new(),
        )
        .await;
        assert!(resp.is_success());

        let Json(resp) = operation(
            State(state),
            Path("user_request".to_string()),
            Bytes::from_static(b"{not json"),
        )
        .await;
        assert!(resp.message.starts_with("Invalid arguments"));
    }
}
