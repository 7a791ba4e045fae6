// src/routes.rs

use axum::{Router, routing::post};
use tower_http::trace::TraceLayer;

use crate::{handlers::events, state::AppState};

/// Assembles the application router.
///
/// * `POST /api/events`: one chat message in, outbound actions out.
/// * Applies request tracing.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/api/events", post(events::receive_event))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use axum::{
        body::{Body, to_bytes},
        http::{Request, StatusCode, header},
    };
    use tower::ServiceExt;

    fn test_state(dir: &tempfile::TempDir) -> AppState {
        let config = Config::from_lookup(|key| match key {
            "OPERATOR_IDS" => Some("1".to_string()),
            "DATA_FILE" => Some(dir.path().join("data.json").display().to_string()),
            _ => None,
        })
        .unwrap();
        AppState::new(config)
    }

    #[tokio::test]
    async fn test_event_route_returns_outbound() {
        let dir = tempfile::tempdir().unwrap();
        let app = create_router(test_state(&dir));

        let body = serde_json::json!({
            "conversation_id": 1,
            "caller": {"id": 1},
            "text": "/start"
        });
        let response = app
            .oneshot(
                Request::post("/api/events")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(value[0]["kind"], "message");
        assert_eq!(value[0]["menu"]["type"], "main_menu");
    }

    #[tokio::test]
    async fn test_oversized_text_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let app = create_router(test_state(&dir));

        let body = serde_json::json!({
            "conversation_id": 2,
            "caller": {"id": 2},
            "text": "a".repeat(5000)
        });
        let response = app
            .oneshot(
                Request::post("/api/events")
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
