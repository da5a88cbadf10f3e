//! Multiplexer variant: three demo endpoints behind the instrumentation
//! middleware, plus an uninstrumented metrics exposition route.

use std::{sync::Arc, time::Duration};

use axum::{Json, Router, extract::State, middleware, routing::get};
use hyper::StatusCode;
use serde_json::{Value, json};
use tokio::time::sleep;
use tower_http::{cors::CorsLayer, timeout::TimeoutLayer, trace::TraceLayer};

use crate::handler::{AppState, metrics_handler, track_http};

pub(crate) const WELCOME: &str = "Welcome to Prometheus Demo App!";

pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(home_handler))
        .route("/api/users", get(users_handler))
        .route("/api/data", get(data_handler))
        .layer(middleware::from_fn_with_state(state.clone(), track_http))
        .route("/metrics", get(metrics_handler))
        .layer((TraceLayer::new_for_http(), CorsLayer::permissive(), TimeoutLayer::new(Duration::from_secs(30))))
        .with_state(state)
}

async fn home_handler(State(state): State<Arc<AppState>>) -> (StatusCode, &'static str) {
    state.metrics.active_users.set(state.outcomes.active_users());
    (StatusCode::OK, WELCOME)
}

async fn users_handler(State(state): State<Arc<AppState>>) -> Json<Value> {
    sleep(state.outcomes.delay_up_to(Duration::from_millis(100))).await;
    Json(json!({"users": ["alice", "bob", "charlie"]}))
}

async fn data_handler(State(state): State<Arc<AppState>>) -> Json<Value> {
    sleep(state.outcomes.delay_up_to(Duration::from_millis(200))).await;
    Json(json!({"data": "sample data"}))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        metrics::Metrics,
        sim::{FixedOutcomes, PaymentMethod, TransactionStatus},
    };
    use axum::body::{Body, to_bytes};
    use axum::http::Request;
    use tower::ServiceExt;

    fn test_state() -> Arc<AppState> {
        AppState::new(
            Metrics::new(),
            Box::new(FixedOutcomes {
                id: 1,
                status: TransactionStatus::Pending,
                payment: PaymentMethod::Cash,
                users: 77,
            }),
        )
    }

    #[tokio::test]
    async fn test_home_sets_active_users_gauge() {
        let state = test_state();
        let router = build_router(state.clone());

        let response = router.oneshot(Request::builder().uri("/").body(Body::empty()).unwrap()).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&body[..], WELCOME.as_bytes());
        assert_eq!(state.metrics.active_users.get(), 77);
    }

    #[tokio::test]
    async fn test_users_body() {
        let state = test_state();
        let router = build_router(state);

        let response = router
            .oneshot(Request::builder().uri("/api/users").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json, json!({"users": ["alice", "bob", "charlie"]}));
    }

    #[tokio::test]
    async fn test_data_body() {
        let state = test_state();
        let router = build_router(state);

        let response = router
            .oneshot(Request::builder().uri("/api/data").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json, json!({"data": "sample data"}));
    }

    #[tokio::test]
    async fn test_middleware_records_one_count_and_one_observation() {
        let state = test_state();
        let router = build_router(state.clone());

        let response = router
            .oneshot(Request::builder().uri("/api/users").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let buffer = state.metrics.encode().unwrap();
        assert!(buffer.contains(r#"http_requests_total{path="/api/users",method="GET",status="200"} 1"#));
        assert!(buffer.contains(r#"http_request_duration_seconds_count{path="/api/users",method="GET",status="200"} 1"#));
    }

    #[tokio::test]
    async fn test_unknown_path_labeled_404() {
        let state = test_state();
        let router = build_router(state.clone());

        let response = router
            .oneshot(Request::builder().uri("/nope").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let buffer = state.metrics.encode().unwrap();
        assert!(buffer.contains(r#"http_requests_total{path="/nope",method="GET",status="404"} 1"#));
    }

    #[tokio::test]
    async fn test_metrics_route_not_instrumented() {
        let state = test_state();
        let router = build_router(state.clone());

        let response = router
            .oneshot(Request::builder().uri("/metrics").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let buffer = state.metrics.encode().unwrap();
        assert!(!buffer.contains(r#"path="/metrics""#));
    }
}
