//! Router-based variant: one fake transaction endpoint plus metrics exposition.

use std::{
    sync::Arc,
    time::{Duration, Instant},
};

use axum::{
    Json, Router,
    extract::State,
    routing::{get, post},
};
use hyper::StatusCode;
use tokio::time::sleep;
use tower_http::{cors::CorsLayer, timeout::TimeoutLayer, trace::TraceLayer};

use crate::{
    handler::{AppState, metrics_handler},
    metrics::TransactionLabel,
    sim::Transaction,
};

pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/transactions", post(transaction_handler))
        .route("/metrics", get(metrics_handler))
        .layer((TraceLayer::new_for_http(), CorsLayer::permissive(), TimeoutLayer::new(Duration::from_secs(30))))
        .with_state(state)
}

/// 模拟交易处理器
///
/// Draws a random transaction outcome, fakes processing time and records one
/// observation in the per-outcome duration histogram. Per-transaction detail
/// (the generated code) goes to a tracing event, not to a metric label.
pub(crate) async fn transaction_handler(State(state): State<Arc<AppState>>) -> (StatusCode, Json<Transaction>) {
    let start = Instant::now();
    let transaction = Transaction::with_outcomes(state.outcomes.as_ref());

    // Simulate some processing time
    sleep(state.outcomes.delay_up_to(Duration::from_secs(1))).await;

    state
        .metrics
        .transaction_duration
        .get_or_create(&TransactionLabel {
            path: "/api/transactions".to_string(),
            method: "POST".to_string(),
            status: transaction.status.as_str().to_string(),
            payment_type: transaction.payment_type.as_str().to_string(),
        })
        .observe(start.elapsed().as_secs_f64());
    tracing::info!(code = %transaction.code, status = transaction.status.as_str(), "processed transaction");

    (StatusCode::OK, Json(transaction))
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
                id: 123456,
                status: TransactionStatus::Success,
                payment: PaymentMethod::Wallet,
                users: 60,
            }),
        )
    }

    #[tokio::test]
    async fn test_transaction_response() {
        let state = test_state();
        let router = build_router(state);

        let response = router
            .oneshot(Request::builder().method("POST").uri("/api/transactions").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert!(json["id"].is_i64());
        assert_eq!(json["code"], "TRX-123456");
        assert_eq!(json["status"], "success");
        assert_eq!(json["payment_type"], "wallet");
    }

    #[tokio::test]
    async fn test_transaction_records_duration_histogram() {
        let state = test_state();
        let router = build_router(state.clone());

        let response = router
            .oneshot(Request::builder().method("POST").uri("/api/transactions").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let buffer = state.metrics.encode().unwrap();
        assert!(buffer.contains(
            r#"http_request_transaction_duration_seconds_count{path="/api/transactions",method="POST",status="success",payment_type="wallet"} 1"#
        ));
        // the generated code must never appear as a metric label
        assert!(!buffer.contains("TRX-123456"));
    }

    #[tokio::test]
    async fn test_metrics_endpoint() {
        let state = test_state();
        let router = build_router(state);

        let response = router
            .oneshot(Request::builder().uri("/metrics").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let text = String::from_utf8(body.to_vec()).unwrap();
        assert!(text.contains("active_users"));
        assert!(text.contains("# TYPE http_requests counter"));
        assert!(text.contains("http_request_transaction_duration_seconds"));
    }
}
