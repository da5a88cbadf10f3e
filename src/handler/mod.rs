use std::{io, sync::Arc, time::Instant};

use axum::{
    extract::{MatchedPath, Request, State},
    middleware::Next,
    response::Response,
};
use hyper::StatusCode;

use crate::{
    error::AppError,
    metrics::{HttpReqLabel, Metrics},
    sim::OutcomeGenerator,
};

pub mod mux;
pub mod txn;

/// 跨请求共享的应用状态
pub struct AppState {
    pub metrics: Metrics,
    pub outcomes: Box<dyn OutcomeGenerator>,
}

impl AppState {
    pub fn new(metrics: Metrics, outcomes: Box<dyn OutcomeGenerator>) -> Arc<AppState> {
        Arc::new(AppState { metrics, outcomes })
    }
}

/// Prometheus 指标处理器
pub(crate) async fn metrics_handler(State(state): State<Arc<AppState>>) -> Result<(StatusCode, String), AppError> {
    match state.metrics.encode() {
        Ok(buffer) => Ok((StatusCode::OK, buffer)),
        Err(e) => {
            log::error!("Failed to encode metrics: {e:?}");
            Err(AppError::new(io::Error::other(e)))
        }
    }
}

/// Middleware recording one counter increment and one latency observation per
/// request, labeled by the matched path, method and the status the handler
/// actually returned.
pub(crate) async fn track_http(State(state): State<Arc<AppState>>, request: Request, next: Next) -> Response {
    let start = Instant::now();
    let method = request.method().as_str().to_owned();
    // 用路由模式而不是真实路径，避免动态片段导致高基数标签
    let path = request
        .extensions()
        .get::<MatchedPath>()
        .map(|matched_path| matched_path.as_str().to_owned())
        .unwrap_or_else(|| request.uri().path().to_owned());

    let response = next.run(request).await;

    let label = HttpReqLabel {
        path,
        method,
        status: response.status().as_u16().to_string(),
    };
    state.metrics.http_requests.get_or_create(&label).inc();
    state.metrics.http_request_duration.get_or_create(&label).observe(start.elapsed().as_secs_f64());
    response
}
