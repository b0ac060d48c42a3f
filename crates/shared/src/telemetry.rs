use std::time::Duration;
use tracing::{error, info, warn};

/// API 呼び出し用のスパンを作成
pub fn create_request_span(method: &str, path: &str, username: Option<&str>) -> tracing::Span {
    tracing::span!(
        tracing::Level::INFO,
        "api_request",
        method = method,
        path = path,
        username = username.unwrap_or("anonymous")
    )
}

/// HTTP リクエスト/レスポンスをトレース
pub fn trace_http_request(method: &str, path: &str, status_code: u16, elapsed: Duration) {
    if status_code >= 400 {
        warn!(
            method = method,
            path = path,
            status_code = status_code,
            duration_ms = elapsed.as_millis() as u64,
            "HTTP request failed"
        );
    } else {
        info!(
            method = method,
            path = path,
            status_code = status_code,
            duration_ms = elapsed.as_millis() as u64,
            "HTTP request completed"
        );
    }
}

/// 応答を受け取れなかったリクエストを記録
pub fn trace_transport_failure(
    method: &str,
    path: &str,
    error: &dyn std::error::Error,
    elapsed: Duration,
) {
    error!(
        method = method,
        path = path,
        duration_ms = elapsed.as_millis() as u64,
        error = %error,
        "HTTP request did not complete"
    );
}

/// エラーをトレースに記録
pub fn record_error(error: &dyn std::error::Error, context: &str) {
    error!(
        error = %error,
        context = context,
        "Error recorded in trace"
    );
}
