use std::time::Duration;

use crate::errors::{Result, TrackerError};

const USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

/// 构造共享的 HTTP 客户端
pub(crate) fn build_client(timeout_secs: u64) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .user_agent(USER_AGENT)
        .timeout(Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| TrackerError::configuration(format!("Failed to build HTTP client: {e}")))
}

/// 非 2xx 响应按状态码归类，保留响应体作为错误信息
pub(crate) async fn ensure_success(response: reqwest::Response) -> Result<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(TrackerError::from_status(status.as_u16(), body))
}
