use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::{error, warn};

/// 等待 Ctrl+C，随后取消停机令牌
pub async fn listen_for_shutdown(token: CancellationToken) {
    if let Err(e) = signal::ctrl_c().await {
        error!("Failed to listen for Ctrl+C: {}", e);
        return;
    }
    warn!("Shutdown signal received, initiating graceful shutdown...");
    token.cancel();
}
