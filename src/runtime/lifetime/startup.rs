use std::sync::Arc;
use tracing::{debug, warn};

use crate::adapters::create_adapters;
use crate::config::AppConfig;
use crate::errors::Result;
use crate::services::{AssignmentTracker, ReconcileSettings};

pub struct StartupContext {
    pub tracker: Arc<AssignmentTracker>,
}

/// 准备服务器启动的上下文
/// 包括 TLS 提供方、外部适配器和作业追踪核心
pub async fn prepare_server_startup(config: &AppConfig) -> Result<StartupContext> {
    // 重复安装时返回 Err，说明已有提供方，可以忽略
    if rustls::crypto::ring::default_provider()
        .install_default()
        .is_err()
    {
        debug!("rustls crypto provider already installed");
    }

    let adapters = create_adapters(config)?;
    warn!(
        "Adapters initialized (repository: {}, notifications: {})",
        if config.github.repository.is_empty() {
            "<unset>"
        } else {
            config.github.repository.as_str()
        },
        if config.notification.enabled {
            "smtp"
        } else {
            "log"
        }
    );

    let settings = ReconcileSettings::from_config(config)?;
    debug!(?settings, "Reconcile settings");

    Ok(StartupContext {
        tracker: Arc::new(AssignmentTracker::new(adapters, settings)),
    })
}
