use serde::{Deserialize, Serialize};

/// 应用配置结构体
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub app: AppSettings,
    pub server: ServerConfig,
    pub cors: CorsConfig,
    pub classroom: ClassroomConfig,
    pub github: GithubConfig,
    pub reconcile: ReconcileConfig,
    pub notification: NotificationConfig,
}

/// 应用设置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppSettings {
    pub system_name: String,
    pub environment: String,
    pub log_level: String,
}

/// 服务器配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub unix_socket_path: String,
    pub workers: usize,
    pub max_workers: usize,
    pub max_payload_size: usize,
}

/// CORS 配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CorsConfig {
    pub max_age: usize,
}

/// Google Classroom / Drive 配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassroomConfig {
    pub api_base_url: String,
    pub drive_upload_url: String,
    #[serde(skip_serializing, default)] // 不序列化到JSON响应中
    pub access_token: String,
    pub page_size: u32,
    pub request_timeout: u64, // 请求超时 (秒)
}

/// GitHub 仓库配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GithubConfig {
    pub api_base_url: String,
    #[serde(skip_serializing, default)]
    pub token: String,
    pub repository: String, // owner/name
    pub branch: String,     // 为空时使用默认分支
    pub submission_filename: String,
    pub commit_message: String, // 支持 {title} 占位符
}

/// 自动对账配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReconcileConfig {
    pub enabled: bool,
    pub interval_secs: u64,
    pub lead_time_secs: i64,
    pub max_concurrency: usize,
    pub reuse_existing_attachment: bool,
    pub send_reminders: bool,
}

/// 邮件通知配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotificationConfig {
    pub enabled: bool,
    pub smtp_host: String,
    pub smtp_port: u16,
    pub username: String,
    #[serde(skip_serializing, default)]
    pub password: String,
    pub from: String, // 为空时使用 username
    pub to: String,   // 为空时发给自己
}

impl GithubConfig {
    /// 拆分 owner/name
    pub fn owner_and_name(&self) -> Option<(&str, &str)> {
        let (owner, name) = self.repository.split_once('/')?;
        if owner.is_empty() || name.is_empty() || name.contains('/') {
            return None;
        }
        Some((owner, name))
    }
}
