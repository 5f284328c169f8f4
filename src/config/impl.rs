use config::builder::DefaultState;
use config::{Config, ConfigBuilder, ConfigError, Environment, File};
use std::sync::OnceLock;

use super::AppConfig;

static APP_CONFIG: OnceLock<AppConfig> = OnceLock::new();

impl AppConfig {
    /// 内置默认值，配置文件和环境变量都可以覆盖
    pub(crate) fn with_defaults(
        builder: ConfigBuilder<DefaultState>,
    ) -> Result<ConfigBuilder<DefaultState>, ConfigError> {
        builder
            .set_default("app.system_name", "Assignment Tracker")?
            .set_default("app.environment", "development")?
            .set_default("app.log_level", "info")?
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 8080_i64)?
            .set_default("server.unix_socket_path", "")?
            .set_default("server.workers", 0_i64)?
            .set_default("server.max_workers", 8_i64)?
            .set_default("server.max_payload_size", 10_i64 * 1024 * 1024)?
            .set_default("cors.max_age", 3600_i64)?
            .set_default("classroom.api_base_url", "https://classroom.googleapis.com")?
            .set_default(
                "classroom.drive_upload_url",
                "https://www.googleapis.com/upload/drive/v3/files",
            )?
            .set_default("classroom.access_token", "")?
            .set_default("classroom.page_size", 50_i64)?
            .set_default("classroom.request_timeout", 30_i64)?
            .set_default("github.api_base_url", "https://api.github.com")?
            .set_default("github.token", "")?
            .set_default("github.repository", "")?
            .set_default("github.branch", "")?
            .set_default("github.submission_filename", "submission.txt")?
            .set_default("github.commit_message", "Submit {title}")?
            .set_default("reconcile.enabled", true)?
            .set_default("reconcile.interval_secs", 3600_i64)?
            .set_default("reconcile.lead_time_secs", 86400_i64)?
            .set_default("reconcile.max_concurrency", 4_i64)?
            .set_default("reconcile.reuse_existing_attachment", true)?
            .set_default("reconcile.send_reminders", true)?
            .set_default("notification.enabled", false)?
            .set_default("notification.smtp_host", "smtp.gmail.com")?
            .set_default("notification.smtp_port", 465_i64)?
            .set_default("notification.username", "")?
            .set_default("notification.password", "")?
            .set_default("notification.from", "")?
            .set_default("notification.to", "")
    }

    /// 加载配置
    pub fn load() -> Result<Self, ConfigError> {
        let mut builder = Self::with_defaults(Config::builder())?
            // 首先加载默认配置文件
            .add_source(File::with_name("config").required(false))
            // 然后根据环境加载特定配置文件
            .add_source(
                File::with_name(&format!(
                    "config.{}",
                    std::env::var("APP_ENV").unwrap_or_else(|_| "development".into())
                ))
                .required(false),
            )
            // 最后加载环境变量覆盖，例如 TRACKER_RECONCILE__LEAD_TIME_SECS
            .add_source(
                Environment::with_prefix("TRACKER")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            );

        // 兼容旧版部署使用的环境变量
        builder = builder
            .set_override_option("app.environment", std::env::var("APP_ENV").ok())?
            .set_override_option("app.log_level", std::env::var("RUST_LOG").ok())?
            .set_override_option("server.host", std::env::var("SERVER_HOST").ok())?
            .set_override_option("server.port", std::env::var("SERVER_PORT").ok())?
            .set_override_option("server.unix_socket_path", std::env::var("UNIX_SOCKET").ok())?
            .set_override_option("server.workers", std::env::var("CPU_COUNT").ok())?
            .set_override_option(
                "classroom.access_token",
                std::env::var("GOOGLE_ACCESS_TOKEN").ok(),
            )?
            .set_override_option("github.token", std::env::var("GITHUB_TOKEN").ok())?
            .set_override_option("github.repository", std::env::var("GITHUB_REPO").ok())?
            .set_override_option("notification.username", std::env::var("EMAIL_ADDRESS").ok())?
            .set_override_option(
                "notification.password",
                std::env::var("EMAIL_PASSWORD").ok(),
            )?;

        let config = builder.build()?;
        let mut app_config: AppConfig = config.try_deserialize()?;

        // 处理工作线程数
        if app_config.server.workers == 0 {
            app_config.server.workers = num_cpus::get().min(app_config.server.max_workers);
        }

        app_config.validate()?;

        Ok(app_config)
    }

    /// 校验无法由类型系统保证的约束
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.github.repository.is_empty() && self.github.owner_and_name().is_none() {
            return Err(ConfigError::Message(format!(
                "github.repository must look like owner/name, got '{}'",
                self.github.repository
            )));
        }
        if self.github.submission_filename.is_empty()
            || self.github.submission_filename.contains('/')
        {
            return Err(ConfigError::Message(
                "github.submission_filename must be a plain file name".to_string(),
            ));
        }
        if self.reconcile.interval_secs == 0 {
            return Err(ConfigError::Message(
                "reconcile.interval_secs must be positive".to_string(),
            ));
        }
        if self.reconcile.lead_time_secs < 0 {
            return Err(ConfigError::Message(
                "reconcile.lead_time_secs must not be negative".to_string(),
            ));
        }
        if chrono::TimeDelta::try_seconds(self.reconcile.lead_time_secs).is_none() {
            return Err(ConfigError::Message(format!(
                "reconcile.lead_time_secs is out of range: {}",
                self.reconcile.lead_time_secs
            )));
        }
        Ok(())
    }

    /// 获取全局配置实例
    pub fn get() -> &'static AppConfig {
        APP_CONFIG.get_or_init(|| {
            Self::load().unwrap_or_else(|e| {
                eprintln!("Failed to load configuration: {e}");
                std::process::exit(1);
            })
        })
    }

    /// 初始化配置 (在应用启动时调用)
    pub fn init() -> Result<(), ConfigError> {
        let config = Self::load()?;
        APP_CONFIG
            .set(config)
            .map_err(|_| ConfigError::Message("Configuration already initialized".to_string()))?;
        Ok(())
    }

    /// 检查是否为开发环境
    pub fn is_development(&self) -> bool {
        self.app.environment == "development"
    }

    /// 获取服务器绑定地址
    pub fn server_bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    /// 获取 Unix 套接字路径 (如果配置了)
    #[cfg(unix)]
    pub fn unix_socket_path(&self) -> Option<&str> {
        if self.server.unix_socket_path.is_empty() {
            None
        } else {
            Some(&self.server.unix_socket_path)
        }
    }
}
