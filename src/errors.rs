//! 统一错误处理模块
//!
//! 使用宏自动生成错误类型，支持错误代码和类型名称。
//! 远程调用的错误在进入核心逻辑之前都会被归类为下列变体之一。

use std::fmt;

/// 定义错误类型的宏
///
/// 自动生成：
/// - enum 定义
/// - code() 方法 - 返回错误代码
/// - error_type() 方法 - 返回错误类型名称
/// - message() 方法 - 返回错误详情
/// - 便捷构造函数
macro_rules! define_tracker_errors {
    ($(
        $variant:ident($code:literal, $type_name:literal)
    ),* $(,)?) => {
        #[derive(Debug, Clone, PartialEq, Eq)]
        pub enum TrackerError {
            $($variant(String),)*
        }

        impl TrackerError {
            /// 获取错误代码
            pub fn code(&self) -> &'static str {
                match self {
                    $(TrackerError::$variant(_) => $code,)*
                }
            }

            /// 获取错误类型名称
            pub fn error_type(&self) -> &'static str {
                match self {
                    $(TrackerError::$variant(_) => $type_name,)*
                }
            }

            /// 获取错误详情
            pub fn message(&self) -> &str {
                match self {
                    $(TrackerError::$variant(msg) => msg,)*
                }
            }
        }

        // 生成便捷构造函数
        paste::paste! {
            impl TrackerError {
                $(
                    pub fn [<$variant:snake>]<T: Into<String>>(msg: T) -> Self {
                        TrackerError::$variant(msg.into())
                    }
                )*
            }
        }
    };
}

define_tracker_errors! {
    Configuration("E001", "Configuration Error"),
    Authentication("E002", "Authentication Error"),
    Transient("E003", "Transient Remote Error"),
    NotFound("E004", "Resource Not Found"),
    Remote("E005", "Remote API Error"),
    Serialization("E006", "Serialization Error"),
    Validation("E007", "Validation Error"),
    Notification("E008", "Notification Error"),
    Busy("E009", "Reconciliation Busy"),
}

impl TrackerError {
    /// 按 HTTP 状态码归类远程错误
    pub fn from_status(status: u16, message: impl Into<String>) -> Self {
        let message = format!("HTTP {status}: {}", message.into());
        match status {
            401 | 403 => TrackerError::Authentication(message),
            404 => TrackerError::NotFound(message),
            408 | 425 | 429 | 500..=599 => TrackerError::Transient(message),
            _ => TrackerError::Remote(message),
        }
    }

    /// 留给下一轮调度重试（绝不在本轮内循环重试）
    pub fn is_retryable(&self) -> bool {
        matches!(self, TrackerError::Transient(_))
    }

    /// 凭据失效，整轮中止并交由会话层重新认证
    pub fn is_fatal(&self) -> bool {
        matches!(self, TrackerError::Authentication(_))
    }

    /// 格式化为彩色输出（用于开发环境）
    #[cfg(debug_assertions)]
    pub fn format_colored(&self) -> String {
        format!(
            "\x1b[1;31m[ERROR]\x1b[0m \x1b[33m{}\x1b[0m \x1b[31m{}\x1b[0m\n  {}",
            self.code(),
            self.error_type(),
            self.message()
        )
    }

    /// 格式化为简洁输出
    pub fn format_simple(&self) -> String {
        format!("{}: {}", self.error_type(), self.message())
    }
}

impl fmt::Display for TrackerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format_simple())
    }
}

impl std::error::Error for TrackerError {}

// 为常见的错误类型实现 From trait
impl From<reqwest::Error> for TrackerError {
    fn from(err: reqwest::Error) -> Self {
        if let Some(status) = err.status() {
            return TrackerError::from_status(status.as_u16(), err.to_string());
        }
        if err.is_decode() {
            return TrackerError::Serialization(err.to_string());
        }
        // 连接失败、超时等网络层错误
        TrackerError::Transient(err.to_string())
    }
}

impl From<serde_json::Error> for TrackerError {
    fn from(err: serde_json::Error) -> Self {
        TrackerError::Serialization(err.to_string())
    }
}

impl From<base64::DecodeError> for TrackerError {
    fn from(err: base64::DecodeError) -> Self {
        TrackerError::Serialization(err.to_string())
    }
}

impl From<config::ConfigError> for TrackerError {
    fn from(err: config::ConfigError) -> Self {
        TrackerError::Configuration(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, TrackerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(TrackerError::configuration("test").code(), "E001");
        assert_eq!(TrackerError::authentication("test").code(), "E002");
        assert_eq!(TrackerError::transient("test").code(), "E003");
        assert_eq!(TrackerError::busy("test").code(), "E009");
    }

    #[test]
    fn test_error_types() {
        assert_eq!(
            TrackerError::transient("test").error_type(),
            "Transient Remote Error"
        );
        assert_eq!(
            TrackerError::validation("test").error_type(),
            "Validation Error"
        );
    }

    #[test]
    fn test_status_classification() {
        assert!(TrackerError::from_status(401, "expired").is_fatal());
        assert!(TrackerError::from_status(403, "revoked").is_fatal());
        assert!(matches!(
            TrackerError::from_status(404, "missing"),
            TrackerError::NotFound(_)
        ));
        assert!(TrackerError::from_status(429, "slow down").is_retryable());
        assert!(TrackerError::from_status(503, "unavailable").is_retryable());

        let rejected = TrackerError::from_status(400, "bad request");
        assert!(matches!(rejected, TrackerError::Remote(_)));
        assert!(!rejected.is_retryable());
        assert!(!rejected.is_fatal());
    }

    #[test]
    fn test_status_message_is_kept() {
        let err = TrackerError::from_status(500, "backend exploded");
        assert_eq!(err.message(), "HTTP 500: backend exploded");
    }

    #[test]
    fn test_format_simple() {
        let err = TrackerError::validation("Invalid title");
        let formatted = err.format_simple();
        assert!(formatted.contains("Validation Error"));
        assert!(formatted.contains("Invalid title"));
    }
}
