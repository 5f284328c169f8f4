use lettre::message::{Mailbox, header::ContentType};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use tracing::{debug, info};

use super::Notifier;
use crate::config::NotificationConfig;
use crate::errors::{Result, TrackerError};

/// 通过 SMTP 给自己发邮件
pub struct SmtpNotifier {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
    to: Mailbox,
}

fn parse_mailbox(value: &str, field: &str) -> Result<Mailbox> {
    value
        .parse()
        .map_err(|e| TrackerError::configuration(format!("Invalid notification.{field}: {e}")))
}

impl SmtpNotifier {
    pub fn new(config: &NotificationConfig) -> Result<Self> {
        // from / to 为空时都使用登录账号
        let from = if config.from.is_empty() {
            &config.username
        } else {
            &config.from
        };
        let to = if config.to.is_empty() {
            &config.username
        } else {
            &config.to
        };

        // 465 端口走隐式 TLS，其余走 STARTTLS
        let builder = if config.smtp_port == 465 {
            AsyncSmtpTransport::<Tokio1Executor>::relay(&config.smtp_host)
        } else {
            AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_host)
        }
        .map_err(|e| TrackerError::configuration(format!("Invalid SMTP relay: {e}")))?;

        let transport = builder
            .port(config.smtp_port)
            .credentials(Credentials::new(
                config.username.clone(),
                config.password.clone(),
            ))
            .build();

        Ok(Self {
            transport,
            from: parse_mailbox(from, "from")?,
            to: parse_mailbox(to, "to")?,
        })
    }
}

#[async_trait::async_trait]
impl Notifier for SmtpNotifier {
    async fn notify(&self, subject: &str, body: &str) -> Result<()> {
        let email = Message::builder()
            .from(self.from.clone())
            .to(self.to.clone())
            .subject(subject)
            .header(ContentType::TEXT_PLAIN)
            .body(body.to_string())
            .map_err(|e| TrackerError::notification(format!("Failed to build email: {e}")))?;

        self.transport
            .send(email)
            .await
            .map_err(|e| TrackerError::notification(format!("Failed to send email: {e}")))?;

        debug!(subject, "Notification email sent");
        Ok(())
    }
}

/// 未启用邮件时只写日志
pub struct LogNotifier;

#[async_trait::async_trait]
impl Notifier for LogNotifier {
    async fn notify(&self, subject: &str, body: &str) -> Result<()> {
        info!(subject, body, "Notification");
        Ok(())
    }
}
