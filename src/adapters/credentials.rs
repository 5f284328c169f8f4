use crate::adapters::{CredentialProvider, Identity};
use crate::errors::{Result, TrackerError};

/// 从配置读取访问令牌
///
/// 令牌的获取和刷新由外部 OAuth 层负责，这里只负责把它交给每一轮对账。
pub struct StaticCredentialProvider {
    access_token: String,
}

impl StaticCredentialProvider {
    pub fn new(access_token: &str) -> Self {
        Self {
            access_token: access_token.trim().to_string(),
        }
    }
}

#[async_trait::async_trait]
impl CredentialProvider for StaticCredentialProvider {
    async fn identity(&self) -> Result<Identity> {
        if self.access_token.is_empty() {
            return Err(TrackerError::authentication(
                "No Google access token configured",
            ));
        }
        Ok(Identity::bearer(self.access_token.clone()))
    }
}
