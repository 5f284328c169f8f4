use actix_web::{FromRequest, HttpRequest, HttpResponse, dev::Payload, error::InternalError};
use std::future::{Ready, ready};

use crate::adapters::Identity;
use crate::models::{ApiResponse, ErrorCode};

/// 从 `Authorization: Bearer <token>` 提取调用方身份
///
/// 令牌由外部 OAuth 层签发，这里不做校验，失效时由 Classroom 返回 401。
pub struct BearerIdentity(pub Identity);

fn unauthorized(message: &str) -> actix_web::Error {
    InternalError::from_response(
        message.to_string(),
        HttpResponse::Unauthorized().json(ApiResponse::error_empty(ErrorCode::Unauthorized, message)),
    )
    .into()
}

impl FromRequest for BearerIdentity {
    type Error = actix_web::Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        let header = req
            .headers()
            .get(actix_web::http::header::AUTHORIZATION)
            .and_then(|h| h.to_str().ok());

        let token = header
            .and_then(|h| h.strip_prefix("Bearer "))
            .map(str::trim)
            .filter(|t| !t.is_empty());

        ready(match token {
            Some(token) => Ok(BearerIdentity(Identity::bearer(token))),
            None => Err(unauthorized("缺少访问令牌")),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::test::TestRequest;

    #[actix_web::test]
    async fn test_bearer_header_is_extracted() {
        let (req, mut payload) = TestRequest::default()
            .insert_header(("Authorization", "Bearer ya29.abc"))
            .to_http_parts();
        let BearerIdentity(identity) = BearerIdentity::from_request(&req, &mut payload)
            .await
            .unwrap();
        assert_eq!(identity.access_token(), "ya29.abc");
    }

    #[actix_web::test]
    async fn test_missing_header_is_rejected() {
        let (req, mut payload) = TestRequest::default().to_http_parts();
        assert!(BearerIdentity::from_request(&req, &mut payload).await.is_err());

        let (req, mut payload) = TestRequest::default()
            .insert_header(("Authorization", "Basic dXNlcjpwYXNz"))
            .to_http_parts();
        assert!(BearerIdentity::from_request(&req, &mut payload).await.is_err());
    }
}
