use actix_web::http::StatusCode;

use crate::errors::TrackerError;

/// 业务错误码
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ErrorCode {
    Success = 0,
    BadRequest = 1000,
    Unauthorized = 1001,
    NotFound = 1004,
    InvalidTitle = 2001,
    EmptySubmission = 2002,
    MultifileUploadNotAllowed = 2003,
    ReconcileBusy = 3001,
    UpstreamUnavailable = 5002,
    UpstreamRejected = 5003,
    InternalServerError = 5000,
}

impl ErrorCode {
    /// 由内部错误推导业务错误码和 HTTP 状态码
    pub fn from_error(err: &TrackerError) -> (Self, StatusCode) {
        match err {
            TrackerError::Authentication(_) => (ErrorCode::Unauthorized, StatusCode::UNAUTHORIZED),
            TrackerError::NotFound(_) => (ErrorCode::NotFound, StatusCode::NOT_FOUND),
            TrackerError::Validation(_) => (ErrorCode::BadRequest, StatusCode::BAD_REQUEST),
            TrackerError::Busy(_) => (ErrorCode::ReconcileBusy, StatusCode::CONFLICT),
            TrackerError::Transient(_) => {
                (ErrorCode::UpstreamUnavailable, StatusCode::BAD_GATEWAY)
            }
            TrackerError::Remote(_) => (ErrorCode::UpstreamRejected, StatusCode::BAD_GATEWAY),
            _ => (
                ErrorCode::InternalServerError,
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        }
    }
}
