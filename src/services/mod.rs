pub mod assignments;
pub mod decision;
pub mod executor;
pub mod reconcile;
pub mod resolver;
pub mod tracker;

use actix_web::HttpResponse;

use crate::errors::TrackerError;
use crate::models::{ApiResponse, ErrorCode};

pub use assignments::AssignmentService;
pub use reconcile::ReconcileService;
pub use tracker::{AssignmentTracker, ReconcileSettings};

/// 把内部错误转换成统一格式的响应
pub(crate) fn error_response(err: &TrackerError, context: &str) -> HttpResponse {
    let (code, status) = ErrorCode::from_error(err);
    HttpResponse::build(status).json(ApiResponse::error_empty(
        code,
        format!("{context}: {}", err.message()),
    ))
}
