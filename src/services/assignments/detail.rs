use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

use super::AssignmentService;
use crate::adapters::Identity;
use crate::models::{ApiResponse, ErrorCode};
use crate::services::error_response;

pub async fn get_assignment(
    service: &AssignmentService,
    request: &HttpRequest,
    identity: &Identity,
    course_id: &str,
    course_work_id: &str,
) -> ActixResult<HttpResponse> {
    let tracker = service.get_tracker(request);

    match tracker
        .assignment_detail(identity, course_id, course_work_id)
        .await
    {
        Ok(Some(view)) => Ok(HttpResponse::Ok().json(ApiResponse::success(view, "获取作业详情成功"))),
        Ok(None) => Ok(HttpResponse::NotFound().json(ApiResponse::error_empty(
            ErrorCode::NotFound,
            "作业不存在",
        ))),
        Err(e) => Ok(error_response(&e, "获取作业详情失败")),
    }
}
