use actix_web::{HttpRequest, HttpResponse, Result as ActixResult, web};
use once_cell::sync::Lazy;

use crate::models::assignments::requests::AssignmentListParams;
use crate::services::AssignmentService;
use crate::utils::BearerIdentity;

// 懒加载的全局 AssignmentService 实例
static ASSIGNMENT_SERVICE: Lazy<AssignmentService> = Lazy::new(AssignmentService::new_lazy);

// 仪表盘：作业列表
pub async fn list_assignments(
    req: HttpRequest,
    identity: BearerIdentity,
    query: web::Query<AssignmentListParams>,
) -> ActixResult<HttpResponse> {
    ASSIGNMENT_SERVICE
        .list_assignments(&req, &identity.0, query.into_inner())
        .await
}

// 完成情况统计
pub async fn get_analytics(req: HttpRequest, identity: BearerIdentity) -> ActixResult<HttpResponse> {
    ASSIGNMENT_SERVICE.get_analytics(&req, &identity.0).await
}

// 作业详情
pub async fn get_assignment(
    req: HttpRequest,
    identity: BearerIdentity,
    path: web::Path<(String, String)>,
) -> ActixResult<HttpResponse> {
    let (course_id, course_work_id) = path.into_inner();
    ASSIGNMENT_SERVICE
        .get_assignment(&req, &identity.0, &course_id, &course_work_id)
        .await
}

// 配置路由
pub fn configure_assignments_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1/assignments")
            .service(web::resource("").route(web::get().to(list_assignments)))
            .service(web::resource("/analytics").route(web::get().to(get_analytics)))
            .service(
                web::resource("/{course_id}/{course_work_id}").route(web::get().to(get_assignment)),
            ),
    );
}
