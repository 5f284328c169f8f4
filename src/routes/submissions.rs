use actix_multipart::Multipart;
use actix_web::{HttpRequest, HttpResponse, Result as ActixResult, web};
use once_cell::sync::Lazy;

use crate::services::AssignmentService;
use crate::utils::BearerIdentity;

static ASSIGNMENT_SERVICE: Lazy<AssignmentService> = Lazy::new(AssignmentService::new_lazy);

// 上传提交文件到版本库（需要登录，但写入使用服务端的 GitHub 凭据）
pub async fn upload_submission(
    req: HttpRequest,
    _identity: BearerIdentity,
    path: web::Path<String>,
    payload: Multipart,
) -> ActixResult<HttpResponse> {
    ASSIGNMENT_SERVICE
        .upload_submission(&req, &path.into_inner(), payload)
        .await
}

pub fn configure_submissions_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1/submissions")
            .service(web::resource("/{title}").route(web::post().to(upload_submission))),
    );
}
