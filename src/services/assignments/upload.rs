use actix_multipart::Multipart;
use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use futures_util::TryStreamExt;
use futures_util::stream::StreamExt;

use super::AssignmentService;
use crate::errors::TrackerError;
use crate::models::{ApiResponse, ErrorCode};
use crate::services::error_response;

pub async fn handle_upload(
    service: &AssignmentService,
    req: &HttpRequest,
    title: &str,
    mut payload: Multipart,
) -> ActixResult<HttpResponse> {
    let tracker = service.get_tracker(req);
    let max_size = tracker.settings().max_upload_bytes;

    let mut content: Vec<u8> = Vec::new();
    let mut file_uploaded = false;

    while let Ok(Some(mut field)) = payload.try_next().await {
        let name = field
            .content_disposition()
            .and_then(|cd| cd.get_name())
            .unwrap_or_default()
            .to_string();

        if name != "file" {
            continue;
        }
        if file_uploaded {
            return Ok(HttpResponse::BadRequest().json(ApiResponse::error_empty(
                ErrorCode::MultifileUploadNotAllowed,
                "Only one file can be uploaded at a time",
            )));
        }
        file_uploaded = true;

        while let Some(chunk) = field.next().await {
            let data = chunk?;
            if content.len() + data.len() > max_size {
                return Ok(HttpResponse::PayloadTooLarge().json(ApiResponse::error_empty(
                    ErrorCode::BadRequest,
                    "File size exceeds the limit",
                )));
            }
            content.extend_from_slice(&data);
        }
    }

    if !file_uploaded || content.is_empty() {
        return Ok(HttpResponse::BadRequest().json(ApiResponse::error_empty(
            ErrorCode::EmptySubmission,
            "No file content found in upload payload",
        )));
    }

    match tracker.upload_submission(title, &content).await {
        Ok(resp) => Ok(HttpResponse::Ok().json(ApiResponse::success(resp, "提交文件已保存"))),
        Err(TrackerError::Validation(message)) => Ok(HttpResponse::BadRequest().json(
            ApiResponse::error_empty(ErrorCode::InvalidTitle, message),
        )),
        Err(e) => Ok(error_response(&e, "保存提交文件失败")),
    }
}
