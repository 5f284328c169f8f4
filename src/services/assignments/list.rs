use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use std::cmp::Ordering;

use super::AssignmentService;
use crate::adapters::Identity;
use crate::models::ApiResponse;
use crate::models::assignments::entities::AssignmentView;
use crate::models::assignments::requests::{AssignmentListParams, AssignmentSort};
use crate::models::assignments::responses::AssignmentListResponse;
use crate::services::error_response;

/// 按查询参数过滤并排序；未指定排序时保持解析顺序
pub fn filter_and_sort(views: Vec<AssignmentView>, params: &AssignmentListParams) -> Vec<AssignmentView> {
    let search = params
        .search
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_lowercase);
    let course = params
        .course
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_lowercase);

    let mut views: Vec<AssignmentView> = views
        .into_iter()
        .filter(|v| {
            search
                .as_ref()
                .is_none_or(|s| v.title.to_lowercase().contains(s))
        })
        .filter(|v| {
            course
                .as_ref()
                .is_none_or(|c| v.course_name.to_lowercase().contains(c))
        })
        .filter(|v| params.status.is_none_or(|status| v.status == status))
        .collect();

    match params.sort {
        Some(AssignmentSort::DueDateAsc) => views.sort_by(|a, b| match (a.due_date, b.due_date) {
            // 没有截止日期的排在最后
            (Some(x), Some(y)) => x.cmp(&y),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        }),
        Some(AssignmentSort::DueDateDesc) => views.sort_by(|a, b| b.due_date.cmp(&a.due_date)),
        Some(AssignmentSort::TitleAsc) => {
            views.sort_by_key(|v| v.title.to_lowercase());
        }
        Some(AssignmentSort::TitleDesc) => {
            views.sort_by(|a, b| b.title.to_lowercase().cmp(&a.title.to_lowercase()));
        }
        None => {}
    }
    views
}

pub async fn list_assignments(
    service: &AssignmentService,
    request: &HttpRequest,
    identity: &Identity,
    query: AssignmentListParams,
) -> ActixResult<HttpResponse> {
    let tracker = service.get_tracker(request);

    match tracker.dashboard_view(identity).await {
        Ok(views) => {
            let items = filter_and_sort(views, &query);
            let resp = AssignmentListResponse {
                total: items.len(),
                unresolved: items.iter().filter(|v| v.is_unresolved()).count(),
                items,
            };
            Ok(HttpResponse::Ok().json(ApiResponse::success(resp, "获取作业列表成功")))
        }
        Err(e) => Ok(error_response(&e, "获取作业列表失败")),
    }
}
