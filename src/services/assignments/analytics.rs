use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};
use chrono::{NaiveDate, Utc};
use std::collections::BTreeMap;

use super::AssignmentService;
use crate::adapters::Identity;
use crate::models::ApiResponse;
use crate::models::assignments::entities::{AssignmentStatus, AssignmentView};
use crate::models::assignments::responses::{
    AnalyticsResponse, CourseCompletion, DueDateBucket, StatusCounts,
};
use crate::services::error_response;

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// 汇总完成情况；`today` 之前截止的作业不计入待办时间线
pub fn summarize(views: &[AssignmentView], today: NaiveDate) -> AnalyticsResponse {
    let mut status_counts = StatusCounts::default();
    for view in views {
        match view.status {
            AssignmentStatus::NotSubmitted => status_counts.not_submitted += 1,
            AssignmentStatus::ReadyToSubmit => status_counts.ready_to_submit += 1,
            AssignmentStatus::Submitted => status_counts.submitted += 1,
            AssignmentStatus::Graded => status_counts.graded += 1,
        }
    }

    // 课程按首次出现的顺序排列
    let mut courses: Vec<CourseCompletion> = Vec::new();
    for view in views {
        let index = match courses.iter().position(|c| c.course_id == view.course_id) {
            Some(index) => index,
            None => {
                courses.push(CourseCompletion {
                    course_id: view.course_id.clone(),
                    course_name: view.course_name.clone(),
                    total: 0,
                    completed: 0,
                    completion_rate: 0.0,
                });
                courses.len() - 1
            }
        };
        let course = &mut courses[index];
        course.total += 1;
        if view.status.is_complete() {
            course.completed += 1;
        }
    }
    for course in &mut courses {
        course.completion_rate = round2(course.completed as f64 / course.total as f64 * 100.0);
    }

    let percentages: Vec<f64> = views
        .iter()
        .filter_map(|v| match (v.grade, v.max_points) {
            (Some(grade), Some(max)) if max > 0.0 => Some(grade / max * 100.0),
            _ => None,
        })
        .collect();
    let average_grade_percentage = if percentages.is_empty() {
        None
    } else {
        Some(round2(
            percentages.iter().sum::<f64>() / percentages.len() as f64,
        ))
    };

    let mut upcoming: BTreeMap<NaiveDate, usize> = BTreeMap::new();
    for view in views.iter().filter(|v| !v.status.is_complete()) {
        if let Some(due) = view.due_date.filter(|d| *d >= today) {
            *upcoming.entry(due).or_default() += 1;
        }
    }

    AnalyticsResponse {
        status_counts,
        courses,
        average_grade_percentage,
        upcoming: upcoming
            .into_iter()
            .map(|(due_date, pending)| DueDateBucket { due_date, pending })
            .collect(),
    }
}

pub async fn get_analytics(
    service: &AssignmentService,
    request: &HttpRequest,
    identity: &Identity,
) -> ActixResult<HttpResponse> {
    let tracker = service.get_tracker(request);

    match tracker.dashboard_view(identity).await {
        Ok(views) => {
            let resp = summarize(&views, Utc::now().date_naive());
            Ok(HttpResponse::Ok().json(ApiResponse::success(resp, "获取统计信息成功")))
        }
        Err(e) => Ok(error_response(&e, "获取统计信息失败")),
    }
}
