use chrono::NaiveDate;
use serde::Serialize;

use crate::models::assignments::entities::AssignmentView;

/// 仪表盘响应
#[derive(Debug, Serialize)]
pub struct AssignmentListResponse {
    pub items: Vec<AssignmentView>,
    pub total: usize,
    // 未能完整解析的条目数
    pub unresolved: usize,
}

/// 各状态数量
#[derive(Debug, Default, PartialEq, Serialize)]
pub struct StatusCounts {
    pub not_submitted: usize,
    pub ready_to_submit: usize,
    pub submitted: usize,
    pub graded: usize,
}

/// 单门课程完成率
#[derive(Debug, PartialEq, Serialize)]
pub struct CourseCompletion {
    pub course_id: String,
    pub course_name: String,
    pub total: usize,
    pub completed: usize,
    pub completion_rate: f64,
}

/// 某个截止日待完成的作业数
#[derive(Debug, PartialEq, Serialize)]
pub struct DueDateBucket {
    pub due_date: NaiveDate,
    pub pending: usize,
}

/// 完成情况分析
#[derive(Debug, Serialize)]
pub struct AnalyticsResponse {
    pub status_counts: StatusCounts,
    pub courses: Vec<CourseCompletion>,
    // 已批改作业的平均得分率（百分比）
    pub average_grade_percentage: Option<f64>,
    pub upcoming: Vec<DueDateBucket>,
}

/// 手动提交结果
#[derive(Debug, Serialize)]
pub struct ManualSubmissionResponse {
    pub path: String,
    pub kind: crate::models::repository::entities::WriteKind,
    pub size: usize,
}
