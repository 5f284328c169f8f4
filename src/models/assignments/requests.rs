use serde::Deserialize;

use crate::models::assignments::entities::AssignmentStatus;

/// 仪表盘排序方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssignmentSort {
    DueDateAsc,
    DueDateDesc,
    TitleAsc,
    TitleDesc,
}

/// 仪表盘查询参数（HTTP 请求）
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AssignmentListParams {
    /// 标题关键词（不区分大小写）
    pub search: Option<String>,
    /// 课程名关键词（不区分大小写）
    pub course: Option<String>,
    pub status: Option<AssignmentStatus>,
    pub sort: Option<AssignmentSort>,
}
