use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

/// 课程
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Course {
    pub id: String,
    pub name: String,
}

/// 课程作业（Classroom 中的一项作业定义）
///
/// 每一轮对账都会重新拉取，轮内不可变。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CourseworkItem {
    pub course_id: String,
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    // 只有年月日，没有具体时间
    pub due_date: Option<NaiveDate>,
    pub max_points: Option<f64>,
}

impl CourseworkItem {
    /// 截止时刻：截止日当天 00:00 (UTC)
    pub fn due_at(&self) -> Option<DateTime<Utc>> {
        self.due_date.map(due_instant)
    }
}

/// 把截止日期换算成截止时刻
pub fn due_instant(date: NaiveDate) -> DateTime<Utc> {
    date.and_time(NaiveTime::MIN).and_utc()
}

/// 学生提交记录的远程状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SubmissionState {
    New,
    Created,
    TurnedIn,
    Returned,
    ReclaimedByStudent,
    #[serde(other)]
    SubmissionStateUnspecified,
}

impl SubmissionState {
    /// 是否已经交给老师（包括已批改退回）
    pub fn is_turned_in(&self) -> bool {
        matches!(self, SubmissionState::TurnedIn | SubmissionState::Returned)
    }
}

/// 已上传到云端存储的文件引用
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlobRef {
    pub id: String,
    pub title: String,
}

/// 当前学生（me）针对某项作业的提交记录
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudentSubmission {
    pub id: String,
    pub course_id: String,
    pub course_work_id: String,
    pub state: SubmissionState,
    // 只有 RETURNED 时才可能有分数
    pub assigned_grade: Option<f64>,
    pub attachments: Vec<BlobRef>,
}

impl StudentSubmission {
    /// 查找同名附件（用于避免重复附加）
    pub fn attachment_named(&self, title: &str) -> Option<&BlobRef> {
        self.attachments.iter().find(|a| a.title == title)
    }
}
