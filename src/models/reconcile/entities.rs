use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::models::classroom::entities::BlobRef;

/// 提交协议的步骤（Read/Lookup 为准备阶段，其余为三个远程写步骤）
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SubmissionStep {
    Read,
    Lookup,
    Stage,
    Attach,
    TurnIn,
}

impl SubmissionStep {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubmissionStep::Read => "read",
            SubmissionStep::Lookup => "lookup",
            SubmissionStep::Stage => "stage",
            SubmissionStep::Attach => "attach",
            SubmissionStep::TurnIn => "turn_in",
        }
    }
}

/// 失败原因分类
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureCause {
    /// 网络或服务端暂时性错误，留到下一轮
    Transient,
    /// 远程明确拒绝，重试也无济于事
    Rejected,
}

/// 一次提交尝试的最终结果
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum AttemptResult {
    Submitted,
    AlreadySubmitted,
    NoSubmissionRecord,
    Failed {
        step: SubmissionStep,
        cause: FailureCause,
        message: String,
    },
}

/// 一次提交协议的执行记录（临时对象，通知发出后即丢弃）
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubmissionAttempt {
    pub id: Uuid,
    pub course_id: String,
    pub course_work_id: String,
    pub title: String,
    // 提交文件的字节数，读取失败时为空
    pub content_bytes: Option<usize>,
    pub staged: Option<BlobRef>,
    pub attached: bool,
    pub turned_in: bool,
    pub result: AttemptResult,
}

impl SubmissionAttempt {
    pub fn new(course_id: &str, course_work_id: &str, title: &str) -> Self {
        Self {
            id: Uuid::new_v4(),
            course_id: course_id.to_string(),
            course_work_id: course_work_id.to_string(),
            title: title.to_string(),
            content_bytes: None,
            staged: None,
            attached: false,
            turned_in: false,
            result: AttemptResult::NoSubmissionRecord,
        }
    }

    pub fn is_success(&self) -> bool {
        self.result == AttemptResult::Submitted
    }

    /// 重试也无济于事的结果：没有提交记录，或某一步被远程明确拒绝
    pub fn needs_attention(&self) -> bool {
        matches!(
            self.result,
            AttemptResult::NoSubmissionRecord
                | AttemptResult::Failed {
                    cause: FailureCause::Rejected,
                    ..
                }
        )
    }
}

/// 对账流程所处阶段
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PassPhase {
    Idle,
    FetchingCourses,
    FetchingCoursework,
    ResolvingStatus,
    SelectingEligible,
    SubmittingEach,
    Notifying,
}

/// 一轮对账的结局
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum PassOutcome {
    Completed,
    /// 上一轮尚未结束
    Skipped,
    Aborted { reason: String },
}

/// 一轮对账的汇总
#[derive(Debug, Clone, Serialize)]
pub struct PassReport {
    pub pass_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub outcome: PassOutcome,
    pub phase: PassPhase,
    pub resolved: usize,
    pub unresolved: usize,
    pub eligible: usize,
    pub submitted: usize,
    pub already_submitted: usize,
    pub deferred: usize,
    pub no_record: usize,
    // 上次被拒绝且远程状态未变，本轮不再尝试
    pub held: usize,
    pub reminders_sent: usize,
    // 收到停机信号后跳过的条目数
    pub interrupted: usize,
    pub attempts: Vec<SubmissionAttempt>,
}

impl PassReport {
    pub fn begin() -> Self {
        Self {
            pass_id: Uuid::new_v4(),
            started_at: Utc::now(),
            finished_at: None,
            outcome: PassOutcome::Completed,
            phase: PassPhase::Idle,
            resolved: 0,
            unresolved: 0,
            eligible: 0,
            submitted: 0,
            already_submitted: 0,
            deferred: 0,
            no_record: 0,
            held: 0,
            reminders_sent: 0,
            interrupted: 0,
            attempts: Vec::new(),
        }
    }

    /// 记录一次提交尝试并更新计数
    pub fn record(&mut self, attempt: SubmissionAttempt) {
        match &attempt.result {
            AttemptResult::Submitted => self.submitted += 1,
            AttemptResult::AlreadySubmitted => self.already_submitted += 1,
            AttemptResult::NoSubmissionRecord => self.no_record += 1,
            AttemptResult::Failed { .. } => self.deferred += 1,
        }
        self.attempts.push(attempt);
    }

    pub fn finish(mut self, outcome: PassOutcome) -> Self {
        self.outcome = outcome;
        self.finished_at = Some(Utc::now());
        self
    }
}
