use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::models::classroom::entities::{
    CourseworkItem, StudentSubmission, SubmissionState, due_instant,
};

/// 作业提交状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AssignmentStatus {
    NotSubmitted,
    ReadyToSubmit,
    Submitted,
    Graded,
}

impl AssignmentStatus {
    /// 由远程提交记录和本地文件是否存在推导状态
    ///
    /// - RETURNED 且有分数 => Graded
    /// - TURNED_IN（或没有分数的 RETURNED）=> Submitted
    /// - 未提交且仓库里有提交文件 => ReadyToSubmit
    /// - 其余 => NotSubmitted
    pub fn derive(submission: Option<&StudentSubmission>, file_present: bool) -> Self {
        if let Some(submission) = submission {
            match (submission.state, submission.assigned_grade) {
                (SubmissionState::Returned, Some(_)) => return AssignmentStatus::Graded,
                (state, _) if state.is_turned_in() => return AssignmentStatus::Submitted,
                _ => {}
            }
        }
        if file_present {
            AssignmentStatus::ReadyToSubmit
        } else {
            AssignmentStatus::NotSubmitted
        }
    }

    pub fn is_complete(&self) -> bool {
        matches!(self, AssignmentStatus::Submitted | AssignmentStatus::Graded)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AssignmentStatus::NotSubmitted => "NotSubmitted",
            AssignmentStatus::ReadyToSubmit => "ReadyToSubmit",
            AssignmentStatus::Submitted => "Submitted",
            AssignmentStatus::Graded => "Graded",
        }
    }
}

/// 作业视图：课程作业 + 学生提交记录 + 仓库文件是否存在 的融合结果
///
/// 每次读取都重新构造，不做持久化。
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AssignmentView {
    pub id: String,
    pub course_id: String,
    pub course_name: String,
    pub title: String,
    pub description: Option<String>,
    pub due_date: Option<NaiveDate>,
    pub status: AssignmentStatus,
    pub grade: Option<f64>,
    pub max_points: Option<f64>,
    // Classroom 上本人提交记录的状态，没有记录时为空
    #[serde(skip_serializing_if = "Option::is_none")]
    pub submission_state: Option<SubmissionState>,
    // 未能完整解析时的原因，状态会降级为 NotSubmitted
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unresolved: Option<String>,
}

impl AssignmentView {
    pub fn new(
        item: &CourseworkItem,
        course_name: &str,
        submission: Option<&StudentSubmission>,
        file_present: bool,
    ) -> Self {
        let status = AssignmentStatus::derive(submission, file_present);
        let grade = match status {
            AssignmentStatus::Graded => submission.and_then(|s| s.assigned_grade),
            _ => None,
        };
        Self {
            id: item.id.clone(),
            course_id: item.course_id.clone(),
            course_name: course_name.to_string(),
            title: item.title.clone(),
            description: item.description.clone(),
            due_date: item.due_date,
            status,
            grade,
            max_points: item.max_points,
            submission_state: submission.map(|s| s.state),
            unresolved: None,
        }
    }

    /// 无法解析的条目：保留在列表里，状态降级为 NotSubmitted
    pub fn unresolved(item: &CourseworkItem, course_name: &str, reason: impl Into<String>) -> Self {
        Self {
            unresolved: Some(reason.into()),
            ..Self::new(item, course_name, None, false)
        }
    }

    pub fn is_unresolved(&self) -> bool {
        self.unresolved.is_some()
    }

    pub fn due_at(&self) -> Option<chrono::DateTime<chrono::Utc>> {
        self.due_date.map(due_instant)
    }

    /// 还原出执行提交所需的课程作业
    pub fn coursework(&self) -> CourseworkItem {
        CourseworkItem {
            course_id: self.course_id.clone(),
            id: self.id.clone(),
            title: self.title.clone(),
            description: self.description.clone(),
            due_date: self.due_date,
            max_points: self.max_points,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn submission(state: SubmissionState, grade: Option<f64>) -> StudentSubmission {
        StudentSubmission {
            id: "sub-1".to_string(),
            course_id: "c1".to_string(),
            course_work_id: "w1".to_string(),
            state,
            assigned_grade: grade,
            attachments: vec![],
        }
    }

    #[test]
    fn test_graded_requires_returned_with_grade() {
        let returned = submission(SubmissionState::Returned, Some(9.5));
        assert_eq!(
            AssignmentStatus::derive(Some(&returned), true),
            AssignmentStatus::Graded
        );

        // 没有分数的 RETURNED 仍然算已提交
        let returned_ungraded = submission(SubmissionState::Returned, None);
        assert_eq!(
            AssignmentStatus::derive(Some(&returned_ungraded), true),
            AssignmentStatus::Submitted
        );
    }

    #[test]
    fn test_turned_in_wins_over_local_file() {
        let turned_in = submission(SubmissionState::TurnedIn, None);
        assert_eq!(
            AssignmentStatus::derive(Some(&turned_in), true),
            AssignmentStatus::Submitted
        );
    }

    #[test]
    fn test_ready_only_when_file_present() {
        for state in [
            SubmissionState::New,
            SubmissionState::Created,
            SubmissionState::ReclaimedByStudent,
            SubmissionState::SubmissionStateUnspecified,
        ] {
            let s = submission(state, None);
            assert_eq!(
                AssignmentStatus::derive(Some(&s), true),
                AssignmentStatus::ReadyToSubmit
            );
            assert_eq!(
                AssignmentStatus::derive(Some(&s), false),
                AssignmentStatus::NotSubmitted
            );
        }
        assert_eq!(
            AssignmentStatus::derive(None, true),
            AssignmentStatus::ReadyToSubmit
        );
        assert_eq!(
            AssignmentStatus::derive(None, false),
            AssignmentStatus::NotSubmitted
        );
    }

    #[test]
    fn test_view_grade_only_when_graded() {
        let item = CourseworkItem {
            course_id: "c1".to_string(),
            id: "w1".to_string(),
            title: "HW1".to_string(),
            description: None,
            due_date: None,
            max_points: Some(10.0),
        };
        let graded = AssignmentView::new(
            &item,
            "CS101",
            Some(&submission(SubmissionState::Returned, Some(8.0))),
            false,
        );
        assert_eq!(graded.status, AssignmentStatus::Graded);
        assert_eq!(graded.grade, Some(8.0));

        // TURNED_IN 时即使远程带了分数（草稿分）也不展示
        let draft = AssignmentView::new(
            &item,
            "CS101",
            Some(&submission(SubmissionState::TurnedIn, Some(7.0))),
            false,
        );
        assert_eq!(draft.status, AssignmentStatus::Submitted);
        assert_eq!(draft.grade, None);
    }

    #[test]
    fn test_unresolved_view_degrades_to_not_submitted() {
        let item = CourseworkItem {
            course_id: "c1".to_string(),
            id: "w2".to_string(),
            title: "HW2".to_string(),
            description: None,
            due_date: None,
            max_points: None,
        };
        let view = AssignmentView::unresolved(&item, "CS101", "timeout");
        assert_eq!(view.status, AssignmentStatus::NotSubmitted);
        assert!(view.is_unresolved());
        assert_eq!(view.coursework(), item);
    }
}
