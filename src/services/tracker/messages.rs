use crate::models::assignments::entities::AssignmentView;
use crate::models::reconcile::entities::{AttemptResult, FailureCause, SubmissionAttempt};

/// 一封通知邮件
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub subject: String,
    pub body: String,
}

/// 提交尝试对应的通知；已提交的条目不打扰
pub fn attempt_notice(attempt: &SubmissionAttempt) -> Option<Notice> {
    let title = &attempt.title;
    match &attempt.result {
        AttemptResult::Submitted => Some(Notice {
            subject: format!("Submitted: {title}"),
            body: format!(
                "Your assignment '{title}' was turned in automatically from the repository submission file."
            ),
        }),
        AttemptResult::Failed {
            step,
            cause: FailureCause::Rejected,
            message,
        } => Some(Notice {
            subject: format!("Action needed: {title}"),
            body: format!(
                "Automatic submission of '{title}' was rejected at the {} step: {message}. It will not be retried until the assignment changes in Classroom or the submission file is uploaded again.",
                step.as_str()
            ),
        }),
        AttemptResult::Failed {
            step,
            cause: FailureCause::Transient,
            message,
        } => Some(Notice {
            subject: format!("Auto-submission deferred: {title}"),
            body: format!(
                "Automatic submission of '{title}' failed at the {} step: {message}. It will be retried on the next pass.",
                step.as_str()
            ),
        }),
        AttemptResult::NoSubmissionRecord => Some(Notice {
            subject: format!("Action needed: {title}"),
            body: format!(
                "Your assignment '{title}' has a submission file ready, but Classroom has no submission record for you. Please submit it manually."
            ),
        }),
        AttemptResult::AlreadySubmitted => None,
    }
}

pub fn reminder_notice(view: &AssignmentView) -> Notice {
    let title = &view.title;
    Notice {
        subject: format!("Urgent: {title} due soon"),
        body: format!(
            "Your assignment '{title}' is due soon, but the submission file hasn't been uploaded to GitHub yet. Please upload it as soon as possible."
        ),
    }
}
