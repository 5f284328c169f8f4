//! 提交执行器
//!
//! 上传 -> 附加 -> 交作业，三个远程步骤按顺序执行，任一步失败即停止。
//! 交作业失败时提交记录停留在"已附加未提交"状态，下一轮会再次尝试。

use tracing::{debug, info, warn};

use crate::adapters::ClassroomSession;
use crate::errors::{Result, TrackerError};
use crate::models::classroom::entities::{BlobRef, CourseworkItem};
use crate::models::reconcile::entities::{
    AttemptResult, FailureCause, SubmissionAttempt, SubmissionStep,
};

/// 把某一步的错误归类为尝试结果；凭据失效直接向上传播
pub fn classify_failure(step: SubmissionStep, err: TrackerError) -> Result<AttemptResult> {
    if err.is_fatal() {
        return Err(err);
    }
    let cause = if err.is_retryable() {
        FailureCause::Transient
    } else {
        FailureCause::Rejected
    };
    Ok(AttemptResult::Failed {
        step,
        cause,
        message: err.to_string(),
    })
}

pub struct SubmissionExecutor<'a> {
    session: &'a ClassroomSession,
    filename: &'a str,
    // 提交记录上已有同名附件时直接复用，不再重复上传
    reuse_existing_attachment: bool,
}

impl<'a> SubmissionExecutor<'a> {
    pub fn new(session: &'a ClassroomSession, filename: &'a str, reuse_existing_attachment: bool) -> Self {
        Self {
            session,
            filename,
            reuse_existing_attachment,
        }
    }

    pub async fn submit(&self, item: &CourseworkItem, content: &[u8]) -> Result<SubmissionAttempt> {
        let mut attempt = SubmissionAttempt::new(&item.course_id, &item.id, &item.title);
        attempt.content_bytes = Some(content.len());
        let classroom = &self.session.classroom;

        let submission = match classroom.my_submission(&item.course_id, &item.id).await {
            Ok(Some(submission)) => submission,
            Ok(None) => {
                warn!(course_work_id = %item.id, title = %item.title, "No submission record for current student");
                attempt.result = AttemptResult::NoSubmissionRecord;
                return Ok(attempt);
            }
            Err(e) => {
                attempt.result = classify_failure(SubmissionStep::Lookup, e)?;
                return Ok(attempt);
            }
        };

        if submission.state.is_turned_in() {
            debug!(course_work_id = %item.id, "Already turned in, nothing to do");
            attempt.result = AttemptResult::AlreadySubmitted;
            return Ok(attempt);
        }

        let existing = self
            .reuse_existing_attachment
            .then(|| submission.attachment_named(self.filename).cloned())
            .flatten();

        match existing {
            Some(blob) => {
                debug!(course_work_id = %item.id, blob_id = %blob.id, "Reusing existing attachment");
                attempt.staged = Some(blob);
                attempt.attached = true;
            }
            None => {
                let blob: BlobRef = match self.session.blobs.upload_blob(content, self.filename).await {
                    Ok(blob) => blob,
                    Err(e) => {
                        attempt.result = classify_failure(SubmissionStep::Stage, e)?;
                        return Ok(attempt);
                    }
                };
                attempt.staged = Some(blob.clone());

                if let Err(e) = classroom
                    .attach_blob(&item.course_id, &item.id, &submission.id, &blob)
                    .await
                {
                    attempt.result = classify_failure(SubmissionStep::Attach, e)?;
                    return Ok(attempt);
                }
                attempt.attached = true;
            }
        }

        if let Err(e) = classroom
            .turn_in(&item.course_id, &item.id, &submission.id)
            .await
        {
            attempt.result = classify_failure(SubmissionStep::TurnIn, e)?;
            return Ok(attempt);
        }
        attempt.turned_in = true;
        attempt.result = AttemptResult::Submitted;

        info!(course_work_id = %item.id, title = %item.title, "Assignment turned in");
        Ok(attempt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::{ClassroomConnector, Identity};
    use crate::models::classroom::entities::SubmissionState;
    use crate::test_support::{Call, FakeClassroom, FakeConnector, Op, coursework, submission};
    use std::sync::Arc;

    fn session(classroom: &Arc<FakeClassroom>) -> ClassroomSession {
        FakeConnector(classroom.clone())
            .connect(&Identity::bearer("token"))
            .unwrap()
    }

    fn setup(state: SubmissionState) -> (Arc<FakeClassroom>, CourseworkItem) {
        let classroom = FakeClassroom::new();
        classroom.add_course("c1", "CS101");
        let item = coursework("c1", "w1", "HW1", None);
        classroom.add_submission(submission(&item, "s1", state));
        classroom.add_coursework(item.clone());
        (classroom, item)
    }

    #[tokio::test]
    async fn test_stage_attach_turn_in_in_order() {
        let (classroom, item) = setup(SubmissionState::Created);
        let session = session(&classroom);
        let executor = SubmissionExecutor::new(&session, "submission.txt", true);

        let attempt = executor.submit(&item, b"answer").await.unwrap();
        assert!(attempt.is_success());
        assert!(attempt.attached && attempt.turned_in);
        assert_eq!(attempt.content_bytes, Some(6));

        assert_eq!(
            classroom.calls(),
            vec![
                Call::Upload {
                    filename: "submission.txt".to_string(),
                    content: b"answer".to_vec(),
                },
                Call::Attach {
                    course_work_id: "w1".to_string(),
                    submission_id: "s1".to_string(),
                    blob_id: "blob-1".to_string(),
                },
                Call::TurnIn {
                    course_work_id: "w1".to_string(),
                    submission_id: "s1".to_string(),
                },
            ]
        );
    }

    #[tokio::test]
    async fn test_already_turned_in_makes_no_remote_calls() {
        let (classroom, item) = setup(SubmissionState::TurnedIn);
        let session = session(&classroom);
        let executor = SubmissionExecutor::new(&session, "submission.txt", true);

        let attempt = executor.submit(&item, b"answer").await.unwrap();
        assert_eq!(attempt.result, AttemptResult::AlreadySubmitted);
        assert!(classroom.calls().is_empty());
    }

    #[tokio::test]
    async fn test_missing_record_is_reported() {
        let classroom = FakeClassroom::new();
        let item = coursework("c1", "w9", "HW9", None);
        let session = session(&classroom);
        let executor = SubmissionExecutor::new(&session, "submission.txt", true);

        let attempt = executor.submit(&item, b"answer").await.unwrap();
        assert_eq!(attempt.result, AttemptResult::NoSubmissionRecord);
        assert!(attempt.needs_attention());
        assert!(classroom.calls().is_empty());
    }

    #[tokio::test]
    async fn test_turn_in_failure_leaves_attached_submission() {
        let (classroom, item) = setup(SubmissionState::Created);
        classroom.fail(Op::TurnIn, "w1", TrackerError::transient("HTTP 503"));
        let session = session(&classroom);
        let executor = SubmissionExecutor::new(&session, "submission.txt", true);

        let attempt = executor.submit(&item, b"answer").await.unwrap();
        assert!(!attempt.is_success());
        assert!(attempt.attached);
        assert!(!attempt.turned_in);
        assert!(matches!(
            attempt.result,
            AttemptResult::Failed {
                step: SubmissionStep::TurnIn,
                cause: FailureCause::Transient,
                ..
            }
        ));
        assert!(!attempt.needs_attention());

        let remote = classroom.submission_for("w1").unwrap();
        assert_eq!(remote.state, SubmissionState::Created);
        assert_eq!(remote.attachments.len(), 1);
    }

    #[tokio::test]
    async fn test_retry_reuses_existing_attachment() {
        let (classroom, item) = setup(SubmissionState::Created);
        classroom.fail(Op::TurnIn, "w1", TrackerError::transient("HTTP 503"));
        let session = session(&classroom);
        let executor = SubmissionExecutor::new(&session, "submission.txt", true);
        executor.submit(&item, b"answer").await.unwrap();

        classroom.clear_failures();
        let attempt = executor.submit(&item, b"answer").await.unwrap();
        assert!(attempt.is_success());

        let remote = classroom.submission_for("w1").unwrap();
        assert_eq!(remote.attachments.len(), 1);
        assert_eq!(remote.state, SubmissionState::TurnedIn);
    }

    #[tokio::test]
    async fn test_retry_without_reuse_attaches_again() {
        let (classroom, item) = setup(SubmissionState::Created);
        classroom.fail(Op::TurnIn, "w1", TrackerError::transient("HTTP 503"));
        let session = session(&classroom);
        let executor = SubmissionExecutor::new(&session, "submission.txt", false);
        executor.submit(&item, b"answer").await.unwrap();

        classroom.clear_failures();
        executor.submit(&item, b"answer").await.unwrap();
        assert_eq!(classroom.submission_for("w1").unwrap().attachments.len(), 2);
    }

    #[tokio::test]
    async fn test_rejected_upload_stops_before_attach() {
        let (classroom, item) = setup(SubmissionState::Created);
        classroom.fail(Op::Upload, "", TrackerError::remote("HTTP 400: bad file"));
        let session = session(&classroom);
        let executor = SubmissionExecutor::new(&session, "submission.txt", true);

        let attempt = executor.submit(&item, b"answer").await.unwrap();
        assert!(matches!(
            attempt.result,
            AttemptResult::Failed {
                step: SubmissionStep::Stage,
                cause: FailureCause::Rejected,
                ..
            }
        ));
        assert!(attempt.needs_attention());
        assert!(classroom.calls().is_empty());
    }

    #[tokio::test]
    async fn test_auth_failure_propagates() {
        let (classroom, item) = setup(SubmissionState::Created);
        classroom.fail(Op::Attach, "w1", TrackerError::authentication("HTTP 401"));
        let session = session(&classroom);
        let executor = SubmissionExecutor::new(&session, "submission.txt", true);

        let err = executor.submit(&item, b"answer").await.unwrap_err();
        assert!(err.is_fatal());
    }
}
