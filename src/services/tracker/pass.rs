//! 一轮对账的状态机
//!
//! Idle -> FetchingCourses -> FetchingCoursework -> ResolvingStatus
//!      -> SelectingEligible -> SubmittingEach -> Notifying -> Idle

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use super::{AssignmentTracker, HeldItem};
use super::messages::{Notice, attempt_notice, reminder_notice};
use crate::adapters::Identity;
use crate::errors::{Result, TrackerError};
use crate::models::assignments::entities::AssignmentView;
use crate::models::reconcile::entities::{
    PassOutcome, PassPhase, PassReport, SubmissionAttempt, SubmissionStep,
};
use crate::services::decision::{select_eligible, select_reminders};
use crate::services::executor::{SubmissionExecutor, classify_failure};
use crate::utils::submission_path;

impl AssignmentTracker {
    pub(super) async fn drive_pass(
        &self,
        identity: &Identity,
        now: DateTime<Utc>,
        mut report: PassReport,
    ) -> Result<PassReport> {
        let session = self.connector.connect(identity)?;
        let resolver = self.resolver(session.classroom.as_ref());

        report.phase = PassPhase::FetchingCourses;
        let courses = match resolver.fetch_courses().await {
            Ok(courses) => courses,
            Err(e) if e.is_fatal() => return Err(e),
            Err(e) => {
                // 没有课程列表就没有任何可做的事
                warn!("Failed to fetch courses, aborting pass: {}", e);
                return Ok(report.finish(PassOutcome::Aborted {
                    reason: e.to_string(),
                }));
            }
        };

        report.phase = PassPhase::FetchingCoursework;
        let pending = resolver.fetch_coursework(&courses).await?;

        report.phase = PassPhase::ResolvingStatus;
        let views = resolver.resolve(&pending).await?;
        report.unresolved = views.iter().filter(|v| v.is_unresolved()).count();
        report.resolved = views.len() - report.unresolved;

        report.phase = PassPhase::SelectingEligible;
        let lead_time = self.settings.lead_time;
        let eligible = select_eligible(&views, now, lead_time);
        report.eligible = eligible.len();
        let reminders: Vec<&AssignmentView> = if self.settings.send_reminders {
            select_reminders(&views, now, lead_time)
                .into_iter()
                .filter(|v| !self.reminded.contains_key(&item_key(v)))
                .collect()
        } else {
            Vec::new()
        };
        debug!(
            eligible = eligible.len(),
            reminders = reminders.len(),
            "Selected items"
        );

        report.phase = PassPhase::SubmittingEach;
        let (eligible, held) = self.without_held(eligible);
        report.held = held;
        let executor = SubmissionExecutor::new(
            &session,
            &self.settings.submission_filename,
            self.settings.reuse_existing_attachment,
        );
        let mut fatal = None;
        for (index, view) in eligible.iter().enumerate() {
            if self.shutdown.is_cancelled() {
                report.interrupted = eligible.len() - index;
                info!(
                    remaining = report.interrupted,
                    "Shutdown requested, stopping before next submission"
                );
                break;
            }
            match self.submit_one(&executor, view).await {
                Ok(attempt) => {
                    self.track_attention(view, &attempt);
                    report.record(attempt);
                }
                Err(e) => {
                    fatal = Some(e);
                    break;
                }
            }
        }

        // 凭据中途失效时，已完成的尝试仍然要通知
        report.phase = PassPhase::Notifying;
        let notices: Vec<Notice> = report.attempts.iter().filter_map(attempt_notice).collect();
        for notice in &notices {
            self.deliver(notice).await;
        }
        if let Some(e) = fatal {
            warn!("Credential rejected during submission, aborting pass: {}", e);
            return Err(e);
        }

        for view in reminders {
            if self.deliver(&reminder_notice(view)).await {
                self.reminded
                    .insert(item_key(view), view.due_at().unwrap_or(now));
                report.reminders_sent += 1;
            }
        }

        // 截止时刻已过的提醒记录不会再用到
        self.reminded.retain(|_, due| *due > now);
        for view in views.iter().filter(|v| v.status.is_complete()) {
            self.held.remove(&item_key(view));
        }

        Ok(report.finish(PassOutcome::Completed))
    }

    /// 剔除上次需要人工处理且提交记录状态没有变化的条目，返回剩余条目和剔除数量
    fn without_held<'v>(&self, eligible: Vec<&'v AssignmentView>) -> (Vec<&'v AssignmentView>, usize) {
        let before = eligible.len();
        let ready: Vec<&AssignmentView> = eligible
            .into_iter()
            .filter(|view| {
                let key = item_key(view);
                let held_state = self.held.get(&key).map(|h| h.submission_state);
                match held_state {
                    Some(state) if state == view.submission_state => {
                        debug!(title = %view.title, "Held since last rejection, skipping");
                        false
                    }
                    Some(_) => {
                        // 远程状态变了，重新尝试
                        self.held.remove(&key);
                        true
                    }
                    None => true,
                }
            })
            .collect();
        let held = before - ready.len();
        (ready, held)
    }

    fn track_attention(&self, view: &AssignmentView, attempt: &SubmissionAttempt) {
        let key = item_key(view);
        if attempt.needs_attention() {
            self.held.insert(
                key,
                HeldItem {
                    title: view.title.clone(),
                    submission_state: view.submission_state,
                },
            );
        } else {
            self.held.remove(&key);
        }
    }

    /// 读取提交文件并执行提交协议
    async fn submit_one(
        &self,
        executor: &SubmissionExecutor<'_>,
        view: &AssignmentView,
    ) -> Result<SubmissionAttempt> {
        let item = view.coursework();
        let content = match submission_path(&item.title, &self.settings.submission_filename) {
            Ok(path) => match self.repository.read(&path).await {
                Ok(Some(content)) => Ok(content),
                Ok(None) => Err(TrackerError::not_found(format!(
                    "{path} disappeared before it could be read"
                ))),
                Err(e) => Err(e),
            },
            Err(e) => Err(e),
        };

        match content {
            Ok(content) => executor.submit(&item, &content).await,
            Err(e) => {
                warn!(title = %item.title, "Failed to read submission file: {}", e);
                let mut attempt = SubmissionAttempt::new(&item.course_id, &item.id, &item.title);
                attempt.result = classify_failure(SubmissionStep::Read, e)?;
                Ok(attempt)
            }
        }
    }

    /// 发送通知，失败只记日志
    async fn deliver(&self, notice: &Notice) -> bool {
        match self.notifier.notify(&notice.subject, &notice.body).await {
            Ok(()) => true,
            Err(e) => {
                warn!(subject = %notice.subject, "Failed to send notification: {}", e);
                false
            }
        }
    }
}

fn item_key(view: &AssignmentView) -> (String, String) {
    (view.course_id.clone(), view.id.clone())
}
