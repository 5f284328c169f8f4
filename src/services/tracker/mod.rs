//! 作业追踪核心
//!
//! `AssignmentTracker` 持有长期存在的适配器（凭据、版本库、通知），
//! Classroom 会话则按身份在每轮对账/每个请求时创建。
//!
//! 对外提供两条路径：
//! - 读路径 [`AssignmentTracker::dashboard_view`]：解析出全部作业视图
//! - 写路径 [`AssignmentTracker::run_reconciliation_pass`]：自动提交到期作业

mod messages;
mod pass;

use chrono::{DateTime, TimeDelta, Utc};
use dashmap::DashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, info, info_span, warn};

use crate::adapters::{
    Adapters, ClassroomApi, ClassroomConnector, CredentialProvider, Identity, Notifier,
    SubmissionRepository,
};
use crate::config::AppConfig;
use crate::errors::{Result, TrackerError};
use crate::models::assignments::entities::AssignmentView;
use crate::models::assignments::responses::ManualSubmissionResponse;
use crate::models::classroom::entities::SubmissionState;
use crate::models::reconcile::entities::{PassOutcome, PassReport};
use crate::services::resolver::{PendingItem, SubmissionResolver};
use crate::utils::submission_path;

/// 对账相关参数
#[derive(Debug, Clone)]
pub struct ReconcileSettings {
    pub lead_time: TimeDelta,
    pub max_concurrency: usize,
    pub submission_filename: String,
    pub commit_message: String,
    pub reuse_existing_attachment: bool,
    pub send_reminders: bool,
    // 手动上传的提交文件大小上限（字节）
    pub max_upload_bytes: usize,
}

impl ReconcileSettings {
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let lead_time = TimeDelta::try_seconds(config.reconcile.lead_time_secs).ok_or_else(|| {
            TrackerError::configuration(format!(
                "reconcile.lead_time_secs is out of range: {}",
                config.reconcile.lead_time_secs
            ))
        })?;
        Ok(Self {
            lead_time,
            max_concurrency: config.reconcile.max_concurrency.max(1),
            submission_filename: config.github.submission_filename.clone(),
            commit_message: config.github.commit_message.clone(),
            reuse_existing_attachment: config.reconcile.reuse_existing_attachment,
            send_reminders: config.reconcile.send_reminders,
            max_upload_bytes: config.server.max_payload_size,
        })
    }

    /// 提交信息模板中的 `{title}` 替换为作业标题
    pub fn commit_message_for(&self, title: &str) -> String {
        self.commit_message.replace("{title}", title)
    }
}

pub struct AssignmentTracker {
    credentials: Arc<dyn CredentialProvider>,
    connector: Arc<dyn ClassroomConnector>,
    repository: Arc<dyn SubmissionRepository>,
    notifier: Arc<dyn Notifier>,
    settings: ReconcileSettings,
    // 同一时刻只允许一轮对账
    running: AtomicBool,
    // 已提醒过的作业 (course_id, course_work_id) -> 截止时刻
    reminded: DashMap<(String, String), DateTime<Utc>>,
    // 没有提交记录或被远程拒绝的作业，提交记录状态变化或重新上传文件前不再尝试
    held: DashMap<(String, String), HeldItem>,
    shutdown: CancellationToken,
}

/// 等待人工处理的作业
#[derive(Debug, Clone)]
struct HeldItem {
    title: String,
    submission_state: Option<SubmissionState>,
}

/// 释放时清除运行标记
struct RunGuard<'a>(&'a AtomicBool);

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl AssignmentTracker {
    pub fn new(adapters: Adapters, settings: ReconcileSettings) -> Self {
        Self {
            credentials: adapters.credentials,
            connector: adapters.connector,
            repository: adapters.repository,
            notifier: adapters.notifier,
            settings,
            running: AtomicBool::new(false),
            reminded: DashMap::new(),
            held: DashMap::new(),
            shutdown: CancellationToken::new(),
        }
    }

    pub fn settings(&self) -> &ReconcileSettings {
        &self.settings
    }

    /// 停机信号；取消后进行中的对账在当前条目完成后停止
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    fn try_begin(&self) -> Option<RunGuard<'_>> {
        self.running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| RunGuard(&self.running))
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    fn resolver<'a>(&'a self, classroom: &'a dyn ClassroomApi) -> SubmissionResolver<'a> {
        SubmissionResolver::new(
            classroom,
            self.repository.as_ref(),
            &self.settings.submission_filename,
            self.settings.max_concurrency,
        )
    }

    /// 仪表盘：全部课程的全部作业视图
    pub async fn dashboard_view(&self, identity: &Identity) -> Result<Vec<AssignmentView>> {
        let session = self.connector.connect(identity)?;
        self.resolver(session.classroom.as_ref()).resolve_all().await
    }

    /// 单个作业详情；课程或作业不存在时返回 None
    pub async fn assignment_detail(
        &self,
        identity: &Identity,
        course_id: &str,
        course_work_id: &str,
    ) -> Result<Option<AssignmentView>> {
        let session = self.connector.connect(identity)?;
        let resolver = self.resolver(session.classroom.as_ref());

        let courses = resolver.fetch_courses().await?;
        let Some(course) = courses.into_iter().find(|c| c.id == course_id) else {
            return Ok(None);
        };
        let item = match session.classroom.list_course_work(&course.id).await {
            Ok(items) => items.into_iter().find(|i| i.id == course_work_id),
            Err(TrackerError::NotFound(_)) => None,
            Err(e) => return Err(e),
        };
        let Some(item) = item else {
            return Ok(None);
        };

        let pending = [PendingItem {
            item,
            course_name: course.name,
        }];
        Ok(resolver.resolve(&pending).await?.into_iter().next())
    }

    /// 用凭据提供方给出的身份跑一轮（定时调度使用）
    pub async fn run_scheduled_pass(&self) -> Result<PassReport> {
        let identity = self.credentials.identity().await?;
        self.run_reconciliation_pass(&identity).await
    }

    pub async fn run_reconciliation_pass(&self, identity: &Identity) -> Result<PassReport> {
        self.run_pass_at(identity, Utc::now()).await
    }

    /// 以指定的当前时间跑一轮对账
    ///
    /// 凭据失效时返回 `Err`，由调用方触发重新认证；
    /// 其余失败都记录在返回的 [`PassReport`] 中。
    pub async fn run_pass_at(&self, identity: &Identity, now: DateTime<Utc>) -> Result<PassReport> {
        let report = PassReport::begin();
        let Some(_guard) = self.try_begin() else {
            warn!("Previous reconciliation pass is still running, skipping");
            return Ok(report.finish(PassOutcome::Skipped));
        };

        let span = info_span!("reconcile_pass", pass_id = %report.pass_id);
        let report = self.drive_pass(identity, now, report).instrument(span).await?;
        info!(
            pass_id = %report.pass_id,
            resolved = report.resolved,
            unresolved = report.unresolved,
            eligible = report.eligible,
            submitted = report.submitted,
            deferred = report.deferred,
            held = report.held,
            reminders = report.reminders_sent,
            "Reconciliation pass finished"
        );
        Ok(report)
    }

    /// 手动提交：把文件写入 `{title}/{submission_filename}`
    pub async fn upload_submission(
        &self,
        title: &str,
        content: &[u8],
    ) -> Result<ManualSubmissionResponse> {
        let path = submission_path(title, &self.settings.submission_filename)?;
        if content.is_empty() {
            return Err(TrackerError::validation("Submission file is empty"));
        }
        let message = self.settings.commit_message_for(title);
        let kind = self.repository.write(&path, content, &message).await?;
        info!(path = %path, kind = ?kind, size = content.len(), "Submission file written");
        // 文件更新过，之前被拒绝的同名作业可以再试
        self.held.retain(|_, held| held.title != title);
        Ok(ManualSubmissionResponse {
            path,
            kind,
            size: content.len(),
        })
    }
}
