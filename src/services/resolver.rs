//! 提交状态解析
//!
//! 把 Classroom 的课程作业、本人提交记录与版本库中的提交文件合并为
//! [`AssignmentView`]。单个条目查询失败只影响该条目（标记为未解析），
//! 只有凭据失效才会中止整个解析。

use futures_util::{FutureExt, StreamExt, TryStreamExt, stream};
use tracing::{debug, warn};

use crate::adapters::{ClassroomApi, SubmissionRepository};
use crate::errors::Result;
use crate::models::assignments::entities::AssignmentView;
use crate::models::classroom::entities::{Course, CourseworkItem};
use crate::utils::submission_path;

/// 等待解析的作业及其课程名
#[derive(Debug, Clone)]
pub struct PendingItem {
    pub item: CourseworkItem,
    pub course_name: String,
}

pub struct SubmissionResolver<'a> {
    classroom: &'a dyn ClassroomApi,
    repository: &'a dyn SubmissionRepository,
    submission_filename: &'a str,
    max_concurrency: usize,
}

impl<'a> SubmissionResolver<'a> {
    pub fn new(
        classroom: &'a dyn ClassroomApi,
        repository: &'a dyn SubmissionRepository,
        submission_filename: &'a str,
        max_concurrency: usize,
    ) -> Self {
        Self {
            classroom,
            repository,
            submission_filename,
            max_concurrency: max_concurrency.max(1),
        }
    }

    /// 课程列表，失败时没有任何可展示的内容，直接返回错误
    pub async fn fetch_courses(&self) -> Result<Vec<Course>> {
        self.classroom.list_courses().await
    }

    /// 逐门课程拉取作业；某门课程拉取失败时跳过该课程
    pub async fn fetch_coursework(&self, courses: &[Course]) -> Result<Vec<PendingItem>> {
        let mut pending = Vec::new();
        for course in courses {
            match self.classroom.list_course_work(&course.id).await {
                Ok(items) => {
                    debug!(course_id = %course.id, count = items.len(), "Fetched coursework");
                    pending.extend(items.into_iter().map(|item| PendingItem {
                        item,
                        course_name: course.name.clone(),
                    }));
                }
                Err(e) if e.is_fatal() => return Err(e),
                Err(e) => {
                    warn!(course_id = %course.id, "Skipping course, failed to list coursework: {}", e);
                }
            }
        }
        Ok(pending)
    }

    /// 并发解析所有条目，结果顺序与输入一致
    pub async fn resolve(&self, pending: &[PendingItem]) -> Result<Vec<AssignmentView>> {
        // 先装箱成具名的 Send future，整个 future 才能交给 tokio::spawn
        let lookups: Vec<_> = pending
            .iter()
            .map(|p| self.resolve_one(&p.item, &p.course_name).boxed())
            .collect();
        stream::iter(lookups)
            .buffered(self.max_concurrency)
            .try_collect()
            .await
    }

    /// 课程 -> 作业 -> 状态，一次完成（仪表盘只读路径）
    pub async fn resolve_all(&self) -> Result<Vec<AssignmentView>> {
        let courses = self.fetch_courses().await?;
        let pending = self.fetch_coursework(&courses).await?;
        self.resolve(&pending).await
    }

    async fn resolve_one(&self, item: &CourseworkItem, course_name: &str) -> Result<AssignmentView> {
        let submission = match self.classroom.my_submission(&item.course_id, &item.id).await {
            Ok(submission) => submission,
            Err(e) if e.is_fatal() => return Err(e),
            Err(e) => {
                warn!(course_work_id = %item.id, title = %item.title, "Failed to look up submission: {}", e);
                return Ok(AssignmentView::unresolved(item, course_name, e.to_string()));
            }
        };

        // 已经交过的不需要再看仓库
        if submission.as_ref().is_some_and(|s| s.state.is_turned_in()) {
            return Ok(AssignmentView::new(item, course_name, submission.as_ref(), false));
        }

        let path = match submission_path(&item.title, self.submission_filename) {
            Ok(path) => path,
            Err(e) => {
                warn!(course_work_id = %item.id, "Cannot map title to repository path: {}", e);
                return Ok(AssignmentView::unresolved(item, course_name, e.to_string()));
            }
        };

        match self.repository.exists(&path).await {
            Ok(file_present) => Ok(AssignmentView::new(
                item,
                course_name,
                submission.as_ref(),
                file_present,
            )),
            Err(e) if e.is_fatal() => Err(e),
            Err(e) => {
                warn!(path = %path, "Failed to probe repository: {}", e);
                Ok(AssignmentView::unresolved(item, course_name, e.to_string()))
            }
        }
    }
}
