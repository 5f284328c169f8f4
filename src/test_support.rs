//! 测试用的内存实现
//!
//! 记录所有会改变远程状态的调用，并支持按操作注入失败。

use chrono::NaiveDate;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::adapters::{
    BlobStore, ClassroomApi, ClassroomConnector, ClassroomSession, CredentialProvider, Identity,
    Notifier, SubmissionRepository,
};
use crate::errors::{Result, TrackerError};
use crate::models::classroom::entities::{
    BlobRef, Course, CourseworkItem, StudentSubmission, SubmissionState,
};
use crate::models::repository::entities::{RepositoryFile, WriteKind};

/// 可注入失败的操作
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) enum Op {
    ListCourses,
    ListCourseWork,
    ListSubmissions,
    Upload,
    Attach,
    TurnIn,
}

/// 会改变远程状态的调用
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Call {
    Upload {
        filename: String,
        content: Vec<u8>,
    },
    Attach {
        course_work_id: String,
        submission_id: String,
        blob_id: String,
    },
    TurnIn {
        course_work_id: String,
        submission_id: String,
    },
}

#[derive(Default)]
struct ClassroomState {
    courses: Vec<Course>,
    course_work: HashMap<String, Vec<CourseworkItem>>,
    submissions: HashMap<String, Vec<StudentSubmission>>,
    calls: Vec<Call>,
    // (操作, course_id 或 course_work_id，空串表示任意)
    failures: HashMap<(Op, String), TrackerError>,
    next_blob: usize,
}

#[derive(Default)]
pub(crate) struct FakeClassroom {
    state: Mutex<ClassroomState>,
}

pub(crate) fn coursework(course_id: &str, id: &str, title: &str, due: Option<NaiveDate>) -> CourseworkItem {
    CourseworkItem {
        course_id: course_id.to_string(),
        id: id.to_string(),
        title: title.to_string(),
        description: None,
        due_date: due,
        max_points: Some(100.0),
    }
}

pub(crate) fn submission(item: &CourseworkItem, id: &str, state: SubmissionState) -> StudentSubmission {
    StudentSubmission {
        id: id.to_string(),
        course_id: item.course_id.clone(),
        course_work_id: item.id.clone(),
        state,
        assigned_grade: None,
        attachments: vec![],
    }
}

impl FakeClassroom {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub(crate) fn add_course(&self, id: &str, name: &str) {
        let mut state = self.state.lock().unwrap();
        state.courses.push(Course {
            id: id.to_string(),
            name: name.to_string(),
        });
        state.course_work.entry(id.to_string()).or_default();
    }

    pub(crate) fn add_coursework(&self, item: CourseworkItem) {
        let mut state = self.state.lock().unwrap();
        state
            .course_work
            .entry(item.course_id.clone())
            .or_default()
            .push(item);
    }

    pub(crate) fn add_submission(&self, submission: StudentSubmission) {
        let mut state = self.state.lock().unwrap();
        state
            .submissions
            .entry(submission.course_work_id.clone())
            .or_default()
            .push(submission);
    }

    pub(crate) fn fail(&self, op: Op, key: &str, err: TrackerError) {
        let mut state = self.state.lock().unwrap();
        state.failures.insert((op, key.to_string()), err);
    }

    pub(crate) fn clear_failures(&self) {
        self.state.lock().unwrap().failures.clear();
    }

    pub(crate) fn calls(&self) -> Vec<Call> {
        self.state.lock().unwrap().calls.clone()
    }

    pub(crate) fn submission_for(&self, course_work_id: &str) -> Option<StudentSubmission> {
        let state = self.state.lock().unwrap();
        state
            .submissions
            .get(course_work_id)
            .and_then(|subs| subs.first().cloned())
    }

    fn check(state: &ClassroomState, op: Op, key: &str) -> Result<()> {
        for candidate in [key, ""] {
            if let Some(err) = state.failures.get(&(op, candidate.to_string())) {
                return Err(err.clone());
            }
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl ClassroomApi for FakeClassroom {
    async fn list_courses(&self) -> Result<Vec<Course>> {
        let state = self.state.lock().unwrap();
        Self::check(&state, Op::ListCourses, "")?;
        Ok(state.courses.clone())
    }

    async fn list_course_work(&self, course_id: &str) -> Result<Vec<CourseworkItem>> {
        let state = self.state.lock().unwrap();
        Self::check(&state, Op::ListCourseWork, course_id)?;
        Ok(state.course_work.get(course_id).cloned().unwrap_or_default())
    }

    async fn list_my_submissions(
        &self,
        _course_id: &str,
        course_work_id: &str,
    ) -> Result<Vec<StudentSubmission>> {
        let state = self.state.lock().unwrap();
        Self::check(&state, Op::ListSubmissions, course_work_id)?;
        Ok(state
            .submissions
            .get(course_work_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn attach_blob(
        &self,
        _course_id: &str,
        course_work_id: &str,
        submission_id: &str,
        blob: &BlobRef,
    ) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        Self::check(&state, Op::Attach, course_work_id)?;
        state.calls.push(Call::Attach {
            course_work_id: course_work_id.to_string(),
            submission_id: submission_id.to_string(),
            blob_id: blob.id.clone(),
        });
        let record = state
            .submissions
            .get_mut(course_work_id)
            .and_then(|subs| subs.iter_mut().find(|s| s.id == submission_id))
            .ok_or_else(|| TrackerError::not_found("submission not found"))?;
        record.attachments.push(blob.clone());
        Ok(())
    }

    async fn turn_in(
        &self,
        _course_id: &str,
        course_work_id: &str,
        submission_id: &str,
    ) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        Self::check(&state, Op::TurnIn, course_work_id)?;
        state.calls.push(Call::TurnIn {
            course_work_id: course_work_id.to_string(),
            submission_id: submission_id.to_string(),
        });
        let record = state
            .submissions
            .get_mut(course_work_id)
            .and_then(|subs| subs.iter_mut().find(|s| s.id == submission_id))
            .ok_or_else(|| TrackerError::not_found("submission not found"))?;
        record.state = SubmissionState::TurnedIn;
        Ok(())
    }
}

#[async_trait::async_trait]
impl BlobStore for FakeClassroom {
    async fn upload_blob(&self, content: &[u8], filename: &str) -> Result<BlobRef> {
        let mut state = self.state.lock().unwrap();
        Self::check(&state, Op::Upload, "")?;
        state.next_blob += 1;
        state.calls.push(Call::Upload {
            filename: filename.to_string(),
            content: content.to_vec(),
        });
        Ok(BlobRef {
            id: format!("blob-{}", state.next_blob),
            title: filename.to_string(),
        })
    }
}

/// 所有身份共享同一个 FakeClassroom
pub(crate) struct FakeConnector(pub Arc<FakeClassroom>);

impl ClassroomConnector for FakeConnector {
    fn connect(&self, _identity: &Identity) -> Result<ClassroomSession> {
        Ok(ClassroomSession {
            classroom: self.0.clone(),
            blobs: self.0.clone(),
        })
    }
}

#[derive(Default)]
pub(crate) struct FakeRepository {
    files: Mutex<HashMap<String, (Vec<u8>, u32)>>,
    failures: Mutex<HashMap<String, TrackerError>>,
    writes: Mutex<Vec<String>>,
}

impl FakeRepository {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub(crate) fn put(&self, path: &str, content: &[u8]) {
        self.files
            .lock()
            .unwrap()
            .insert(path.to_string(), (content.to_vec(), 1));
    }

    pub(crate) fn fail(&self, path: &str, err: TrackerError) {
        self.failures.lock().unwrap().insert(path.to_string(), err);
    }

    pub(crate) fn content(&self, path: &str) -> Option<Vec<u8>> {
        self.files.lock().unwrap().get(path).map(|(c, _)| c.clone())
    }

    pub(crate) fn writes(&self) -> Vec<String> {
        self.writes.lock().unwrap().clone()
    }

    fn check(&self, path: &str) -> Result<()> {
        match self.failures.lock().unwrap().get(path) {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }
}

#[async_trait::async_trait]
impl SubmissionRepository for FakeRepository {
    async fn lookup(&self, path: &str) -> Result<Option<RepositoryFile>> {
        self.check(path)?;
        Ok(self
            .files
            .lock()
            .unwrap()
            .get(path)
            .map(|(_, version)| RepositoryFile {
                path: path.to_string(),
                sha: format!("sha-{version}"),
                content: None,
            }))
    }

    async fn read(&self, path: &str) -> Result<Option<Vec<u8>>> {
        self.check(path)?;
        Ok(self.content(path))
    }

    async fn write(&self, path: &str, content: &[u8], message: &str) -> Result<WriteKind> {
        self.check(path)?;
        self.writes.lock().unwrap().push(message.to_string());
        let mut files = self.files.lock().unwrap();
        let kind = match files.get_mut(path) {
            Some(existing) => {
                *existing = (content.to_vec(), existing.1 + 1);
                WriteKind::Updated
            }
            None => {
                files.insert(path.to_string(), (content.to_vec(), 1));
                WriteKind::Created
            }
        };
        Ok(kind)
    }
}

#[derive(Default)]
pub(crate) struct FakeNotifier {
    sent: Mutex<Vec<(String, String)>>,
    failing: Mutex<bool>,
}

impl FakeNotifier {
    pub(crate) fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub(crate) fn sent(&self) -> Vec<(String, String)> {
        self.sent.lock().unwrap().clone()
    }

    pub(crate) fn set_failing(&self, failing: bool) {
        *self.failing.lock().unwrap() = failing;
    }
}

#[async_trait::async_trait]
impl Notifier for FakeNotifier {
    async fn notify(&self, subject: &str, body: &str) -> Result<()> {
        if *self.failing.lock().unwrap() {
            return Err(TrackerError::notification("smtp down"));
        }
        self.sent
            .lock()
            .unwrap()
            .push((subject.to_string(), body.to_string()));
        Ok(())
    }
}

/// 固定返回的凭据
pub(crate) struct FixedCredentials(pub Result<Identity>);

#[async_trait::async_trait]
impl CredentialProvider for FixedCredentials {
    async fn identity(&self) -> Result<Identity> {
        self.0.clone()
    }
}

pub(crate) fn test_settings() -> crate::services::ReconcileSettings {
    crate::services::ReconcileSettings {
        lead_time: chrono::TimeDelta::days(1),
        max_concurrency: 4,
        submission_filename: "submission.txt".to_string(),
        commit_message: "Submit {title}".to_string(),
        reuse_existing_attachment: true,
        send_reminders: true,
        max_upload_bytes: 1024,
    }
}

/// 用内存实现组装一个完整的追踪器
pub(crate) fn fake_tracker(
    classroom: &Arc<FakeClassroom>,
    repository: &Arc<FakeRepository>,
    notifier: &Arc<FakeNotifier>,
) -> crate::services::AssignmentTracker {
    crate::services::AssignmentTracker::new(
        crate::adapters::Adapters {
            credentials: Arc::new(FixedCredentials(Ok(Identity::bearer("token")))),
            connector: Arc::new(FakeConnector(classroom.clone())),
            repository: repository.clone(),
            notifier: notifier.clone(),
        },
        test_settings(),
    )
}
