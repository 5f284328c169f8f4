//! 外部协作方的能力接口
//!
//! 核心逻辑只依赖这里定义的 trait，具体实现（Google Classroom、Google Drive、
//! GitHub、SMTP）在各自的子模块中。所有远程错误在这一层被归类为
//! [`TrackerError`](crate::errors::TrackerError) 的某个变体后再返回。

pub mod credentials;
pub mod email;
pub mod github;
pub mod google_classroom;
pub mod google_drive;
mod http;

use std::fmt;
use std::sync::Arc;

use crate::config::AppConfig;
use crate::errors::Result;
use crate::models::classroom::entities::{BlobRef, Course, CourseworkItem, StudentSubmission};
use crate::models::repository::entities::{RepositoryFile, WriteKind};

/// 已认证身份（由外部 OAuth 层提供的访问令牌）
#[derive(Clone, PartialEq, Eq)]
pub struct Identity {
    access_token: String,
}

impl Identity {
    pub fn bearer<T: Into<String>>(access_token: T) -> Self {
        Self {
            access_token: access_token.into(),
        }
    }

    pub fn access_token(&self) -> &str {
        &self.access_token
    }
}

impl fmt::Debug for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Identity")
            .field("access_token", &"<redacted>")
            .finish()
    }
}

/// 凭据提供方：每轮对账取一次有效身份
#[async_trait::async_trait]
pub trait CredentialProvider: Send + Sync {
    async fn identity(&self) -> Result<Identity>;
}

/// Classroom 能力
#[async_trait::async_trait]
pub trait ClassroomApi: Send + Sync {
    // 列出课程
    async fn list_courses(&self) -> Result<Vec<Course>>;
    // 列出某门课程的作业
    async fn list_course_work(&self, course_id: &str) -> Result<Vec<CourseworkItem>>;
    // 列出当前学生对某项作业的提交记录
    async fn list_my_submissions(
        &self,
        course_id: &str,
        course_work_id: &str,
    ) -> Result<Vec<StudentSubmission>>;
    // 把已上传的文件附加到提交记录
    async fn attach_blob(
        &self,
        course_id: &str,
        course_work_id: &str,
        submission_id: &str,
        blob: &BlobRef,
    ) -> Result<()>;
    // 交作业
    async fn turn_in(&self, course_id: &str, course_work_id: &str, submission_id: &str)
    -> Result<()>;

    /// 当前学生的提交记录；返回多条时固定取第一条
    async fn my_submission(
        &self,
        course_id: &str,
        course_work_id: &str,
    ) -> Result<Option<StudentSubmission>> {
        Ok(self
            .list_my_submissions(course_id, course_work_id)
            .await?
            .into_iter()
            .next())
    }
}

/// 云端文件存储能力
#[async_trait::async_trait]
pub trait BlobStore: Send + Sync {
    // 每次上传都会得到新的文件 ID，不存在覆盖语义
    async fn upload_blob(&self, content: &[u8], filename: &str) -> Result<BlobRef>;
}

/// 绑定到某个身份的 Classroom 会话
#[derive(Clone)]
pub struct ClassroomSession {
    pub classroom: Arc<dyn ClassroomApi>,
    pub blobs: Arc<dyn BlobStore>,
}

/// 按身份创建会话，每轮对账或每个请求创建一次
pub trait ClassroomConnector: Send + Sync {
    fn connect(&self, identity: &Identity) -> Result<ClassroomSession>;
}

/// 版本库文件存储能力
#[async_trait::async_trait]
pub trait SubmissionRepository: Send + Sync {
    // 查询文件元数据（不含内容），不存在时返回 None
    async fn lookup(&self, path: &str) -> Result<Option<RepositoryFile>>;
    // 读取文件内容
    async fn read(&self, path: &str) -> Result<Option<Vec<u8>>>;
    // 创建或更新文件
    async fn write(&self, path: &str, content: &[u8], message: &str) -> Result<WriteKind>;

    async fn exists(&self, path: &str) -> Result<bool> {
        Ok(self.lookup(path).await?.is_some())
    }
}

/// 通知能力（尽力而为）
#[async_trait::async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, subject: &str, body: &str) -> Result<()>;
}

/// 启动时构造的一组适配器
#[derive(Clone)]
pub struct Adapters {
    pub credentials: Arc<dyn CredentialProvider>,
    pub connector: Arc<dyn ClassroomConnector>,
    pub repository: Arc<dyn SubmissionRepository>,
    pub notifier: Arc<dyn Notifier>,
}

pub fn create_adapters(config: &AppConfig) -> Result<Adapters> {
    let credentials = credentials::StaticCredentialProvider::new(&config.classroom.access_token);
    let connector = google_classroom::GoogleConnector::new(&config.classroom)?;
    let repository = github::GithubRepository::new(&config.github)?;

    let notifier: Arc<dyn Notifier> = if config.notification.enabled {
        Arc::new(email::SmtpNotifier::new(&config.notification)?)
    } else {
        Arc::new(email::LogNotifier)
    };

    Ok(Adapters {
        credentials: Arc::new(credentials),
        connector: Arc::new(connector),
        repository: Arc::new(repository),
        notifier,
    })
}
