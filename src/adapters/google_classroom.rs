//! Google Classroom REST 客户端
//!
//! 只覆盖对账需要的接口：课程、作业、本人提交记录、附加附件、交作业。

use chrono::NaiveDate;
use reqwest::Url;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use tracing::{debug, warn};

use super::google_drive::GoogleDriveClient;
use super::http::{build_client, ensure_success};
use super::{ClassroomApi, ClassroomConnector, ClassroomSession, Identity};
use crate::config::ClassroomConfig;
use crate::errors::{Result, TrackerError};
use crate::models::classroom::entities::{
    BlobRef, Course, CourseworkItem, StudentSubmission, SubmissionState,
};

/// 按身份创建 Classroom/Drive 会话，HTTP 连接池在会话之间共享
pub struct GoogleConnector {
    http: reqwest::Client,
    config: ClassroomConfig,
}

impl GoogleConnector {
    pub fn new(config: &ClassroomConfig) -> Result<Self> {
        Url::parse(&config.api_base_url).map_err(|e| {
            TrackerError::configuration(format!("Invalid classroom.api_base_url: {e}"))
        })?;
        Ok(Self {
            http: build_client(config.request_timeout)?,
            config: config.clone(),
        })
    }
}

impl ClassroomConnector for GoogleConnector {
    fn connect(&self, identity: &Identity) -> Result<ClassroomSession> {
        let classroom = GoogleClassroomClient {
            http: self.http.clone(),
            base_url: self.config.api_base_url.clone(),
            access_token: identity.access_token().to_string(),
            page_size: self.config.page_size,
        };
        let drive = GoogleDriveClient::new(
            self.http.clone(),
            &self.config.drive_upload_url,
            identity.access_token(),
        );
        Ok(ClassroomSession {
            classroom: Arc::new(classroom),
            blobs: Arc::new(drive),
        })
    }
}

/// 绑定到单个访问令牌的 Classroom 客户端
pub struct GoogleClassroomClient {
    http: reqwest::Client,
    base_url: String,
    access_token: String,
    page_size: u32,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CourseList {
    #[serde(default)]
    courses: Vec<WireCourse>,
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireCourse {
    id: String,
    #[serde(default)]
    name: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CourseWorkList {
    #[serde(default)]
    course_work: Vec<WireCourseWork>,
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireCourseWork {
    id: String,
    course_id: String,
    #[serde(default)]
    title: String,
    description: Option<String>,
    due_date: Option<WireDate>,
    max_points: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct WireDate {
    year: Option<i32>,
    month: Option<u32>,
    day: Option<u32>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SubmissionList {
    #[serde(default)]
    student_submissions: Vec<WireSubmission>,
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireSubmission {
    id: String,
    course_id: String,
    course_work_id: String,
    state: Option<SubmissionState>,
    assigned_grade: Option<f64>,
    assignment_submission: Option<WireAssignmentSubmission>,
}

#[derive(Debug, Deserialize)]
struct WireAssignmentSubmission {
    #[serde(default)]
    attachments: Vec<WireAttachment>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireAttachment {
    drive_file: Option<WireDriveFile>,
}

#[derive(Debug, Deserialize)]
struct WireDriveFile {
    id: String,
    #[serde(default)]
    title: String,
}

impl WireDate {
    fn to_naive(&self) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(self.year?, self.month?, self.day?)
    }
}

impl From<WireCourseWork> for CourseworkItem {
    fn from(work: WireCourseWork) -> Self {
        let due_date = work.due_date.as_ref().and_then(|d| {
            let date = d.to_naive();
            if date.is_none() {
                warn!(course_work_id = %work.id, "Ignoring malformed due date {:?}", d);
            }
            date
        });
        Self {
            course_id: work.course_id,
            id: work.id,
            title: work.title,
            description: work.description.filter(|d| !d.is_empty()),
            due_date,
            max_points: work.max_points,
        }
    }
}

impl From<WireSubmission> for StudentSubmission {
    fn from(submission: WireSubmission) -> Self {
        let attachments = submission
            .assignment_submission
            .map(|a| a.attachments)
            .unwrap_or_default()
            .into_iter()
            .filter_map(|a| a.drive_file)
            .map(|f| BlobRef {
                id: f.id,
                title: f.title,
            })
            .collect();
        Self {
            id: submission.id,
            course_id: submission.course_id,
            course_work_id: submission.course_work_id,
            // 缺省视为新建、尚未提交
            state: submission.state.unwrap_or(SubmissionState::New),
            assigned_grade: submission.assigned_grade,
            attachments,
        }
    }
}

impl GoogleClassroomClient {
    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = Url::parse(&self.base_url)
            .map_err(|e| TrackerError::configuration(format!("Invalid classroom URL: {e}")))?;
        url.path_segments_mut()
            .map_err(|_| TrackerError::configuration("Classroom URL cannot be a base"))?
            .pop_if_empty()
            .push("v1")
            .extend(segments);
        Ok(url)
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T> {
        debug!(url = %url, "Querying Classroom API");
        let response = self
            .http
            .get(url)
            .bearer_auth(&self.access_token)
            .send()
            .await?;
        Ok(ensure_success(response).await?.json().await?)
    }

    async fn post_json(&self, url: Url, body: serde_json::Value) -> Result<()> {
        debug!(url = %url, "Posting to Classroom API");
        let response = self
            .http
            .post(url)
            .bearer_auth(&self.access_token)
            .json(&body)
            .send()
            .await?;
        ensure_success(response).await?;
        Ok(())
    }

    fn with_page(&self, mut url: Url, page_token: Option<&str>) -> Url {
        {
            let mut query = url.query_pairs_mut();
            query.append_pair("pageSize", &self.page_size.to_string());
            if let Some(token) = page_token {
                query.append_pair("pageToken", token);
            }
        }
        url
    }
}

#[async_trait::async_trait]
impl ClassroomApi for GoogleClassroomClient {
    async fn list_courses(&self) -> Result<Vec<Course>> {
        let mut courses = Vec::new();
        let mut page_token: Option<String> = None;
        loop {
            let mut url = self.endpoint(&["courses"])?;
            url.query_pairs_mut()
                .append_pair("studentId", "me")
                .append_pair("courseStates", "ACTIVE");
            let page: CourseList = self
                .get_json(self.with_page(url, page_token.as_deref()))
                .await?;
            courses.extend(page.courses.into_iter().map(|c| Course {
                id: c.id,
                name: c.name,
            }));
            match page.next_page_token.filter(|t| !t.is_empty()) {
                Some(token) => page_token = Some(token),
                None => break,
            }
        }
        Ok(courses)
    }

    async fn list_course_work(&self, course_id: &str) -> Result<Vec<CourseworkItem>> {
        let mut items = Vec::new();
        let mut page_token: Option<String> = None;
        loop {
            let url = self.endpoint(&["courses", course_id, "courseWork"])?;
            let page: CourseWorkList = self
                .get_json(self.with_page(url, page_token.as_deref()))
                .await?;
            items.extend(page.course_work.into_iter().map(CourseworkItem::from));
            match page.next_page_token.filter(|t| !t.is_empty()) {
                Some(token) => page_token = Some(token),
                None => break,
            }
        }
        Ok(items)
    }

    async fn list_my_submissions(
        &self,
        course_id: &str,
        course_work_id: &str,
    ) -> Result<Vec<StudentSubmission>> {
        let mut url = self.endpoint(&[
            "courses",
            course_id,
            "courseWork",
            course_work_id,
            "studentSubmissions",
        ])?;
        url.query_pairs_mut().append_pair("userId", "me");
        let page: SubmissionList = self.get_json(url).await?;
        if page.next_page_token.is_some_and(|t| !t.is_empty()) {
            debug!(course_work_id, "Ignoring further submission pages for 'me'");
        }
        Ok(page
            .student_submissions
            .into_iter()
            .map(StudentSubmission::from)
            .collect())
    }

    async fn attach_blob(
        &self,
        course_id: &str,
        course_work_id: &str,
        submission_id: &str,
        blob: &BlobRef,
    ) -> Result<()> {
        let action = format!("{submission_id}:modifyAttachments");
        let url = self.endpoint(&[
            "courses",
            course_id,
            "courseWork",
            course_work_id,
            "studentSubmissions",
            &action,
        ])?;
        let body = serde_json::json!({
            "addAttachments": [{ "driveFile": { "id": blob.id } }]
        });
        self.post_json(url, body).await
    }

    async fn turn_in(
        &self,
        course_id: &str,
        course_work_id: &str,
        submission_id: &str,
    ) -> Result<()> {
        let action = format!("{submission_id}:turnIn");
        let url = self.endpoint(&[
            "courses",
            course_id,
            "courseWork",
            course_work_id,
            "studentSubmissions",
            &action,
        ])?;
        self.post_json(url, serde_json::json!({})).await
    }
}
