//! GitHub Contents API 适配器
//!
//! 仓库约定：每个作业一个目录，目录下一个固定文件名的提交文件。

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use reqwest::Url;
use reqwest::header::{HeaderMap, RETRY_AFTER};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::SubmissionRepository;
use super::http::build_client;
use crate::config::GithubConfig;
use crate::errors::{Result, TrackerError};
use crate::models::repository::entities::{RepositoryFile, WriteKind};

const API_VERSION: &str = "2022-11-28";

pub struct GithubRepository {
    http: reqwest::Client,
    api_base_url: String,
    owner: String,
    name: String,
    branch: Option<String>,
    token: String,
}

/// contents 接口返回的文件对象（目录会返回数组）
#[derive(Debug, Deserialize)]
struct ContentEntry {
    #[serde(rename = "type")]
    kind: String,
    path: String,
    sha: String,
    #[serde(default)]
    content: String,
    #[serde(default)]
    encoding: String,
}

#[derive(Debug, Serialize)]
struct PutContentRequest<'a> {
    message: &'a str,
    content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    sha: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    branch: Option<&'a str>,
}

/// GitHub 的非 2xx 响应归类
///
/// 限流（429，或带限流头的 403）留到下一轮；仓库令牌被拒属于服务端配置问题，
/// 与调用方的 Classroom 身份无关，不能当作需要重新认证的凭据失效。
fn classify_failure(status: u16, headers: &HeaderMap, body: &str) -> TrackerError {
    let rate_limited = status == 429
        || (status == 403
            && (headers.contains_key(RETRY_AFTER)
                || headers
                    .get("x-ratelimit-remaining")
                    .and_then(|v| v.to_str().ok())
                    .is_some_and(|v| v.trim() == "0")));
    if rate_limited {
        return TrackerError::transient(format!("GitHub rate limit exceeded (HTTP {status}): {body}"));
    }
    match status {
        401 | 403 => TrackerError::configuration(format!(
            "GitHub rejected the repository token (HTTP {status}): {body}"
        )),
        _ => TrackerError::from_status(status, body),
    }
}

async fn ensure_github_success(response: reqwest::Response) -> Result<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let headers = response.headers().clone();
    let body = response.text().await.unwrap_or_default();
    Err(classify_failure(status.as_u16(), &headers, &body))
}

impl ContentEntry {
    fn decode(&self) -> Result<Vec<u8>> {
        if self.encoding != "base64" {
            return Err(TrackerError::serialization(format!(
                "Unsupported content encoding '{}' for {}",
                self.encoding, self.path
            )));
        }
        // GitHub 每 60 个字符插入一个换行
        let compact: String = self
            .content
            .chars()
            .filter(|c| !c.is_ascii_whitespace())
            .collect();
        Ok(STANDARD.decode(compact)?)
    }
}

impl GithubRepository {
    pub fn new(config: &GithubConfig) -> Result<Self> {
        let (owner, name) = config.owner_and_name().unwrap_or_default();
        Url::parse(&config.api_base_url).map_err(|e| {
            TrackerError::configuration(format!("Invalid github.api_base_url: {e}"))
        })?;
        Ok(Self {
            http: build_client(30)?,
            api_base_url: config.api_base_url.clone(),
            owner: owner.to_string(),
            name: name.to_string(),
            branch: Some(config.branch.clone()).filter(|b| !b.is_empty()),
            token: config.token.clone(),
        })
    }

    fn contents_url(&self, path: &str) -> Result<Url> {
        if self.owner.is_empty() {
            return Err(TrackerError::configuration("github.repository is not set"));
        }
        let mut url = Url::parse(&self.api_base_url)
            .map_err(|e| TrackerError::configuration(format!("Invalid GitHub URL: {e}")))?;
        url.path_segments_mut()
            .map_err(|_| TrackerError::configuration("GitHub URL cannot be a base"))?
            .pop_if_empty()
            .extend(["repos", self.owner.as_str(), self.name.as_str(), "contents"])
            .extend(path.split('/'));
        if let Some(branch) = &self.branch {
            url.query_pairs_mut().append_pair("ref", branch);
        }
        Ok(url)
    }

    fn request(&self, method: reqwest::Method, url: Url) -> reqwest::RequestBuilder {
        let builder = self
            .http
            .request(method, url)
            .header(reqwest::header::ACCEPT, "application/vnd.github+json")
            .header("X-GitHub-Api-Version", API_VERSION);
        if self.token.is_empty() {
            builder
        } else {
            builder.bearer_auth(&self.token)
        }
    }

    async fn fetch_entry(&self, path: &str) -> Result<Option<ContentEntry>> {
        let url = self.contents_url(path)?;
        debug!(url = %url, "Querying GitHub contents");
        let response = self.request(reqwest::Method::GET, url).send().await?;
        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let value: serde_json::Value = ensure_github_success(response).await?.json().await?;
        if !value.is_object() {
            // 同名目录
            return Ok(None);
        }
        let entry: ContentEntry = serde_json::from_value(value)?;
        Ok(Some(entry).filter(|e| e.kind == "file"))
    }
}

#[async_trait::async_trait]
impl SubmissionRepository for GithubRepository {
    async fn lookup(&self, path: &str) -> Result<Option<RepositoryFile>> {
        Ok(self.fetch_entry(path).await?.map(|entry| RepositoryFile {
            path: entry.path,
            sha: entry.sha,
            content: None,
        }))
    }

    async fn read(&self, path: &str) -> Result<Option<Vec<u8>>> {
        match self.fetch_entry(path).await? {
            Some(entry) => Ok(Some(entry.decode()?)),
            None => Ok(None),
        }
    }

    async fn write(&self, path: &str, content: &[u8], message: &str) -> Result<WriteKind> {
        // 已有版本时必须带上 sha 才能更新
        let existing = self.lookup(path).await?;
        let mut url = self.contents_url(path)?;
        url.set_query(None);

        let body = PutContentRequest {
            message,
            content: STANDARD.encode(content),
            sha: existing.as_ref().map(|f| f.sha.as_str()),
            branch: self.branch.as_deref(),
        };

        let response = self
            .request(reqwest::Method::PUT, url)
            .json(&body)
            .send()
            .await?;
        ensure_github_success(response).await?;

        Ok(if existing.is_some() {
            WriteKind::Updated
        } else {
            WriteKind::Created
        })
    }
}
