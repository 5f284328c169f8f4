use serde::Deserialize;
use tracing::debug;
use uuid::Uuid;

use super::BlobStore;
use super::http::ensure_success;
use crate::errors::Result;
use crate::models::classroom::entities::BlobRef;

/// Google Drive 上传客户端（multipart 上传，一次请求带元数据和内容）
pub struct GoogleDriveClient {
    http: reqwest::Client,
    upload_url: String,
    access_token: String,
}

#[derive(Debug, Deserialize)]
struct UploadedFile {
    id: String,
    #[serde(default)]
    name: String,
}

impl GoogleDriveClient {
    pub fn new(http: reqwest::Client, upload_url: &str, access_token: &str) -> Self {
        Self {
            http,
            upload_url: upload_url.to_string(),
            access_token: access_token.to_string(),
        }
    }
}

/// 组装 multipart/related 请求体
fn related_body(boundary: &str, filename: &str, content: &[u8]) -> Vec<u8> {
    let metadata = serde_json::json!({ "name": filename });
    let mut body = Vec::with_capacity(content.len() + 256);
    body.extend_from_slice(format!("--{boundary}\r\n").as_bytes());
    body.extend_from_slice(b"Content-Type: application/json; charset=UTF-8\r\n\r\n");
    body.extend_from_slice(metadata.to_string().as_bytes());
    body.extend_from_slice(format!("\r\n--{boundary}\r\n").as_bytes());
    body.extend_from_slice(b"Content-Type: application/octet-stream\r\n\r\n");
    body.extend_from_slice(content);
    body.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());
    body
}

#[async_trait::async_trait]
impl BlobStore for GoogleDriveClient {
    async fn upload_blob(&self, content: &[u8], filename: &str) -> Result<BlobRef> {
        let boundary = format!("tracker-{}", Uuid::new_v4().simple());
        let body = related_body(&boundary, filename, content);

        debug!(filename, size = content.len(), "Uploading blob to Drive");

        let response = self
            .http
            .post(&self.upload_url)
            .query(&[("uploadType", "multipart"), ("fields", "id,name")])
            .bearer_auth(&self.access_token)
            .header(
                reqwest::header::CONTENT_TYPE,
                format!("multipart/related; boundary={boundary}"),
            )
            .body(body)
            .send()
            .await?;

        let file: UploadedFile = ensure_success(response).await?.json().await?;
        let title = if file.name.is_empty() {
            filename.to_string()
        } else {
            file.name
        };
        Ok(BlobRef { id: file.id, title })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_related_body_layout() {
        let body = related_body("b0", "submission.txt", b"answer");
        let text = String::from_utf8(body).unwrap();
        assert!(text.starts_with("--b0\r\nContent-Type: application/json"));
        assert!(text.contains(r#"{"name":"submission.txt"}"#));
        assert!(text.contains("application/octet-stream\r\n\r\nanswer\r\n--b0--"));
    }
}
