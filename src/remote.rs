//! 远程对象存储客户端（bucket/key 形式的托管 Blob 服务）。

use reqwest::{Client, StatusCode};
use std::fmt;
use std::time::Duration;
use tracing::debug;

use crate::config::Args;

/// 远程上传失败原因，区分传输错误与非 2xx 响应，便于回退路径断言。
#[derive(Debug)]
pub enum RemoteStoreError {
    Http(reqwest::Error),
    Status(StatusCode, String),
}

impl fmt::Display for RemoteStoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RemoteStoreError::Http(err) => write!(f, "remote storage request failed: {err}"),
            RemoteStoreError::Status(status, body) => {
                write!(f, "remote storage responded {status}: {body}")
            }
        }
    }
}

impl From<reqwest::Error> for RemoteStoreError {
    fn from(err: reqwest::Error) -> Self {
        RemoteStoreError::Http(err)
    }
}

/// 远程对象存储句柄。仅当端点与凭证同时配置时才会构建。
#[derive(Clone, Debug)]
pub struct RemoteStore {
    client: Client,
    endpoint: String,
    service_key: String,
}

impl RemoteStore {
    pub fn new(endpoint: &str, service_key: &str, timeout: Duration) -> Self {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .unwrap_or_else(|_| Client::new());
        Self {
            client,
            endpoint: endpoint.trim_end_matches('/').to_string(),
            service_key: service_key.to_string(),
        }
    }

    /// 从配置构建；端点或凭证缺失时返回 None。
    pub fn from_args(args: &Args) -> Option<Self> {
        let endpoint = args.storage_url.as_deref()?.trim();
        let service_key = args.storage_key.as_deref()?.trim();
        if endpoint.is_empty() || service_key.is_empty() {
            return None;
        }
        Some(Self::new(
            endpoint,
            service_key,
            Duration::from_secs(args.remote_timeout_secs),
        ))
    }

    /// 上传对象，覆盖同键的已有对象，成功时返回公开访问 URL。
    pub async fn put_object(
        &self,
        bucket: &str,
        key: &str,
        bytes: &[u8],
        content_type: &str,
    ) -> Result<String, RemoteStoreError> {
        let url = format!("{}/storage/v1/object/{bucket}/{key}", self.endpoint);
        debug!(bucket, key, content_type, "remote upload");

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.service_key)
            .header("x-upsert", "true")
            .header(reqwest::header::CONTENT_TYPE, content_type)
            .body(bytes.to_vec())
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(RemoteStoreError::Status(status, body));
        }

        Ok(self.public_url(bucket, key))
    }

    /// 对象的公开访问 URL。
    pub fn public_url(&self, bucket: &str, key: &str) -> String {
        format!("{}/storage/v1/object/public/{bucket}/{key}", self.endpoint)
    }
}
