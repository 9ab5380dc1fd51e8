//! 上传处理器：接入控制、multipart 校验与两级存储回退。

use axum::extract::{Extension, Multipart};
use axum::http::HeaderMap;
use axum::response::Json as JsonResponse;
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, warn};

use crate::config::{REMOTE_KEY_PREFIX, RuntimeEnv, UPLOAD_BUCKET};
use crate::error::ApiError;
use crate::http::client_id;
use crate::limit::AdmissionLimiter;
use crate::remote::RemoteStore;
use crate::storage::{LocalStore, storage_key};

#[derive(Serialize)]
pub(crate) struct UploadResponse {
    ok: bool,
    url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    bucket: Option<String>,
}

struct UploadedFile {
    file_name: String,
    content_type: String,
    bytes: Vec<u8>,
}

/// 上传入口。
///
/// 顺序执行：接入检查 → multipart 校验 → 存储键派生 → 远程尝试 →
/// 环境门禁 → 本地回退。每一步终结于首个成功或最终失败，无重试。
pub async fn upload_file(
    Extension(limiter): Extension<Arc<dyn AdmissionLimiter>>,
    Extension(remote): Extension<Arc<Option<RemoteStore>>>,
    Extension(local): Extension<Arc<LocalStore>>,
    Extension(env): Extension<RuntimeEnv>,
    headers: HeaderMap,
    multipart: Multipart,
) -> Result<JsonResponse<UploadResponse>, ApiError> {
    let client = client_id(&headers);
    if !limiter.check(&client) {
        warn!(client, "upload rejected by rate limit");
        return Err(ApiError::TooManyRequests);
    }

    let file = read_file_field(multipart).await?;
    let file_name = storage_key(&file.file_name);
    info!(
        client,
        file_name,
        size = file.bytes.len(),
        content_type = file.content_type,
        "upload accepted"
    );

    let stored = store_upload(
        remote.as_ref().as_ref(),
        &local,
        env,
        &file_name,
        &file.bytes,
        &file.content_type,
    )
    .await?;

    Ok(JsonResponse(stored.into_response_body()))
}

/// 读取 multipart 中名为 `file` 的字段。
async fn read_file_field(mut multipart: Multipart) -> Result<UploadedFile, ApiError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|err| ApiError::BadRequest(err.to_string()))?
    {
        if field.name() != Some("file") {
            continue;
        }

        let file_name = field.file_name().unwrap_or_default().to_string();
        let declared_type = field.content_type().map(str::to_string);
        let bytes = field
            .bytes()
            .await
            .map_err(|err| ApiError::BadRequest(err.to_string()))?;
        let content_type = declared_type.unwrap_or_else(|| {
            mime_guess::from_path(&file_name)
                .first_or_octet_stream()
                .essence_str()
                .to_string()
        });

        return Ok(UploadedFile {
            file_name,
            content_type,
            bytes: bytes.to_vec(),
        });
    }

    Err(ApiError::BadRequest("Missing file".into()))
}

pub(crate) struct StoredUpload {
    url: String,
    path: Option<String>,
    bucket: Option<String>,
}

impl StoredUpload {
    fn into_response_body(self) -> UploadResponse {
        UploadResponse {
            ok: true,
            url: self.url,
            path: self.path,
            bucket: self.bucket,
        }
    }
}

/// 解析存储目标：远程优先，失败时仅在非生产环境回退到本地磁盘。
pub(crate) async fn store_upload(
    remote: Option<&RemoteStore>,
    local: &LocalStore,
    env: RuntimeEnv,
    file_name: &str,
    bytes: &[u8],
    content_type: &str,
) -> Result<StoredUpload, ApiError> {
    if let Some(remote) = remote {
        let key = format!("{REMOTE_KEY_PREFIX}/{file_name}");
        match remote
            .put_object(UPLOAD_BUCKET, &key, bytes, content_type)
            .await
        {
            Ok(url) => {
                info!(key, bucket = UPLOAD_BUCKET, "stored in remote storage");
                return Ok(StoredUpload {
                    url,
                    path: Some(key),
                    bucket: Some(UPLOAD_BUCKET.to_string()),
                });
            }
            // 远程失败不终结请求：只要本地回退可用就继续。
            Err(err) => warn!(error = %err, key, "remote upload failed, trying local fallback"),
        }
    }

    if env.is_production() {
        return Err(ApiError::Configuration(
            "Remote storage is not configured for production".into(),
        ));
    }

    local
        .write(file_name, bytes)
        .await
        .map_err(|err| ApiError::Internal(format!("Upload failed: {err}")))?;
    info!(file_name, "stored in local fallback");

    Ok(StoredUpload {
        url: local.public_url(file_name),
        path: None,
        bucket: None,
    })
}
