use chrono::Utc;
use std::io;
use std::path::{Path, PathBuf};
use tokio::fs;

/// 非生产环境的本地磁盘回退存储。
#[derive(Clone, Debug)]
pub struct LocalStore {
    root: PathBuf,
}

impl LocalStore {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    pub fn root_path(&self) -> &Path {
        &self.root
    }

    /// 幂等地创建上传目录。
    pub async fn ensure_root(&self) -> io::Result<()> {
        fs::create_dir_all(&self.root).await
    }

    /// 写入文件字节并返回落盘路径。写入不具备原子性。
    pub async fn write(&self, file_name: &str, bytes: &[u8]) -> io::Result<PathBuf> {
        self.ensure_root().await?;
        let target = self.root.join(file_name);
        fs::write(&target, bytes).await?;
        Ok(target)
    }

    /// 回退文件对外暴露的相对 URL。
    pub fn public_url(&self, file_name: &str) -> String {
        format!("/uploads/{file_name}")
    }
}

/// 将文件名中 `[A-Za-z0-9._-]` 之外的连续字符替换为单个 `-`。
pub fn sanitize_file_name(name: &str) -> String {
    let mut sanitized = String::with_capacity(name.len());
    let mut in_replaced_run = false;
    for ch in name.chars() {
        if ch.is_ascii_alphanumeric() || matches!(ch, '.' | '_' | '-') {
            sanitized.push(ch);
            in_replaced_run = false;
        } else if !in_replaced_run {
            sanitized.push('-');
            in_replaced_run = true;
        }
    }
    sanitized
}

/// 生成存储键：`{毫秒时间戳}-{清洗后的文件名}`。
///
/// 时间戳前缀保证键抗碰撞且路径安全，无需额外的唯一性检查。
pub fn storage_key(original_name: &str) -> String {
    let sanitized = sanitize_file_name(original_name);
    let stem = if sanitized.is_empty() {
        "file".to_string()
    } else {
        sanitized
    };
    format!("{}-{stem}", Utc::now().timestamp_millis().max(0))
}
