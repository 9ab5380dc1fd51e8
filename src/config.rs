//! CLI 参数、运行环境与服务端配置默认值。

use clap::Parser;
use shadow_rs::formatcp;

use crate::build;

const VERSION_INFO: &str = formatcp!(
    r#"{}\ncommit_hash: {}\nbuild_time: {}\nbuild_env: {},{}"#,
    build::PKG_VERSION,
    build::SHORT_COMMIT,
    build::BUILD_TIME,
    build::RUST_VERSION,
    build::RUST_CHANNEL
);

pub const UPLOAD_BUCKET: &str = "uploads";
pub const REMOTE_KEY_PREFIX: &str = "admin";
pub const DEFAULT_AUTH_USER: &str = "admin";
pub const DEFAULT_AUTH_PASS: &str = "admin";
pub const DEFAULT_UPLOADS_DIR: &str = "uploads";
pub const DEFAULT_UPLOAD_LIMIT: usize = 15;
pub const DEFAULT_UPLOAD_WINDOW_MS: u64 = 60_000;
pub const DEFAULT_UPLOAD_MAX_BYTES: usize = 25 * 1024 * 1024;
pub const DEFAULT_REMOTE_TIMEOUT_SECS: u64 = 30;
pub const LIMITER_SWEEP_INTERVAL_SECS: u64 = 300;

/// 运行环境标记：production 禁用本地磁盘回退。
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RuntimeEnv {
    Development,
    Production,
}

impl RuntimeEnv {
    /// 从环境名解析，未识别的值按 Development 处理。
    pub fn from_name(name: &str) -> Self {
        if name.trim().eq_ignore_ascii_case("production") {
            RuntimeEnv::Production
        } else {
            RuntimeEnv::Development
        }
    }

    pub fn is_production(self) -> bool {
        matches!(self, RuntimeEnv::Production)
    }
}

/// CLI arguments and environment configuration for the server.
#[derive(Parser, Debug)]
#[command(name = "sitedrop", version = VERSION_INFO, about = "SiteDrop upload gateway")]
pub struct Args {
    #[arg(
        short = 'b',
        long,
        env = "SITEDROP_BIND",
        default_value = "0.0.0.0",
        help = "Bind address for HTTP"
    )]
    pub host: String,
    #[arg(
        short = 'p',
        long,
        env = "SITEDROP_PORT",
        default_value_t = 5050,
        help = "HTTP port"
    )]
    pub port: u16,
    #[arg(
        short = 'd',
        long,
        env = "SITEDROP_UPLOADS_DIR",
        default_value = DEFAULT_UPLOADS_DIR,
        help = "Local uploads directory (non-production fallback)"
    )]
    pub uploads_dir: String,
    #[arg(
        short = 'e',
        long,
        env = "SITEDROP_ENV",
        default_value = "development",
        help = "Runtime environment (production disables the local fallback)"
    )]
    pub environment: String,
    #[arg(
        long,
        env = "SITEDROP_STORAGE_URL",
        help = "Remote object storage endpoint URL"
    )]
    pub storage_url: Option<String>,
    #[arg(
        long,
        env = "SITEDROP_STORAGE_KEY",
        help = "Remote object storage service credential"
    )]
    pub storage_key: Option<String>,
    #[arg(
        long,
        env = "SITEDROP_AUTH_USER",
        default_value = DEFAULT_AUTH_USER,
        help = "Auth username for the admin API"
    )]
    pub auth_user: String,
    #[arg(
        long,
        env = "SITEDROP_AUTH_PASS",
        default_value = DEFAULT_AUTH_PASS,
        help = "Auth password for the admin API"
    )]
    pub auth_pass: String,
    #[arg(long, env = "SITEDROP_CORS_ORIGINS", help = "Comma separated CORS origins")]
    pub cors_origins: Option<String>,
    #[arg(
        long,
        env = "SITEDROP_UPLOAD_LIMIT",
        default_value_t = DEFAULT_UPLOAD_LIMIT,
        help = "Max accepted uploads per client per window"
    )]
    pub upload_limit: usize,
    #[arg(
        long,
        env = "SITEDROP_UPLOAD_WINDOW_MS",
        default_value_t = DEFAULT_UPLOAD_WINDOW_MS,
        help = "Upload rate limit window in milliseconds"
    )]
    pub upload_window_ms: u64,
    #[arg(
        long,
        env = "SITEDROP_UPLOAD_MAX_BYTES",
        default_value_t = DEFAULT_UPLOAD_MAX_BYTES,
        help = "Max upload body size in bytes"
    )]
    pub upload_max_bytes: usize,
    #[arg(
        long,
        env = "SITEDROP_REMOTE_TIMEOUT_SECS",
        default_value_t = DEFAULT_REMOTE_TIMEOUT_SECS,
        help = "Remote storage request timeout in seconds"
    )]
    pub remote_timeout_secs: u64,
}
