//! 管理接口的 Basic 认证门禁。

use axum::extract::Extension;
use axum::http::{HeaderMap, HeaderValue, Request, header};
use axum::{body::Body as AxumBody, middleware};
use axum_extra::extract::TypedHeader;
use axum_extra::headers::{Authorization, authorization::Basic};
use std::sync::Arc;

use crate::error::ApiError;

#[derive(Debug)]
pub struct AuthConfig {
    pub username: String,
    pub password: String,
}

/// 认证中间件：`/api/*` 要求 Basic 凭证，其余路径放行。
pub async fn auth_middleware(
    Extension(auth): Extension<Arc<AuthConfig>>,
    auth_header: Option<TypedHeader<Authorization<Basic>>>,
    req: Request<AxumBody>,
    next: middleware::Next,
) -> Result<axum::response::Response, ApiError> {
    if is_auth_exempt_path(req.uri().path()) {
        return Ok(next.run(req).await);
    }

    if let Some(TypedHeader(auth_header)) = auth_header
        && auth_header.username() == auth.username
        && auth_header.password() == auth.password
    {
        return Ok(next.run(req).await);
    }

    let mut headers = HeaderMap::new();
    headers.insert(
        header::WWW_AUTHENTICATE,
        HeaderValue::from_static(r#"Basic realm="SiteDrop""#),
    );
    Err(ApiError::Unauthorized(headers))
}

fn is_auth_exempt_path(path: &str) -> bool {
    !path.starts_with("/api/")
}
