//! 统一的 API 错误类型与 JSON 响应转换。

use axum::Json;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use serde::Serialize;

#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
    Unauthorized(HeaderMap),
    TooManyRequests,
    Configuration(String),
    Internal(String),
}

#[derive(Serialize)]
struct ErrorBody {
    ok: bool,
    error: String,
}

fn json_error(status: StatusCode, message: String) -> Response {
    (
        status,
        Json(ErrorBody {
            ok: false,
            error: message,
        }),
    )
        .into_response()
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::BadRequest(msg) => json_error(StatusCode::BAD_REQUEST, msg),
            ApiError::Unauthorized(headers) => {
                let body = json_error(StatusCode::UNAUTHORIZED, "Unauthorized".into());
                (headers, body).into_response()
            }
            ApiError::TooManyRequests => {
                json_error(StatusCode::TOO_MANY_REQUESTS, "Rate limit exceeded".into())
            }
            ApiError::Configuration(msg) => json_error(StatusCode::INTERNAL_SERVER_ERROR, msg),
            ApiError::Internal(msg) => json_error(StatusCode::INTERNAL_SERVER_ERROR, msg),
        }
    }
}
