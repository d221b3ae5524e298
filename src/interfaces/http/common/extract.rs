//! Path and query extractors that answer with the usual envelope.
//!
//! axum's own `Path` and `Query` reject with a plain-text body. These
//! wrappers keep the rejection status and move the message into
//! `ApiResponse::error`.

use axum::extract::rejection::{PathRejection, QueryRejection};
use axum::extract::FromRequestParts;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;

use super::ApiResponse;

/// `axum::extract::Path` with a JSON rejection
#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(ParamRejection))]
pub struct ApiPath<T>(pub T);

/// `axum::extract::Query` with a JSON rejection
#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(ParamRejection))]
pub struct ApiQuery<T>(pub T);

#[derive(Debug)]
pub struct ParamRejection {
    status: StatusCode,
    message: String,
}

impl From<PathRejection> for ParamRejection {
    fn from(rejection: PathRejection) -> Self {
        Self {
            status: rejection.status(),
            message: rejection.body_text(),
        }
    }
}

impl From<QueryRejection> for ParamRejection {
    fn from(rejection: QueryRejection) -> Self {
        Self {
            status: rejection.status(),
            message: rejection.body_text(),
        }
    }
}

impl IntoResponse for ParamRejection {
    fn into_response(self) -> Response {
        (self.status, Json(ApiResponse::<()>::error(self.message))).into_response()
    }
}
