use axum::http::StatusCode;
use axum::Json;

use crate::domain::DomainError;

use super::ApiResponse;

/// Handler result: a JSON envelope or a status code with an error envelope
pub type ApiResult<T> = Result<Json<ApiResponse<T>>, (StatusCode, Json<ApiResponse<T>>)>;

/// Map a domain failure onto its HTTP status.
///
/// Persistence details stay in the log; clients only see "internal error".
pub fn domain_error<T>(err: DomainError) -> (StatusCode, Json<ApiResponse<T>>) {
    let status = match &err {
        DomainError::CapacityExceeded { .. } => StatusCode::CONFLICT,
        DomainError::NotFound { .. } => StatusCode::NOT_FOUND,
        DomainError::AccessDenied(_) => StatusCode::FORBIDDEN,
        DomainError::InvalidInput(_) => StatusCode::BAD_REQUEST,
        DomainError::Persistence(_) | DomainError::Rendering(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };

    if status.is_server_error() {
        tracing::error!("Request failed: {}", err);
        return (status, Json(ApiResponse::error("internal error")));
    }
    (status, Json(ApiResponse::error(err.to_string())))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn statuses_follow_error_kind() {
        let cases = [
            (
                DomainError::CapacityExceeded { category: "accessible" },
                StatusCode::CONFLICT,
            ),
            (
                DomainError::NotFound {
                    entity: "Reservation",
                    field: "id",
                    value: "9".into(),
                },
                StatusCode::NOT_FOUND,
            ),
            (DomainError::AccessDenied("x".into()), StatusCode::FORBIDDEN),
            (DomainError::InvalidInput("x".into()), StatusCode::BAD_REQUEST),
        ];
        for (err, expected) in cases {
            let (status, Json(body)) = domain_error::<()>(err);
            assert_eq!(status, expected);
            assert!(!body.success);
        }
    }

    #[test]
    fn persistence_details_are_hidden() {
        let (status, Json(body)) =
            domain_error::<()>(DomainError::Persistence("disk full at /var/x".into()));
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body.error.as_deref(), Some("internal error"));

        let (status, Json(body)) =
            domain_error::<()>(DomainError::Rendering("payload too long".into()));
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body.error.as_deref(), Some("internal error"));
    }
}
