use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use thiserror::Error;
use tracing::error;

use shopbooks_core::DomainError;
use shopbooks_infra::StoreError;

pub type ApiResult = Result<Response, ApiError>;

/// Handler error; renders through [`store_error_to_response`].
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        Self::Store(StoreError::Domain(err))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::Store(e) => store_error_to_response(e),
        }
    }
}

pub fn store_error_to_response(err: StoreError) -> Response {
    match err {
        StoreError::Domain(e) => domain_error_to_response(e),
        other => {
            error!(error = %other, "store failure");
            json_error(StatusCode::INTERNAL_SERVER_ERROR, "store_error", other.to_string())
        }
    }
}

fn domain_error_to_response(err: DomainError) -> Response {
    match err {
        DomainError::Validation(msg) => json_error(StatusCode::BAD_REQUEST, "validation_error", msg),
        DomainError::InvalidFields(fields) => (
            StatusCode::BAD_REQUEST,
            axum::Json(json!({
                "error": "validation_error",
                "message": "one or more fields are invalid",
                "fields": fields,
            })),
        )
            .into_response(),
        DomainError::InvalidId(msg) => json_error(StatusCode::BAD_REQUEST, "invalid_id", msg),
        DomainError::NotFound(what) => {
            json_error(StatusCode::NOT_FOUND, "not_found", format!("{what} not found"))
        }
        DomainError::Conflict(msg) => json_error(StatusCode::CONFLICT, "conflict", msg),
        DomainError::InvariantViolation(msg) => {
            json_error(StatusCode::UNPROCESSABLE_ENTITY, "invariant_violation", msg)
        }
    }
}

pub fn json_error(status: StatusCode, code: &'static str, message: impl Into<String>) -> Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}

/// Error body for the ledger endpoints: `{success: false, errors}` for field
/// errors, `{success: false, error}` otherwise.
pub fn ledger_error_response(err: StoreError) -> Response {
    let (status, body) = match err {
        StoreError::Domain(DomainError::InvalidFields(fields)) => {
            (StatusCode::BAD_REQUEST, json!({ "success": false, "errors": fields }))
        }
        StoreError::Domain(DomainError::Validation(msg) | DomainError::InvalidId(msg)) => (
            StatusCode::BAD_REQUEST,
            json!({ "success": false, "errors": { "__all__": [msg] } }),
        ),
        StoreError::Domain(DomainError::NotFound(what)) => (
            StatusCode::NOT_FOUND,
            json!({ "success": false, "error": format!("{what} not found") }),
        ),
        StoreError::Domain(DomainError::Conflict(msg)) => {
            (StatusCode::CONFLICT, json!({ "success": false, "error": msg }))
        }
        StoreError::Domain(DomainError::InvariantViolation(msg)) => {
            (StatusCode::UNPROCESSABLE_ENTITY, json!({ "success": false, "error": msg }))
        }
        other => {
            error!(error = %other, "ledger write failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                json!({ "success": false, "error": other.to_string() }),
            )
        }
    };
    (status, axum::Json(body)).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use shopbooks_core::FieldErrors;

    #[test]
    fn domain_errors_map_to_status_codes() {
        let cases = [
            (DomainError::validation("bad"), StatusCode::BAD_REQUEST),
            (DomainError::invalid_id("x"), StatusCode::BAD_REQUEST),
            (DomainError::not_found("product 1"), StatusCode::NOT_FOUND),
            (DomainError::conflict("in use"), StatusCode::CONFLICT),
            (DomainError::invariant("broken"), StatusCode::UNPROCESSABLE_ENTITY),
        ];
        for (err, status) in cases {
            assert_eq!(store_error_to_response(err.into()).status(), status);
        }
        assert_eq!(
            store_error_to_response(StoreError::backend("down")).status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn ledger_errors_keep_field_errors_at_400() {
        let mut fields = FieldErrors::new();
        fields.add("amount", "This field is required.");
        let res = ledger_error_response(DomainError::InvalidFields(fields).into());
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);

        let res = ledger_error_response(StoreError::not_found("customer 1"));
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
    }
}
