//! API error types and responses.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use edumart_core::{CouponRejection, EduError};
use edumart_store::StoreError;

/// API error type.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Unauthorized - missing or unknown identity.
    #[error("unauthorized")]
    Unauthorized,

    /// Forbidden - known user without permission.
    #[error("forbidden")]
    Forbidden,

    /// Resource not found.
    #[error("not found: {0}")]
    NotFound(String),

    /// Bad request - invalid input.
    #[error("bad request: {0}")]
    BadRequest(String),

    /// Conflict - duplicate or invalid state transition.
    #[error("conflict: {0}")]
    Conflict(String),

    /// The coupon cannot be applied.
    #[error("coupon rejected: {0}")]
    CouponRejected(CouponRejection),

    /// Internal server error.
    #[error("internal error: {0}")]
    Internal(String),

    /// Optimistic write kept losing against concurrent writers.
    #[error("busy")]
    Busy,
}

/// JSON error response body.
#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: ErrorBody,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    code: String,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<serde_json::Value>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message, details) = match &self {
            Self::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                "unauthorized",
                self.to_string(),
                None,
            ),
            Self::Forbidden => (StatusCode::FORBIDDEN, "forbidden", self.to_string(), None),
            Self::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", msg.clone(), None),
            Self::BadRequest(msg) => (StatusCode::BAD_REQUEST, "bad_request", msg.clone(), None),
            Self::Conflict(msg) => (StatusCode::CONFLICT, "conflict", msg.clone(), None),
            Self::CouponRejected(reason) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "coupon_rejected",
                reason.to_string(),
                Some(serde_json::json!({ "reason": reason.reason() })),
            ),
            Self::Internal(msg) => {
                tracing::error!(error = %msg, "Internal server error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal_error",
                    "An internal error occurred".to_string(),
                    None,
                )
            }
            Self::Busy => {
                tracing::warn!("Write retries exhausted");
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    "busy",
                    "Too many concurrent updates, try again".to_string(),
                    None,
                )
            }
        };

        let body = ErrorResponse {
            error: ErrorBody {
                code: code.to_string(),
                message,
                details,
            },
        };

        (status, Json(body)).into_response()
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Conflict { table } => Self::Conflict(format!("duplicate entry in {table}")),
            StoreError::StaleWrite { .. } => Self::Busy,
            StoreError::Database(msg) | StoreError::Serialization(msg) => Self::Internal(msg),
        }
    }
}

impl From<EduError> for ApiError {
    fn from(err: EduError) -> Self {
        match err {
            EduError::Coupon(reason) => Self::CouponRejected(reason),
            EduError::InvalidState(msg) => Self::Conflict(msg),
            err @ (EduError::Invalid { .. }
            | EduError::NotPurchasable(_)
            | EduError::InvalidId(_)) => Self::BadRequest(err.to_string()),
        }
    }
}

impl From<CouponRejection> for ApiError {
    fn from(reason: CouponRejection) -> Self {
        Self::CouponRejected(reason)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_errors_map_to_status() {
        let conflict = ApiError::from(StoreError::Conflict { table: "reviews" });
        assert_eq!(conflict.into_response().status(), StatusCode::CONFLICT);

        let stale = ApiError::from(StoreError::StaleWrite { table: "coupons" });
        assert_eq!(stale.into_response().status(), StatusCode::SERVICE_UNAVAILABLE);

        let db = ApiError::from(StoreError::Database("boom".into()));
        assert_eq!(db.into_response().status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn domain_errors_map_to_status() {
        let invalid = ApiError::from(EduError::invalid("title", "must not be empty"));
        assert_eq!(invalid.into_response().status(), StatusCode::BAD_REQUEST);

        let state = ApiError::from(EduError::InvalidState("already refunded".into()));
        assert_eq!(state.into_response().status(), StatusCode::CONFLICT);

        let coupon = ApiError::from(EduError::Coupon(CouponRejection::Expired));
        assert_eq!(
            coupon.into_response().status(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
    }
}
