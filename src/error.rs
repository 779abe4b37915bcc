//! Application error taxonomy and HTTP response mapping.
//!
//! One tagged error type for the whole API: handlers and repositories
//! return `AppResult<T>` and the `IntoResponse` impl renders the stable
//! client-facing shape `{code, message, errors?, detail?}`.

use std::collections::BTreeMap;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

pub type AppResult<T> = Result<T, AppError>;

/// Per-field validation detail tree, keyed by the input field path.
#[derive(Debug, Default, Clone, Serialize)]
pub struct FieldErrors(pub BTreeMap<String, Vec<String>>);

impl FieldErrors {
    pub fn push(&mut self, field: &str, message: impl Into<String>) {
        self.0.entry(field.to_string()).or_default().push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Finishes a validation pass: empty tree is Ok, anything else becomes
    /// a validation error.
    pub fn into_result(self) -> AppResult<()> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(AppError::Validation(self))
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("input validation failed")]
    Validation(FieldErrors),

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("{0}")]
    Duplicate(String),

    #[error("database error")]
    Database(#[from] sqlx::Error),

    #[error("internal server error")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::Unauthorized(message.into())
    }

    pub fn duplicate(message: impl Into<String>) -> Self {
        Self::Duplicate(message.into())
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(anyhow::anyhow!(message.into()))
    }

    fn code(&self) -> &'static str {
        match self {
            AppError::Unauthorized(_) => "UNAUTHORIZED",
            AppError::Forbidden(_) => "FORBIDDEN",
            AppError::Validation(_) => "VALIDATION_ERROR",
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::Duplicate(_) => "DUPLICATE_ENTRY",
            AppError::Database(_) => "DATABASE_ERROR",
            AppError::Internal(_) => "INTERNAL_SERVER_ERROR",
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Duplicate(_) => StatusCode::CONFLICT,
            AppError::Database(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Wire shape of every error response.
#[derive(Debug, Serialize)]
struct ErrorBody<'a> {
    code: &'static str,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    errors: Option<&'a FieldErrors>,
    #[serde(skip_serializing_if = "Option::is_none")]
    detail: Option<String>,
}

// Error chains stand in for stack traces and are only surfaced outside
// production.
fn include_detail() -> bool {
    std::env::var("APP_ENV")
        .map(|v| v != "production")
        .unwrap_or(true)
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let code = self.code();

        let detail = match &self {
            AppError::Database(e) => {
                tracing::error!(error = %e, "database error");
                include_detail().then(|| e.to_string())
            }
            AppError::Internal(e) => {
                tracing::error!(error = %e, "internal error");
                include_detail().then(|| format!("{e:#}"))
            }
            other => {
                tracing::warn!(code, message = %other, "request failed");
                None
            }
        };

        let errors = match &self {
            AppError::Validation(tree) => Some(tree),
            _ => None,
        };

        let body = ErrorBody {
            code,
            message: self.to_string(),
            errors,
            detail,
        };

        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;
    use serde_json::Value;

    async fn body_json(err: AppError) -> (StatusCode, Value) {
        let response = err.into_response();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn not_found_maps_to_404_with_stable_code() {
        let (status, json) = body_json(AppError::NotFound("transaction")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(json["code"], "NOT_FOUND");
        assert_eq!(json["message"], "transaction not found");
        assert!(json.get("errors").is_none());
    }

    #[tokio::test]
    async fn validation_error_carries_field_tree() {
        let mut fields = FieldErrors::default();
        fields.push("email", "must be a valid email address");
        fields.push("password", "must be at least 6 characters");
        let (status, json) = body_json(AppError::Validation(fields)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["code"], "VALIDATION_ERROR");
        assert_eq!(json["errors"]["email"][0], "must be a valid email address");
        assert_eq!(json["errors"]["password"][0], "must be at least 6 characters");
    }

    #[tokio::test]
    async fn unauthorized_and_duplicate_keep_their_messages() {
        let (status, json) = body_json(AppError::unauthorized("invalid email or password")).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(json["code"], "UNAUTHORIZED");
        assert_eq!(json["message"], "invalid email or password");

        let (status, json) =
            body_json(AppError::duplicate("user with this email already exists")).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(json["code"], "DUPLICATE_ENTRY");
    }

    #[tokio::test]
    async fn internal_error_hides_the_cause_from_the_message() {
        let (status, json) = body_json(AppError::internal("secret broke")).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(json["code"], "INTERNAL_SERVER_ERROR");
        assert_eq!(json["message"], "internal server error");
    }

    #[test]
    fn field_errors_into_result() {
        assert!(FieldErrors::default().into_result().is_ok());
        let mut fields = FieldErrors::default();
        fields.push("page", "must be at least 1");
        assert!(matches!(
            fields.into_result(),
            Err(AppError::Validation(_))
        ));
    }
}
