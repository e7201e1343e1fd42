use axum::{
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use serde::Serialize;
use serde_json::json;

use crate::dto::envelope::ApiResult;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("{message}")]
    BadRequest { code: &'static str, message: String },

    #[error("{message}")]
    Unauthorized { code: &'static str, message: String },

    #[error("{message}")]
    Forbidden { code: &'static str, message: String },

    #[error("{message}")]
    NotFound { code: &'static str, message: String },

    #[error("{message}")]
    Conflict { code: &'static str, message: String },

    #[error("Employer account is not verified (status: {verification_status})")]
    NotVerified { verification_status: String },

    #[error("Validation error: {0}")]
    Validation(#[from] validator::ValidationErrors),

    #[error("Database error: {0}")]
    Database(sqlx::Error),

    #[error("Migration error: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Token error: {0}")]
    Jwt(#[from] jsonwebtoken::errors::Error),

    #[error("HTTP error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Multipart error: {0}")]
    Multipart(#[from] axum::extract::multipart::MultipartError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    pub fn bad_request(code: &'static str, message: impl Into<String>) -> Self {
        Error::BadRequest {
            code,
            message: message.into(),
        }
    }

    pub fn unauthorized(code: &'static str, message: impl Into<String>) -> Self {
        Error::Unauthorized {
            code,
            message: message.into(),
        }
    }

    pub fn forbidden(code: &'static str, message: impl Into<String>) -> Self {
        Error::Forbidden {
            code,
            message: message.into(),
        }
    }

    pub fn not_found(code: &'static str, message: impl Into<String>) -> Self {
        Error::NotFound {
            code,
            message: message.into(),
        }
    }

    pub fn conflict(code: &'static str, message: impl Into<String>) -> Self {
        Error::Conflict {
            code,
            message: message.into(),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Error::BadRequest { .. }
            | Error::Validation(_)
            | Error::Json(_)
            | Error::Multipart(_) => StatusCode::BAD_REQUEST,
            Error::Unauthorized { .. } => StatusCode::UNAUTHORIZED,
            Error::Forbidden { .. } | Error::NotVerified { .. } => StatusCode::FORBIDDEN,
            Error::NotFound { .. } => StatusCode::NOT_FOUND,
            Error::Conflict { .. } => StatusCode::CONFLICT,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Error::BadRequest { code, .. }
            | Error::Unauthorized { code, .. }
            | Error::Forbidden { code, .. }
            | Error::NotFound { code, .. }
            | Error::Conflict { code, .. } => code,
            Error::NotVerified { .. } => "NOT_VERIFIED",
            Error::Validation(_) => "VALIDATION_ERROR",
            Error::Json(_) | Error::Multipart(_) => "BAD_REQUEST",
            _ => "INTERNAL_ERROR",
        }
    }
}

#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

pub fn field_errors(errors: &validator::ValidationErrors) -> Vec<FieldError> {
    let mut list: Vec<FieldError> = errors
        .field_errors()
        .into_iter()
        .flat_map(|(field, errs)| {
            errs.iter().map(move |err| FieldError {
                field: field.to_string(),
                message: err
                    .message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| format!("{} is invalid ({})", field, err.code)),
            })
        })
        .collect();
    list.sort_by(|a, b| a.field.cmp(&b.field));
    list
}

impl IntoResponse for Error {
    fn into_response(self) -> axum::response::Response {
        let status = self.status();
        let code = self.code();

        let (message, data) = match &self {
            Error::Validation(errors) => (
                "One or more fields are invalid".to_string(),
                Some(json!(field_errors(errors))),
            ),
            Error::NotVerified {
                verification_status,
            } => (
                "Your employer account must be verified to use this feature".to_string(),
                Some(json!({ "verificationStatus": verification_status })),
            ),
            Error::Json(err) => (format!("Malformed JSON: {}", err), None),
            Error::Multipart(err) => (err.body_text(), None),
            _ if status == StatusCode::INTERNAL_SERVER_ERROR => {
                tracing::error!(error = %self, "request failed");
                ("An unexpected error occurred".to_string(), None)
            }
            other => (other.to_string(), None),
        };

        let body = ApiResult {
            is_success: false,
            status: status.as_u16(),
            error_code: Some(code.to_string()),
            message,
            data,
        };
        (status, Json(body)).into_response()
    }
}

impl From<sqlx::Error> for Error {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => Error::not_found("NOT_FOUND", "Resource not found"),
            sqlx::Error::Database(ref db) if db.is_unique_violation() => {
                match db.constraint() {
                    Some("users_email_key") => {
                        Error::conflict("EMAIL_EXISTS", "Email is already registered")
                    }
                    Some("users_phone_key") => {
                        Error::conflict("PHONE_EXISTS", "Phone number is already registered")
                    }
                    Some("job_applications_candidate_job_key") => {
                        Error::conflict("ALREADY_APPLIED", "You have already applied for this job")
                    }
                    Some("saved_jobs_candidate_job_key") => {
                        Error::conflict("ALREADY_SAVED", "Job is already saved")
                    }
                    Some("experiences_one_current") => Error::conflict(
                        "CURRENT_EXPERIENCE_EXISTS",
                        "Another experience is already marked as current",
                    ),
                    _ => Error::conflict("CONFLICT", "Resource already exists"),
                }
            }
            other => Error::Database(other),
        }
    }
}

impl From<JsonRejection> for Error {
    fn from(rejection: JsonRejection) -> Self {
        Error::bad_request("BAD_REQUEST", rejection.body_text())
    }
}

impl From<QueryRejection> for Error {
    fn from(rejection: QueryRejection) -> Self {
        Error::bad_request("BAD_REQUEST", rejection.body_text())
    }
}

impl From<PathRejection> for Error {
    fn from(rejection: PathRejection) -> Self {
        Error::bad_request("BAD_REQUEST", rejection.body_text())
    }
}

impl From<argon2::password_hash::Error> for Error {
    fn from(err: argon2::password_hash::Error) -> Self {
        Error::Internal(format!("Password hashing failed: {}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;
    use serde_json::Value;
    use validator::Validate;

    #[derive(Validate)]
    struct Sample {
        #[validate(length(min = 1, message = "Name is required"))]
        name: String,
        #[validate(email)]
        email: String,
    }

    async fn body_json(err: Error) -> (StatusCode, Value) {
        let resp = err.into_response();
        let status = resp.status();
        let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn domain_errors_render_envelope_with_code() {
        let (status, body) =
            body_json(Error::not_found("JOB_NOT_FOUND", "Job posting not found")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["isSuccess"], false);
        assert_eq!(body["status"], 404);
        assert_eq!(body["errorCode"], "JOB_NOT_FOUND");
        assert_eq!(body["message"], "Job posting not found");
        assert!(body.get("data").is_none());
    }

    #[tokio::test]
    async fn internal_errors_do_not_leak_details() {
        let (status, body) =
            body_json(Error::Internal("connection refused at 10.0.0.3".into())).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["errorCode"], "INTERNAL_ERROR");
        assert_eq!(body["message"], "An unexpected error occurred");
    }

    #[tokio::test]
    async fn validation_errors_list_fields() {
        let sample = Sample {
            name: String::new(),
            email: "nope".into(),
        };
        let err = sample.validate().unwrap_err();
        let (status, body) = body_json(Error::Validation(err)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["errorCode"], "VALIDATION_ERROR");
        let fields: Vec<&str> = body["data"]
            .as_array()
            .unwrap()
            .iter()
            .map(|f| f["field"].as_str().unwrap())
            .collect();
        assert_eq!(fields, vec!["email", "name"]);
        assert_eq!(body["data"][1]["message"], "Name is required");
    }

    #[tokio::test]
    async fn not_verified_carries_status() {
        let (status, body) = body_json(Error::NotVerified {
            verification_status: "Pending".into(),
        })
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["errorCode"], "NOT_VERIFIED");
        assert_eq!(body["data"]["verificationStatus"], "Pending");
    }

    #[test]
    fn row_not_found_maps_to_404() {
        let err: Error = sqlx::Error::RowNotFound.into();
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
    }
}
