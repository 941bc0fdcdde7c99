use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::services::lab_sandbox::SandboxError;
use crate::services::workflow::WorkflowError;

#[derive(Debug, Serialize)]
struct ErrorResponse {
    status: u16,
    detail: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    kind: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    missing_question_ids: Option<Vec<String>>,
}

impl ErrorResponse {
    fn plain(status: StatusCode, detail: String) -> Self {
        Self { status: status.as_u16(), detail, kind: None, missing_question_ids: None }
    }
}

#[derive(Debug)]
pub(crate) enum ApiError {
    Unauthorized(&'static str),
    Forbidden(&'static str),
    BadRequest(String),
    NotFound(String),
    Conflict(String),
    TooManyRequests(&'static str),
    ServiceUnavailable(String),
    Internal(String),
    Workflow(WorkflowError),
}

impl ApiError {
    /// Log the underlying error with context and return an `Internal` variant.
    pub(crate) fn internal(err: impl std::fmt::Display, context: &str) -> Self {
        tracing::error!(error = %err, "{context}");
        Self::Internal(context.to_string())
    }

    pub(crate) fn validation(err: validator::ValidationErrors) -> Self {
        Self::BadRequest(err.to_string())
    }
}

impl From<WorkflowError> for ApiError {
    fn from(err: WorkflowError) -> Self {
        match err {
            WorkflowError::Storage(err) => Self::internal(err, "Database error"),
            WorkflowError::CertificateNumberExhausted => Self::internal(
                WorkflowError::CertificateNumberExhausted,
                "Failed to issue certificate",
            ),
            other => Self::Workflow(other),
        }
    }
}

impl From<SandboxError> for ApiError {
    fn from(err: SandboxError) -> Self {
        match &err {
            SandboxError::Unavailable(source) => {
                tracing::warn!(error = %source, "Sandbox request failed");
            }
            SandboxError::Rejected(status) => {
                tracing::warn!(status, "Sandbox rejected execution request");
            }
            SandboxError::NotConfigured => {}
        }
        Self::ServiceUnavailable(err.to_string())
    }
}

fn workflow_status(err: &WorkflowError) -> StatusCode {
    match err {
        WorkflowError::CourseNotFound | WorkflowError::ModuleNotFound => StatusCode::NOT_FOUND,
        WorkflowError::NotEnrolled => StatusCode::FORBIDDEN,
        WorkflowError::QuizNotAvailable
        | WorkflowError::ModulesIncomplete
        | WorkflowError::GradeOutOfRange { .. } => StatusCode::BAD_REQUEST,
        WorkflowError::IncompleteSubmission { .. } | WorkflowError::UnknownQuestion { .. } => {
            StatusCode::UNPROCESSABLE_ENTITY
        }
        WorkflowError::NoAttemptsRemaining { .. } => StatusCode::CONFLICT,
        WorkflowError::CertificateNumberExhausted | WorkflowError::Storage(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::Unauthorized(message) => {
                let status = StatusCode::UNAUTHORIZED;
                let mut response =
                    (status, Json(ErrorResponse::plain(status, message.to_string())))
                        .into_response();
                response
                    .headers_mut()
                    .insert(header::WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
                response
            }
            ApiError::Forbidden(message) => {
                let status = StatusCode::FORBIDDEN;
                (status, Json(ErrorResponse::plain(status, message.to_string()))).into_response()
            }
            ApiError::BadRequest(message) => {
                let status = StatusCode::BAD_REQUEST;
                (status, Json(ErrorResponse::plain(status, message))).into_response()
            }
            ApiError::NotFound(message) => {
                let status = StatusCode::NOT_FOUND;
                (status, Json(ErrorResponse::plain(status, message))).into_response()
            }
            ApiError::Conflict(message) => {
                let status = StatusCode::CONFLICT;
                (status, Json(ErrorResponse::plain(status, message))).into_response()
            }
            ApiError::TooManyRequests(message) => {
                let status = StatusCode::TOO_MANY_REQUESTS;
                (status, Json(ErrorResponse::plain(status, message.to_string()))).into_response()
            }
            ApiError::ServiceUnavailable(message) => {
                let status = StatusCode::SERVICE_UNAVAILABLE;
                (status, Json(ErrorResponse::plain(status, message))).into_response()
            }
            ApiError::Internal(message) => {
                tracing::error!(error = %message, "Internal server error");
                let status = StatusCode::INTERNAL_SERVER_ERROR;
                (status, Json(ErrorResponse::plain(status, message))).into_response()
            }
            ApiError::Workflow(err) => {
                let status = workflow_status(&err);
                let kind = err.kind();
                let detail = err.to_string();
                let missing_question_ids = match err {
                    WorkflowError::IncompleteSubmission { missing_question_ids } => {
                        Some(missing_question_ids)
                    }
                    _ => None,
                };
                (
                    status,
                    Json(ErrorResponse {
                        status: status.as_u16(),
                        detail,
                        kind,
                        missing_question_ids,
                    }),
                )
                    .into_response()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    async fn render(error: ApiError) -> (StatusCode, serde_json::Value) {
        let response = error.into_response();
        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&body).unwrap())
    }

    #[tokio::test]
    async fn incomplete_submission_lists_missing_ids() {
        let (status, body) = render(ApiError::from(WorkflowError::IncompleteSubmission {
            missing_question_ids: vec!["q2".into(), "q3".into()],
        }))
        .await;

        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["kind"], "incomplete_submission");
        assert_eq!(body["missing_question_ids"], serde_json::json!(["q2", "q3"]));
    }

    #[tokio::test]
    async fn workflow_kinds_map_to_statuses() {
        let cases = [
            (WorkflowError::CourseNotFound, StatusCode::NOT_FOUND, "course_not_found"),
            (WorkflowError::ModuleNotFound, StatusCode::NOT_FOUND, "module_not_found"),
            (WorkflowError::NotEnrolled, StatusCode::FORBIDDEN, "not_enrolled"),
            (WorkflowError::QuizNotAvailable, StatusCode::BAD_REQUEST, "quiz_not_available"),
            (
                WorkflowError::NoAttemptsRemaining { max_attempts: 2 },
                StatusCode::CONFLICT,
                "no_attempts_remaining",
            ),
        ];

        for (error, expected_status, expected_kind) in cases {
            let (status, body) = render(ApiError::from(error)).await;
            assert_eq!(status, expected_status);
            assert_eq!(body["kind"], expected_kind);
            assert!(body.get("missing_question_ids").is_none());
        }
    }

    #[tokio::test]
    async fn storage_failures_hide_details() {
        let (status, body) =
            render(ApiError::from(WorkflowError::Storage(sqlx::Error::PoolTimedOut))).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["detail"], "Database error");
        assert!(body.get("kind").is_none());
    }

    #[tokio::test]
    async fn unauthorized_sets_challenge_header() {
        let response = ApiError::Unauthorized("Invalid authentication credentials").into_response();
        assert_eq!(response.headers()[header::WWW_AUTHENTICATE], "Bearer");
    }
}
