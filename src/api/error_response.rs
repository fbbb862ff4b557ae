//! HTTP error response handling for the API
//!
//! Domain errors become HTTP responses with the status from
//! [`ToHttpStatus`] and an [`ApiError`] JSON body.

use crate::error::{ApiError, Error, ToHttpStatus};
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};

/// Implement IntoResponse for Error to automatically convert errors to HTTP responses
impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status_code =
            StatusCode::from_u16(self.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        if status_code.is_server_error() {
            tracing::error!(error = %self, status = status_code.as_u16(), "Request failed");
        } else {
            tracing::debug!(error = %self, status = status_code.as_u16(), "Request rejected");
        }

        let api_error: ApiError = self.into();

        (status_code, Json(api_error)).into_response()
    }
}

/// Implement IntoResponse for ApiError for explicit error responses
impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        // Errors with a known status go through Error::into_response
        (StatusCode::INTERNAL_SERVER_ERROR, Json(self)).into_response()
    }
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TaskError;

    async fn body_of(response: Response) -> ApiError {
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&body).unwrap()
    }

    #[tokio::test]
    async fn not_ready_becomes_conflict_with_details() {
        let response = Error::Task(TaskError::NotReady {
            id: "t-9".into(),
            status: "processing".into(),
        })
        .into_response();

        assert_eq!(response.status(), StatusCode::CONFLICT);
        let api_error = body_of(response).await;
        assert_eq!(api_error.error.code, "not_ready");
        assert_eq!(api_error.error.details.as_ref().unwrap()["task_id"], "t-9");
        assert_eq!(
            api_error.error.details.as_ref().unwrap()["status"],
            "processing"
        );
    }

    #[tokio::test]
    async fn invalid_input_becomes_bad_request() {
        let response = Error::InvalidInput("urls must be a non-empty array".into()).into_response();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let api_error = body_of(response).await;
        assert_eq!(api_error.error.code, "invalid_input");
        assert!(api_error.error.message.contains("non-empty"));
    }

    #[tokio::test]
    async fn timeout_becomes_gateway_timeout() {
        let response = Error::Timeout.into_response();
        assert_eq!(response.status(), StatusCode::GATEWAY_TIMEOUT);
        assert_eq!(body_of(response).await.error.code, "timeout");
    }

    #[tokio::test]
    async fn bare_api_error_is_internal() {
        let response = ApiError::internal("boom").into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
