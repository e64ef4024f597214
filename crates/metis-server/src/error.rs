// Copyright 2025 DataStax Inc.
//
// Licensed under the Apache License, Version 2.0 (the "License"); you may not use this file except
// in compliance with the License. You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software distributed under the License
// is distributed on an "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express
// or implied. See the License for the specific language governing permissions and limitations under
// the License.

use axum::http::StatusCode;
use axum::response::IntoResponse;
use metis_core::RunState;
use metis_state::StateError;
use serde::{Deserialize, Serialize};

#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("Workflow run '{0}' not found")]
    RunNotFound(String),
    #[error("Task '{task}' not found in run '{run_id}'")]
    TaskNotFound { run_id: String, task: String },
    #[error("Failed to parse multipart form")]
    MalformedForm,
    #[error("Run '{run_id}' cannot be cancelled (state: {state})")]
    RunNotCancellable { run_id: String, state: RunState },
}

impl ServerError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ServerError::RunNotFound(_) | ServerError::TaskNotFound { .. } => {
                StatusCode::NOT_FOUND
            }
            ServerError::MalformedForm => StatusCode::BAD_REQUEST,
            ServerError::RunNotCancellable { .. } => StatusCode::CONFLICT,
        }
    }
}

/// WES error body: `{msg, status_code}`. Handler errors convert into this
/// via their `error_stack::Report`; internal detail never leaks.
#[derive(Debug, Serialize, Deserialize, utoipa::ToSchema)]
pub struct ErrorResponse {
    pub msg: String,
    pub status_code: u16,
}

impl ErrorResponse {
    pub fn new(code: StatusCode, msg: impl Into<String>) -> Self {
        ErrorResponse {
            msg: msg.into(),
            status_code: code.as_u16(),
        }
    }
}

impl IntoResponse for ErrorResponse {
    fn into_response(self) -> axum::response::Response {
        let code = StatusCode::from_u16(self.status_code)
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (code, axum::Json(self)).into_response()
    }
}

impl From<ServerError> for ErrorResponse {
    fn from(error: ServerError) -> Self {
        ErrorResponse::new(error.status_code(), error.to_string())
    }
}

impl<C: error_stack::Context> From<error_stack::Report<C>> for ErrorResponse {
    fn from(report: error_stack::Report<C>) -> Self {
        tracing::error!(?report, "request failed");
        if let Some(error) = report.downcast_ref::<ServerError>() {
            return ErrorResponse::new(error.status_code(), error.to_string());
        }
        if let Some(StateError::InvalidPageToken { token }) = report.downcast_ref::<StateError>() {
            return ErrorResponse::new(
                StatusCode::BAD_REQUEST,
                format!("Invalid page token: {token}"),
            );
        }
        ErrorResponse::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            report.current_context().to_string(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use error_stack::report;

    #[test]
    fn test_status_mapping() {
        let response: ErrorResponse =
            report!(ServerError::RunNotFound("run-1".to_string())).into();
        assert_eq!(response.status_code, 404);
        assert!(response.msg.contains("run-1"));

        let response: ErrorResponse = report!(StateError::InvalidPageToken {
            token: "zzz".to_string()
        })
        .into();
        assert_eq!(response.status_code, 400);

        let response: ErrorResponse = report!(StateError::Internal).into();
        assert_eq!(response.status_code, 500);
    }

    #[test]
    fn test_body_shape() {
        let response = ErrorResponse::new(StatusCode::BAD_REQUEST, "Failed to parse");
        let body = serde_json::to_value(&response).unwrap();
        assert_eq!(
            body,
            serde_json::json!({"msg": "Failed to parse", "status_code": 400})
        );
    }
}
