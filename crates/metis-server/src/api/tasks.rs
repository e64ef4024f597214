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

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::Json;
use error_stack::report;
use metis_core::TaskLog;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::api::runs::{effective_page_size, fetch_run, PaginationQuery};
use crate::error::{ErrorResponse, ServerError};
use crate::AppState;

/// Response for listing the tasks of a run.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TaskListResponse {
    pub task_logs: Vec<TaskLog>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_page_token: Option<String>,
}

/// Tasks live inside the run document, so their cursor is a plain index
/// token of the form `task_<offset>`.
pub(crate) fn parse_task_token(token: &str) -> Option<usize> {
    token.strip_prefix("task_")?.parse().ok()
}

pub(crate) fn paginate_tasks(
    tasks: &[TaskLog],
    page_size: i64,
    start: usize,
) -> (Vec<TaskLog>, Option<String>) {
    let start = start.min(tasks.len());
    let end = start.saturating_add(page_size as usize).min(tasks.len());
    let next = (end < tasks.len()).then(|| format!("task_{end}"));
    (tasks[start..end].to_vec(), next)
}

/// List the tasks of a run
#[utoipa::path(
    get,
    path = "/runs/{run_id}/tasks",
    params(
        ("run_id" = String, Path, description = "Run id"),
        PaginationQuery
    ),
    responses(
        (status = 200, description = "Task list", body = TaskListResponse),
        (status = 400, description = "Invalid page token", body = ErrorResponse),
        (status = 404, description = "Run not found", body = ErrorResponse),
        (status = 500, description = "Store failure", body = ErrorResponse)
    ),
    tag = crate::api::RUN_TAG,
)]
pub async fn list_tasks(
    State(state): State<AppState>,
    Path(run_id): Path<String>,
    Query(query): Query<PaginationQuery>,
) -> Result<Json<TaskListResponse>, ErrorResponse> {
    let document = fetch_run(&state, &run_id).await?;
    let tasks = document.workflow.tasks.unwrap_or_default();

    let start = match query.page_token.as_deref() {
        None | Some("") => 0,
        Some(token) => parse_task_token(token).ok_or_else(|| {
            ErrorResponse::new(
                StatusCode::BAD_REQUEST,
                format!("Invalid page token for tasks: {token}"),
            )
        })?,
    };

    let (task_logs, next_page_token) =
        paginate_tasks(&tasks, effective_page_size(query.page_size), start);
    Ok(Json(TaskListResponse {
        task_logs,
        next_page_token,
    }))
}

/// Get a single task log by name
#[utoipa::path(
    get,
    path = "/runs/{run_id}/tasks/{task_name}",
    params(
        ("run_id" = String, Path, description = "Run id"),
        ("task_name" = String, Path, description = "Task name")
    ),
    responses(
        (status = 200, description = "Task log", body = metis_core::TaskLog),
        (status = 404, description = "Run or task not found", body = ErrorResponse),
        (status = 500, description = "Store failure", body = ErrorResponse)
    ),
    tag = crate::api::RUN_TAG,
)]
pub async fn get_task(
    State(state): State<AppState>,
    Path((run_id, task_name)): Path<(String, String)>,
) -> Result<Json<TaskLog>, ErrorResponse> {
    let document = fetch_run(&state, &run_id).await?;
    let task = document
        .workflow
        .tasks
        .unwrap_or_default()
        .into_iter()
        .find(|task| task.name.as_deref() == Some(task_name.as_str()));

    match task {
        Some(task) => Ok(Json(task)),
        None => Err(report!(ServerError::TaskNotFound {
            run_id,
            task: task_name
        })
        .into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn task(name: &str) -> TaskLog {
        TaskLog {
            name: Some(name.to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_task_token_parsing() {
        assert_eq!(parse_task_token("task_0"), Some(0));
        assert_eq!(parse_task_token("task_12"), Some(12));
        assert_eq!(parse_task_token("task_"), None);
        assert_eq!(parse_task_token("12"), None);
        assert_eq!(parse_task_token("task_x"), None);
    }

    #[test]
    fn test_task_pagination() {
        let tasks: Vec<TaskLog> = (0..5).map(|i| task(&format!("t{i}"))).collect();

        let (page, next) = paginate_tasks(&tasks, 2, 0);
        assert_eq!(page.len(), 2);
        assert_eq!(next.as_deref(), Some("task_2"));

        let (page, next) = paginate_tasks(&tasks, 2, 4);
        assert_eq!(page.len(), 1);
        assert_eq!(page[0].name.as_deref(), Some("t4"));
        assert!(next.is_none());

        // A stale token past the end yields an empty page, not an error.
        let (page, next) = paginate_tasks(&tasks, 2, 9);
        assert!(page.is_empty());
        assert!(next.is_none());
    }
}
