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

use axum::extract::{Multipart, Path, Query, State};
use axum::response::Json;
use error_stack::report;
use metis_core::{RunLog, RunRequest, RunState};
use metis_kube::Attachment;
use metis_state::{RunDocument, RunStore as _};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::{ErrorResponse, ServerError};
use crate::AppState;

/// Response of a successful submission.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RunId {
    pub run_id: String,
}

/// State of a single run as returned by status and list endpoints.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RunStatus {
    pub run_id: String,
    pub state: RunState,
}

/// Response for listing runs.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RunListResponse {
    pub runs: Vec<RunStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_page_token: Option<String>,
}

/// Cursor pagination parameters shared by the list endpoints.
#[derive(Debug, Clone, Default, Deserialize, ToSchema, utoipa::IntoParams)]
pub struct PaginationQuery {
    pub page_size: Option<i64>,
    pub page_token: Option<String>,
}

const DEFAULT_PAGE_SIZE: i64 = 20;

pub(crate) fn effective_page_size(requested: Option<i64>) -> i64 {
    match requested {
        Some(size) if size > 0 => size,
        _ => DEFAULT_PAGE_SIZE,
    }
}

/// The parsed multipart submission: WES fields plus attachments.
pub(crate) struct ParsedSubmission {
    pub request: RunRequest,
    pub attachments: Vec<Attachment>,
}

/// Map the multipart form onto a run request.
///
/// The WES spec sends the map-valued fields as JSON strings; entries that
/// fail to parse are dropped with a warning, matching lenient servers.
pub(crate) async fn parse_run_request(
    multipart: &mut Multipart,
) -> Result<ParsedSubmission, ErrorResponse> {
    let mut request = RunRequest::default();
    let mut attachments = Vec::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|_| ErrorResponse::from(ServerError::MalformedForm))?
    {
        let Some(name) = field.name().map(str::to_string) else {
            continue;
        };
        if name == "workflow_attachment" {
            let filename = field.file_name().unwrap_or_default().to_string();
            let bytes = field
                .bytes()
                .await
                .map_err(|_| ErrorResponse::from(ServerError::MalformedForm))?;
            attachments.push(Attachment {
                filename,
                bytes: bytes.to_vec(),
            });
            continue;
        }

        let value = field
            .text()
            .await
            .map_err(|_| ErrorResponse::from(ServerError::MalformedForm))?;
        match name.as_str() {
            "workflow_url" => request.workflow_url = value,
            "workflow_type" => request.workflow_type = value,
            "workflow_type_version" => request.workflow_type_version = value,
            "workflow_engine" => {
                request.workflow_engine = (!value.is_empty()).then_some(value);
            }
            "workflow_engine_version" => {
                request.workflow_engine_version = (!value.is_empty()).then_some(value);
            }
            "workflow_params" if !value.is_empty() => match serde_json::from_str(&value) {
                Ok(params) => request.workflow_params = Some(params),
                Err(error) => {
                    tracing::warn!(%error, "failed to parse workflow_params");
                }
            },
            "workflow_engine_parameters" if !value.is_empty() => {
                match serde_json::from_str(&value) {
                    Ok(params) => request.workflow_engine_parameters = Some(params),
                    Err(error) => {
                        tracing::warn!(%error, "failed to parse workflow_engine_parameters");
                    }
                }
            }
            "tags" if !value.is_empty() => match serde_json::from_str(&value) {
                Ok(tags) => request.tags = Some(tags),
                Err(error) => {
                    tracing::warn!(%error, "failed to parse tags");
                }
            },
            _ => {}
        }
    }

    Ok(ParsedSubmission {
        request,
        attachments,
    })
}

/// Submit a workflow run
///
/// Materialises the attachments as config maps, provisions the shared
/// volume, launches the preparer job and records the run as `QUEUED`.
#[utoipa::path(
    post,
    path = "/runs",
    responses(
        (status = 200, description = "Run accepted", body = RunId),
        (status = 400, description = "Malformed multipart form", body = ErrorResponse),
        (status = 500, description = "Cluster or store failure", body = ErrorResponse)
    ),
    tag = crate::api::RUN_TAG,
)]
pub async fn run_workflow(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<RunId>, ErrorResponse> {
    let run_id = Uuid::new_v4().to_string();
    tracing::info!(%run_id, "starting workflow run");

    let submission = parse_run_request(&mut multipart).await?;
    let kubernetes = &state.config.kubernetes;

    let attachment_config_maps = metis_kube::create_attachment_config_maps(
        &state.kube,
        kubernetes,
        &run_id,
        &submission.attachments,
    )
    .await?;

    let pvc = metis_kube::create_pvc_for_run(&state.kube, kubernetes, &run_id).await?;
    let pvc_name = pvc.metadata.name.clone().unwrap_or_default();

    let job = metis_kube::create_preparer_job(
        &state.kube,
        kubernetes,
        &run_id,
        &submission.request,
        &pvc_name,
        &attachment_config_maps,
    )
    .await?;
    tracing::debug!(job = ?job.metadata.name, "created preparer job");

    metis_kube::set_owner_references(
        &state.kube,
        kubernetes,
        &job,
        Some(&pvc_name),
        &attachment_config_maps,
    )
    .await;

    state
        .store
        .insert_run(RunDocument::queued(&run_id, submission.request))
        .await?;

    tracing::info!(%run_id, "successfully started workflow run");
    Ok(Json(RunId { run_id }))
}

/// List workflow runs
#[utoipa::path(
    get,
    path = "/runs",
    params(PaginationQuery),
    responses(
        (status = 200, description = "Runs listed", body = RunListResponse),
        (status = 400, description = "Invalid page token", body = ErrorResponse),
        (status = 500, description = "Store failure", body = ErrorResponse)
    ),
    tag = crate::api::RUN_TAG,
)]
pub async fn list_runs(
    State(state): State<AppState>,
    Query(query): Query<PaginationQuery>,
) -> Result<Json<RunListResponse>, ErrorResponse> {
    let page = state
        .store
        .list_runs(
            effective_page_size(query.page_size),
            query.page_token.as_deref(),
        )
        .await?;

    let runs = page
        .runs
        .into_iter()
        .map(|document| RunStatus {
            state: document.state(),
            run_id: document.run_id,
        })
        .collect();

    Ok(Json(RunListResponse {
        runs,
        next_page_token: page.next_page_token,
    }))
}

pub(crate) async fn fetch_run(
    state: &AppState,
    run_id: &str,
) -> Result<RunDocument, ErrorResponse> {
    state
        .store
        .get_run(run_id)
        .await?
        .ok_or_else(|| report!(ServerError::RunNotFound(run_id.to_string())).into())
}

/// Get the full run log
#[utoipa::path(
    get,
    path = "/runs/{run_id}",
    params(("run_id" = String, Path, description = "Run id")),
    responses(
        (status = 200, description = "Run log", body = metis_core::RunLog),
        (status = 404, description = "Run not found", body = ErrorResponse),
        (status = 500, description = "Store failure", body = ErrorResponse)
    ),
    tag = crate::api::RUN_TAG,
)]
pub async fn get_run_log(
    State(state): State<AppState>,
    Path(run_id): Path<String>,
) -> Result<Json<RunLog>, ErrorResponse> {
    let document = fetch_run(&state, &run_id).await?;
    let run_log = document
        .workflow
        .run_log
        .ok_or_else(|| ErrorResponse::from(ServerError::RunNotFound(run_id)))?;
    Ok(Json(run_log))
}

/// Get the state of a run
#[utoipa::path(
    get,
    path = "/runs/{run_id}/status",
    params(("run_id" = String, Path, description = "Run id")),
    responses(
        (status = 200, description = "Run status", body = RunStatus),
        (status = 404, description = "Run not found", body = ErrorResponse),
        (status = 500, description = "Store failure", body = ErrorResponse)
    ),
    tag = crate::api::RUN_TAG,
)]
pub async fn get_run_status(
    State(state): State<AppState>,
    Path(run_id): Path<String>,
) -> Result<Json<RunStatus>, ErrorResponse> {
    let document = fetch_run(&state, &run_id).await?;
    Ok(Json(RunStatus {
        state: document.state(),
        run_id: document.run_id,
    }))
}

/// Cancel a run
///
/// Deletes the run's executor and preparer jobs (the cluster cascade
/// removes their owned objects) and records the run as `CANCELED`.
#[utoipa::path(
    post,
    path = "/runs/{run_id}/cancel",
    params(("run_id" = String, Path, description = "Run id")),
    responses(
        (status = 200, description = "Run cancelled", body = RunId),
        (status = 404, description = "Run not found", body = ErrorResponse),
        (status = 409, description = "Run already terminal", body = ErrorResponse),
        (status = 500, description = "Cluster or store failure", body = ErrorResponse)
    ),
    tag = crate::api::RUN_TAG,
)]
pub async fn cancel_run(
    State(state): State<AppState>,
    Path(run_id): Path<String>,
) -> Result<Json<RunId>, ErrorResponse> {
    let document = fetch_run(&state, &run_id).await?;
    let current = document.state();
    if current.is_terminal() {
        return Err(report!(ServerError::RunNotCancellable {
            run_id,
            state: current
        })
        .into());
    }

    metis_kube::cancel_run_jobs(&state.kube, &state.config.kubernetes, &run_id).await?;
    state
        .store
        .update_run_state(&run_id, RunState::Canceled, None)
        .await?;

    Ok(Json(RunId { run_id }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_effective_page_size() {
        assert_eq!(effective_page_size(None), 20);
        assert_eq!(effective_page_size(Some(0)), 20);
        assert_eq!(effective_page_size(Some(-3)), 20);
        assert_eq!(effective_page_size(Some(2)), 2);
    }
}
