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

use utoipa::OpenApi;
use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;

use crate::AppState;

mod runs;
mod service_info;
mod tasks;

const RUN_TAG: &str = "WorkflowRuns";
const SERVICE_TAG: &str = "ServiceInfo";

pub use runs::{PaginationQuery, RunId, RunListResponse, RunStatus};
pub use tasks::TaskListResponse;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Metis API",
        description = "GA4GH Workflow Execution Service",
        version = env!("CARGO_PKG_VERSION")
    ),
    tags(
        (name = RUN_TAG, description = "Workflow run endpoints"),
        (name = SERVICE_TAG, description = "Service capability endpoints")
    ),
    paths(
        runs::run_workflow,
        runs::list_runs,
        runs::get_run_log,
        runs::get_run_status,
        runs::cancel_run,
        tasks::list_tasks,
        tasks::get_task,
        service_info::get_service_info,
    ),
    components(schemas(
        runs::RunId,
        runs::RunStatus,
        runs::RunListResponse,
        tasks::TaskListResponse,
        service_info::ServiceInfo,
        metis_core::RunLog,
        metis_core::RunRequest,
        metis_core::RunState,
        metis_core::TaskLog,
        crate::ErrorResponse,
    )),
)]
struct MetisApi;

pub fn create_api_router() -> OpenApiRouter<AppState> {
    OpenApiRouter::with_openapi(MetisApi::openapi())
        .routes(routes!(runs::run_workflow))
        .routes(routes!(runs::list_runs))
        .routes(routes!(runs::get_run_log))
        .routes(routes!(runs::get_run_status))
        .routes(routes!(runs::cancel_run))
        .routes(routes!(tasks::list_tasks))
        .routes(routes!(tasks::get_task))
        .routes(routes!(service_info::get_service_info))
}
