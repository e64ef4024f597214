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

use chrono::{DateTime, Utc};
use metis_core::{RunLog, RunRequest, RunState, TaskLog};
use serde::{Deserialize, Serialize};

/// Execution data of a single run: the WES run log plus the task array.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct WorkflowData {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub run_log: Option<RunLog>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tasks: Option<Vec<TaskLog>>,
}

/// A run document as stored in the workflow collection.
///
/// The store-native id (cursor key for pagination) is owned by the backend
/// and never appears here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct RunDocument {
    pub run_id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub workflow: WorkflowData,
}

impl RunDocument {
    /// A fresh document for a newly accepted submission, state `QUEUED`.
    pub fn queued(run_id: &str, request: RunRequest) -> Self {
        let now = Utc::now();
        RunDocument {
            run_id: run_id.to_string(),
            created_at: now,
            updated_at: now,
            workflow: WorkflowData {
                run_log: Some(RunLog::queued(run_id, request)),
                tasks: None,
            },
        }
    }

    pub fn state(&self) -> RunState {
        self.workflow
            .run_log
            .as_ref()
            .map(RunLog::state)
            .unwrap_or_default()
    }
}

/// One page of a paginated run listing.
#[derive(Debug, Clone, Default)]
pub struct RunPage {
    pub runs: Vec<RunDocument>,
    /// Opaque cursor for the next page; `None` on the last page
    pub next_page_token: Option<String>,
}
