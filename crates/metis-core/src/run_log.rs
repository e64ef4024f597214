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

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::{RunRequest, RunState};

/// Log of a single task (or of the run as a whole for the top-level log).
///
/// Timestamps are RFC-3339 strings with UTC offset.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct TaskLog {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Command executed, one argv element per entry
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cmd: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stdout: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stderr: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exit_code: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_logs: Option<Vec<String>>,
}

/// The mutable per-run document served by the WES `GET /runs/{id}` endpoint.
///
/// Created in `QUEUED` by the API server; every later mutation comes from
/// the single preparer assigned to the run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct RunLog {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub run_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state: Option<RunState>,
    /// The request that created this run
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request: Option<RunRequest>,
    /// Top-level log for the run itself
    #[serde(skip_serializing_if = "Option::is_none")]
    pub run_log: Option<TaskLog>,
    /// Per-task logs as reported by the engine plugin
    #[serde(skip_serializing_if = "Option::is_none")]
    pub task_logs: Option<Vec<TaskLog>>,
    /// Workflow outputs as reported by the engine plugin
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outputs: Option<HashMap<String, serde_json::Value>>,
}

impl RunLog {
    /// A fresh `QUEUED` run log for a newly accepted submission.
    pub fn queued(run_id: &str, request: RunRequest) -> Self {
        RunLog {
            run_id: Some(run_id.to_string()),
            state: Some(RunState::Queued),
            request: Some(request),
            run_log: Some(TaskLog {
                name: Some(run_id.to_string()),
                ..Default::default()
            }),
            task_logs: None,
            outputs: None,
        }
    }

    pub fn state(&self) -> RunState {
        self.state.unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_queued_run_log() {
        let log = RunLog::queued("abc", RunRequest::default());
        assert_eq!(log.state(), RunState::Queued);
        assert_eq!(log.run_id.as_deref(), Some("abc"));
        let top = log.run_log.unwrap();
        assert_eq!(top.name.as_deref(), Some("abc"));
        assert!(top.start_time.is_none());
    }

    #[test]
    fn test_state_defaults_to_unknown() {
        let log = RunLog::default();
        assert_eq!(log.state(), RunState::Unknown);
    }
}
