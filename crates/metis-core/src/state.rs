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

use serde::{Deserialize, Serialize};

/// State of a workflow run as reported to WES clients.
///
/// Serialises as the WES 1.x wire strings (`QUEUED`, `EXECUTOR_ERROR`, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RunState {
    /// The state of the run is unknown
    #[default]
    Unknown,
    /// The run has been accepted but is waiting for its preparer to start
    Queued,
    /// The preparer is setting the run up
    Initializing,
    /// The executor job has been launched
    Running,
    /// The run is paused (reserved)
    Paused,
    /// The run completed successfully
    Complete,
    /// The workflow command exited with an error
    ExecutorError,
    /// The run failed for reasons outside the workflow command
    SystemError,
    /// The run was cancelled
    Canceled,
    /// Cancellation has been requested but not yet observed
    Canceling,
}

impl RunState {
    /// Terminal states are never rewritten once stored.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            RunState::Complete
                | RunState::ExecutorError
                | RunState::SystemError
                | RunState::Canceled
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RunState::Unknown => "UNKNOWN",
            RunState::Queued => "QUEUED",
            RunState::Initializing => "INITIALIZING",
            RunState::Running => "RUNNING",
            RunState::Paused => "PAUSED",
            RunState::Complete => "COMPLETE",
            RunState::ExecutorError => "EXECUTOR_ERROR",
            RunState::SystemError => "SYSTEM_ERROR",
            RunState::Canceled => "CANCELED",
            RunState::Canceling => "CANCELING",
        }
    }
}

impl std::fmt::Display for RunState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wire_format() {
        assert_eq!(
            serde_json::to_string(&RunState::ExecutorError).unwrap(),
            "\"EXECUTOR_ERROR\""
        );
        assert_eq!(
            serde_json::from_str::<RunState>("\"COMPLETE\"").unwrap(),
            RunState::Complete
        );
        assert_eq!(RunState::SystemError.to_string(), "SYSTEM_ERROR");
    }

    #[test]
    fn test_terminal_states() {
        for state in [
            RunState::Complete,
            RunState::ExecutorError,
            RunState::SystemError,
            RunState::Canceled,
        ] {
            assert!(state.is_terminal(), "{state} should be terminal");
        }
        for state in [
            RunState::Unknown,
            RunState::Queued,
            RunState::Initializing,
            RunState::Running,
            RunState::Paused,
            RunState::Canceling,
        ] {
            assert!(!state.is_terminal(), "{state} should not be terminal");
        }
    }
}
