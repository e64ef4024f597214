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

use crate::RunState;

/// Terminal classification of an executor job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobOutcome {
    /// The job completed successfully
    Succeeded,
    /// The workflow command exited non-zero
    FailedCommand,
    /// The job failed before or outside the command (scheduling, image pull, ...)
    FailedSystem,
}

impl JobOutcome {
    /// The run state a terminal job outcome maps to.
    pub fn run_state(&self) -> RunState {
        match self {
            JobOutcome::Succeeded => RunState::Complete,
            JobOutcome::FailedCommand => RunState::ExecutorError,
            JobOutcome::FailedSystem => RunState::SystemError,
        }
    }
}

/// Outcome of watching an executor job to termination.
///
/// Assigned exactly once per executor job and never revised.
#[derive(Debug, Clone)]
pub struct JobResult {
    pub outcome: JobOutcome,
    /// Concatenated pod logs for the job
    pub logs: String,
    /// Diagnostic message for failed outcomes
    pub message: Option<String>,
}

impl JobResult {
    pub fn succeeded(logs: String) -> Self {
        JobResult {
            outcome: JobOutcome::Succeeded,
            logs,
            message: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_state_mapping() {
        assert_eq!(JobOutcome::Succeeded.run_state(), RunState::Complete);
        assert_eq!(JobOutcome::FailedCommand.run_state(), RunState::ExecutorError);
        assert_eq!(JobOutcome::FailedSystem.run_state(), RunState::SystemError);
    }
}
