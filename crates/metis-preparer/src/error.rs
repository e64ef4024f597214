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

use error_stack::Report;

#[derive(Debug, thiserror::Error)]
pub enum PreparerError {
    #[error("no suitable plugin found")]
    NoSuitablePlugin,
    #[error("failed to download workflow")]
    Download,
    #[error("failed to get staging provider")]
    Staging,
    #[error("could not get execution spec")]
    GetExecutionSpec,
    #[error("failed to launch job")]
    LaunchJob,
    #[error("failed to watch job")]
    WatchJob,
    #[error("failed to stage outputs")]
    StageOutputs,
    #[error("failed to parse execution")]
    ParseExecution,
    #[error("failed to update run document")]
    StoreUpdate,
}

pub type Result<T, E = Report<PreparerError>> = std::result::Result<T, E>;

/// Render the context chain of a report, outermost first, the way wrapped
/// errors print. This is what lands in the run document's stderr.
pub(crate) fn error_chain<C>(report: &Report<C>) -> String {
    report
        .frames()
        .filter_map(|frame| match frame.kind() {
            error_stack::FrameKind::Context(context) => Some(context.to_string()),
            error_stack::FrameKind::Attachment(_) => None,
        })
        .collect::<Vec<_>>()
        .join(": ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use error_stack::{report, ResultExt as _};

    #[test]
    fn test_error_chain_single() {
        let report = report!(PreparerError::NoSuitablePlugin);
        assert_eq!(error_chain(&report), "no suitable plugin found");
    }

    #[test]
    fn test_error_chain_nested() {
        let result: std::result::Result<(), _> =
            Err(report!(PreparerError::GetExecutionSpec));
        let report = result.change_context(PreparerError::LaunchJob).unwrap_err();
        assert_eq!(
            error_chain(&report),
            "failed to launch job: could not get execution spec"
        );
    }
}
