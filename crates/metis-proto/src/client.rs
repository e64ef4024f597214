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

use std::time::Duration;

use error_stack::{Report, ResultExt as _};

use crate::pb::plugin_execution_client::PluginExecutionClient;
use crate::pb::{ExecutionSpec, GetExecutionSpecRequest, ParseExecutionRequest, WesRunLog};

#[derive(Debug, thiserror::Error)]
pub enum PluginError {
    #[error("Failed to connect to plugin at {0}")]
    Connect(String),
    #[error("GetExecutionSpec call failed")]
    GetExecutionSpec,
    #[error("ParseExecution call failed")]
    ParseExecution,
    #[error("Plugin call exceeded its {0:?} deadline")]
    Deadline(Duration),
}

pub type Result<T, E = Report<PluginError>> = std::result::Result<T, E>;

/// Deadline-aware client for a single plugin endpoint.
///
/// A connection is dialled per call; the plugin URL scheme decides the
/// transport (plaintext `http://` in the default deployment).
#[derive(Debug, Clone)]
pub struct PluginClient {
    url: String,
    get_spec_deadline: Duration,
    parse_deadline: Duration,
}

impl PluginClient {
    pub const DEFAULT_GET_SPEC_DEADLINE: Duration = Duration::from_secs(1);
    pub const DEFAULT_PARSE_DEADLINE: Duration = Duration::from_secs(10);

    pub fn new(url: impl Into<String>) -> Self {
        PluginClient {
            url: url.into(),
            get_spec_deadline: Self::DEFAULT_GET_SPEC_DEADLINE,
            parse_deadline: Self::DEFAULT_PARSE_DEADLINE,
        }
    }

    /// Raise the per-call deadlines above their floors.
    pub fn with_deadlines(mut self, get_spec: Duration, parse: Duration) -> Self {
        self.get_spec_deadline = get_spec.max(Self::DEFAULT_GET_SPEC_DEADLINE);
        self.parse_deadline = parse.max(Self::DEFAULT_PARSE_DEADLINE);
        self
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Translate a WES request into a concrete execution spec.
    ///
    /// A failure here is fatal for the run.
    pub async fn get_execution_spec(
        &self,
        request: GetExecutionSpecRequest,
    ) -> Result<ExecutionSpec> {
        let deadline = self.get_spec_deadline;
        let response = tokio::time::timeout(deadline, async {
            let mut client = PluginExecutionClient::connect(self.url.clone())
                .await
                .change_context_lazy(|| PluginError::Connect(self.url.clone()))?;
            client
                .get_execution_spec(request)
                .await
                .change_context(PluginError::GetExecutionSpec)
        })
        .await
        .map_err(|_| Report::new(PluginError::Deadline(deadline)))??;
        Ok(response.into_inner())
    }

    /// Parse raw executor job logs into a canonical run log.
    ///
    /// Called once after the job reached a terminal outcome; a failure here
    /// is fatal for the run (there is no fallback parser).
    pub async fn parse_execution(&self, request: ParseExecutionRequest) -> Result<WesRunLog> {
        let deadline = self.parse_deadline;
        let response = tokio::time::timeout(deadline, async {
            let mut client = PluginExecutionClient::connect(self.url.clone())
                .await
                .change_context_lazy(|| PluginError::Connect(self.url.clone()))?;
            client
                .parse_execution(request)
                .await
                .change_context(PluginError::ParseExecution)
        })
        .await
        .map_err(|_| Report::new(PluginError::Deadline(deadline)))??;
        Ok(response.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deadline_floors() {
        let client = PluginClient::new("http://plugin:50051")
            .with_deadlines(Duration::from_millis(1), Duration::from_millis(1));
        assert_eq!(client.get_spec_deadline, PluginClient::DEFAULT_GET_SPEC_DEADLINE);
        assert_eq!(client.parse_deadline, PluginClient::DEFAULT_PARSE_DEADLINE);

        let client = PluginClient::new("http://plugin:50051")
            .with_deadlines(Duration::from_secs(5), Duration::from_secs(30));
        assert_eq!(client.get_spec_deadline, Duration::from_secs(5));
        assert_eq!(client.parse_deadline, Duration::from_secs(30));
    }

    #[tokio::test]
    async fn test_connect_failure_is_reported() {
        // Nothing listens on this port; the dial must fail inside the deadline.
        let client = PluginClient::new("http://127.0.0.1:1");
        let result = client
            .get_execution_spec(GetExecutionSpecRequest::default())
            .await;
        assert!(result.is_err());
    }
}
