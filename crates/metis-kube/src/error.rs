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

#[derive(Debug, thiserror::Error)]
pub enum KubeError {
    #[error("Failed to build Kubernetes client")]
    Client,
    #[error("Failed to create {0}")]
    CreateResource(String),
    #[error("Failed to get {0}")]
    GetResource(String),
    #[error("Failed to delete {0}")]
    DeleteResource(String),
    #[error("Failed to watch job {0}")]
    Watch(String),
    #[error("Job {0} did not reach a terminal state")]
    JobNotFinished(String),
}

pub type Result<T, E = error_stack::Report<KubeError>> = std::result::Result<T, E>;
