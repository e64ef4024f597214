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

//! Staging of run outputs to a remote object store.
//!
//! [`StagingProvider`] abstracts the store; the only shipped provider is
//! S3-compatible. Providers are stateless per call: connection parameters
//! travel in the [`StagingInfo`] so the same values reach plugins.

mod s3;

pub use s3::S3Provider;

use std::path::{Path, PathBuf};

use error_stack::report;
use metis_proto::pb::StagingInfo;

#[derive(Debug, thiserror::Error)]
pub enum StagingError {
    #[error("unsupported staging provider type: {0}")]
    UnsupportedProviderType(String),
    #[error("failed to upload file {}", .0.display())]
    UploadFile(PathBuf),
    #[error("failed to walk output directory {}", .0.display())]
    Walk(PathBuf),
}

pub type Result<T, E = error_stack::Report<StagingError>> = std::result::Result<T, E>;

/// Uploads local run outputs to a remote staging area.
#[async_trait::async_trait]
pub trait StagingProvider: Send + Sync {
    /// The remote staging URI for a run, e.g. `s3://bucket/prefix/run-id`.
    fn uri(&self, run_id: &str) -> String;

    /// Upload a single file to `remote_path`.
    async fn upload_file(
        &self,
        local_path: &Path,
        remote_path: &str,
        staging_info: &StagingInfo,
    ) -> Result<()>;

    /// Recursively upload a directory; every non-directory entry lands at
    /// `<remote_path>/<relative path>`.
    async fn upload_dir(
        &self,
        local_path: &Path,
        remote_path: &str,
        staging_info: &StagingInfo,
    ) -> Result<()>;
}

/// Select a staging provider by configured kind.
pub fn provider_for(
    kind: &str,
    bucket: &str,
    prefix: &str,
) -> Result<Box<dyn StagingProvider>> {
    match kind {
        "s3" => Ok(Box::new(S3Provider::new(bucket, prefix))),
        other => Err(report!(StagingError::UnsupportedProviderType(
            other.to_string()
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_factory() {
        let provider = provider_for("s3", "metis", "workflows").unwrap();
        assert_eq!(provider.uri("run-1"), "s3://metis/workflows/run-1");

        let error = provider_for("gcs", "metis", "workflows").unwrap_err();
        assert!(matches!(
            error.current_context(),
            StagingError::UnsupportedProviderType(kind) if kind == "gcs"
        ));
    }
}
