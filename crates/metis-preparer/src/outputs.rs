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

use std::path::Path;

use error_stack::ResultExt as _;
use metis_proto::pb::StagingInfo;
use metis_staging::StagingProvider;

use crate::{PreparerError, Result};

/// Stage the declared outputs of a run to the remote staging area.
///
/// Each path is relative to the shared volume. A missing output is
/// skipped with a warning and never aborts staging; directories upload
/// recursively, everything else as a single object.
pub(crate) async fn stage_outputs(
    provider: &dyn StagingProvider,
    staging_info: &StagingInfo,
    mount_path: &Path,
    staging_prefix: &str,
    run_id: &str,
    outputs: &[String],
) -> Result<()> {
    for output in outputs {
        let relative = output.trim_matches('/');
        let local_path = mount_path.join(relative);
        let remote_path = format!("{}/{}/{}", staging_prefix.trim_matches('/'), run_id, relative);
        tracing::info!(local = %local_path.display(), remote = %remote_path, "staging output");

        let metadata = match tokio::fs::metadata(&local_path).await {
            Ok(metadata) => metadata,
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => {
                tracing::warn!(path = %local_path.display(), "output not found, skipping");
                continue;
            }
            Err(error) => {
                return Err(error)
                    .change_context(PreparerError::StageOutputs)
                    .attach_printable_lazy(|| format!("failed to stat output {output}"));
            }
        };

        if metadata.is_dir() {
            provider
                .upload_dir(&local_path, &remote_path, staging_info)
                .await
                .change_context(PreparerError::StageOutputs)
                .attach_printable_lazy(|| format!("failed to upload directory {output}"))?;
        } else {
            provider
                .upload_file(&local_path, &remote_path, staging_info)
                .await
                .change_context(PreparerError::StageOutputs)
                .attach_printable_lazy(|| format!("failed to upload file {output}"))?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingProvider {
        files: Mutex<Vec<(PathBuf, String)>>,
        dirs: Mutex<Vec<(PathBuf, String)>>,
    }

    #[async_trait::async_trait]
    impl StagingProvider for RecordingProvider {
        fn uri(&self, run_id: &str) -> String {
            format!("s3://test/workflows/{run_id}")
        }

        async fn upload_file(
            &self,
            local_path: &Path,
            remote_path: &str,
            _staging_info: &StagingInfo,
        ) -> metis_staging::Result<()> {
            self.files
                .lock()
                .unwrap()
                .push((local_path.to_path_buf(), remote_path.to_string()));
            Ok(())
        }

        async fn upload_dir(
            &self,
            local_path: &Path,
            remote_path: &str,
            _staging_info: &StagingInfo,
        ) -> metis_staging::Result<()> {
            self.dirs
                .lock()
                .unwrap()
                .push((local_path.to_path_buf(), remote_path.to_string()));
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_missing_outputs_are_skipped() {
        let mount = tempfile::tempdir().unwrap();
        tokio::fs::create_dir(mount.path().join("out")).await.unwrap();
        tokio::fs::write(mount.path().join("out/a"), b"a").await.unwrap();
        tokio::fs::write(mount.path().join("result.txt"), b"r")
            .await
            .unwrap();

        let provider = RecordingProvider::default();
        stage_outputs(
            &provider,
            &StagingInfo::default(),
            mount.path(),
            "workflows",
            "run-1",
            &[
                "out/".to_string(),
                "missing.txt".to_string(),
                "result.txt".to_string(),
            ],
        )
        .await
        .unwrap();

        let dirs = provider.dirs.lock().unwrap();
        assert_eq!(dirs.len(), 1);
        assert_eq!(dirs[0].0, mount.path().join("out"));
        assert_eq!(dirs[0].1, "workflows/run-1/out");

        let files = provider.files.lock().unwrap();
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].1, "workflows/run-1/result.txt");
    }

    #[tokio::test]
    async fn test_no_outputs_is_a_noop() {
        let mount = tempfile::tempdir().unwrap();
        let provider = RecordingProvider::default();
        stage_outputs(
            &provider,
            &StagingInfo::default(),
            mount.path(),
            "workflows",
            "run-1",
            &[],
        )
        .await
        .unwrap();
        assert!(provider.files.lock().unwrap().is_empty());
        assert!(provider.dirs.lock().unwrap().is_empty());
    }
}
