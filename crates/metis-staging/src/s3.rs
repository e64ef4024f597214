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

use std::path::{Path, PathBuf};

use aws_sdk_s3::config::{BehaviorVersion, Credentials, Region};
use aws_sdk_s3::primitives::ByteStream;
use error_stack::ResultExt as _;
use metis_proto::pb::StagingInfo;

use crate::{Result, StagingError, StagingProvider};

/// S3-compatible staging provider.
///
/// Credentials, region and endpoint override come from the staging
/// parameter map, so a MinIO-style deployment needs only
/// `AWS_ENDPOINT_URL` (which also forces path-style addressing).
pub struct S3Provider {
    bucket: String,
    prefix: String,
}

impl S3Provider {
    pub fn new(bucket: impl Into<String>, prefix: impl Into<String>) -> Self {
        S3Provider {
            bucket: bucket.into(),
            prefix: prefix.into(),
        }
    }

    async fn client(&self, staging_info: &StagingInfo) -> aws_sdk_s3::Client {
        let parameters = &staging_info.parameters;
        let region = parameters
            .get("AWS_REGION")
            .cloned()
            .unwrap_or_else(|| "us-east-1".to_string());
        let credentials = Credentials::new(
            parameters
                .get("AWS_ACCESS_KEY_ID")
                .cloned()
                .unwrap_or_default(),
            parameters
                .get("AWS_SECRET_ACCESS_KEY")
                .cloned()
                .unwrap_or_default(),
            None,
            None,
            "metis-staging",
        );

        let shared = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(region))
            .credentials_provider(credentials)
            .load()
            .await;
        let mut builder = aws_sdk_s3::config::Builder::from(&shared);
        if let Some(endpoint) = parameters.get("AWS_ENDPOINT_URL") {
            builder = builder.endpoint_url(endpoint).force_path_style(true);
        }
        aws_sdk_s3::Client::from_conf(builder.build())
    }

    async fn put_file(
        &self,
        client: &aws_sdk_s3::Client,
        local_path: &Path,
        key: &str,
    ) -> Result<()> {
        let body = ByteStream::from_path(local_path)
            .await
            .change_context_lazy(|| StagingError::UploadFile(local_path.to_path_buf()))?;
        client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .body(body)
            .send()
            .await
            .change_context_lazy(|| StagingError::UploadFile(local_path.to_path_buf()))?;
        Ok(())
    }
}

/// Collect every non-directory entry under `root` together with its
/// slash-separated path relative to `root`.
pub(crate) async fn collect_files(root: &Path) -> Result<Vec<(PathBuf, String)>> {
    let mut files = Vec::new();
    let mut pending = vec![root.to_path_buf()];
    while let Some(dir) = pending.pop() {
        let mut entries = tokio::fs::read_dir(&dir)
            .await
            .change_context_lazy(|| StagingError::Walk(dir.clone()))?;
        while let Some(entry) = entries
            .next_entry()
            .await
            .change_context_lazy(|| StagingError::Walk(dir.clone()))?
        {
            let path = entry.path();
            let metadata = tokio::fs::metadata(&path)
                .await
                .change_context_lazy(|| StagingError::Walk(path.clone()))?;
            if metadata.is_dir() {
                pending.push(path);
            } else {
                let relative = path
                    .strip_prefix(root)
                    .map_err(|_| StagingError::Walk(path.clone()))?
                    .components()
                    .map(|component| component.as_os_str().to_string_lossy())
                    .collect::<Vec<_>>()
                    .join("/");
                files.push((path, relative));
            }
        }
    }
    files.sort_by(|a, b| a.1.cmp(&b.1));
    Ok(files)
}

#[async_trait::async_trait]
impl StagingProvider for S3Provider {
    fn uri(&self, run_id: &str) -> String {
        format!(
            "s3://{}/{}/{}",
            self.bucket,
            self.prefix.trim_matches('/'),
            run_id
        )
    }

    async fn upload_file(
        &self,
        local_path: &Path,
        remote_path: &str,
        staging_info: &StagingInfo,
    ) -> Result<()> {
        let client = self.client(staging_info).await;
        self.put_file(&client, local_path, remote_path).await
    }

    async fn upload_dir(
        &self,
        local_path: &Path,
        remote_path: &str,
        staging_info: &StagingInfo,
    ) -> Result<()> {
        let client = self.client(staging_info).await;
        for (path, relative) in collect_files(local_path).await? {
            let key = format!("{}/{}", remote_path.trim_end_matches('/'), relative);
            tracing::debug!(key = %key, "uploading output");
            self.put_file(&client, &path, &key).await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uri_shape() {
        let provider = S3Provider::new("metis", "workflows");
        assert_eq!(provider.uri("run-1"), "s3://metis/workflows/run-1");

        let provider = S3Provider::new("metis", "/nested/prefix/");
        assert_eq!(provider.uri("run-1"), "s3://metis/nested/prefix/run-1");
    }

    #[tokio::test]
    async fn test_collect_files_walks_recursively() {
        let dir = tempfile::tempdir().unwrap();
        tokio::fs::create_dir_all(dir.path().join("out/nested"))
            .await
            .unwrap();
        tokio::fs::write(dir.path().join("out/a"), b"a").await.unwrap();
        tokio::fs::write(dir.path().join("out/nested/b"), b"b")
            .await
            .unwrap();

        let files = collect_files(&dir.path().join("out")).await.unwrap();
        let relative: Vec<&str> = files.iter().map(|(_, rel)| rel.as_str()).collect();
        assert_eq!(relative, vec!["a", "nested/b"]);
    }

    #[tokio::test]
    async fn test_collect_files_empty_dir() {
        let dir = tempfile::tempdir().unwrap();
        let files = collect_files(dir.path()).await.unwrap();
        assert!(files.is_empty());
    }
}
