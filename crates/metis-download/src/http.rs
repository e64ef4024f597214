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

use error_stack::{report, ResultExt as _};
use futures::TryStreamExt as _;
use tokio::io::AsyncWriteExt as _;

use crate::{DownloadError, Downloader, Result};

/// Streams a single workflow file over HTTP(S).
///
/// The destination filename is the last segment of the URL path.
pub struct HttpDownloader {
    client: reqwest::Client,
}

impl HttpDownloader {
    pub fn new() -> Self {
        HttpDownloader {
            client: reqwest::Client::new(),
        }
    }
}

impl Default for HttpDownloader {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl Downloader for HttpDownloader {
    async fn download(
        &self,
        url: &str,
        destination: &Path,
        _descriptor_type: &str,
    ) -> Result<PathBuf> {
        let parsed =
            url::Url::parse(url).change_context(DownloadError::InvalidUrl(url.to_string()))?;
        let file_name = parsed
            .path_segments()
            .and_then(|mut segments| segments.next_back())
            .filter(|segment| !segment.is_empty())
            .ok_or_else(|| report!(DownloadError::InvalidUrl(url.to_string())))?
            .to_string();
        let file_path = destination.join(file_name);

        let response = self
            .client
            .get(parsed)
            .send()
            .await
            .change_context(DownloadError::FileDownload(url.to_string()))?
            .error_for_status()
            .change_context(DownloadError::FileDownload(url.to_string()))?;

        let mut out = tokio::fs::File::create(&file_path)
            .await
            .change_context_lazy(|| DownloadError::FileCreation(file_path.clone()))?;
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream
            .try_next()
            .await
            .change_context(DownloadError::FileDownload(url.to_string()))?
        {
            out.write_all(&chunk)
                .await
                .change_context_lazy(|| DownloadError::FileWrite(file_path.clone()))?;
        }
        out.flush()
            .await
            .change_context_lazy(|| DownloadError::FileWrite(file_path.clone()))?;

        Ok(file_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_url_without_filename_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let downloader = HttpDownloader::new();
        let error = downloader
            .download("https://example.org/", dir.path(), "WDL")
            .await
            .unwrap_err();
        assert!(matches!(
            error.current_context(),
            DownloadError::InvalidUrl(_)
        ));
    }
}
