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

//! Workflow download into the shared volume.
//!
//! A factory dispatches on the URL scheme: `http(s)` streams a single
//! file, `file` resolves an attachment already placed on the shared
//! volume, and `trs` speaks the two-step Tool Registry Service protocol.
//! Every downloader returns the absolute path of the primary descriptor.

mod error;
mod file;
mod http;
mod trs;

pub use error::{DownloadError, Result};
pub use file::FileDownloader;
pub use http::HttpDownloader;
pub use trs::TrsDownloader;

use std::path::{Path, PathBuf};

use error_stack::{report, ResultExt as _};

/// Fetches a workflow into the shared volume.
#[async_trait::async_trait]
pub trait Downloader: Send + Sync {
    /// Download the workflow at `url` into `destination` and return the
    /// absolute path of the primary descriptor.
    ///
    /// `descriptor_type` is the request's workflow type; only the TRS
    /// downloader consults it.
    async fn download(
        &self,
        url: &str,
        destination: &Path,
        descriptor_type: &str,
    ) -> Result<PathBuf>;
}

/// Select a downloader for the URL scheme.
pub fn downloader_for(raw_url: &str) -> Result<Box<dyn Downloader>> {
    let parsed = url::Url::parse(raw_url)
        .change_context(DownloadError::InvalidUrl(raw_url.to_string()))?;
    match parsed.scheme() {
        "http" | "https" => Ok(Box::new(HttpDownloader::new())),
        "file" => Ok(Box::new(FileDownloader)),
        "trs" => Ok(Box::new(TrsDownloader::new())),
        scheme => Err(report!(DownloadError::UnsupportedProtocol(
            scheme.to_string()
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scheme_dispatch() {
        assert!(downloader_for("https://example.org/wf.wdl").is_ok());
        assert!(downloader_for("http://example.org/wf.wdl").is_ok());
        assert!(downloader_for("file://hello.wdl").is_ok());
        assert!(downloader_for("trs://registry.example.org/tool-A/v1").is_ok());
    }

    #[test]
    fn test_unknown_scheme_rejected() {
        let error = downloader_for("ftp://example.org/wf.wdl").unwrap_err();
        assert!(matches!(
            error.current_context(),
            DownloadError::UnsupportedProtocol(scheme) if scheme == "ftp"
        ));
    }

    #[test]
    fn test_garbage_url_rejected() {
        let error = downloader_for("not a url").unwrap_err();
        assert!(matches!(
            error.current_context(),
            DownloadError::InvalidUrl(_)
        ));
    }
}
