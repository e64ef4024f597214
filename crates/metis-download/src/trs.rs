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
use serde::Deserialize;
use tokio::io::AsyncWriteExt as _;

use crate::{DownloadError, Downloader, Result};

/// File entry of a TRS `/files` listing.
#[derive(Debug, Deserialize)]
pub struct TrsFileMetadata {
    #[serde(default)]
    pub file_type: String,
    #[serde(default)]
    pub path: String,
    #[serde(default)]
    pub checksum: Vec<TrsChecksum>,
}

#[derive(Debug, Deserialize)]
pub struct TrsChecksum {
    #[serde(default)]
    pub checksum: String,
    #[serde(rename = "type", default)]
    pub checksum_type: String,
}

/// Response of a TRS `/descriptor/{path}` call: either inline content or
/// a URL to fetch.
#[derive(Debug, Deserialize)]
pub struct TrsFileDescriptor {
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub checksum: Vec<TrsChecksum>,
}

/// Components of a `trs://` workflow URL.
///
/// The registry host is everything between the scheme and the trailing
/// `<tool_id>/<version>` segments.
#[derive(Debug, PartialEq, Eq)]
pub(crate) struct TrsLocation {
    pub server: String,
    pub tool_id: String,
    pub version: String,
}

pub(crate) fn parse_trs_url(url: &str) -> Result<TrsLocation> {
    let rest = url
        .strip_prefix("trs://")
        .ok_or_else(|| report!(DownloadError::TrsUrl(url.to_string())))?;
    let parts: Vec<&str> = rest.split('/').collect();
    if parts.len() < 2 {
        return Err(report!(DownloadError::TrsUrl(url.to_string())));
    }
    Ok(TrsLocation {
        server: parts[..parts.len() - 2].join("/"),
        tool_id: parts[parts.len() - 2].to_string(),
        version: parts[parts.len() - 1].to_string(),
    })
}

impl TrsLocation {
    fn files_endpoint(&self, descriptor_type: &str) -> String {
        format!(
            "https://{}/tools/{}/versions/{}/{}/files",
            self.server, self.tool_id, self.version, descriptor_type
        )
    }

    fn descriptor_endpoint(&self, descriptor_type: &str, path: &str) -> String {
        format!(
            "https://{}/tools/{}/versions/{}/{}/descriptor/{}",
            self.server, self.tool_id, self.version, descriptor_type, path
        )
    }
}

/// Retrieves every workflow file of a tool version from a Tool Registry
/// Service and returns the path of the primary descriptor.
pub struct TrsDownloader {
    client: reqwest::Client,
}

impl TrsDownloader {
    pub fn new() -> Self {
        TrsDownloader {
            client: reqwest::Client::new(),
        }
    }

    async fn fetch_file(
        &self,
        location: &TrsLocation,
        descriptor_type: &str,
        file: &TrsFileMetadata,
        destination: &Path,
    ) -> Result<()> {
        let endpoint = location.descriptor_endpoint(descriptor_type, &file.path);
        tracing::debug!(url = %endpoint, "fetching TRS descriptor");

        let response = self
            .client
            .get(&endpoint)
            .send()
            .await
            .change_context(DownloadError::FileDownload(endpoint.clone()))?;
        if !response.status().is_success() {
            return Err(report!(DownloadError::FileDownload(endpoint)))
                .attach_printable(format!("received status code {}", response.status()));
        }
        let body = response
            .bytes()
            .await
            .change_context(DownloadError::TrsReadBody)?;
        let descriptor: TrsFileDescriptor =
            serde_json::from_slice(&body).change_context(DownloadError::TrsUnmarshal)?;

        let dest_path = destination.join(&file.path);
        if let Some(parent) = dest_path.parent() {
            create_dirs(parent).await?;
        }

        if !descriptor.content.is_empty() {
            tokio::fs::write(&dest_path, descriptor.content.as_bytes())
                .await
                .change_context_lazy(|| DownloadError::FileWrite(dest_path.clone()))?;
            return Ok(());
        }

        if descriptor.url.is_empty() {
            return Err(report!(DownloadError::FileDownload(endpoint)))
                .attach_printable("descriptor carries neither content nor a URL");
        }

        let response = self
            .client
            .get(&descriptor.url)
            .send()
            .await
            .change_context(DownloadError::FileDownload(descriptor.url.clone()))?;
        if !response.status().is_success() {
            return Err(report!(DownloadError::FileDownload(descriptor.url.clone())))
                .attach_printable(format!("received status code {}", response.status()));
        }

        let mut out = tokio::fs::File::create(&dest_path)
            .await
            .change_context_lazy(|| DownloadError::FileCreation(dest_path.clone()))?;
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream
            .try_next()
            .await
            .change_context(DownloadError::FileDownload(descriptor.url.clone()))?
        {
            out.write_all(&chunk)
                .await
                .change_context_lazy(|| DownloadError::FileWrite(dest_path.clone()))?;
        }
        out.flush()
            .await
            .change_context_lazy(|| DownloadError::FileWrite(dest_path.clone()))?;
        Ok(())
    }
}

impl Default for TrsDownloader {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(unix)]
async fn create_dirs(path: &Path) -> Result<()> {
    use std::os::unix::fs::DirBuilderExt as _;
    let path = path.to_path_buf();
    tokio::task::spawn_blocking(move || {
        let mut builder = std::fs::DirBuilder::new();
        builder.recursive(true).mode(0o755);
        builder
            .create(&path)
            .change_context_lazy(|| DownloadError::DirCreation(path.clone()))
    })
    .await
    .change_context(DownloadError::DirCreation(PathBuf::new()))?
}

#[cfg(not(unix))]
async fn create_dirs(path: &Path) -> Result<()> {
    tokio::fs::create_dir_all(path)
        .await
        .change_context_lazy(|| DownloadError::DirCreation(path.to_path_buf()))
}

#[async_trait::async_trait]
impl Downloader for TrsDownloader {
    async fn download(
        &self,
        url: &str,
        destination: &Path,
        descriptor_type: &str,
    ) -> Result<PathBuf> {
        let location = parse_trs_url(url)?;
        let files_endpoint = location.files_endpoint(descriptor_type);
        tracing::debug!(url = %files_endpoint, "fetching TRS file listing");

        let response = self
            .client
            .get(&files_endpoint)
            .send()
            .await
            .change_context(DownloadError::TrsMetadata)?;
        if !response.status().is_success() {
            return Err(report!(DownloadError::TrsMetadata))
                .attach_printable(format!("received status code {}", response.status()));
        }
        let body = response
            .bytes()
            .await
            .change_context(DownloadError::TrsReadBody)?;
        let files: Vec<TrsFileMetadata> =
            serde_json::from_slice(&body).change_context(DownloadError::TrsUnmarshal)?;
        if files.is_empty() {
            return Err(report!(DownloadError::NoFilesFound));
        }

        let mut primary_descriptor_path = None;
        for file in &files {
            if file.path.is_empty() {
                tracing::warn!(file_type = %file.file_type, "skipping TRS file with empty path");
                continue;
            }
            self.fetch_file(&location, descriptor_type, file, destination)
                .await?;
            if file.file_type == "PRIMARY_DESCRIPTOR" {
                primary_descriptor_path = Some(file.path.clone());
            }
        }

        match primary_descriptor_path {
            Some(path) => Ok(destination.join(path)),
            None => Err(report!(DownloadError::NoFileInResponse)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_trs_url() {
        let location = parse_trs_url("trs://registry.example.org/tool-A/v1").unwrap();
        assert_eq!(
            location,
            TrsLocation {
                server: "registry.example.org".to_string(),
                tool_id: "tool-A".to_string(),
                version: "v1".to_string(),
            }
        );

        // Path segments before the tool id stay part of the server address.
        let location =
            parse_trs_url("trs://registry.example.org/api/ga4gh/trs/v2/tool-A/v1").unwrap();
        assert_eq!(location.server, "registry.example.org/api/ga4gh/trs/v2");
        assert_eq!(location.tool_id, "tool-A");
        assert_eq!(location.version, "v1");
    }

    #[test]
    fn test_parse_trs_url_too_short() {
        let error = parse_trs_url("trs://tool-only").unwrap_err();
        assert!(matches!(error.current_context(), DownloadError::TrsUrl(_)));
    }

    #[test]
    fn test_endpoints() {
        let location = parse_trs_url("trs://registry.example.org/tool-A/v1").unwrap();
        assert_eq!(
            location.files_endpoint("CWL"),
            "https://registry.example.org/tools/tool-A/versions/v1/CWL/files"
        );
        assert_eq!(
            location.descriptor_endpoint("CWL", "nested/main.cwl"),
            "https://registry.example.org/tools/tool-A/versions/v1/CWL/descriptor/nested/main.cwl"
        );
    }

    #[test]
    fn test_listing_shape() {
        let files: Vec<TrsFileMetadata> = serde_json::from_str(
            r#"[
                {"file_type": "PRIMARY_DESCRIPTOR", "path": "main.cwl",
                 "checksum": [{"checksum": "abc", "type": "sha-256"}]},
                {"file_type": "SECONDARY_DESCRIPTOR", "path": "lib/util.cwl", "checksum": []},
                {"file_type": "TEST_FILE", "path": ""}
            ]"#,
        )
        .unwrap();
        assert_eq!(files.len(), 3);
        assert_eq!(files[0].file_type, "PRIMARY_DESCRIPTOR");
        assert_eq!(files[0].checksum[0].checksum_type, "sha-256");
        assert!(files[2].path.is_empty());
    }

    #[test]
    fn test_descriptor_shape() {
        let descriptor: TrsFileDescriptor = serde_json::from_str(
            r#"{"content": "cwlVersion: v1.2", "url": "", "checksum": []}"#,
        )
        .unwrap();
        assert_eq!(descriptor.content, "cwlVersion: v1.2");
        assert!(descriptor.url.is_empty());
    }

    #[tokio::test]
    async fn test_create_dirs_mode() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("a/b/c");
        create_dirs(&nested).await.unwrap();
        assert!(nested.is_dir());
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt as _;
            let mode = std::fs::metadata(&nested).unwrap().permissions().mode();
            assert_eq!(mode & 0o777, 0o755);
        }
    }
}
