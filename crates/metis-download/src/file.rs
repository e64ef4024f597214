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

use std::path::{Component, Path, PathBuf};

use error_stack::report;

use crate::{DownloadError, Downloader, Result};

/// Resolves a `file://` workflow already present on the shared volume.
///
/// The attachment init container placed the file there before the
/// preparer started, so this downloader only validates and resolves the
/// path. The cleaned path must stay within the destination root.
pub struct FileDownloader;

/// Lexical path normalisation, resolving `.` and `..` without touching
/// the filesystem.
fn clean(path: &Path) -> PathBuf {
    let mut cleaned = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !cleaned.pop() {
                    cleaned.push(Component::ParentDir);
                }
            }
            other => cleaned.push(other),
        }
    }
    cleaned
}

#[async_trait::async_trait]
impl Downloader for FileDownloader {
    async fn download(
        &self,
        url: &str,
        destination: &Path,
        _descriptor_type: &str,
    ) -> Result<PathBuf> {
        let file_name = url
            .strip_prefix("file://")
            .ok_or_else(|| report!(DownloadError::InvalidUrl(url.to_string())))?;

        let file_path = clean(&destination.join(file_name));
        if !file_path.starts_with(clean(destination)) {
            return Err(report!(DownloadError::InvalidFilePath(file_path)));
        }

        match tokio::fs::metadata(&file_path).await {
            Ok(_) => Ok(file_path),
            Err(error) if error.kind() == std::io::ErrorKind::NotFound => {
                Err(report!(DownloadError::FileNotFound(file_path)))
            }
            Err(error) => Err(report!(error)
                .change_context(DownloadError::FileNotFound(file_path))),
        }
    }
}
