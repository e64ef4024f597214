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

use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum DownloadError {
    #[error("unsupported protocol: {0}")]
    UnsupportedProtocol(String),
    #[error("invalid workflow URL: {0}")]
    InvalidUrl(String),
    #[error("invalid file path: access to {} is not allowed", .0.display())]
    InvalidFilePath(PathBuf),
    #[error("file not found: {}", .0.display())]
    FileNotFound(PathBuf),
    #[error("invalid TRS URL: {0}")]
    TrsUrl(String),
    #[error("failed to fetch TRS file metadata")]
    TrsMetadata,
    #[error("failed to read TRS response body")]
    TrsReadBody,
    #[error("failed to decode TRS response")]
    TrsUnmarshal,
    #[error("no files listed in TRS response")]
    NoFilesFound,
    #[error("no primary descriptor in TRS response")]
    NoFileInResponse,
    #[error("failed to create directory {}", .0.display())]
    DirCreation(PathBuf),
    #[error("failed to create file {}", .0.display())]
    FileCreation(PathBuf),
    #[error("failed to download file from {0}")]
    FileDownload(String),
    #[error("failed to write file {}", .0.display())]
    FileWrite(PathBuf),
}

pub type Result<T, E = error_stack::Report<DownloadError>> = std::result::Result<T, E>;
