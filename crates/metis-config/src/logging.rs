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

use crate::env::Env;
use crate::Result;

/// Logging configuration (`METIS_LOG_*`).
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// `trace` | `debug` | `info` | `warn` | `error`
    pub level: String,
    /// `text` | `json`
    pub format: String,
}

impl LogConfig {
    pub(crate) fn load(env: &Env) -> Result<Self> {
        Ok(LogConfig {
            level: env.string("LOG_LEVEL", "info"),
            format: env.string("LOG_FORMAT", "text"),
        })
    }
}
