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

use error_stack::report;

use crate::env::Env;
use crate::{ConfigError, Result};

/// Where the translated workflow execution runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendType {
    /// The executor job runs the engine directly
    Local,
    /// The engine submits to a GA4GH TES endpoint
    Tes,
}

impl BackendType {
    pub fn as_str(&self) -> &'static str {
        match self {
            BackendType::Local => "local",
            BackendType::Tes => "tes",
        }
    }
}

/// Execution backend configuration (`METIS_BACKEND_*`), forwarded to
/// plugins as part of every `GetExecutionSpec` call.
#[derive(Debug, Clone)]
pub struct BackendConfig {
    pub kind: BackendType,
    pub tes_url: Option<String>,
    pub tes_token: Option<String>,
}

impl BackendConfig {
    pub(crate) fn load(env: &Env) -> Result<Self> {
        let kind = match env.string("BACKEND_TYPE", "local").as_str() {
            "local" => BackendType::Local,
            "tes" => BackendType::Tes,
            other => {
                return Err(report!(ConfigError::InvalidValue {
                    key: "METIS_BACKEND_TYPE".to_string(),
                    value: other.to_string(),
                }))
            }
        };
        Ok(BackendConfig {
            kind,
            tes_url: env.get("BACKEND_TES_URL").map(str::to_string),
            tes_token: env.get("BACKEND_TES_TOKEN").map(str::to_string),
        })
    }
}

#[cfg(test)]
mod tests {
    use crate::{BackendType, Config, ConfigError};

    #[test]
    fn test_tes_backend() {
        let vars = vec![
            ("METIS_BACKEND_TYPE".to_string(), "tes".to_string()),
            (
                "METIS_BACKEND_TES_URL".to_string(),
                "https://tes.example.org".to_string(),
            ),
        ];
        let config = Config::from_vars(&vars).unwrap();
        assert_eq!(config.backend.kind, BackendType::Tes);
        assert_eq!(
            config.backend.tes_url.as_deref(),
            Some("https://tes.example.org")
        );
    }

    #[test]
    fn test_unknown_backend_rejected() {
        let vars = vec![("METIS_BACKEND_TYPE".to_string(), "slurm".to_string())];
        let error = Config::from_vars(&vars).unwrap_err();
        assert!(matches!(
            error.current_context(),
            ConfigError::InvalidValue { .. }
        ));
    }
}
