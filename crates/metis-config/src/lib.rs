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

//! Configuration for the Metis processes.
//!
//! Everything is driven by environment variables with the `METIS_` prefix,
//! nested with underscores (`METIS_MONGO_HOST`, `METIS_K8S_NAMESPACE`, ...),
//! except the plugin registry which is a YAML file under `~/.metis/`.
//! The API server and the preparer share one configuration object,
//! built once at process start and read-only afterwards.

mod api;
mod backend;
mod env;
mod kubernetes;
mod logging;
mod mongo;
mod plugin;
mod staging;

pub use api::{ApiConfig, ServerConfig, SwaggerConfig};
pub use backend::{BackendConfig, BackendType};
pub use kubernetes::KubernetesConfig;
pub use logging::LogConfig;
pub use mongo::MongoConfig;
pub use plugin::{PluginBinding, PluginRegistry};
pub use staging::StagingConfig;

use error_stack::Report;

use crate::env::Env;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {key}: {value}")]
    InvalidValue { key: String, value: String },
    #[error("Failed to read plugin registry: {0}")]
    PluginRegistry(String),
}

pub type Result<T, E = Report<ConfigError>> = std::result::Result<T, E>;

/// Complete configuration of a Metis process.
#[derive(Debug, Clone)]
pub struct Config {
    pub log: LogConfig,
    pub mongo: MongoConfig,
    pub kubernetes: KubernetesConfig,
    pub staging: StagingConfig,
    pub api: ApiConfig,
    pub backend: BackendConfig,
    pub plugins: PluginRegistry,
}

impl Config {
    /// Load the configuration from the process environment and the plugin
    /// registry file.
    pub fn from_env() -> Result<Self> {
        let vars: Vec<(String, String)> = std::env::vars().collect();
        Self::from_vars(&vars)
    }

    /// Load from an explicit variable list. Used by `from_env` and tests.
    pub fn from_vars(vars: &[(String, String)]) -> Result<Self> {
        let env = Env::new(vars);
        Ok(Config {
            log: LogConfig::load(&env)?,
            mongo: MongoConfig::load(&env)?,
            kubernetes: KubernetesConfig::load(&env)?,
            staging: StagingConfig::load(&env)?,
            api: ApiConfig::load(&env)?,
            backend: BackendConfig::load(&env)?,
            plugins: PluginRegistry::load(&env)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::from_vars(&[]).unwrap();
        assert_eq!(config.log.level, "info");
        assert_eq!(config.mongo.port, 27017);
        assert_eq!(config.mongo.database, "metis");
        assert_eq!(config.kubernetes.namespace, "metis");
        assert_eq!(config.kubernetes.job_ttl_seconds, 300);
        assert_eq!(config.staging.kind, "s3");
        assert_eq!(config.api.server.port, 8080);
        assert_eq!(config.api.server.base_path, "/ga4gh/wes/v1");
        assert_eq!(config.backend.kind, BackendType::Local);
        assert!(config.plugins.bindings().is_empty());
    }

    #[test]
    fn test_nested_overrides() {
        let vars = vec![
            ("METIS_MONGO_HOST".to_string(), "db.internal".to_string()),
            ("METIS_MONGO_PORT".to_string(), "27018".to_string()),
            ("METIS_K8S_NAMESPACE".to_string(), "wes".to_string()),
            ("METIS_STAGING_BUCKET".to_string(), "outputs".to_string()),
            (
                "METIS_STAGING_PARAMETERS_AWS_REGION".to_string(),
                "eu-west-1".to_string(),
            ),
        ];
        let config = Config::from_vars(&vars).unwrap();
        assert_eq!(config.mongo.host, "db.internal");
        assert_eq!(config.mongo.port, 27018);
        assert_eq!(config.kubernetes.namespace, "wes");
        assert_eq!(config.staging.bucket, "outputs");
        assert_eq!(
            config.staging.parameters.get("AWS_REGION").map(String::as_str),
            Some("eu-west-1")
        );
    }

    #[test]
    fn test_invalid_port_is_rejected() {
        let vars = vec![("METIS_MONGO_PORT".to_string(), "lots".to_string())];
        let error = Config::from_vars(&vars).unwrap_err();
        assert!(matches!(
            error.current_context(),
            ConfigError::InvalidValue { .. }
        ));
    }
}
