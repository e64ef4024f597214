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

/// HTTP server configuration (`METIS_API_SERVER_*`).
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Base path under which the WES endpoints are nested
    pub base_path: String,
}

/// Swagger UI configuration (`METIS_API_SWAGGER_*`).
#[derive(Debug, Clone)]
pub struct SwaggerConfig {
    pub path: String,
    pub title: String,
}

/// API server configuration.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub server: ServerConfig,
    pub swagger: SwaggerConfig,
}

impl ApiConfig {
    pub(crate) fn load(env: &Env) -> Result<Self> {
        Ok(ApiConfig {
            server: ServerConfig {
                host: env.string("API_SERVER_HOST", "0.0.0.0"),
                port: env.parse("API_SERVER_PORT", 8080)?,
                base_path: env.string("API_SERVER_BASE_PATH", "/ga4gh/wes/v1"),
            },
            swagger: SwaggerConfig {
                path: env.string("API_SWAGGER_PATH", "/ui"),
                title: env.string("API_SWAGGER_TITLE", "Metis API"),
            },
        })
    }
}
