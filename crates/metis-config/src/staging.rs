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

use std::collections::HashMap;

use crate::env::Env;
use crate::Result;

/// Remote staging configuration (`METIS_STAGING_*`).
///
/// `parameters` is an opaque map handed to the provider and to plugins;
/// entries come from `METIS_STAGING_PARAMETERS_<KEY>=<VALUE>` variables.
#[derive(Debug, Clone)]
pub struct StagingConfig {
    /// Provider kind; only `s3` ships
    pub kind: String,
    pub bucket: String,
    /// Key prefix under which run outputs are staged
    pub prefix: String,
    /// Endpoint URL for S3-compatible stores; empty for AWS proper
    pub url: String,
    pub parameters: HashMap<String, String>,
}

impl StagingConfig {
    pub(crate) fn load(env: &Env) -> Result<Self> {
        Ok(StagingConfig {
            kind: env.string("STAGING_TYPE", "s3"),
            bucket: env.string("STAGING_BUCKET", "metis"),
            prefix: env.string("STAGING_PREFIX", "workflows"),
            url: env.string("STAGING_URL", ""),
            parameters: env.collect_prefixed("STAGING_PARAMETERS_"),
        })
    }
}
