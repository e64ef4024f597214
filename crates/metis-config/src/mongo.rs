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

/// Document store configuration (`METIS_MONGO_*`).
#[derive(Debug, Clone)]
pub struct MongoConfig {
    pub host: String,
    pub port: u16,
    /// Empty username disables authentication
    pub username: String,
    pub password: String,
    pub database: String,
    pub workflow_collection: String,
}

impl MongoConfig {
    pub(crate) fn load(env: &Env) -> Result<Self> {
        Ok(MongoConfig {
            host: env.string("MONGO_HOST", "localhost"),
            port: env.parse("MONGO_PORT", 27017)?,
            username: env.string("MONGO_USERNAME", ""),
            password: env.string("MONGO_PASSWORD", ""),
            database: env.string("MONGO_DATABASE", "metis"),
            workflow_collection: env.string("MONGO_WORKFLOW_COLLECTION", "workflows"),
        })
    }
}
