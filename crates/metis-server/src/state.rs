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

use std::sync::Arc;

use metis_config::Config;
use metis_state::RunStore;

/// Shared, read-only state of the API server.
///
/// Built once at startup; handlers share only these clients and carry no
/// per-run state in process.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn RunStore>,
    pub kube: kube::Client,
    pub config: Arc<Config>,
}

impl AppState {
    pub fn new(store: Arc<dyn RunStore>, kube: kube::Client, config: Arc<Config>) -> Self {
        AppState {
            store,
            kube,
            config,
        }
    }
}
