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

use axum::extract::State;
use axum::response::Json;
use metis_config::PluginRegistry;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::ErrorResponse;
use crate::AppState;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ServiceType {
    pub group: String,
    pub artifact: String,
    pub version: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Organization {
    pub name: String,
    pub url: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct WorkflowTypeVersion {
    pub workflow_type_version: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct WorkflowEngineVersion {
    pub workflow_engine_version: Vec<String>,
}

/// The WES capability document.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ServiceInfo {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub service_type: ServiceType,
    pub description: String,
    pub organization: Organization,
    pub contact_url: String,
    pub documentation_url: String,
    pub created_at: String,
    pub updated_at: String,
    pub environment: String,
    pub version: String,
    pub auth_instructions_url: String,
    pub supported_wes_versions: Vec<String>,
    pub supported_filesystem_protocols: Vec<String>,
    pub workflow_type_versions: HashMap<String, WorkflowTypeVersion>,
    pub workflow_engine_versions: HashMap<String, WorkflowEngineVersion>,
    pub default_workflow_engine_parameters: Vec<serde_json::Value>,
    pub system_state_counts: HashMap<String, i64>,
    pub tags: HashMap<String, String>,
}

/// The supported workflow types and engine versions are derived from the
/// plugin registry: a binding makes its tuple executable.
pub(crate) fn capability_maps(
    registry: &PluginRegistry,
) -> (
    HashMap<String, WorkflowTypeVersion>,
    HashMap<String, WorkflowEngineVersion>,
) {
    let mut types: HashMap<String, WorkflowTypeVersion> = HashMap::new();
    let mut engines: HashMap<String, WorkflowEngineVersion> = HashMap::new();
    for binding in registry.bindings() {
        let versions = &mut types
            .entry(binding.workflow_type.clone())
            .or_default()
            .workflow_type_version;
        if !versions.contains(&binding.workflow_type_version) {
            versions.push(binding.workflow_type_version.clone());
        }
        let versions = &mut engines
            .entry(binding.workflow_type.clone())
            .or_default()
            .workflow_engine_version;
        if !versions.contains(&binding.workflow_engine_version) {
            versions.push(binding.workflow_engine_version.clone());
        }
    }
    (types, engines)
}

/// Get the service capability document
#[utoipa::path(
    get,
    path = "/service-info",
    responses(
        (status = 200, description = "Service info", body = ServiceInfo)
    ),
    tag = crate::api::SERVICE_TAG,
)]
pub async fn get_service_info(
    State(state): State<AppState>,
) -> Result<Json<ServiceInfo>, ErrorResponse> {
    let (workflow_type_versions, workflow_engine_versions) =
        capability_maps(&state.config.plugins);

    Ok(Json(ServiceInfo {
        id: "metis".to_string(),
        name: "Metis Workflow Execution Service".to_string(),
        service_type: ServiceType {
            group: "org.ga4gh".to_string(),
            artifact: "wes".to_string(),
            version: "1.1.0".to_string(),
        },
        description: "Workflow Execution Service for running computational workflows"
            .to_string(),
        organization: Organization {
            name: "Metis".to_string(),
            url: "https://github.com/metis-wes/metis".to_string(),
        },
        contact_url: "https://github.com/metis-wes/metis".to_string(),
        documentation_url: "https://github.com/metis-wes/metis/blob/main/README.md".to_string(),
        created_at: "2025-01-01T00:00:00Z".to_string(),
        updated_at: "2025-01-01T00:00:00Z".to_string(),
        environment: "production".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        auth_instructions_url: String::new(),
        supported_wes_versions: vec!["1.0.0".to_string()],
        supported_filesystem_protocols: vec![
            "http".to_string(),
            "https".to_string(),
            "file".to_string(),
            "trs".to_string(),
        ],
        workflow_type_versions,
        workflow_engine_versions,
        default_workflow_engine_parameters: vec![],
        system_state_counts: HashMap::from([
            ("QUEUED".to_string(), 0),
            ("RUNNING".to_string(), 0),
            ("COMPLETE".to_string(), 0),
            ("ERROR".to_string(), 0),
        ]),
        tags: HashMap::from([(
            "version".to_string(),
            env!("CARGO_PKG_VERSION").to_string(),
        )]),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use metis_config::PluginBinding;

    #[test]
    fn test_capabilities_follow_the_registry() {
        let registry = PluginRegistry::from_bindings(vec![
            PluginBinding {
                workflow_type: "WDL".to_string(),
                workflow_type_version: "1.0".to_string(),
                workflow_engine_version: "87".to_string(),
                plugin_url: "http://wdl:50051".to_string(),
            },
            PluginBinding {
                workflow_type: "WDL".to_string(),
                workflow_type_version: "1.1".to_string(),
                workflow_engine_version: "87".to_string(),
                plugin_url: "http://wdl:50051".to_string(),
            },
            PluginBinding {
                workflow_type: "CWL".to_string(),
                workflow_type_version: "v1.2".to_string(),
                workflow_engine_version: "3.1".to_string(),
                plugin_url: "http://cwl:50051".to_string(),
            },
        ]);

        let (types, engines) = capability_maps(&registry);
        assert_eq!(
            types.get("WDL").unwrap().workflow_type_version,
            vec!["1.0", "1.1"]
        );
        assert_eq!(
            types.get("CWL").unwrap().workflow_type_version,
            vec!["v1.2"]
        );
        assert_eq!(
            engines.get("WDL").unwrap().workflow_engine_version,
            vec!["87"]
        );
    }

    #[test]
    fn test_empty_registry_has_no_capabilities() {
        let (types, engines) = capability_maps(&PluginRegistry::default());
        assert!(types.is_empty());
        assert!(engines.is_empty());
    }
}
