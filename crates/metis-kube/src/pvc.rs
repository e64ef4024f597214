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

use std::collections::BTreeMap;

use error_stack::ResultExt as _;
use k8s_openapi::api::core::v1::{
    PersistentVolumeClaim, PersistentVolumeClaimSpec, VolumeResourceRequirements,
};
use k8s_openapi::apimachinery::pkg::api::resource::Quantity;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use kube::api::PostParams;
use kube::Api;
use metis_config::KubernetesConfig;

use crate::{KubeError, Result};

pub(crate) fn build_pvc(config: &KubernetesConfig, run_id: &str) -> PersistentVolumeClaim {
    PersistentVolumeClaim {
        metadata: ObjectMeta {
            name: Some(config.pvc_name(run_id)),
            namespace: Some(config.namespace.clone()),
            labels: Some(crate::run_labels(run_id, &config.pvc_prefix)),
            ..Default::default()
        },
        spec: Some(PersistentVolumeClaimSpec {
            access_modes: Some(vec!["ReadWriteOnce".to_string()]),
            storage_class_name: (!config.pvc_storage_class.is_empty())
                .then(|| config.pvc_storage_class.clone()),
            resources: Some(VolumeResourceRequirements {
                requests: Some(BTreeMap::from([(
                    "storage".to_string(),
                    Quantity(config.default_pvc_size.clone()),
                )])),
                ..Default::default()
            }),
            ..Default::default()
        }),
        ..Default::default()
    }
}

/// Provision the per-run shared volume.
pub async fn create_pvc_for_run(
    client: &kube::Client,
    config: &KubernetesConfig,
    run_id: &str,
) -> Result<PersistentVolumeClaim> {
    let api: Api<PersistentVolumeClaim> = Api::namespaced(client.clone(), &config.namespace);
    let pvc = build_pvc(config, run_id);
    tracing::debug!(name = ?pvc.metadata.name, "creating pvc");
    api.create(&PostParams::default(), &pvc)
        .await
        .change_context_lazy(|| KubeError::CreateResource(format!("pvc for run {run_id}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> KubernetesConfig {
        metis_config::Config::from_vars(&[]).unwrap().kubernetes
    }

    #[test]
    fn test_pvc_shape() {
        let pvc = build_pvc(&test_config(), "run-1");
        assert_eq!(pvc.metadata.name.as_deref(), Some("pvc-run-1"));
        let spec = pvc.spec.unwrap();
        assert_eq!(spec.access_modes, Some(vec!["ReadWriteOnce".to_string()]));
        assert_eq!(spec.storage_class_name, None);
        let requests = spec.resources.unwrap().requests.unwrap();
        assert_eq!(requests.get("storage"), Some(&Quantity("100Mi".to_string())));
    }

    #[test]
    fn test_pvc_storage_class_passthrough() {
        let mut config = test_config();
        config.pvc_storage_class = "fast-ssd".to_string();
        let pvc = build_pvc(&config, "run-1");
        assert_eq!(
            pvc.spec.unwrap().storage_class_name.as_deref(),
            Some("fast-ssd")
        );
    }
}
