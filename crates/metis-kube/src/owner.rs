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

use k8s_openapi::api::batch::v1::Job;
use k8s_openapi::api::core::v1::{ConfigMap, PersistentVolumeClaim};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::OwnerReference;
use kube::api::{Patch, PatchParams};
use kube::Api;
use metis_config::KubernetesConfig;

/// Controller owner reference pointing at a created job.
///
/// Returns `None` when the job is missing its name or uid (never the case
/// for an object returned by a create call).
pub fn owner_reference(job: &Job) -> Option<OwnerReference> {
    Some(OwnerReference {
        api_version: "batch/v1".to_string(),
        kind: "Job".to_string(),
        name: job.metadata.name.clone()?,
        uid: job.metadata.uid.clone()?,
        controller: Some(true),
        ..Default::default()
    })
}

/// Re-own cluster objects to a job so the garbage collector cascades the
/// deletion when the job's TTL expires.
///
/// Best-effort: the job is already running, so a failed patch only
/// delays cleanup. Failures are logged and swallowed.
pub async fn set_owner_references(
    client: &kube::Client,
    config: &KubernetesConfig,
    job: &Job,
    pvc_name: Option<&str>,
    config_map_names: &[String],
) {
    let Some(reference) = owner_reference(job) else {
        tracing::error!("created job carries no name/uid, skipping owner references");
        return;
    };
    let patch = serde_json::json!({
        "metadata": { "ownerReferences": [reference] }
    });

    if let Some(pvc_name) = pvc_name {
        let api: Api<PersistentVolumeClaim> = Api::namespaced(client.clone(), &config.namespace);
        if let Err(error) = api
            .patch(pvc_name, &PatchParams::default(), &Patch::Merge(&patch))
            .await
        {
            tracing::error!(pvc = %pvc_name, %error, "failed to set pvc owner reference");
        }
    }

    let api: Api<ConfigMap> = Api::namespaced(client.clone(), &config.namespace);
    for name in config_map_names {
        if let Err(error) = api
            .patch(name, &PatchParams::default(), &Patch::Merge(&patch))
            .await
        {
            tracing::error!(configmap = %name, %error, "failed to set configmap owner reference");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;

    #[test]
    fn test_owner_reference_from_created_job() {
        let job = Job {
            metadata: ObjectMeta {
                name: Some("preparer-run-1".to_string()),
                uid: Some("9d2e".to_string()),
                ..Default::default()
            },
            ..Default::default()
        };
        let reference = owner_reference(&job).unwrap();
        assert_eq!(reference.api_version, "batch/v1");
        assert_eq!(reference.kind, "Job");
        assert_eq!(reference.name, "preparer-run-1");
        assert_eq!(reference.uid, "9d2e");
        assert_eq!(reference.controller, Some(true));
    }

    #[test]
    fn test_owner_reference_requires_uid() {
        let job = Job {
            metadata: ObjectMeta {
                name: Some("preparer-run-1".to_string()),
                ..Default::default()
            },
            ..Default::default()
        };
        assert!(owner_reference(&job).is_none());
    }
}
