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

use error_stack::ResultExt as _;
use k8s_openapi::api::batch::v1::{Job, JobSpec};
use k8s_openapi::api::core::v1::{
    ConfigMapVolumeSource, Container, PersistentVolumeClaimVolumeSource, PodSpec,
    PodTemplateSpec, Volume, VolumeMount,
};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use kube::api::PostParams;
use kube::Api;
use metis_config::KubernetesConfig;
use metis_core::RunRequest;

use crate::{KubeError, Result};

/// Encode a run request as the preparer subcommand's argv.
///
/// Optional WES fields are omitted entirely when absent; the map-valued
/// fields travel as JSON strings.
pub fn build_preparer_args(request: &RunRequest, run_id: &str) -> Vec<String> {
    let mut args = vec!["/metis".to_string(), "preparer".to_string()];
    let mut push = |flag: &str, value: String| {
        args.push(flag.to_string());
        args.push(value);
    };

    if !request.workflow_url.is_empty() {
        push("--workflow_url", request.workflow_url.clone());
    }
    if !request.workflow_type.is_empty() {
        push("--workflow_type", request.workflow_type.clone());
    }
    if !request.workflow_type_version.is_empty() {
        push("--workflow_type_version", request.workflow_type_version.clone());
    }
    if let Some(engine) = request.workflow_engine.as_ref().filter(|e| !e.is_empty()) {
        push("--workflow_engine", engine.clone());
    }
    if let Some(version) = request
        .workflow_engine_version
        .as_ref()
        .filter(|v| !v.is_empty())
    {
        push("--workflow_engine_version", version.clone());
    }
    if let Some(params) = &request.workflow_params {
        if let Ok(encoded) = serde_json::to_string(params) {
            push("--workflow_params", encoded);
        }
    }
    if let Some(params) = &request.workflow_engine_parameters {
        if let Ok(encoded) = serde_json::to_string(params) {
            push("--workflow_engine_parameters", encoded);
        }
    }
    if let Some(tags) = &request.tags {
        if let Ok(encoded) = serde_json::to_string(tags) {
            push("--tags", encoded);
        }
    }
    push("--run_id", run_id.to_string());
    args
}

fn build_volumes(
    config: &KubernetesConfig,
    pvc_name: &str,
    attachment_config_maps: &[String],
) -> Vec<Volume> {
    let mut volumes = vec![Volume {
        name: config.common_pvc_volume_name.clone(),
        persistent_volume_claim: Some(PersistentVolumeClaimVolumeSource {
            claim_name: pvc_name.to_string(),
            ..Default::default()
        }),
        ..Default::default()
    }];
    for (index, name) in attachment_config_maps.iter().enumerate() {
        volumes.push(Volume {
            name: format!("attachment-vol-{index}"),
            config_map: Some(ConfigMapVolumeSource {
                name: name.clone(),
                ..Default::default()
            }),
            ..Default::default()
        });
    }
    volumes
}

/// One-shot init container copying every attachment from its read-only
/// config map mount into the shared volume, before the preparer starts.
fn build_init_containers(
    config: &KubernetesConfig,
    attachment_config_maps: &[String],
) -> Option<Vec<Container>> {
    if attachment_config_maps.is_empty() {
        return None;
    }

    let mut volume_mounts = vec![VolumeMount {
        name: config.common_pvc_volume_name.clone(),
        mount_path: config.pvc_mount_path.clone(),
        ..Default::default()
    }];
    let mut copy_commands = Vec::with_capacity(attachment_config_maps.len());
    for (index, name) in attachment_config_maps.iter().enumerate() {
        let source = format!("/attachments-src/{name}");
        volume_mounts.push(VolumeMount {
            name: format!("attachment-vol-{index}"),
            mount_path: source.clone(),
            read_only: Some(true),
            ..Default::default()
        });
        copy_commands.push(format!("cp -L {}/* {}/", source, config.pvc_mount_path));
    }

    Some(vec![Container {
        name: "copy-attachments".to_string(),
        image: Some("busybox".to_string()),
        command: Some(vec![
            "sh".to_string(),
            "-c".to_string(),
            copy_commands.join(" && "),
        ]),
        volume_mounts: Some(volume_mounts),
        ..Default::default()
    }])
}

pub(crate) fn build_preparer_job(
    config: &KubernetesConfig,
    run_id: &str,
    request: &RunRequest,
    pvc_name: &str,
    attachment_config_maps: &[String],
) -> Job {
    let job_name = config.preparer_job_name(run_id);
    Job {
        metadata: ObjectMeta {
            name: Some(job_name.clone()),
            namespace: Some(config.namespace.clone()),
            labels: Some(crate::run_labels(run_id, &config.preparer_prefix)),
            ..Default::default()
        },
        spec: Some(JobSpec {
            ttl_seconds_after_finished: Some(config.job_ttl_seconds),
            backoff_limit: Some(0),
            template: PodTemplateSpec {
                spec: Some(PodSpec {
                    volumes: Some(build_volumes(config, pvc_name, attachment_config_maps)),
                    init_containers: build_init_containers(config, attachment_config_maps),
                    containers: vec![Container {
                        name: job_name,
                        image: Some(config.image_name.clone()),
                        args: Some(build_preparer_args(request, run_id)),
                        image_pull_policy: Some(config.image_pull_policy.clone()),
                        volume_mounts: Some(vec![VolumeMount {
                            name: config.common_pvc_volume_name.clone(),
                            mount_path: config.pvc_mount_path.clone(),
                            ..Default::default()
                        }]),
                        ..Default::default()
                    }],
                    restart_policy: Some(config.restart_policy.clone()),
                    service_account_name: Some(config.service_account_name.clone()),
                    ..Default::default()
                }),
                ..Default::default()
            },
            ..Default::default()
        }),
        ..Default::default()
    }
}

/// Create the preparer job for a run.
pub async fn create_preparer_job(
    client: &kube::Client,
    config: &KubernetesConfig,
    run_id: &str,
    request: &RunRequest,
    pvc_name: &str,
    attachment_config_maps: &[String],
) -> Result<Job> {
    let api: Api<Job> = Api::namespaced(client.clone(), &config.namespace);
    let job = build_preparer_job(config, run_id, request, pvc_name, attachment_config_maps);
    api.create(&PostParams::default(), &job)
        .await
        .change_context_lazy(|| KubeError::CreateResource(format!("preparer job for run {run_id}")))
}
