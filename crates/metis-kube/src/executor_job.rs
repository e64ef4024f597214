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

use std::collections::{BTreeMap, HashMap};

use error_stack::ResultExt as _;
use k8s_openapi::api::batch::v1::{Job, JobSpec};
use k8s_openapi::api::core::v1::{
    ConfigMap, ConfigMapVolumeSource, Container, EnvVar, PersistentVolumeClaimVolumeSource,
    PodSpec, PodTemplateSpec, Volume, VolumeMount,
};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use kube::api::PostParams;
use kube::Api;
use metis_config::KubernetesConfig;
use metis_proto::pb::ExecutionSpec;

use crate::{set_owner_references, KubeError, Result};

const ROOT_VOLUME: &str = "root-files";
const PROJECT_VOLUME: &str = "project-files";

/// Turn a mount-file map into config-map data plus the sub-path mounts
/// projecting each file to its target path.
fn prepare_mount_files<F>(
    volume_name: &str,
    files: &HashMap<String, String>,
    mount_path_for: F,
) -> (BTreeMap<String, String>, Vec<VolumeMount>)
where
    F: Fn(&str) -> String,
{
    let mut data = BTreeMap::new();
    let mut mounts = Vec::with_capacity(files.len());
    let mut paths: Vec<&String> = files.keys().collect();
    paths.sort();
    for path in paths {
        let key = path.trim_matches('/').to_string();
        data.insert(key.clone(), files[path].clone());
        mounts.push(VolumeMount {
            name: volume_name.to_string(),
            mount_path: mount_path_for(path),
            sub_path: Some(key),
            ..Default::default()
        });
    }
    (data, mounts)
}

fn build_config_map(
    config: &KubernetesConfig,
    run_id: &str,
    kind: &str,
    data: BTreeMap<String, String>,
) -> ConfigMap {
    ConfigMap {
        metadata: ObjectMeta {
            name: Some(format!("{}-{kind}", config.executor_job_name(run_id))),
            namespace: Some(config.namespace.clone()),
            labels: Some(crate::run_labels(run_id, &config.executor_prefix)),
            ..Default::default()
        },
        data: Some(data),
        ..Default::default()
    }
}

fn build_volumes(
    config: &KubernetesConfig,
    run_id: &str,
    root_config_map: Option<&str>,
    project_config_map: Option<&str>,
) -> Vec<Volume> {
    let mut volumes = vec![Volume {
        name: config.common_pvc_volume_name.clone(),
        persistent_volume_claim: Some(PersistentVolumeClaimVolumeSource {
            claim_name: config.pvc_name(run_id),
            ..Default::default()
        }),
        ..Default::default()
    }];
    for (volume_name, config_map) in [
        (ROOT_VOLUME, root_config_map),
        (PROJECT_VOLUME, project_config_map),
    ] {
        if let Some(name) = config_map {
            volumes.push(Volume {
                name: volume_name.to_string(),
                config_map: Some(ConfigMapVolumeSource {
                    name: name.to_string(),
                    ..Default::default()
                }),
                ..Default::default()
            });
        }
    }
    volumes
}

fn build_env(environment: &HashMap<String, String>) -> Vec<EnvVar> {
    let mut names: Vec<&String> = environment.keys().collect();
    names.sort();
    names
        .into_iter()
        .map(|name| EnvVar {
            name: name.clone(),
            value: Some(environment[name].clone()),
            ..Default::default()
        })
        .collect()
}

pub(crate) fn build_executor_job(
    config: &KubernetesConfig,
    run_id: &str,
    spec: &ExecutionSpec,
    root_config_map: Option<&str>,
    project_config_map: Option<&str>,
    extra_mounts: Vec<VolumeMount>,
) -> Job {
    let job_name = config.executor_job_name(run_id);
    let mut volume_mounts = vec![VolumeMount {
        name: config.common_pvc_volume_name.clone(),
        mount_path: config.pvc_mount_path.clone(),
        ..Default::default()
    }];
    volume_mounts.extend(extra_mounts);

    Job {
        metadata: ObjectMeta {
            name: Some(job_name.clone()),
            namespace: Some(config.namespace.clone()),
            labels: Some(crate::run_labels(run_id, &config.executor_prefix)),
            ..Default::default()
        },
        spec: Some(JobSpec {
            ttl_seconds_after_finished: Some(config.job_ttl_seconds),
            backoff_limit: Some(0),
            template: PodTemplateSpec {
                spec: Some(PodSpec {
                    restart_policy: Some(config.restart_policy.clone()),
                    containers: vec![Container {
                        name: job_name,
                        image: Some(spec.image.clone()),
                        command: Some(spec.command.clone()),
                        working_dir: Some(config.pvc_mount_path.clone()),
                        env: Some(build_env(&spec.environment)),
                        volume_mounts: Some(volume_mounts),
                        ..Default::default()
                    }],
                    volumes: Some(build_volumes(
                        config,
                        run_id,
                        root_config_map,
                        project_config_map,
                    )),
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

fn project_mount_path(config: &KubernetesConfig, path: &str) -> String {
    format!(
        "{}/{}",
        config.pvc_mount_path.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

/// Create the executor job for a run from its execution spec.
///
/// Root and project mount files become at most two config maps; each file
/// is projected to its target path with a sub-path mount. The config maps
/// are re-owned by the created job so the TTL cascade removes them.
pub async fn launch_executor_job(
    client: &kube::Client,
    config: &KubernetesConfig,
    run_id: &str,
    spec: &ExecutionSpec,
) -> Result<Job> {
    let config_maps: Api<ConfigMap> = Api::namespaced(client.clone(), &config.namespace);
    let mut created_config_maps = Vec::new();
    let mut extra_mounts = Vec::new();

    let (root_data, root_mounts) =
        prepare_mount_files(ROOT_VOLUME, &spec.root_mount_files, |path| path.to_string());
    let root_config_map = if root_data.is_empty() {
        None
    } else {
        let config_map = build_config_map(config, run_id, "root", root_data);
        let name = config_map.metadata.name.clone().unwrap_or_default();
        config_maps
            .create(&PostParams::default(), &config_map)
            .await
            .change_context_lazy(|| {
                KubeError::CreateResource(format!("root files configmap for run {run_id}"))
            })?;
        created_config_maps.push(name.clone());
        extra_mounts.extend(root_mounts);
        Some(name)
    };

    let (project_data, project_mounts) =
        prepare_mount_files(PROJECT_VOLUME, &spec.project_mount_files, |path| {
            project_mount_path(config, path)
        });
    let project_config_map = if project_data.is_empty() {
        None
    } else {
        let config_map = build_config_map(config, run_id, "project", project_data);
        let name = config_map.metadata.name.clone().unwrap_or_default();
        config_maps
            .create(&PostParams::default(), &config_map)
            .await
            .change_context_lazy(|| {
                KubeError::CreateResource(format!("project files configmap for run {run_id}"))
            })?;
        created_config_maps.push(name.clone());
        extra_mounts.extend(project_mounts);
        Some(name)
    };

    let jobs: Api<Job> = Api::namespaced(client.clone(), &config.namespace);
    let job = build_executor_job(
        config,
        run_id,
        spec,
        root_config_map.as_deref(),
        project_config_map.as_deref(),
        extra_mounts,
    );
    let created = jobs
        .create(&PostParams::default(), &job)
        .await
        .change_context_lazy(|| {
            KubeError::CreateResource(format!("executor job for run {run_id}"))
        })?;

    if !created_config_maps.is_empty() {
        set_owner_references(client, config, &created, None, &created_config_maps).await;
    }

    Ok(created)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> KubernetesConfig {
        metis_config::Config::from_vars(&[]).unwrap().kubernetes
    }

    fn test_spec() -> ExecutionSpec {
        ExecutionSpec {
            image: "quay.io/engines/cromwell:87".to_string(),
            command: vec!["cromwell".to_string(), "run".to_string()],
            environment: HashMap::from([
                ("B_VAR".to_string(), "2".to_string()),
                ("A_VAR".to_string(), "1".to_string()),
            ]),
            root_mount_files: HashMap::new(),
            project_mount_files: HashMap::new(),
            outputs_to_stage: vec![],
        }
    }

    #[test]
    fn test_mount_file_projection() {
        let files = HashMap::from([
            ("/conf.json".to_string(), "{}".to_string()),
            ("options.json".to_string(), "{}".to_string()),
        ]);
        let (data, mounts) = prepare_mount_files(ROOT_VOLUME, &files, |path| path.to_string());

        assert_eq!(data.get("conf.json").map(String::as_str), Some("{}"));
        assert_eq!(data.get("options.json").map(String::as_str), Some("{}"));
        assert_eq!(mounts.len(), 2);
        assert_eq!(mounts[0].mount_path, "/conf.json");
        assert_eq!(mounts[0].sub_path.as_deref(), Some("conf.json"));
    }

    #[test]
    fn test_project_mount_path_joins_shared_volume() {
        let config = test_config();
        assert_eq!(project_mount_path(&config, "inputs.json"), "/pvc/inputs.json");
        assert_eq!(project_mount_path(&config, "/inputs.json"), "/pvc/inputs.json");
    }

    #[test]
    fn test_executor_job_shape() {
        let config = test_config();
        let spec = test_spec();
        let job = build_executor_job(&config, "run-1", &spec, None, None, vec![]);

        assert_eq!(job.metadata.name.as_deref(), Some("executor-run-1"));
        let job_spec = job.spec.unwrap();
        assert_eq!(job_spec.backoff_limit, Some(0));
        assert_eq!(job_spec.ttl_seconds_after_finished, Some(300));

        let pod = job_spec.template.spec.unwrap();
        assert_eq!(pod.restart_policy.as_deref(), Some("Never"));
        // No mount files means the shared volume is the only volume.
        assert_eq!(pod.volumes.as_ref().unwrap().len(), 1);

        let container = &pod.containers[0];
        assert_eq!(container.image.as_deref(), Some("quay.io/engines/cromwell:87"));
        assert_eq!(
            container.command.as_deref(),
            Some(&["cromwell".to_string(), "run".to_string()][..])
        );
        assert_eq!(container.working_dir.as_deref(), Some("/pvc"));

        // Environment is emitted in deterministic order.
        let env = container.env.as_ref().unwrap();
        assert_eq!(env[0].name, "A_VAR");
        assert_eq!(env[1].name, "B_VAR");
    }

    #[test]
    fn test_executor_job_with_config_map_volumes() {
        let config = test_config();
        let spec = test_spec();
        let job = build_executor_job(
            &config,
            "run-1",
            &spec,
            Some("executor-run-1-root"),
            Some("executor-run-1-project"),
            vec![],
        );
        let volumes = job.spec.unwrap().template.spec.unwrap().volumes.unwrap();
        let names: Vec<&str> = volumes.iter().map(|v| v.name.as_str()).collect();
        assert_eq!(names, vec!["workflow-pvc", "root-files", "project-files"]);
        assert_eq!(
            volumes[1]
                .config_map
                .as_ref()
                .unwrap()
                .name
                .as_deref(),
            Some("executor-run-1-root")
        );
    }
}
