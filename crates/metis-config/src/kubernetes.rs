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

/// Cluster configuration (`METIS_K8S_*`).
///
/// The mount path is identical inside the preparer and executor pods, so
/// paths recorded by one are valid in the other.
#[derive(Debug, Clone)]
pub struct KubernetesConfig {
    pub namespace: String,
    /// Image running the `preparer` subcommand
    pub image_name: String,
    pub image_pull_policy: String,
    pub restart_policy: String,
    /// Finalisation TTL applied to preparer and executor jobs
    pub job_ttl_seconds: i32,
    pub default_pvc_size: String,
    pub pvc_storage_class: String,
    pub pvc_mount_path: String,
    pub pvc_prefix: String,
    pub preparer_prefix: String,
    pub executor_prefix: String,
    pub common_pvc_volume_name: String,
    pub service_account_name: String,
    pub security_context_enabled: bool,
    /// Path to a kubeconfig; empty means in-cluster configuration
    pub config_path: String,
}

impl KubernetesConfig {
    pub(crate) fn load(env: &Env) -> Result<Self> {
        Ok(KubernetesConfig {
            namespace: env.string("K8S_NAMESPACE", "metis"),
            image_name: env.string("K8S_IMAGE_NAME", "metis/metis:latest"),
            image_pull_policy: env.string("K8S_IMAGE_PULL_POLICY", "IfNotPresent"),
            restart_policy: env.string("K8S_RESTART_POLICY", "Never"),
            job_ttl_seconds: env.parse("K8S_JOB_TTL", 300)?,
            default_pvc_size: env.string("K8S_DEFAULT_PVC_SIZE", "100Mi"),
            pvc_storage_class: env.string("K8S_PVC_STORAGE_CLASS", ""),
            pvc_mount_path: env.string("K8S_PVC_MOUNT_PATH", "/pvc"),
            pvc_prefix: env.string("K8S_PVC_PREFIX", "pvc"),
            preparer_prefix: env.string("K8S_PREPARER_PREFIX", "preparer"),
            executor_prefix: env.string("K8S_EXECUTOR_PREFIX", "executor"),
            common_pvc_volume_name: env.string("K8S_COMMON_PVC_VOLUME_NAME", "workflow-pvc"),
            service_account_name: env.string("K8S_SERVICE_ACCOUNT_NAME", "metis-service-account"),
            security_context_enabled: env.parse("K8S_SECURITY_CONTEXT_ENABLED", false)?,
            config_path: env.string("K8S_CONFIG_PATH", ""),
        })
    }

    pub fn pvc_name(&self, run_id: &str) -> String {
        format!("{}-{}", self.pvc_prefix, run_id)
    }

    pub fn preparer_job_name(&self, run_id: &str) -> String {
        format!("{}-{}", self.preparer_prefix, run_id)
    }

    pub fn executor_job_name(&self, run_id: &str) -> String {
        format!("{}-{}", self.executor_prefix, run_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Config;

    #[test]
    fn test_resource_names() {
        let config = Config::from_vars(&[]).unwrap().kubernetes;
        assert_eq!(config.pvc_name("abc"), "pvc-abc");
        assert_eq!(config.preparer_job_name("abc"), "preparer-abc");
        assert_eq!(config.executor_job_name("abc"), "executor-abc");
    }
}
