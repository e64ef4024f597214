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

//! Cluster plumbing for Metis.
//!
//! Everything a run needs inside the cluster is created here: the
//! attachment config maps, the per-run shared volume, the preparer and
//! executor jobs, and the owner references that let the cluster garbage
//! collector tear it all down together once the owning job's TTL expires.
//! The watcher drives an executor job to a terminal [`JobResult`].

mod attachments;
mod error;
mod executor_job;
mod owner;
mod preparer_job;
mod pvc;
mod watcher;

pub use attachments::{create_attachment_config_maps, Attachment};
pub use error::{KubeError, Result};
pub use executor_job::launch_executor_job;
pub use owner::{owner_reference, set_owner_references};
pub use preparer_job::{build_preparer_args, create_preparer_job};
pub use pvc::create_pvc_for_run;
pub use watcher::{cancel_run_jobs, watch_job};

use error_stack::ResultExt as _;
use kube::config::{KubeConfigOptions, Kubeconfig};

pub(crate) const APP_LABEL: &str = "metis";

/// Build a cluster client.
///
/// An empty `config_path` selects the in-cluster (or default kubeconfig)
/// configuration; otherwise the kubeconfig at the given path is used.
pub async fn create_client(config_path: &str) -> Result<kube::Client> {
    if config_path.is_empty() {
        tracing::debug!("using in-cluster Kubernetes configuration");
        return kube::Client::try_default()
            .await
            .change_context(KubeError::Client);
    }
    tracing::debug!(path = %config_path, "using kubeconfig from path");
    let kubeconfig = Kubeconfig::read_from(config_path).change_context(KubeError::Client)?;
    let config =
        kube::Config::from_custom_kubeconfig(kubeconfig, &KubeConfigOptions::default())
            .await
            .change_context(KubeError::Client)?;
    kube::Client::try_from(config).change_context(KubeError::Client)
}

/// Common labels stamped on every object belonging to a run.
pub(crate) fn run_labels(
    run_id: &str,
    component: &str,
) -> std::collections::BTreeMap<String, String> {
    std::collections::BTreeMap::from([
        ("app".to_string(), APP_LABEL.to_string()),
        ("metis/run-id".to_string(), run_id.to_string()),
        ("metis/component".to_string(), component.to_string()),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_labels() {
        let labels = run_labels("run-1", "executor");
        assert_eq!(labels.get("app").map(String::as_str), Some("metis"));
        assert_eq!(labels.get("metis/run-id").map(String::as_str), Some("run-1"));
        assert_eq!(
            labels.get("metis/component").map(String::as_str),
            Some("executor")
        );
    }
}
