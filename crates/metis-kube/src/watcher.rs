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

//! Observation of an executor job to its terminal outcome.
//!
//! The watcher reads the job once, then subscribes to change events from
//! the observed resource version so no edit is missed. On stream closure
//! it falls back to one direct status read. A failed job is classified as
//! a system failure when a pod container sits in a waiting state
//! (image pull, scheduling); every other failure is a command failure.

use std::time::Duration;

use error_stack::{report, ResultExt as _};
use futures::StreamExt as _;
use k8s_openapi::api::batch::v1::Job;
use k8s_openapi::api::core::v1::Pod;
use kube::api::{DeleteParams, ListParams, LogParams, WatchEvent, WatchParams};
use kube::Api;
use metis_config::KubernetesConfig;
use metis_core::{JobOutcome, JobResult};

use crate::{KubeError, Result};

const GET_JOB_ATTEMPTS: u32 = 5;
const GET_JOB_RETRY_DELAY: Duration = Duration::from_secs(1);

fn job_succeeded(job: &Job) -> bool {
    job.status
        .as_ref()
        .and_then(|status| status.succeeded)
        .unwrap_or(0)
        > 0
}

fn job_failed(job: &Job) -> bool {
    job.status
        .as_ref()
        .and_then(|status| status.failed)
        .unwrap_or(0)
        > 0
}

/// Classify a failed job from its pods.
///
/// A container stuck in a waiting state signals a failure outside the
/// workflow command; otherwise the command itself failed.
pub(crate) fn classify_failure(pods: &[Pod], logs: String) -> JobResult {
    if let Some(pod) = pods.first() {
        let statuses = pod
            .status
            .as_ref()
            .and_then(|status| status.container_statuses.as_ref());
        for container in statuses.into_iter().flatten() {
            if let Some(waiting) = container.state.as_ref().and_then(|s| s.waiting.as_ref()) {
                return JobResult {
                    outcome: JobOutcome::FailedSystem,
                    logs,
                    message: Some(format!(
                        "Container {} is in a waiting state: {} - {}",
                        container.name,
                        waiting.reason.as_deref().unwrap_or_default(),
                        waiting.message.as_deref().unwrap_or_default(),
                    )),
                };
            }
        }
    }
    JobResult {
        outcome: JobOutcome::FailedCommand,
        logs,
        message: Some("Job failed due to command execution error.".to_string()),
    }
}

/// Concatenate the logs of every pod belonging to a job.
///
/// A pod whose logs cannot be read is recorded inline and does not abort
/// collection.
async fn collect_job_logs(
    client: &kube::Client,
    config: &KubernetesConfig,
    job_name: &str,
) -> Result<String> {
    let api: Api<Pod> = Api::namespaced(client.clone(), &config.namespace);
    let pods = api
        .list(&ListParams::default().labels(&format!("job-name={job_name}")))
        .await
        .change_context_lazy(|| KubeError::GetResource(format!("pods of job {job_name}")))?;
    if pods.items.is_empty() {
        tracing::warn!(job = %job_name, "no pods found for job");
        return Ok(String::new());
    }

    let mut all_logs = String::new();
    for pod in &pods.items {
        let pod_name = pod.metadata.name.clone().unwrap_or_default();
        all_logs.push_str(&format!("--- Job Logs (pod: {pod_name}) ---\n"));
        match api.logs(&pod_name, &LogParams::default()).await {
            Ok(pod_logs) => {
                all_logs.push_str(&pod_logs);
                all_logs.push_str("--------------------------\n");
            }
            Err(error) => {
                all_logs.push_str(&format!("failed to get pod logs: {error}\n"));
            }
        }
    }
    Ok(all_logs)
}

async fn logs_best_effort(
    client: &kube::Client,
    config: &KubernetesConfig,
    job_name: &str,
) -> String {
    match collect_job_logs(client, config, job_name).await {
        Ok(logs) => logs,
        Err(error) => {
            tracing::error!(job = %job_name, ?error, "failed to get logs for job");
            String::new()
        }
    }
}

async fn analyze_job_failure(
    client: &kube::Client,
    config: &KubernetesConfig,
    job_name: &str,
) -> JobResult {
    let logs = logs_best_effort(client, config, job_name).await;
    let api: Api<Pod> = Api::namespaced(client.clone(), &config.namespace);
    let pods = match api
        .list(&ListParams::default().labels(&format!("job-name={job_name}")))
        .await
    {
        Ok(list) => list.items,
        Err(error) => {
            tracing::error!(job = %job_name, %error, "failed to list pods of failed job");
            Vec::new()
        }
    };
    classify_failure(&pods, logs)
}

/// Evaluate a job snapshot; `None` means the job is not terminal yet.
async fn evaluate(
    client: &kube::Client,
    config: &KubernetesConfig,
    job_name: &str,
    job: &Job,
) -> Option<JobResult> {
    if job_succeeded(job) {
        let logs = logs_best_effort(client, config, job_name).await;
        return Some(JobResult::succeeded(logs));
    }
    if job_failed(job) {
        return Some(analyze_job_failure(client, config, job_name).await);
    }
    None
}

/// Tolerate propagation latency between job creation and visibility.
async fn get_job_with_retry(api: &Api<Job>, job_name: &str) -> Result<Job> {
    let mut last_error = None;
    for attempt in 0..GET_JOB_ATTEMPTS {
        match api.get(job_name).await {
            Ok(job) => return Ok(job),
            Err(error) => {
                tracing::debug!(job = %job_name, attempt, %error, "job not visible yet");
                last_error = Some(error);
                tokio::time::sleep(GET_JOB_RETRY_DELAY).await;
            }
        }
    }
    Err(report!(last_error.expect("at least one attempt")))
        .change_context_lazy(|| KubeError::GetResource(format!("job {job_name} after retries")))
}

async fn check_job_status(
    client: &kube::Client,
    config: &KubernetesConfig,
    job_name: &str,
) -> Result<JobResult> {
    let api: Api<Job> = Api::namespaced(client.clone(), &config.namespace);
    let job = api
        .get(job_name)
        .await
        .change_context_lazy(|| KubeError::GetResource(format!("final status of job {job_name}")))?;
    match evaluate(client, config, job_name, &job).await {
        Some(result) => Ok(result),
        None => Err(report!(KubeError::JobNotFinished(job_name.to_string()))),
    }
}

/// Watch the executor job of a run until it reaches a terminal outcome.
pub async fn watch_job(
    client: &kube::Client,
    config: &KubernetesConfig,
    run_id: &str,
) -> Result<JobResult> {
    let job_name = config.executor_job_name(run_id);
    let api: Api<Job> = Api::namespaced(client.clone(), &config.namespace);

    let job = get_job_with_retry(&api, &job_name).await?;
    if let Some(result) = evaluate(client, config, &job_name, &job).await {
        return Ok(result);
    }

    // Resume from the observed version so no status edit is missed.
    let resource_version = job.metadata.resource_version.clone().unwrap_or_default();
    let params = WatchParams::default().fields(&format!("metadata.name={job_name}"));
    let stream = api
        .watch(&params, &resource_version)
        .await
        .change_context_lazy(|| KubeError::Watch(job_name.clone()))?;
    futures::pin_mut!(stream);

    tracing::info!(job = %job_name, namespace = %config.namespace, "watching job");
    loop {
        match stream.next().await {
            Some(Ok(WatchEvent::Added(job) | WatchEvent::Modified(job))) => {
                if let Some(result) = evaluate(client, config, &job_name, &job).await {
                    return Ok(result);
                }
            }
            Some(Ok(_)) => {}
            Some(Err(error)) => {
                tracing::warn!(job = %job_name, %error, "watch stream error, reading status directly");
                return check_job_status(client, config, &job_name).await;
            }
            None => {
                tracing::warn!(job = %job_name, "watch stream closed, reading status directly");
                return check_job_status(client, config, &job_name).await;
            }
        }
    }
}

/// Send the abort signal for a run: best-effort deletion of its executor
/// and preparer jobs. Missing jobs are ignored.
pub async fn cancel_run_jobs(
    client: &kube::Client,
    config: &KubernetesConfig,
    run_id: &str,
) -> Result<()> {
    let api: Api<Job> = Api::namespaced(client.clone(), &config.namespace);
    for job_name in [
        config.executor_job_name(run_id),
        config.preparer_job_name(run_id),
    ] {
        match api.delete(&job_name, &DeleteParams::default()).await {
            Ok(_) => tracing::info!(job = %job_name, "deleted job"),
            Err(kube::Error::Api(response)) if response.code == 404 => {}
            Err(error) => {
                return Err(report!(error))
                    .change_context_lazy(|| KubeError::DeleteResource(format!("job {job_name}")));
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use k8s_openapi::api::batch::v1::JobStatus;
    use k8s_openapi::api::core::v1::{
        ContainerState, ContainerStateWaiting, ContainerStatus, PodStatus,
    };
    use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;

    fn job_with_status(succeeded: Option<i32>, failed: Option<i32>) -> Job {
        Job {
            status: Some(JobStatus {
                succeeded,
                failed,
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    fn pod_with_waiting(reason: &str, message: &str) -> Pod {
        Pod {
            metadata: ObjectMeta {
                name: Some("executor-run-1-abcde".to_string()),
                ..Default::default()
            },
            status: Some(PodStatus {
                container_statuses: Some(vec![ContainerStatus {
                    name: "executor-run-1".to_string(),
                    state: Some(ContainerState {
                        waiting: Some(ContainerStateWaiting {
                            reason: Some(reason.to_string()),
                            message: Some(message.to_string()),
                        }),
                        ..Default::default()
                    }),
                    ..Default::default()
                }]),
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    #[test]
    fn test_status_counters() {
        assert!(job_succeeded(&job_with_status(Some(1), None)));
        assert!(!job_succeeded(&job_with_status(Some(0), None)));
        assert!(!job_succeeded(&Job::default()));
        assert!(job_failed(&job_with_status(None, Some(1))));
        assert!(!job_failed(&job_with_status(None, None)));
    }

    #[test]
    fn test_waiting_container_is_system_failure() {
        let pods = vec![pod_with_waiting(
            "ImagePullBackOff",
            "Back-off pulling image \"no/such-image\"",
        )];
        let result = classify_failure(&pods, "logs".to_string());
        assert_eq!(result.outcome, JobOutcome::FailedSystem);
        let message = result.message.unwrap();
        assert!(message.contains("ImagePullBackOff"));
        assert!(message.contains("Back-off pulling image"));
        assert_eq!(result.logs, "logs");
    }

    #[test]
    fn test_plain_failure_is_command_failure() {
        let pods = vec![Pod::default()];
        let result = classify_failure(&pods, String::new());
        assert_eq!(result.outcome, JobOutcome::FailedCommand);
        assert_eq!(
            result.message.as_deref(),
            Some("Job failed due to command execution error.")
        );
    }

    #[test]
    fn test_no_pods_is_command_failure() {
        let result = classify_failure(&[], String::new());
        assert_eq!(result.outcome, JobOutcome::FailedCommand);
    }

    #[test]
    fn test_classification_is_deterministic() {
        let pods = vec![pod_with_waiting("ErrImagePull", "manifest unknown")];
        let first = classify_failure(&pods, "same logs".to_string());
        let second = classify_failure(&pods, "same logs".to_string());
        assert_eq!(first.outcome, second.outcome);
        assert_eq!(first.message, second.message);
        assert_eq!(first.logs, second.logs);
    }
}
