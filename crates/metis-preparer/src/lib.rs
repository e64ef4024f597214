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

//! Per-run orchestration.
//!
//! The preparer runs inside the cluster, one process per run, and drives
//! the run top to bottom: select a plugin, download the workflow, translate
//! the request into an execution spec, launch and watch the executor job,
//! stage outputs, parse logs, write the final document. Any failure writes
//! `SYSTEM_ERROR` with diagnostics to the run document before the process
//! exits non-zero.

mod convert;
mod error;
mod outputs;

pub use error::{PreparerError, Result};

use std::path::Path;
use std::sync::Arc;

use chrono::Local;
use error_stack::{report, Report, ResultExt as _};
use metis_config::Config;
use metis_core::{JobOutcome, JobResult, RunLog, RunRequest, RunState, TaskLog};
use metis_proto::pb;
use metis_proto::PluginClient;
use metis_state::{RunDocument, RunStore};

use crate::error::error_chain;

/// The per-run orchestrator.
///
/// Holds the process-wide clients, all initialised before dispatch and
/// read-only afterwards; per-run state lives in the run document.
pub struct Preparer {
    config: Arc<Config>,
    store: Arc<dyn RunStore>,
    kube: kube::Client,
}

impl Preparer {
    pub fn new(config: Arc<Config>, store: Arc<dyn RunStore>, kube: kube::Client) -> Self {
        Preparer {
            config,
            store,
            kube,
        }
    }

    /// Drive one run to completion.
    ///
    /// On failure the run document is updated with the error before the
    /// error surfaces to the caller (which exits non-zero).
    pub async fn run(&self, run_id: &str, request: RunRequest) -> Result<()> {
        let start_time = Local::now().to_rfc3339();
        match self.execute(run_id, &request, &start_time).await {
            Ok(()) => Ok(()),
            Err(error) => {
                record_failure(self.store.as_ref(), run_id, &error).await;
                Err(error)
            }
        }
    }

    async fn execute(&self, run_id: &str, request: &RunRequest, start_time: &str) -> Result<()> {
        let engine_version = request
            .workflow_engine_version
            .clone()
            .unwrap_or_default();
        let binding = self
            .config
            .plugins
            .find(&request.workflow_type, &engine_version)
            .ok_or_else(|| report!(PreparerError::NoSuitablePlugin))?;
        let plugin = PluginClient::new(binding.plugin_url.clone());

        let mount_path = Path::new(&self.config.kubernetes.pvc_mount_path);
        let downloader = metis_download::downloader_for(&request.workflow_url)
            .change_context(PreparerError::Download)?;
        let primary_descriptor = downloader
            .download(&request.workflow_url, mount_path, &request.workflow_type)
            .await
            .change_context(PreparerError::Download)?;
        tracing::info!(path = %primary_descriptor.display(), "downloaded workflow");

        let staging = &self.config.staging;
        let provider =
            metis_staging::provider_for(&staging.kind, &staging.bucket, &staging.prefix)
                .change_context(PreparerError::Staging)?;
        let staging_info = pb::StagingInfo {
            staging_url: provider.uri(run_id),
            endpoint_url: staging.url.clone(),
            parameters: staging.parameters.clone(),
        };

        let spec = plugin
            .get_execution_spec(pb::GetExecutionSpecRequest {
                wes_request: Some(convert::to_wes_request(request)),
                staging_info: Some(staging_info.clone()),
                primary_descriptor: primary_descriptor.to_string_lossy().into_owned(),
                backend_config: Some(convert::to_backend_config(&self.config.backend)),
            })
            .await
            .change_context(PreparerError::GetExecutionSpec)?;

        metis_kube::launch_executor_job(&self.kube, &self.config.kubernetes, run_id, &spec)
            .await
            .change_context(PreparerError::LaunchJob)?;
        self.store
            .update_run_state(run_id, RunState::Running, Some(start_time.to_string()))
            .await
            .change_context(PreparerError::StoreUpdate)?;

        let result = metis_kube::watch_job(&self.kube, &self.config.kubernetes, run_id)
            .await
            .change_context(PreparerError::WatchJob)?;

        match result.outcome {
            JobOutcome::Succeeded => {
                if !spec.outputs_to_stage.is_empty() {
                    outputs::stage_outputs(
                        provider.as_ref(),
                        &staging_info,
                        mount_path,
                        &staging.prefix,
                        run_id,
                        &spec.outputs_to_stage,
                    )
                    .await?;
                }
            }
            JobOutcome::FailedCommand => {
                tracing::error!(message = ?result.message, "command failed");
            }
            JobOutcome::FailedSystem => {
                tracing::error!(message = ?result.message, "system failed");
            }
        }

        let parsed = plugin
            .parse_execution(pb::ParseExecutionRequest {
                job_logs: result.logs.clone(),
                staging_info: Some(staging_info),
                state: parse_state(result.outcome) as i32,
            })
            .await
            .change_context(PreparerError::ParseExecution)?;

        compose_final_document(
            self.store.as_ref(),
            run_id,
            request,
            &result,
            &parsed,
            start_time,
        )
        .await
    }
}

/// The parse state handed to the plugin for a terminal outcome.
pub(crate) fn parse_state(outcome: JobOutcome) -> pb::ParseState {
    match outcome {
        JobOutcome::Succeeded => pb::ParseState::Success,
        JobOutcome::FailedCommand | JobOutcome::FailedSystem => pb::ParseState::Failure,
    }
}

/// Best-effort terminal error write. A store failure here is logged and
/// swallowed; the job still terminates.
pub(crate) async fn record_failure(
    store: &dyn RunStore,
    run_id: &str,
    error: &Report<PreparerError>,
) {
    let stderr = error_chain(error);
    let system_logs = format!("{error:?}");
    if let Err(store_error) = store.update_run_error(run_id, stderr, system_logs).await {
        tracing::error!(?store_error, %run_id, "failed to record run failure");
    }
}

/// Compose and overwrite the final run document: outcome-mapped state,
/// the plugin's transcribed run log, and observed timestamps for any the
/// plugin left blank.
pub(crate) async fn compose_final_document(
    store: &dyn RunStore,
    run_id: &str,
    request: &RunRequest,
    result: &JobResult,
    parsed: &pb::WesRunLog,
    start_time: &str,
) -> Result<()> {
    let mut document = store
        .get_run(run_id)
        .await
        .change_context(PreparerError::StoreUpdate)?
        .unwrap_or_else(|| RunDocument::queued(run_id, request.clone()));

    let run_log = document.workflow.run_log.get_or_insert_with(RunLog::default);
    run_log.run_id = Some(run_id.to_string());
    run_log.state = Some(result.outcome.run_state());
    run_log.request = Some(request.clone());

    let mut top_level = parsed
        .run_log
        .as_ref()
        .map(convert::to_task_log)
        .unwrap_or_default();
    if top_level.name.is_none() {
        top_level.name = Some(run_id.to_string());
    }
    if top_level.start_time.is_none() {
        top_level.start_time = Some(start_time.to_string());
    }
    if top_level.end_time.is_none() {
        top_level.end_time = Some(Local::now().to_rfc3339());
    }
    if top_level.stderr.is_none() {
        top_level.stderr = result.message.clone();
    }
    run_log.run_log = Some(top_level);

    let tasks: Vec<TaskLog> = parsed.task_logs.iter().map(convert::to_task_log).collect();
    run_log.task_logs = (!tasks.is_empty()).then(|| tasks.clone());
    run_log.outputs = Some(convert::to_outputs(&parsed.outputs));
    document.workflow.tasks = (!tasks.is_empty()).then_some(tasks);

    store
        .replace_run(document)
        .await
        .change_context(PreparerError::StoreUpdate)
}

#[cfg(test)]
mod tests {
    use super::*;
    use metis_state::InMemoryRunStore;

    fn request() -> RunRequest {
        RunRequest {
            workflow_url: "file://hello.wdl".to_string(),
            workflow_type: "WDL".to_string(),
            workflow_type_version: "1.0".to_string(),
            workflow_engine_version: Some("1.0".to_string()),
            ..Default::default()
        }
    }

    fn parsed_log() -> pb::WesRunLog {
        pb::WesRunLog {
            run_log: Some(pb::WesTaskLog {
                name: String::new(),
                cmd: vec!["true".to_string()],
                start_time: String::new(),
                end_time: String::new(),
                stdout: "done".to_string(),
                stderr: String::new(),
                exit_code: 0,
                system_logs: vec![],
            }),
            task_logs: vec![pb::WesTaskLog {
                name: "task-1".to_string(),
                ..Default::default()
            }],
            outputs: Default::default(),
        }
    }

    #[test]
    fn test_parse_state_mapping() {
        assert_eq!(parse_state(JobOutcome::Succeeded), pb::ParseState::Success);
        assert_eq!(
            parse_state(JobOutcome::FailedCommand),
            pb::ParseState::Failure
        );
        assert_eq!(
            parse_state(JobOutcome::FailedSystem),
            pb::ParseState::Failure
        );
    }

    #[tokio::test]
    async fn test_compose_success_document() {
        let store = InMemoryRunStore::new();
        store
            .insert_run(RunDocument::queued("run-1", request()))
            .await
            .unwrap();

        let start = Local::now().to_rfc3339();
        compose_final_document(
            &store,
            "run-1",
            &request(),
            &JobResult::succeeded("logs".to_string()),
            &parsed_log(),
            &start,
        )
        .await
        .unwrap();

        let document = store.get_run("run-1").await.unwrap().unwrap();
        assert_eq!(document.state(), RunState::Complete);
        let run_log = document.workflow.run_log.unwrap();
        let top = run_log.run_log.unwrap();
        assert_eq!(top.name.as_deref(), Some("run-1"));
        assert_eq!(top.start_time.as_deref(), Some(start.as_str()));
        assert!(top.end_time.is_some());
        assert_eq!(top.stdout.as_deref(), Some("done"));
        assert_eq!(run_log.task_logs.unwrap().len(), 1);
        assert_eq!(document.workflow.tasks.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_compose_command_failure_maps_to_executor_error() {
        let store = InMemoryRunStore::new();
        store
            .insert_run(RunDocument::queued("run-1", request()))
            .await
            .unwrap();

        let result = JobResult {
            outcome: JobOutcome::FailedCommand,
            logs: "logs".to_string(),
            message: Some("Job failed due to command execution error.".to_string()),
        };
        let parsed = pb::WesRunLog::default();
        compose_final_document(
            &store,
            "run-1",
            &request(),
            &result,
            &parsed,
            "2025-06-01T12:00:00+00:00",
        )
        .await
        .unwrap();

        let document = store.get_run("run-1").await.unwrap().unwrap();
        assert_eq!(document.state(), RunState::ExecutorError);
        let top = document.workflow.run_log.unwrap().run_log.unwrap();
        assert_eq!(
            top.stderr.as_deref(),
            Some("Job failed due to command execution error.")
        );
    }

    #[tokio::test]
    async fn test_record_failure_writes_terminal_error() {
        let store = InMemoryRunStore::new();
        store
            .insert_run(RunDocument::queued("run-1", request()))
            .await
            .unwrap();

        let error = report!(PreparerError::NoSuitablePlugin);
        record_failure(&store, "run-1", &error).await;

        let document = store.get_run("run-1").await.unwrap().unwrap();
        assert_eq!(document.state(), RunState::SystemError);
        let top = document.workflow.run_log.unwrap().run_log.unwrap();
        assert_eq!(top.stderr.as_deref(), Some("no suitable plugin found"));
        assert!(top.end_time.is_some());
    }

    #[tokio::test]
    async fn test_record_failure_swallows_store_errors() {
        // The run was never inserted, so the update fails; the call must
        // not panic or surface the store error.
        let store = InMemoryRunStore::new();
        let error = report!(PreparerError::Download);
        record_failure(&store, "missing", &error).await;
    }
}
