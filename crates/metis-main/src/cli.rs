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

use std::path::PathBuf;
use std::sync::Arc;

use error_stack::ResultExt as _;
use metis_config::Config;
use metis_core::RunRequest;
use metis_state::RunStore;
use metis_state_mongo::{MongoRunStore, MongoRunStoreConfig};

use crate::args::{LogFormat, LogLevel};
use crate::error::Result;
use crate::MainError;

/// Metis command line application.
#[derive(clap::Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Set the log level for Metis.
    #[arg(
        long = "log-level",
        value_name = "LEVEL",
        env = "METIS_LOG_LEVEL",
        default_value = "info",
        global = true
    )]
    pub log_level: LogLevel,

    /// Set the log level for other parts of Metis.
    #[arg(
        long = "other-log-level",
        value_name = "LEVEL",
        default_value = "warn",
        global = true
    )]
    pub other_log_level: LogLevel,

    /// Log output format.
    #[arg(
        long = "log-format",
        value_name = "FORMAT",
        env = "METIS_LOG_FORMAT",
        default_value = "text",
        global = true
    )]
    pub log_format: LogFormat,

    /// Write logs to a file instead of stderr.
    #[arg(long = "log-file", value_name = "FILE", value_hint = clap::ValueHint::FilePath, global = true)]
    pub log_file: Option<PathBuf>,

    /// Omit stack traces (line numbers of errors).
    #[arg(long = "omit-stack-trace", global = true)]
    pub omit_stack_trace: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Subcommand, Debug)]
pub enum Command {
    /// Start the WES API server.
    ///
    /// Accepts workflow submissions over HTTP, provisions the per-run
    /// cluster resources and serves status and log queries.
    Api,
    /// Orchestrate a single workflow run.
    ///
    /// Runs inside the cluster as a one-shot job created by the API
    /// server; the flags mirror the WES submission fields.
    Preparer {
        /// URL of the workflow to run.
        #[arg(long = "workflow_url", value_name = "URL")]
        workflow_url: String,

        /// Workflow language, e.g. WDL or CWL.
        #[arg(long = "workflow_type", value_name = "TYPE")]
        workflow_type: String,

        /// Version of the workflow language.
        #[arg(long = "workflow_type_version", value_name = "VERSION")]
        workflow_type_version: String,

        /// Workflow engine to use.
        #[arg(long = "workflow_engine", value_name = "ENGINE")]
        workflow_engine: Option<String>,

        /// Version of the workflow engine.
        #[arg(long = "workflow_engine_version", value_name = "VERSION")]
        workflow_engine_version: Option<String>,

        /// JSON object of workflow parameters.
        #[arg(long = "workflow_params", value_name = "JSON")]
        workflow_params: Option<String>,

        /// JSON object of engine parameters.
        #[arg(long = "workflow_engine_parameters", value_name = "JSON")]
        workflow_engine_parameters: Option<String>,

        /// JSON object of tags.
        #[arg(long = "tags", value_name = "JSON")]
        tags: Option<String>,

        /// The id of the workflow run.
        #[arg(long = "run_id", value_name = "ID")]
        run_id: String,
    },
    /// Print `ok` and exit; used as the container liveness probe.
    Healthz,
}

/// Parse an optional JSON-encoded flag, dropping undecodable values with
/// a warning the way lenient WES servers treat them.
fn parse_json_flag<T: serde::de::DeserializeOwned>(flag: &str, value: Option<String>) -> Option<T> {
    let raw = value.filter(|v| !v.is_empty())?;
    match serde_json::from_str(&raw) {
        Ok(parsed) => Some(parsed),
        Err(error) => {
            tracing::warn!(%flag, %error, "ignoring undecodable JSON flag");
            None
        }
    }
}

async fn init_clients(
    config: &Config,
) -> Result<(kube::Client, Arc<dyn RunStore>)> {
    let kube = metis_kube::create_client(&config.kubernetes.config_path)
        .await
        .change_context(MainError::InitializeClients)?;
    let store = MongoRunStore::connect(&MongoRunStoreConfig {
        host: config.mongo.host.clone(),
        port: config.mongo.port,
        username: config.mongo.username.clone(),
        password: config.mongo.password.clone(),
        database: config.mongo.database.clone(),
        collection: config.mongo.workflow_collection.clone(),
    })
    .await
    .change_context(MainError::InitializeClients)?;
    Ok((kube, Arc::new(store)))
}

impl Cli {
    pub async fn execute(self) -> Result<()> {
        match self.command {
            Command::Api => {
                let config = Arc::new(
                    Config::from_env().change_context(MainError::Configuration)?,
                );
                let (kube, store) = init_clients(&config).await?;
                let state = metis_server::AppState::new(store, kube, config);
                metis_server::start_server(state)
                    .await
                    .map_err(|error| {
                        error_stack::report!(MainError::ServerError)
                            .attach_printable(error.to_string())
                    })?;
            }
            Command::Preparer {
                workflow_url,
                workflow_type,
                workflow_type_version,
                workflow_engine,
                workflow_engine_version,
                workflow_params,
                workflow_engine_parameters,
                tags,
                run_id,
            } => {
                let config = Arc::new(
                    Config::from_env().change_context(MainError::Configuration)?,
                );
                let (kube, store) = init_clients(&config).await?;

                let request = RunRequest {
                    workflow_url,
                    workflow_type,
                    workflow_type_version,
                    workflow_engine: workflow_engine.filter(|e| !e.is_empty()),
                    workflow_engine_version: workflow_engine_version.filter(|v| !v.is_empty()),
                    workflow_params: parse_json_flag("workflow_params", workflow_params),
                    workflow_engine_parameters: parse_json_flag(
                        "workflow_engine_parameters",
                        workflow_engine_parameters,
                    ),
                    tags: parse_json_flag("tags", tags),
                };

                let preparer = metis_preparer::Preparer::new(config, store, kube);
                preparer
                    .run(&run_id, request)
                    .await
                    .change_context(MainError::RunFailed)?;
            }
            Command::Healthz => {
                #[allow(clippy::print_stdout)]
                {
                    println!("ok");
                }
            }
        };

        Ok(())
    }
}
