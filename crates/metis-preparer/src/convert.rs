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

//! Transcription between the core data model and the plugin wire types.
//!
//! The plugin's `WesRunLog` is transcribed field by field, never
//! interpreted: empty wire strings become absent fields and nothing else
//! changes.

use std::collections::HashMap;

use metis_config::{BackendConfig, BackendType};
use metis_core::{RunRequest, TaskLog};
use metis_proto::pb;
use metis_proto::{json_to_proto_value, proto_value_to_json};

fn none_if_empty(value: String) -> Option<String> {
    (!value.is_empty()).then_some(value)
}

/// Build the plugin-facing request from a WES run request.
pub(crate) fn to_wes_request(request: &RunRequest) -> pb::WesRequest {
    pb::WesRequest {
        workflow_url: request.workflow_url.clone(),
        workflow_type: request.workflow_type.clone(),
        workflow_type_version: request.workflow_type_version.clone(),
        workflow_params: request
            .workflow_params
            .as_ref()
            .map(|params| {
                params
                    .iter()
                    .map(|(key, value)| (key.clone(), json_to_proto_value(value)))
                    .collect()
            })
            .unwrap_or_default(),
        workflow_engine: request.workflow_engine.clone().unwrap_or_default(),
        workflow_engine_version: request.workflow_engine_version.clone().unwrap_or_default(),
        workflow_engine_parameters: request
            .workflow_engine_parameters
            .clone()
            .unwrap_or_default(),
        tags: request.tags.clone().unwrap_or_default(),
    }
}

pub(crate) fn to_backend_config(backend: &BackendConfig) -> pb::BackendConfig {
    pb::BackendConfig {
        backend_type: match backend.kind {
            BackendType::Local => "local".to_string(),
            BackendType::Tes => "tes".to_string(),
        },
        tes_url: backend.tes_url.clone(),
        tes_token: backend.tes_token.clone(),
    }
}

/// Transcribe a plugin task log into the stored form.
pub(crate) fn to_task_log(log: &pb::WesTaskLog) -> TaskLog {
    TaskLog {
        name: none_if_empty(log.name.clone()),
        cmd: (!log.cmd.is_empty()).then(|| log.cmd.clone()),
        start_time: none_if_empty(log.start_time.clone()),
        end_time: none_if_empty(log.end_time.clone()),
        stdout: none_if_empty(log.stdout.clone()),
        stderr: none_if_empty(log.stderr.clone()),
        exit_code: Some(log.exit_code),
        system_logs: (!log.system_logs.is_empty()).then(|| log.system_logs.clone()),
    }
}

pub(crate) fn to_outputs(
    outputs: &HashMap<String, prost_types::Value>,
) -> HashMap<String, serde_json::Value> {
    outputs
        .iter()
        .map(|(key, value)| (key.clone(), proto_value_to_json(value)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_wes_request_round_trips_fields() {
        let request = RunRequest {
            workflow_url: "trs://registry/tool/v1".to_string(),
            workflow_type: "CWL".to_string(),
            workflow_type_version: "v1.2".to_string(),
            workflow_engine: None,
            workflow_engine_version: Some("3.1".to_string()),
            workflow_params: Some(HashMap::from([("n".to_string(), json!(2.0))])),
            workflow_engine_parameters: Some(HashMap::from([(
                "--parallel".to_string(),
                "4".to_string(),
            )])),
            tags: None,
        };
        let wire = to_wes_request(&request);
        assert_eq!(wire.workflow_url, "trs://registry/tool/v1");
        assert_eq!(wire.workflow_engine, "");
        assert_eq!(wire.workflow_engine_version, "3.1");
        assert_eq!(
            proto_value_to_json(wire.workflow_params.get("n").unwrap()),
            json!(2.0)
        );
        assert_eq!(
            wire.workflow_engine_parameters.get("--parallel").map(String::as_str),
            Some("4")
        );
        assert!(wire.tags.is_empty());
    }

    #[test]
    fn test_task_log_transcription() {
        let wire = pb::WesTaskLog {
            name: "call-hello".to_string(),
            cmd: vec!["echo".to_string(), "hello".to_string()],
            start_time: "2025-06-01T12:00:00+00:00".to_string(),
            end_time: String::new(),
            stdout: "hello".to_string(),
            stderr: String::new(),
            exit_code: 0,
            system_logs: vec![],
        };
        let log = to_task_log(&wire);
        assert_eq!(log.name.as_deref(), Some("call-hello"));
        assert_eq!(log.cmd.as_deref().map(|c| c.len()), Some(2));
        assert!(log.end_time.is_none());
        assert!(log.stderr.is_none());
        assert_eq!(log.exit_code, Some(0));
        assert!(log.system_logs.is_none());
    }

    #[test]
    fn test_outputs_transcription() {
        let outputs = HashMap::from([
            ("count".to_string(), json_to_proto_value(&json!(3.0))),
            (
                "files".to_string(),
                json_to_proto_value(&json!(["out/a", "out/b"])),
            ),
        ]);
        let converted = to_outputs(&outputs);
        assert_eq!(converted.get("count"), Some(&json!(3.0)));
        assert_eq!(converted.get("files"), Some(&json!(["out/a", "out/b"])));
    }
}
