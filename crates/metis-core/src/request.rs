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

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Immutable snapshot of a WES run submission.
///
/// Captured from the multipart form when a run is accepted and replayed
/// verbatim to the preparer via its command line.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct RunRequest {
    /// URL of the workflow to run (`http(s)://`, `file://` or `trs://`)
    pub workflow_url: String,
    /// Workflow language, e.g. `WDL`, `CWL`, `NFL`
    pub workflow_type: String,
    /// Version of the workflow language
    pub workflow_type_version: String,
    /// Engine requested to run the workflow
    #[serde(skip_serializing_if = "Option::is_none")]
    pub workflow_engine: Option<String>,
    /// Version of the requested engine
    #[serde(skip_serializing_if = "Option::is_none")]
    pub workflow_engine_version: Option<String>,
    /// Free-form workflow parameters
    #[serde(skip_serializing_if = "Option::is_none")]
    pub workflow_params: Option<HashMap<String, serde_json::Value>>,
    /// Engine-level parameters
    #[serde(skip_serializing_if = "Option::is_none")]
    pub workflow_engine_parameters: Option<HashMap<String, String>>,
    /// Client-supplied tags
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<HashMap<String, String>>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_optional_fields_omitted() {
        let request = RunRequest {
            workflow_url: "file://hello.wdl".to_string(),
            workflow_type: "WDL".to_string(),
            workflow_type_version: "1.0".to_string(),
            ..Default::default()
        };
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(
            value,
            json!({
                "workflow_url": "file://hello.wdl",
                "workflow_type": "WDL",
                "workflow_type_version": "1.0",
            })
        );
    }

    #[test]
    fn test_round_trip_with_params() {
        let mut params = HashMap::new();
        params.insert("threads".to_string(), json!(4));
        let request = RunRequest {
            workflow_url: "https://example.org/wf.cwl".to_string(),
            workflow_type: "CWL".to_string(),
            workflow_type_version: "v1.2".to_string(),
            workflow_engine: Some("cwltool".to_string()),
            workflow_engine_version: Some("3.1".to_string()),
            workflow_params: Some(params),
            ..Default::default()
        };
        let text = serde_json::to_string(&request).unwrap();
        let parsed: RunRequest = serde_json::from_str(&text).unwrap();
        assert_eq!(parsed, request);
    }
}
