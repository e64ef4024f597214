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

use std::collections::BTreeMap;

use error_stack::ResultExt as _;
use k8s_openapi::api::core::v1::ConfigMap;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use k8s_openapi::ByteString;
use kube::api::PostParams;
use kube::Api;
use metis_config::KubernetesConfig;

use crate::{KubeError, Result};

/// A workflow attachment posted alongside the WES request.
#[derive(Debug, Clone)]
pub struct Attachment {
    pub filename: String,
    pub bytes: Vec<u8>,
}

pub(crate) fn build_attachment_config_map(
    namespace: &str,
    run_id: &str,
    index: usize,
    attachment: &Attachment,
) -> ConfigMap {
    let mut labels = crate::run_labels(run_id, "attachment");
    labels.insert(
        "metis/attachment".to_string(),
        attachment.filename.clone(),
    );
    ConfigMap {
        metadata: ObjectMeta {
            name: Some(format!("attachment-{run_id}-{index}")),
            namespace: Some(namespace.to_string()),
            labels: Some(labels),
            ..Default::default()
        },
        binary_data: Some(BTreeMap::from([(
            attachment.filename.clone(),
            ByteString(attachment.bytes.clone()),
        )])),
        ..Default::default()
    }
}

/// Create one config map per attachment, each carrying the file as binary
/// data keyed by its filename. Returns the created config map names.
pub async fn create_attachment_config_maps(
    client: &kube::Client,
    config: &KubernetesConfig,
    run_id: &str,
    attachments: &[Attachment],
) -> Result<Vec<String>> {
    let api: Api<ConfigMap> = Api::namespaced(client.clone(), &config.namespace);
    let mut names = Vec::with_capacity(attachments.len());
    for (index, attachment) in attachments.iter().enumerate() {
        let config_map = build_attachment_config_map(&config.namespace, run_id, index, attachment);
        let name = config_map
            .metadata
            .name
            .clone()
            .unwrap_or_default();
        api.create(&PostParams::default(), &config_map)
            .await
            .change_context_lazy(|| {
                KubeError::CreateResource(format!(
                    "configmap for attachment {}",
                    attachment.filename
                ))
            })?;
        names.push(name);
    }
    Ok(names)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attachment_config_map_shape() {
        let attachment = Attachment {
            filename: "hello.wdl".to_string(),
            bytes: b"workflow hello {}".to_vec(),
        };
        let config_map = build_attachment_config_map("metis", "run-1", 0, &attachment);

        assert_eq!(
            config_map.metadata.name.as_deref(),
            Some("attachment-run-1-0")
        );
        let labels = config_map.metadata.labels.unwrap();
        assert_eq!(
            labels.get("metis/attachment").map(String::as_str),
            Some("hello.wdl")
        );
        let data = config_map.binary_data.unwrap();
        assert_eq!(
            data.get("hello.wdl"),
            Some(&ByteString(b"workflow hello {}".to_vec()))
        );
    }
}
