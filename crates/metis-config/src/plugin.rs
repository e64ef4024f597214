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

use std::path::{Path, PathBuf};

use error_stack::ResultExt as _;
use serde::{Deserialize, Serialize};

use crate::env::Env;
use crate::{ConfigError, Result};

/// A static registry entry pairing an engine plugin with the workflow
/// type and engine version it can translate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PluginBinding {
    pub workflow_type: String,
    pub workflow_type_version: String,
    pub workflow_engine_version: String,
    pub plugin_url: String,
}

#[derive(Debug, Default, Deserialize)]
struct PluginsFile {
    #[serde(default)]
    plugins: Vec<PluginBinding>,
}

/// The plugin registry, loaded once at process start.
///
/// The file lives at `~/.metis/plugins.yaml`; `METIS_PLUGINS_PATH`
/// overrides the location. A missing file yields an empty registry, in
/// which case every submission fails plugin selection.
#[derive(Debug, Clone, Default)]
pub struct PluginRegistry {
    bindings: Vec<PluginBinding>,
}

impl PluginRegistry {
    pub(crate) fn load(env: &Env) -> Result<Self> {
        let path = match env.get("PLUGINS_PATH") {
            Some(path) => PathBuf::from(path),
            None => match std::env::var_os("HOME") {
                Some(home) => Path::new(&home).join(".metis").join("plugins.yaml"),
                None => return Ok(PluginRegistry::default()),
            },
        };
        if !path.exists() {
            return Ok(PluginRegistry::default());
        }
        Self::load_from_file(&path)
    }

    pub fn load_from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .change_context_lazy(|| ConfigError::PluginRegistry(path.display().to_string()))?;
        let file: PluginsFile = serde_yaml_ng::from_str(&contents)
            .change_context_lazy(|| ConfigError::PluginRegistry(path.display().to_string()))?;
        Ok(PluginRegistry {
            bindings: file.plugins,
        })
    }

    pub fn from_bindings(bindings: Vec<PluginBinding>) -> Self {
        PluginRegistry { bindings }
    }

    pub fn bindings(&self) -> &[PluginBinding] {
        &self.bindings
    }

    /// Linear scan for the first binding matching the request. First match
    /// wins; duplicate bindings are not diagnosed.
    pub fn find(
        &self,
        workflow_type: &str,
        workflow_engine_version: &str,
    ) -> Option<&PluginBinding> {
        self.bindings.iter().find(|binding| {
            binding.workflow_type == workflow_type
                && binding.workflow_engine_version == workflow_engine_version
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write as _;

    const REGISTRY: &str = "\
plugins:
  - workflow_type: WDL
    workflow_type_version: \"1.0\"
    workflow_engine_version: \"1.0\"
    plugin_url: http://wdl-plugin:50051
  - workflow_type: CWL
    workflow_type_version: v1.2
    workflow_engine_version: \"3.1\"
    plugin_url: http://cwl-plugin:50051
";

    #[test]
    fn test_load_and_find() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(REGISTRY.as_bytes()).unwrap();

        let registry = PluginRegistry::load_from_file(file.path()).unwrap();
        assert_eq!(registry.bindings().len(), 2);

        let binding = registry.find("WDL", "1.0").expect("WDL binding");
        assert_eq!(binding.plugin_url, "http://wdl-plugin:50051");
        assert!(registry.find("WDL", "2.0").is_none());
        assert!(registry.find("NFL", "1.0").is_none());
    }

    #[test]
    fn test_first_match_wins() {
        let registry = PluginRegistry::from_bindings(vec![
            PluginBinding {
                workflow_type: "WDL".to_string(),
                workflow_type_version: "1.0".to_string(),
                workflow_engine_version: "1.0".to_string(),
                plugin_url: "http://first:50051".to_string(),
            },
            PluginBinding {
                workflow_type: "WDL".to_string(),
                workflow_type_version: "1.0".to_string(),
                workflow_engine_version: "1.0".to_string(),
                plugin_url: "http://second:50051".to_string(),
            },
        ]);
        assert_eq!(
            registry.find("WDL", "1.0").unwrap().plugin_url,
            "http://first:50051"
        );
    }

    #[test]
    fn test_empty_document() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"plugins: []\n").unwrap();
        let registry = PluginRegistry::load_from_file(file.path()).unwrap();
        assert!(registry.bindings().is_empty());
    }
}
