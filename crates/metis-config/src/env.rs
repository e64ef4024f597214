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
use std::str::FromStr;

use error_stack::report;

use crate::{ConfigError, Result};

/// Snapshot of the process environment, keyed without the `METIS_` prefix.
pub(crate) struct Env {
    vars: HashMap<String, String>,
}

const PREFIX: &str = "METIS_";

impl Env {
    pub(crate) fn new(vars: &[(String, String)]) -> Self {
        let vars = vars
            .iter()
            .filter_map(|(key, value)| {
                key.strip_prefix(PREFIX)
                    .map(|stripped| (stripped.to_string(), value.clone()))
            })
            .collect();
        Env { vars }
    }

    pub(crate) fn get(&self, key: &str) -> Option<&str> {
        self.vars.get(key).map(String::as_str)
    }

    pub(crate) fn string(&self, key: &str, default: &str) -> String {
        self.get(key).unwrap_or(default).to_string()
    }

    pub(crate) fn parse<T: FromStr>(&self, key: &str, default: T) -> Result<T> {
        match self.get(key) {
            None => Ok(default),
            Some(raw) => raw.parse().map_err(|_| {
                report!(ConfigError::InvalidValue {
                    key: format!("{PREFIX}{key}"),
                    value: raw.to_string(),
                })
            }),
        }
    }

    /// All variables under `key_prefix`, with the prefix stripped.
    pub(crate) fn collect_prefixed(&self, key_prefix: &str) -> HashMap<String, String> {
        self.vars
            .iter()
            .filter_map(|(key, value)| {
                key.strip_prefix(key_prefix)
                    .map(|stripped| (stripped.to_string(), value.clone()))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prefix_stripping_and_parse() {
        let env = Env::new(&[
            ("METIS_MONGO_PORT".to_string(), "27018".to_string()),
            ("UNRELATED".to_string(), "x".to_string()),
        ]);
        assert_eq!(env.get("MONGO_PORT"), Some("27018"));
        assert_eq!(env.get("UNRELATED"), None);
        assert_eq!(env.parse("MONGO_PORT", 1u16).unwrap(), 27018);
        assert_eq!(env.parse("MISSING", 42u16).unwrap(), 42);
    }

    #[test]
    fn test_collect_prefixed() {
        let env = Env::new(&[
            (
                "METIS_STAGING_PARAMETERS_AWS_REGION".to_string(),
                "us-east-1".to_string(),
            ),
            ("METIS_STAGING_BUCKET".to_string(), "b".to_string()),
        ]);
        let params = env.collect_prefixed("STAGING_PARAMETERS_");
        assert_eq!(params.len(), 1);
        assert_eq!(params.get("AWS_REGION").map(String::as_str), Some("us-east-1"));
    }
}
