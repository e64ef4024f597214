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

use bson::oid::ObjectId;
use bson::{doc, Bson};
use chrono::{DateTime, Utc};
use error_stack::{report, ResultExt as _};
use futures::future::{BoxFuture, FutureExt as _};
use futures::TryStreamExt as _;
use metis_core::RunState;
use metis_state::{RunDocument, RunPage, RunStore, StateError, WorkflowData};
use mongodb::options::{ClientOptions, Credential};
use mongodb::{Client, Collection};
use serde::{Deserialize, Serialize};

/// Connection settings for the workflow collection.
#[derive(Debug, Clone)]
pub struct MongoRunStoreConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub database: String,
    pub collection: String,
}

/// Wire form of a run document, carrying the store-native `_id`.
#[derive(Debug, Serialize, Deserialize)]
struct MongoRunDocument {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    id: Option<ObjectId>,
    run_id: String,
    #[serde(with = "bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    created_at: DateTime<Utc>,
    #[serde(with = "bson::serde_helpers::chrono_datetime_as_bson_datetime")]
    updated_at: DateTime<Utc>,
    workflow: WorkflowData,
}

impl From<RunDocument> for MongoRunDocument {
    fn from(document: RunDocument) -> Self {
        MongoRunDocument {
            id: None,
            run_id: document.run_id,
            created_at: document.created_at,
            updated_at: document.updated_at,
            workflow: document.workflow,
        }
    }
}

impl MongoRunDocument {
    fn into_document(self) -> RunDocument {
        RunDocument {
            run_id: self.run_id,
            created_at: self.created_at,
            updated_at: self.updated_at,
            workflow: self.workflow,
        }
    }
}

/// MongoDB implementation of [`RunStore`].
pub struct MongoRunStore {
    collection: Collection<MongoRunDocument>,
}

impl MongoRunStore {
    /// Connect to the configured deployment.
    ///
    /// Authentication is skipped when the username is empty, matching
    /// local and in-cluster deployments without access control.
    pub async fn connect(config: &MongoRunStoreConfig) -> error_stack::Result<Self, StateError> {
        let uri = format!("mongodb://{}:{}", config.host, config.port);
        let mut options = ClientOptions::parse(&uri)
            .await
            .change_context(StateError::Connection)
            .attach_printable_lazy(|| format!("invalid MongoDB URI {uri}"))?;
        if !config.username.is_empty() {
            options.credential = Some(
                Credential::builder()
                    .username(config.username.clone())
                    .password(config.password.clone())
                    .build(),
            );
        }
        let client = Client::with_options(options).change_context(StateError::Connection)?;
        tracing::debug!(host = %config.host, port = config.port, "connected to MongoDB");
        let collection: Collection<MongoRunDocument> = client
            .database(&config.database)
            .collection(&config.collection);

        // Point reads filter on run_id; keep it indexed. Failures here do
        // not prevent serving.
        let index = mongodb::IndexModel::builder()
            .keys(doc! { "run_id": 1 })
            .build();
        if let Err(error) = collection.create_index(index).await {
            tracing::warn!(%error, "failed to ensure run_id index");
        }

        Ok(MongoRunStore { collection })
    }

    fn state_value(state: RunState) -> Bson {
        Bson::String(state.as_str().to_string())
    }
}

impl RunStore for MongoRunStore {
    fn insert_run(
        &self,
        document: RunDocument,
    ) -> BoxFuture<'_, error_stack::Result<(), StateError>> {
        async move {
            self.collection
                .insert_one(MongoRunDocument::from(document))
                .await
                .change_context(StateError::Internal)
                .attach_printable("failed to insert run document")?;
            Ok(())
        }
        .boxed()
    }

    fn get_run(
        &self,
        run_id: &str,
    ) -> BoxFuture<'_, error_stack::Result<Option<RunDocument>, StateError>> {
        let run_id = run_id.to_string();
        async move {
            let found = self
                .collection
                .find_one(doc! { "run_id": &run_id })
                .await
                .change_context(StateError::Internal)
                .attach_printable_lazy(|| format!("failed to fetch run {run_id}"))?;
            Ok(found.map(MongoRunDocument::into_document))
        }
        .boxed()
    }

    fn list_runs(
        &self,
        page_size: i64,
        page_token: Option<&str>,
    ) -> BoxFuture<'_, error_stack::Result<RunPage, StateError>> {
        let page_token = page_token.map(str::to_string);
        async move {
            let filter = match &page_token {
                Some(token) => {
                    let cursor_id = ObjectId::parse_str(token).map_err(|_| {
                        report!(StateError::InvalidPageToken {
                            token: token.clone()
                        })
                    })?;
                    doc! { "_id": { "$gt": cursor_id } }
                }
                None => doc! {},
            };

            let page_size = page_size.max(1);
            // One extra document decides whether a next page exists.
            let mut window: Vec<MongoRunDocument> = self
                .collection
                .find(filter)
                .sort(doc! { "_id": 1 })
                .limit(page_size + 1)
                .await
                .change_context(StateError::Internal)
                .attach_printable("failed to query run documents")?
                .try_collect()
                .await
                .change_context(StateError::Internal)
                .attach_printable("failed to decode run documents")?;

            let next_page_token = if window.len() as i64 > page_size {
                window.truncate(page_size as usize);
                window.last().and_then(|doc| doc.id).map(|id| id.to_hex())
            } else {
                None
            };

            Ok(RunPage {
                runs: window
                    .into_iter()
                    .map(MongoRunDocument::into_document)
                    .collect(),
                next_page_token,
            })
        }
        .boxed()
    }

    fn update_run_state(
        &self,
        run_id: &str,
        state: RunState,
        start_time: Option<String>,
    ) -> BoxFuture<'_, error_stack::Result<(), StateError>> {
        let run_id = run_id.to_string();
        async move {
            let mut fields = doc! {
                "workflow.run_log.state": Self::state_value(state),
                "updated_at": bson::DateTime::now(),
            };
            if state == RunState::Running {
                if let Some(start_time) = start_time {
                    fields.insert("workflow.run_log.run_log.start_time", start_time);
                }
            }

            let result = self
                .collection
                .update_one(doc! { "run_id": &run_id }, doc! { "$set": fields })
                .await
                .change_context(StateError::Internal)
                .attach_printable_lazy(|| format!("failed to update state of run {run_id}"))?;
            if result.matched_count == 0 {
                return Err(report!(StateError::RunNotFound { run_id }));
            }
            Ok(())
        }
        .boxed()
    }

    fn update_run_error(
        &self,
        run_id: &str,
        stderr: String,
        system_logs: String,
    ) -> BoxFuture<'_, error_stack::Result<(), StateError>> {
        let run_id = run_id.to_string();
        async move {
            let update = doc! {
                "$set": {
                    "workflow.run_log.state": Self::state_value(RunState::SystemError),
                    "workflow.run_log.run_log.stderr": stderr,
                    "workflow.run_log.run_log.system_logs": [system_logs],
                    "workflow.run_log.run_log.end_time": Utc::now().to_rfc3339(),
                    "updated_at": bson::DateTime::now(),
                }
            };

            let result = self
                .collection
                .update_one(doc! { "run_id": &run_id }, update)
                .await
                .change_context(StateError::Internal)
                .attach_printable_lazy(|| format!("failed to record error for run {run_id}"))?;
            if result.matched_count == 0 {
                return Err(report!(StateError::RunNotFound { run_id }));
            }
            Ok(())
        }
        .boxed()
    }

    fn replace_run(
        &self,
        document: RunDocument,
    ) -> BoxFuture<'_, error_stack::Result<(), StateError>> {
        async move {
            let run_id = document.run_id.clone();
            let mut replacement = MongoRunDocument::from(document);
            replacement.updated_at = Utc::now();
            let result = self
                .collection
                .replace_one(doc! { "run_id": &run_id }, replacement)
                .await
                .change_context(StateError::Internal)
                .attach_printable_lazy(|| format!("failed to replace run {run_id}"))?;
            if result.matched_count == 0 {
                return Err(report!(StateError::RunNotFound { run_id }));
            }
            Ok(())
        }
        .boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use metis_core::RunRequest;

    #[test]
    fn test_wire_document_round_trip() {
        let document = RunDocument::queued(
            "run-1",
            RunRequest {
                workflow_url: "file://hello.wdl".to_string(),
                workflow_type: "WDL".to_string(),
                workflow_type_version: "1.0".to_string(),
                ..Default::default()
            },
        );
        let wire = MongoRunDocument::from(document.clone());
        assert!(wire.id.is_none());

        let bson_doc = bson::to_document(&wire).unwrap();
        assert!(!bson_doc.contains_key("_id"));
        assert_eq!(bson_doc.get_str("run_id").unwrap(), "run-1");
        // Timestamps must land as native BSON datetimes for `_id`-adjacent sorting tools.
        assert!(matches!(bson_doc.get("created_at"), Some(Bson::DateTime(_))));

        let decoded: MongoRunDocument = bson::from_document(bson_doc).unwrap();
        assert_eq!(decoded.into_document().workflow, document.workflow);
    }

    #[test]
    fn test_state_is_stored_as_wes_string() {
        assert_eq!(
            MongoRunStore::state_value(RunState::ExecutorError),
            Bson::String("EXECUTOR_ERROR".to_string())
        );
    }
}
