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

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use chrono::Utc;
use error_stack::report;
use futures::future::{BoxFuture, FutureExt as _};
use metis_core::{RunLog, RunState, TaskLog};
use tokio::sync::RwLock;

use crate::{RunDocument, RunPage, RunStore, StateError};

#[derive(Default)]
struct Inner {
    /// Monotonic counter backing the store-native ids
    next_id: u64,
    /// Documents ordered by store-native id (the pagination cursor)
    runs: BTreeMap<String, RunDocument>,
    /// run_id -> store-native id
    index: HashMap<String, String>,
}

/// In-memory implementation of [`RunStore`].
///
/// Store-native ids are zero-padded hex counters, which gives the same
/// ascending-insertion cursor semantics as ObjectIds without a database.
#[derive(Default)]
pub struct InMemoryRunStore {
    inner: Arc<RwLock<Inner>>,
}

impl InMemoryRunStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn apply<F>(
        &self,
        run_id: &str,
        mutate: F,
    ) -> BoxFuture<'_, error_stack::Result<(), StateError>>
    where
        F: FnOnce(&mut RunDocument) + Send + 'static,
    {
        let run_id = run_id.to_string();
        async move {
            let mut inner = self.inner.write().await;
            let store_id = inner
                .index
                .get(&run_id)
                .cloned()
                .ok_or_else(|| report!(StateError::RunNotFound { run_id: run_id.clone() }))?;
            let document = inner
                .runs
                .get_mut(&store_id)
                .ok_or_else(|| report!(StateError::Internal))?;
            mutate(document);
            document.updated_at = Utc::now();
            Ok(())
        }
        .boxed()
    }
}

fn top_level_log(document: &mut RunDocument) -> &mut TaskLog {
    let run_log = document.workflow.run_log.get_or_insert_with(RunLog::default);
    run_log.run_log.get_or_insert_with(TaskLog::default)
}

impl RunStore for InMemoryRunStore {
    fn insert_run(
        &self,
        document: RunDocument,
    ) -> BoxFuture<'_, error_stack::Result<(), StateError>> {
        async move {
            let mut inner = self.inner.write().await;
            let store_id = format!("{:024x}", inner.next_id);
            inner.next_id += 1;
            inner.index.insert(document.run_id.clone(), store_id.clone());
            inner.runs.insert(store_id, document);
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
            let inner = self.inner.read().await;
            Ok(inner
                .index
                .get(&run_id)
                .and_then(|store_id| inner.runs.get(store_id))
                .cloned())
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
            let inner = self.inner.read().await;
            if let Some(token) = &page_token {
                if token.len() != 24 || !token.chars().all(|c| c.is_ascii_hexdigit()) {
                    return Err(report!(StateError::InvalidPageToken {
                        token: token.clone()
                    }));
                }
            }

            let page_size = page_size.max(1) as usize;
            // One extra document decides whether a next page exists.
            let mut window: Vec<(String, RunDocument)> = match &page_token {
                Some(token) => inner
                    .runs
                    .range::<String, _>((
                        std::ops::Bound::Excluded(token.clone()),
                        std::ops::Bound::Unbounded,
                    ))
                    .take(page_size + 1)
                    .map(|(id, doc)| (id.clone(), doc.clone()))
                    .collect(),
                None => inner
                    .runs
                    .iter()
                    .take(page_size + 1)
                    .map(|(id, doc)| (id.clone(), doc.clone()))
                    .collect(),
            };

            let next_page_token = if window.len() > page_size {
                window.truncate(page_size);
                window.last().map(|(id, _)| id.clone())
            } else {
                None
            };

            Ok(RunPage {
                runs: window.into_iter().map(|(_, doc)| doc).collect(),
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
        self.apply(run_id, move |document| {
            let run_log = document.workflow.run_log.get_or_insert_with(RunLog::default);
            run_log.state = Some(state);
            if state == RunState::Running {
                if let Some(start_time) = start_time {
                    top_level_log(document).start_time = Some(start_time);
                }
            }
        })
    }

    fn update_run_error(
        &self,
        run_id: &str,
        stderr: String,
        system_logs: String,
    ) -> BoxFuture<'_, error_stack::Result<(), StateError>> {
        self.apply(run_id, move |document| {
            let run_log = document.workflow.run_log.get_or_insert_with(RunLog::default);
            run_log.state = Some(RunState::SystemError);
            let log = top_level_log(document);
            log.stderr = Some(stderr);
            log.system_logs = Some(vec![system_logs]);
            log.end_time = Some(Utc::now().to_rfc3339());
        })
    }

    fn replace_run(
        &self,
        document: RunDocument,
    ) -> BoxFuture<'_, error_stack::Result<(), StateError>> {
        async move {
            let mut inner = self.inner.write().await;
            let store_id = inner
                .index
                .get(&document.run_id)
                .cloned()
                .ok_or_else(|| {
                    report!(StateError::RunNotFound {
                        run_id: document.run_id.clone()
                    })
                })?;
            let mut document = document;
            document.updated_at = Utc::now();
            inner.runs.insert(store_id, document);
            Ok(())
        }
        .boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use metis_core::RunRequest;

    fn request(url: &str) -> RunRequest {
        RunRequest {
            workflow_url: url.to_string(),
            workflow_type: "WDL".to_string(),
            workflow_type_version: "1.0".to_string(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_insert_and_get() {
        let store = InMemoryRunStore::new();
        store
            .insert_run(RunDocument::queued("run-1", request("file://a.wdl")))
            .await
            .unwrap();

        let document = store.get_run("run-1").await.unwrap().unwrap();
        assert_eq!(document.state(), RunState::Queued);
        assert!(store.get_run("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_state_update_sets_start_time_on_running_only() {
        let store = InMemoryRunStore::new();
        store
            .insert_run(RunDocument::queued("run-1", request("file://a.wdl")))
            .await
            .unwrap();

        store
            .update_run_state("run-1", RunState::Initializing, Some("ignored".to_string()))
            .await
            .unwrap();
        let document = store.get_run("run-1").await.unwrap().unwrap();
        let log = document.workflow.run_log.as_ref().unwrap();
        assert!(log.run_log.as_ref().unwrap().start_time.is_none());

        let start = Utc::now().to_rfc3339();
        store
            .update_run_state("run-1", RunState::Running, Some(start.clone()))
            .await
            .unwrap();
        let document = store.get_run("run-1").await.unwrap().unwrap();
        let log = document.workflow.run_log.as_ref().unwrap();
        assert_eq!(log.state, Some(RunState::Running));
        assert_eq!(log.run_log.as_ref().unwrap().start_time.as_ref(), Some(&start));
    }

    #[tokio::test]
    async fn test_error_update_is_terminal_with_end_time() {
        let store = InMemoryRunStore::new();
        store
            .insert_run(RunDocument::queued("run-1", request("file://a.wdl")))
            .await
            .unwrap();

        store
            .update_run_error(
                "run-1",
                "no suitable plugin found".to_string(),
                "plugin selection".to_string(),
            )
            .await
            .unwrap();

        let document = store.get_run("run-1").await.unwrap().unwrap();
        assert_eq!(document.state(), RunState::SystemError);
        let log = document.workflow.run_log.unwrap().run_log.unwrap();
        assert_eq!(log.stderr.as_deref(), Some("no suitable plugin found"));
        assert_eq!(
            log.system_logs.as_deref(),
            Some(&["plugin selection".to_string()][..])
        );
        assert!(log.end_time.is_some());
    }

    #[tokio::test]
    async fn test_update_unknown_run_fails() {
        let store = InMemoryRunStore::new();
        let error = store
            .update_run_state("missing", RunState::Running, None)
            .await
            .unwrap_err();
        assert!(matches!(
            error.current_context(),
            StateError::RunNotFound { .. }
        ));
    }

    #[tokio::test]
    async fn test_pagination_windows_are_stable() {
        let store = InMemoryRunStore::new();
        for i in 0..5 {
            store
                .insert_run(RunDocument::queued(
                    &format!("run-{i}"),
                    request("file://a.wdl"),
                ))
                .await
                .unwrap();
        }

        let first = store.list_runs(2, None).await.unwrap();
        assert_eq!(first.runs.len(), 2);
        let token = first.next_page_token.expect("expected a second page");

        let second = store.list_runs(2, Some(&token)).await.unwrap();
        assert_eq!(second.runs.len(), 2);
        let token = second.next_page_token.expect("expected a third page");

        let third = store.list_runs(2, Some(&token)).await.unwrap();
        assert_eq!(third.runs.len(), 1);
        assert!(third.next_page_token.is_none());

        // No duplicates or gaps across the three windows.
        let mut seen: Vec<String> = first
            .runs
            .iter()
            .chain(second.runs.iter())
            .chain(third.runs.iter())
            .map(|doc| doc.run_id.clone())
            .collect();
        seen.sort();
        seen.dedup();
        assert_eq!(seen.len(), 5);
    }

    #[tokio::test]
    async fn test_invalid_page_token_is_rejected() {
        let store = InMemoryRunStore::new();
        let error = store.list_runs(2, Some("not-a-cursor")).await.unwrap_err();
        assert!(matches!(
            error.current_context(),
            StateError::InvalidPageToken { .. }
        ));
    }

    #[tokio::test]
    async fn test_replace_preserves_cursor_position() {
        let store = InMemoryRunStore::new();
        store
            .insert_run(RunDocument::queued("run-1", request("file://a.wdl")))
            .await
            .unwrap();
        store
            .insert_run(RunDocument::queued("run-2", request("file://b.wdl")))
            .await
            .unwrap();

        let mut replacement = RunDocument::queued("run-1", request("file://a.wdl"));
        if let Some(run_log) = replacement.workflow.run_log.as_mut() {
            run_log.state = Some(RunState::Complete);
        }
        store.replace_run(replacement).await.unwrap();

        let page = store.list_runs(10, None).await.unwrap();
        assert_eq!(page.runs.len(), 2);
        assert_eq!(page.runs[0].run_id, "run-1");
        assert_eq!(page.runs[0].state(), RunState::Complete);
    }
}
