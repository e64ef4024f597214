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

use futures::future::BoxFuture;
use metis_core::RunState;

use crate::{RunDocument, RunPage, StateError};

/// Trait for storing and retrieving run documents.
///
/// Implementations must treat `run_id` as a unique key: a run id never
/// names more than one document. Ordering of list queries follows the
/// store-native id, ascending.
pub trait RunStore: Send + Sync {
    /// Insert a new run document.
    fn insert_run(
        &self,
        document: RunDocument,
    ) -> BoxFuture<'_, error_stack::Result<(), StateError>>;

    /// Fetch a run document by run id.
    fn get_run(
        &self,
        run_id: &str,
    ) -> BoxFuture<'_, error_stack::Result<Option<RunDocument>, StateError>>;

    /// List runs with cursor-based pagination.
    ///
    /// Fetches `page_size` documents ordered by the store-native id,
    /// starting strictly after the document the token names. The returned
    /// token is opaque; echoing it back yields the next stable window.
    fn list_runs(
        &self,
        page_size: i64,
        page_token: Option<&str>,
    ) -> BoxFuture<'_, error_stack::Result<RunPage, StateError>>;

    /// Update the state of a run.
    ///
    /// `start_time` is written only when transitioning to `RUNNING`.
    fn update_run_state(
        &self,
        run_id: &str,
        state: RunState,
        start_time: Option<String>,
    ) -> BoxFuture<'_, error_stack::Result<(), StateError>>;

    /// Record a system failure: state `SYSTEM_ERROR`, stderr and system
    /// logs on the top-level log, end time now.
    fn update_run_error(
        &self,
        run_id: &str,
        stderr: String,
        system_logs: String,
    ) -> BoxFuture<'_, error_stack::Result<(), StateError>>;

    /// Overwrite a run document with its final composed form.
    fn replace_run(
        &self,
        document: RunDocument,
    ) -> BoxFuture<'_, error_stack::Result<(), StateError>>;
}
