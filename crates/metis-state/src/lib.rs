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

//! Persistent run document storage.
//!
//! [`RunStore`] is the seam between the API server / preparer and the
//! document database. [`InMemoryRunStore`] backs tests; the production
//! MongoDB implementation lives in `metis-state-mongo`.

mod document;
mod error;
mod in_memory;
mod store;

pub use document::{RunDocument, RunPage, WorkflowData};
pub use error::{Result, StateError};
pub use in_memory::InMemoryRunStore;
pub use store::RunStore;
