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

//! The WES REST surface of Metis.
//!
//! Submission handlers provision cluster resources and hand the run to a
//! preparer job; every other endpoint is a pure query against the run
//! document store.

mod api;
mod error;
mod startup;
mod state;

pub use error::{ErrorResponse, ServerError};
pub use startup::{start_server, AppConfig};
pub use state::AppState;
