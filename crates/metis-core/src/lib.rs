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

//! Core domain types shared across the Metis crates.
//!
//! This crate defines the WES-facing data model (run states, run requests,
//! run logs) and the executor job outcome model. It carries no I/O.

mod outcome;
mod request;
mod run_log;
mod state;

pub use outcome::{JobOutcome, JobResult};
pub use request::RunRequest;
pub use run_log::{RunLog, TaskLog};
pub use state::RunState;
