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

//! gRPC protocol between Metis and its engine plugins.
//!
//! The message and client definitions live in a checked-in generated module
//! so builds do not depend on `protoc`. [`PluginClient`] wraps the raw tonic
//! client with the deadline policy of the two RPCs.

mod client;
mod values;

#[path = "generated/metis.plugin.v1.rs"]
#[rustfmt::skip]
#[allow(missing_docs)]
pub mod pb;

pub use client::{PluginClient, PluginError, Result};
pub use values::{json_to_proto_value, proto_value_to_json};
