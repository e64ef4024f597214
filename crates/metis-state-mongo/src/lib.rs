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

//! MongoDB-backed [`RunStore`] implementation.
//!
//! A single collection holds one document per run. ObjectIds double as the
//! pagination cursor: list queries sort on `_id` ascending and fetch one
//! extra document to decide whether a next page exists.

mod store;

pub use store::{MongoRunStore, MongoRunStoreConfig};
