// Copyright 2025 The Copybara Authors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
// https://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

#![warn(missing_docs)]

//! Library for Copybara - a tool for transforming and moving code between
//! repositories.
//!
//! The crate hosts the workflow execution engine: the migration strategies
//! (squash, iterative, change request), the origin-side history traversal
//! and change-graph construction feeding them, and the SPIs concrete VCS
//! endpoints plug into.

pub mod authoring;
pub mod cancel;
pub mod change;
pub mod console;
pub mod destination;
pub mod error;
pub mod file_util;
pub mod folder;
pub mod glob;
pub mod graph;
pub mod origin;
pub mod revision;
pub mod run_helper;
pub mod transform;
pub mod workflow;
