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

#![allow(missing_docs)]

//! Diagnostic sink injected into the workflow engine.
//!
//! The core never writes to a global logger; every user-facing message goes
//! through a [`Console`] owned by the run. Structured `tracing` events are
//! emitted alongside for log capture.

use crate::error::MigrationResult;

/// Where workflow progress, warnings, and prompts go.
pub trait Console: Send + Sync {
    fn info(&self, message: &str);

    fn warn(&self, message: &str);

    fn error(&self, message: &str);

    /// Asks the user whether to keep going. Prompting may block on input;
    /// non-interactive consoles answer with a fixed default.
    fn prompt_continue(&self, message: &str) -> MigrationResult<bool>;
}

/// Wraps another console, prefixing every message. Used to tag per-change
/// output in multi-commit runs.
pub struct PrefixedConsole<'a> {
    inner: &'a dyn Console,
    prefix: String,
}

impl<'a> PrefixedConsole<'a> {
    pub fn new(inner: &'a dyn Console, prefix: impl Into<String>) -> Self {
        Self {
            inner,
            prefix: prefix.into(),
        }
    }

    fn format(&self, message: &str) -> String {
        format!("[{}] {}", self.prefix, message)
    }
}

impl Console for PrefixedConsole<'_> {
    fn info(&self, message: &str) {
        self.inner.info(&self.format(message));
    }

    fn warn(&self, message: &str) {
        self.inner.warn(&self.format(message));
    }

    fn error(&self, message: &str) {
        self.inner.error(&self.format(message));
    }

    fn prompt_continue(&self, message: &str) -> MigrationResult<bool> {
        self.inner.prompt_continue(&self.format(message))
    }
}
