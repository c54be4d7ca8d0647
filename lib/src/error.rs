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

//! Error taxonomy shared by the migration core.

use thiserror::Error;

/// Error that may occur while running a migration workflow.
///
/// The variants are kinds, not sources: callers dispatch on the kind to
/// decide whether the failure is terminal, retryable, or demotable to a
/// warning under `--force`.
#[derive(Debug, Error)]
pub enum MigrationError {
    /// A reference could not be resolved in the origin or destination.
    #[error("Cannot resolve revision: {0}")]
    UnresolvableRevision(String),
    /// The computation produced no change to write.
    #[error("{0}")]
    EmptyChange(String),
    /// The user declined an interactive prompt.
    #[error("{0}")]
    ChangeRejected(String),
    /// Configuration or repository state prohibits the operation.
    #[error("{0}")]
    Validation(String),
    /// External VCS, network, or I/O failure.
    #[error("{message}")]
    Repo {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
    /// Cooperative cancellation was observed at a suspension point.
    #[error("Operation cancelled")]
    Cancelled,
}

impl MigrationError {
    pub fn repo(message: impl Into<String>) -> Self {
        Self::Repo {
            message: message.into(),
            source: None,
        }
    }

    pub fn repo_with_source(
        message: impl Into<String>,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        Self::Repo {
            message: message.into(),
            source: Some(source.into()),
        }
    }
}

impl From<std::io::Error> for MigrationError {
    fn from(err: std::io::Error) -> Self {
        Self::repo_with_source("I/O error", err)
    }
}

pub type MigrationResult<T> = Result<T, MigrationError>;
