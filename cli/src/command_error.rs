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

//! Mapping from migration errors to process exit codes.

use std::process::ExitCode;

use copybara_lib::error::MigrationError;

use crate::ui::Ui;

/// Exit codes reported by the binary, mirroring the error taxonomy of the
/// migration core.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitReason {
    ConfigurationError,
    RepositoryError,
    NoOp,
    Interrupted,
}

impl ExitReason {
    fn code(self) -> u8 {
        match self {
            Self::ConfigurationError => 2,
            Self::RepositoryError => 3,
            Self::NoOp => 4,
            Self::Interrupted => 8,
        }
    }
}

#[derive(Debug)]
pub struct CommandError {
    pub reason: ExitReason,
    pub message: String,
}

impl From<MigrationError> for CommandError {
    fn from(err: MigrationError) -> Self {
        let reason = match &err {
            MigrationError::UnresolvableRevision(_) | MigrationError::Validation(_) => {
                ExitReason::ConfigurationError
            }
            MigrationError::Repo { .. } => ExitReason::RepositoryError,
            MigrationError::EmptyChange(_) => ExitReason::NoOp,
            MigrationError::ChangeRejected(_) | MigrationError::Cancelled => {
                ExitReason::Interrupted
            }
        };
        Self {
            reason,
            message: err.to_string(),
        }
    }
}

pub fn handle_command_result(ui: &Ui, result: Result<(), CommandError>) -> ExitCode {
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            use copybara_lib::console::Console as _;
            ui.error(&err.message);
            ExitCode::from(err.reason.code())
        }
    }
}
