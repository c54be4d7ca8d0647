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

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::Mutex;

use chrono::DateTime;
use chrono::FixedOffset;
use chrono::TimeZone as _;
use copybara_lib::authoring::Author;
use copybara_lib::console::Console;
use copybara_lib::error::MigrationResult;

pub mod test_endpoints;

pub use test_endpoints::FakeOrigin;
pub use test_endpoints::RecordingDestination;
pub use test_endpoints::RecordingTransformation;
pub use test_endpoints::WriteRecord;

/// The author fake origin changes are created with.
pub fn origin_author() -> Author {
    Author::new("Origin Author", "origin@example.com")
}

/// The default author used by test authoring policies.
pub fn default_author() -> Author {
    Author::new("Copybara", "copybara@example.com")
}

/// Deterministic timestamp for the `n`-th change of a fake history.
pub fn change_timestamp(n: usize) -> DateTime<FixedOffset> {
    FixedOffset::east_opt(0)
        .unwrap()
        .with_ymd_and_hms(2025, 1, 1, 0, 0, 0)
        .unwrap()
        + chrono::Duration::seconds(n as i64)
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum MessageKind {
    Info,
    Warn,
    Error,
    Prompt,
}

#[derive(Debug, Default)]
struct ConsoleState {
    messages: Vec<(MessageKind, String)>,
    prompt_answers: VecDeque<bool>,
}

/// Console recording every message; prompts answer from a scripted queue,
/// defaulting to "yes".
#[derive(Clone, Debug, Default)]
pub struct TestConsole {
    state: Arc<Mutex<ConsoleState>>,
}

impl TestConsole {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues the answer for the next unanswered prompt.
    pub fn answer_prompt(&self, answer: bool) {
        self.state.lock().unwrap().prompt_answers.push_back(answer);
    }

    pub fn messages(&self) -> Vec<(MessageKind, String)> {
        self.state.lock().unwrap().messages.clone()
    }

    pub fn messages_of_kind(&self, kind: MessageKind) -> Vec<String> {
        self.state
            .lock()
            .unwrap()
            .messages
            .iter()
            .filter(|(message_kind, _)| *message_kind == kind)
            .map(|(_, message)| message.clone())
            .collect()
    }

    pub fn warnings(&self) -> Vec<String> {
        self.messages_of_kind(MessageKind::Warn)
    }

    pub fn infos(&self) -> Vec<String> {
        self.messages_of_kind(MessageKind::Info)
    }

    pub fn prompts(&self) -> Vec<String> {
        self.messages_of_kind(MessageKind::Prompt)
    }

    #[track_caller]
    pub fn assert_warned(&self, needle: &str) {
        let warnings = self.warnings();
        assert!(
            warnings.iter().any(|warning| warning.contains(needle)),
            "no warning contains {needle:?}: {warnings:?}"
        );
    }

    fn record(&self, kind: MessageKind, message: &str) {
        self.state
            .lock()
            .unwrap()
            .messages
            .push((kind, message.to_owned()));
    }
}

impl Console for TestConsole {
    fn info(&self, message: &str) {
        self.record(MessageKind::Info, message);
    }

    fn warn(&self, message: &str) {
        self.record(MessageKind::Warn, message);
    }

    fn error(&self, message: &str) {
        self.record(MessageKind::Error, message);
    }

    fn prompt_continue(&self, message: &str) -> MigrationResult<bool> {
        let mut state = self.state.lock().unwrap();
        state
            .messages
            .push((MessageKind::Prompt, message.to_owned()));
        Ok(state.prompt_answers.pop_front().unwrap_or(true))
    }
}
