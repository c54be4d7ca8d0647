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

//! One commit's worth of metadata: author, message, labels, and the set of
//! files it touches.

use std::fmt;
use std::fmt::Debug;

use chrono::DateTime;
use chrono::FixedOffset;
use indexmap::IndexMap;

use crate::authoring::Author;
use crate::revision::Revision;

/// Insertion-ordered mapping of label name to values. A label may carry
/// multiple values; values preserve the order they were recorded in.
pub type Labels = IndexMap<String, Vec<String>>;

/// Parses `Key: Value` labels out of a commit message.
///
/// Labels may appear anywhere in the message, one per line. Keys are
/// restricted to word characters and dashes so prose containing colons is
/// not misread as a label.
pub fn parse_message_labels(message: &str) -> Labels {
    let label_re = regex::Regex::new(r"^([A-Za-z][A-Za-z0-9_-]*) *: *(.*)$")
        .expect("label regex should be valid");
    let mut labels = Labels::new();
    for line in message.lines() {
        if let Some(groups) = label_re.captures(line) {
            labels
                .entry(groups[1].to_owned())
                .or_default()
                .push(groups[2].trim_ascii_end().to_owned());
        }
    }
    labels
}

/// An immutable record of a single origin change.
#[derive(PartialEq, Eq, Clone)]
pub struct Change {
    revision: Revision,
    author: Author,
    message: String,
    timestamp: DateTime<FixedOffset>,
    labels: Labels,
    files: Vec<String>,
    /// Parent revisions in VCS order; the first parent is semantically
    /// special for merge commits.
    parents: Vec<Revision>,
}

impl Change {
    pub fn new(
        revision: Revision,
        author: Author,
        message: impl Into<String>,
        timestamp: DateTime<FixedOffset>,
    ) -> Self {
        let message = message.into();
        let labels = parse_message_labels(&message);
        Self {
            revision,
            author,
            message,
            timestamp,
            labels,
            files: vec![],
            parents: vec![],
        }
    }

    pub fn with_labels(mut self, labels: Labels) -> Self {
        self.labels = labels;
        self
    }

    pub fn with_files(mut self, files: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.files = files.into_iter().map(|file| file.into()).collect();
        self
    }

    pub fn with_parents(mut self, parents: impl IntoIterator<Item = Revision>) -> Self {
        self.parents = parents.into_iter().collect();
        self
    }

    pub fn revision(&self) -> &Revision {
        &self.revision
    }

    pub fn author(&self) -> &Author {
        &self.author
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// The first line of the message, for one-line progress output.
    pub fn first_line(&self) -> &str {
        self.message.lines().next().unwrap_or("")
    }

    pub fn timestamp(&self) -> &DateTime<FixedOffset> {
        &self.timestamp
    }

    pub fn labels(&self) -> &Labels {
        &self.labels
    }

    /// All values recorded for `name`, oldest first. Empty if the label is
    /// absent.
    pub fn label_values(&self, name: &str) -> &[String] {
        match self.labels.get(name) {
            Some(values) => values,
            None => &[],
        }
    }

    /// Repo-relative slash-separated paths touched by this change.
    pub fn files(&self) -> &[String] {
        &self.files
    }

    pub fn parents(&self) -> &[Revision] {
        &self.parents
    }
}

impl Debug for Change {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> Result<(), fmt::Error> {
        f.debug_struct("Change")
            .field("revision", &self.revision)
            .field("message", &self.first_line())
            .finish()
    }
}

/// The message and author the destination writer should stamp on the
/// produced commit.
#[derive(Debug, PartialEq, Eq, Clone, serde::Serialize)]
pub struct Metadata {
    message: String,
    author: Author,
}

impl Metadata {
    pub fn new(message: impl Into<String>, author: Author) -> Self {
        Self {
            message: message.into(),
            author,
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn author(&self) -> &Author {
        &self.author
    }

    pub fn set_message(&mut self, message: impl Into<String>) {
        self.message = message.into();
    }

    pub fn set_author(&mut self, author: Author) {
        self.author = author;
    }
}

/// The changes involved in a single destination write, so downstream
/// transforms can see context.
///
/// `current` is the changes being written now; `already_migrated` is earlier
/// changes written in the same run, most recent first. Intermediate filtering
/// must not reorder either list.
#[derive(Debug, Default, PartialEq, Eq, Clone)]
pub struct ComputedChanges {
    current: Vec<Change>,
    already_migrated: Vec<Change>,
}

impl ComputedChanges {
    pub fn new(current: Vec<Change>, already_migrated: Vec<Change>) -> Self {
        Self {
            current,
            already_migrated,
        }
    }

    pub fn current(&self) -> &[Change] {
        &self.current
    }

    pub fn already_migrated(&self) -> &[Change] {
        &self.already_migrated
    }
}
