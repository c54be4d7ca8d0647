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

//! SPI for the repository changes are written to.

use std::path::Path;

use crate::change::ComputedChanges;
use crate::change::Metadata;
use crate::error::MigrationResult;
use crate::revision::Revision;

/// Outcome of a destination write.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum WriterResult {
    Ok,
    /// The destination wants the user to confirm before the next commit,
    /// e.g. the first commit of a long run just opened a review.
    PromptToContinue,
}

/// Everything the destination needs to produce one commit or review.
#[derive(Debug)]
pub struct WriteRequest<'a> {
    /// Root of the transformed tree to commit.
    pub tree: &'a Path,
    /// Message and author to stamp on the produced commit.
    pub metadata: &'a Metadata,
    /// The origin revision this tree was produced from, to be recorded under
    /// [`Destination::label_name_when_origin`].
    pub current_rev: &'a Revision,
    /// Context for downstream transforms; ordering per the workflow
    /// contract.
    pub changes: &'a ComputedChanges,
    /// The destination-side parent to diff against for review-style imports;
    /// set only by change-request workflows.
    pub baseline: Option<&'a str>,
    /// Opaque per-run fingerprint correlating retries and multi-commit
    /// sequences.
    pub workflow_identity: &'a str,
}

/// The repository changes are written to.
///
/// The run helper exclusively owns the writer session for the duration of a
/// run; implementations may buffer state across writes of the same run.
pub trait Destination: Send + Sync {
    /// Diagnostic name of this destination type, for error messages.
    fn name(&self) -> &str;

    /// The label under which this destination, when read as an origin by
    /// another migration, records the upstream revision. Change-request
    /// baseline discovery searches origin history for this label.
    fn label_name_when_origin(&self) -> String;

    /// Whether the destination can report the last imported origin revision.
    fn supports_previous_ref(&self) -> bool;

    /// The value of `label` on the newest relevant destination commit, or
    /// `None` if the destination has no record of an import.
    fn last_imported(&self, label: &str) -> MigrationResult<Option<Revision>>;

    /// Writes one commit or review.
    fn write(&self, request: &WriteRequest<'_>) -> MigrationResult<WriterResult>;

    /// Compares the destination's current tree with `tree`. `None` when the
    /// destination cannot cheaply answer; used only for the optional
    /// last-revision consistency check.
    fn matches_tree(&self, _tree: &Path) -> MigrationResult<Option<bool>> {
        Ok(None)
    }
}
