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

//! SPI for the repository changes are read from.

use std::path::Path;

use crate::change::Change;
use crate::error::MigrationResult;
use crate::graph::ChangeGraph;
use crate::revision::Revision;

/// Why a change enumeration came back empty.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum NoChangesReason {
    /// The range contains no commits at all.
    NoChanges,
    /// Commits exist but none touch the requested files.
    ToFilesExcluded,
    /// `from` is not an ancestor of `to`.
    UnrelatedRevisions,
}

/// Result of enumerating changes between two revisions: a non-empty graph,
/// or a reason there isn't one.
#[derive(Debug)]
pub enum ChangesResponse {
    Changes(ChangeGraph),
    NoChanges(NoChangesReason),
}

impl ChangesResponse {
    /// Wraps a graph, degrading to `NoChanges` when it has no nodes.
    pub fn for_changes(graph: ChangeGraph) -> Self {
        if graph.is_empty() {
            Self::NoChanges(NoChangesReason::NoChanges)
        } else {
            Self::Changes(graph)
        }
    }

    pub fn no_changes(reason: NoChangesReason) -> Self {
        Self::NoChanges(reason)
    }
}

/// Flow control returned by an ancestry visitor.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum VisitResult {
    Continue,
    Terminate,
}

/// Callback invoked for each visited ancestor, newest first.
pub type ChangeVisitor<'a> = dyn FnMut(&Change) -> MigrationResult<VisitResult> + 'a;

/// The repository changes are read from.
///
/// Implementations may hit the network or local caches; every method is a
/// potential suspension point. Origins without history (folder snapshots)
/// implement only [`resolve`](Self::resolve) and
/// [`checkout`](Self::checkout) and report `supports_history() == false`.
pub trait Origin: Send + Sync {
    /// Diagnostic name of this origin type, for error messages.
    fn name(&self) -> &str;

    /// The label under which this origin's revisions are recorded in
    /// destination commit messages (e.g. `GitOrigin-RevId`).
    fn label_name(&self) -> &str;

    /// Resolves a human reference (branch, tag, hash); an empty string means
    /// the origin's default reference. May fetch as a side effect.
    fn resolve(&self, reference: &str) -> MigrationResult<Revision>;

    /// Materializes the tree of `revision` into `work_dir`. The directory
    /// must exist; previous contents are deleted before repopulating.
    fn checkout(&self, revision: &Revision, work_dir: &Path) -> MigrationResult<()>;

    /// Enumerates commits in the half-open range `(from, to]` as a change
    /// graph closed under the returned node set. `None` means all ancestors
    /// of `to`.
    fn changes(
        &self,
        from: Option<&Revision>,
        to: &Revision,
    ) -> MigrationResult<ChangesResponse>;

    /// Fetches exactly one change.
    fn change(&self, revision: &Revision) -> MigrationResult<Change>;

    /// Walks ancestors of `start` in reverse-chronological order, first
    /// parents preferred, visiting each change at most once, until the
    /// visitor terminates the walk or history is exhausted.
    fn visit_changes(
        &self,
        start: &Revision,
        visitor: &mut ChangeVisitor<'_>,
    ) -> MigrationResult<()>;

    /// Whether this origin has history at all. Origins that don't support
    /// only resolve and checkout.
    fn supports_history(&self) -> bool;
}
