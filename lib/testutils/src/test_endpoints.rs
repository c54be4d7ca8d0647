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

//! In-memory origin and destination fakes for workflow tests.

use std::collections::HashMap;
use std::collections::HashSet;
use std::collections::VecDeque;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::sync::Mutex;

use copybara_lib::authoring::Author;
use copybara_lib::change::Change;
use copybara_lib::change::Metadata;
use copybara_lib::destination::Destination;
use copybara_lib::destination::WriteRequest;
use copybara_lib::destination::WriterResult;
use copybara_lib::error::MigrationError;
use copybara_lib::error::MigrationResult;
use copybara_lib::file_util;
use copybara_lib::graph::ChangeGraphBuilder;
use copybara_lib::origin::ChangeVisitor;
use copybara_lib::origin::ChangesResponse;
use copybara_lib::origin::NoChangesReason;
use copybara_lib::origin::Origin;
use copybara_lib::origin::VisitResult;
use copybara_lib::revision::Revision;
use copybara_lib::transform::TransformContext;
use copybara_lib::transform::Transformation;

use crate::change_timestamp;
use crate::origin_author;

/// In-memory origin with a scriptable history DAG.
///
/// Changes are added oldest first; each change without explicit parents is
/// chained onto the previous tip, so `add_change` calls build a linear
/// history. The tree at a revision contains one file per path touched by its
/// ancestry, with the content naming the newest touching change.
#[derive(Debug, Default)]
pub struct FakeOrigin {
    changes: Vec<Change>,
    index: HashMap<Revision, usize>,
    references: HashMap<String, Revision>,
}

impl FakeOrigin {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a change on top of the current tip.
    pub fn add_change(&mut self, rev: &str, message: &str, files: &[&str]) -> Revision {
        let parents: Vec<Revision> = self.tip().into_iter().cloned().collect();
        self.insert(rev, origin_author(), message, files, parents)
    }

    pub fn add_change_with_author(
        &mut self,
        rev: &str,
        author: Author,
        message: &str,
        files: &[&str],
    ) -> Revision {
        let parents: Vec<Revision> = self.tip().into_iter().cloned().collect();
        self.insert(rev, author, message, files, parents)
    }

    /// Adds a change with explicit parents, for branchy histories.
    pub fn add_change_with_parents(
        &mut self,
        rev: &str,
        message: &str,
        files: &[&str],
        parents: &[&str],
    ) -> Revision {
        let parents = parents.iter().map(|&parent| Revision::new(parent)).collect();
        self.insert(rev, origin_author(), message, files, parents)
    }

    /// Makes `name` resolvable to `rev`, like a branch or tag.
    pub fn set_reference(&mut self, name: &str, rev: &str) {
        self.references
            .insert(name.to_owned(), Revision::new(rev));
    }

    pub fn tip(&self) -> Option<&Revision> {
        self.changes.last().map(|change| change.revision())
    }

    fn insert(
        &mut self,
        rev: &str,
        author: Author,
        message: &str,
        files: &[&str],
        parents: Vec<Revision>,
    ) -> Revision {
        let revision = Revision::new(rev);
        let change = Change::new(
            revision.clone(),
            author,
            message,
            change_timestamp(self.changes.len()),
        )
        .with_files(files.iter().copied())
        .with_parents(parents);
        self.index.insert(revision.clone(), self.changes.len());
        self.changes.push(change);
        revision
    }

    fn get(&self, revision: &Revision) -> Option<&Change> {
        self.index.get(revision).map(|&ix| &self.changes[ix])
    }

    /// Revisions reachable from `start`, including `start` itself.
    fn reachable(&self, start: &Revision) -> HashSet<Revision> {
        let mut visited = HashSet::new();
        let mut pending = vec![start.clone()];
        while let Some(revision) = pending.pop() {
            let Some(change) = self.get(&revision) else {
                continue;
            };
            if visited.insert(revision) {
                pending.extend(change.parents().iter().cloned());
            }
        }
        visited
    }
}

impl Origin for FakeOrigin {
    fn name(&self) -> &str {
        "fake.origin"
    }

    fn label_name(&self) -> &str {
        "FakeOrigin-RevId"
    }

    fn resolve(&self, reference: &str) -> MigrationResult<Revision> {
        if reference.is_empty() {
            return self.tip().cloned().ok_or_else(|| {
                MigrationError::UnresolvableRevision("origin has no changes".to_owned())
            });
        }
        if let Some(revision) = self.references.get(reference) {
            return Ok(revision.clone());
        }
        let revision = Revision::new(reference);
        if self.index.contains_key(&revision) {
            Ok(revision)
        } else {
            Err(MigrationError::UnresolvableRevision(format!(
                "Cannot find reference '{reference}'"
            )))
        }
    }

    fn checkout(&self, revision: &Revision, work_dir: &Path) -> MigrationResult<()> {
        if !self.index.contains_key(revision) {
            return Err(MigrationError::UnresolvableRevision(format!(
                "Cannot check out unknown revision '{revision}'"
            )));
        }
        file_util::clear_dir(work_dir)?;
        let ancestry = self.reachable(revision);
        let mut tree: HashMap<&str, &Revision> = HashMap::new();
        for change in &self.changes {
            if !ancestry.contains(change.revision()) {
                continue;
            }
            for file in change.files() {
                tree.insert(file, change.revision());
            }
        }
        if tree.is_empty() {
            return Err(MigrationError::Validation(
                "Origin repository is empty".to_owned(),
            ));
        }
        for (file, touched_by) in tree {
            let path = work_dir.join(file);
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::write(path, format!("{touched_by}:{file}\n"))?;
        }
        Ok(())
    }

    fn changes(
        &self,
        from: Option<&Revision>,
        to: &Revision,
    ) -> MigrationResult<ChangesResponse> {
        if !self.index.contains_key(to) {
            return Err(MigrationError::UnresolvableRevision(format!(
                "Cannot find revision '{to}'"
            )));
        }
        let to_ancestry = self.reachable(to);
        let range: HashSet<Revision> = match from {
            Some(from) if from == to => {
                return Ok(ChangesResponse::no_changes(NoChangesReason::NoChanges));
            }
            Some(from) => {
                if !self.index.contains_key(from) || !to_ancestry.contains(from) {
                    return Ok(ChangesResponse::no_changes(
                        NoChangesReason::UnrelatedRevisions,
                    ));
                }
                let from_ancestry = self.reachable(from);
                to_ancestry
                    .difference(&from_ancestry)
                    .cloned()
                    .collect()
            }
            None => to_ancestry,
        };
        let mut builder = ChangeGraphBuilder::new();
        for change in self.changes.iter().rev() {
            if range.contains(change.revision()) {
                builder.add_change(change.clone());
            }
        }
        Ok(ChangesResponse::for_changes(builder.build()))
    }

    fn change(&self, revision: &Revision) -> MigrationResult<Change> {
        self.get(revision).cloned().ok_or_else(|| {
            MigrationError::EmptyChange(format!("Cannot find change for revision '{revision}'"))
        })
    }

    fn visit_changes(
        &self,
        start: &Revision,
        visitor: &mut ChangeVisitor<'_>,
    ) -> MigrationResult<()> {
        if !self.index.contains_key(start) {
            return Err(MigrationError::UnresolvableRevision(format!(
                "Cannot find revision '{start}'"
            )));
        }
        let mut visited = HashSet::new();
        let mut queue = VecDeque::from([start.clone()]);
        while let Some(revision) = queue.pop_front() {
            if !visited.insert(revision.clone()) {
                continue;
            }
            let Some(change) = self.get(&revision) else {
                continue;
            };
            if visitor(change)? == VisitResult::Terminate {
                return Ok(());
            }
            queue.extend(change.parents().iter().cloned());
        }
        Ok(())
    }

    fn supports_history(&self) -> bool {
        true
    }
}

/// One destination write, with everything the writer saw.
#[derive(Debug, Clone)]
pub struct WriteRecord {
    pub metadata: Metadata,
    pub current_rev: Revision,
    pub current_changes: Vec<Revision>,
    pub already_migrated: Vec<Revision>,
    pub baseline: Option<String>,
    pub workflow_identity: String,
    pub files: Vec<String>,
}

#[derive(Debug)]
struct DestinationState {
    writes: Vec<WriteRecord>,
    last_imported: Option<Revision>,
    supports_previous_ref: bool,
    empty_change_revs: HashSet<Revision>,
    prompt_revs: HashSet<Revision>,
    matches_tree: Option<bool>,
}

/// Destination recording every write in memory.
///
/// The last imported revision starts from whatever the test seeds and
/// follows successful writes, like a real destination stamping origin
/// revision labels on its commits.
#[derive(Clone, Debug)]
pub struct RecordingDestination {
    state: Arc<Mutex<DestinationState>>,
}

impl RecordingDestination {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(DestinationState {
                writes: vec![],
                last_imported: None,
                supports_previous_ref: true,
                empty_change_revs: HashSet::new(),
                prompt_revs: HashSet::new(),
                matches_tree: None,
            })),
        }
    }

    /// A destination that cannot report a previous imported revision, like
    /// the folder destination.
    pub fn without_previous_ref() -> Self {
        let destination = Self::new();
        destination.state.lock().unwrap().supports_previous_ref = false;
        destination
    }

    /// Seeds the last imported origin revision, as if recorded by an
    /// earlier run.
    pub fn set_last_imported(&self, rev: &str) {
        self.state.lock().unwrap().last_imported = Some(Revision::new(rev));
    }

    /// Makes the write for `rev` fail with an empty-change error, as when
    /// the transformed tree matches the destination exactly.
    pub fn mark_empty_change(&self, rev: &str) {
        self.state
            .lock()
            .unwrap()
            .empty_change_revs
            .insert(Revision::new(rev));
    }

    /// Makes the write for `rev` ask for confirmation before the next one.
    pub fn prompt_after(&self, rev: &str) {
        self.state
            .lock()
            .unwrap()
            .prompt_revs
            .insert(Revision::new(rev));
    }

    /// Scripts the answer of [`Destination::matches_tree`].
    pub fn set_matches_tree(&self, answer: Option<bool>) {
        self.state.lock().unwrap().matches_tree = answer;
    }

    pub fn writes(&self) -> Vec<WriteRecord> {
        self.state.lock().unwrap().writes.clone()
    }

    pub fn last_imported_rev(&self) -> Option<Revision> {
        self.state.lock().unwrap().last_imported.clone()
    }
}

impl Default for RecordingDestination {
    fn default() -> Self {
        Self::new()
    }
}

impl Destination for RecordingDestination {
    fn name(&self) -> &str {
        "recording.destination"
    }

    fn label_name_when_origin(&self) -> String {
        "Destination-RevId".to_owned()
    }

    fn supports_previous_ref(&self) -> bool {
        self.state.lock().unwrap().supports_previous_ref
    }

    fn last_imported(&self, _label: &str) -> MigrationResult<Option<Revision>> {
        Ok(self.state.lock().unwrap().last_imported.clone())
    }

    fn write(&self, request: &WriteRequest<'_>) -> MigrationResult<WriterResult> {
        let mut state = self.state.lock().unwrap();
        if state.empty_change_revs.contains(request.current_rev) {
            return Err(MigrationError::EmptyChange(format!(
                "Nothing to commit for '{}'",
                request.current_rev
            )));
        }
        state.writes.push(WriteRecord {
            metadata: request.metadata.clone(),
            current_rev: request.current_rev.clone(),
            current_changes: request
                .changes
                .current()
                .iter()
                .map(|change| change.revision().clone())
                .collect(),
            already_migrated: request
                .changes
                .already_migrated()
                .iter()
                .map(|change| change.revision().clone())
                .collect(),
            baseline: request.baseline.map(|baseline| baseline.to_owned()),
            workflow_identity: request.workflow_identity.to_owned(),
            files: file_util::list_tree(request.tree)?,
        });
        state.last_imported = Some(request.current_rev.clone());
        if state.prompt_revs.contains(request.current_rev) {
            Ok(WriterResult::PromptToContinue)
        } else {
            Ok(WriterResult::Ok)
        }
    }

    fn matches_tree(&self, _tree: &Path) -> MigrationResult<Option<bool>> {
        Ok(self.state.lock().unwrap().matches_tree)
    }
}

#[derive(Debug, Clone)]
pub struct TransformRecord {
    pub message: String,
    pub files: Vec<String>,
    pub current_changes: Vec<Revision>,
    pub already_migrated: Vec<Revision>,
}

/// Transformation recording each invocation, optionally rewriting the
/// message so tests can observe the pipeline output downstream.
#[derive(Clone, Debug, Default)]
pub struct RecordingTransformation {
    records: Arc<Mutex<Vec<TransformRecord>>>,
    message_suffix: Option<String>,
}

impl RecordingTransformation {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `suffix` to the metadata message of every transformed
    /// change.
    pub fn with_message_suffix(suffix: &str) -> Self {
        Self {
            records: Arc::new(Mutex::new(vec![])),
            message_suffix: Some(suffix.to_owned()),
        }
    }

    pub fn records(&self) -> Vec<TransformRecord> {
        self.records.lock().unwrap().clone()
    }
}

impl Transformation for RecordingTransformation {
    fn describe(&self) -> String {
        "recording".to_owned()
    }

    fn transform(&self, ctx: &mut TransformContext<'_>) -> MigrationResult<()> {
        self.records.lock().unwrap().push(TransformRecord {
            message: ctx.metadata().message().to_owned(),
            files: file_util::list_tree(ctx.work_dir())?,
            current_changes: ctx
                .changes()
                .current()
                .iter()
                .map(|change| change.revision().clone())
                .collect(),
            already_migrated: ctx
                .changes()
                .already_migrated()
                .iter()
                .map(|change| change.revision().clone())
                .collect(),
        });
        if let Some(suffix) = &self.message_suffix {
            let message = format!("{}{suffix}", ctx.metadata().message());
            ctx.metadata_mut().set_message(message);
        }
        Ok(())
    }
}
