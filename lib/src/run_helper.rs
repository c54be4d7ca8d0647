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

//! Per-invocation context shared by the workflow modes.

use std::fs;
use std::path::Path;

use blake2::Blake2b512;
use digest::Digest as _;

use crate::authoring::Authoring;
use crate::cancel::CancellationToken;
use crate::change::Change;
use crate::change::ComputedChanges;
use crate::change::Metadata;
use crate::console::Console;
use crate::destination::Destination;
use crate::destination::WriteRequest;
use crate::destination::WriterResult;
use crate::error::MigrationError;
use crate::error::MigrationResult;
use crate::file_util;
use crate::glob::FileGlob;
use crate::origin::ChangesResponse;
use crate::origin::Origin;
use crate::revision::Revision;
use crate::transform::TransformContext;
use crate::workflow::Workflow;
use crate::workflow::WorkflowOptions;

/// Supplies a change-specific file glob for a sub-helper, overriding the
/// workflow's configured glob for the given changeset.
pub trait ChangeGlobPolicy: Send + Sync {
    fn glob_for(&self, changes: &[Change]) -> Option<FileGlob>;
}

/// The mutable face of a single workflow invocation: the resolved reference,
/// the effective file glob, and the plumbing every mode needs.
///
/// A helper can spawn sub-helpers for specific change lists via
/// [`for_changes`](Self::for_changes); sub-helpers share the parent's
/// external resources and may only differ in their file glob.
pub struct WorkflowRunHelper<'a> {
    workflow: &'a Workflow,
    console: &'a dyn Console,
    resolved_ref: Revision,
    origin_files: FileGlob,
}

impl<'a> WorkflowRunHelper<'a> {
    pub(crate) fn new(
        workflow: &'a Workflow,
        resolved_ref: Revision,
        console: &'a dyn Console,
    ) -> Self {
        let origin_files = workflow.origin_files().clone();
        Self {
            workflow,
            console,
            resolved_ref,
            origin_files,
        }
    }

    /// Creates a sub-helper for a specific change list. The glob may be
    /// narrowed or widened by the workflow's change-glob policy; everything
    /// else is inherited.
    pub fn for_changes(&self, changes: &[Change]) -> Self {
        let origin_files = self
            .workflow
            .change_glob_policy()
            .and_then(|policy| policy.glob_for(changes))
            .unwrap_or_else(|| self.origin_files.clone());
        Self {
            workflow: self.workflow,
            console: self.console,
            resolved_ref: self.resolved_ref.clone(),
            origin_files,
        }
    }

    pub fn resolved_ref(&self) -> &Revision {
        &self.resolved_ref
    }

    pub fn console(&self) -> &'a dyn Console {
        self.console
    }

    pub fn origin(&self) -> &dyn Origin {
        self.workflow.origin()
    }

    pub fn destination(&self) -> &dyn Destination {
        self.workflow.destination()
    }

    pub fn authoring(&self) -> &Authoring {
        self.workflow.authoring()
    }

    pub fn options(&self) -> &WorkflowOptions {
        self.workflow.options()
    }

    pub fn origin_files(&self) -> &FileGlob {
        &self.origin_files
    }

    pub fn is_force(&self) -> bool {
        self.options().force
    }

    pub fn is_squash_without_history(&self) -> bool {
        self.options().squash_without_history
    }

    pub fn destination_supports_previous_ref(&self) -> bool {
        self.destination().supports_previous_ref()
    }

    /// Whether both ends can track history: the destination records the last
    /// imported revision and the origin can enumerate ancestors.
    pub fn is_history_supported(&self) -> bool {
        self.destination_supports_previous_ref() && self.origin().supports_history()
    }

    fn cancellation(&self) -> &CancellationToken {
        self.workflow.cancellation_token()
    }

    /// The last origin revision recorded in the destination, read off the
    /// newest relevant destination commit. The destination is the source of
    /// truth; the core persists nothing.
    pub fn last_rev(&self) -> MigrationResult<Revision> {
        let label = self.origin().label_name();
        match self.destination().last_imported(label)? {
            Some(revision) => Ok(revision),
            None => Err(MigrationError::UnresolvableRevision(format!(
                "Previous imported revision label {label} could not be found in {}",
                self.destination().name()
            ))),
        }
    }

    /// Like [`last_rev`](Self::last_rev), but an unknown last revision maps
    /// to `None` without any diagnostics. Squash uses this for its
    /// no-changes policy, which produces its own errors.
    pub fn last_rev_or_none(&self) -> MigrationResult<Option<Revision>> {
        match self.last_rev() {
            Ok(revision) => Ok(Some(revision)),
            Err(MigrationError::UnresolvableRevision(message)) => {
                tracing::debug!("{message}");
                Ok(None)
            }
            Err(err) => Err(err),
        }
    }

    /// Like [`last_rev`](Self::last_rev), but under `--force` an unknown
    /// last revision becomes a warning and `None`; without force it is a
    /// validation error pointing at the flag.
    pub fn maybe_get_last_rev(&self) -> MigrationResult<Option<Revision>> {
        match self.last_rev() {
            Ok(revision) => Ok(Some(revision)),
            Err(MigrationError::UnresolvableRevision(message)) => {
                if self.is_force() {
                    self.console.warn(&format!(
                        "Cannot find the last imported revision, proceeding because of --force: \
                         {message}"
                    ));
                    Ok(None)
                } else {
                    Err(MigrationError::Validation(format!(
                        "{message}. Use --force if you really want to proceed without a previous \
                         imported revision"
                    )))
                }
            }
            Err(err) => Err(err),
        }
    }

    /// Linearized changes in the half-open range `(from, to]`, oldest first.
    /// Empty when the origin reports no changes.
    pub fn changes(
        &self,
        from: Option<&Revision>,
        to: &Revision,
    ) -> MigrationResult<Vec<Change>> {
        self.cancellation().check()?;
        match self.origin().changes(from, to)? {
            ChangesResponse::Changes(graph) => Ok(graph.linearize()),
            ChangesResponse::NoChanges(reason) => {
                tracing::debug!(?reason, "origin reported no changes");
                Ok(vec![])
            }
        }
    }

    /// Changes between the destination's last imported revision and the
    /// resolved reference. With `--force` and no last revision on record,
    /// falls back to the full origin history.
    pub fn changes_since_last_import(&self) -> MigrationResult<Vec<Change>> {
        let last_rev = self.maybe_get_last_rev()?;
        self.changes(last_rev.as_ref(), &self.resolved_ref)
    }

    /// True iff the whole change list can be dropped without writing an
    /// empty destination commit: every change demonstrably touches only
    /// files outside the configured glob, or the list is empty. A change
    /// with no recorded file list counts as relevant.
    pub fn skip_changes(&self, changes: &[Change]) -> bool {
        changes.iter().all(|change| {
            !change.files().is_empty()
                && !change
                    .files()
                    .iter()
                    .any(|file| self.origin_files.matches(file))
        })
    }

    /// Opaque fingerprint for this workflow targeting `revision`, stable
    /// across re-runs so the destination can correlate retries and
    /// multi-commit sequences.
    pub fn workflow_identity(&self, revision: &Revision) -> String {
        let mut hasher = Blake2b512::new();
        hasher.update(self.workflow.name().as_bytes());
        hasher.update(b"%");
        hasher.update(revision.as_str().as_bytes());
        let digest = hasher.finalize();
        format!("{}_{}", self.workflow.name(), hex::encode(&digest[..16]))
    }

    /// Checks out `revision`, runs the transformation pipeline, and hands
    /// the result to the destination writer.
    pub fn migrate(
        &self,
        revision: &Revision,
        console: &dyn Console,
        metadata: Metadata,
        changes: &ComputedChanges,
        destination_baseline: Option<&str>,
        workflow_identity: &str,
    ) -> MigrationResult<WriterResult> {
        self.cancellation().check()?;
        let work_dir = tempfile::Builder::new().prefix("copybara-").tempdir()?;
        self.checkout_filtered(revision, work_dir.path())?;

        let mut ctx = TransformContext::new(work_dir.path(), metadata, changes, console);
        self.workflow.transformation().transform(&mut ctx)?;
        let metadata = ctx.into_metadata();

        self.cancellation().check()?;
        let request = WriteRequest {
            tree: work_dir.path(),
            metadata: &metadata,
            current_rev: revision,
            changes,
            baseline: destination_baseline,
            workflow_identity,
        };
        let result = self.destination().write(&request)?;
        tracing::info!(revision = %revision, "migrated origin revision");
        Ok(result)
    }

    /// Re-runs the transformation on the last imported revision and checks
    /// the destination still matches it. A mismatch is fatal without
    /// `--force`; destinations that cannot answer produce a warning.
    pub fn maybe_validate_repo_in_last_rev_state(
        &self,
        metadata: Option<&Metadata>,
    ) -> MigrationResult<()> {
        if !self.options().check_last_rev_state {
            return Ok(());
        }
        let Some(last_rev) = self.last_rev_or_none()? else {
            return Ok(());
        };
        self.cancellation().check()?;
        let work_dir = tempfile::Builder::new().prefix("copybara-").tempdir()?;
        self.checkout_filtered(&last_rev, work_dir.path())?;
        let metadata = metadata.cloned().unwrap_or_else(|| {
            Metadata::new(
                "Last revision state validation",
                self.authoring().default_author().clone(),
            )
        });
        let computed = ComputedChanges::default();
        let mut ctx = TransformContext::new(work_dir.path(), metadata, &computed, self.console);
        self.workflow.transformation().transform(&mut ctx)?;
        match self.destination().matches_tree(work_dir.path())? {
            Some(true) => Ok(()),
            Some(false) if self.is_force() => {
                self.console.warn(&format!(
                    "Destination does not match the transformed state of last migrated revision \
                     '{last_rev}', proceeding because of --force"
                ));
                Ok(())
            }
            Some(false) => Err(MigrationError::Validation(format!(
                "Destination does not match the transformed state of last migrated revision \
                 '{last_rev}'. Use --force to migrate anyway"
            ))),
            None => {
                self.console.warn(
                    "Destination cannot verify the last migrated state; skipping the check",
                );
                Ok(())
            }
        }
    }

    /// Checks out `revision` and drops the files the effective glob
    /// excludes, so transformations and the writer only ever see imported
    /// paths.
    fn checkout_filtered(&self, revision: &Revision, work_dir: &Path) -> MigrationResult<()> {
        self.origin().checkout(revision, work_dir)?;
        for file in file_util::list_tree(work_dir)? {
            if !self.origin_files.matches(&file) {
                fs::remove_file(work_dir.join(&file))?;
            }
        }
        file_util::remove_empty_dirs(work_dir)?;
        Ok(())
    }
}
