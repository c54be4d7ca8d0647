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

//! The migration workflow: one origin, one destination, and a strategy for
//! turning origin history into destination commits.

use std::collections::VecDeque;
use std::fmt;
use std::slice;

use tracing::instrument;

use crate::authoring::Authoring;
use crate::cancel::CancellationToken;
use crate::change::Change;
use crate::change::ComputedChanges;
use crate::change::Metadata;
use crate::console::Console;
use crate::console::PrefixedConsole;
use crate::destination::Destination;
use crate::destination::WriterResult;
use crate::error::MigrationError;
use crate::error::MigrationResult;
use crate::glob::FileGlob;
use crate::origin::Origin;
use crate::origin::VisitResult;
use crate::revision::Revision;
use crate::run_helper::ChangeGlobPolicy;
use crate::run_helper::WorkflowRunHelper;
use crate::transform::Sequence;
use crate::transform::Transformation;

/// The commit message stamped on squashed imports.
pub const SQUASH_MESSAGE: &str = "Project import generated by Copybara.\n";

/// Strategy used to migrate origin changes into the destination.
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum WorkflowMode {
    /// Import the resolved revision as a single squashed commit.
    Squash,
    /// Import each new origin change as its own destination commit.
    Iterative,
    /// Import a single origin tree as a review, diffed against a baseline
    /// commit already present in the destination.
    ChangeRequest,
}

impl fmt::Display for WorkflowMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Squash => "SQUASH",
            Self::Iterative => "ITERATIVE",
            Self::ChangeRequest => "CHANGE_REQUEST",
        };
        write!(f, "{name}")
    }
}

/// Per-run settings recognized by every workflow mode.
#[derive(Debug, Clone, Default)]
pub struct WorkflowOptions {
    /// Cap on destination commits per iterative run. `None` means unlimited.
    pub iterative_limit_changes: Option<usize>,
    /// Pre-selected change-request parent, bypassing baseline discovery.
    pub change_baseline: Option<String>,
    /// Demote history-discovery safety errors to warnings and proceed.
    pub force: bool,
    /// Squash still detects individual changes (for error reporting) but
    /// hands the writer an empty change list.
    pub squash_without_history: bool,
    /// Verify the destination matches the transformed state of the last
    /// imported revision before writing anything new.
    pub check_last_rev_state: bool,
}

/// A fully configured migration. Immutable while a run is in flight; the
/// run-scoped mutable state lives in [`WorkflowRunHelper`].
pub struct Workflow {
    name: String,
    mode: WorkflowMode,
    origin: Box<dyn Origin>,
    destination: Box<dyn Destination>,
    authoring: Authoring,
    transformation: Box<dyn Transformation>,
    origin_files: FileGlob,
    options: WorkflowOptions,
    change_glob_policy: Option<Box<dyn ChangeGlobPolicy>>,
    cancel: CancellationToken,
}

impl Workflow {
    pub fn new(
        name: impl Into<String>,
        mode: WorkflowMode,
        origin: Box<dyn Origin>,
        destination: Box<dyn Destination>,
        authoring: Authoring,
    ) -> Self {
        Self {
            name: name.into(),
            mode,
            origin,
            destination,
            authoring,
            transformation: Box::new(Sequence::empty()),
            origin_files: FileGlob::all_files(),
            options: WorkflowOptions::default(),
            change_glob_policy: None,
            cancel: CancellationToken::new(),
        }
    }

    pub fn set_transformation(&mut self, transformation: Box<dyn Transformation>) -> &mut Self {
        self.transformation = transformation;
        self
    }

    pub fn set_origin_files(&mut self, origin_files: FileGlob) -> &mut Self {
        self.origin_files = origin_files;
        self
    }

    pub fn set_options(&mut self, options: WorkflowOptions) -> &mut Self {
        self.options = options;
        self
    }

    pub fn set_change_glob_policy(&mut self, policy: Box<dyn ChangeGlobPolicy>) -> &mut Self {
        self.change_glob_policy = Some(policy);
        self
    }

    pub fn set_cancellation_token(&mut self, cancel: CancellationToken) -> &mut Self {
        self.cancel = cancel;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn mode(&self) -> WorkflowMode {
        self.mode
    }

    pub fn origin(&self) -> &dyn Origin {
        self.origin.as_ref()
    }

    pub fn destination(&self) -> &dyn Destination {
        self.destination.as_ref()
    }

    pub fn authoring(&self) -> &Authoring {
        &self.authoring
    }

    pub fn transformation(&self) -> &dyn Transformation {
        self.transformation.as_ref()
    }

    pub fn origin_files(&self) -> &FileGlob {
        &self.origin_files
    }

    pub fn options(&self) -> &WorkflowOptions {
        &self.options
    }

    pub(crate) fn change_glob_policy(&self) -> Option<&dyn ChangeGlobPolicy> {
        self.change_glob_policy.as_deref()
    }

    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.cancel
    }

    /// Runs the workflow against `reference` (empty string = the origin's
    /// default reference), reporting through `console`.
    #[instrument(skip(self, console), fields(workflow = %self.name, mode = %self.mode))]
    pub fn run(&self, reference: &str, console: &dyn Console) -> MigrationResult<()> {
        self.cancel.check()?;
        let resolved = self.origin.resolve(reference)?;
        console.info(&format!(
            "Running migration '{}' ({}) for revision '{resolved}'",
            self.name, self.mode
        ));
        let helper = WorkflowRunHelper::new(self, resolved, console);
        match self.mode {
            WorkflowMode::Squash => run_squash(&helper),
            WorkflowMode::Iterative => run_iterative(&helper),
            WorkflowMode::ChangeRequest => run_change_request(&helper),
        }
    }
}

/// Writes one destination commit whose tree is the transformed tree of the
/// resolved origin revision.
#[instrument(skip_all)]
fn run_squash(helper: &WorkflowRunHelper<'_>) -> MigrationResult<()> {
    let console = helper.console();
    let mut current = helper.resolved_ref().clone();

    let history_supported = helper.is_history_supported();
    let last_rev = if history_supported {
        helper.last_rev_or_none()?
    } else {
        None
    };
    let mut detected = match &last_rev {
        Some(last_rev) => helper.changes(Some(last_rev), &current)?,
        None => vec![],
    };
    if detected.is_empty() && history_supported {
        squash_no_changes_policy(helper, last_rev.as_ref(), &current)?;
    }

    // A squash never attributes to upstream authors.
    let metadata = Metadata::new(SQUASH_MESSAGE, helper.authoring().default_author().clone());
    helper.maybe_validate_repo_in_last_rev_state(Some(&metadata))?;

    let sub_helper = helper.for_changes(&detected);
    detected.retain(|change| !sub_helper.skip_changes(slice::from_ref(change)));

    // Prefer the newest file-relevant change over the raw resolved ref, so
    // unrelated trailing commits don't become the migration target.
    if let Some(last_relevant) = detected.last() {
        current = last_relevant.revision().clone();
    }

    detected.reverse();
    if helper.is_squash_without_history() {
        detected.clear();
    }

    let identity = helper.workflow_identity(helper.resolved_ref());
    let computed = ComputedChanges::new(detected, vec![]);
    sub_helper.migrate(&current, console, metadata, &computed, None, &identity)?;
    Ok(())
}

/// Decides what an empty squash change set means. Squash is the catch-up
/// mode: accidentally re-running it must be rejected, with `--force` as the
/// documented escape hatch.
fn squash_no_changes_policy(
    helper: &WorkflowRunHelper<'_>,
    last_rev: Option<&Revision>,
    current: &Revision,
) -> MigrationResult<()> {
    let console = helper.console();
    let force = helper.is_force();
    match last_rev {
        None => {
            if force {
                console.warn(&format!(
                    "Cannot find any change in history up to '{current}', proceeding because of \
                     --force"
                ));
                Ok(())
            } else {
                Err(MigrationError::Validation(format!(
                    "Cannot find any change in history up to '{current}'. Use --force if you \
                     really want to import '{current}' as a single change"
                )))
            }
        }
        Some(last_rev) if last_rev == current => {
            if force {
                console.warn(&format!(
                    "'{current}' has been already migrated, proceeding because of --force"
                ));
                Ok(())
            } else {
                Err(MigrationError::EmptyChange(format!(
                    "'{current}' has been already migrated. Use --force if you really want to run \
                     the migration again (for example if the transformations have changed)"
                )))
            }
        }
        Some(last_rev) => {
            // A non-empty reverse range means the destination is ahead of the
            // requested revision; an empty one means the histories are
            // unrelated.
            let reverse = helper.changes(Some(current), last_rev)?;
            if reverse.is_empty() {
                if force {
                    console.warn(&format!(
                        "Last imported revision '{last_rev}' is not an ancestor of '{current}', \
                         proceeding because of --force"
                    ));
                    Ok(())
                } else {
                    Err(MigrationError::Validation(format!(
                        "Last imported revision '{last_rev}' is not an ancestor of the revision \
                         currently being migrated ('{current}'). Use --force if you really want \
                         to migrate the reference"
                    )))
                }
            } else if force {
                console.warn(&format!(
                    "'{current}' has been already migrated, proceeding because of --force"
                ));
                Ok(())
            } else {
                Err(MigrationError::EmptyChange(format!(
                    "'{current}' has been already migrated; the destination is at the newer \
                     revision '{last_rev}'. Use --force if you really want to run the migration \
                     again"
                )))
            }
        }
    }
}

/// Writes one destination commit per new origin change, oldest first.
#[instrument(skip_all)]
fn run_iterative(helper: &WorkflowRunHelper<'_>) -> MigrationResult<()> {
    let console = helper.console();
    let changes = helper.changes_since_last_import()?;
    if changes.is_empty() {
        return Err(MigrationError::EmptyChange(format!(
            "No new changes to import for resolved ref '{}'",
            helper.resolved_ref()
        )));
    }

    let total = changes.len();
    let limit = helper
        .options()
        .iterative_limit_changes
        .unwrap_or(usize::MAX)
        .min(total);
    if limit < total {
        console.info(&format!(
            "Importing the first {limit} change(s) out of {total} because of \
             --iterative-limit-changes"
        ));
    }

    helper.maybe_validate_repo_in_last_rev_state(None)?;

    // Most-recent-first context for downstream templating.
    let mut migrated: VecDeque<Change> = VecDeque::new();
    let mut migrated_count = 0usize;

    for (position, change) in changes.iter().enumerate() {
        if migrated_count == limit {
            break;
        }
        // The displayed position tracks the origin change, not the
        // destination commit, so skips leave visible gaps.
        let progress_prefix = format!("{} of {total}", position + 1);
        let sub_helper = helper.for_changes(slice::from_ref(change));
        if sub_helper.skip_changes(slice::from_ref(change)) {
            console.info(&format!(
                "Skipping change {progress_prefix}: '{}' does not affect any destination file",
                change.revision()
            ));
            continue;
        }

        console.info(&format!(
            "Migrating change {progress_prefix}: {} - {}",
            change.revision(),
            change.first_line()
        ));
        let change_console = PrefixedConsole::new(console, progress_prefix);
        let metadata = Metadata::new(
            change.message(),
            helper.authoring().resolve(change.author()),
        );
        let computed = ComputedChanges::new(
            vec![change.clone()],
            migrated.iter().cloned().collect(),
        );
        let identity = helper.workflow_identity(change.revision());
        let result = sub_helper.migrate(
            change.revision(),
            &change_console,
            metadata,
            &computed,
            None,
            &identity,
        );
        let writer_result = match result {
            Ok(writer_result) => {
                migrated.push_front(change.clone());
                migrated_count += 1;
                writer_result
            }
            Err(MigrationError::EmptyChange(message)) => {
                console.warn(&format!(
                    "Migration of origin revision '{}' resulted in an empty change in the \
                     destination: {message}",
                    change.revision()
                ));
                migrated.push_front(change.clone());
                WriterResult::Ok
            }
            Err(err) => {
                console.error(&format!(
                    "Migration of origin revision '{}' failed: {err}",
                    change.revision()
                ));
                return Err(err);
            }
        };

        let more_to_migrate = migrated_count < limit && position + 1 < changes.len();
        if writer_result == WriterResult::PromptToContinue && more_to_migrate {
            let keep_going =
                console.prompt_continue("Continue importing the next change?")?;
            if !keep_going {
                return Err(MigrationError::ChangeRejected(
                    "Iterative migration aborted by the user after the destination requested \
                     confirmation"
                        .to_owned(),
                ));
            }
        }
    }

    if migrated_count == 0 {
        return Err(MigrationError::EmptyChange(format!(
            "Iterative workflow produced no changes in the destination for resolved ref '{}'",
            helper.resolved_ref()
        )));
    }
    Ok(())
}

/// Imports a single origin tree as a review diffed against a baseline commit
/// already present in the destination.
#[instrument(skip_all)]
fn run_change_request(helper: &WorkflowRunHelper<'_>) -> MigrationResult<()> {
    let console = helper.console();
    if !helper.destination_supports_previous_ref() {
        return Err(MigrationError::Validation(format!(
            "'{}' destination is incompatible with CHANGE_REQUEST workflows: it cannot track an \
             origin baseline",
            helper.destination().name()
        )));
    }

    let baseline = match &helper.options().change_baseline {
        Some(baseline) if !baseline.is_empty() => baseline.clone(),
        _ => discover_baseline(helper)?,
    };
    console.info(&format!("Using baseline '{baseline}'"));

    let change = helper.origin().change(helper.resolved_ref())?;
    let metadata = Metadata::new(
        change.message(),
        helper.authoring().resolve(change.author()),
    );
    let computed = ComputedChanges::new(vec![change], vec![]);
    let identity = helper.workflow_identity(helper.resolved_ref());
    helper.migrate(
        helper.resolved_ref(),
        console,
        metadata,
        &computed,
        Some(&baseline),
        &identity,
    )?;
    Ok(())
}

/// Walks origin history backward from the resolved ref and picks the first
/// ancestor (other than the ref itself) carrying the destination's origin
/// label; its label value is the baseline.
fn discover_baseline(helper: &WorkflowRunHelper<'_>) -> MigrationResult<String> {
    let label = helper.destination().label_name_when_origin();
    let resolved_ref = helper.resolved_ref().clone();
    let mut baseline: Option<String> = None;
    helper
        .origin()
        .visit_changes(&resolved_ref, &mut |change| {
            if *change.revision() == resolved_ref {
                return Ok(VisitResult::Continue);
            }
            match change.label_values(&label).first() {
                Some(value) => {
                    baseline = Some(value.clone());
                    Ok(VisitResult::Terminate)
                }
                None => Ok(VisitResult::Continue),
            }
        })?;
    baseline.ok_or_else(|| {
        MigrationError::Validation(format!(
            "Cannot find an ancestor of '{resolved_ref}' with a '{label}' label to use as \
             baseline. Use --change-request-parent to select one manually"
        ))
    })
}
