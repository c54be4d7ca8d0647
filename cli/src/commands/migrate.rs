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

use std::path::PathBuf;

use copybara_lib::authoring::Author;
use copybara_lib::authoring::Authoring;
use copybara_lib::folder::FolderDestination;
use copybara_lib::folder::FolderOrigin;
use copybara_lib::glob::FileGlob;
use copybara_lib::workflow::Workflow;
use copybara_lib::workflow::WorkflowMode;
use copybara_lib::workflow::WorkflowOptions;

use crate::command_error::CommandError;
use crate::ui::Ui;

#[derive(clap::ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum ModeArg {
    Squash,
    Iterative,
    ChangeRequest,
}

impl From<ModeArg> for WorkflowMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::Squash => Self::Squash,
            ModeArg::Iterative => Self::Iterative,
            ModeArg::ChangeRequest => Self::ChangeRequest,
        }
    }
}

/// Migrate a source tree from an origin folder into a destination folder.
///
/// The folder endpoints have no history, so this is the squash-style entry
/// point: the origin snapshot is filtered through the configured globs,
/// transformed, and written to the destination together with a metadata
/// sidecar.
#[derive(clap::Args, Clone, Debug)]
pub struct MigrateArgs {
    /// Directory to read the source tree from
    #[arg(long, value_name = "PATH")]
    origin: PathBuf,

    /// Directory to write the migrated tree to
    #[arg(long, value_name = "PATH")]
    destination: PathBuf,

    /// Workflow mode to run
    #[arg(long, value_enum, default_value_t = ModeArg::Squash)]
    mode: ModeArg,

    /// Origin reference to migrate; defaults to the origin's default
    /// reference
    #[arg(value_name = "REF", default_value = "")]
    reference: String,

    /// Name of the migration, used to correlate runs in the destination
    #[arg(long, default_value = "default")]
    name: String,

    /// Files to include, as repo-relative glob patterns
    #[arg(long = "glob", value_name = "GLOB")]
    globs: Vec<String>,

    /// Files to exclude from the included set
    #[arg(long = "exclude", value_name = "GLOB")]
    excludes: Vec<String>,

    /// Author stamped on commits when the upstream author is not allowed
    #[arg(
        long = "default-author",
        value_name = "AUTHOR",
        default_value = "Copybara <noreply@copybara.io>"
    )]
    default_author: String,

    /// Proceed even when safety checks about previously migrated revisions
    /// fail
    #[arg(long)]
    force: bool,

    /// Baseline to diff against in change-request mode, instead of
    /// discovering one from origin history
    #[arg(long = "change-request-parent", value_name = "REVISION")]
    change_request_parent: Option<String>,

    /// Maximum number of changes migrated by one iterative run
    #[arg(long = "iterative-limit-changes", value_name = "N")]
    iterative_limit_changes: Option<usize>,

    /// Hide individual origin changes from the destination, keeping only
    /// the squashed import
    #[arg(long = "squash-without-history")]
    squash_without_history: bool,
}

pub fn cmd_migrate(ui: &Ui, args: &MigrateArgs) -> Result<(), CommandError> {
    let origin_files = if args.globs.is_empty() {
        FileGlob::new(["**"], args.excludes.clone())?
    } else {
        FileGlob::new(args.globs.clone(), args.excludes.clone())?
    };
    let authoring = Authoring::use_default(Author::parse(&args.default_author));

    let mut workflow = Workflow::new(
        args.name.clone(),
        WorkflowMode::from(args.mode),
        Box::new(FolderOrigin::new(&args.origin)),
        Box::new(FolderDestination::new(&args.destination)),
        authoring,
    );
    workflow.set_origin_files(origin_files);
    workflow.set_options(WorkflowOptions {
        iterative_limit_changes: args.iterative_limit_changes,
        change_baseline: args.change_request_parent.clone(),
        force: args.force,
        squash_without_history: args.squash_without_history,
        check_last_rev_state: false,
    });

    workflow.run(&args.reference, ui)?;
    ui.success(&format!(
        "Migration '{}' finished: {} -> {}",
        args.name,
        args.origin.display(),
        args.destination.display()
    ));
    Ok(())
}
