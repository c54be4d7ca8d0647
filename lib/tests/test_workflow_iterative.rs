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

use assert_matches::assert_matches;
use copybara_lib::authoring::Author;
use copybara_lib::authoring::Authoring;
use copybara_lib::error::MigrationError;
use copybara_lib::glob::FileGlob;
use copybara_lib::workflow::Workflow;
use copybara_lib::workflow::WorkflowMode;
use copybara_lib::workflow::WorkflowOptions;
use itertools::Itertools as _;
use pretty_assertions::assert_eq;
use testutils::FakeOrigin;
use testutils::RecordingDestination;
use testutils::TestConsole;
use testutils::default_author;
use testutils::origin_author;

/// Origin with `count` changes named `c1..cN` on top of an already imported
/// root `c0`.
fn origin_with_changes(count: usize) -> FakeOrigin {
    let mut origin = FakeOrigin::new();
    origin.add_change("c0", "imported root\n", &["file0.txt"]);
    for n in 1..=count {
        let file = format!("file{n}.txt");
        origin.add_change(
            &format!("c{n}"),
            &format!("change number {n}\n"),
            &[file.as_str()],
        );
    }
    origin
}

fn iterative_workflow(origin: FakeOrigin, destination: &RecordingDestination) -> Workflow {
    Workflow::new(
        "default",
        WorkflowMode::Iterative,
        Box::new(origin),
        Box::new(destination.clone()),
        Authoring::pass_thru(default_author()),
    )
}

fn written_revs(destination: &RecordingDestination) -> Vec<String> {
    destination
        .writes()
        .iter()
        .map(|write| write.current_rev.as_str().to_owned())
        .collect()
}

#[test]
fn test_iterative_migrates_one_commit_per_change() {
    let destination = RecordingDestination::new();
    destination.set_last_imported("c0");
    let workflow = iterative_workflow(origin_with_changes(3), &destination);
    let console = TestConsole::new();

    workflow.run("c3", &console).unwrap();

    assert_eq!(written_revs(&destination), ["c1", "c2", "c3"]);
    let writes = destination.writes();
    // Each commit carries the origin change's own message and author.
    assert_eq!(writes[0].metadata.message(), "change number 1\n");
    assert_eq!(*writes[0].metadata.author(), origin_author());
    assert_eq!(
        writes[1].current_changes.iter().map(|rev| rev.as_str()).collect_vec(),
        ["c2"]
    );
}

#[test]
fn test_iterative_already_migrated_ordering() {
    let destination = RecordingDestination::new();
    destination.set_last_imported("c0");
    let workflow = iterative_workflow(origin_with_changes(3), &destination);
    let console = TestConsole::new();

    workflow.run("c3", &console).unwrap();

    // At step k+1, the front of alreadyMigrated is the change migrated at
    // step k, followed by the previous front.
    let writes = destination.writes();
    assert!(writes[0].already_migrated.is_empty());
    assert_eq!(
        writes[1].already_migrated.iter().map(|rev| rev.as_str()).collect_vec(),
        ["c1"]
    );
    assert_eq!(
        writes[2].already_migrated.iter().map(|rev| rev.as_str()).collect_vec(),
        ["c2", "c1"]
    );
}

#[test]
fn test_iterative_respects_limit() {
    let destination = RecordingDestination::new();
    destination.set_last_imported("c0");
    let mut workflow = iterative_workflow(origin_with_changes(5), &destination);
    workflow.set_options(WorkflowOptions {
        iterative_limit_changes: Some(3),
        ..Default::default()
    });
    let console = TestConsole::new();

    workflow.run("c5", &console).unwrap();

    assert_eq!(written_revs(&destination), ["c1", "c2", "c3"]);
    assert_eq!(destination.last_imported_rev().unwrap().as_str(), "c3");
    assert!(
        console
            .infos()
            .iter()
            .any(|info| info.contains("first 3 change(s) out of 5"))
    );
}

#[test]
fn test_iterative_continues_past_empty_change() {
    let destination = RecordingDestination::new();
    destination.set_last_imported("c0");
    destination.mark_empty_change("c2");
    let workflow = iterative_workflow(origin_with_changes(4), &destination);
    let console = TestConsole::new();

    workflow.run("c4", &console).unwrap();

    assert_eq!(written_revs(&destination), ["c1", "c3", "c4"]);
    console.assert_warned("resulted in an empty change");
    // The empty change still becomes templating context for its successors.
    let writes = destination.writes();
    assert_eq!(
        writes[1].already_migrated.iter().map(|rev| rev.as_str()).collect_vec(),
        ["c2", "c1"]
    );
}

#[test]
fn test_iterative_fails_when_nothing_was_migrated() {
    let destination = RecordingDestination::new();
    destination.set_last_imported("c0");
    destination.mark_empty_change("c1");
    destination.mark_empty_change("c2");
    let workflow = iterative_workflow(origin_with_changes(2), &destination);
    let console = TestConsole::new();

    let result = workflow.run("c2", &console);
    assert_matches!(
        result,
        Err(MigrationError::EmptyChange(message))
            if message.contains("produced no changes")
    );
}

#[test]
fn test_iterative_skips_changes_outside_glob() {
    let mut origin = FakeOrigin::new();
    origin.add_change("c0", "imported root\n", &["included/root.txt"]);
    origin.add_change("c1", "relevant\n", &["included/one.txt"]);
    origin.add_change("c2", "irrelevant\n", &["excluded/two.txt"]);
    origin.add_change("c3", "also relevant\n", &["included/three.txt"]);
    let destination = RecordingDestination::new();
    destination.set_last_imported("c0");
    let mut workflow = iterative_workflow(origin, &destination);
    workflow.set_origin_files(FileGlob::new(["included/**"], [] as [&str; 0]).unwrap());
    let console = TestConsole::new();

    workflow.run("c3", &console).unwrap();

    assert_eq!(written_revs(&destination), ["c1", "c3"]);
    // The progress counter tracks the origin change position, so the skip
    // leaves a visible gap.
    assert!(
        console
            .infos()
            .iter()
            .any(|info| info.contains("Skipping change 2 of 3"))
    );
    assert!(
        console
            .infos()
            .iter()
            .any(|info| info.contains("Migrating change 3 of 3"))
    );
}

#[test]
fn test_iterative_fails_without_new_changes() {
    let destination = RecordingDestination::new();
    destination.set_last_imported("c2");
    let workflow = iterative_workflow(origin_with_changes(2), &destination);
    let console = TestConsole::new();

    let result = workflow.run("c2", &console);
    assert_matches!(
        result,
        Err(MigrationError::EmptyChange(message))
            if message.contains("No new changes to import")
    );
}

#[test]
fn test_iterative_requires_last_rev_or_force() {
    let destination = RecordingDestination::new();
    let workflow = iterative_workflow(origin_with_changes(2), &destination);
    let console = TestConsole::new();

    let result = workflow.run("c2", &console);
    assert_matches!(
        result,
        Err(MigrationError::Validation(message)) if message.contains("--force")
    );
}

#[test]
fn test_iterative_force_imports_full_history() {
    let destination = RecordingDestination::new();
    let mut workflow = iterative_workflow(origin_with_changes(2), &destination);
    workflow.set_options(WorkflowOptions {
        force: true,
        ..Default::default()
    });
    let console = TestConsole::new();

    workflow.run("c2", &console).unwrap();

    assert_eq!(written_revs(&destination), ["c0", "c1", "c2"]);
}

#[test]
fn test_iterative_prompt_accepted_continues() {
    let destination = RecordingDestination::new();
    destination.set_last_imported("c0");
    destination.prompt_after("c1");
    let workflow = iterative_workflow(origin_with_changes(3), &destination);
    let console = TestConsole::new();
    console.answer_prompt(true);

    workflow.run("c3", &console).unwrap();

    assert_eq!(written_revs(&destination), ["c1", "c2", "c3"]);
    assert_eq!(console.prompts().len(), 1);
}

#[test]
fn test_iterative_prompt_declined_rejects_run() {
    let destination = RecordingDestination::new();
    destination.set_last_imported("c0");
    destination.prompt_after("c1");
    let workflow = iterative_workflow(origin_with_changes(3), &destination);
    let console = TestConsole::new();
    console.answer_prompt(false);

    let result = workflow.run("c3", &console);
    assert_matches!(result, Err(MigrationError::ChangeRejected(_)));
    assert_eq!(written_revs(&destination), ["c1"]);
}

#[test]
fn test_iterative_no_prompt_after_final_change() {
    let destination = RecordingDestination::new();
    destination.set_last_imported("c0");
    destination.prompt_after("c2");
    let workflow = iterative_workflow(origin_with_changes(2), &destination);
    let console = TestConsole::new();

    workflow.run("c2", &console).unwrap();

    // The destination asked after the last change; there is nothing left to
    // confirm.
    assert!(console.prompts().is_empty());
}

#[test]
fn test_iterative_authoring_replaces_disallowed_authors() {
    let mut origin = FakeOrigin::new();
    origin.add_change("c0", "imported root\n", &["root.txt"]);
    origin.add_change_with_author(
        "c1",
        Author::new("Outsider", "outsider@example.com"),
        "external change\n",
        &["one.txt"],
    );
    origin.add_change("c2", "internal change\n", &["two.txt"]);
    let destination = RecordingDestination::new();
    destination.set_last_imported("c0");
    let workflow = Workflow::new(
        "default",
        WorkflowMode::Iterative,
        Box::new(origin),
        Box::new(destination.clone()),
        Authoring::allowed(default_author(), [origin_author().email().to_owned()]),
    );
    let console = TestConsole::new();

    workflow.run("c2", &console).unwrap();

    let writes = destination.writes();
    assert_eq!(*writes[0].metadata.author(), default_author());
    assert_eq!(*writes[1].metadata.author(), origin_author());
}
