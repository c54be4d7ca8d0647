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
use copybara_lib::authoring::Authoring;
use copybara_lib::error::MigrationError;
use copybara_lib::workflow::Workflow;
use copybara_lib::workflow::WorkflowMode;
use copybara_lib::workflow::WorkflowOptions;
use itertools::Itertools as _;
use testutils::FakeOrigin;
use testutils::RecordingDestination;
use testutils::TestConsole;
use testutils::default_author;
use testutils::origin_author;

/// Origin history where earlier imports recorded the destination's label:
/// `a` and `b` carry `Destination-RevId` values, `c` is the pending change.
fn origin_with_imported_ancestors() -> FakeOrigin {
    let mut origin = FakeOrigin::new();
    origin.add_change("a", "first import\n\nDestination-RevId: d0\n", &["a.txt"]);
    origin.add_change("b", "second import\n\nDestination-RevId: d1\n", &["b.txt"]);
    origin.add_change("c", "pending review\n", &["c.txt"]);
    origin
}

fn change_request_workflow(
    origin: FakeOrigin,
    destination: &RecordingDestination,
) -> Workflow {
    Workflow::new(
        "default",
        WorkflowMode::ChangeRequest,
        Box::new(origin),
        Box::new(destination.clone()),
        Authoring::pass_thru(default_author()),
    )
}

#[test]
fn test_change_request_discovers_baseline_from_nearest_ancestor() {
    let destination = RecordingDestination::new();
    let workflow = change_request_workflow(origin_with_imported_ancestors(), &destination);
    let console = TestConsole::new();

    workflow.run("c", &console).unwrap();

    let writes = destination.writes();
    assert_eq!(writes.len(), 1);
    // 'b' is the nearest ancestor carrying the label; its value wins over
    // the older 'a'.
    assert_eq!(writes[0].baseline.as_deref(), Some("d1"));
    assert_eq!(writes[0].current_rev.as_str(), "c");
    assert_eq!(writes[0].metadata.message(), "pending review\n");
    assert_eq!(*writes[0].metadata.author(), origin_author());
    assert_eq!(
        writes[0].current_changes.iter().map(|rev| rev.as_str()).collect_vec(),
        ["c"]
    );
}

#[test]
fn test_change_request_baseline_discovery_is_deterministic() {
    let destination = RecordingDestination::new();
    let workflow = change_request_workflow(origin_with_imported_ancestors(), &destination);
    let console = TestConsole::new();

    workflow.run("c", &console).unwrap();
    workflow.run("c", &console).unwrap();

    let baselines = destination
        .writes()
        .iter()
        .map(|write| write.baseline.clone().unwrap())
        .collect_vec();
    assert_eq!(baselines, ["d1", "d1"]);
}

#[test]
fn test_change_request_ignores_label_on_resolved_ref_itself() {
    // The resolved ref carries the label too; baseline discovery must look
    // past it to a proper ancestor.
    let mut origin = FakeOrigin::new();
    origin.add_change("a", "first import\n\nDestination-RevId: d0\n", &["a.txt"]);
    origin.add_change("b", "own label\n\nDestination-RevId: d9\n", &["b.txt"]);
    let destination = RecordingDestination::new();
    let workflow = change_request_workflow(origin, &destination);
    let console = TestConsole::new();

    workflow.run("b", &console).unwrap();

    assert_eq!(destination.writes()[0].baseline.as_deref(), Some("d0"));
}

#[test]
fn test_change_request_uses_configured_baseline() {
    let mut origin = FakeOrigin::new();
    origin.add_change("a", "no labels here\n", &["a.txt"]);
    origin.add_change("b", "pending review\n", &["b.txt"]);
    let destination = RecordingDestination::new();
    let mut workflow = change_request_workflow(origin, &destination);
    workflow.set_options(WorkflowOptions {
        change_baseline: Some("custom-parent".to_owned()),
        ..Default::default()
    });
    let console = TestConsole::new();

    workflow.run("b", &console).unwrap();

    assert_eq!(
        destination.writes()[0].baseline.as_deref(),
        Some("custom-parent")
    );
}

#[test]
fn test_change_request_fails_without_discoverable_baseline() {
    let mut origin = FakeOrigin::new();
    origin.add_change("a", "no labels here\n", &["a.txt"]);
    origin.add_change("b", "pending review\n", &["b.txt"]);
    let destination = RecordingDestination::new();
    let workflow = change_request_workflow(origin, &destination);
    let console = TestConsole::new();

    let result = workflow.run("b", &console);
    assert_matches!(
        result,
        Err(MigrationError::Validation(message))
            if message.contains("--change-request-parent")
    );
}

#[test]
fn test_change_request_requires_history_capable_destination() {
    let destination = RecordingDestination::without_previous_ref();
    let workflow = change_request_workflow(origin_with_imported_ancestors(), &destination);
    let console = TestConsole::new();

    let result = workflow.run("c", &console);
    assert_matches!(
        result,
        Err(MigrationError::Validation(message))
            if message.contains("incompatible with CHANGE_REQUEST")
                && message.contains("recording.destination")
    );
}
