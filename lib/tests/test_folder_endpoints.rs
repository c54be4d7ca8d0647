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

use std::fs;
use std::path::Path;

use assert_matches::assert_matches;
use copybara_lib::authoring::Authoring;
use copybara_lib::error::MigrationError;
use copybara_lib::file_util;
use copybara_lib::folder::FolderDestination;
use copybara_lib::folder::FolderOrigin;
use copybara_lib::glob::FileGlob;
use copybara_lib::workflow::Workflow;
use copybara_lib::workflow::WorkflowMode;
use testutils::TestConsole;
use testutils::default_author;

fn write_file(root: &Path, relative: &str, contents: &str) {
    let path = root.join(relative);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, contents).unwrap();
}

#[test]
fn test_squash_folder_to_folder() {
    let source = tempfile::tempdir().unwrap();
    write_file(source.path(), "src/main.rs", "fn main() {}\n");
    write_file(source.path(), "src/lib.rs", "pub fn lib() {}\n");
    write_file(source.path(), "secrets/key.pem", "private\n");
    let target = tempfile::tempdir().unwrap();

    let mut workflow = Workflow::new(
        "folder-import",
        WorkflowMode::Squash,
        Box::new(FolderOrigin::new(source.path())),
        Box::new(FolderDestination::new(target.path())),
        Authoring::use_default(default_author()),
    );
    workflow.set_origin_files(FileGlob::new(["src/**"], [] as [&str; 0]).unwrap());
    let console = TestConsole::new();

    workflow.run("", &console).unwrap();

    assert_eq!(
        file_util::list_tree(target.path()).unwrap(),
        [".copybara/metadata.json", "src/lib.rs", "src/main.rs"]
    );
    let sidecar = fs::read_to_string(target.path().join(".copybara/metadata.json")).unwrap();
    assert!(sidecar.contains("Project import generated by Copybara."));
    assert!(sidecar.contains("Copybara <copybara@example.com>"));
}

#[test]
fn test_squash_folder_overwrites_previous_import() {
    let source = tempfile::tempdir().unwrap();
    write_file(source.path(), "a.txt", "v2\n");
    let target = tempfile::tempdir().unwrap();
    write_file(target.path(), "stale.txt", "v1\n");

    let workflow = Workflow::new(
        "folder-import",
        WorkflowMode::Squash,
        Box::new(FolderOrigin::new(source.path())),
        Box::new(FolderDestination::new(target.path())),
        Authoring::use_default(default_author()),
    );
    let console = TestConsole::new();

    workflow.run("", &console).unwrap();

    assert_eq!(
        file_util::list_tree(target.path()).unwrap(),
        [".copybara/metadata.json", "a.txt"]
    );
}

#[test]
fn test_change_request_rejects_folder_destination() {
    let source = tempfile::tempdir().unwrap();
    write_file(source.path(), "a.txt", "a\n");
    let target = tempfile::tempdir().unwrap();

    let workflow = Workflow::new(
        "folder-import",
        WorkflowMode::ChangeRequest,
        Box::new(FolderOrigin::new(source.path())),
        Box::new(FolderDestination::new(target.path())),
        Authoring::use_default(default_author()),
    );
    let console = TestConsole::new();

    let result = workflow.run("", &console);
    assert_matches!(
        result,
        Err(MigrationError::Validation(message))
            if message.contains("folder.destination")
                && message.contains("incompatible with CHANGE_REQUEST")
    );
}

#[test]
fn test_iterative_rejects_folder_endpoints() {
    let source = tempfile::tempdir().unwrap();
    write_file(source.path(), "a.txt", "a\n");
    let target = tempfile::tempdir().unwrap();

    let workflow = Workflow::new(
        "folder-import",
        WorkflowMode::Iterative,
        Box::new(FolderOrigin::new(source.path())),
        Box::new(FolderDestination::new(target.path())),
        Authoring::use_default(default_author()),
    );
    let console = TestConsole::new();

    // The folder destination has no previous-revision record to iterate
    // from.
    let result = workflow.run("", &console);
    assert_matches!(
        result,
        Err(MigrationError::Validation(message)) if message.contains("--force")
    );
}

#[test]
fn test_squash_empty_folder_origin() {
    let source = tempfile::tempdir().unwrap();
    let target = tempfile::tempdir().unwrap();

    let workflow = Workflow::new(
        "folder-import",
        WorkflowMode::Squash,
        Box::new(FolderOrigin::new(source.path())),
        Box::new(FolderDestination::new(target.path())),
        Authoring::use_default(default_author()),
    );
    let console = TestConsole::new();

    let result = workflow.run("", &console);
    assert_matches!(
        result,
        Err(MigrationError::Validation(message)) if message.contains("empty")
    );
}
