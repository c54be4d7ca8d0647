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

//! History-less endpoints backed by plain directories.
//!
//! A folder origin is a snapshot: it resolves and checks out, but has no
//! history to enumerate. A folder destination materializes the transformed
//! tree on disk with a JSON metadata sidecar; it cannot report a previous
//! imported revision, so change-request workflows reject it.

use std::fs;
use std::path::Path;
use std::path::PathBuf;

use crate::change::Change;
use crate::change::Metadata;
use crate::destination::Destination;
use crate::destination::WriteRequest;
use crate::destination::WriterResult;
use crate::error::MigrationError;
use crate::error::MigrationResult;
use crate::file_util;
use crate::glob::FileGlob;
use crate::origin::ChangeVisitor;
use crate::origin::ChangesResponse;
use crate::origin::Origin;
use crate::revision::Revision;

/// Directory the destination's metadata sidecar lives in.
const METADATA_DIR: &str = ".copybara";
const METADATA_FILE: &str = ".copybara/metadata.json";

/// An origin reading a directory snapshot from the local filesystem.
pub struct FolderOrigin {
    root: PathBuf,
}

impl FolderOrigin {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn no_history<T>(&self) -> MigrationResult<T> {
        Err(MigrationError::Validation(format!(
            "'{}' does not support looking at the history",
            self.name()
        )))
    }
}

impl Origin for FolderOrigin {
    fn name(&self) -> &str {
        "folder.origin"
    }

    fn label_name(&self) -> &str {
        "FolderOrigin-RevId"
    }

    fn resolve(&self, reference: &str) -> MigrationResult<Revision> {
        let path = if reference.is_empty() {
            self.root.clone()
        } else {
            PathBuf::from(reference)
        };
        let canonical = path.canonicalize().map_err(|err| {
            MigrationError::UnresolvableRevision(format!(
                "'{}' is not an existing directory: {err}",
                path.display()
            ))
        })?;
        Ok(Revision::new(canonical.to_string_lossy()))
    }

    fn checkout(&self, revision: &Revision, work_dir: &Path) -> MigrationResult<()> {
        let source = Path::new(revision.as_str());
        file_util::clear_dir(work_dir)?;
        let copied = file_util::copy_tree(source, work_dir, &FileGlob::all_files())?;
        if copied == 0 {
            return Err(MigrationError::Validation(
                "Origin repository is empty".to_owned(),
            ));
        }
        Ok(())
    }

    fn changes(
        &self,
        _from: Option<&Revision>,
        _to: &Revision,
    ) -> MigrationResult<ChangesResponse> {
        self.no_history()
    }

    fn change(&self, _revision: &Revision) -> MigrationResult<Change> {
        self.no_history()
    }

    fn visit_changes(
        &self,
        _start: &Revision,
        _visitor: &mut ChangeVisitor<'_>,
    ) -> MigrationResult<()> {
        self.no_history()
    }

    fn supports_history(&self) -> bool {
        false
    }
}

/// Everything the folder destination records next to the written tree.
#[derive(serde::Serialize)]
struct SidecarMetadata<'a> {
    message: &'a str,
    author: String,
    revision: &'a Revision,
    workflow_identity: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    baseline: Option<&'a str>,
}

/// A destination writing the transformed tree into a local directory.
pub struct FolderDestination {
    root: PathBuf,
}

impl FolderDestination {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn write_sidecar(&self, request: &WriteRequest<'_>) -> MigrationResult<()> {
        let metadata: &Metadata = request.metadata;
        let sidecar = SidecarMetadata {
            message: metadata.message(),
            author: metadata.author().to_string(),
            revision: request.current_rev,
            workflow_identity: request.workflow_identity,
            baseline: request.baseline,
        };
        let contents = serde_json::to_vec_pretty(&sidecar).map_err(|err| {
            MigrationError::repo_with_source("Cannot serialize metadata", err)
        })?;
        fs::create_dir_all(self.root.join(METADATA_DIR))?;
        fs::write(self.root.join(METADATA_FILE), contents)?;
        Ok(())
    }
}

impl Destination for FolderDestination {
    fn name(&self) -> &str {
        "folder.destination"
    }

    fn label_name_when_origin(&self) -> String {
        "FolderOrigin-RevId".to_owned()
    }

    fn supports_previous_ref(&self) -> bool {
        false
    }

    fn last_imported(&self, _label: &str) -> MigrationResult<Option<Revision>> {
        Ok(None)
    }

    fn write(&self, request: &WriteRequest<'_>) -> MigrationResult<WriterResult> {
        fs::create_dir_all(&self.root)?;
        file_util::clear_dir(&self.root)?;
        file_util::copy_tree(request.tree, &self.root, &FileGlob::all_files())?;
        self.write_sidecar(request)?;
        tracing::info!(root = %self.root.display(), "wrote tree to folder destination");
        Ok(WriterResult::Ok)
    }

    fn matches_tree(&self, tree: &Path) -> MigrationResult<Option<bool>> {
        if !self.root.is_dir() {
            return Ok(Some(false));
        }
        let existing: Vec<String> = file_util::list_tree(&self.root)?
            .into_iter()
            .filter(|file| !file.starts_with(METADATA_DIR))
            .collect();
        let incoming = file_util::list_tree(tree)?;
        if existing != incoming {
            return Ok(Some(false));
        }
        for file in &existing {
            if fs::read(self.root.join(file))? != fs::read(tree.join(file))? {
                return Ok(Some(false));
            }
        }
        Ok(Some(true))
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;
    use crate::authoring::Author;
    use crate::change::ComputedChanges;

    fn write_file(root: &Path, relative: &str, contents: &str) {
        let path = root.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, contents).unwrap();
    }

    #[test]
    fn test_folder_origin_resolve_and_checkout() {
        let source = tempfile::tempdir().unwrap();
        write_file(source.path(), "a.txt", "a");
        write_file(source.path(), "dir/b.txt", "b");

        let origin = FolderOrigin::new(source.path());
        let revision = origin.resolve("").unwrap();

        let work_dir = tempfile::tempdir().unwrap();
        write_file(work_dir.path(), "stale.txt", "stale");
        origin.checkout(&revision, work_dir.path()).unwrap();
        assert_eq!(
            file_util::list_tree(work_dir.path()).unwrap(),
            ["a.txt", "dir/b.txt"]
        );
    }

    #[test]
    fn test_folder_origin_empty_tree_is_rejected() {
        let source = tempfile::tempdir().unwrap();
        let origin = FolderOrigin::new(source.path());
        let revision = origin.resolve("").unwrap();
        let work_dir = tempfile::tempdir().unwrap();
        assert_matches!(
            origin.checkout(&revision, work_dir.path()),
            Err(MigrationError::Validation(message)) if message.contains("empty")
        );
    }

    #[test]
    fn test_folder_origin_has_no_history() {
        let source = tempfile::tempdir().unwrap();
        let origin = FolderOrigin::new(source.path());
        assert!(!origin.supports_history());
        let revision = Revision::new("whatever");
        assert_matches!(
            origin.changes(None, &revision),
            Err(MigrationError::Validation(_))
        );
    }

    #[test]
    fn test_folder_destination_write_and_match() {
        let tree = tempfile::tempdir().unwrap();
        write_file(tree.path(), "a.txt", "a");

        let target = tempfile::tempdir().unwrap();
        let destination = FolderDestination::new(target.path());
        let metadata = Metadata::new("Import\n", Author::new("Copybara", "cb@example.com"));
        let revision = Revision::new("rev1");
        let computed = ComputedChanges::default();
        let request = WriteRequest {
            tree: tree.path(),
            metadata: &metadata,
            current_rev: &revision,
            changes: &computed,
            baseline: None,
            workflow_identity: "test_0000",
        };
        assert_eq!(destination.write(&request).unwrap(), WriterResult::Ok);

        assert_eq!(
            file_util::list_tree(target.path()).unwrap(),
            [".copybara/metadata.json", "a.txt"]
        );
        let sidecar = fs::read_to_string(target.path().join(METADATA_FILE)).unwrap();
        assert!(sidecar.contains("rev1"));
        assert_eq!(destination.matches_tree(tree.path()).unwrap(), Some(true));

        write_file(tree.path(), "b.txt", "b");
        assert_eq!(destination.matches_tree(tree.path()).unwrap(), Some(false));
    }
}
