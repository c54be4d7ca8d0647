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

//! Filesystem helpers for materializing and copying trees.

use std::fs;
use std::path::Path;
use std::path::PathBuf;

use crate::error::MigrationError;
use crate::error::MigrationResult;
use crate::glob::FileGlob;

/// Deletes everything inside `dir`, keeping the directory itself.
pub fn clear_dir(dir: &Path) -> MigrationResult<()> {
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        if entry.file_type()?.is_dir() {
            fs::remove_dir_all(entry.path())?;
        } else {
            fs::remove_file(entry.path())?;
        }
    }
    Ok(())
}

/// Copies the files under `src` matching `glob` into `dst`, preserving the
/// directory layout. Returns the number of files copied.
pub fn copy_tree(src: &Path, dst: &Path, glob: &FileGlob) -> MigrationResult<usize> {
    let mut copied = 0;
    for relative in list_tree(src)? {
        if !glob.matches(&relative) {
            continue;
        }
        let target = dst.join(&relative);
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::copy(src.join(&relative), target)?;
        copied += 1;
    }
    Ok(copied)
}

/// Lists the files under `dir` as sorted slash-separated relative paths.
pub fn list_tree(dir: &Path) -> MigrationResult<Vec<String>> {
    let mut files = vec![];
    let mut pending: Vec<PathBuf> = vec![dir.to_owned()];
    while let Some(current) = pending.pop() {
        for entry in fs::read_dir(&current)? {
            let entry = entry?;
            let path = entry.path();
            if entry.file_type()?.is_dir() {
                pending.push(path);
            } else {
                files.push(relative_slash_path(dir, &path)?);
            }
        }
    }
    files.sort();
    Ok(files)
}

/// Removes directories under `dir` that no longer contain any file, keeping
/// `dir` itself.
pub fn remove_empty_dirs(dir: &Path) -> MigrationResult<()> {
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        if entry.file_type()?.is_dir() {
            let path = entry.path();
            remove_empty_dirs(&path)?;
            if fs::read_dir(&path)?.next().is_none() {
                fs::remove_dir(&path)?;
            }
        }
    }
    Ok(())
}

/// The path of `file` relative to `root`, slash-separated.
pub fn relative_slash_path(root: &Path, file: &Path) -> MigrationResult<String> {
    let relative = file.strip_prefix(root).map_err(|_| {
        MigrationError::repo(format!(
            "Path {} is not under {}",
            file.display(),
            root.display()
        ))
    })?;
    let components: Vec<_> = relative
        .components()
        .map(|component| component.as_os_str().to_string_lossy())
        .collect();
    Ok(components.join("/"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_file(root: &Path, relative: &str, contents: &str) {
        let path = root.join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, contents).unwrap();
    }

    #[test]
    fn test_list_and_copy_tree() {
        let src = tempfile::tempdir().unwrap();
        let dst = tempfile::tempdir().unwrap();
        write_file(src.path(), "a.txt", "a");
        write_file(src.path(), "dir/b.txt", "b");
        write_file(src.path(), "dir/skip.bin", "x");

        assert_eq!(
            list_tree(src.path()).unwrap(),
            ["a.txt", "dir/b.txt", "dir/skip.bin"]
        );

        let glob = FileGlob::new(["**/*.txt", "*.txt"], [] as [&str; 0]).unwrap();
        let copied = copy_tree(src.path(), dst.path(), &glob).unwrap();
        assert_eq!(copied, 2);
        assert_eq!(list_tree(dst.path()).unwrap(), ["a.txt", "dir/b.txt"]);
    }

    #[test]
    fn test_clear_dir() {
        let dir = tempfile::tempdir().unwrap();
        write_file(dir.path(), "a.txt", "a");
        write_file(dir.path(), "dir/b.txt", "b");
        clear_dir(dir.path()).unwrap();
        assert!(list_tree(dir.path()).unwrap().is_empty());
        assert!(dir.path().exists());
    }
}
