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

//! Include/exclude file-pattern filter applied to change file lists and
//! checked-out trees.

use std::fmt;

use globset::GlobBuilder;
use globset::GlobSet;
use globset::GlobSetBuilder;

use crate::error::MigrationError;
use crate::error::MigrationResult;

/// A set of include patterns minus a set of exclude patterns, matched
/// against slash-separated repo-relative paths.
#[derive(Clone)]
pub struct FileGlob {
    include: GlobSet,
    exclude: GlobSet,
    include_patterns: Vec<String>,
    exclude_patterns: Vec<String>,
}

impl FileGlob {
    /// A glob matching every path.
    pub fn all_files() -> Self {
        Self::new(["**"], [] as [&str; 0]).expect("the universal glob should be valid")
    }

    pub fn new(
        include: impl IntoIterator<Item = impl Into<String>>,
        exclude: impl IntoIterator<Item = impl Into<String>>,
    ) -> MigrationResult<Self> {
        let include_patterns: Vec<String> = include.into_iter().map(|glob| glob.into()).collect();
        let exclude_patterns: Vec<String> = exclude.into_iter().map(|glob| glob.into()).collect();
        Ok(Self {
            include: build_set(&include_patterns)?,
            exclude: build_set(&exclude_patterns)?,
            include_patterns,
            exclude_patterns,
        })
    }

    /// Whether the repo-relative `path` is included by this glob.
    pub fn matches(&self, path: &str) -> bool {
        self.include.is_match(path) && !self.exclude.is_match(path)
    }

    pub fn include_patterns(&self) -> &[String] {
        &self.include_patterns
    }

    pub fn exclude_patterns(&self) -> &[String] {
        &self.exclude_patterns
    }
}

fn build_set(patterns: &[String]) -> MigrationResult<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let glob = GlobBuilder::new(pattern)
            .literal_separator(true)
            .build()
            .map_err(|err| {
                MigrationError::Validation(format!("Invalid glob pattern '{pattern}': {err}"))
            })?;
        builder.add(glob);
    }
    builder.build().map_err(|err| {
        MigrationError::Validation(format!("Cannot compile glob patterns: {err}"))
    })
}

impl fmt::Debug for FileGlob {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FileGlob")
            .field("include", &self.include_patterns)
            .field("exclude", &self.exclude_patterns)
            .finish()
    }
}

impl fmt::Display for FileGlob {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "glob(include = {:?}", self.include_patterns)?;
        if !self.exclude_patterns.is_empty() {
            write!(f, ", exclude = {:?}", self.exclude_patterns)?;
        }
        write!(f, ")")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_files() {
        let glob = FileGlob::all_files();
        assert!(glob.matches("a.txt"));
        assert!(glob.matches("deep/nested/dir/b.rs"));
    }

    #[test]
    fn test_include_exclude() {
        let glob = FileGlob::new(["src/**"], ["src/**/*_test.cc"]).unwrap();
        assert!(glob.matches("src/lib/foo.cc"));
        assert!(!glob.matches("src/lib/foo_test.cc"));
        assert!(!glob.matches("docs/readme.md"));
    }

    #[test]
    fn test_literal_separator() {
        // A single star must not cross directory boundaries.
        let glob = FileGlob::new(["src/*.cc"], [] as [&str; 0]).unwrap();
        assert!(glob.matches("src/foo.cc"));
        assert!(!glob.matches("src/sub/foo.cc"));
    }

    #[test]
    fn test_invalid_pattern_is_validation_error() {
        let result = FileGlob::new(["src/{unclosed"], [] as [&str; 0]);
        assert!(matches!(result, Err(MigrationError::Validation(_))));
    }
}
