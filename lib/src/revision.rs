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

#![expect(missing_docs)]

use std::fmt;
use std::fmt::Debug;

/// An immutable commit-like identifier in a version-control system.
///
/// The identifier is opaque to the migration core; two revisions compare
/// equal iff their canonical string forms are equal.
#[derive(PartialEq, Eq, PartialOrd, Ord, Clone, Hash)]
pub struct Revision(String);

impl Revision {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// The canonical string form of this revision.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Debug for Revision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> Result<(), fmt::Error> {
        f.debug_tuple("Revision").field(&self.0).finish()
    }
}

impl fmt::Display for Revision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> Result<(), fmt::Error> {
        f.pad(&self.0)
    }
}

impl From<&str> for Revision {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl serde::Serialize for Revision {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        self.0.serialize(serializer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_revision() {
        let rev = Revision::new("deadbeef0123");
        assert_eq!(format!("{rev}"), "deadbeef0123");
        assert_eq!(format!("{rev:.6}"), "deadbe");
    }

    #[test]
    fn test_revision_equality_is_canonical_form() {
        assert_eq!(Revision::new("abc"), Revision::from("abc"));
        assert_ne!(Revision::new("abc"), Revision::new("abd"));
    }
}
