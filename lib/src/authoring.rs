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

//! Commit authorship and the policy deciding which upstream authors are
//! preserved in the destination.

use std::collections::HashSet;
use std::fmt;

/// The author of a change, rendered as `Name <email>`.
#[derive(Debug, PartialEq, Eq, Clone, Hash, serde::Serialize)]
pub struct Author {
    name: String,
    email: String,
}

impl Author {
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
        }
    }

    /// Parses an author from its `Name <email>` rendering. Input that doesn't
    /// follow that shape is kept whole as the name, with an empty email.
    pub fn parse(value: &str) -> Self {
        let value = value.trim();
        match (value.find('<'), value.rfind('>')) {
            (Some(open), Some(close)) if open < close => Self {
                name: value[..open].trim().to_owned(),
                email: value[open + 1..close].trim().to_owned(),
            },
            _ => Self {
                name: value.to_owned(),
                email: String::new(),
            },
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn email(&self) -> &str {
        &self.email
    }
}

impl fmt::Display for Author {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} <{}>", self.name, self.email)
    }
}

/// How upstream authors map to destination authors.
#[derive(Debug, Clone)]
pub enum AuthoringMode {
    /// Every upstream author is preserved as-is.
    PassThru,
    /// Every commit is attributed to the default author.
    UseDefault,
    /// Only the listed emails are preserved; everyone else becomes the
    /// default author.
    Allowed(HashSet<String>),
}

/// Authoring policy for a migration: a default author plus the mapping mode
/// applied per commit.
#[derive(Debug, Clone)]
pub struct Authoring {
    default_author: Author,
    mode: AuthoringMode,
}

impl Authoring {
    pub fn new(default_author: Author, mode: AuthoringMode) -> Self {
        Self {
            default_author,
            mode,
        }
    }

    pub fn pass_thru(default_author: Author) -> Self {
        Self::new(default_author, AuthoringMode::PassThru)
    }

    pub fn use_default(default_author: Author) -> Self {
        Self::new(default_author, AuthoringMode::UseDefault)
    }

    pub fn allowed(
        default_author: Author,
        emails: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        let emails = emails.into_iter().map(|email| email.into()).collect();
        Self::new(default_author, AuthoringMode::Allowed(emails))
    }

    pub fn default_author(&self) -> &Author {
        &self.default_author
    }

    /// Whether `author` may be recorded in the destination.
    pub fn allows(&self, author: &Author) -> bool {
        match &self.mode {
            AuthoringMode::PassThru => true,
            AuthoringMode::UseDefault => false,
            AuthoringMode::Allowed(emails) => emails.contains(author.email()),
        }
    }

    /// The author to stamp on the destination commit for a change authored
    /// upstream by `author`.
    pub fn resolve(&self, author: &Author) -> Author {
        if self.allows(author) {
            author.clone()
        } else {
            self.default_author.clone()
        }
    }
}
