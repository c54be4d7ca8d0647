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

//! Seam for the transformation pipeline run between checkout and write.
//!
//! The concrete tree rewrites live outside the core; the engine only knows
//! how to hand a checked-out tree plus metadata to a pipeline and use
//! whatever comes back.

use std::path::Path;

use crate::change::ComputedChanges;
use crate::change::Metadata;
use crate::console::Console;
use crate::error::MigrationResult;

/// Mutable state a transformation may operate on: the checked-out tree on
/// disk and the metadata that will be stamped on the destination commit.
pub struct TransformContext<'a> {
    work_dir: &'a Path,
    metadata: Metadata,
    changes: &'a ComputedChanges,
    console: &'a dyn Console,
}

impl<'a> TransformContext<'a> {
    pub fn new(
        work_dir: &'a Path,
        metadata: Metadata,
        changes: &'a ComputedChanges,
        console: &'a dyn Console,
    ) -> Self {
        Self {
            work_dir,
            metadata,
            changes,
            console,
        }
    }

    pub fn work_dir(&self) -> &Path {
        self.work_dir
    }

    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    pub fn metadata_mut(&mut self) -> &mut Metadata {
        &mut self.metadata
    }

    pub fn changes(&self) -> &ComputedChanges {
        self.changes
    }

    pub fn console(&self) -> &dyn Console {
        self.console
    }

    pub fn into_metadata(self) -> Metadata {
        self.metadata
    }
}

/// A single step of the migration pipeline.
pub trait Transformation: Send + Sync {
    /// Short human description, for progress output.
    fn describe(&self) -> String;

    fn transform(&self, ctx: &mut TransformContext<'_>) -> MigrationResult<()>;
}

/// Runs a list of transformations in order.
#[derive(Default)]
pub struct Sequence {
    transformations: Vec<Box<dyn Transformation>>,
}

impl Sequence {
    pub fn new(transformations: Vec<Box<dyn Transformation>>) -> Self {
        Self { transformations }
    }

    /// The identity pipeline.
    pub fn empty() -> Self {
        Self::default()
    }
}

impl Transformation for Sequence {
    fn describe(&self) -> String {
        "sequence".to_owned()
    }

    fn transform(&self, ctx: &mut TransformContext<'_>) -> MigrationResult<()> {
        for (i, transformation) in self.transformations.iter().enumerate() {
            tracing::debug!(
                step = i + 1,
                total = self.transformations.len(),
                "running transformation: {}",
                transformation.describe()
            );
            transformation.transform(ctx)?;
        }
        Ok(())
    }
}
