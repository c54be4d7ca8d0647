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

//! Directed acyclic graph of changes, edges pointing from child to parent.

use std::collections::HashMap;
use std::collections::VecDeque;

use crate::change::Change;
use crate::revision::Revision;

/// Accumulates changes and finalizes them into an immutable [`ChangeGraph`].
///
/// The input listing is expected child-first (as VCS log output is);
/// edges are resolved when the graph is built, so insertion order doesn't
/// affect which edges exist.
#[derive(Debug, Default)]
pub struct ChangeGraphBuilder {
    nodes: Vec<Change>,
    index: HashMap<Revision, usize>,
}

impl ChangeGraphBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a change as a graph node. A revision already present is ignored;
    /// a merge reachable along two paths is still one node.
    pub fn add_change(&mut self, change: Change) {
        if self.index.contains_key(change.revision()) {
            return;
        }
        self.index.insert(change.revision().clone(), self.nodes.len());
        self.nodes.push(change);
    }

    /// Finalizes the graph. Edges whose parent is outside the node set are
    /// dropped, keeping the graph closed under its members; self-loops are
    /// rejected the same way.
    pub fn build(self) -> ChangeGraph {
        let Self { nodes, index } = self;
        let parents = nodes
            .iter()
            .enumerate()
            .map(|(child, change)| {
                let mut parent_ixs = Vec::with_capacity(change.parents().len());
                for parent in change.parents() {
                    match index.get(parent) {
                        Some(&ix) if ix != child && !parent_ixs.contains(&ix) => {
                            parent_ixs.push(ix);
                        }
                        _ => {}
                    }
                }
                parent_ixs
            })
            .collect();
        ChangeGraph {
            nodes,
            index,
            parents,
        }
    }
}

/// An immutable DAG of changes. Nodes are changes; edges point from child to
/// parent, preserving the VCS's parent order.
#[derive(Debug)]
pub struct ChangeGraph {
    nodes: Vec<Change>,
    index: HashMap<Revision, usize>,
    /// Per-node parent indices, first-parent first.
    parents: Vec<Vec<usize>>,
}

impl ChangeGraph {
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn contains(&self, revision: &Revision) -> bool {
        self.index.contains_key(revision)
    }

    /// The nodes in insertion order (child-first for VCS log input).
    pub fn nodes(&self) -> &[Change] {
        &self.nodes
    }

    pub fn get(&self, revision: &Revision) -> Option<&Change> {
        self.index.get(revision).map(|&ix| &self.nodes[ix])
    }

    /// In-graph parents of `revision`, in VCS parent order.
    pub fn parents_of<'a>(&'a self, revision: &Revision) -> impl Iterator<Item = &'a Change> {
        let ixs: &[usize] = match self.index.get(revision) {
            Some(&ix) => &self.parents[ix],
            None => &[],
        };
        ixs.iter().map(|&ix| &self.nodes[ix])
    }

    /// Flattens the graph into ancestor-first order: every change appears
    /// after all of its in-graph parents. Ties resolve toward the input's
    /// reverse insertion order, so a linear child-first listing comes out
    /// oldest first.
    pub fn linearize(&self) -> Vec<Change> {
        let mut blocking_parents: Vec<usize> = vec![0; self.nodes.len()];
        let mut children: Vec<Vec<usize>> = vec![vec![]; self.nodes.len()];
        for (child, parent_ixs) in self.parents.iter().enumerate() {
            blocking_parents[child] = parent_ixs.len();
            for &parent in parent_ixs {
                children[parent].push(child);
            }
        }
        let mut queue: VecDeque<usize> = (0..self.nodes.len())
            .rev()
            .filter(|&ix| blocking_parents[ix] == 0)
            .collect();
        let mut ordered = Vec::with_capacity(self.nodes.len());
        while let Some(ix) = queue.pop_front() {
            ordered.push(self.nodes[ix].clone());
            for &child in &children[ix] {
                blocking_parents[child] -= 1;
                if blocking_parents[child] == 0 {
                    queue.push_back(child);
                }
            }
        }
        debug_assert_eq!(ordered.len(), self.nodes.len());
        ordered
    }
}

#[cfg(test)]
mod tests {
    use chrono::DateTime;
    use chrono::FixedOffset;
    use chrono::TimeZone as _;
    use itertools::Itertools as _;

    use super::*;
    use crate::authoring::Author;

    fn timestamp() -> DateTime<FixedOffset> {
        FixedOffset::east_opt(0)
            .unwrap()
            .with_ymd_and_hms(2025, 1, 2, 3, 4, 5)
            .unwrap()
    }

    fn change(rev: &str, parents: &[&str]) -> Change {
        Change::new(
            Revision::new(rev),
            Author::new("Test", "test@example.com"),
            format!("change {rev}"),
            timestamp(),
        )
        .with_parents(parents.iter().map(|&p| Revision::new(p)))
    }

    fn revisions(changes: &[Change]) -> Vec<&str> {
        changes
            .iter()
            .map(|change| change.revision().as_str())
            .collect()
    }

    #[test]
    fn test_empty_graph() {
        let graph = ChangeGraphBuilder::new().build();
        assert!(graph.is_empty());
        assert!(graph.linearize().is_empty());
    }

    #[test]
    fn test_linearize_linear_history() {
        // VCS log output is child-first: C, B, A.
        let mut builder = ChangeGraphBuilder::new();
        builder.add_change(change("c", &["b"]));
        builder.add_change(change("b", &["a"]));
        builder.add_change(change("a", &[]));
        let graph = builder.build();
        assert_eq!(graph.len(), 3);
        assert_eq!(revisions(&graph.linearize()), ["a", "b", "c"]);
    }

    #[test]
    fn test_linearize_merge() {
        //   d
        //  / \
        // b   c
        //  \ /
        //   a
        let mut builder = ChangeGraphBuilder::new();
        builder.add_change(change("d", &["b", "c"]));
        builder.add_change(change("c", &["a"]));
        builder.add_change(change("b", &["a"]));
        builder.add_change(change("a", &[]));
        let graph = builder.build();
        let ordered = graph.linearize();
        let position = |rev: &str| {
            ordered
                .iter()
                .position(|change| change.revision().as_str() == rev)
                .unwrap()
        };
        assert_eq!(position("a"), 0);
        assert_eq!(position("d"), 3);
        assert!(position("b") < position("d"));
        assert!(position("c") < position("d"));
    }

    #[test]
    fn test_graph_closed_under_node_set() {
        // Parent "x" is outside the returned range and must be dropped.
        let mut builder = ChangeGraphBuilder::new();
        builder.add_change(change("b", &["a", "x"]));
        builder.add_change(change("a", &["x"]));
        let graph = builder.build();
        for node in graph.nodes() {
            for parent in graph.parents_of(node.revision()) {
                assert!(graph.contains(parent.revision()));
            }
        }
        assert_eq!(
            graph
                .parents_of(&Revision::new("b"))
                .map(|change| change.revision().as_str())
                .collect_vec(),
            ["a"]
        );
        assert_eq!(graph.parents_of(&Revision::new("a")).count(), 0);
    }

    #[test]
    fn test_self_loops_and_duplicates_rejected() {
        let mut builder = ChangeGraphBuilder::new();
        builder.add_change(change("a", &["a"]));
        builder.add_change(change("a", &[]));
        let graph = builder.build();
        assert_eq!(graph.len(), 1);
        assert_eq!(graph.parents_of(&Revision::new("a")).count(), 0);
    }
}
