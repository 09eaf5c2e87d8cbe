//! Traversal orders over a [`ReferenceGraph`]
//!
//! Both iterators borrow the graph immutably and keep their own stack, so
//! any number of traversals can run over the same tree.

use super::{NodeId, ReferenceGraph};

/// Pre-order: a node, then each of its children in document order
pub struct TopDown<'g> {
    graph: &'g ReferenceGraph,
    stack: Vec<NodeId>,
}

impl Iterator for TopDown<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let id = self.stack.pop()?;
        self.stack.extend(self.graph.node(id).children().iter().rev());
        Some(id)
    }
}

/// Post-order: every child subtree before the node itself
pub struct BottomUp<'g> {
    graph: &'g ReferenceGraph,
    // (node, children already pushed)
    stack: Vec<(NodeId, bool)>,
}

impl Iterator for BottomUp<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        while let Some((id, expanded)) = self.stack.pop() {
            if expanded {
                return Some(id);
            }
            self.stack.push((id, true));
            self.stack
                .extend(self.graph.node(id).children().iter().rev().map(|c| (*c, false)));
        }
        None
    }
}

impl ReferenceGraph {
    pub fn top_down(&self, start: NodeId) -> TopDown<'_> {
        TopDown {
            graph: self,
            stack: vec![start],
        }
    }

    /// Build order: dependencies are yielded before their dependents
    pub fn bottom_up(&self, start: NodeId) -> BottomUp<'_> {
        BottomUp {
            graph: self,
            stack: vec![(start, false)],
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;
    use crate::graph::tests::sample_graph;

    fn names(graph: &ReferenceGraph, ids: impl Iterator<Item = NodeId>) -> Vec<String> {
        ids.map(|id| graph[id].base_name()).collect()
    }

    #[test]
    fn test_top_down_order() {
        let graph = sample_graph();
        assert_eq!(names(&graph, graph.top_down(graph.root())), vec!["root", "a", "a_inc", "b"]);
    }

    #[test]
    fn test_bottom_up_order() {
        let graph = sample_graph();
        assert_eq!(names(&graph, graph.bottom_up(graph.root())), vec!["a_inc", "a", "b", "root"]);
    }

    #[test]
    fn test_bottom_up_children_before_parent() {
        let graph = sample_graph();
        let order: Vec<NodeId> = graph.bottom_up(graph.root()).collect();
        let position = |id: NodeId| order.iter().position(|x| *x == id).unwrap();

        assert_eq!(order.len(), graph.len());
        assert_eq!(order.iter().collect::<HashSet<_>>().len(), graph.len());
        for id in &order {
            for child in graph[*id].children() {
                assert!(position(*child) < position(*id));
            }
        }
    }

    #[test]
    fn test_traversal_of_subtree_is_restartable() {
        let graph = sample_graph();
        let a = graph[graph.root()].children()[0];
        let first: Vec<_> = graph.bottom_up(a).collect();
        let second: Vec<_> = graph.bottom_up(a).collect();
        assert_eq!(first, second);
        assert_eq!(names(&graph, first.into_iter()), vec!["a_inc", "a"]);
    }
}
