// License: MIT
// Copyright © 2024 Frequenz Energy-as-a-Service GmbH

//! Iterators over the nodes of a `PowerGraph`.

use petgraph::graph::{DiGraph, NodeIndex};

use crate::PowerNode;

/// An iterator over the nodes in a `PowerGraph`, in configuration order.
pub struct Nodes<'a> {
    pub(crate) iter: std::slice::Iter<'a, petgraph::graph::Node<PowerNode>>,
}

impl<'a> Iterator for Nodes<'a> {
    type Item = &'a PowerNode;

    fn next(&mut self) -> Option<Self::Item> {
        self.iter.next().map(|n| &n.weight)
    }
}

/// An iterator over the nodes supplied by a node in a `PowerGraph`, in link
/// order.
///
/// A load that draws from the same node on several inputs is returned once
/// per input.
pub struct Downstream<'a> {
    pub(crate) graph: &'a DiGraph<PowerNode, usize>,
    pub(crate) iter: std::slice::Iter<'a, NodeIndex>,
}

impl<'a> Iterator for Downstream<'a> {
    type Item = &'a PowerNode;

    fn next(&mut self) -> Option<Self::Item> {
        self.iter.next().map(|i| &self.graph[*i])
    }
}
