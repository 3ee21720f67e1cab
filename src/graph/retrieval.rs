// License: MIT
// Copyright © 2024 Frequenz Energy-as-a-Service GmbH

//! Methods for retrieving nodes and their neighbors from a [`PowerGraph`].

use petgraph::graph::NodeIndex;

use crate::iterators::{Downstream, Nodes};
use crate::{BudgetConfig, Error, PowerGraph, PowerNode};

/// `PowerNode` retrieval.
impl PowerGraph {
    /// Returns the node with the given name, if it exists.  Names are matched
    /// case-insensitively.
    pub fn node(&self, name: &str) -> Result<&PowerNode, Error> {
        self.index_of(name).map(|i| &self.graph[i])
    }

    /// Returns an iterator over the nodes in the graph, in configuration
    /// order.
    pub fn nodes(&self) -> Nodes<'_> {
        Nodes {
            iter: self.graph.raw_nodes().iter(),
        }
    }

    /// Returns the input node, the root of the graph.
    pub fn input(&self) -> &PowerNode {
        &self.graph[self.input]
    }

    /// Returns the node feeding the given input slot of the named node, or
    /// `None` if the slot is not connected.
    ///
    /// Returns an error if the named node does not exist.
    pub fn upstream(&self, name: &str, slot: usize) -> Result<Option<&PowerNode>, Error> {
        let index = self.index_of(name)?;
        Ok(self.graph[index].upstream(slot).map(|i| &self.graph[i]))
    }

    /// Returns an iterator over the nodes supplied by the named node.
    ///
    /// Returns an error if the named node does not exist.
    pub fn downstream(&self, name: &str) -> Result<Downstream<'_>, Error> {
        let index = self.index_of(name)?;
        Ok(Downstream {
            graph: &self.graph,
            iter: self.graph[index].outputs.iter(),
        })
    }

    /// Returns the configuration the graph was built with.
    pub fn config(&self) -> &BudgetConfig {
        &self.config
    }

    fn index_of(&self, name: &str) -> Result<NodeIndex, Error> {
        self.node_indices
            .get(&name.to_ascii_lowercase())
            .copied()
            .ok_or_else(|| Error::node_not_found(format!("Node {name} not found.")))
    }
}
