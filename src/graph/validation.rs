// License: MIT
// Copyright © 2024 Frequenz Energy-as-a-Service GmbH

//! Methods for validating a [`PowerGraph`].

mod invariant_checks;
mod validate_graph;
mod validate_neighbors;

use petgraph::graph::NodeIndex;

use crate::{Error, PowerGraph};

pub(crate) struct PowerGraphValidator<'a> {
    pg: &'a PowerGraph,
    input: NodeIndex,
}

impl PowerGraphValidator<'_> {
    /// Formats a node for error messages, as `Kind:NAME`.
    fn describe(&self, index: NodeIndex) -> String {
        let node = &self.pg.graph[index];
        format!("{}:{}", node.kind, node.name)
    }
}

impl PowerGraph {
    /// Checks that the linked graph is a DAG, and that the input supplies
    /// something.
    ///
    /// Every node other than the input and the board has a linked `f0`, so
    /// once the `f0` links are known to be acyclic, every node reaches the
    /// input.
    pub(crate) fn validate(&self) -> Result<(), Error> {
        let validator = PowerGraphValidator {
            pg: self,
            input: self.input,
        };

        validator.validate_acyclicity()?;
        validator.validate_input()?;
        validator.warn_dangling();

        Ok(())
    }
}
