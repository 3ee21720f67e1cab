// License: MIT
// Copyright © 2024 Frequenz Energy-as-a-Service GmbH

//! Helper methods for checking invariants of a [`PowerGraph`][crate::PowerGraph].

use petgraph::graph::NodeIndex;

use crate::Error;

use super::PowerGraphValidator;

impl PowerGraphValidator<'_> {
    /// Checks that the given node is *not* a leaf node.
    pub(super) fn ensure_not_leaf(&self, node: NodeIndex) -> Result<(), Error> {
        if self.pg.graph[node].outputs.is_empty() {
            return Err(Error::invalid_graph(format!(
                "{} must supply at least one node.",
                self.describe(node)
            )));
        }
        Ok(())
    }
}
