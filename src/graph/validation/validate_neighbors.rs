// License: MIT
// Copyright © 2024 Frequenz Energy-as-a-Service GmbH

//! Methods for validating that all nodes in a [`PowerGraph`][crate::PowerGraph]
//! are connected sensibly.

use crate::{Error, NodeKind};

use super::PowerGraphValidator;

impl PowerGraphValidator<'_> {
    /// Validates that the input node supplies at least one node.
    pub(super) fn validate_input(&self) -> Result<(), Error> {
        self.ensure_not_leaf(self.input)
    }

    /// Logs a warning for every regulator or series resistor that doesn't
    /// supply anything.  Such nodes are legal, but only their own quiescent
    /// draw reaches the input.
    pub(super) fn warn_dangling(&self) {
        for node in self.pg.nodes() {
            if (node.kind.is_regulator() || node.kind == NodeKind::SeriesResistor)
                && node.outputs.is_empty()
            {
                tracing::warn!("{}:{} doesn't supply any node.", node.kind, node.name);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::graph::test_utils::BoardBuilder;
    use crate::{BudgetConfig, Error, NodeKind, PowerGraph, PowerNode};

    #[test]
    fn test_dangling_nodes_are_legal() {
        let mut builder = BoardBuilder::new(5.0);
        builder
            .load("LD1", &[("IN", 0.1)])
            .linear("LR1", "IN", 3.3, 0.002)
            .resistor("RS1", "LR1", 0.5);
        assert!(
            PowerGraph::from_document(&builder.document(), BudgetConfig::default()).is_ok()
        );
    }

    #[test]
    fn test_input_must_supply() -> Result<(), Error> {
        // a graph can only be built without loads when bypassing the parser
        let mut board = PowerNode::new("BOARD", NodeKind::Board);
        board.label = "Test".into();
        let mut input = PowerNode::new("IN", NodeKind::Input);
        input.output_voltage = 5.0;

        assert!(
            PowerGraph::try_new(vec![board, input], BudgetConfig::default()).is_err_and(
                |e| e == Error::invalid_graph("Input:IN must supply at least one node.")
            )
        );

        Ok(())
    }
}
