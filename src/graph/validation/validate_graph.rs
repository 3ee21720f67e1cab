// License: MIT
// Copyright © 2024 Frequenz Energy-as-a-Service GmbH

//! Methods for validating the acyclicity of a [`PowerGraph`][crate::PowerGraph].

use std::collections::BTreeSet;

use petgraph::graph::NodeIndex;

use crate::Error;

use super::PowerGraphValidator;

impl PowerGraphValidator<'_> {
    /// Validates that there are no cycles in the graph.
    ///
    /// Every node other than a load has a single upstream node, and loads
    /// can't supply anything, so a cycle can only be closed through the
    /// `f0` links of regulators and resistors.  Those are followed from
    /// every node until the input is reached.  If a node is seen twice, an
    /// error is returned, that lists the nodes in the cycle in supply order.
    pub(super) fn validate_acyclicity(&self) -> Result<(), Error> {
        let mut acyclic = BTreeSet::new();
        for start in self.pg.graph.node_indices() {
            let mut path: Vec<NodeIndex> = vec![];
            let mut cursor = Some(start);
            while let Some(index) = cursor {
                if acyclic.contains(&index) {
                    break;
                }
                if let Some(first_occurance) = path.iter().position(|i| *i == index) {
                    let mut cycle = path[first_occurance..]
                        .iter()
                        .map(|i| self.pg.graph[*i].name.as_str())
                        .collect::<Vec<_>>();
                    cycle.push(self.pg.graph[index].name.as_str());
                    cycle.reverse();
                    return Err(Error::invalid_graph(format!(
                        "Cycle detected: {}",
                        cycle.join(" -> ")
                    )));
                }
                path.push(index);
                cursor = self.pg.graph[index].upstream(0);
            }
            acyclic.extend(path);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::graph::test_utils::BoardBuilder;
    use crate::{BudgetConfig, Error, PowerGraph};

    fn builder() -> BoardBuilder {
        let mut builder = BoardBuilder::new(5.0);
        builder
            .switching("SR1", "IN", 3.3, 0.9)
            .linear("LR1", "SR1", 1.8, 0.001)
            .resistor("RS1", "LR1", 0.2)
            .load("LD1", &[("RS1", 0.1)])
            .load("LD2", &[("SR1", 0.2), ("IN", 0.1)]);
        builder
    }

    fn try_build(builder: &BoardBuilder) -> Result<PowerGraph, Error> {
        PowerGraph::from_document(&builder.document(), BudgetConfig::default())
    }

    #[test]
    fn test_acyclicity_validation() {
        assert!(try_build(&builder()).is_ok());

        let mut cyclic = builder();
        cyclic.linear("LR2", "LR3", 3.3, 0.0).linear("LR3", "LR2", 3.3, 0.0);
        assert!(try_build(&cyclic)
            .is_err_and(|e| e == Error::invalid_graph("Cycle detected: LR2 -> LR3 -> LR2")));

        let mut cyclic = builder();
        cyclic
            .switching("SR7", "SR9", 3.3, 0.9)
            .switching("SR8", "SR7", 3.3, 0.9)
            .switching("SR9", "SR8", 3.3, 0.9)
            .load("LD3", &[("SR8", 0.1)]);
        assert!(try_build(&cyclic).is_err_and(
            |e| e == Error::invalid_graph("Cycle detected: SR7 -> SR8 -> SR9 -> SR7")
        ));

        // a chain hanging below a cycle reports the cycle itself
        let mut cyclic = builder();
        cyclic
            .resistor("RS5", "RS6", 0.1)
            .resistor("RS6", "RS5", 0.1)
            .linear("LR5", "RS6", 3.3, 0.0);
        assert!(try_build(&cyclic)
            .is_err_and(|e| e == Error::invalid_graph("Cycle detected: RS5 -> RS6 -> RS5")));
    }
}
