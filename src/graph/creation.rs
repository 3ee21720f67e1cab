// License: MIT
// Copyright © 2024 Frequenz Energy-as-a-Service GmbH

//! Methods for creating [`PowerGraph`] instances from parsed nodes, by
//! resolving the upstream references between them.

use std::path::Path;

use petgraph::graph::{DiGraph, NodeIndex};

use crate::{parser, BudgetConfig, Document, Error, NodeKind, PowerNode, MAX_OUTPUTS};

use super::{NodeIndexMap, PowerGraph};

/// `PowerGraph` instantiation.
impl PowerGraph {
    /// Creates a new [`PowerGraph`] from the given nodes, linking every input
    /// slot to the node it names.
    ///
    /// Returns an error if a reference can't be resolved, or if the linked
    /// graph is invalid.
    pub fn try_new<NodeIterator: IntoIterator<Item = PowerNode>>(
        nodes: NodeIterator,
        config: BudgetConfig,
    ) -> Result<Self, Error> {
        let (graph, indices) = Self::create_graph(nodes)?;
        let input = Self::find_input(&graph)?;

        let mut pg = Self {
            graph,
            node_indices: indices,
            input,
            config,
        };
        pg.link_inputs()?;

        pg.validate()?;

        Ok(pg)
    }

    /// Parses the sections of the given document and links them into a
    /// [`PowerGraph`].
    pub fn from_document(document: &Document, config: BudgetConfig) -> Result<Self, Error> {
        let nodes = parser::parse_nodes(document, &config)?;
        Self::try_new(nodes, config)
    }

    /// Reads the INI file at the given path and links its sections into a
    /// [`PowerGraph`].
    pub fn load(path: impl AsRef<Path>, config: BudgetConfig) -> Result<Self, Error> {
        Self::from_document(&Document::load(path)?, config)
    }

    fn find_input(graph: &DiGraph<PowerNode, usize>) -> Result<NodeIndex, Error> {
        let of_kind =
            move |kind: NodeKind| graph.node_indices().filter(move |&i| graph[i].kind == kind);

        if of_kind(NodeKind::Board).nth(1).is_some() {
            return Err(Error::invalid_config("Only one BOARD section is allowed."));
        }

        let mut inputs = of_kind(NodeKind::Input);
        let input = inputs
            .next()
            .ok_or_else(|| Error::invalid_config("Missing IN section."))?;

        if inputs.next().is_some() {
            return Err(Error::invalid_config("Only one IN section is allowed."));
        }

        Ok(input)
    }

    fn create_graph(
        nodes: impl IntoIterator<Item = PowerNode>,
    ) -> Result<(DiGraph<PowerNode, usize>, NodeIndexMap), Error> {
        let mut graph = DiGraph::new();
        let mut indices = NodeIndexMap::new();

        for mut node in nodes {
            let key = node.name.to_ascii_lowercase();
            if indices.contains_key(&key) {
                return Err(Error::invalid_config(format!(
                    "Duplicate section name found: {}",
                    node.name
                )));
            }

            // links are rebuilt from the slot sources
            node.outputs.clear();
            for slot in node.inputs.iter_mut() {
                slot.from = None;
            }

            let idx = graph.add_node(node);
            indices.insert(key, idx);
        }

        Ok((graph, indices))
    }

    /// Resolves the `source` of every connected input slot, and records the
    /// reverse link in the `outputs` of the supplying node.
    fn link_inputs(&mut self) -> Result<(), Error> {
        for index in self.graph.node_indices() {
            let node = &self.graph[index];
            if !node.kind.requires_upstream() {
                continue;
            }
            if !node.inputs[0].is_connected() {
                return Err(Error::invalid_config(format!(
                    "Missing upstream node f0 in section {}.",
                    node.name
                )));
            }

            let name = node.name.clone();
            let sources = node
                .connected_inputs()
                .filter_map(|(slot, s)| s.source.clone().map(|source| (slot, source)))
                .collect::<Vec<_>>();

            for (slot, source) in sources {
                let from = self.resolve(&name, slot, &source)?;
                self.graph[index].inputs[slot].from = Some(from);
                self.graph[from].outputs.push(index);
                self.graph.add_edge(from, index, slot);
            }
        }

        Ok(())
    }

    fn resolve(&self, name: &str, slot: usize, source: &str) -> Result<NodeIndex, Error> {
        if source.eq_ignore_ascii_case(name) {
            return Err(Error::invalid_reference(format!(
                "{name}:f{slot} references the node itself."
            )));
        }

        let Some(&from) = self.node_indices.get(&source.to_ascii_lowercase()) else {
            return Err(Error::invalid_reference(format!(
                "{name}:f{slot} references {source}, which is not found."
            )));
        };

        let upstream = &self.graph[from];
        match upstream.kind {
            NodeKind::Load => {
                return Err(Error::invalid_reference(format!(
                    "{name}:f{slot} references {source}, but loads can't supply other nodes."
                )))
            }
            NodeKind::Board => {
                return Err(Error::invalid_reference(format!(
                    "{name}:f{slot} references {source}, but the board can't supply other nodes."
                )))
            }
            _ => {}
        }
        if upstream.outputs.len() >= MAX_OUTPUTS {
            return Err(Error::invalid_reference(format!(
                "{source} can't supply more than {MAX_OUTPUTS} nodes, {name} is one too many."
            )));
        }

        Ok(from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::test_utils::BoardBuilder;
    use crate::{ErrorKind, Section};

    fn linked(builder: &BoardBuilder) -> Result<PowerGraph, Error> {
        PowerGraph::from_document(&builder.document(), BudgetConfig::default())
    }

    #[test]
    fn test_node_validation() -> Result<(), Error> {
        let config = BudgetConfig::default();
        let mut builder = BoardBuilder::new(5.0);
        builder
            .switching("SR1", "IN", 3.3, 0.9)
            .load("LD1", &[("SR1", 0.1)]);
        let mut nodes = parser::parse_nodes(&builder.document(), &config)?;

        assert!(PowerGraph::try_new(nodes.clone(), config.clone()).is_ok());

        nodes.push(PowerNode::new("ld1", NodeKind::Load));
        assert!(PowerGraph::try_new(nodes.clone(), config.clone())
            .is_err_and(|e| e == Error::invalid_config("Duplicate section name found: ld1")));

        nodes.pop();
        nodes.push(PowerNode::new("In", NodeKind::Input));
        assert!(PowerGraph::try_new(nodes.clone(), config.clone())
            .is_err_and(|e| e == Error::invalid_config("Duplicate section name found: In")));

        nodes.pop();
        nodes.push(PowerNode::new("IN2", NodeKind::Input));
        assert!(PowerGraph::try_new(nodes.clone(), config.clone())
            .is_err_and(|e| e == Error::invalid_config("Only one IN section is allowed.")));

        nodes.pop();
        nodes.retain(|n| n.kind != NodeKind::Input);
        assert!(PowerGraph::try_new(nodes.clone(), config.clone())
            .is_err_and(|e| e == Error::invalid_config("Missing IN section.")));

        Ok(())
    }

    #[test]
    fn test_reference_validation() {
        let mut builder = BoardBuilder::new(5.0);
        builder
            .switching("SR1", "IN", 3.3, 0.9)
            .load("LD1", &[("SR2", 0.1)]);
        assert!(linked(&builder).is_err_and(|e| e
            == Error::invalid_reference("LD1:f0 references SR2, which is not found.")));

        let mut builder = BoardBuilder::new(5.0);
        builder
            .linear("LR1", "SR9", 3.3, 0.0)
            .load("LD1", &[("LR1", 0.1)]);
        assert!(linked(&builder).is_err_and(|e| e
            == Error::invalid_reference("LR1:f0 references SR9, which is not found.")));

        let mut builder = BoardBuilder::new(5.0);
        builder
            .switching("SR1", "board", 3.3, 0.9)
            .load("LD1", &[("SR1", 0.1)]);
        assert!(linked(&builder).is_err_and(|e| e.kind() == ErrorKind::InvalidReference));

        // references are resolved case-insensitively, and may point forward
        let mut builder = BoardBuilder::new(5.0);
        builder
            .load("LD1", &[("sr1", 0.1), ("in", 0.2)])
            .switching("SR1", "In", 3.3, 0.9);
        assert!(linked(&builder).is_ok());
    }

    #[test]
    fn test_links() -> Result<(), Error> {
        let mut builder = BoardBuilder::new(5.0);
        builder
            .switching("SR1", "IN", 1.8, 0.9)
            .load("LD1", &[("SR1", 0.1), ("SR1", 0.2), ("IN", 0.3)])
            .load("LD2", &[("SR1", 0.4)]);
        let graph = linked(&builder)?;

        let sr1 = graph.node("sr1")?;
        assert_eq!(sr1.fan_out(), 3);
        assert!(graph
            .downstream("SR1")?
            .map(|n| n.name.as_str())
            .eq(["LD1", "LD1", "LD2"]));
        assert!(graph
            .downstream("IN")?
            .map(|n| n.name.as_str())
            .eq(["SR1", "LD1"]));

        assert_eq!(graph.upstream("LD1", 1)?.map(|n| n.name.as_str()), Some("SR1"));
        assert_eq!(graph.upstream("LD1", 2)?.map(|n| n.name.as_str()), Some("IN"));

        Ok(())
    }

    #[test]
    fn test_fan_out_limit() {
        let mut builder = BoardBuilder::new(5.0);
        for i in 0..MAX_OUTPUTS {
            builder.load(&format!("LD{i}"), &[("IN", 0.01)]);
        }
        assert!(linked(&builder).is_ok());

        builder.section(Section::new("LD99").with("f0", "IN").with("I0", 0.01));
        assert!(linked(&builder).is_err_and(|e| e
            == Error::invalid_reference("IN can't supply more than 17 nodes, LD99 is one too many.")));
    }
}
