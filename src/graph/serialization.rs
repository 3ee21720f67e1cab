// License: MIT
// Copyright © 2024 Frequenz Energy-as-a-Service GmbH

//! Rendering a solved [`PowerGraph`] back into a board description.

use std::path::Path;

use crate::{Document, Error, NodeKind, PowerGraph, PowerNode, Section};

impl PowerGraph {
    /// Returns a document with one section per node, in configuration order,
    /// holding all known and derived quantities.
    ///
    /// Numbers are written in their shortest form that parses back to the
    /// same value, so the result can be loaded and solved again.
    pub fn to_document(&self) -> Document {
        let mut document = Document::new();
        for node in self.nodes() {
            document.push(node_section(node));
        }
        document
    }

    /// Writes the board description, with all derived quantities, to the
    /// given path.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), Error> {
        self.to_document().save(path)
    }
}

fn node_section(node: &PowerNode) -> Section {
    let mut section = Section::new(node.name.as_str()).with("label", &node.label);

    match node.kind {
        NodeKind::Board => {}
        NodeKind::Input => {
            section.set("V", node.output_voltage);
            section.set("I", node.output_current);
            section.set("P", node.output_power);
        }
        NodeKind::SwitchingRegulator | NodeKind::LinearRegulator | NodeKind::SeriesResistor => {
            let input = &node.inputs[0];
            section.set("refdes", &node.designator);
            section.set("f0", input.source.as_deref().unwrap_or_default());
            section.set("Vi", input.voltage);
            section.set("Ii", input.current);
            if node.kind == NodeKind::SeriesResistor {
                section.set("R", input.resistance);
            }
            section.set("Pi", input.power);
            section.set("DV", node.voltage_drop);
            section.set("Pd", node.dissipated_power);
            match node.kind {
                NodeKind::SwitchingRegulator => section.set("n", node.efficiency),
                NodeKind::LinearRegulator => section.set("Iadj", node.adjust_current),
                _ => {}
            }
            section.set("Vo", node.output_voltage);
            section.set("Io", node.output_current);
            section.set("Po", node.output_power);
        }
        NodeKind::Load => {
            section.set("refdes", &node.designator);
            for (i, slot) in node.connected_inputs() {
                section.set(format!("f{i}"), slot.source.as_deref().unwrap_or_default());
                section.set(format!("V{i}"), slot.voltage);
                section.set(format!("I{i}"), slot.current);
                section.set(format!("R{i}"), slot.resistance);
                section.set(format!("P{i}"), slot.power);
            }
            section.set("Pd", node.dissipated_power);
        }
    }

    section
}
