// License: MIT
// Copyright © 2024 Frequenz Energy-as-a-Service GmbH

//! This module defines the `PowerNode` record, which holds the identity and
//! the electrical state of a board component.

use petgraph::graph::NodeIndex;

use crate::NodeKind;

/// Maximum number of upstream supplies for a load.
pub const MAX_INPUTS: usize = 3;

/// Maximum number of downstream references a node can hold.
pub const MAX_OUTPUTS: usize = 17;

/// One input of a node.
///
/// Only loads use the slots after the first one.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct InputSlot {
    /// The upstream node name, as written in the `f{i}` key.
    pub source: Option<String>,
    pub voltage: f64,
    pub current: f64,
    pub resistance: f64,
    pub power: f64,
    pub(crate) from: Option<NodeIndex>,
}

impl InputSlot {
    /// Returns true if the slot names an upstream node.
    pub fn is_connected(&self) -> bool {
        self.source.is_some()
    }

    /// Resets the quantities that the solver derives for the slot.  A pinned
    /// voltage is kept.
    pub(crate) fn reset_derived(&mut self) {
        self.current = 0.0;
        self.power = 0.0;
    }
}

/// A board component.
///
/// All numeric fields are SI units (V, A, Ω, W) and zero means "unknown,
/// to be derived".
#[derive(Clone, Debug, PartialEq)]
pub struct PowerNode {
    pub name: String,
    pub kind: NodeKind,
    pub label: String,
    /// Reference designator on the schematic, e.g. `U12`.
    pub designator: String,
    pub inputs: [InputSlot; MAX_INPUTS],
    /// Conversion efficiency, switching regulators only.
    pub efficiency: f64,
    /// Ground pin current, linear regulators only.
    pub adjust_current: f64,
    pub voltage_drop: f64,
    pub dissipated_power: f64,
    pub output_voltage: f64,
    pub output_current: f64,
    pub output_power: f64,
    pub col: Option<usize>,
    pub row: Option<usize>,
    pub(crate) outputs: Vec<NodeIndex>,
    pub(crate) fan_in_seen: usize,
    /// Sum of the currents reported by downstream nodes so far.
    pub(crate) fan_in_current: f64,
}

impl PowerNode {
    /// Creates a node with no connections and all quantities unknown.
    pub fn new(name: impl Into<String>, kind: NodeKind) -> Self {
        Self {
            name: name.into(),
            kind,
            label: String::new(),
            designator: String::new(),
            inputs: Default::default(),
            efficiency: 0.0,
            adjust_current: 0.0,
            voltage_drop: 0.0,
            dissipated_power: 0.0,
            output_voltage: 0.0,
            output_current: 0.0,
            output_power: 0.0,
            col: None,
            row: None,
            outputs: Vec::new(),
            fan_in_seen: 0,
            fan_in_current: 0.0,
        }
    }

    /// Returns the connected input slots with their slot numbers.
    pub fn connected_inputs(&self) -> impl Iterator<Item = (usize, &InputSlot)> {
        self.inputs
            .iter()
            .enumerate()
            .filter(|(_, slot)| slot.is_connected())
    }

    /// Returns the input power of the node, summed over all slots.
    pub fn input_power(&self) -> f64 {
        self.inputs.iter().map(|slot| slot.power).sum()
    }

    /// Returns the number of downstream references of the node.
    pub fn fan_out(&self) -> usize {
        self.outputs.len()
    }

    /// Returns the resolved upstream node of the given slot.
    pub(crate) fn upstream(&self, slot: usize) -> Option<NodeIndex> {
        self.inputs.get(slot).and_then(|s| s.from)
    }

    /// Returns true once every downstream node has reported its current.
    pub(crate) fn fan_in_complete(&self) -> bool {
        self.fan_in_seen >= self.outputs.len()
    }

    /// A series resistor is processed once its chain has been solved, which
    /// gives it an output voltage.
    pub(crate) fn is_processed(&self) -> bool {
        self.kind == NodeKind::SeriesResistor && self.output_voltage > 0.0
    }

    /// Clears everything the solver derives, so that solving twice gives
    /// the same result as solving once.
    pub(crate) fn reset_derived(&mut self) {
        self.fan_in_seen = 0;
        self.fan_in_current = 0.0;
        match self.kind {
            NodeKind::Board => {}
            NodeKind::Input => {
                self.output_current = 0.0;
                self.output_power = 0.0;
            }
            NodeKind::SwitchingRegulator | NodeKind::LinearRegulator => {
                self.output_current = 0.0;
                self.output_power = 0.0;
                self.dissipated_power = 0.0;
                self.voltage_drop = 0.0;
                self.inputs[0].reset_derived();
            }
            NodeKind::SeriesResistor => {
                self.output_voltage = 0.0;
                self.output_current = 0.0;
                self.output_power = 0.0;
                self.dissipated_power = 0.0;
                self.voltage_drop = 0.0;
                self.inputs[0].voltage = 0.0;
                self.inputs[0].reset_derived();
            }
            NodeKind::Load => {
                self.dissipated_power = 0.0;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connected_inputs() {
        let mut node = PowerNode::new("LD1", NodeKind::Load);
        assert_eq!(node.connected_inputs().count(), 0);

        node.inputs[0].source = Some("IN".into());
        node.inputs[2].source = Some("SR1".into());
        let slots = node.connected_inputs().map(|(i, _)| i).collect::<Vec<_>>();
        assert_eq!(slots, vec![0, 2]);
    }

    #[test]
    fn test_reset_derived() {
        let mut node = PowerNode::new("RS1", NodeKind::SeriesResistor);
        node.inputs[0].resistance = 0.5;
        node.inputs[0].voltage = 4.9;
        node.inputs[0].current = 0.2;
        node.output_voltage = 4.8;
        node.fan_in_seen = 1;
        assert!(node.is_processed());
        assert!(!PowerNode::new("LR1", NodeKind::LinearRegulator).is_processed());

        node.reset_derived();
        assert!(!node.is_processed());
        assert_eq!(node.inputs[0].resistance, 0.5);
        assert_eq!(node.inputs[0].voltage, 0.0);
        assert_eq!(node.output_voltage, 0.0);

        let mut node = PowerNode::new("LR1", NodeKind::LinearRegulator);
        node.inputs[0].voltage = 5.0;
        node.inputs[0].current = 0.3;
        node.output_voltage = 3.3;
        node.output_current = 0.29;
        node.reset_derived();
        // pinned voltages survive, accumulated currents don't
        assert_eq!(node.inputs[0].voltage, 5.0);
        assert_eq!(node.output_voltage, 3.3);
        assert_eq!(node.inputs[0].current, 0.0);
        assert_eq!(node.output_current, 0.0);
    }
}
