// License: MIT
// Copyright © 2024 Frequenz Energy-as-a-Service GmbH

//! The power solver.
//!
//! Every load input is resolved locally first, and its current is then
//! carried up towards the input node.  A node that feeds several others
//! waits until all of them have reported, before passing on its own input
//! current.  Regulators fed through series resistors can't know their input
//! voltage before the resistor chain is solved, and are parked until it is.

use std::collections::VecDeque;

use petgraph::graph::NodeIndex;

use crate::{Error, InputSlot, NodeKind, PowerGraph, MAX_INPUTS};

/// Returns `num / den`, or zero when `den` is zero.
fn ratio(num: f64, den: f64) -> f64 {
    if den == 0.0 {
        0.0
    } else {
        num / den
    }
}

/// What is known about the consumer at the bottom of a series resistor
/// chain.
#[derive(Clone, Copy, Debug, PartialEq)]
enum Demand {
    Current(f64),
    Resistance(f64),
    Power(f64),
}

impl Demand {
    /// The demand of a load input with an unknown voltage.
    fn of_load_input(slot: &InputSlot) -> Self {
        if slot.current != 0.0 {
            Demand::Current(slot.current)
        } else if slot.resistance != 0.0 {
            Demand::Resistance(slot.resistance)
        } else {
            Demand::Power(slot.power)
        }
    }

    /// Returns the chain current, given the voltage at the top of the chain
    /// and the total chain resistance, or `None` if the chain can't deliver
    /// the demanded power.
    fn current(self, source_voltage: f64, chain_resistance: f64) -> Option<f64> {
        match self {
            Demand::Current(current) => Some(current),
            Demand::Resistance(resistance) => {
                Some(ratio(source_voltage, chain_resistance + resistance))
            }
            Demand::Power(power) => {
                // V² - Vs·V + Rt·P = 0, the higher root is the stable one.
                let discriminant =
                    source_voltage * source_voltage - 4.0 * chain_resistance * power;
                if discriminant < 0.0 {
                    return None;
                }
                let voltage = (source_voltage + discriminant.sqrt()) / 2.0;
                Some(ratio(power, voltage))
            }
        }
    }
}

/// How a walk towards the input continues after updating a node.
enum Step {
    /// Go on to the upstream node, with this current.
    Continue(f64),
    /// Stop here, the node is waiting for more downstream currents or for
    /// its input voltage.
    Halt,
}

/// State of a single solve.
struct Solver<'a> {
    pg: &'a mut PowerGraph,
    /// Regulators waiting for their input voltage, in the order they were
    /// parked.
    pending: VecDeque<NodeIndex>,
}

impl PowerGraph {
    /// Derives the unknown voltages, currents and powers of all nodes.
    ///
    /// Values derived by an earlier call are cleared first, so solving a
    /// solved graph again gives the same result.
    pub fn calculate(&mut self) -> Result<(), Error> {
        Solver {
            pg: self,
            pending: VecDeque::new(),
        }
        .run()
    }
}

impl Solver<'_> {
    fn run(mut self) -> Result<(), Error> {
        for node in self.pg.graph.node_weights_mut() {
            node.reset_derived();
        }

        let loads = self.indices_of(|kind| kind == NodeKind::Load);
        for load in loads {
            for slot in 0..MAX_INPUTS {
                self.solve_load_input(load, slot)?;
            }
        }

        // Regulators and resistors supplying nothing would otherwise keep the
        // input from ever completing.
        let idle = self
            .indices_of(|kind| kind.is_regulator() || kind == NodeKind::SeriesResistor)
            .into_iter()
            .filter(|&i| self.pg.graph[i].outputs.is_empty())
            .collect::<Vec<_>>();
        for index in idle {
            tracing::debug!("{} supplies nothing, solving it unloaded.", self.name(index));
            self.walk_to_input(index, 0.0)?;
        }

        self.settle_pending()
    }

    fn indices_of(&self, predicate: impl Fn(NodeKind) -> bool) -> Vec<NodeIndex> {
        self.pg
            .graph
            .node_indices()
            .filter(|&i| predicate(self.pg.graph[i].kind))
            .collect()
    }

    fn name(&self, index: NodeIndex) -> &str {
        &self.pg.graph[index].name
    }

    fn unsupported(&self, index: NodeIndex) -> Error {
        let node = &self.pg.graph[index];
        Error::invalid_graph(format!(
            "Unsupported node {}:{} on the path to the input.",
            node.kind, node.name
        ))
    }

    fn missing_upstream(&self, index: NodeIndex) -> Error {
        Error::internal(format!("{} has no upstream node.", self.name(index)))
    }

    /// Resolves one input of a load, and carries its current up to the
    /// input node.
    fn solve_load_input(&mut self, load: NodeIndex, slot: usize) -> Result<(), Error> {
        let Some(from) = self.pg.graph[load].upstream(slot) else {
            return Ok(());
        };

        if self.pg.graph[load].inputs[slot].voltage == 0.0 {
            let upstream = &self.pg.graph[from];
            let (kind, upstream_voltage, processed) =
                (upstream.kind, upstream.output_voltage, upstream.is_processed());
            let voltage = match kind {
                NodeKind::SeriesResistor if processed => upstream_voltage,
                NodeKind::SeriesResistor => {
                    let demand = Demand::of_load_input(&self.pg.graph[load].inputs[slot]);
                    self.solve_series_chain(from, demand)?
                }
                kind if kind.is_voltage_source() => upstream_voltage,
                _ => return Err(self.unsupported(from)),
            };
            self.pg.graph[load].inputs[slot].voltage = voltage;
        }

        let node = &mut self.pg.graph[load];
        complete_ohms_law(&mut node.inputs[slot]);
        node.dissipated_power += node.inputs[slot].power;

        let input = &node.inputs[slot];
        let current = input.current;
        tracing::debug!(
            voltage = input.voltage,
            current = input.current,
            power = input.power,
            "{}:f{slot} resolved.",
            node.name
        );

        self.walk_to_input(from, current)
    }

    /// Carries a current from `start` up to the input node, updating every
    /// node on the way, until the input is reached or a node has to wait.
    fn walk_to_input(&mut self, start: NodeIndex, current: f64) -> Result<(), Error> {
        let mut current = current;
        let mut cursor = Some(start);
        while let Some(index) = cursor {
            let step = match self.pg.graph[index].kind {
                NodeKind::Input => self.update_input(index, current),
                NodeKind::SwitchingRegulator | NodeKind::LinearRegulator => {
                    self.update_regulator(index, current)?
                }
                NodeKind::SeriesResistor => self.update_resistor(index, current)?,
                NodeKind::Load | NodeKind::Board => return Err(self.unsupported(index)),
            };
            match step {
                Step::Continue(next) => current = next,
                Step::Halt => return Ok(()),
            }
            cursor = self.pg.graph[index].upstream(0);
        }
        Ok(())
    }

    fn update_input(&mut self, index: NodeIndex, current: f64) -> Step {
        let node = &mut self.pg.graph[index];
        node.output_current += current;
        node.fan_in_seen += 1;
        if !node.fan_in_complete() {
            return Step::Halt;
        }
        node.output_power = node.output_voltage * node.output_current;
        tracing::debug!(
            current = node.output_current,
            power = node.output_power,
            "{} complete.",
            node.name
        );
        Step::Continue(node.output_current)
    }

    /// Adds a downstream current to a series resistor, solving its chain on
    /// the first visit.
    ///
    /// The chain is solved for the first current that reaches it, and its
    /// record keeps that current on both sides.  The currents of all
    /// downstream nodes are summed separately, and the sum is what goes on
    /// to the input.
    fn update_resistor(&mut self, index: NodeIndex, current: f64) -> Result<Step, Error> {
        if !self.pg.graph[index].is_processed() {
            self.solve_series_chain(index, Demand::Current(current))?;
        }
        let node = &mut self.pg.graph[index];
        node.fan_in_current += current;
        node.fan_in_seen += 1;
        if !node.fan_in_complete() {
            return Ok(Step::Halt);
        }
        Ok(Step::Continue(node.fan_in_current))
    }

    /// Adds a downstream current to a regulator.  Once all downstream nodes
    /// have reported, its input side is derived.
    fn update_regulator(&mut self, index: NodeIndex, current: f64) -> Result<Step, Error> {
        let node = &mut self.pg.graph[index];
        node.output_current += current;
        node.fan_in_seen += 1;
        if !node.fan_in_complete() {
            return Ok(Step::Halt);
        }

        node.output_power = node.output_voltage * node.output_current;
        match node.kind {
            NodeKind::SwitchingRegulator => {
                node.dissipated_power = node.output_power * (1.0 / node.efficiency - 1.0);
                node.inputs[0].power = node.output_power / node.efficiency;
            }
            NodeKind::LinearRegulator => {
                node.inputs[0].current = node.output_current + node.adjust_current;
            }
            _ => {
                return Err(Error::internal(format!(
                    "{} is not a regulator.",
                    node.name
                )))
            }
        }

        self.finish_regulator(index)
    }

    /// Derives the quantities of a regulator that need its input voltage, or
    /// parks the regulator if that voltage isn't known yet.
    fn finish_regulator(&mut self, index: NodeIndex) -> Result<Step, Error> {
        let upstream = self.pg.graph[index]
            .upstream(0)
            .ok_or_else(|| self.missing_upstream(index))?;
        let upstream_voltage = self.pg.graph[upstream].output_voltage;

        let node = &mut self.pg.graph[index];
        if node.inputs[0].voltage == 0.0 {
            node.inputs[0].voltage = upstream_voltage;
        }
        let voltage = node.inputs[0].voltage;
        if voltage == 0.0 {
            tracing::debug!(
                col = ?node.col,
                row = ?node.row,
                "{} waits for its input voltage.",
                node.name
            );
            if !self.pending.contains(&index) {
                self.pending.push_back(index);
            }
            return Ok(Step::Halt);
        }

        node.voltage_drop = voltage - node.output_voltage;
        match node.kind {
            NodeKind::SwitchingRegulator => {
                node.inputs[0].current = ratio(node.inputs[0].power, voltage);
            }
            NodeKind::LinearRegulator => {
                node.dissipated_power =
                    node.output_current * node.voltage_drop + node.adjust_current * voltage;
                node.inputs[0].power = voltage * node.inputs[0].current;
            }
            _ => {
                return Err(Error::internal(format!(
                    "{} is not a regulator.",
                    node.name
                )))
            }
        }

        tracing::debug!(
            col = ?node.col,
            row = ?node.row,
            input_current = node.inputs[0].current,
            input_power = node.inputs[0].power,
            dissipated = node.dissipated_power,
            "{} complete.",
            node.name
        );
        Ok(Step::Continue(node.inputs[0].current))
    }

    /// Solves the chain of series resistors that ends at `bottom`, for the
    /// given demand, and returns the voltage at the bottom of the chain.
    ///
    /// The chain extends upwards to the first node with a known output
    /// voltage, which can also be an already solved resistor.
    ///
    /// Afterwards, regulators that were waiting for this chain are resumed.
    fn solve_series_chain(&mut self, bottom: NodeIndex, demand: Demand) -> Result<f64, Error> {
        let max_chain = self.pg.config.max_series_chain;
        let mut chain = Vec::new();
        let mut chain_resistance = 0.0;
        let mut cursor = bottom;
        let source_voltage = loop {
            let node = &self.pg.graph[cursor];
            match node.kind {
                NodeKind::SeriesResistor if node.is_processed() => break node.output_voltage,
                NodeKind::SeriesResistor => {
                    if chain.len() == max_chain {
                        return Err(Error::invalid_graph(format!(
                            "More than {max_chain} series resistors in a row above {}.",
                            self.name(bottom)
                        )));
                    }
                    chain.push(cursor);
                    chain_resistance += node.inputs[0].resistance;
                    cursor = node
                        .upstream(0)
                        .ok_or_else(|| self.missing_upstream(cursor))?;
                }
                kind if kind.is_voltage_source() => break node.output_voltage,
                _ => return Err(self.unsupported(cursor)),
            }
        };

        let current = demand
            .current(source_voltage, chain_resistance)
            .ok_or_else(|| {
                Error::unresolved_node(format!(
                    "Series chain ending at {} can't deliver the demanded {demand:?}.",
                    self.name(bottom)
                ))
            })?;
        let output_voltage = source_voltage - current * chain_resistance;
        if output_voltage <= 0.0 {
            return Err(Error::unresolved_node(format!(
                "Series chain ending at {} drops all of its {source_voltage} V at {current} A.",
                self.name(bottom)
            )));
        }

        let mut voltage = output_voltage;
        for &index in &chain {
            let node = &mut self.pg.graph[index];
            let drop = node.inputs[0].resistance * current;
            node.output_voltage = voltage;
            node.output_current = current;
            node.output_power = voltage * current;
            node.voltage_drop = drop;
            node.dissipated_power = drop * current;
            node.inputs[0].voltage = voltage + drop;
            node.inputs[0].current = current;
            node.inputs[0].power = node.inputs[0].voltage * current;
            voltage = node.inputs[0].voltage;
        }
        tracing::debug!(
            resistors = chain.len(),
            resistance = chain_resistance,
            current,
            output_voltage,
            "Series chain ending at {} solved.",
            self.name(bottom)
        );

        self.resume_pending()?;
        Ok(output_voltage)
    }

    /// Resumes every parked regulator whose upstream node has a voltage now.
    fn resume_pending(&mut self) -> Result<(), Error> {
        loop {
            let ready = self
                .pending
                .iter()
                .position(|&i| self.upstream_voltage(i) != 0.0);
            let Some(index) = ready.and_then(|position| self.pending.remove(position)) else {
                return Ok(());
            };

            tracing::debug!("Resuming {}.", self.name(index));
            if let Step::Continue(current) = self.update_regulator(index, 0.0)? {
                let upstream = self.pg.graph[index]
                    .upstream(0)
                    .ok_or_else(|| self.missing_upstream(index))?;
                self.walk_to_input(upstream, current)?;
            }
        }
    }

    fn upstream_voltage(&self, index: NodeIndex) -> f64 {
        self.pg.graph[index]
            .upstream(0)
            .map_or(0.0, |i| self.pg.graph[i].output_voltage)
    }

    /// Drives the chains above the regulators that are still parked once all
    /// loads are done, with the regulators' own demand.
    ///
    /// Returns an error naming the regulators that can't be resolved.
    fn settle_pending(&mut self) -> Result<(), Error> {
        while let Some(&index) = self.pending.front() {
            let node = &self.pg.graph[index];
            let demand = match node.kind {
                NodeKind::SwitchingRegulator => Demand::Power(node.inputs[0].power),
                NodeKind::LinearRegulator => Demand::Current(node.inputs[0].current),
                _ => return Err(self.unsupported(index)),
            };
            let upstream = node.upstream(0).ok_or_else(|| self.missing_upstream(index))?;
            let chain_top = &self.pg.graph[upstream];
            if chain_top.kind != NodeKind::SeriesResistor || chain_top.is_processed() {
                break;
            }

            tracing::debug!(
                "Solving the series chain above {} with its own demand.",
                self.name(index)
            );
            self.solve_series_chain(upstream, demand)?;
            if self.pending.front() == Some(&index) {
                break;
            }
        }

        if self.pending.is_empty() {
            return Ok(());
        }
        let names = self
            .pending
            .iter()
            .map(|&i| self.name(i))
            .collect::<Vec<_>>();
        Err(Error::unresolved_node(format!(
            "Input voltage of {} can't be determined.",
            names.join(", ")
        )))
    }
}

/// Fills in the unknown current, resistance and power of a load input with a
/// known voltage.
fn complete_ohms_law(slot: &mut InputSlot) {
    let voltage = slot.voltage;
    if slot.current != 0.0 && slot.resistance == 0.0 {
        slot.resistance = ratio(voltage, slot.current);
        slot.power = voltage * slot.current;
    } else if slot.current == 0.0 && slot.resistance != 0.0 {
        slot.current = ratio(voltage, slot.resistance);
        slot.power = voltage * slot.current;
    } else if slot.current == 0.0 && slot.power != 0.0 {
        slot.current = ratio(slot.power, voltage);
        slot.resistance = ratio(voltage, slot.current);
    } else if slot.power == 0.0 {
        slot.power = voltage * slot.current;
    }
}
