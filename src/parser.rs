// License: MIT
// Copyright © 2024 Frequenz Energy-as-a-Service GmbH

//! Turns a [`Document`] into a validated list of [`PowerNode`]s.
//!
//! The parser checks everything that can be checked on a single section,
//! plus the presence of the mandatory sections.  References between
//! sections are resolved later, by the linker in
//! [`PowerGraph::try_new`][crate::PowerGraph::try_new].

use std::collections::HashSet;

use crate::{BudgetConfig, Document, Error, NodeKind, PowerNode, Section, MAX_INPUTS};

/// Parses all sections of the document into nodes, in document order.
pub fn parse_nodes(document: &Document, config: &BudgetConfig) -> Result<Vec<PowerNode>, Error> {
    check_required_sections(document)?;

    let mut names = HashSet::new();
    let mut nodes = Vec::new();
    for section in document.sections() {
        if !names.insert(section.name().to_ascii_lowercase()) {
            return Err(Error::invalid_config(format!(
                "Duplicate section name found: {}",
                section.name()
            )));
        }
        nodes.push(parse_section(section, config)?);
    }

    tracing::debug!(
        switching = count_kind(&nodes, NodeKind::SwitchingRegulator),
        linear = count_kind(&nodes, NodeKind::LinearRegulator),
        resistors = count_kind(&nodes, NodeKind::SeriesResistor),
        loads = count_kind(&nodes, NodeKind::Load),
        "Parsed {} sections.",
        nodes.len()
    );

    Ok(nodes)
}

fn count_kind(nodes: &[PowerNode], kind: NodeKind) -> usize {
    nodes.iter().filter(|n| n.kind == kind).count()
}

/// Checks that there is exactly one BOARD, exactly one IN and at least one
/// load section.
fn check_required_sections(document: &Document) -> Result<(), Error> {
    let count = |kind: NodeKind| {
        document
            .sections()
            .filter(|s| NodeKind::from_section_name(s.name()) == Some(kind))
            .count()
    };

    for (kind, name) in [(NodeKind::Board, "BOARD"), (NodeKind::Input, "IN")] {
        match count(kind) {
            0 => {
                return Err(Error::invalid_config(format!(
                    "Missing {name} section."
                )))
            }
            1 => {}
            _ => {
                return Err(Error::invalid_config(format!(
                    "Only one {name} section is allowed."
                )))
            }
        }
    }
    if count(NodeKind::Load) == 0 {
        return Err(Error::invalid_config(
            "At least one LD section is required.",
        ));
    }

    Ok(())
}

/// Typed access to the keys of one section.
struct SectionReader<'a> {
    section: &'a Section,
}

impl SectionReader<'_> {
    fn name(&self) -> &str {
        self.section.name()
    }

    fn string(&self, key: &str) -> String {
        self.section.get(key).unwrap_or_default().trim().to_string()
    }

    /// Reads a number, defaulting to zero when the key is absent.
    fn number(&self, key: &str) -> Result<f64, Error> {
        let Some(raw) = self.section.get(key) else {
            return Ok(0.0);
        };
        let raw = raw.trim();
        if raw.is_empty() {
            return Ok(0.0);
        }
        match raw.parse::<f64>() {
            Ok(value) if value.is_finite() => Ok(value),
            _ => Err(Error::invalid_config(format!(
                "Invalid number '{raw}' for {}:{key}.",
                self.name()
            ))),
        }
    }

    /// Reads a number that must not be negative.
    fn non_negative(&self, key: &str) -> Result<f64, Error> {
        let value = self.number(key)?;
        if value < 0.0 {
            return Err(Error::invalid_config(format!(
                "{}:{key} can't be negative. Found {value}.",
                self.name()
            )));
        }
        Ok(value)
    }

    /// Reads an upstream reference.
    ///
    /// References to the node itself and to loads are rejected here already,
    /// because both can be recognized from the names alone.
    fn source(&self, key: &str) -> Result<Option<String>, Error> {
        let source = self.string(key);
        if source.is_empty() {
            return Ok(None);
        }
        if source.eq_ignore_ascii_case(self.name()) {
            return Err(Error::invalid_reference(format!(
                "{}:{key} references the node itself.",
                self.name()
            )));
        }
        if NodeKind::from_section_name(&source) == Some(NodeKind::Load) {
            return Err(Error::invalid_reference(format!(
                "{}:{key} references {source}, but loads can't supply other nodes.",
                self.name()
            )));
        }
        Ok(Some(source))
    }

    fn required_source(&self, key: &str) -> Result<String, Error> {
        self.source(key)?.ok_or_else(|| {
            Error::invalid_config(format!(
                "Missing upstream node {key} in section {}.",
                self.name()
            ))
        })
    }
}

fn parse_section(section: &Section, config: &BudgetConfig) -> Result<PowerNode, Error> {
    let name = section.name();
    let kind = NodeKind::from_section_name(name)
        .ok_or_else(|| Error::invalid_config(format!("Unknown section type: {name}")))?;

    let reader = SectionReader { section };
    let mut node = PowerNode::new(name, kind);
    node.label = reader.string("label");

    match kind {
        NodeKind::Board => {}
        NodeKind::Input => {
            node.output_voltage = reader.number("V")?;
            node.output_current = reader.number("I")?;
            node.output_power = reader.number("P")?;
            if node.output_voltage <= 0.0 {
                return Err(Error::invalid_config(format!(
                    "{name}:V must be a positive voltage."
                )));
            }
        }
        NodeKind::SwitchingRegulator | NodeKind::LinearRegulator | NodeKind::SeriesResistor => {
            parse_two_port(&reader, &mut node, config)?;
        }
        NodeKind::Load => parse_load(&reader, &mut node)?,
    }

    Ok(node)
}

/// Reads the keys shared by regulators and series resistors, and the keys
/// specific to each of them.
fn parse_two_port(
    reader: &SectionReader,
    node: &mut PowerNode,
    config: &BudgetConfig,
) -> Result<(), Error> {
    let name = reader.name();
    node.designator = reader.string("refdes");

    let slot = &mut node.inputs[0];
    slot.source = Some(reader.required_source("f0")?);
    slot.voltage = reader.non_negative("Vi")?;
    slot.current = reader.number("Ii")?;
    slot.power = reader.number("Pi")?;

    node.voltage_drop = reader.number("DV")?;
    node.dissipated_power = reader.number("Pd")?;
    node.output_voltage = reader.number("Vo")?;
    node.output_current = reader.number("Io")?;
    node.output_power = reader.number("Po")?;

    match node.kind {
        NodeKind::SwitchingRegulator => {
            node.efficiency = reader.number("n")?;
            if node.efficiency <= 0.0 || node.efficiency > 1.0 {
                return Err(Error::invalid_config(format!(
                    "{name}:n must be an efficiency in (0, 1]. Found {}.",
                    node.efficiency
                )));
            }
        }
        NodeKind::LinearRegulator => {
            node.adjust_current = reader.non_negative("Iadj")?;
        }
        NodeKind::SeriesResistor => {
            let resistance = reader.number("R")?;
            if resistance <= 0.0 {
                return Err(Error::invalid_config(format!(
                    "{name}:R must be a positive resistance."
                )));
            }
            if resistance > config.max_series_resistance {
                return Err(Error::invalid_config(format!(
                    "{name}:R = {resistance} exceeds the maximum of {} Ohm for series resistors.",
                    config.max_series_resistance
                )));
            }
            node.inputs[0].resistance = resistance;
        }
        _ => {
            return Err(Error::internal(format!(
                "{name} is not a regulator or a series resistor."
            )))
        }
    }

    if node.kind.is_regulator() && node.output_voltage <= 0.0 {
        return Err(Error::invalid_config(format!(
            "{name}:Vo must be a positive voltage."
        )));
    }

    Ok(())
}

fn parse_load(reader: &SectionReader, node: &mut PowerNode) -> Result<(), Error> {
    let name = reader.name();
    node.designator = reader.string("refdes");

    for (i, slot) in node.inputs.iter_mut().enumerate().take(MAX_INPUTS) {
        let source = if i == 0 {
            Some(reader.required_source("f0")?)
        } else {
            reader.source(&format!("f{i}"))?
        };
        let Some(source) = source else {
            continue;
        };
        slot.source = Some(source);
        slot.voltage = reader.non_negative(&format!("V{i}"))?;
        slot.current = reader.non_negative(&format!("I{i}"))?;
        slot.resistance = reader.non_negative(&format!("R{i}"))?;
        slot.power = reader.non_negative(&format!("P{i}"))?;
    }
    node.dissipated_power = reader.number("Pd")?;

    let first = &node.inputs[0];
    if first.current == 0.0 && first.power == 0.0 && first.resistance == 0.0 {
        return Err(Error::invalid_config(format!(
            "{name} needs a current, power or resistance for input 0 (I0, P0 or R0)."
        )));
    }

    Ok(())
}
