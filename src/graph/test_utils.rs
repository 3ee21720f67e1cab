// License: MIT
// Copyright © 2024 Frequenz Energy-as-a-Service GmbH

//! This module is only compiled when running unit tests and contains features
//! that are shared by all tests of the crate.
//!
//! - the `BoardBuilder`, which can declaratively build board descriptions
//!   for use in tests.
//! - the `assert_close!` macro, for comparing computed quantities.

use crate::{BudgetConfig, Document, Error, PowerGraph, Section};

/// Asserts that two floating point values are within an absolute tolerance
/// of each other, `1e-4` unless given.
macro_rules! assert_close {
    ($left:expr, $right:expr $(,)?) => {
        assert_close!($left, $right, 1e-4)
    };
    ($left:expr, $right:expr, $tolerance:expr $(,)?) => {{
        let (left, right): (f64, f64) = ($left, $right);
        assert!(
            (left - right).abs() <= $tolerance,
            "{} = {left} is not within {} of {right}",
            stringify!($left),
            $tolerance,
        );
    }};
}
pub(crate) use assert_close;

/// A builder for creating board descriptions easily, for use in tests.
///
/// Sections are emitted in the order they were added, after the `BOARD` and
/// `IN` sections that every board starts with.
pub(crate) struct BoardBuilder {
    sections: Vec<Section>,
}

impl BoardBuilder {
    /// Creates a board with an input of the given voltage.
    pub(crate) fn new(input_voltage: f64) -> Self {
        Self {
            sections: vec![
                Section::new("BOARD").with("label", "Test board"),
                Section::new("IN")
                    .with("label", "Supply")
                    .with("V", input_voltage),
            ],
        }
    }

    /// Adds a switching regulator.
    pub(crate) fn switching(&mut self, name: &str, from: &str, vo: f64, efficiency: f64) -> &mut Self {
        self.section(
            Section::new(name)
                .with("f0", from)
                .with("Vo", vo)
                .with("n", efficiency),
        )
    }

    /// Adds a linear regulator.
    pub(crate) fn linear(&mut self, name: &str, from: &str, vo: f64, iadj: f64) -> &mut Self {
        self.section(
            Section::new(name)
                .with("f0", from)
                .with("Vo", vo)
                .with("Iadj", iadj),
        )
    }

    /// Adds a series resistor.
    pub(crate) fn resistor(&mut self, name: &str, from: &str, resistance: f64) -> &mut Self {
        self.section(Section::new(name).with("f0", from).with("R", resistance))
    }

    /// Adds a load, drawing the given current from each of the given nodes.
    pub(crate) fn load(&mut self, name: &str, inputs: &[(&str, f64)]) -> &mut Self {
        let mut section = Section::new(name);
        for (i, (from, current)) in inputs.iter().enumerate() {
            section.set(format!("f{i}"), from);
            section.set(format!("I{i}"), current);
        }
        self.section(section)
    }

    /// Adds an arbitrary section.
    pub(crate) fn section(&mut self, section: Section) -> &mut Self {
        self.sections.push(section);
        self
    }

    /// Returns the board description built so far.
    pub(crate) fn document(&self) -> Document {
        let mut document = Document::new();
        for section in &self.sections {
            document.push(section.clone());
        }
        document
    }

    /// Builds and solves a `PowerGraph` with the default configuration.
    pub(crate) fn solve(&self) -> Result<PowerGraph, Error> {
        let mut graph = PowerGraph::from_document(&self.document(), BudgetConfig::default())?;
        graph.calculate()?;
        Ok(graph)
    }
}

/// A 5 V board with a switching regulator and two linear regulators in a
/// row, feeding two loads.
pub(crate) fn scenario() -> BoardBuilder {
    let mut builder = BoardBuilder::new(5.0);
    builder
        .switching("SR1", "IN", 1.8, 0.9)
        .linear("LR1", "IN", 3.6, 0.005)
        .linear("LR2", "LR1", 3.3, 0.005)
        .load("LD1", &[("SR1", 0.528), ("SR1", 0.008), ("LR2", 0.317)])
        .load("LD2", &[("LR2", 0.0354)]);
    builder
}
