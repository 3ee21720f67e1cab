// License: MIT
// Copyright © 2024 Frequenz Energy-as-a-Service GmbH

//! This module defines the `NodeKind` enum, which represents the kind of a
//! board component.

use std::fmt::Display;

/// Represents the kind of a node.
///
/// The kind is derived once from the section name while parsing, and all
/// later dispatch happens on this enum.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum NodeKind {
    /// Board metadata.  Not part of the electrical graph.
    Board,
    /// The single power source, root of the graph.
    Input,
    SwitchingRegulator,
    LinearRegulator,
    SeriesResistor,
    /// A sink, drawing from up to [`MAX_INPUTS`][crate::MAX_INPUTS] upstream
    /// nodes.
    Load,
}

impl NodeKind {
    /// Returns the kind for the given section name, or `None` if the name
    /// doesn't identify any known kind.
    ///
    /// `board` and `in` must match exactly, all other kinds are selected
    /// by a two letter prefix.  Matching is case-insensitive.
    pub fn from_section_name(name: &str) -> Option<Self> {
        if name.eq_ignore_ascii_case("board") {
            return Some(NodeKind::Board);
        }
        if name.eq_ignore_ascii_case("in") {
            return Some(NodeKind::Input);
        }
        let prefix = name.get(..2)?;
        if prefix.eq_ignore_ascii_case("sr") {
            Some(NodeKind::SwitchingRegulator)
        } else if prefix.eq_ignore_ascii_case("lr") {
            Some(NodeKind::LinearRegulator)
        } else if prefix.eq_ignore_ascii_case("rs") {
            Some(NodeKind::SeriesResistor)
        } else if prefix.eq_ignore_ascii_case("ld") {
            Some(NodeKind::Load)
        } else {
            None
        }
    }

    /// Returns true if nodes of this kind must name an upstream node in
    /// their `f0` key.
    pub fn requires_upstream(&self) -> bool {
        !matches!(self, NodeKind::Board | NodeKind::Input)
    }

    pub fn is_regulator(&self) -> bool {
        matches!(
            self,
            NodeKind::SwitchingRegulator | NodeKind::LinearRegulator
        )
    }

    /// Returns true if nodes of this kind have a configured output voltage,
    /// which their downstream nodes can rely on.
    pub fn is_voltage_source(&self) -> bool {
        matches!(
            self,
            NodeKind::Input | NodeKind::SwitchingRegulator | NodeKind::LinearRegulator
        )
    }
}

impl Display for NodeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NodeKind::Board => write!(f, "Board"),
            NodeKind::Input => write!(f, "Input"),
            NodeKind::SwitchingRegulator => write!(f, "SwitchingRegulator"),
            NodeKind::LinearRegulator => write!(f, "LinearRegulator"),
            NodeKind::SeriesResistor => write!(f, "SeriesResistor"),
            NodeKind::Load => write!(f, "Load"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_section_name() {
        assert_eq!(NodeKind::from_section_name("BOARD"), Some(NodeKind::Board));
        assert_eq!(NodeKind::from_section_name("board"), Some(NodeKind::Board));
        assert_eq!(NodeKind::from_section_name("IN"), Some(NodeKind::Input));
        assert_eq!(NodeKind::from_section_name("In"), Some(NodeKind::Input));
        assert_eq!(
            NodeKind::from_section_name("SR12"),
            Some(NodeKind::SwitchingRegulator)
        );
        assert_eq!(
            NodeKind::from_section_name("lr1"),
            Some(NodeKind::LinearRegulator)
        );
        assert_eq!(
            NodeKind::from_section_name("Rs3"),
            Some(NodeKind::SeriesResistor)
        );
        assert_eq!(NodeKind::from_section_name("LD"), Some(NodeKind::Load));

        // `in` and `board` are exact names, not prefixes.
        assert_eq!(NodeKind::from_section_name("IN2"), None);
        assert_eq!(NodeKind::from_section_name("BOARD2"), None);
        assert_eq!(NodeKind::from_section_name("X"), None);
        assert_eq!(NodeKind::from_section_name("CAP1"), None);
        assert_eq!(NodeKind::from_section_name("é1"), None);
    }

    #[test]
    fn test_predicates() {
        assert!(!NodeKind::Board.requires_upstream());
        assert!(!NodeKind::Input.requires_upstream());
        assert!(NodeKind::Load.requires_upstream());
        assert!(NodeKind::SeriesResistor.requires_upstream());

        assert!(NodeKind::Input.is_voltage_source());
        assert!(NodeKind::LinearRegulator.is_voltage_source());
        assert!(!NodeKind::SeriesResistor.is_voltage_source());

        assert!(NodeKind::SwitchingRegulator.is_regulator());
        assert!(!NodeKind::Input.is_regulator());
    }
}
