// License: MIT
// Copyright © 2024 Frequenz Energy-as-a-Service GmbH

//! A graph representation of the power distribution of a board: the input
//! supply, the regulators and series resistors, the loads, and which node
//! feeds which.

mod calculation;
mod creation;
mod layout;
mod retrieval;
mod serialization;
mod validation;

pub mod iterators;

pub use layout::Layout;

use crate::{BudgetConfig, PowerNode};
use petgraph::graph::{DiGraph, NodeIndex};
use std::collections::HashMap;

/// `PowerNode`s stored in a `DiGraph` instance can be addressed with
/// `NodeIndex`es.
///
/// `NodeIndexMap` stores the corresponding `NodeIndex` for the lowercased
/// name of every node, so that nodes can be looked up by name the same way
/// the configuration references them.
pub(crate) type NodeIndexMap = HashMap<String, NodeIndex>;

/// The components of a board and the supply links between them.
///
/// Each edge goes from a supplying node to a supplied node, and carries the
/// input slot of the supplied node that it feeds.
pub struct PowerGraph {
    graph: DiGraph<PowerNode, usize>,
    node_indices: NodeIndexMap,
    input: NodeIndex,
    config: BudgetConfig,
}

#[cfg(test)]
pub(crate) mod test_utils;
