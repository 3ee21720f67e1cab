// License: MIT
// Copyright © 2024 Frequenz Energy-as-a-Service GmbH

/*!
# Board Power Budget

This is a library for computing the power budget of an electronic board: the
voltage, current and power at every node of its power distribution tree,
from a single input supply, through switching regulators, linear regulators
and series resistors, down to the loads.

## Board descriptions

Boards are described in INI files, one section per component.  The section
name selects the kind of the component:

- `[BOARD]` holds metadata,
- `[IN]` is the input supply, with its voltage `V`,
- `[SRxx]` are switching regulators, with an output voltage `Vo` and an
  efficiency `n`,
- `[LRxx]` are linear regulators, with an output voltage `Vo` and a ground
  pin current `Iadj`,
- `[RSxx]` are series resistors, with a resistance `R`,
- `[LDxx]` are loads, with up to three inputs `f0`..`f2`, each described by
  its current, resistance or power.

Every component other than the input names the node that supplies it in its
`f0` key (and `f1`, `f2` for loads).

A [`Document`] holds the sections of such a file.  It can be read from a
file or a string, or built in code.

## Building and validating the graph

[`PowerGraph::from_document`] parses the sections into [`PowerNode`]s,
resolves the references between them, and checks that:

- there is exactly one `BOARD` and one `IN` section, and at least one load,
- all required keys are present and have sensible values,
- all references point to existing nodes, other than the node itself and
  loads,
- there are no cycles, and every node is connected to the input.

If any of the checks fail, an [`Error`] is returned.

## Solving

[`PowerGraph::calculate`] derives every unknown quantity, starting from the
loads and walking up to the input.  The solved graph can be inspected with
[`PowerGraph::node`] and [`PowerGraph::nodes`], or rendered back into a
[`Document`] with [`PowerGraph::to_document`].

[`PowerGraph::assign_layout`] places the nodes in a column/row matrix, which
can be printed as a text diagram.
*/

mod config;
pub use config::{BudgetConfig, DEFAULT_MAX_SERIES_CHAIN, DEFAULT_MAX_SERIES_RESISTANCE};

mod document;
pub use document::{Document, Section};

mod error;
pub use error::{Error, ErrorKind};

mod graph;
pub use graph::{iterators, Layout, PowerGraph};

mod node;
pub use node::{InputSlot, PowerNode, MAX_INPUTS, MAX_OUTPUTS};

mod node_kind;
pub use node_kind::NodeKind;

mod parser;
