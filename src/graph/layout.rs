// License: MIT
// Copyright © 2024 Frequenz Energy-as-a-Service GmbH

//! Column/row placement of the nodes of a [`PowerGraph`], for diagrams.
//!
//! Column 0 holds the loads, and every node upstream of a load is placed one
//! column further away from it than the node it supplies.  Each
//! (load, input) pair gets its own row.

use std::fmt::Display;

use petgraph::graph::NodeIndex;

use crate::{NodeKind, PowerGraph, MAX_INPUTS};

/// The placement matrix of a [`PowerGraph`].
#[derive(Clone, Debug, PartialEq)]
pub struct Layout {
    max_depth: usize,
    max_lines: usize,
    cells: Vec<Vec<Option<String>>>,
}

impl Layout {
    /// The largest number of non-input nodes between a load and the input.
    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// The number of connected load inputs.
    pub fn max_lines(&self) -> usize {
        self.max_lines
    }

    /// Number of columns, the input side included.
    pub fn cols(&self) -> usize {
        self.cells.len()
    }

    pub fn rows(&self) -> usize {
        self.max_lines
    }

    /// Returns the name of the node placed at the given position, if any.
    pub fn cell(&self, col: usize, row: usize) -> Option<&str> {
        self.cells.get(col)?.get(row)?.as_deref()
    }
}

impl Display for Layout {
    /// Renders the matrix with the input side on the left and the loads on
    /// the right, one line per row.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "rows\\cols|")?;
        for col in (0..self.cols()).rev() {
            write!(f, "{col:>7}|")?;
        }
        writeln!(f)?;
        write!(f, "---------+")?;
        for _ in 0..self.cols() {
            write!(f, "-------+")?;
        }
        writeln!(f)?;
        for row in 0..self.rows() {
            write!(f, " {row:02}      |")?;
            for col in (0..self.cols()).rev() {
                match self.cell(col, row) {
                    Some(name) => write!(f, " '{name:<4}'|")?,
                    None => write!(f, "       |")?,
                }
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

impl PowerGraph {
    /// Assigns `col` and `row` to every node reachable from a load, and
    /// returns the resulting placement matrix.
    ///
    /// Earlier assignments are discarded, so calling this twice gives the
    /// same result.
    pub fn assign_layout(&mut self) -> Layout {
        let loads = self
            .graph
            .node_indices()
            .filter(|&i| self.graph[i].kind == NodeKind::Load)
            .collect::<Vec<_>>();

        let mut max_depth = 0;
        let mut max_lines = 0;
        for &load in &loads {
            for slot in 0..MAX_INPUTS {
                let Some(from) = self.graph[load].upstream(slot) else {
                    continue;
                };
                max_lines += 1;
                max_depth = max_depth.max(self.depth(from));
            }
        }

        for node in self.graph.node_weights_mut() {
            node.col = None;
            node.row = None;
        }

        let mut row = 0;
        for &load in &loads {
            for slot in 0..MAX_INPUTS {
                let Some(from) = self.graph[load].upstream(slot) else {
                    continue;
                };
                self.place_path(load, from, row);
                row += 1;
            }
        }

        let layout = self.fill_matrix(max_depth, max_lines);
        tracing::debug!("Layout:\n{layout}");
        layout
    }

    /// Counts the non-input nodes from `from` up to the input.
    fn depth(&self, from: NodeIndex) -> usize {
        let mut depth = 0;
        let mut cursor = Some(from);
        while let Some(index) = cursor {
            if self.graph[index].kind == NodeKind::Input {
                break;
            }
            depth += 1;
            cursor = self.graph[index].upstream(0);
        }
        depth
    }

    fn place_path(&mut self, load: NodeIndex, from: NodeIndex, row: usize) {
        let node = &mut self.graph[load];
        node.col.get_or_insert(0);
        node.row.get_or_insert(row);

        let mut col = 0;
        let mut cursor = Some(from);
        while let Some(index) = cursor {
            col += 1;
            let node = &mut self.graph[index];
            if node.col.map_or(true, |c| col > c) {
                node.col = Some(col);
            }
            node.row.get_or_insert(row);
            if node.kind == NodeKind::Input {
                break;
            }
            cursor = node.upstream(0);
        }
    }

    fn fill_matrix(&self, max_depth: usize, max_lines: usize) -> Layout {
        let mut cells = vec![vec![None; max_lines]; max_depth + 2];
        for node in self.nodes() {
            let (Some(col), Some(row)) = (node.col, node.row) else {
                continue;
            };
            // a load also shows up in the rows of its other inputs, offset by
            // the slot number
            let lines = match node.kind {
                NodeKind::Load => node
                    .connected_inputs()
                    .map(|(slot, _)| row + slot)
                    .collect::<Vec<_>>(),
                _ => vec![row],
            };
            for line in lines {
                match cells.get_mut(col).and_then(|c| c.get_mut(line)) {
                    Some(cell) => *cell = Some(node.name.clone()),
                    None => tracing::debug!(
                        "{} at col {col}, row {line} falls outside of the layout.",
                        node.name
                    ),
                }
            }
        }
        Layout {
            max_depth,
            max_lines,
            cells,
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::graph::test_utils::BoardBuilder;
    use crate::{BudgetConfig, Error, PowerGraph, Section};

    fn graph() -> Result<PowerGraph, Error> {
        let mut builder = BoardBuilder::new(5.0);
        builder
            .switching("SR1", "IN", 1.8, 0.9)
            .linear("LR1", "IN", 3.6, 0.005)
            .linear("LR2", "LR1", 3.3, 0.005)
            .load("LD1", &[("SR1", 0.528), ("SR1", 0.008), ("LR2", 0.317)])
            .load("LD2", &[("LR2", 0.0354)]);
        PowerGraph::from_document(&builder.document(), BudgetConfig::default())
    }

    #[test]
    fn test_positions() -> Result<(), Error> {
        let mut graph = graph()?;
        let layout = graph.assign_layout();

        assert_eq!(layout.max_depth(), 2);
        assert_eq!(layout.max_lines(), 4);
        assert_eq!(layout.cols(), 4);
        assert_eq!(layout.rows(), 4);

        let position = |name: &str| {
            graph
                .node(name)
                .map(|n| (n.col, n.row))
                .unwrap_or((None, None))
        };
        assert_eq!(position("LD1"), (Some(0), Some(0)));
        assert_eq!(position("SR1"), (Some(1), Some(0)));
        // the longest path to a load decides the column
        assert_eq!(position("IN"), (Some(3), Some(0)));
        assert_eq!(position("LR2"), (Some(1), Some(2)));
        assert_eq!(position("LR1"), (Some(2), Some(2)));
        assert_eq!(position("LD2"), (Some(0), Some(3)));
        assert_eq!(position("BOARD"), (None, None));

        // loads span one row per connected input
        assert_eq!(layout.cell(0, 0), Some("LD1"));
        assert_eq!(layout.cell(0, 1), Some("LD1"));
        assert_eq!(layout.cell(0, 2), Some("LD1"));
        assert_eq!(layout.cell(0, 3), Some("LD2"));
        assert_eq!(layout.cell(3, 0), Some("IN"));
        assert_eq!(layout.cell(2, 0), None);
        assert_eq!(layout.cell(4, 0), None);

        Ok(())
    }

    #[test]
    fn test_load_rows_follow_slots() -> Result<(), Error> {
        let mut builder = BoardBuilder::new(5.0);
        builder.switching("SR1", "IN", 1.8, 0.9).section(
            Section::new("LD1")
                .with("f0", "SR1")
                .with("I0", 0.1)
                .with("f2", "IN")
                .with("I2", 0.2),
        );
        let mut graph = PowerGraph::from_document(&builder.document(), BudgetConfig::default())?;
        let layout = graph.assign_layout();

        assert_eq!(layout.rows(), 2);
        assert_eq!(layout.cell(0, 0), Some("LD1"));
        // f1 is not connected, and f2 falls below the last row
        assert_eq!(layout.cell(0, 1), None);
        assert_eq!(layout.cell(0, 2), None);
        assert_eq!(layout.cell(1, 0), Some("SR1"));

        Ok(())
    }

    #[test]
    fn test_diagram() -> Result<(), Error> {
        let mut graph = graph()?;
        let layout = graph.assign_layout();

        assert_eq!(
            layout.to_string(),
            "\
rows\\cols|      3|      2|      1|      0|
---------+-------+-------+-------+-------+
 00      | 'IN  '|       | 'SR1 '| 'LD1 '|
 01      |       |       |       | 'LD1 '|
 02      |       | 'LR1 '| 'LR2 '| 'LD1 '|
 03      |       |       |       | 'LD2 '|
"
        );

        // assigning again gives the same layout
        assert_eq!(graph.assign_layout(), layout);

        Ok(())
    }
}
