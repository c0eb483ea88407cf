use tracing::debug;

use super::level_columns;
use crate::node::{Point, Size};
use crate::{BlockGraph, NodeIndex, NESTING_SCALE};

/// Margins used by [`plan_layout`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayoutConfig {
    /// Horizontal position of the first column.
    pub left: f64,
    /// Vertical position of the first node of each column.
    pub top: f64,
    /// Gap between consecutive nodes and between columns.
    pub margin: f64,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            left: 10.0,
            top: 20.0,
            margin: 20.0,
        }
    }
}

/// Places columns of nodes left to right.
///
/// Nodes of a column are stacked top to bottom, separated by the margin.
/// Each column starts one margin to the right of the widest node of the
/// previous one. Empty columns are skipped.
pub fn plan_layout(
    columns: &[Vec<(NodeIndex, Size)>],
    config: &LayoutConfig,
) -> Vec<(NodeIndex, Point)> {
    let mut positions = Vec::with_capacity(columns.iter().map(Vec::len).sum());
    let mut x = config.left;
    for column in columns.iter().filter(|column| !column.is_empty()) {
        let mut y = config.top;
        let mut widest: f64 = 0.0;
        for &(node, size) in column {
            positions.push((node, Point::new(x, y)));
            y += size.height + config.margin;
            widest = widest.max(size.width);
        }
        x += widest + config.margin;
    }
    positions
}

impl BlockGraph {
    /// Lays out the top level and the members of every group, each scope
    /// independently, in columns of increasing [`precursors`] level.
    ///
    /// Members of a group are measured at their drawing scale within it.
    ///
    /// [`precursors`]: crate::algorithms::precursors
    pub fn arrange(&mut self, config: &LayoutConfig) {
        let mut scopes: Vec<(f64, Vec<NodeIndex>)> = vec![(1.0, self.roots().collect())];
        scopes.extend(
            self.nodes_iter()
                .filter(|&node| self.is_group(node))
                .map(|group| (NESTING_SCALE, self.children(group).collect())),
        );

        for (factor, nodes) in scopes {
            let columns: Vec<Vec<(NodeIndex, Size)>> = level_columns(self, nodes)
                .into_iter()
                .map(|column| {
                    column
                        .into_iter()
                        .map(|node| {
                            let size = self.node(node).map_or_else(Size::default, |n| n.size());
                            (node, size.scaled(factor))
                        })
                        .collect()
                })
                .collect();
            for (node, position) in plan_layout(&columns, config) {
                self.set_position(node, position);
            }
        }
        debug!(nodes = self.node_count(), "arranged document");
    }
}
