use std::collections::BTreeMap;

use bitvec::vec::BitVec;

use crate::{BlockGraph, NodeIndex};

/// Returns the length of the longest chain of links ending at `node`.
///
/// Nodes without incoming links are at level 0. Links are followed
/// backwards along every incoming link, proxies included. A node reached
/// again while it is still on the current chain contributes 0, so nodes on a
/// cycle are leveled as if the cycle was cut at that point.
///
/// # Example
///
/// ```
/// # use slategraph::{BlockGraph, BlockId, LinkKind};
/// # use slategraph::algorithms::precursors;
/// let mut graph = BlockGraph::new();
/// let [a, b, c] = [1, 2, 3].map(|id| {
///     let node = graph.add_block(BlockId(id), "Filter", format!("n{id}")).unwrap();
///     graph.insert_port(node, 0, "in", 0, true, false).unwrap();
///     graph.insert_port(node, 1, "out", 0, false, true).unwrap();
///     node
/// });
/// graph.connect_ports(a, "out", b, "in", LinkKind::Synchronous).unwrap();
/// graph.connect_ports(b, "out", c, "in", LinkKind::Synchronous).unwrap();
///
/// assert_eq!(precursors(&graph, a), 0);
/// assert_eq!(precursors(&graph, c), 2);
/// ```
pub fn precursors(graph: &BlockGraph, node: NodeIndex) -> usize {
    Leveler::new(graph).level(node).0
}

/// Buckets nodes into columns by their [`precursors`] level.
///
/// Columns are returned in level order, each keeping the order in which its
/// nodes were given. Levels no node sits at produce no column.
pub fn level_columns(
    graph: &BlockGraph,
    nodes: impl IntoIterator<Item = NodeIndex>,
) -> Vec<Vec<NodeIndex>> {
    let mut leveler = Leveler::new(graph);
    let mut columns: BTreeMap<usize, Vec<NodeIndex>> = BTreeMap::new();
    for node in nodes {
        columns
            .entry(leveler.level(node).0)
            .or_default()
            .push(node);
    }
    columns.into_values().collect()
}

/// Backwards walk computing [`precursors`] levels.
///
/// A level is remembered only when its walk never met a node already on the
/// chain. Such a node has no cycle upstream of it, so its level does not
/// depend on the chain it was reached from. Acyclic documents are leveled in
/// time linear in their size.
struct Leveler<'g> {
    graph: &'g BlockGraph,
    on_path: BitVec,
    known: Vec<Option<usize>>,
}

impl<'g> Leveler<'g> {
    fn new(graph: &'g BlockGraph) -> Self {
        let capacity = graph.node_capacity();
        let mut on_path = BitVec::with_capacity(capacity);
        on_path.resize(capacity, false);
        Self {
            graph,
            on_path,
            known: vec![None; capacity],
        }
    }

    /// Returns the level of `node`, and whether the walk was cut short at a
    /// node already on the chain.
    fn level(&mut self, node: NodeIndex) -> (usize, bool) {
        if let Some(level) = self.known[node.index()] {
            return (level, false);
        }
        if self.on_path[node.index()] {
            return (0, true);
        }
        let graph = self.graph;
        let in_links = graph.in_links(node);
        if in_links.is_empty() {
            self.known[node.index()] = Some(0);
            return (0, false);
        }

        self.on_path.set(node.index(), true);
        let mut longest = 0;
        let mut cut = false;
        for link in in_links.iter().filter_map(|&link| graph.link(link)) {
            let (level, cut_short) = self.level(link.from().node);
            longest = longest.max(level + 1);
            cut |= cut_short;
        }
        self.on_path.set(node.index(), false);

        if !cut {
            self.known[node.index()] = Some(longest);
        }
        (longest, cut)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{BlockId, LinkKind};

    fn filters(graph: &mut BlockGraph, count: u32) -> Vec<NodeIndex> {
        (0..count)
            .map(|id| {
                let node = graph.add_block(BlockId(id), "Filter", format!("f{id}")).unwrap();
                graph.insert_port(node, 0, "in", 0, true, false).unwrap();
                graph.insert_port(node, 1, "out", 0, false, true).unwrap();
                node
            })
            .collect()
    }

    #[test]
    fn longest_chain_wins() {
        let mut graph = BlockGraph::new();
        let n = filters(&mut graph, 4);
        // n0 -> n1 -> n2 -> n3 and the shortcut n0 -> n3.
        for (from, to) in [(0, 1), (1, 2), (2, 3), (0, 3)] {
            graph
                .connect_ports(n[from], "out", n[to], "in", LinkKind::Synchronous)
                .unwrap();
        }
        assert_eq!(
            n.iter().map(|&node| precursors(&graph, node)).collect::<Vec<_>>(),
            [0, 1, 2, 3]
        );
        assert_eq!(
            level_columns(&graph, n.iter().rev().copied()),
            [vec![n[0]], vec![n[1]], vec![n[2]], vec![n[3]]]
        );
    }

    #[test]
    fn cycles_terminate() {
        let mut graph = BlockGraph::new();
        let n = filters(&mut graph, 4);
        // n0 -> n1 -> n2 -> n1, n2 -> n3.
        for (from, to) in [(0, 1), (1, 2), (2, 1), (2, 3)] {
            graph
                .connect_ports(n[from], "out", n[to], "in", LinkKind::Synchronous)
                .unwrap();
        }
        // n1 sees n0 (level 0) and n2, whose only precursor n1 is on the path.
        assert_eq!(precursors(&graph, n[1]), 2);
        assert_eq!(precursors(&graph, n[2]), 2);
        assert_eq!(precursors(&graph, n[3]), 3);

        // A pure cycle with no entry point.
        let mut ring = BlockGraph::new();
        let r = filters(&mut ring, 3);
        for (from, to) in [(0, 1), (1, 2), (2, 0)] {
            ring.connect_ports(r[from], "out", r[to], "in", LinkKind::Synchronous)
                .unwrap();
        }
        assert_eq!(precursors(&ring, r[0]), 3);
        assert_eq!(level_columns(&ring, r.clone()).len(), 1);
    }

    #[test]
    fn cycles_level_the_same_in_columns() {
        let mut graph = BlockGraph::new();
        let n = filters(&mut graph, 5);
        // n0 -> n1 -> n2 -> n3 -> n1, n3 -> n4.
        for (from, to) in [(0, 1), (1, 2), (2, 3), (3, 1), (3, 4)] {
            graph
                .connect_ports(n[from], "out", n[to], "in", LinkKind::Synchronous)
                .unwrap();
        }
        let single: Vec<usize> = n.iter().map(|&node| precursors(&graph, node)).collect();
        assert_eq!(single, [0, 3, 3, 3, 4]);

        let columns = level_columns(&graph, n.clone());
        assert_eq!(columns, [vec![n[0]], vec![n[1], n[2], n[3]], vec![n[4]]]);
    }

    #[test]
    fn wide_ladders_level_quickly() {
        // 40 layers of two blocks, each linked to both blocks of the next
        // layer: 2^39 distinct chains end at the last layer.
        let mut graph = BlockGraph::new();
        let n = filters(&mut graph, 80);
        for layer in n.chunks(2).collect::<Vec<_>>().windows(2) {
            for &from in layer[0] {
                for &to in layer[1] {
                    graph
                        .connect_ports(from, "out", to, "in", LinkKind::Synchronous)
                        .unwrap();
                }
            }
        }
        assert_eq!(precursors(&graph, n[79]), 39);

        let columns = level_columns(&graph, n.iter().copied());
        assert_eq!(columns.len(), 40);
        assert!(columns.iter().all(|column| column.len() == 2));
        assert_eq!(columns[39], [n[78], n[79]]);
    }
}
