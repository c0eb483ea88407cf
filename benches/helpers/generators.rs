//! Benchmark document generators.

use slategraph::{BlockGraph, BlockId, LinkKind, NodeIndex};

/// Adds a block with an `in` and an `out` port.
pub fn add_filter(graph: &mut BlockGraph, id: u32) -> NodeIndex {
    let node = graph.add_block(BlockId(id), "Filter", format!("filter{id}")).unwrap();
    graph.insert_port(node, 0, "in", 0, true, false).unwrap();
    graph.insert_port(node, 1, "out", 0, false, true).unwrap();
    node
}

/// Create a chain of blocks.
///
/// o ---> o ---> o ---> o ---> o   ...
///
pub fn make_line_document(size: usize) -> (BlockGraph, Vec<NodeIndex>) {
    let mut graph = BlockGraph::new();
    let nodes: Vec<NodeIndex> = (0..size as u32).map(|id| add_filter(&mut graph, id)).collect();
    for (&from, &to) in nodes.iter().zip(&nodes[1..]) {
        graph
            .connect_ports(from, "out", to, "in", LinkKind::Synchronous)
            .unwrap();
    }
    (graph, nodes)
}

/// Create a document with `size` independent pairs of linked blocks.
///
/// o ---> o    o ---> o    o ---> o   ...
///
pub fn make_pairs_document(size: usize) -> (BlockGraph, Vec<[NodeIndex; 2]>) {
    let mut graph = BlockGraph::new();
    let pairs: Vec<[NodeIndex; 2]> = (0..size as u32)
        .map(|i| {
            let pair = [add_filter(&mut graph, 2 * i), add_filter(&mut graph, 2 * i + 1)];
            graph
                .connect_ports(pair[0], "out", pair[1], "in", LinkKind::Asynchronous)
                .unwrap();
            pair
        })
        .collect();
    (graph, pairs)
}

/// Create `size` layers of two blocks, each block linked to both blocks of
/// the next layer.
///
/// o ---> o ---> o   ...
///    \ /    \ /
///    / \    / \
/// o ---> o ---> o   ...
///
pub fn make_ladder_document(size: usize) -> (BlockGraph, Vec<[NodeIndex; 2]>) {
    let mut graph = BlockGraph::new();
    let layers: Vec<[NodeIndex; 2]> = (0..size as u32)
        .map(|i| [add_filter(&mut graph, 2 * i), add_filter(&mut graph, 2 * i + 1)])
        .collect();
    for pair in layers.windows(2) {
        for from in pair[0] {
            for to in pair[1] {
                graph
                    .connect_ports(from, "out", to, "in", LinkKind::Synchronous)
                    .unwrap();
            }
        }
    }
    (graph, layers)
}
