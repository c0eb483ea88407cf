//! Random document strategies for property testing.

use crate::{BlockGraph, BlockId, LinkKind, NodeIndex};
use proptest::prelude::*;
use proptest::sample::Index;

fn gen_kind() -> impl Strategy<Value = LinkKind> {
    prop_oneof![
        Just(LinkKind::Synchronous),
        Just(LinkKind::Asynchronous),
        Just(LinkKind::Sequential),
    ]
}

prop_compose! {
    /// A random flat document.
    ///
    /// The document has at least one block.
    ///
    ///  - `max_blocks` is the maximum number of blocks
    ///  - `max_ports` is the maximum number of input and of output ports on
    ///    every block
    ///  - `max_links` is the maximum number of links. Picks that would join a
    ///    block to itself or repeat a link are dropped.
    pub fn gen_document(max_blocks: usize, max_ports: usize, max_links: usize)(
        ports in prop::collection::vec((0..=max_ports, 0..=max_ports), 1..=max_blocks),
        picks in prop::collection::vec((any::<Index>(), any::<Index>(), gen_kind()), 0..=max_links),
    ) -> BlockGraph {
        let mut graph = BlockGraph::new();
        let mut inputs = Vec::new();
        let mut outputs = Vec::new();
        for (i, &(n_in, n_out)) in ports.iter().enumerate() {
            let node = graph.add_block(BlockId(i as u32 + 1), "Random", format!("b{i}")).unwrap();
            for k in 0..n_in {
                let name = format!("in{k}");
                graph.insert_port(node, usize::MAX, name.clone(), 0, true, false).unwrap();
                inputs.push((node, name));
            }
            for k in 0..n_out {
                let name = format!("out{k}");
                graph.insert_port(node, usize::MAX, name.clone(), 0, false, true).unwrap();
                outputs.push((node, name));
            }
        }
        if !inputs.is_empty() && !outputs.is_empty() {
            for (out, inp, kind) in picks {
                let (from, from_port) = out.get(&outputs);
                let (to, to_port) = inp.get(&inputs);
                if from == to || graph.find_link(*from, from_port, *to, to_port).is_some() {
                    continue;
                }
                graph.connect_ports(*from, from_port, *to, to_port, kind).unwrap();
            }
        }
        graph
    }
}

prop_compose! {
    /// A random document with nested groups.
    ///
    /// Each of at most `max_groups` rounds groups a few of the current
    /// top-level nodes, so later rounds may nest earlier groups.
    pub fn gen_grouped_document(max_blocks: usize, max_ports: usize, max_links: usize)(
        mut graph in gen_document(max_blocks, max_ports, max_links),
        rounds in prop::collection::vec(prop::collection::vec(any::<Index>(), 1..=4), 0..=3),
    ) -> BlockGraph {
        for picks in rounds {
            let roots: Vec<NodeIndex> = graph.roots().collect();
            let selection: Vec<NodeIndex> = picks.iter().map(|pick| *pick.get(&roots)).collect();
            graph.group(selection).unwrap();
        }
        graph
    }
}
