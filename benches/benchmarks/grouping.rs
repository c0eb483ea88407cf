#![allow(clippy::unit_arg)] // Required for black_box uses

use criterion::{black_box, criterion_group, Criterion};
use slategraph::{BlockGraph, GroupInfo, NodeIndex};

use crate::helpers::*;

// -----------------------------------------------------------------------------
// Benchmark functions
// -----------------------------------------------------------------------------

/// Groups every other block of a chain, projecting two links per group.
struct GroupAlternateBlocks {
    graph: BlockGraph,
    nodes: Vec<NodeIndex>,
}
impl SizedBenchmarkWithInput for GroupAlternateBlocks {
    type State = BlockGraph;

    fn name() -> &'static str {
        "group_alternate_blocks"
    }

    fn setup(size: usize) -> Self {
        let (graph, nodes) = make_line_document(size);
        Self { graph, nodes }
    }

    fn prepare_run(&self) -> BlockGraph {
        self.graph.clone()
    }

    fn run(&self, mut graph: BlockGraph) -> impl Sized {
        for &node in self.nodes.iter().step_by(2) {
            black_box(graph.group([node]).unwrap());
        }
        graph
    }
}

/// Dissolves a single group holding half of a chain.
struct UngroupHalfChain {
    graph: BlockGraph,
    group: NodeIndex,
}
impl SizedBenchmarkWithInput for UngroupHalfChain {
    type State = BlockGraph;

    fn name() -> &'static str {
        "ungroup_half_chain"
    }

    fn setup(size: usize) -> Self {
        let (mut graph, nodes) = make_line_document(size);
        let group = graph.group(nodes[..size / 2].iter().copied()).unwrap();
        Self { graph, group }
    }

    fn prepare_run(&self) -> BlockGraph {
        self.graph.clone()
    }

    fn run(&self, mut graph: BlockGraph) -> impl Sized {
        black_box(graph.ungroup(self.group).unwrap());
        graph
    }
}

/// Rebuilds the groups of a document from their records, innermost last in
/// the batch so every pass but the first waits on subgroups.
struct RestoreNestedGroups {
    graph: BlockGraph,
    records: Vec<GroupInfo>,
}
impl SizedBenchmarkWithInput for RestoreNestedGroups {
    type State = BlockGraph;

    fn name() -> &'static str {
        "restore_nested_groups"
    }

    fn sizes() -> &'static [usize] {
        &[10, 100, 1_000]
    }

    fn setup(size: usize) -> Self {
        let (mut graph, pairs) = make_pairs_document(size);
        let groups: Vec<NodeIndex> = pairs
            .iter()
            .map(|&pair| graph.group(pair).unwrap())
            .collect();
        for chunk in groups.chunks(4) {
            graph.group(chunk.iter().copied()).unwrap();
        }
        let mut records = graph.groups_info();
        records.reverse();

        let (graph, _) = make_pairs_document(size);
        Self { graph, records }
    }

    fn prepare_run(&self) -> BlockGraph {
        self.graph.clone()
    }

    fn run(&self, mut graph: BlockGraph) -> impl Sized {
        black_box(graph.restore_groups(self.records.iter().cloned()));
        graph
    }
}

// -----------------------------------------------------------------------------
// Criterion definitions
// -----------------------------------------------------------------------------

criterion_group! {
    name = criterion_group;
    config = Criterion::default();
    targets =
        GroupAlternateBlocks::criterion,
        UngroupHalfChain::criterion,
        RestoreNestedGroups::criterion,
}
