#![allow(clippy::unit_arg)] // Required for black_box uses

use criterion::{black_box, criterion_group, Criterion};
use slategraph::algorithms::{level_columns, precursors, LayoutConfig};
use slategraph::{BlockGraph, NodeIndex};

use crate::helpers::*;

// -----------------------------------------------------------------------------
// Benchmark functions
// -----------------------------------------------------------------------------

struct LastPrecursors {
    graph: BlockGraph,
    last: NodeIndex,
}
impl SizedBenchmark for LastPrecursors {
    fn name() -> &'static str {
        "precursors_of_chain_end"
    }

    fn sizes() -> &'static [usize] {
        &[10, 100, 1_000]
    }

    fn setup(size: usize) -> Self {
        let (graph, nodes) = make_line_document(size);
        let last = *nodes.last().unwrap();
        Self { graph, last }
    }

    fn run(&self) -> impl Sized {
        precursors(&self.graph, self.last)
    }
}

struct LadderPrecursors {
    graph: BlockGraph,
    last: NodeIndex,
}
impl SizedBenchmark for LadderPrecursors {
    fn name() -> &'static str {
        "precursors_of_ladder_end"
    }

    fn sizes() -> &'static [usize] {
        &[16, 24, 100]
    }

    fn setup(size: usize) -> Self {
        let (graph, layers) = make_ladder_document(size);
        let last = layers.last().unwrap()[1];
        Self { graph, last }
    }

    fn run(&self) -> impl Sized {
        precursors(&self.graph, self.last)
    }
}

struct LevelPairs {
    graph: BlockGraph,
}
impl SizedBenchmark for LevelPairs {
    fn name() -> &'static str {
        "level_columns_of_pairs"
    }

    fn setup(size: usize) -> Self {
        let (graph, _) = make_pairs_document(size);
        Self { graph }
    }

    fn run(&self) -> impl Sized {
        level_columns(&self.graph, self.graph.nodes_iter())
    }
}

struct ArrangePairs {
    graph: BlockGraph,
}
impl SizedBenchmarkWithInput for ArrangePairs {
    type State = BlockGraph;

    fn name() -> &'static str {
        "arrange_pairs"
    }

    fn setup(size: usize) -> Self {
        let (graph, _) = make_pairs_document(size);
        Self { graph }
    }

    fn prepare_run(&self) -> BlockGraph {
        self.graph.clone()
    }

    fn run(&self, mut graph: BlockGraph) -> impl Sized {
        black_box(graph.arrange(&LayoutConfig::default()));
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
        LastPrecursors::criterion,
        LadderPrecursors::criterion,
        LevelPairs::criterion,
        ArrangePairs::criterion,
}
