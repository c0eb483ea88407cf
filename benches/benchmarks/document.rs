#![allow(clippy::unit_arg)] // Required for black_box uses

use criterion::{black_box, criterion_group, Criterion};
use slategraph::BlockGraph;

use crate::helpers::*;

// -----------------------------------------------------------------------------
// Benchmark functions
// -----------------------------------------------------------------------------

struct MakeLineDocument {
    size: usize,
}
impl SizedBenchmark for MakeLineDocument {
    fn name() -> &'static str {
        "make_line_document"
    }

    fn setup(size: usize) -> Self {
        Self { size }
    }

    fn run(&self) -> impl Sized {
        make_line_document(self.size)
    }
}

struct RemoveBlocks {
    graph: BlockGraph,
}
impl SizedBenchmarkWithInput for RemoveBlocks {
    type State = BlockGraph;

    fn name() -> &'static str {
        "remove_blocks"
    }

    fn setup(size: usize) -> Self {
        let (graph, _) = make_line_document(size);
        Self { graph }
    }

    fn prepare_run(&self) -> BlockGraph {
        self.graph.clone()
    }

    fn run(&self, mut graph: BlockGraph) -> impl Sized {
        let nodes: Vec<_> = graph.nodes_iter().collect();
        for node in nodes {
            black_box(graph.remove_node(node));
        }
    }
}

// -----------------------------------------------------------------------------
// Criterion definitions
// -----------------------------------------------------------------------------

criterion_group! {
    name = criterion_group;
    config = Criterion::default();
    targets =
        MakeLineDocument::criterion,
        RemoveBlocks::criterion,
}
