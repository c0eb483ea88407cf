//! Traits to simplify the definition of criterion benchmarks.

/// A parametric-size benchmark.
pub trait SizedBenchmark: Sized {
    /// Name of the benchmark.
    fn name() -> &'static str;

    /// List of sizes to benchmark.
    fn sizes() -> &'static [usize] {
        &[100, 1_000, 10_000]
    }

    /// Initialize the benchmark with a given problem size.
    fn setup(size: usize) -> Self;

    /// Operation to benchmark.
    ///
    /// Note that the destruction of the return type is measured as part of the benchmark,
    /// so objects with expensive destructors should be avoided.
    fn run(&self) -> impl Sized;

    /// Run the benchmark under criterion for a given list of sizes.
    fn criterion(c: &mut criterion::Criterion) {
        let mut g = c.benchmark_group(Self::name());
        g.plot_config(
            criterion::PlotConfiguration::default()
                .summary_scale(criterion::AxisScale::Logarithmic),
        );

        for &size in Self::sizes() {
            let benchmark = Self::setup(size);
            g.bench_function(criterion::BenchmarkId::new(Self::name(), size), |b| {
                b.iter(|| criterion::black_box(benchmark.run()))
            });
        }
    }
}

/// A parametric-size benchmark that mutates a fresh copy of its input on
/// every iteration.
pub trait SizedBenchmarkWithInput: Sized {
    /// Type of the prepared state for a single test run.
    type State;

    /// Name of the benchmark.
    fn name() -> &'static str;

    /// List of sizes to benchmark.
    fn sizes() -> &'static [usize] {
        &[100, 1_000, 10_000]
    }

    /// Initialize the benchmark with a given problem size.
    fn setup(size: usize) -> Self;

    /// Prepare the state for a single test run.
    fn prepare_run(&self) -> Self::State;

    /// Operation to benchmark.
    fn run(&self, state: Self::State) -> impl Sized;

    /// Run the benchmark under criterion for a given list of sizes.
    fn criterion(c: &mut criterion::Criterion) {
        let mut g = c.benchmark_group(Self::name());
        g.plot_config(
            criterion::PlotConfiguration::default()
                .summary_scale(criterion::AxisScale::Logarithmic),
        );

        for &size in Self::sizes() {
            let benchmark = Self::setup(size);
            g.bench_function(criterion::BenchmarkId::new(Self::name(), size), |b| {
                b.iter_batched(
                    || benchmark.prepare_run(),
                    |state| criterion::black_box(benchmark.run(state)),
                    criterion::BatchSize::SmallInput,
                )
            });
        }
    }
}
