//! Benchmarking utilities
//!
//! Please consider using the [`criterion_benchmark`](crate::criterion_benchmark)
//! macro instead of calling these implementation details directly.

use crate::Simulate;
use clap::{Args, Command, FromArgMatches};
use criterion::{BenchmarkId, Criterion, Throughput};
use data::{
    field::Field,
    grid::{Geometry, Grid},
    parameters::Parameters,
};
use std::{hint::black_box, sync::Once};

/// Re-export criterion for the criterion_benchmark macro
pub use criterion;

// Make sure env_logger is only initialized once
fn init_logger() {
    static INIT_LOGGER: Once = Once::new();
    INIT_LOGGER.call_once(env_logger::init);
}

/// Common criterion benchmark for all pseudo-diffusion computations
pub fn criterion_benchmark<Simulation: Simulate>(c: &mut Criterion, backend_name: &str) {
    init_logger();

    let args = Simulation::CliArgs::from_arg_matches(
        &Simulation::CliArgs::augment_args(Command::default().no_binary_name(true))
            .get_matches_from(None::<&str>),
    )
    .expect("Failed to parse arguments from defaults & environment");

    let params = black_box(Parameters::default());
    let sim = Simulation::new(params, black_box(args))
        .unwrap_or_else(|e| panic!("Failed to set up simulation: {e}"));
    let mut group = c.benchmark_group(backend_name.to_owned());
    for num_steps_pow2 in 0..=4 {
        let num_steps = 2usize.pow(num_steps_pow2);
        for size_pow2 in 3..=7 {
            // Keep an odd number of points so that the center is a grid point
            let size = 2usize.pow(size_pow2) + 1;
            let grid = Grid::new(Geometry {
                shape: [size; 3],
                ..Default::default()
            })
            .expect("Benchmark geometry should be valid");
            let mut field = Field::seed(&grid, &params);

            group.throughput(Throughput::Elements((grid.num_points() * num_steps) as u64));
            group.bench_function(
                BenchmarkId::from_parameter(format!("{size}^3elems,{num_steps}steps")),
                |b| {
                    b.iter(|| {
                        sim.perform_steps(&grid, &mut field, num_steps)
                            .unwrap_or_else(|e| panic!("Failed to perform steps: {e}"))
                    });
                },
            );
            black_box(field);
        }
    }
    group.finish();
}

/// Macro that generates a complete criterion benchmark harness for you
#[macro_export]
macro_rules! criterion_benchmark {
    ($backend:ident) => {
        fn criterion_benchmark(c: &mut $crate::benchmark::criterion::Criterion) {
            $crate::benchmark::criterion_benchmark::<$backend::Simulation>(
                c,
                stringify!($backend),
            )
        }
        $crate::benchmark::criterion::criterion_group!(benches, criterion_benchmark);
        $crate::benchmark::criterion::criterion_main!(benches);
    };
}
