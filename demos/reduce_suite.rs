//! Reduction timing suite
//!
//! ```text
//! RUST_LOG=ndexec=debug NDEXEC_NUM_THREADS=4 cargo run --release --example reduce_suite
//! ```

use ndexec::bench::{BenchmarkHarness, OpBenchmark, ReduceBenchmark};
use ndexec::prelude::*;
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let client = CpuClient::from_env()?;
    let registry = OpRegistry::with_defaults();

    let cases: &[(ReduceOp, DType, &[usize], Option<Vec<usize>>)] = &[
        (ReduceOp::Sum, DType::F32, &[1_000_000], None),
        (ReduceOp::Sum, DType::F32, &[32, 256], Some(vec![1])),
        (ReduceOp::Sum, DType::F32, &[256, 256], Some(vec![0])),
        (ReduceOp::Mean, DType::F64, &[512, 512], Some(vec![1])),
        (ReduceOp::Max, DType::I32, &[100_000], None),
        (ReduceOp::Norm2, DType::F32, &[64, 64, 64], Some(vec![0, 2])),
        (ReduceOp::CountNonZero, DType::U8, &[1 << 20], None),
    ];

    let mut benchmarks: Vec<Box<dyn OpBenchmark + '_>> = cases
        .iter()
        .map(|(op, dtype, extents, axes)| {
            Box::new(ReduceBenchmark::new(
                &registry,
                &client,
                *op,
                *dtype,
                extents,
                axes.clone(),
            )) as Box<dyn OpBenchmark + '_>
        })
        .collect();

    let harness = BenchmarkHarness::new(5, 50);
    let message = format!("reductions on {} threads", client.num_threads());
    harness.run_suite(&mut benchmarks, &message, &mut std::io::stdout().lock())?;
    Ok(())
}
