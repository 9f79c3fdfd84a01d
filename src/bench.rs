//! Timing harness for repeated op invocation
//!
//! Reports are printed as tab-separated text:
//!
//! ```text
//! OpNum	DataType	Shape	avg (us)	median (us)
//! 0	f32	[32, 256]	41	39
//! ```
//!
//! The format is for humans and ad-hoc scripts; it is not a stable interface.

use std::fmt;
use std::hint::black_box;
use std::io::Write;
use std::time::Instant;

use crate::dispatch_dtype;
use crate::dtype::{DType, Element};
use crate::error::{Error, Result};
use crate::ops::{OpCode, OpContext, OpDispatcher, OpParams, OpRegistry};
use crate::runtime::cpu::CpuClient;
use crate::tensor::{NdArray, ShapeDescriptor};

/// Header line written by [`BenchmarkHarness::run_suite`]
pub const REPORT_HEADER: &str = "OpNum\tDataType\tShape\tavg (us)\tmedian (us)";

/// One benchmarked operation
///
/// `setup` runs once before any timing; `run` is the timed body.
pub trait OpBenchmark {
    /// Opcode reported in the output
    fn opcode(&self) -> OpCode;

    /// Element type reported in the output
    fn dtype(&self) -> DType;

    /// Input extents reported in the output
    fn shape(&self) -> &[usize];

    /// Prepare inputs
    fn setup(&mut self) -> Result<()> {
        Ok(())
    }

    /// Execute the operation once
    fn run(&mut self) -> Result<()>;
}

/// Timing summary of one benchmark
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BenchmarkReport {
    /// Opcode
    pub opcode: OpCode,
    /// Input element type
    pub dtype: DType,
    /// Input extents
    pub shape: Vec<usize>,
    /// Mean of the timed runs, truncated to whole microseconds
    pub avg_us: u64,
    /// Median of the timed runs in microseconds
    pub median_us: u64,
}

impl BenchmarkReport {
    /// Summarise per-run timings (microseconds)
    ///
    /// An empty sample reports zero for both statistics.
    pub fn from_samples(opcode: OpCode, dtype: DType, shape: &[usize], samples: &[u64]) -> Self {
        let (avg_us, median_us) = if samples.is_empty() {
            (0, 0)
        } else {
            let total: u128 = samples.iter().map(|&s| u128::from(s)).sum();
            let avg = (total / samples.len() as u128) as u64;
            let mut sorted = samples.to_vec();
            sorted.sort_unstable();
            (avg, sorted[sorted.len() / 2])
        };
        Self {
            opcode,
            dtype,
            shape: shape.to_vec(),
            avg_us,
            median_us,
        }
    }
}

impl fmt::Display for BenchmarkReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}\t{}\t[", self.opcode.0, self.dtype)?;
        for (i, extent) in self.shape.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{extent}")?;
        }
        write!(f, "]\t{}\t{}", self.avg_us, self.median_us)
    }
}

/// Drives warm-up and timed iterations of an [`OpBenchmark`]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BenchmarkHarness {
    /// Untimed runs before measuring
    pub warmup_iterations: usize,
    /// Timed runs
    pub run_iterations: usize,
}

impl Default for BenchmarkHarness {
    fn default() -> Self {
        Self {
            warmup_iterations: 5,
            run_iterations: 100,
        }
    }
}

impl BenchmarkHarness {
    /// Harness with the given iteration counts
    pub fn new(warmup_iterations: usize, run_iterations: usize) -> Self {
        Self {
            warmup_iterations,
            run_iterations,
        }
    }

    /// Set up, warm up and time `bench`
    ///
    /// The first error from the benchmark aborts the measurement.
    pub fn benchmark_operation(&self, bench: &mut dyn OpBenchmark) -> Result<BenchmarkReport> {
        bench.setup()?;
        for _ in 0..self.warmup_iterations {
            bench.run()?;
        }

        let mut samples = Vec::with_capacity(self.run_iterations);
        for _ in 0..self.run_iterations {
            let start = Instant::now();
            bench.run()?;
            let elapsed = start.elapsed().as_micros();
            samples.push(u64::try_from(elapsed).unwrap_or(u64::MAX));
        }

        let report =
            BenchmarkReport::from_samples(bench.opcode(), bench.dtype(), bench.shape(), &samples);
        tracing::debug!(
            opcode = report.opcode.0,
            dtype = %report.dtype,
            avg_us = report.avg_us,
            median_us = report.median_us,
            "benchmark finished"
        );
        Ok(report)
    }

    /// Benchmark every entry and write a report table to `writer`
    ///
    /// `message` is written first on its own line when non-empty.
    pub fn run_suite<'b, W: Write>(
        &self,
        benchmarks: &mut [Box<dyn OpBenchmark + 'b>],
        message: &str,
        writer: &mut W,
    ) -> Result<Vec<BenchmarkReport>> {
        let io = |err: std::io::Error| Error::Internal(format!("writing benchmark report: {err}"));

        if !message.is_empty() {
            writeln!(writer, "{message}").map_err(io)?;
        }
        writeln!(writer, "{REPORT_HEADER}").map_err(io)?;

        let mut reports = Vec::with_capacity(benchmarks.len());
        for bench in benchmarks.iter_mut() {
            let report = self.benchmark_operation(bench.as_mut())?;
            writeln!(writer, "{report}").map_err(io)?;
            reports.push(report);
        }
        writeln!(writer).map_err(io)?;
        Ok(reports)
    }
}

/// Reduction over synthetic data, executed through the dispatcher
///
/// `setup` builds the input and binds an output once, so each timed run only
/// covers [`OpDispatcher::execute`].
pub struct ReduceBenchmark<'r> {
    dispatcher: OpDispatcher<'r>,
    opcode: OpCode,
    dtype: DType,
    extents: Vec<usize>,
    params: OpParams,
    ctx: Option<OpContext>,
}

impl<'r> ReduceBenchmark<'r> {
    /// Reduce an array of `extents` and `dtype` over `axes` (`None` = all)
    pub fn new(
        registry: &'r OpRegistry,
        client: &'r CpuClient,
        opcode: impl Into<OpCode>,
        dtype: DType,
        extents: &[usize],
        axes: Option<Vec<usize>>,
    ) -> Self {
        Self {
            dispatcher: OpDispatcher::new(registry, client),
            opcode: opcode.into(),
            dtype,
            extents: extents.to_vec(),
            params: OpParams {
                axes,
                ..OpParams::default()
            },
            ctx: None,
        }
    }
}

fn synthetic<T: Element>(len: usize) -> Vec<T> {
    (0..len)
        .map(|i| T::from_f64(((i * 17 + 3) % 100) as f64 / 10.0))
        .collect()
}

fn synthetic_array(dtype: DType, extents: &[usize]) -> Result<NdArray> {
    let len = ShapeDescriptor::contiguous(extents, dtype).len();
    dispatch_dtype!(dtype, T => {
        NdArray::from_vec(synthetic::<T>(len), extents)
    }, "benchmark_input")
}

impl OpBenchmark for ReduceBenchmark<'_> {
    fn opcode(&self) -> OpCode {
        self.opcode
    }

    fn dtype(&self) -> DType {
        self.dtype
    }

    fn shape(&self) -> &[usize] {
        &self.extents
    }

    fn setup(&mut self) -> Result<()> {
        let input = synthetic_array(self.dtype, &self.extents)?;
        let shapes = self.dispatcher.calculate_output_shapes(
            self.opcode,
            &[input.descriptor()],
            &self.params,
        )?;
        let mut ctx = OpContext::new(vec![input]).with_params(self.params.clone());
        for (slot, shape) in shapes.into_iter().enumerate() {
            ctx = ctx.with_output(slot, NdArray::zeros(shape)?);
        }
        self.ctx = Some(ctx);
        Ok(())
    }

    fn run(&mut self) -> Result<()> {
        let ctx = self
            .ctx
            .as_mut()
            .ok_or_else(|| Error::Internal("benchmark input not prepared".into()))?;
        self.dispatcher.execute(self.opcode, ctx)?;
        black_box(ctx.output(0)?);
        Ok(())
    }
}
