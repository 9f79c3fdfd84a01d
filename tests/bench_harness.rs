//! Integration tests for the benchmark harness output

mod common;

use common::{create_cpu_client, default_registry};
use ndexec::bench::{BenchmarkHarness, OpBenchmark, REPORT_HEADER, ReduceBenchmark};
use ndexec::dtype::DType;
use ndexec::error::{Error, Result};
use ndexec::ops::{OpCode, ReduceOp};

struct Failing;

impl OpBenchmark for Failing {
    fn opcode(&self) -> OpCode {
        OpCode(77)
    }

    fn dtype(&self) -> DType {
        DType::F32
    }

    fn shape(&self) -> &[usize] {
        &[1]
    }

    fn run(&mut self) -> Result<()> {
        Err(Error::Internal("boom".into()))
    }
}

#[test]
fn test_suite_output_format() {
    let registry = default_registry();
    let client = create_cpu_client();

    let mut benchmarks: Vec<Box<dyn OpBenchmark + '_>> = vec![
        Box::new(ReduceBenchmark::new(
            &registry,
            &client,
            ReduceOp::Sum,
            DType::F32,
            &[32, 256],
            Some(vec![1]),
        )),
        Box::new(ReduceBenchmark::new(
            &registry,
            &client,
            ReduceOp::Max,
            DType::I64,
            &[1000],
            None,
        )),
    ];

    let mut out = Vec::new();
    let reports = BenchmarkHarness::new(1, 3)
        .run_suite(&mut benchmarks, "reductions", &mut out)
        .unwrap();
    assert_eq!(reports.len(), 2);

    let text = String::from_utf8(out).unwrap();
    let lines: Vec<&str> = text.split('\n').collect();
    assert_eq!(lines[0], "reductions");
    assert_eq!(lines[1], REPORT_HEADER);
    assert!(lines[2].starts_with("0\tf32\t[32, 256]\t"));
    assert!(lines[3].starts_with("2\ti64\t[1000]\t"));
    assert_eq!(lines[2].split('\t').count(), 5);
    assert!(text.ends_with("\n\n"));
    assert_eq!(reports[1].shape, vec![1000]);
}

#[test]
fn test_benchmark_error_propagates() {
    let err = BenchmarkHarness::default()
        .benchmark_operation(&mut Failing)
        .unwrap_err();
    assert!(matches!(err, Error::Internal(_)));
}

#[test]
fn test_unsupported_dtype_fails_setup() {
    let registry = default_registry();
    let client = create_cpu_client();
    let mut bench = ReduceBenchmark::new(&registry, &client, ReduceOp::Sum, DType::Bool, &[4], None);
    let err = BenchmarkHarness::new(0, 1)
        .benchmark_operation(&mut bench)
        .unwrap_err();
    assert!(matches!(err, Error::UnsupportedDType { .. }));
}
