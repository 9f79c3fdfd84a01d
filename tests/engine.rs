//! Integration tests for the execution engine building blocks
//!
//! TAD decomposition, partitioning and the reduction engine driven directly,
//! without the dispatcher.

mod common;

use common::{create_cpu_client, create_cpu_client_with};
use ndexec::dtype::DType;
use ndexec::error::Error;
use ndexec::runtime::cpu::{
    CpuClient, FnStrategy, ParallelismConfig, ReduceStrategy, ReductionJob, partition,
    run_scalar_reduction, run_tad_reduction,
};
use ndexec::tensor::{Order, ShapeDescriptor, ShapeIndexer, TadPack, decompose};
use std::sync::atomic::{AtomicUsize, Ordering};

fn sum_f64() -> impl ReduceStrategy<f64, Acc = f64, Out = f64> {
    FnStrategy::new(|| 0.0f64, |acc, x: f64| acc + x, |a, b| a + b, |acc, _| acc)
}

// ============================================================================
// TAD decomposition
// ============================================================================

#[test]
fn test_decompose_2x3() {
    let d = ShapeDescriptor::contiguous(&[2, 3], DType::F32);

    let TadPack::Slices(rows) = decompose(&d, &[1]).unwrap() else {
        panic!("expected slices");
    };
    assert_eq!(rows.num_slices(), 2);
    assert_eq!(rows.slice_len(), 3);
    assert_eq!(rows.offsets(), &[0, 3]);
    assert_eq!(rows.kept_shape(), &[2]);

    let TadPack::Slices(cols) = decompose(&d, &[0]).unwrap() else {
        panic!("expected slices");
    };
    assert_eq!(cols.num_slices(), 3);
    assert_eq!(cols.slice_len(), 2);
    assert_eq!(cols.offsets(), &[0, 1, 2]);

    assert_eq!(decompose(&d, &[]).unwrap(), TadPack::Passthrough);
    assert_eq!(decompose(&d, &[1, 0]).unwrap(), TadPack::Full);
    assert!(decompose(&d, &[1, 0]).unwrap().is_degenerate());
}

#[test]
fn test_decompose_rejects_bad_axes() {
    let d = ShapeDescriptor::contiguous(&[2, 3, 4], DType::F64);
    assert!(matches!(
        decompose(&d, &[3]),
        Err(Error::InvalidDimension { dim: 3, ndim: 3 })
    ));
    assert!(matches!(
        decompose(&d, &[0, 2, 0]),
        Err(Error::InvalidArgument { arg: "axes", .. })
    ));
}

#[test]
fn test_decompose_column_major_offsets_follow_kept_axes() {
    // F-order [2, 3, 4]: strides [1, 2, 6]
    let d = ShapeDescriptor::contiguous_with_order(&[2, 3, 4], Order::ColumnMajor, DType::F32);
    let TadPack::Slices(tad) = decompose(&d, &[1]).unwrap() else {
        panic!("expected slices");
    };
    assert_eq!(tad.descriptor().strides(), &[2]);
    assert_eq!(tad.kept_shape(), &[2, 4]);
    // Kept axes (0, 2) enumerated row-major: (0,0) (0,1) ... (1,3)
    assert_eq!(tad.offsets(), &[0, 6, 12, 18, 1, 7, 13, 19]);
}

// ============================================================================
// Partitioning
// ============================================================================

#[test]
fn test_partition_examples() {
    let lens = |total, budget| -> Vec<usize> { partition(total, budget).iter().map(|r| r.len).collect() };
    assert_eq!(lens(10, 3), vec![4, 3, 3]);
    assert_eq!(lens(3, 8), vec![1, 1, 1]);
    assert_eq!(lens(7, 0), vec![7]);
    assert!(partition(0, 4).is_empty());
}

#[test]
fn test_thread_budget_respects_floor() {
    let config = ParallelismConfig::new(Some(1), Some(100));
    assert_eq!(config.thread_budget(10_000), 1);

    let client = create_cpu_client_with(64, 100);
    assert_eq!(client.thread_budget(1), 1);
    assert_eq!(client.thread_budget(0), 1);
    assert!(client.thread_budget(250) <= 3);
    assert!(client.thread_budget(1_000_000) <= client.num_threads());
}

// ============================================================================
// Reduction engine
// ============================================================================

#[test]
fn test_scalar_sum_every_budget() {
    let client = create_cpu_client();
    let ones = vec![1.0f64; 57];
    let d = ShapeDescriptor::contiguous(&[57], DType::F64);
    let indexer = ShapeIndexer::new(&d);
    let sum = sum_f64();
    for budget in 1..=57 {
        let job = ReductionJob::new(&ones, &indexer, &sum).with_thread_budget(budget);
        assert_eq!(run_scalar_reduction(&client, &job), 57.0, "budget {}", budget);
    }
}

#[test]
fn test_empty_reduction_never_combines() {
    let client = create_cpu_client();
    let calls = AtomicUsize::new(0);
    let strategy = FnStrategy::new(
        || 42i64,
        |acc, x: i64| {
            calls.fetch_add(1, Ordering::Relaxed);
            acc + x
        },
        |a, b| a + b,
        |acc, n| (acc, n),
    );
    let d = ShapeDescriptor::contiguous(&[0, 4], DType::I64);
    let indexer = ShapeIndexer::new(&d);
    let job = ReductionJob::new(&[], &indexer, &strategy);
    assert_eq!(run_scalar_reduction(&client, &job), (42, 0));
    assert_eq!(calls.load(Ordering::Relaxed), 0);
}

#[test]
fn test_merge_order_is_ascending() {
    let client = create_cpu_client();
    let data: Vec<u32> = (0..40).collect();
    let d = ShapeDescriptor::contiguous(&[40], DType::U32);
    let indexer = ShapeIndexer::new(&d);

    // Records the first element of each partial; merge concatenates
    let strategy = FnStrategy::new(
        || (u32::MAX, 0u32),
        |acc: (u32, u32), x: u32| (acc.0.min(x), acc.1 + 1),
        |a: (u32, u32), b: (u32, u32)| {
            assert!(a.0 < b.0, "partials merged out of order");
            (a.0, a.1 + b.1)
        },
        |acc, n| {
            assert_eq!(acc.1 as usize, n);
            acc.0
        },
    );
    for budget in [2, 3, 7, 40] {
        let job = ReductionJob::new(&data, &indexer, &strategy).with_thread_budget(budget);
        assert_eq!(run_scalar_reduction(&client, &job), 0);
    }
}

#[test]
fn test_tad_reduction_example() {
    let client = create_cpu_client();
    let data = [1.0f64, 2.0, 3.0, 4.0, 5.0, 6.0];
    let d = ShapeDescriptor::contiguous(&[2, 3], DType::F64);
    let sum = sum_f64();

    let run = |axes: &[usize]| {
        let pack = decompose(&d, axes).unwrap();
        run_tad_reduction(&client, &data, &d, &pack, &sum, None)
    };
    assert_eq!(run(&[1]), vec![6.0, 15.0]);
    assert_eq!(run(&[0]), vec![5.0, 7.0, 9.0]);
    assert_eq!(run(&[0, 1]), vec![21.0]);
    assert_eq!(run(&[]), data.to_vec());
}

#[test]
fn test_tad_reduction_is_deterministic_per_budget() {
    let client = CpuClient::new(ParallelismConfig::new(Some(4), Some(1))).unwrap();
    let data: Vec<f32> = (0..4096).map(|i| ((i * 7919) % 1013) as f32 * 0.001).collect();
    let d = ShapeDescriptor::contiguous(&[4, 1024], DType::F32);
    let pack = decompose(&d, &[1]).unwrap();
    let sum = FnStrategy::new(|| 0.0f32, |acc, x: f32| acc + x, |a, b| a + b, |acc, _| acc);

    for budget in [1, 3, 8] {
        let first = run_tad_reduction(&client, &data, &d, &pack, &sum, Some(budget));
        let second = run_tad_reduction(&client, &data, &d, &pack, &sum, Some(budget));
        let bits = |v: &[f32]| v.iter().map(|x| x.to_bits()).collect::<Vec<_>>();
        assert_eq!(bits(&first), bits(&second));
    }
}
