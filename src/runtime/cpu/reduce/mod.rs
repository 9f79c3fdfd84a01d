//! Parallel reduction engine
//!
//! One engine serves every reduction kernel. A call partitions its iteration
//! space with [`partition`], folds each range on the worker pool into a
//! private accumulator, then merges the partials on the calling thread in
//! ascending range order and finalizes once.
//!
//! ```text
//!   [0 ........ n)
//!    |  range 0  |  range 1  | ... |  range k  |     partition(n, budget)
//!        fold        fold              fold         worker pool
//!         \__________\____ merge ______/           calling thread, in order
//!                          |
//!                      finalize(acc, n)
//! ```
//!
//! Slices of a TAD reduction are processed one after another; each slice is
//! itself reduced in parallel.

mod job;
mod strategy;

pub use job::{ElementView, ReductionJob};
pub use strategy::{FnStrategy, ReduceStrategy};

use super::client::CpuClient;
use super::partition::partition;
use crate::tensor::{ShapeDescriptor, ShapeIndexer, TadPack};
use rayon::prelude::*;

/// Reduce every element of `job` to a single value
///
/// An empty job finalizes the seed with a count of zero without calling
/// `combine`.
#[tracing::instrument(level = "debug", skip_all, fields(len = job.len(), strided = job.view().is_strided()))]
pub fn run_scalar_reduction<T, S>(client: &CpuClient, job: &ReductionJob<'_, T, S>) -> S::Out
where
    T: Copy + Sync,
    S: ReduceStrategy<T>,
{
    let strategy = job.strategy;
    let total = job.len();
    if total == 0 {
        tracing::debug!("empty input, finalizing identity");
        return strategy.finalize(strategy.seed(), 0);
    }

    let budget = match job.thread_budget {
        Some(requested) => requested.min(client.config().resolved_max_threads()),
        None => client.thread_budget(total),
    };
    let ranges = partition(total, budget);
    tracing::debug!(budget, tasks = ranges.len(), "partitioned");

    let partials: Vec<S::Acc> = if ranges.len() == 1 {
        vec![job.fold_range(ranges[0])]
    } else {
        // Indexed collect keeps partials in range order regardless of completion order
        client.install(|| ranges.par_iter().map(|&r| job.fold_range(r)).collect())
    };

    let mut partials = partials.into_iter();
    let first = partials.next().unwrap_or_else(|| strategy.seed());
    let merged = partials.fold(first, |acc, p| strategy.merge(acc, p));
    strategy.finalize(merged, total)
}

/// Reduce `data` along a decomposition, producing one value per slice
///
/// - [`TadPack::Passthrough`]: one value per element, `finalize(combine(seed, x), 1)`,
///   in logical order of `descriptor`
/// - [`TadPack::Full`]: a single value over the whole array
/// - [`TadPack::Slices`]: one value per slice, in slice order
///
/// `thread_budget` overrides the client's budget for every slice; it is still
/// capped by the client's thread ceiling.
#[tracing::instrument(level = "debug", skip_all, fields(shape = %descriptor))]
pub fn run_tad_reduction<T, S>(
    client: &CpuClient,
    data: &[T],
    descriptor: &ShapeDescriptor,
    pack: &TadPack,
    strategy: &S,
    thread_budget: Option<usize>,
) -> Vec<S::Out>
where
    T: Copy + Sync,
    S: ReduceStrategy<T>,
{
    match pack {
        TadPack::Passthrough => {
            tracing::debug!("no axes, passing elements through");
            let indexer = ShapeIndexer::new(descriptor);
            indexer
                .cursor(0, indexer.len())
                .map(|offset| {
                    let acc = strategy.combine(strategy.seed(), data[offset]);
                    strategy.finalize(acc, 1)
                })
                .collect()
        }
        TadPack::Full => {
            tracing::debug!("all axes, using the scalar path");
            let indexer = ShapeIndexer::new(descriptor);
            let job = budgeted(ReductionJob::new(data, &indexer, strategy), thread_budget);
            vec![run_scalar_reduction(client, &job)]
        }
        TadPack::Slices(tad) => {
            let indexer = ShapeIndexer::new(tad.descriptor());
            tracing::debug!(
                slices = tad.num_slices(),
                slice_len = tad.slice_len(),
                strided = tad.descriptor().element_wise_stride().is_some(),
                "reducing slices"
            );
            tad.offsets()
                .iter()
                .map(|&base| {
                    let view = ElementView::for_indexer(&indexer, base);
                    let job = budgeted(ReductionJob::with_view(data, view, strategy), thread_budget);
                    run_scalar_reduction(client, &job)
                })
                .collect()
        }
    }
}

fn budgeted<'a, T, S>(job: ReductionJob<'a, T, S>, budget: Option<usize>) -> ReductionJob<'a, T, S>
where
    T: Copy + Sync,
    S: ReduceStrategy<T>,
{
    match budget {
        Some(n) => job.with_thread_budget(n),
        None => job,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dtype::DType;
    use crate::runtime::cpu::ParallelismConfig;
    use crate::tensor::decompose;

    fn client() -> CpuClient {
        CpuClient::new(ParallelismConfig::new(Some(4), Some(1))).unwrap()
    }

    fn sum_f64() -> impl ReduceStrategy<f64, Acc = f64, Out = f64> {
        FnStrategy::new(|| 0.0f64, |acc, x: f64| acc + x, |a, b| a + b, |acc, _| acc)
    }

    #[test]
    fn test_sum_of_ones_any_budget() {
        let client = client();
        let data = vec![1.0f64; 37];
        let desc = ShapeDescriptor::contiguous(&[37], DType::F64);
        let indexer = ShapeIndexer::new(&desc);
        let sum = sum_f64();
        for budget in 1..=37 {
            let job = ReductionJob::new(&data, &indexer, &sum).with_thread_budget(budget);
            assert_eq!(run_scalar_reduction(&client, &job), 37.0);
        }
    }

    #[test]
    fn test_empty_never_combines() {
        let client = client();
        let data: Vec<i32> = Vec::new();
        let desc = ShapeDescriptor::contiguous(&[0], DType::I32);
        let indexer = ShapeIndexer::new(&desc);
        let strategy = FnStrategy::new(
            || 5i64,
            |_, _: i32| panic!("combine called on empty input"),
            |a, b| a + b,
            |acc, n| (acc, n),
        );
        let job = ReductionJob::new(&data, &indexer, &strategy);
        assert_eq!(run_scalar_reduction(&client, &job), (5, 0));
    }

    #[test]
    fn test_merge_order_is_ascending() {
        // Each partial carries the smallest element of its range
        let client = client();
        let data: Vec<u32> = (0..8).collect();
        let desc = ShapeDescriptor::contiguous(&[8], DType::U32);
        let indexer = ShapeIndexer::new(&desc);
        let strategy = FnStrategy::new(
            || (u32::MAX, 0u64),
            |(first, n), x: u32| (first.min(x), n + 1),
            |(a, na), (b, nb)| {
                assert!(a < b, "partials merged out of order");
                (a, na + nb)
            },
            |(first, n), _| (first, n),
        );
        let job = ReductionJob::new(&data, &indexer, &strategy).with_thread_budget(4);
        assert_eq!(run_scalar_reduction(&client, &job), (0, 8));
    }

    #[test]
    fn test_budget_override_respects_ceiling() {
        use std::sync::atomic::{AtomicUsize, Ordering};

        let data = vec![1u64; 64];
        let desc = ShapeDescriptor::contiguous(&[64], DType::U64);
        let indexer = ShapeIndexer::new(&desc);
        let merges = AtomicUsize::new(0);
        let strategy = FnStrategy::new(
            || 0u64,
            |acc, x: u64| acc + x,
            |a, b| {
                merges.fetch_add(1, Ordering::Relaxed);
                a + b
            },
            |acc, _| acc,
        );

        let single = CpuClient::new(ParallelismConfig::new(Some(1), Some(1))).unwrap();
        let job = ReductionJob::new(&data, &indexer, &strategy).with_thread_budget(64);
        assert_eq!(run_scalar_reduction(&single, &job), 64);
        assert_eq!(merges.swap(0, Ordering::Relaxed), 0);

        let client = client();
        let ceiling = client.config().resolved_max_threads();
        assert_eq!(run_scalar_reduction(&client, &job), 64);
        assert_eq!(merges.load(Ordering::Relaxed), ceiling - 1);

        let pack = decompose(&desc, &[0]).unwrap();
        merges.store(0, Ordering::Relaxed);
        let out = run_tad_reduction(&single, &data, &desc, &pack, &strategy, Some(64));
        assert_eq!(out, vec![64]);
        assert_eq!(merges.load(Ordering::Relaxed), 0);
    }

    #[test]
    fn test_mean_finalize_gets_count() {
        let client = client();
        let data = [2.0f64, 4.0, 6.0, 8.0];
        let desc = ShapeDescriptor::contiguous(&[4], DType::F64);
        let indexer = ShapeIndexer::new(&desc);
        let mean = FnStrategy::new(|| 0.0f64, |a, x: f64| a + x, |a, b| a + b, |a, n| a / n as f64);
        let job = ReductionJob::new(&data, &indexer, &mean).with_thread_budget(3);
        assert_eq!(run_scalar_reduction(&client, &job), 5.0);
    }

    #[test]
    fn test_tad_sums() {
        let client = client();
        let data = [1.0f64, 2.0, 3.0, 4.0, 5.0, 6.0];
        let desc = ShapeDescriptor::contiguous(&[2, 3], DType::F64);
        let sum = sum_f64();

        let rows = decompose(&desc, &[1]).unwrap();
        assert_eq!(
            run_tad_reduction(&client, &data, &desc, &rows, &sum, None),
            vec![6.0, 15.0]
        );

        let cols = decompose(&desc, &[0]).unwrap();
        assert_eq!(
            run_tad_reduction(&client, &data, &desc, &cols, &sum, Some(2)),
            vec![5.0, 7.0, 9.0]
        );

        let all = decompose(&desc, &[0, 1]).unwrap();
        assert_eq!(
            run_tad_reduction(&client, &data, &desc, &all, &sum, None),
            vec![21.0]
        );

        let none = decompose(&desc, &[]).unwrap();
        assert_eq!(
            run_tad_reduction(&client, &data, &desc, &none, &sum, None),
            data.to_vec()
        );
    }

    #[test]
    fn test_tad_on_general_strides() {
        // Transposed view of [[1,2,3],[4,5,6]] is [[1,4],[2,5],[3,6]]
        let client = client();
        let data = [1.0f64, 2.0, 3.0, 4.0, 5.0, 6.0];
        let desc = ShapeDescriptor::contiguous(&[2, 3], DType::F64)
            .transpose(0, 1)
            .unwrap();
        let sum = sum_f64();
        let rows = decompose(&desc, &[1]).unwrap();
        assert_eq!(
            run_tad_reduction(&client, &data, &desc, &rows, &sum, Some(2)),
            vec![5.0, 7.0, 9.0]
        );
        let all = decompose(&desc, &[0, 1]).unwrap();
        assert_eq!(
            run_tad_reduction(&client, &data, &desc, &all, &sum, Some(3)),
            vec![21.0]
        );
    }
}
