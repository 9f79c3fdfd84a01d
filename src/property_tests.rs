//! Property-based tests for indexing, decomposition, partitioning and the
//! reduction engine
//!
//! Shapes are kept small so every case can be checked exhaustively against
//! direct iteration. Layouts come in two families: dense ones (possibly
//! transposed) and sliced ones with gaps between elements and axes nested in
//! any order.

#[cfg(test)]
mod tests {
    use crate::dtype::DType;
    use crate::runtime::cpu::{
        CpuClient, FnStrategy, ParallelismConfig, ReductionJob, partition, run_scalar_reduction,
        run_tad_reduction,
    };
    use crate::tensor::{Order, ShapeDescriptor, ShapeIndexer, TadPack, decompose};
    use proptest::prelude::*;
    use std::collections::BTreeSet;

    fn extents_strategy() -> impl Strategy<Value = Vec<usize>> {
        prop::collection::vec(1usize..6, 0..=4)
    }

    fn order_strategy() -> impl Strategy<Value = Order> {
        prop_oneof![Just(Order::RowMajor), Just(Order::ColumnMajor)]
    }

    /// Contiguous descriptor, optionally with its first and last axes swapped
    fn descriptor_strategy() -> impl Strategy<Value = ShapeDescriptor> {
        (extents_strategy(), order_strategy(), any::<bool>()).prop_map(|(extents, order, swap)| {
            let d = ShapeDescriptor::contiguous_with_order(&extents, order, DType::F32);
            if swap && extents.len() >= 2 {
                d.transpose(0, extents.len() - 1).unwrap()
            } else {
                d
            }
        })
    }

    /// Sliced layout: axes nest in a random order over a padded parent box,
    /// every step scaled by a common factor
    fn gapped_descriptor_strategy() -> impl Strategy<Value = ShapeDescriptor> {
        (0usize..=4)
            .prop_flat_map(|rank| {
                (
                    prop::collection::vec((1usize..5, 0usize..3), rank),
                    Just((0..rank).collect::<Vec<usize>>()).prop_shuffle(),
                    1usize..4,
                    order_strategy(),
                )
            })
            .prop_map(|(axes, nesting, step, order)| {
                let extents: Vec<usize> = axes.iter().map(|&(extent, _)| extent).collect();
                let mut strides = vec![0; axes.len()];
                let mut stride = step;
                for &axis in nesting.iter().rev() {
                    let (extent, pad) = axes[axis];
                    strides[axis] = stride;
                    stride *= extent + pad;
                }
                ShapeDescriptor::new(&extents, &strides, order, DType::F32).unwrap()
            })
    }

    /// Descriptor plus an arbitrary subset of its axes
    fn with_axes(
        descriptors: impl Strategy<Value = ShapeDescriptor>,
    ) -> impl Strategy<Value = (ShapeDescriptor, Vec<usize>)> {
        descriptors.prop_flat_map(|d| {
            let rank = d.rank();
            (Just(d), prop::collection::vec(any::<bool>(), rank)).prop_map(|(d, mask)| {
                let axes = mask
                    .iter()
                    .enumerate()
                    .filter_map(|(axis, &on)| on.then_some(axis))
                    .collect();
                (d, axes)
            })
        })
    }

    fn check_offsets_injective(d: &ShapeDescriptor) -> Result<(), TestCaseError> {
        let indexer = ShapeIndexer::new(d);
        let offsets: BTreeSet<usize> = (0..indexer.len()).map(|i| indexer.offset_of(i)).collect();
        prop_assert_eq!(offsets.len(), indexer.len());
        prop_assert!(offsets.iter().all(|&o| o < d.required_len()));
        Ok(())
    }

    fn check_tad_partition(d: &ShapeDescriptor, axes: &[usize]) -> Result<(), TestCaseError> {
        let pack = decompose(d, axes).unwrap();
        let indexer = ShapeIndexer::new(d);
        let mut expected: Vec<usize> = indexer.cursor(0, indexer.len()).collect();
        expected.sort_unstable();

        if let TadPack::Slices(tad) = pack {
            let inner = ShapeIndexer::new(tad.descriptor());
            let mut reached: Vec<usize> = tad
                .offsets()
                .iter()
                .flat_map(|&base| inner.cursor(0, inner.len()).map(move |o| base + o))
                .collect();
            prop_assert_eq!(tad.num_slices() * tad.slice_len(), indexer.len());
            reached.sort_unstable();
            prop_assert_eq!(reached, expected);
        } else {
            prop_assert!(axes.is_empty() || axes.len() == d.rank());
        }
        Ok(())
    }

    fn client() -> CpuClient {
        CpuClient::new(ParallelismConfig::default()).unwrap()
    }

    proptest! {
        #[test]
        fn prop_offsets_are_injective(d in descriptor_strategy()) {
            check_offsets_injective(&d)?;
        }

        #[test]
        fn prop_gapped_offsets_are_injective(d in gapped_descriptor_strategy()) {
            check_offsets_injective(&d)?;
        }

        #[test]
        fn prop_cursor_matches_offset_of(
            d in prop_oneof![descriptor_strategy(), gapped_descriptor_strategy()],
            start_frac in 0.0f64..1.0,
        ) {
            let indexer = ShapeIndexer::new(&d);
            let start = (indexer.len() as f64 * start_frac) as usize;
            let walked: Vec<usize> = indexer.cursor(start, indexer.len() - start).collect();
            let direct: Vec<usize> = (start..indexer.len()).map(|i| indexer.offset_of(i)).collect();
            prop_assert_eq!(walked, direct);
        }

        #[test]
        fn prop_tad_partitions_exactly((d, axes) in with_axes(descriptor_strategy())) {
            check_tad_partition(&d, &axes)?;
        }

        #[test]
        fn prop_gapped_tad_partitions_exactly((d, axes) in with_axes(gapped_descriptor_strategy())) {
            check_tad_partition(&d, &axes)?;
        }

        #[test]
        fn prop_gapped_slice_sums_cover_every_element(
            (d, axes) in with_axes(gapped_descriptor_strategy()),
        ) {
            // Each buffer cell holds its own offset; gap cells hold a marker
            let indexer = ShapeIndexer::new(&d);
            let mut data = vec![u64::MAX; d.required_len()];
            for offset in indexer.cursor(0, indexer.len()) {
                data[offset] = offset as u64;
            }
            let sum = FnStrategy::new(|| 0u64, |acc, x: u64| acc + x, |a, b| a + b, |acc, _| acc);
            let pack = decompose(&d, &axes).unwrap();
            let sums = run_tad_reduction(&client(), &data, &d, &pack, &sum, Some(3));
            let expected: u64 = indexer.cursor(0, indexer.len()).map(|o| o as u64).sum();
            prop_assert_eq!(sums.iter().sum::<u64>(), expected);
        }

        #[test]
        fn prop_partition_covers_work(total in 1usize..10_000, budget in 0usize..64) {
            let ranges = partition(total, budget);
            prop_assert!(!ranges.is_empty());
            prop_assert!(ranges.len() <= budget.max(1));
            prop_assert_eq!(ranges[0].offset, 0);
            for pair in ranges.windows(2) {
                prop_assert_eq!(pair[0].end(), pair[1].offset);
                prop_assert!(pair[0].len >= pair[1].len);
            }
            let covered: usize = ranges.iter().map(|r| r.len).sum();
            prop_assert_eq!(covered, total);
            prop_assert_eq!(partition(total, budget), ranges);
        }

        #[test]
        fn prop_reduction_is_deterministic(
            data in prop::collection::vec(-1.0e6f32..1.0e6, 1..2_000),
            budget in 1usize..16,
        ) {
            let client = client();
            let d = ShapeDescriptor::contiguous(&[data.len()], DType::F32);
            let indexer = ShapeIndexer::new(&d);
            let sum = FnStrategy::new(|| 0.0f32, |acc, x: f32| acc + x, |a, b| a + b, |acc, _| acc);
            let job = ReductionJob::new(&data, &indexer, &sum).with_thread_budget(budget);
            let first = run_scalar_reduction(&client, &job);
            let second = run_scalar_reduction(&client, &job);
            prop_assert_eq!(first.to_bits(), second.to_bits());
        }

        #[test]
        fn prop_sum_of_ones(n in 1usize..300, budget_frac in 0.0f64..1.0) {
            let client = client();
            let budget = 1 + ((n - 1) as f64 * budget_frac) as usize;
            let ones = vec![1.0f64; n];
            let d = ShapeDescriptor::contiguous(&[n], DType::F64);
            let indexer = ShapeIndexer::new(&d);
            let sum = FnStrategy::new(|| 0.0f64, |acc, x: f64| acc + x, |a, b| a + b, |acc, _| acc);
            let job = ReductionJob::new(&ones, &indexer, &sum).with_thread_budget(budget);
            prop_assert_eq!(run_scalar_reduction(&client, &job), n as f64);
        }
    }
}
