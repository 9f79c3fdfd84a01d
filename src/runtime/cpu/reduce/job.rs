//! One parallel reduction: input buffer, element view, strategy and budget

use super::strategy::ReduceStrategy;
use crate::runtime::cpu::partition::WorkRange;
use crate::tensor::ShapeIndexer;

/// How logical element `i` of a job maps into the data buffer
#[derive(Clone, Copy, Debug)]
pub enum ElementView<'a> {
    /// `data[base + i * stride]`
    Strided {
        /// Offset of element 0
        base: usize,
        /// Uniform element stride
        stride: usize,
        /// Number of elements
        len: usize,
    },
    /// `data[base + indexer.offset_of(i)]`
    Indexed {
        /// Offset added to every computed offset
        base: usize,
        /// Indexer holding the shared cast table
        indexer: &'a ShapeIndexer<'a>,
    },
}

impl<'a> ElementView<'a> {
    /// Pick the fast path when the indexer's descriptor has an element-wise stride
    pub fn for_indexer(indexer: &'a ShapeIndexer<'a>, base: usize) -> Self {
        match indexer.descriptor().element_wise_stride() {
            Some(stride) => Self::Strided {
                base,
                stride,
                len: indexer.len(),
            },
            None => Self::Indexed { base, indexer },
        }
    }

    /// Number of logical elements
    #[inline]
    pub fn len(&self) -> usize {
        match self {
            Self::Strided { len, .. } => *len,
            Self::Indexed { indexer, .. } => indexer.len(),
        }
    }

    /// True when the view selects nothing
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// True for the uniform-stride path
    #[inline]
    pub fn is_strided(&self) -> bool {
        matches!(self, Self::Strided { .. })
    }
}

/// Description of one reduction call
///
/// Stack-scoped: it borrows the input, the indexer and the strategy for the
/// duration of [`run_scalar_reduction`](super::run_scalar_reduction).
pub struct ReductionJob<'a, T, S> {
    pub(crate) data: &'a [T],
    pub(crate) view: ElementView<'a>,
    pub(crate) strategy: &'a S,
    pub(crate) thread_budget: Option<usize>,
}

impl<'a, T, S> ReductionJob<'a, T, S>
where
    T: Copy + Sync,
    S: ReduceStrategy<T>,
{
    /// Reduce every element `indexer` describes, starting at buffer offset 0
    pub fn new(data: &'a [T], indexer: &'a ShapeIndexer<'a>, strategy: &'a S) -> Self {
        Self::with_view(data, ElementView::for_indexer(indexer, 0), strategy)
    }

    /// Reduce an explicit view of `data`
    pub fn with_view(data: &'a [T], view: ElementView<'a>, strategy: &'a S) -> Self {
        Self {
            data,
            view,
            strategy,
            thread_budget: None,
        }
    }

    /// Override the client's thread budget for this call
    ///
    /// The override never exceeds the client's thread ceiling.
    pub fn with_thread_budget(mut self, budget: usize) -> Self {
        self.thread_budget = Some(budget);
        self
    }

    /// Total iteration count
    #[inline]
    pub fn len(&self) -> usize {
        self.view.len()
    }

    /// True when there is nothing to reduce
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.view.is_empty()
    }

    /// Element view in use
    #[inline]
    pub fn view(&self) -> &ElementView<'a> {
        &self.view
    }

    /// Fold the elements of `range` into a freshly seeded accumulator
    pub(crate) fn fold_range(&self, range: WorkRange) -> S::Acc {
        let strategy = self.strategy;
        let data = self.data;
        let seed = strategy.seed();
        match self.view {
            ElementView::Strided { base, stride, .. } => {
                let mut offset = base + range.offset * stride;
                let mut acc = seed;
                for _ in 0..range.len {
                    acc = strategy.combine(acc, data[offset]);
                    offset += stride;
                }
                acc
            }
            ElementView::Indexed { base, indexer } => indexer
                .cursor(range.offset, range.len)
                .fold(seed, |acc, offset| strategy.combine(acc, data[base + offset])),
        }
    }
}
