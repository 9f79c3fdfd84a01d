//! Splitting an iteration space into per-worker ranges

/// Contiguous range of logical indices assigned to one worker
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WorkRange {
    /// First logical index
    pub offset: usize,
    /// Number of indices
    pub len: usize,
}

impl WorkRange {
    /// One past the last index
    #[inline]
    pub fn end(&self) -> usize {
        self.offset + self.len
    }
}

/// Partition `[0, total_work)` into at most `thread_budget` ranges
///
/// The budget is clamped to `[1, total_work]`. Every range gets
/// `total_work / budget` indices and the first `total_work % budget` ranges get
/// one more, so ranges are sorted, disjoint and cover the space exactly. An
/// empty space yields no ranges.
///
/// # Example
///
/// ```
/// use ndexec::runtime::cpu::partition;
///
/// let lens: Vec<usize> = partition(10, 3).iter().map(|r| r.len).collect();
/// assert_eq!(lens, vec![4, 3, 3]);
/// ```
pub fn partition(total_work: usize, thread_budget: usize) -> Vec<WorkRange> {
    if total_work == 0 {
        return Vec::new();
    }
    let budget = thread_budget.clamp(1, total_work);
    let base = total_work / budget;
    let extra = total_work % budget;

    let mut ranges = Vec::with_capacity(budget);
    let mut offset = 0;
    for t in 0..budget {
        let len = base + usize::from(t < extra);
        ranges.push(WorkRange { offset, len });
        offset += len;
    }
    debug_assert_eq!(offset, total_work);
    ranges
}
