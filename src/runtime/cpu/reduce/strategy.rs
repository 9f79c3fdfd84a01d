//! Accumulation strategies plugged into the reduction engine

use std::marker::PhantomData;

/// Four-function description of a reduction over elements of type `T`
///
/// The engine seeds one accumulator per worker, folds elements in with
/// [`combine`](Self::combine), joins the per-worker partials with
/// [`merge`](Self::merge) in ascending worker order and applies
/// [`finalize`](Self::finalize) once with the number of elements visited.
///
/// `merge` must be associative and commutative, otherwise results depend on
/// the thread budget. Floating-point addition only approximately satisfies
/// this: results are bit-reproducible for a fixed budget, not across budgets.
pub trait ReduceStrategy<T>: Sync {
    /// Intermediate value carried through the fold
    type Acc: Copy + Send;
    /// Externally visible result
    type Out;

    /// Identity accumulator
    fn seed(&self) -> Self::Acc;

    /// Fold one element into an accumulator
    fn combine(&self, acc: Self::Acc, value: T) -> Self::Acc;

    /// Join two partial accumulators
    fn merge(&self, lhs: Self::Acc, rhs: Self::Acc) -> Self::Acc;

    /// Turn the merged accumulator into the result
    fn finalize(&self, acc: Self::Acc, count: usize) -> Self::Out;
}

/// Strategy assembled from four closures
///
/// ```
/// use ndexec::runtime::cpu::{FnStrategy, ReduceStrategy};
///
/// let sum = FnStrategy::new(
///     || 0.0f64,
///     |acc, x: f32| acc + x as f64,
///     |a, b| a + b,
///     |acc, _n| acc,
/// );
/// assert_eq!(sum.combine(sum.seed(), 2.5), 2.5);
/// ```
pub struct FnStrategy<T, A, O, S, C, M, F> {
    seed: S,
    combine: C,
    merge: M,
    finalize: F,
    _marker: PhantomData<fn(T) -> (A, O)>,
}

impl<T, A, O, S, C, M, F> FnStrategy<T, A, O, S, C, M, F>
where
    S: Fn() -> A + Sync,
    C: Fn(A, T) -> A + Sync,
    M: Fn(A, A) -> A + Sync,
    F: Fn(A, usize) -> O + Sync,
{
    /// Bundle the four strategy functions
    pub fn new(seed: S, combine: C, merge: M, finalize: F) -> Self {
        Self {
            seed,
            combine,
            merge,
            finalize,
            _marker: PhantomData,
        }
    }
}

impl<T, A, O, S, C, M, F> ReduceStrategy<T> for FnStrategy<T, A, O, S, C, M, F>
where
    A: Copy + Send,
    S: Fn() -> A + Sync,
    C: Fn(A, T) -> A + Sync,
    M: Fn(A, A) -> A + Sync,
    F: Fn(A, usize) -> O + Sync,
{
    type Acc = A;
    type Out = O;

    #[inline]
    fn seed(&self) -> A {
        (self.seed)()
    }

    #[inline]
    fn combine(&self, acc: A, value: T) -> A {
        (self.combine)(acc, value)
    }

    #[inline]
    fn merge(&self, lhs: A, rhs: A) -> A {
        (self.merge)(lhs, rhs)
    }

    #[inline]
    fn finalize(&self, acc: A, count: usize) -> O {
        (self.finalize)(acc, count)
    }
}
