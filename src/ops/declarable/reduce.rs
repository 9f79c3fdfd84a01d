//! Declarable reduction ops: one opcode per [`ReduceOp`]

use super::transform::convert_logical;
use crate::dtype::{DTypeSet, Element, IntElement};
use crate::error::{Error, Result};
use crate::ops::context::{IoPair, OpContext, OpParams};
use crate::ops::dispatch::{for_each_float, for_each_int, for_each_numeric};
use crate::ops::reduce::{OutputRule, ReduceOp, reduce_output_shape, resolve_axes};
use crate::ops::registry::{OpCode, OpDescriptor, OpRegistry};
use crate::runtime::cpu::{CpuClient, ReduceStrategy, run_tad_reduction};
use crate::tensor::{ShapeDescriptor, TadPack, decompose, validate_axes};

/// Shape function shared by every reduction
///
/// `axes: None` reduces to a scalar (or all-ones with `keep_dims`); an empty
/// axis list leaves the shape unchanged.
pub(crate) fn reduce_shape(
    opcode: OpCode,
    inputs: &[&ShapeDescriptor],
    params: &OpParams,
) -> Result<Vec<ShapeDescriptor>> {
    let op = ReduceOp::try_from(opcode.0)?;
    let input = inputs
        .first()
        .ok_or_else(|| Error::invalid_input(0, "reduction needs an input"))?;

    let axes = resolve_axes(params.axes.as_deref(), input.rank());
    validate_axes(&axes, input.rank())?;

    let extents = reduce_output_shape(input.shape(), &axes, params.keep_dims);
    let dtype = params
        .dtype
        .unwrap_or_else(|| op.default_output(input.dtype()));
    Ok(vec![ShapeDescriptor::contiguous(&extents, dtype)])
}

/// Reduce input 0 into output 0 reading `I` and writing `O`, accumulating in `f64`
pub(crate) fn reduce_kernel<I: Element, O: Element>(
    client: &CpuClient,
    opcode: OpCode,
    ctx: &mut OpContext,
) -> Result<()> {
    let op = ReduceOp::try_from(opcode.0)?;
    reduce_with::<I, O, _>(client, ctx, &op.strategy::<I, O>())
}

/// Same-type integer reduction accumulating in `T`
pub(crate) fn native_reduce_kernel<T: IntElement>(
    client: &CpuClient,
    opcode: OpCode,
    ctx: &mut OpContext,
) -> Result<()> {
    let op = ReduceOp::try_from(opcode.0)?;
    let strategy = op.native_strategy::<T>().ok_or_else(|| {
        Error::Internal(format!("'{}' has no integer accumulator", op.name()))
    })?;
    reduce_with::<T, T, _>(client, ctx, &strategy)
}

fn reduce_with<I, O, S>(client: &CpuClient, ctx: &mut OpContext, strategy: &S) -> Result<()>
where
    I: Element,
    O: Element,
    S: ReduceStrategy<I, Out = O>,
{
    let pack = {
        let descriptor = ctx.input(0)?.descriptor();
        let axes = resolve_axes(ctx.params().axes.as_deref(), descriptor.rank());
        decompose(descriptor, &axes)?
    };

    if pack == TadPack::Passthrough {
        // Nothing to reduce: the output is the input, converted
        return match ctx.io_pair(0)? {
            IoPair::Aliased(_) => Ok(()),
            IoPair::Separate { input, output } => convert_logical::<I, O>(input, output),
        };
    }

    let values = {
        let input = ctx.input(0)?;
        run_tad_reduction(
            client,
            input.as_slice::<I>()?,
            input.descriptor(),
            &pack,
            strategy,
            None,
        )
    };
    ctx.output_mut(0)?.write_logical(&values)
}

pub(crate) fn register(registry: &mut OpRegistry) {
    for op in ReduceOp::ALL {
        let opcode = OpCode(op.opcode());
        registry.insert(
            OpDescriptor::new(opcode, op.name(), reduce_shape)
                .input_types(DTypeSet::NUMERIC)
                .output_types(op.output_types())
                .in_place(true),
        );

        match op.output_rule() {
            OutputRule::SameAsInput => {
                for_each_float!(T => {
                    registry.insert_kernel(opcode, T::DTYPE, T::DTYPE, reduce_kernel::<T, T>);
                });
                for_each_int!(T => {
                    registry.insert_kernel(opcode, T::DTYPE, T::DTYPE, native_reduce_kernel::<T>);
                });
            }
            OutputRule::Floats => {
                for_each_numeric!(I => {
                    for_each_float!(O => {
                        registry.insert_kernel(opcode, I::DTYPE, O::DTYPE, reduce_kernel::<I, O>);
                    });
                });
            }
            OutputRule::Ints => {
                for_each_numeric!(I => {
                    for_each_int!(O => {
                        registry.insert_kernel(opcode, I::DTYPE, O::DTYPE, reduce_kernel::<I, O>);
                    });
                });
            }
        }
    }
}
