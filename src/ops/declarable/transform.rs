//! Type conversion and copy ops

use crate::dtype::{DType, DTypeSet, Element, cast};
use crate::error::{Error, Result};
use crate::ops::context::{IoPair, OpContext, OpParams};
use crate::ops::dispatch::for_each_numeric;
use crate::ops::registry::{OpCode, OpDescriptor, OpRegistry};
use crate::runtime::cpu::CpuClient;
use crate::tensor::{NdArray, ShapeDescriptor, ShapeIndexer, copy_logical};

/// Convert any input to `I64`
pub const TO_INT64: OpCode = OpCode(1000);
/// Convert any input to `F32`
pub const TO_FLOAT32: OpCode = OpCode(1001);
/// Convert any input to `F64`
pub const TO_FLOAT64: OpCode = OpCode(1002);
/// Copy input 0 into output 0 of the same type
pub const ASSIGN: OpCode = OpCode(1003);

fn cast_target(opcode: OpCode) -> Result<DType> {
    match opcode {
        TO_INT64 => Ok(DType::I64),
        TO_FLOAT32 => Ok(DType::F32),
        TO_FLOAT64 => Ok(DType::F64),
        other => Err(Error::UnknownOp { opcode: other.0 }),
    }
}

fn first_input<'a>(inputs: &[&'a ShapeDescriptor]) -> Result<&'a ShapeDescriptor> {
    inputs
        .first()
        .copied()
        .ok_or_else(|| Error::invalid_input(0, "op needs an input"))
}

/// Same extents and order as the input, target dtype
pub(crate) fn cast_shape(
    opcode: OpCode,
    inputs: &[&ShapeDescriptor],
    _: &OpParams,
) -> Result<Vec<ShapeDescriptor>> {
    let input = first_input(inputs)?;
    let dtype = cast_target(opcode)?;
    Ok(vec![ShapeDescriptor::contiguous_with_order(
        input.shape(),
        input.order(),
        dtype,
    )])
}

pub(crate) fn assign_shape(
    _: OpCode,
    inputs: &[&ShapeDescriptor],
    _: &OpParams,
) -> Result<Vec<ShapeDescriptor>> {
    let input = first_input(inputs)?;
    Ok(vec![ShapeDescriptor::contiguous_with_order(
        input.shape(),
        input.order(),
        input.dtype(),
    )])
}

/// Element-wise conversion `I -> O`
///
/// In place the input already has the target type, so there is nothing to do.
pub(crate) fn cast_kernel<I: Element, O: Element>(
    _: &CpuClient,
    _: OpCode,
    ctx: &mut OpContext,
) -> Result<()> {
    match ctx.io_pair(0)? {
        IoPair::Aliased(_) => Ok(()),
        IoPair::Separate { input, output } => convert_logical::<I, O>(input, output),
    }
}

/// Write `input` converted to `O` into `output` in logical order
///
/// Same-type conversions are plain copies; integers convert without a detour
/// through `f64`.
pub(crate) fn convert_logical<I: Element, O: Element>(
    input: &NdArray,
    output: &mut NdArray,
) -> Result<()> {
    if I::DTYPE == O::DTYPE {
        return copy_logical(input, output);
    }
    let values: Vec<O> = input
        .to_vec::<I>()?
        .into_iter()
        .map(cast::<I, O>)
        .collect();
    output.write_logical(&values)
}

/// Conversion from `Bool` (one byte per element) to `O`
pub(crate) fn cast_bool_kernel<O: Element>(
    _: &CpuClient,
    _: OpCode,
    ctx: &mut OpContext,
) -> Result<()> {
    match ctx.io_pair(0)? {
        IoPair::Aliased(_) => Ok(()),
        IoPair::Separate { input, output } => {
            let values = bool_values::<O>(input);
            output.write_logical(&values)
        }
    }
}

fn bool_values<O: Element>(input: &NdArray) -> Vec<O> {
    let bytes = input.storage().as_bytes();
    let indexer = ShapeIndexer::new(input.descriptor());
    indexer
        .cursor(0, indexer.len())
        .map(|offset| if bytes[offset] != 0 { O::one() } else { O::zero() })
        .collect()
}

/// Same-type copy honouring input strides
pub(crate) fn assign_kernel<T: Element>(
    _: &CpuClient,
    _: OpCode,
    ctx: &mut OpContext,
) -> Result<()> {
    match ctx.io_pair(0)? {
        IoPair::Aliased(_) => Ok(()),
        IoPair::Separate { input, output } => {
            let values = input.to_vec::<T>()?;
            output.write_logical(&values)
        }
    }
}

pub(crate) fn register(registry: &mut OpRegistry) {
    let casts = [
        (TO_INT64, "to_int64", DType::I64),
        (TO_FLOAT32, "to_float32", DType::F32),
        (TO_FLOAT64, "to_float64", DType::F64),
    ];
    for (opcode, name, target) in casts {
        registry.insert(
            OpDescriptor::new(opcode, name, cast_shape)
                .input_types(DTypeSet::ANY)
                .output_types(DTypeSet::single(target))
                .in_place(true),
        );
    }
    registry.insert(
        OpDescriptor::new(ASSIGN, "assign", assign_shape)
            .input_types(DTypeSet::NUMERIC)
            .output_types(DTypeSet::NUMERIC)
            .in_place(true),
    );

    for_each_numeric!(T => {
        registry.insert_kernel(TO_INT64, T::DTYPE, DType::I64, cast_kernel::<T, i64>);
        registry.insert_kernel(TO_FLOAT32, T::DTYPE, DType::F32, cast_kernel::<T, f32>);
        registry.insert_kernel(TO_FLOAT64, T::DTYPE, DType::F64, cast_kernel::<T, f64>);
        registry.insert_kernel(ASSIGN, T::DTYPE, T::DTYPE, assign_kernel::<T>);
    });
    registry.insert_kernel(TO_INT64, DType::Bool, DType::I64, cast_bool_kernel::<i64>);
    registry.insert_kernel(TO_FLOAT32, DType::Bool, DType::F32, cast_bool_kernel::<f32>);
    registry.insert_kernel(TO_FLOAT64, DType::Bool, DType::F64, cast_bool_kernel::<f64>);
}
