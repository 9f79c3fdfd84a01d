//! Runtime type dispatch
//!
//! This module provides the `dispatch_dtype!` macro binding a runtime [`DType`]
//! to a concrete Rust type, the `for_each_*` macros used to instantiate kernels
//! for every type at registration, and the [`OpDispatcher`] that routes an
//! `(opcode, input dtype, output dtype)` triple to a registered kernel.
//!
//! # Usage
//!
//! ```
//! use ndexec::dispatch_dtype;
//! use ndexec::dtype::DType;
//! use ndexec::error::Result;
//!
//! fn element_size(dtype: DType) -> Result<usize> {
//!     dispatch_dtype!(dtype, T => {
//!         Ok(std::mem::size_of::<T>())
//!     }, "element_size")
//! }
//!
//! assert_eq!(element_size(DType::I16).unwrap(), 2);
//! assert!(element_size(DType::Bool).is_err());
//! ```
//!
//! ## Supported Types
//!
//! - `F64` -> `f64`, `F32` -> `f32`
//! - `F16` -> `half::f16`, `BF16` -> `half::bf16` (requires "f16" feature)
//! - `I64`, `I32`, `I16`, `I8`, `U64`, `U32`, `U16`, `U8` -> the matching primitive
//! - `Bool` -> Returns `UnsupportedDType` error

use super::context::{OpContext, OpParams};
use super::registry::{KernelFn, OpCode, OpDescriptor, OpRegistry};
use crate::dtype::DType;
use crate::error::{Error, Result};
use crate::runtime::cpu::CpuClient;
use crate::tensor::{NdArray, ShapeDescriptor};

/// Internal helper binding a half-precision type, or failing without "f16".
#[cfg(feature = "f16")]
#[macro_export]
#[doc(hidden)]
macro_rules! dispatch_f16_type {
    ($T:ident, $body:block, $dtype:expr, $error_op:expr, $type:ident) => {{
        type $T = $crate::__private::half::$type;
        $body
    }};
}

/// Internal helper binding a half-precision type, or failing without "f16".
#[cfg(not(feature = "f16"))]
#[macro_export]
#[doc(hidden)]
macro_rules! dispatch_f16_type {
    ($T:ident, $body:block, $dtype:expr, $error_op:expr, $type:ident) => {{
        return Err($crate::error::Error::UnsupportedDType {
            dtype: $dtype,
            op: $error_op,
        });
    }};
}

/// Macro for runtime dtype dispatch to typed operations.
///
/// Executes `$body` with `$T` bound to the Rust type of `$dtype`. Must be used
/// inside a function returning `ndexec::error::Result`.
#[macro_export]
macro_rules! dispatch_dtype {
    ($dtype:expr, $T:ident => $body:block, $error_op:expr) => {
        match $dtype {
            $crate::dtype::DType::F64 => {
                type $T = f64;
                $body
            }
            $crate::dtype::DType::F32 => {
                type $T = f32;
                $body
            }
            $crate::dtype::DType::F16 => {
                $crate::dispatch_f16_type!($T, $body, $dtype, $error_op, f16)
            }
            $crate::dtype::DType::BF16 => {
                $crate::dispatch_f16_type!($T, $body, $dtype, $error_op, bf16)
            }
            $crate::dtype::DType::I64 => {
                type $T = i64;
                $body
            }
            $crate::dtype::DType::I32 => {
                type $T = i32;
                $body
            }
            $crate::dtype::DType::I16 => {
                type $T = i16;
                $body
            }
            $crate::dtype::DType::I8 => {
                type $T = i8;
                $body
            }
            $crate::dtype::DType::U64 => {
                type $T = u64;
                $body
            }
            $crate::dtype::DType::U32 => {
                type $T = u32;
                $body
            }
            $crate::dtype::DType::U16 => {
                type $T = u16;
                $body
            }
            $crate::dtype::DType::U8 => {
                type $T = u8;
                $body
            }
            $crate::dtype::DType::Bool => {
                return Err($crate::error::Error::UnsupportedDType {
                    dtype: $dtype,
                    op: $error_op,
                })
            }
        }
    };
}

/// Run `$body` once per floating point element type, `$T` bound to it
macro_rules! for_each_float {
    ($T:ident => $body:block) => {{
        {
            type $T = f64;
            $body
        }
        {
            type $T = f32;
            $body
        }
        #[cfg(feature = "f16")]
        {
            type $T = half::f16;
            $body
        }
        #[cfg(feature = "f16")]
        {
            type $T = half::bf16;
            $body
        }
    }};
}

/// Run `$body` once per integer element type, `$T` bound to it
macro_rules! for_each_int {
    ($T:ident => $body:block) => {{
        {
            type $T = i64;
            $body
        }
        {
            type $T = i32;
            $body
        }
        {
            type $T = i16;
            $body
        }
        {
            type $T = i8;
            $body
        }
        {
            type $T = u64;
            $body
        }
        {
            type $T = u32;
            $body
        }
        {
            type $T = u16;
            $body
        }
        {
            type $T = u8;
            $body
        }
    }};
}

/// Run `$body` once per numeric element type, `$T` bound to it
macro_rules! for_each_numeric {
    ($T:ident => $body:block) => {{
        $crate::ops::dispatch::for_each_float!($T => $body);
        $crate::ops::dispatch::for_each_int!($T => $body);
    }};
}

pub(crate) use {for_each_float, for_each_int, for_each_numeric};

/// Routes op invocations to registered kernels
///
/// Borrowed from an explicit [`OpRegistry`] so tests can dispatch against a
/// registry holding only the ops under test.
#[derive(Clone, Copy, Debug)]
pub struct OpDispatcher<'r> {
    registry: &'r OpRegistry,
    client: &'r CpuClient,
}

impl<'r> OpDispatcher<'r> {
    /// Dispatcher over `registry`, running kernels on `client`
    pub fn new(registry: &'r OpRegistry, client: &'r CpuClient) -> Self {
        Self { registry, client }
    }

    /// Registry in use
    #[inline]
    pub fn registry(&self) -> &'r OpRegistry {
        self.registry
    }

    /// Client kernels run on
    #[inline]
    pub fn client(&self) -> &'r CpuClient {
        self.client
    }

    /// Find the kernel for a type combination without running it
    pub fn resolve(&self, opcode: OpCode, input: DType, output: DType) -> Result<KernelFn> {
        let descriptor = self.registry.descriptor(opcode)?;
        let unsupported = || Error::UnsupportedTypeCombination {
            op: descriptor.name(),
            opcode: opcode.0,
            input,
            output,
        };
        if !descriptor.allowed_inputs().contains(input)
            || !descriptor.allowed_outputs().contains(output)
        {
            return Err(unsupported());
        }
        self.registry
            .kernel(opcode, input, output)
            .ok_or_else(unsupported)
    }

    /// Forward `ctx` to the kernel for `(opcode, input, output)`
    ///
    /// No validation of the context beyond the type combination happens
    /// here; callers that did not prepare outputs should use [`execute`](Self::execute).
    #[tracing::instrument(level = "debug", skip_all, fields(opcode = opcode.0, %input, %output))]
    pub fn dispatch(
        &self,
        opcode: OpCode,
        input: DType,
        output: DType,
        ctx: &mut OpContext,
    ) -> Result<()> {
        let kernel = self.resolve(opcode, input, output).map_err(|err| {
            tracing::debug!(%err, "dispatch rejected");
            err
        })?;
        kernel(self.client, opcode, ctx)
    }

    /// Output descriptors of `opcode` for the given inputs, without touching data
    pub fn calculate_output_shapes(
        &self,
        opcode: OpCode,
        inputs: &[&ShapeDescriptor],
        params: &OpParams,
    ) -> Result<Vec<ShapeDescriptor>> {
        let descriptor = self.registry.descriptor(opcode)?;
        check_arity(descriptor, inputs.len())?;
        descriptor.infer_shapes(inputs, params)
    }

    /// Validate, prepare outputs and run `opcode` on `ctx`
    ///
    /// Every precondition is checked before any output is allocated or
    /// written; on failure the context is left as it was.
    #[tracing::instrument(level = "debug", skip_all, fields(opcode = opcode.0))]
    pub fn execute(&self, opcode: OpCode, ctx: &mut OpContext) -> Result<()> {
        let descriptor = self.registry.descriptor(opcode)?;
        check_arity(descriptor, ctx.num_inputs())?;

        if ctx.is_in_place() && !descriptor.is_in_place_eligible() {
            return Err(Error::unsupported_precondition(
                0,
                format!("'{}' cannot run in place", descriptor.name()),
            ));
        }

        let shapes = descriptor.infer_shapes(&ctx.input_descriptors(), ctx.params())?;
        if shapes.len() != descriptor.num_outputs() {
            return Err(Error::Internal(format!(
                "shape function of '{}' produced {} outputs, expected {}",
                descriptor.name(),
                shapes.len(),
                descriptor.num_outputs()
            )));
        }

        let input_dtype = ctx.input(0)?.dtype();
        for slot in 1..ctx.num_inputs() {
            let dtype = ctx.input(slot)?.dtype();
            if !descriptor.allowed_inputs().contains(dtype) {
                return Err(Error::UnsupportedTypeCombination {
                    op: descriptor.name(),
                    opcode: opcode.0,
                    input: dtype,
                    output: shapes[0].dtype(),
                });
            }
        }

        for (slot, inferred) in shapes.iter().enumerate() {
            if ctx.is_in_place() {
                let input = ctx.input(slot)?.descriptor();
                if input != inferred {
                    return Err(Error::unsupported_precondition(
                        slot,
                        format!(
                            "in-place output needs layout {:?} but the input is {:?}",
                            inferred, input
                        ),
                    ));
                }
            } else if ctx.has_output(slot) {
                let bound = ctx.output(slot)?;
                if bound.shape() != inferred.shape() {
                    return Err(Error::shape_mismatch(inferred.shape(), bound.shape()));
                }
            }
        }

        let output_dtype = if ctx.is_in_place() || !ctx.has_output(0) {
            shapes[0].dtype()
        } else {
            ctx.output(0)?.dtype()
        };
        let kernel = self
            .resolve(opcode, input_dtype, output_dtype)
            .map_err(|err| {
                tracing::debug!(%err, "execute rejected");
                err
            })?;

        if !ctx.is_in_place() {
            let mut fresh = Vec::new();
            for (slot, inferred) in shapes.into_iter().enumerate() {
                if !ctx.has_output(slot) {
                    fresh.push((slot, NdArray::zeros(inferred)?));
                }
            }
            for (slot, array) in fresh {
                ctx.set_output(slot, array);
            }
        }

        tracing::debug!(op = descriptor.name(), %input_dtype, %output_dtype, "running kernel");
        kernel(self.client, opcode, ctx)
    }
}

fn check_arity(descriptor: &OpDescriptor, provided: usize) -> Result<()> {
    let expected = descriptor.num_inputs();
    if provided < expected {
        return Err(Error::invalid_input(
            provided,
            format!("'{}' expects {} inputs, got {}", descriptor.name(), expected, provided),
        ));
    }
    if provided > expected {
        return Err(Error::invalid_input(
            expected,
            format!("'{}' expects {} inputs, got {}", descriptor.name(), expected, provided),
        ));
    }
    Ok(())
}
