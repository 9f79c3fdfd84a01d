//! Execution context handed to declarable operation kernels

use crate::dtype::DType;
use crate::error::{Error, Result};
use crate::tensor::{NdArray, ShapeDescriptor};

/// Parameter block of a declarable operation
///
/// Only the fields an op understands are read; the rest are ignored.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct OpParams {
    /// Axes to reduce over; `None` reduces over every axis
    pub axes: Option<Vec<usize>>,
    /// Keep reduced axes with extent 1
    pub keep_dims: bool,
    /// Requested output dtype, when the op allows a choice
    pub dtype: Option<DType>,
    /// Floating point arguments
    pub t_args: Vec<f64>,
    /// Integer arguments
    pub i_args: Vec<i64>,
    /// Boolean arguments
    pub b_args: Vec<bool>,
}

impl OpParams {
    /// Empty parameter block
    pub fn new() -> Self {
        Self::default()
    }

    /// Reduce over `axes`
    pub fn with_axes(mut self, axes: impl Into<Vec<usize>>) -> Self {
        self.axes = Some(axes.into());
        self
    }

    /// Keep reduced axes as extent 1
    pub fn keep_dims(mut self, keep: bool) -> Self {
        self.keep_dims = keep;
        self
    }

    /// Request an output dtype
    pub fn with_dtype(mut self, dtype: DType) -> Self {
        self.dtype = Some(dtype);
        self
    }
}

/// Input and output of one slot, possibly the same array
#[derive(Debug)]
pub enum IoPair<'c> {
    /// Distinct input and output arrays
    Separate {
        /// Read-only input
        input: &'c NdArray,
        /// Output to fill
        output: &'c mut NdArray,
    },
    /// In-place execution: the input is the output
    Aliased(&'c mut NdArray),
}

/// Slot-indexed inputs, outputs and parameters of one op invocation
///
/// In-place contexts have no separate outputs: output slot `i` is input
/// slot `i`.
#[derive(Clone, Debug, Default)]
pub struct OpContext {
    inputs: Vec<NdArray>,
    outputs: Vec<Option<NdArray>>,
    params: OpParams,
    in_place: bool,
}

impl OpContext {
    /// Context over `inputs`, in slot order
    pub fn new(inputs: Vec<NdArray>) -> Self {
        Self {
            inputs,
            ..Self::default()
        }
    }

    /// Attach a parameter block
    pub fn with_params(mut self, params: OpParams) -> Self {
        self.params = params;
        self
    }

    /// Supply the array for output `slot` instead of letting the dispatcher allocate it
    pub fn with_output(mut self, slot: usize, output: NdArray) -> Self {
        if self.outputs.len() <= slot {
            self.outputs.resize(slot + 1, None);
        }
        self.outputs[slot] = Some(output);
        self
    }

    /// Request input/output aliasing
    pub fn in_place(mut self, in_place: bool) -> Self {
        self.in_place = in_place;
        self
    }

    /// Whether outputs alias inputs
    #[inline]
    pub fn is_in_place(&self) -> bool {
        self.in_place
    }

    /// Parameter block
    #[inline]
    pub fn params(&self) -> &OpParams {
        &self.params
    }

    /// Number of inputs
    #[inline]
    pub fn num_inputs(&self) -> usize {
        self.inputs.len()
    }

    /// Input at `slot`
    pub fn input(&self, slot: usize) -> Result<&NdArray> {
        self.inputs
            .get(slot)
            .ok_or_else(|| Error::invalid_input(slot, "no input array bound to this slot"))
    }

    /// Descriptors of every input, in slot order
    pub fn input_descriptors(&self) -> Vec<&ShapeDescriptor> {
        self.inputs.iter().map(NdArray::descriptor).collect()
    }

    /// Output at `slot`, if bound
    pub fn output(&self, slot: usize) -> Result<&NdArray> {
        let found = if self.in_place {
            self.inputs.get(slot)
        } else {
            self.outputs.get(slot).and_then(Option::as_ref)
        };
        found.ok_or_else(|| Error::invalid_input(slot, "no output array bound to this slot"))
    }

    /// Mutable output at `slot`
    pub fn output_mut(&mut self, slot: usize) -> Result<&mut NdArray> {
        let found = if self.in_place {
            self.inputs.get_mut(slot)
        } else {
            self.outputs.get_mut(slot).and_then(Option::as_mut)
        };
        found.ok_or_else(|| Error::invalid_input(slot, "no output array bound to this slot"))
    }

    /// Input and output of `slot` together
    pub fn io_pair(&mut self, slot: usize) -> Result<IoPair<'_>> {
        if self.in_place {
            return self
                .inputs
                .get_mut(slot)
                .map(IoPair::Aliased)
                .ok_or_else(|| Error::invalid_input(slot, "no input array bound to this slot"));
        }
        let input = self
            .inputs
            .get(slot)
            .ok_or_else(|| Error::invalid_input(slot, "no input array bound to this slot"))?;
        let output = self
            .outputs
            .get_mut(slot)
            .and_then(Option::as_mut)
            .ok_or_else(|| Error::invalid_input(slot, "no output array bound to this slot"))?;
        Ok(IoPair::Separate { input, output })
    }

    /// Whether output `slot` was bound before execution
    pub(crate) fn has_output(&self, slot: usize) -> bool {
        self.outputs.get(slot).is_some_and(Option::is_some)
    }

    pub(crate) fn set_output(&mut self, slot: usize, output: NdArray) {
        if self.outputs.len() <= slot {
            self.outputs.resize(slot + 1, None);
        }
        self.outputs[slot] = Some(output);
    }

    /// Take output `slot` out of the context
    pub fn take_output(&mut self, slot: usize) -> Result<NdArray> {
        if self.in_place {
            return self.output(slot).cloned();
        }
        self.outputs
            .get_mut(slot)
            .and_then(Option::take)
            .ok_or_else(|| Error::invalid_input(slot, "no output array bound to this slot"))
    }

    /// Consume the context, returning its outputs (the inputs when in place)
    pub fn into_outputs(self) -> Vec<NdArray> {
        if self.in_place {
            return self.inputs;
        }
        self.outputs.into_iter().flatten().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slots() {
        let a = NdArray::from_slice(&[1.0f32, 2.0], &[2]).unwrap();
        let mut ctx = OpContext::new(vec![a]);
        assert!(ctx.input(0).is_ok());
        assert_eq!(ctx.input(1).unwrap_err().slot(), Some(1));
        assert!(ctx.output(0).is_err());
        assert!(ctx.io_pair(0).is_err());
    }

    #[test]
    fn test_in_place_aliases_input() {
        let a = NdArray::from_slice(&[1i64, 2], &[2]).unwrap();
        let mut ctx = OpContext::new(vec![a]).in_place(true);
        ctx.output_mut(0).unwrap().as_mut_slice::<i64>().unwrap()[0] = 9;
        assert_eq!(ctx.input(0).unwrap().to_vec::<i64>().unwrap(), vec![9, 2]);
        assert!(matches!(ctx.io_pair(0).unwrap(), IoPair::Aliased(_)));
    }

    #[test]
    fn test_separate_pair() {
        let a = NdArray::from_slice(&[1u8, 2], &[2]).unwrap();
        let b = NdArray::from_slice(&[0u8, 0], &[2]).unwrap();
        let mut ctx = OpContext::new(vec![a]).with_output(0, b);
        match ctx.io_pair(0).unwrap() {
            IoPair::Separate { input, output } => {
                let values = input.to_vec::<u8>().unwrap();
                output.write_logical(&values).unwrap();
            }
            IoPair::Aliased(_) => panic!("expected separate arrays"),
        }
        assert_eq!(ctx.into_outputs()[0].to_vec::<u8>().unwrap(), vec![1, 2]);
    }

    #[test]
    fn test_params_builder() {
        let p = OpParams::new().with_axes([1, 0]).keep_dims(true);
        assert_eq!(p.axes, Some(vec![1, 0]));
        assert!(p.keep_dims);
        assert_eq!(p.dtype, None);
    }
}
