//! Op descriptors and the registry mapping opcodes to kernels

use super::context::{OpContext, OpParams};
use crate::dtype::{DType, DTypeSet};
use crate::error::{Error, Result};
use crate::runtime::cpu::CpuClient;
use crate::tensor::ShapeDescriptor;
use std::collections::HashMap;
use std::fmt;
use std::sync::OnceLock;

/// Numeric identifier of an operation
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct OpCode(pub u32);

impl fmt::Display for OpCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Pure shape inference: input descriptors and params to output descriptors
pub type ShapeFn = fn(OpCode, &[&ShapeDescriptor], &OpParams) -> Result<Vec<ShapeDescriptor>>;

/// Type-specialized kernel entry point
pub type KernelFn = fn(&CpuClient, OpCode, &mut OpContext) -> Result<()>;

/// Static metadata of one operation
#[derive(Clone)]
pub struct OpDescriptor {
    opcode: OpCode,
    name: &'static str,
    num_inputs: usize,
    num_outputs: usize,
    in_place: bool,
    input_types: DTypeSet,
    output_types: DTypeSet,
    shape_fn: ShapeFn,
}

impl OpDescriptor {
    /// Single-input, single-output op accepting any type, not in-place eligible
    pub fn new(opcode: OpCode, name: &'static str, shape_fn: ShapeFn) -> Self {
        Self {
            opcode,
            name,
            num_inputs: 1,
            num_outputs: 1,
            in_place: false,
            input_types: DTypeSet::ANY,
            output_types: DTypeSet::ANY,
            shape_fn,
        }
    }

    /// Set input and output counts
    pub fn arity(mut self, num_inputs: usize, num_outputs: usize) -> Self {
        self.num_inputs = num_inputs;
        self.num_outputs = num_outputs;
        self
    }

    /// Allow outputs to alias inputs
    pub fn in_place(mut self, eligible: bool) -> Self {
        self.in_place = eligible;
        self
    }

    /// Restrict input dtypes
    pub fn input_types(mut self, types: DTypeSet) -> Self {
        self.input_types = types;
        self
    }

    /// Restrict output dtypes
    pub fn output_types(mut self, types: DTypeSet) -> Self {
        self.output_types = types;
        self
    }

    /// Opcode
    #[inline]
    pub fn opcode(&self) -> OpCode {
        self.opcode
    }

    /// Registered name
    #[inline]
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Number of inputs
    #[inline]
    pub fn num_inputs(&self) -> usize {
        self.num_inputs
    }

    /// Number of outputs
    #[inline]
    pub fn num_outputs(&self) -> usize {
        self.num_outputs
    }

    /// Whether in-place execution is allowed
    #[inline]
    pub fn is_in_place_eligible(&self) -> bool {
        self.in_place
    }

    /// Allowed input dtypes
    #[inline]
    pub fn allowed_inputs(&self) -> DTypeSet {
        self.input_types
    }

    /// Allowed output dtypes
    #[inline]
    pub fn allowed_outputs(&self) -> DTypeSet {
        self.output_types
    }

    /// Run shape inference
    pub fn infer_shapes(
        &self,
        inputs: &[&ShapeDescriptor],
        params: &OpParams,
    ) -> Result<Vec<ShapeDescriptor>> {
        (self.shape_fn)(self.opcode, inputs, params)
    }
}

impl fmt::Debug for OpDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpDescriptor")
            .field("opcode", &self.opcode)
            .field("name", &self.name)
            .field("num_inputs", &self.num_inputs)
            .field("num_outputs", &self.num_outputs)
            .field("in_place", &self.in_place)
            .field("input_types", &self.input_types)
            .field("output_types", &self.output_types)
            .finish()
    }
}

type KernelKey = (OpCode, DType, DType);

/// Table of op descriptors and their type-specialized kernels
///
/// Lookups are hash-map hits keyed by `(opcode, input dtype, output dtype)`.
/// Tests build their own registry with only the ops they need; production
/// code usually shares [`OpRegistry::global`].
#[derive(Default)]
pub struct OpRegistry {
    descriptors: HashMap<OpCode, OpDescriptor>,
    names: HashMap<&'static str, OpCode>,
    kernels: HashMap<KernelKey, KernelFn>,
}

impl OpRegistry {
    /// Empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding every built-in op
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        super::declarable::register_defaults(&mut registry);
        registry
    }

    /// Process-wide registry with the built-in ops, built on first use
    pub fn global() -> &'static OpRegistry {
        static GLOBAL: OnceLock<OpRegistry> = OnceLock::new();
        GLOBAL.get_or_init(|| {
            let registry = Self::with_defaults();
            tracing::debug!(
                ops = registry.len(),
                kernels = registry.kernels.len(),
                "global op registry initialised"
            );
            registry
        })
    }

    /// Register an op descriptor
    ///
    /// Fails when the opcode or the name is already taken.
    pub fn register(&mut self, descriptor: OpDescriptor) -> Result<()> {
        if let Some(existing) = self.descriptors.get(&descriptor.opcode) {
            return Err(Error::invalid_argument(
                "opcode",
                format!("{} is already registered as '{}'", descriptor.opcode, existing.name),
            ));
        }
        if self.names.contains_key(descriptor.name) {
            return Err(Error::invalid_argument(
                "name",
                format!("an op named '{}' is already registered", descriptor.name),
            ));
        }
        self.insert(descriptor);
        Ok(())
    }

    /// Register the kernel for one `(input, output)` dtype pair of `opcode`
    ///
    /// The opcode must be registered and both dtypes must lie in its allowed sets.
    pub fn register_kernel(
        &mut self,
        opcode: OpCode,
        input: DType,
        output: DType,
        kernel: KernelFn,
    ) -> Result<()> {
        let descriptor = self.descriptor(opcode)?;
        if !descriptor.input_types.contains(input) || !descriptor.output_types.contains(output) {
            return Err(Error::UnsupportedTypeCombination {
                op: descriptor.name,
                opcode: opcode.0,
                input,
                output,
            });
        }
        self.insert_kernel(opcode, input, output, kernel);
        Ok(())
    }

    pub(crate) fn insert(&mut self, descriptor: OpDescriptor) {
        tracing::trace!(opcode = descriptor.opcode.0, name = descriptor.name, "registering op");
        self.names.insert(descriptor.name, descriptor.opcode);
        self.descriptors.insert(descriptor.opcode, descriptor);
    }

    pub(crate) fn insert_kernel(&mut self, opcode: OpCode, input: DType, output: DType, kernel: KernelFn) {
        self.kernels.insert((opcode, input, output), kernel);
    }

    /// Descriptor for `opcode`
    pub fn descriptor(&self, opcode: OpCode) -> Result<&OpDescriptor> {
        self.descriptors
            .get(&opcode)
            .ok_or(Error::UnknownOp { opcode: opcode.0 })
    }

    /// Opcode registered under `name`
    pub fn opcode_of(&self, name: &str) -> Option<OpCode> {
        self.names.get(name).copied()
    }

    /// Kernel for `(opcode, input, output)`
    #[inline]
    pub fn kernel(&self, opcode: OpCode, input: DType, output: DType) -> Option<KernelFn> {
        self.kernels.get(&(opcode, input, output)).copied()
    }

    /// Dtype pairs with a kernel for `opcode`, sorted
    pub fn type_pairs(&self, opcode: OpCode) -> Vec<(DType, DType)> {
        let mut pairs: Vec<(DType, DType)> = self
            .kernels
            .keys()
            .filter(|(op, _, _)| *op == opcode)
            .map(|&(_, i, o)| (i, o))
            .collect();
        pairs.sort();
        pairs
    }

    /// Number of registered ops
    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    /// True when nothing is registered
    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }

    /// Registered descriptors, in opcode order
    pub fn descriptors(&self) -> Vec<&OpDescriptor> {
        let mut all: Vec<&OpDescriptor> = self.descriptors.values().collect();
        all.sort_by_key(|d| d.opcode);
        all
    }
}

impl fmt::Debug for OpRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpRegistry")
            .field("ops", &self.descriptors.len())
            .field("kernels", &self.kernels.len())
            .finish()
    }
}
