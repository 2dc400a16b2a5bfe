//! The fixed capability table every operator registers with the engine.

use std::fmt;

use dfx_tensor::{DType, PartialShape, StorageType, Tensor};

use crate::error::Result;
use crate::param::{Attrs, OpParams, ParamDescriptor};
use crate::resource::{OpContext, ResourceRequest};

/// How a kernel must treat an output buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpReq {
    /// Do not write the output at all.
    Null,
    /// Overwrite the output buffer.
    WriteTo,
    /// Overwrite an output that aliases one of the inputs.
    WriteInplace,
    /// Accumulate into the existing output contents.
    AddTo,
}

impl fmt::Display for OpReq {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OpReq::Null => write!(f, "null"),
            OpReq::WriteTo => write!(f, "write_to"),
            OpReq::WriteInplace => write!(f, "write_inplace"),
            OpReq::AddTo => write!(f, "add_to"),
        }
    }
}

/// Which compute entry point storage inference selected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchMode {
    /// Dense kernel over plain buffers.
    FCompute,
    /// Storage-aware kernel; only valid when the schema provides `compute_ex`.
    FComputeEx,
}

/// Parse a node's raw attributes into typed parameters.
pub type FParseParams = fn(&Attrs) -> Result<OpParams>;

/// Resolve shape slots. Returns `Ok(true)` once every slot is complete and
/// `Ok(false)` when more information is needed.
pub type FInferShape = fn(&OpParams, &mut [PartialShape], &mut [PartialShape]) -> Result<bool>;

/// Resolve element types. Same completion convention as [`FInferShape`].
pub type FInferType = fn(&OpParams, &mut [Option<DType>], &mut [Option<DType>]) -> Result<bool>;

/// Resolve storage types and pick the compute entry point.
pub type FInferStorageType =
    fn(&OpParams, &mut [Option<StorageType>], &mut [Option<StorageType>]) -> Result<DispatchMode>;

/// Auxiliary resources the compute step needs.
pub type FResourceRequest = fn(&OpParams) -> Vec<ResourceRequest>;

/// Forward kernel over fully resolved, engine-allocated tensors.
pub type FCompute =
    fn(&OpParams, &mut OpContext<'_>, &[&Tensor], &[OpReq], &mut [&mut Tensor]) -> Result<()>;

/// Storage-aware forward kernel.
pub type FComputeEx = FCompute;

/// Documentation for one positional input.
#[derive(Debug, Clone, PartialEq)]
pub struct ArgumentDoc {
    pub name: &'static str,
    pub type_info: &'static str,
    pub doc: &'static str,
}

/// Immutable description of an operator, looked up by name for the lifetime
/// of the process.
#[derive(Clone)]
pub struct OpSchema {
    pub name: &'static str,
    pub aliases: &'static [&'static str],
    pub description: &'static str,
    pub arguments: Vec<ArgumentDoc>,
    pub num_inputs: usize,
    pub num_outputs: usize,
    pub output_names: &'static [&'static str],
    pub params: ParamDescriptor,
    pub parse_params: FParseParams,
    pub infer_shape: FInferShape,
    pub infer_type: FInferType,
    pub infer_storage_type: FInferStorageType,
    pub resource_request: FResourceRequest,
    pub compute: FCompute,
    /// Sparse/alternate compute path, if the operator has one.
    pub compute_ex: Option<FComputeEx>,
    /// Name of the backward operator, if gradients are wired up.
    pub gradient: Option<&'static str>,
}

impl OpSchema {
    pub fn input_names(&self) -> Vec<&'static str> {
        self.arguments.iter().map(|a| a.name).collect()
    }

    /// Full documentation: description, inputs, then parameters.
    pub fn describe(&self) -> String {
        let mut out = format!("{}\n\nArguments:\n", self.description.trim_end());
        for arg in &self.arguments {
            out.push_str(&format!("{} : {}\n    {}\n", arg.name, arg.type_info, arg.doc));
        }
        out.push_str(&self.params.describe());
        out
    }
}

impl fmt::Debug for OpSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OpSchema")
            .field("name", &self.name)
            .field("aliases", &self.aliases)
            .field("num_inputs", &self.num_inputs)
            .field("num_outputs", &self.num_outputs)
            .field("params", &self.params.name())
            .field("compute_ex", &self.compute_ex.is_some())
            .field("gradient", &self.gradient)
            .finish_non_exhaustive()
    }
}
