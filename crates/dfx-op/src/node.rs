//! A single operator instance and the engine-side driver for its callbacks.

use dfx_tensor::{DType, PartialShape, StorageType, Tensor, TensorDesc};
use tracing::debug;

use crate::error::Result;
use crate::infer::check_arity;
use crate::param::{Attrs, OpParams};
use crate::registry::OpRegistry;
use crate::resource::{OpContext, ResourceRequest};
use crate::schema::{DispatchMode, OpReq, OpSchema};

/// Result of running all inference passes on a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InferOutcome {
    /// Shapes and types of every slot are fully resolved.
    pub complete: bool,
    pub dispatch: DispatchMode,
}

/// An operator bound to the parameters of one graph node.
#[derive(Debug, Clone)]
pub struct Node {
    schema: &'static OpSchema,
    attrs: Attrs,
    params: OpParams,
}

impl Node {
    /// Instantiate the registered operator `op_name` with `attrs`.
    pub fn new(op_name: &str, attrs: Attrs) -> Result<Self> {
        let schema = OpRegistry::global().lookup(op_name)?;
        Self::from_schema(schema, attrs)
    }

    pub fn from_schema(schema: &'static OpSchema, attrs: Attrs) -> Result<Self> {
        let params = (schema.parse_params)(&attrs)?;
        Ok(Node {
            schema,
            attrs,
            params,
        })
    }

    pub fn schema(&self) -> &'static OpSchema {
        self.schema
    }

    pub fn attrs(&self) -> &Attrs {
        &self.attrs
    }

    pub fn params(&self) -> &OpParams {
        &self.params
    }

    /// Run shape, type and storage-type inference, in that order.
    ///
    /// Each pass writes only its own field of the descriptors. Any error
    /// aborts the remaining passes.
    pub fn infer(
        &self,
        inputs: &mut [TensorDesc],
        outputs: &mut [TensorDesc],
    ) -> Result<InferOutcome> {
        let op = self.schema.name;
        check_arity(op, "inputs", self.schema.num_inputs, inputs.len())?;
        check_arity(op, "outputs", self.schema.num_outputs, outputs.len())?;

        let mut in_shapes: Vec<PartialShape> = inputs.iter().map(|d| d.shape.clone()).collect();
        let mut out_shapes: Vec<PartialShape> =
            outputs.iter().map(|d| d.shape.clone()).collect();
        let shapes_done = (self.schema.infer_shape)(&self.params, &mut in_shapes, &mut out_shapes)?;
        for (desc, shape) in inputs.iter_mut().zip(in_shapes) {
            desc.shape = shape;
        }
        for (desc, shape) in outputs.iter_mut().zip(out_shapes) {
            desc.shape = shape;
        }
        debug!(op, complete = shapes_done, "shape inference");

        let mut in_types: Vec<Option<DType>> = inputs.iter().map(|d| d.dtype).collect();
        let mut out_types: Vec<Option<DType>> = outputs.iter().map(|d| d.dtype).collect();
        let types_done = (self.schema.infer_type)(&self.params, &mut in_types, &mut out_types)?;
        for (desc, dtype) in inputs.iter_mut().zip(in_types) {
            desc.dtype = dtype;
        }
        for (desc, dtype) in outputs.iter_mut().zip(out_types) {
            desc.dtype = dtype;
        }
        debug!(op, complete = types_done, "type inference");

        let mut in_stypes: Vec<Option<StorageType>> = inputs.iter().map(|d| d.stype).collect();
        let mut out_stypes: Vec<Option<StorageType>> = outputs.iter().map(|d| d.stype).collect();
        let dispatch =
            (self.schema.infer_storage_type)(&self.params, &mut in_stypes, &mut out_stypes)?;
        for (desc, stype) in inputs.iter_mut().zip(in_stypes) {
            desc.stype = stype;
        }
        for (desc, stype) in outputs.iter_mut().zip(out_stypes) {
            desc.stype = stype;
        }
        debug!(op, ?dispatch, "storage type inference");

        Ok(InferOutcome {
            complete: shapes_done && types_done,
            dispatch,
        })
    }

    /// Resources the engine must materialize before calling [`forward`](Self::forward).
    pub fn resources(&self) -> Vec<ResourceRequest> {
        (self.schema.resource_request)(&self.params)
    }

    /// Run the forward kernel on resolved, engine-allocated tensors.
    pub fn forward(
        &self,
        ctx: &mut OpContext<'_>,
        inputs: &[&Tensor],
        req: &[OpReq],
        outputs: &mut [&mut Tensor],
    ) -> Result<()> {
        (self.schema.compute)(&self.params, ctx, inputs, req, outputs)
    }
}
