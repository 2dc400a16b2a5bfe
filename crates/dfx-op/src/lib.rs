//! `dfx-op` - Operator contract between graph nodes and the execution engine.
//!
//! Each operator publishes an [`OpSchema`]: its name, arity, parameter
//! descriptor, and a fixed set of callbacks the engine drives:
//! - shape, type and storage-type inference at graph-construction time
//! - a resource declaration for scratch memory and RNGs
//! - a forward compute kernel at run time
//!
//! Schemas live in a process-wide, read-only [`OpRegistry`]. [`Node`] binds
//! one schema to a node's parsed parameters and runs the passes in order.

pub mod error;
pub mod infer;
pub mod node;
pub mod ops;
pub mod param;
pub mod registry;
pub mod resource;
pub mod schema;

pub use error::{OpError, Result};
pub use node::{InferOutcome, Node};
pub use ops::slide_dot::SlideDotParam;
pub use param::{Attrs, OpParams, ParamDescriptor, ParamField, ParamType};
pub use registry::OpRegistry;
pub use resource::{OpContext, Resource, ResourceRequest, TempSpace};
pub use schema::{ArgumentDoc, DispatchMode, OpReq, OpSchema};
