//! `dfx-tensor` - Tensor descriptors and buffers for dataflow graph operators.
//!
//! This crate provides:
//! - Element types (`DType`) and storage kinds (`StorageType`)
//! - Complete and partially inferred shapes
//! - Engine-owned `Tensor` buffers and inference-time `TensorDesc` slots
//! - A `ComputeBackend` trait with a reference `CpuBackend`

pub mod backend;
pub mod cpu;
pub mod dtype;
pub mod error;
pub mod shape;
pub mod storage;
pub mod tensor;

// Re-export primary types at the crate root for convenience.
pub use backend::ComputeBackend;
pub use cpu::CpuBackend;
pub use dtype::DType;
pub use error::{Result, TensorError};
pub use shape::{PartialShape, Shape};
pub use storage::{CpuStorage, StorageType};
pub use tensor::{Tensor, TensorDesc};
