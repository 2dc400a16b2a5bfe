use std::fmt;

use half::f16;

use crate::dtype::DType;
use crate::error::{Result, TensorError};

/// Memory layout of a tensor value.
///
/// Only `Default` (dense, contiguous row-major) is computable by the CPU
/// kernels in this workspace. The sparse kinds are recognized so that
/// inference can see and override them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum StorageType {
    /// Dense storage.
    #[default]
    Default,
    /// Row-sparse: a subset of rows stored densely, plus their indices.
    RowSparse,
    /// Compressed sparse row.
    Csr,
}

impl StorageType {
    pub fn is_dense(&self) -> bool {
        matches!(self, StorageType::Default)
    }
}

impl fmt::Display for StorageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageType::Default => write!(f, "default"),
            StorageType::RowSparse => write!(f, "row_sparse"),
            StorageType::Csr => write!(f, "csr"),
        }
    }
}

/// CPU-side element buffer, one variant per `DType`.
///
/// Buffers are owned by the execution engine; operator kernels only borrow
/// them for the duration of a call.
#[derive(Debug, Clone, PartialEq)]
pub enum CpuStorage {
    F32(Vec<f32>),
    F64(Vec<f64>),
    F16(Vec<f16>),
    U8(Vec<u8>),
    I32(Vec<i32>),
}

impl CpuStorage {
    /// Number of elements in this storage.
    pub fn len(&self) -> usize {
        match self {
            CpuStorage::F32(v) => v.len(),
            CpuStorage::F64(v) => v.len(),
            CpuStorage::F16(v) => v.len(),
            CpuStorage::U8(v) => v.len(),
            CpuStorage::I32(v) => v.len(),
        }
    }

    /// Returns true if the storage contains no elements.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the data as an f32 slice.
    ///
    /// # Errors
    /// Returns `UnsupportedDType` if the storage is not F32.
    pub fn as_f32_slice(&self) -> Result<&[f32]> {
        match self {
            CpuStorage::F32(v) => Ok(v.as_slice()),
            other => Err(TensorError::UnsupportedDType(format!(
                "expected float32 buffer, got {}",
                other.dtype()
            ))),
        }
    }

    /// Returns the data as a mutable f32 slice.
    ///
    /// # Errors
    /// Returns `UnsupportedDType` if the storage is not F32.
    pub fn as_f32_slice_mut(&mut self) -> Result<&mut [f32]> {
        match self {
            CpuStorage::F32(v) => Ok(v.as_mut_slice()),
            other => Err(TensorError::UnsupportedDType(format!(
                "expected float32 buffer, got {}",
                other.dtype()
            ))),
        }
    }

    /// Create zero-filled storage for the given dtype and element count.
    pub fn zeros(dtype: DType, n: usize) -> Self {
        match dtype {
            DType::F32 => CpuStorage::F32(vec![0.0; n]),
            DType::F64 => CpuStorage::F64(vec![0.0; n]),
            DType::F16 => CpuStorage::F16(vec![f16::ZERO; n]),
            DType::U8 => CpuStorage::U8(vec![0; n]),
            DType::I32 => CpuStorage::I32(vec![0; n]),
        }
    }

    /// Create storage from an f32 vector.
    pub fn from_f32_vec(data: Vec<f32>) -> Self {
        CpuStorage::F32(data)
    }

    /// Returns the dtype of this storage.
    pub fn dtype(&self) -> DType {
        match self {
            CpuStorage::F32(_) => DType::F32,
            CpuStorage::F64(_) => DType::F64,
            CpuStorage::F16(_) => DType::F16,
            CpuStorage::U8(_) => DType::U8,
            CpuStorage::I32(_) => DType::I32,
        }
    }
}
