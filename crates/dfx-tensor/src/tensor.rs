use crate::dtype::DType;
use crate::error::{Result, TensorError};
use crate::shape::{PartialShape, Shape};
use crate::storage::{CpuStorage, StorageType};

/// A fully resolved tensor value as the engine hands it to a kernel.
///
/// Holds a contiguous, row-major buffer with an associated shape and storage
/// type. The element type is whatever the buffer carries.
#[derive(Debug, Clone, PartialEq)]
pub struct Tensor {
    storage: CpuStorage,
    shape: Shape,
    stype: StorageType,
}

impl Tensor {
    /// Create a new dense f32 tensor from data and a shape.
    ///
    /// # Panics
    /// Panics if `data.len() != shape.numel()`.
    pub fn new(data: Vec<f32>, shape: Shape) -> Self {
        assert_eq!(
            data.len(),
            shape.numel(),
            "data length {} does not match shape {} (numel={})",
            data.len(),
            shape,
            shape.numel()
        );
        Tensor {
            storage: CpuStorage::from_f32_vec(data),
            shape,
            stype: StorageType::Default,
        }
    }

    /// Wrap an existing buffer.
    pub fn from_storage(storage: CpuStorage, shape: Shape, stype: StorageType) -> Result<Self> {
        if storage.len() != shape.numel() {
            return Err(TensorError::LengthMismatch {
                len: storage.len(),
                shape: shape.to_string(),
                numel: shape.numel(),
            });
        }
        Ok(Tensor {
            storage,
            shape,
            stype,
        })
    }

    /// Create a zero-filled dense tensor of the given dtype and shape.
    pub fn zeros(dtype: DType, shape: Shape) -> Self {
        let n = shape.numel();
        Tensor {
            storage: CpuStorage::zeros(dtype, n),
            shape,
            stype: StorageType::Default,
        }
    }

    /// Returns a reference to the tensor's shape.
    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    /// Returns the tensor's element type.
    pub fn dtype(&self) -> DType {
        self.storage.dtype()
    }

    pub fn storage_type(&self) -> StorageType {
        self.stype
    }

    /// Returns the underlying storage reference.
    pub fn storage(&self) -> &CpuStorage {
        &self.storage
    }

    /// Returns the underlying data as an f32 slice.
    pub fn data_f32(&self) -> Result<&[f32]> {
        self.storage.as_f32_slice()
    }

    /// Returns the underlying data as a mutable f32 slice.
    pub fn data_f32_mut(&mut self) -> Result<&mut [f32]> {
        self.storage.as_f32_slice_mut()
    }

    /// The fully known descriptor of this tensor.
    pub fn desc(&self) -> TensorDesc {
        TensorDesc {
            shape: PartialShape::from(&self.shape),
            dtype: Some(self.dtype()),
            stype: Some(self.stype),
        }
    }
}

/// What graph construction knows about one tensor slot.
///
/// Inference passes fill the fields in order: shape, then dtype, then
/// storage type.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TensorDesc {
    pub shape: PartialShape,
    pub dtype: Option<DType>,
    pub stype: Option<StorageType>,
}

impl TensorDesc {
    /// A slot with nothing resolved yet.
    pub fn unknown() -> Self {
        TensorDesc::default()
    }

    pub fn with_shape(mut self, shape: impl Into<PartialShape>) -> Self {
        self.shape = shape.into();
        self
    }

    pub fn with_dtype(mut self, dtype: DType) -> Self {
        self.dtype = Some(dtype);
        self
    }

    pub fn with_storage(mut self, stype: StorageType) -> Self {
        self.stype = Some(stype);
        self
    }

    /// Returns true once shape, dtype and storage type are all resolved.
    pub fn is_resolved(&self) -> bool {
        self.shape.is_complete() && self.dtype.is_some() && self.stype.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_tensor() {
        let t = Tensor::new(vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0], Shape::new(vec![2, 3]));
        assert_eq!(t.shape().ndim(), 2);
        assert_eq!(t.shape().dim(0), 2);
        assert_eq!(t.shape().dim(1), 3);
        assert_eq!(t.dtype(), DType::F32);
        assert_eq!(t.storage_type(), StorageType::Default);
        assert_eq!(t.data_f32().unwrap(), &[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
    }

    #[test]
    #[should_panic]
    fn test_new_shape_mismatch_panics() {
        let _t = Tensor::new(vec![1.0, 2.0], Shape::new(vec![3]));
    }

    #[test]
    fn test_from_storage_length_mismatch() {
        let err = Tensor::from_storage(
            CpuStorage::from_f32_vec(vec![1.0; 5]),
            Shape::new(vec![2, 3]),
            StorageType::Default,
        )
        .unwrap_err();
        assert_eq!(
            err,
            TensorError::LengthMismatch {
                len: 5,
                shape: "[2, 3]".to_string(),
                numel: 6
            }
        );
    }

    #[test]
    fn test_zeros_non_f32() {
        let mut t = Tensor::zeros(DType::I32, Shape::new(vec![2, 2]));
        assert_eq!(t.dtype(), DType::I32);
        assert!(t.data_f32().is_err());
        assert!(t.data_f32_mut().is_err());
    }

    #[test]
    fn test_desc_is_resolved() {
        let t = Tensor::zeros(DType::F32, Shape::new(vec![4, 1]));
        let d = t.desc();
        assert!(d.is_resolved());
        assert_eq!(d.dtype, Some(DType::F32));
        assert_eq!(d.shape.to_shape(), Some(Shape::new(vec![4, 1])));
    }

    #[test]
    fn test_desc_builders() {
        let d = TensorDesc::unknown().with_shape(PartialShape::with_rank(2));
        assert!(!d.is_resolved());
        let d = d
            .with_shape(Shape::new(vec![1, 1]))
            .with_dtype(DType::F64)
            .with_storage(StorageType::Csr);
        assert!(d.is_resolved());
    }
}
