use crate::error::{Result, TensorError};
use std::fmt;

/// A tensor shape, wrapping a vector of dimension sizes.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Shape {
    dims: Vec<usize>,
}

impl Shape {
    /// Create a new shape from a vector of dimensions.
    pub fn new(dims: Vec<usize>) -> Self {
        Shape { dims }
    }

    /// Create a shape from a slice of dimensions.
    pub fn from_slice(dims: &[usize]) -> Self {
        Shape {
            dims: dims.to_vec(),
        }
    }

    /// Number of dimensions (rank).
    pub fn ndim(&self) -> usize {
        self.dims.len()
    }

    /// Total number of elements (product of all dimension sizes).
    pub fn numel(&self) -> usize {
        self.dims.iter().product()
    }

    /// Returns the size of dimension `i`.
    ///
    /// # Panics
    /// Panics if `i >= ndim()`.
    pub fn dim(&self, i: usize) -> usize {
        self.dims[i]
    }

    /// Returns a reference to the underlying dimension sizes.
    pub fn dims(&self) -> &[usize] {
        &self.dims
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (i, d) in self.dims.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", d)?;
        }
        write!(f, "]")
    }
}

impl From<Vec<usize>> for Shape {
    fn from(dims: Vec<usize>) -> Self {
        Shape::new(dims)
    }
}

impl From<&[usize]> for Shape {
    fn from(dims: &[usize]) -> Self {
        Shape::from_slice(dims)
    }
}

/// A shape slot that may still be unresolved during graph construction.
///
/// The rank itself may be unknown, or the rank may be known
/// with some individual dimensions still open.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct PartialShape {
    dims: Option<Vec<Option<usize>>>,
}

impl PartialShape {
    /// A slot about which nothing is known yet.
    pub fn unknown() -> Self {
        PartialShape { dims: None }
    }

    /// A slot with known rank and all dimensions open.
    pub fn with_rank(ndim: usize) -> Self {
        PartialShape {
            dims: Some(vec![None; ndim]),
        }
    }

    /// A slot with known rank and the given (possibly open) dimensions.
    pub fn from_dims(dims: Vec<Option<usize>>) -> Self {
        PartialShape { dims: Some(dims) }
    }

    /// Rank, if known.
    pub fn ndim(&self) -> Option<usize> {
        self.dims.as_ref().map(|d| d.len())
    }

    /// Size of dimension `i`, if both the rank and that dimension are known.
    pub fn dim(&self, i: usize) -> Option<usize> {
        self.dims.as_ref().and_then(|d| d.get(i).copied().flatten())
    }

    /// Returns true when the rank and every dimension are known.
    pub fn is_complete(&self) -> bool {
        match &self.dims {
            Some(dims) => dims.iter().all(Option::is_some),
            None => false,
        }
    }

    /// Converts to a complete `Shape`, or `None` if anything is still open.
    pub fn to_shape(&self) -> Option<Shape> {
        let dims = self.dims.as_ref()?;
        dims.iter()
            .copied()
            .collect::<Option<Vec<usize>>>()
            .map(Shape::new)
    }

    /// Unify two views of the same slot.
    ///
    /// Unknown rank defers to the other side. With both ranks known they must
    /// agree, and every dimension known on both sides must be equal; open
    /// dimensions are filled from the other side.
    pub fn merge(&self, other: &PartialShape) -> Result<PartialShape> {
        let (a, b) = match (&self.dims, &other.dims) {
            (None, _) => return Ok(other.clone()),
            (_, None) => return Ok(self.clone()),
            (Some(a), Some(b)) => (a, b),
        };

        if a.len() != b.len() {
            return Err(TensorError::RankMismatch {
                expected: a.len(),
                got: b.len(),
            });
        }

        let mut merged = Vec::with_capacity(a.len());
        for (da, db) in a.iter().zip(b.iter()) {
            match (da, db) {
                (Some(x), Some(y)) if x != y => {
                    return Err(TensorError::ShapeMismatch {
                        expected: self.to_string(),
                        got: other.to_string(),
                    });
                }
                (Some(x), _) | (None, Some(x)) => merged.push(Some(*x)),
                (None, None) => merged.push(None),
            }
        }
        Ok(PartialShape::from_dims(merged))
    }
}

impl fmt::Display for PartialShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let dims = match &self.dims {
            Some(dims) => dims,
            None => return write!(f, "<unknown>"),
        };
        write!(f, "[")?;
        for (i, d) in dims.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            match d {
                Some(n) => write!(f, "{}", n)?,
                None => write!(f, "?")?,
            }
        }
        write!(f, "]")
    }
}

impl From<Shape> for PartialShape {
    fn from(shape: Shape) -> Self {
        PartialShape::from_dims(shape.dims.into_iter().map(Some).collect())
    }
}

impl From<&Shape> for PartialShape {
    fn from(shape: &Shape) -> Self {
        PartialShape::from_dims(shape.dims().iter().copied().map(Some).collect())
    }
}
