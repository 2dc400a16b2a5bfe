use std::fmt::Debug;

use crate::error::Result;

/// Trait for pluggable compute backends.
///
/// Kernels receive buffers the engine has already allocated and write their
/// result in place; a backend never allocates the output.
pub trait ComputeBackend: Send + Sync + Debug {
    /// Returns the name of this backend (e.g., "cpu").
    fn name(&self) -> &str;

    /// Matrix multiplication: C = A @ B, overwriting `c`.
    ///
    /// - `a`: row-major data of shape [m, k]
    /// - `b`: row-major data of shape [k, n]
    /// - `c`: row-major output of shape [m, n]; prior contents are ignored
    fn matmul_into(
        &self,
        a: &[f32],
        b: &[f32],
        c: &mut [f32],
        m: usize,
        k: usize,
        n: usize,
    ) -> Result<()>;
}
