/// Reference dense matmul over row-major slices.
///
/// Each output cell gets its own accumulator, summed over `p` in ascending
/// order, so rounding is identical to a left-to-right sum. Every cell of `c`
/// is overwritten; nothing is accumulated into prior contents.
///
/// Callers must have checked `a.len() == m * k`, `b.len() == k * n` and
/// `c.len() == m * n`.
pub(crate) fn matmul_f32(a: &[f32], b: &[f32], c: &mut [f32], m: usize, k: usize, n: usize) {
    for i in 0..m {
        for j in 0..n {
            let mut sum = 0.0f32;
            for p in 0..k {
                sum += a[i * k + p] * b[p * n + j];
            }
            c[i * n + j] = sum;
        }
    }
}
