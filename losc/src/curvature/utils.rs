use nalgebra::DMatrix;

/// Column index of the AO pair `(m, n)`, `m <= n`, in the packed triangular
/// layout of the fitting tensor.
#[inline(always)]
pub(super) fn packed_pair(m: usize, n: usize) -> usize {
    debug_assert!(m <= n);
    n * (n + 1) / 2 + m
}

/// Copy the lower triangle into the upper triangle so the matrix is
/// bit-exactly symmetric.
pub(super) fn mirror_lower_triangle(matrix: &mut DMatrix<f64>) {
    for i in 0..matrix.nrows() {
        for j in 0..i {
            matrix[(j, i)] = matrix[(i, j)];
        }
    }
}
