use itertools::iproduct;
use nalgebra::DMatrix;

use super::{utils, CurvatureError, CurvatureInput};

/// Density-fitted Coulomb curvature term:
/// `kappa_J[i][j] = sum_{pq} (rho_i|p) V^-1_{pq} (q|rho_j)`, i.e.
/// `kappa_J = df_pii^T * V^-1 * df_pii`.
pub(super) fn compute(input: &CurvatureInput) -> Result<DMatrix<f64>, CurvatureError> {
    let df_pii = fitting_projection(input);
    let v_inv = input.df_vpq_inverse.as_ref();

    // Group the cheaper contraction first; both orders are equivalent.
    let kappa_j = if input.nfitbasis() <= input.nlo() {
        df_pii.transpose() * (v_inv * &df_pii)
    } else {
        (df_pii.transpose() * v_inv) * &df_pii
    };
    log::trace!("kappa_J = {kappa_j:0.6}");
    Ok(kappa_j)
}

/// Project the packed AO-pair fitting integrals onto LO pair densities:
/// `(rho_i|q) = sum_{mn} C_lo[i][m] C_lo[i][n] <q|mn>`. The tensor stores
/// each unordered pair once, so off-diagonal pairs count twice.
fn fitting_projection(input: &CurvatureInput) -> DMatrix<f64> {
    let nbasis = input.nbasis();
    let c_lo = input.c_lo.as_ref();
    let df_pmn = input.df_pmn.as_ref();

    let mut df_pii = DMatrix::zeros(input.nfitbasis(), input.nlo());
    for (q, i) in iproduct!(0..input.nfitbasis(), 0..input.nlo()) {
        let mut sum = 0.0;
        for n in 0..nbasis {
            for m in 0..n {
                sum += 2.0 * df_pmn[(q, utils::packed_pair(m, n))] * c_lo[(i, m)] * c_lo[(i, n)];
            }
            sum += df_pmn[(q, utils::packed_pair(n, n))] * c_lo[(i, n)] * c_lo[(i, n)];
        }
        df_pii[(q, i)] = sum;
    }
    df_pii
}
