use nalgebra::DMatrix;

use super::{kappa_j, kappa_xc, utils, CurvatureError, CurvatureInput};

/// Primary curvature formula:
/// `kappa = (1 - alpha - beta) kappa_J - tau c_x (2/3) (1 - alpha) kappa_xc`.
pub(super) fn compute(input: &CurvatureInput) -> Result<DMatrix<f64>, CurvatureError> {
    let kappa_j = kappa_j::compute(input)?;
    let kappa_xc = kappa_xc::compute(input)?;

    let params = input.parameters();
    let j_factor = 1.0 - params.alpha - params.beta;
    let xc_factor = -params.tau * params.cx * 2.0 / 3.0 * (1.0 - params.alpha);
    log::debug!("curvature v1: j_factor={j_factor:0.6} xc_factor={xc_factor:0.6}");

    let mut kappa = j_factor * kappa_j + xc_factor * kappa_xc;
    utils::mirror_lower_triangle(&mut kappa);
    Ok(kappa)
}
