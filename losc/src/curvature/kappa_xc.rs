use nalgebra::DMatrix;

use super::{utils, CurvatureError, CurvatureInput};

/// Exchange-correlation curvature term by numerical quadrature:
/// `kappa_xc[i][j] = sum_p w_p rho_i(p) rho_j(p)` with
/// `rho_k(p) = (sum_b grid_ao[p][b] C_lo[k][b])^(4/3)`.
///
/// The LO grid value matrix is `npts x nlo` and can be very large, so it is
/// built in contiguous blocks sized to the memory budget. Blocks are
/// independent; each contributes to the lower triangle of a private
/// accumulator and the partials are summed once all blocks are done.
pub(super) fn compute(input: &CurvatureInput) -> Result<DMatrix<f64>, CurvatureError> {
    let nlo = input.nlo();
    let npts = input.npts();

    let block_size = (input.xc_memory_budget / (std::mem::size_of::<f64>() * nlo.max(1))).max(1);
    let n_blocks = npts.div_ceil(block_size);
    log::debug!("kappa_xc: {npts} grid points in {n_blocks} blocks of up to {block_size}");

    let mut kappa_xc;

    #[cfg(feature = "rayon")]
    {
        use rayon::prelude::*;

        kappa_xc = (0..n_blocks)
            .into_par_iter()
            .try_fold(
                || DMatrix::<f64>::zeros(nlo, nlo),
                |mut partial, block| -> Result<DMatrix<f64>, CurvatureError> {
                    let start = block * block_size;
                    let size = block_size.min(npts - start);
                    accumulate_block(input, start, size, &mut partial)?;
                    Ok(partial)
                },
            )
            .try_reduce(|| DMatrix::<f64>::zeros(nlo, nlo), |a, b| Ok(a + b))?;
    }

    #[cfg(not(feature = "rayon"))]
    {
        kappa_xc = DMatrix::<f64>::zeros(nlo, nlo);
        for block in 0..n_blocks {
            let start = block * block_size;
            let size = block_size.min(npts - start);
            accumulate_block(input, start, size, &mut kappa_xc)?;
        }
    }

    utils::mirror_lower_triangle(&mut kappa_xc);
    Ok(kappa_xc)
}

/// Add one grid block's lower-triangular contribution to `acc`.
fn accumulate_block(
    input: &CurvatureInput,
    start: usize,
    size: usize,
    acc: &mut DMatrix<f64>,
) -> Result<(), CurvatureError> {
    let nlo = input.nlo();
    let nbasis = input.nbasis();
    let grid_ao = input.grid_basis_value.as_ref();
    let c_lo = input.c_lo.as_ref();

    let len = size * nlo;
    let mut grid_lo = Vec::new();
    grid_lo
        .try_reserve_exact(len)
        .map_err(|_| CurvatureError::ResourceExhaustion {
            bytes: len * std::mem::size_of::<f64>(),
        })?;

    // grid_lo = grid_ao[start..start+size] * C_lo^T, raised elementwise to
    // the 4/3 power. Squaring first keeps the base of the fractional power
    // non-negative.
    for p in 0..size {
        for k in 0..nlo {
            let mut value = 0.0;
            for b in 0..nbasis {
                value += grid_ao[(start + p, b)] * c_lo[(k, b)];
            }
            let squared = value * value;
            grid_lo.push(squared.powf(2.0 / 3.0));
        }
    }

    let weights = &input.grid_weight[start..start + size];
    for (p, &weight) in weights.iter().enumerate() {
        let rho = &grid_lo[p * nlo..(p + 1) * nlo];
        for i in 0..nlo {
            for j in 0..=i {
                acc[(i, j)] += weight * rho[i] * rho[j];
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use approx::assert_relative_eq;
    use nalgebra::DMatrix;

    use super::{
        super::{CurvatureInput, CurvatureVariant},
        compute,
    };
    use crate::dfa::DfaKind;

    fn input(
        c_lo: DMatrix<f64>,
        grid_basis_value: DMatrix<f64>,
        grid_weight: Vec<f64>,
    ) -> CurvatureInput {
        let nbasis = c_lo.ncols();
        let npairs = nbasis * (nbasis + 1) / 2;
        CurvatureInput::new(
            CurvatureVariant::V1,
            DfaKind::LocalDensity,
            Arc::new(c_lo),
            Arc::new(DMatrix::zeros(1, npairs)),
            Arc::new(DMatrix::identity(1, 1)),
            Arc::new(grid_basis_value),
            Arc::new(grid_weight),
        )
        .unwrap()
    }

    #[test]
    fn single_point_single_orbital() {
        // LO value 2.0 with unit weight: 2^(4/3), evaluated as (2^2)^(2/3).
        let input = input(
            DMatrix::from_row_slice(1, 1, &[1.0]),
            DMatrix::from_row_slice(1, 1, &[2.0]),
            vec![1.0],
        );
        let kappa_xc = compute(&input).unwrap();
        assert_relative_eq!(kappa_xc[(0, 0)], 2.5198420997897464, epsilon = 1e-12);
    }

    #[test]
    fn negative_orbital_values_are_well_defined() {
        // (-2)^(4/3) must come out as ((-2)^2)^(2/3), not NaN.
        let input = input(
            DMatrix::from_row_slice(1, 1, &[1.0]),
            DMatrix::from_row_slice(1, 1, &[-2.0]),
            vec![1.0],
        );
        let kappa_xc = compute(&input).unwrap();
        assert_relative_eq!(kappa_xc[(0, 0)], 2.5198420997897464, epsilon = 1e-12);
    }

    #[test]
    fn zero_weights_give_zero_matrix() {
        let input = input(
            DMatrix::from_row_slice(2, 2, &[1.0, 0.0, 0.0, 1.0]),
            DMatrix::from_row_slice(3, 2, &[0.4, 0.2, -0.5, 1.3, 0.8, -0.1]),
            vec![0.0; 3],
        );
        let kappa_xc = compute(&input).unwrap();
        assert!(kappa_xc.iter().all(|&value| value == 0.0));
    }

    #[test]
    fn result_is_invariant_under_block_size() {
        let c_lo = DMatrix::from_row_slice(2, 2, &[0.7, -0.3, 0.2, 0.9]);
        let grid = DMatrix::from_row_slice(
            7,
            2,
            &[
                0.4, 0.2, //
                -0.5, 1.3, //
                0.8, -0.1, //
                0.3, 0.6, //
                -0.2, 0.5, //
                1.1, 0.4, //
                0.6, -0.7,
            ],
        );
        let weights = vec![0.3, 0.5, 0.2, 0.7, 0.1, 0.4, 0.6];

        let one_block = compute(&input(c_lo.clone(), grid.clone(), weights.clone())).unwrap();
        // A budget of one f64 row forces single-point blocks.
        let many_blocks = compute(
            &input(c_lo, grid, weights)
                .with_memory_budget(std::mem::size_of::<f64>() * 2),
        )
        .unwrap();

        assert_relative_eq!(one_block, many_blocks, epsilon = 1e-10);
    }

    #[test]
    fn matches_direct_quadrature() {
        // One LO over two AOs, two points; evaluate the sum by hand.
        let input = input(
            DMatrix::from_row_slice(1, 2, &[0.6, 0.8]),
            DMatrix::from_row_slice(2, 2, &[1.0, 0.5, 0.25, -1.0]),
            vec![0.9, 1.1],
        );
        let kappa_xc = compute(&input).unwrap();

        let rho = |value: f64| (value * value).powf(2.0 / 3.0);
        let expected = 0.9 * rho(0.6 + 0.4) * rho(0.6 + 0.4) + 1.1 * rho(0.15 - 0.8) * rho(0.15 - 0.8);
        assert_relative_eq!(kappa_xc[(0, 0)], expected, epsilon = 1e-12);
    }
}
