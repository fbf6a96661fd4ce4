//! Curvature matrices for the localized orbital scaling correction.
//!
//! The curvature matrix `kappa` couples pairs of localized orbitals and is
//! consumed by an external SCF driver. It is the sum of a density-fitted
//! Coulomb term and a grid-quadrature exchange-correlation term, combined
//! with formula-specific coefficients.

mod kappa_j;
mod kappa_xc;
mod utils;
mod v1;
mod v2;

use std::sync::Arc;

use nalgebra::DMatrix;

use crate::dfa::{CurvatureParameters, DfaKind};

/// Default ceiling on the per-block localized-orbital grid buffer (1 GB).
/// Only trades block count for buffer size; the result is unaffected beyond
/// floating-point summation order.
pub const DEFAULT_XC_MEMORY_BUDGET: usize = 1_000_000_000;

#[derive(Debug, Clone, thiserror::Error, PartialEq)]
pub enum CurvatureError {
    #[error("{name} has {got} {axis}, expected {expected}")]
    DimensionMismatch {
        name: &'static str,
        axis: &'static str,
        expected: usize,
        got: usize,
    },
    #[error("failed to allocate a {bytes} byte grid block buffer")]
    ResourceExhaustion { bytes: usize },
    /// Guard against taking a fractional power of a negative orbital density.
    /// The evaluator squares every value before the 2/3 power, which makes
    /// this unreachable, but the kind is part of the compute contract.
    #[error("fractional power of negative orbital density {value}")]
    NumericDomainViolation { value: f64 },
}

/// Which curvature combination formula to apply. The set is closed and the
/// choice is fixed at construction; both variants expose the same contract.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum CurvatureVariant {
    #[default]
    V1,
    V2,
}

/// Immutable, shared inputs for one curvature evaluation context.
///
/// All matrices are held behind [`Arc`] so a single state can be read by
/// concurrent evaluations; nothing here is mutated after construction. The
/// state is typically rebuilt once per SCF iteration with freshly localized
/// orbitals.
#[derive(Debug)]
pub struct CurvatureInput {
    variant: CurvatureVariant,
    dfa: DfaKind,
    params: CurvatureParameters,
    /// LO coefficients under the AO basis, `nlo x nbasis`
    c_lo: Arc<DMatrix<f64>>,
    /// Three-center fitting integrals `<q|mn>` with AO pairs `m <= n` packed
    /// into columns, `nfitbasis x nbasis(nbasis+1)/2`
    df_pmn: Arc<DMatrix<f64>>,
    /// Inverse of the auxiliary-basis Coulomb metric, `nfitbasis x nfitbasis`
    df_vpq_inverse: Arc<DMatrix<f64>>,
    /// AO basis values on the grid, `npts x nbasis`
    grid_basis_value: Arc<DMatrix<f64>>,
    /// Quadrature weight per grid point
    grid_weight: Arc<Vec<f64>>,
    xc_memory_budget: usize,
}

impl CurvatureInput {
    /// Validate dimension consistency across all inputs and build the shared
    /// state. Parameters default to [`CurvatureParameters::for_dfa`].
    pub fn new(
        variant: CurvatureVariant,
        dfa: DfaKind,
        c_lo: Arc<DMatrix<f64>>,
        df_pmn: Arc<DMatrix<f64>>,
        df_vpq_inverse: Arc<DMatrix<f64>>,
        grid_basis_value: Arc<DMatrix<f64>>,
        grid_weight: Arc<Vec<f64>>,
    ) -> Result<Self, CurvatureError> {
        let nbasis = c_lo.ncols();
        let nfitbasis = df_pmn.nrows();
        let npts = grid_basis_value.nrows();
        let npairs = nbasis * (nbasis + 1) / 2;

        check_axis("df_pmn", "columns", npairs, df_pmn.ncols())?;
        check_axis("df_vpq_inverse", "rows", nfitbasis, df_vpq_inverse.nrows())?;
        check_axis(
            "df_vpq_inverse",
            "columns",
            nfitbasis,
            df_vpq_inverse.ncols(),
        )?;
        check_axis("grid_basis_value", "columns", nbasis, grid_basis_value.ncols())?;
        check_axis("grid_weight", "entries", npts, grid_weight.len())?;

        log::debug!(
            "curvature input: nlo={} nbasis={nbasis} nfitbasis={nfitbasis} npts={npts}",
            c_lo.nrows()
        );

        Ok(Self {
            variant,
            dfa,
            params: CurvatureParameters::for_dfa(dfa),
            c_lo,
            df_pmn,
            df_vpq_inverse,
            grid_basis_value,
            grid_weight,
            xc_memory_budget: DEFAULT_XC_MEMORY_BUDGET,
        })
    }

    /// Override the default parameterization. Consumed before the first
    /// compute; the state stays immutable afterwards.
    pub fn with_parameters(mut self, params: CurvatureParameters) -> Self {
        self.params = params;
        self
    }

    /// Override the exchange-correlation block memory budget in bytes.
    pub fn with_memory_budget(mut self, bytes: usize) -> Self {
        self.xc_memory_budget = bytes;
        self
    }

    /// Number of localized orbitals.
    pub fn nlo(&self) -> usize {
        self.c_lo.nrows()
    }

    /// Number of AO basis functions.
    pub fn nbasis(&self) -> usize {
        self.c_lo.ncols()
    }

    /// Number of auxiliary fitting basis functions.
    pub fn nfitbasis(&self) -> usize {
        self.df_pmn.nrows()
    }

    /// Number of quadrature grid points.
    pub fn npts(&self) -> usize {
        self.grid_basis_value.nrows()
    }

    pub fn variant(&self) -> CurvatureVariant {
        self.variant
    }

    pub fn dfa(&self) -> DfaKind {
        self.dfa
    }

    pub fn parameters(&self) -> &CurvatureParameters {
        &self.params
    }

    pub fn memory_budget(&self) -> usize {
        self.xc_memory_budget
    }

    /// Compute the curvature matrix for the selected variant.
    ///
    /// Returns a freshly allocated, exactly symmetric `nlo x nlo` matrix.
    /// Stateless and idempotent: repeated calls on the same input yield the
    /// same result (up to floating-point summation order in the quadrature).
    pub fn compute(&self) -> Result<DMatrix<f64>, CurvatureError> {
        match self.variant {
            CurvatureVariant::V1 => v1::compute(self),
            CurvatureVariant::V2 => v2::compute(self),
        }
    }
}

fn check_axis(
    name: &'static str,
    axis: &'static str,
    expected: usize,
    got: usize,
) -> Result<(), CurvatureError> {
    if expected == got {
        Ok(())
    } else {
        Err(CurvatureError::DimensionMismatch {
            name,
            axis,
            expected,
            got,
        })
    }
}
