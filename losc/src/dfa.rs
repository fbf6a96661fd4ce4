use serde::{Deserialize, Serialize};

/// The family of density functional approximation the curvature is correcting.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum DfaKind {
    /// Local density approximation
    LocalDensity,
    /// Generalized gradient approximation
    GeneralizedGradient,
    /// Global hybrid with a fixed exact-exchange admixture
    Hybrid,
}

/// Scalar parameters entering the linear combination of the Coulomb and
/// exchange-correlation curvature terms.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct CurvatureParameters {
    /// Exact-exchange admixture of the parent functional
    pub alpha: f64,
    pub beta: f64,
    /// Slater exchange mixing fraction
    pub cx: f64,
    /// Kinetic-energy-density prefactor
    pub tau: f64,
    /// Exact-exchange fraction used by the alternate combination
    pub exf: f64,
}

impl Default for CurvatureParameters {
    fn default() -> Self {
        Self {
            alpha: 0.0,
            beta: 0.0,
            cx: 0.930526,
            tau: 8.0,
            exf: 1.2378,
        }
    }
}

impl CurvatureParameters {
    /// Default parameterization for a functional family. Local and
    /// gradient-corrected functionals carry no exact exchange; the hybrid
    /// default uses the B3LYP-style global admixture.
    pub fn for_dfa(kind: DfaKind) -> Self {
        match kind {
            DfaKind::LocalDensity | DfaKind::GeneralizedGradient => Self::default(),
            DfaKind::Hybrid => Self {
                alpha: 0.2,
                ..Self::default()
            },
        }
    }
}
