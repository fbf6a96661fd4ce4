pub mod curvature;
pub mod dfa;

pub mod testing {
    use std::{error::Error, fs::File, path::Path, sync::Arc};

    use nalgebra::DMatrix;
    use serde::{Deserialize, Serialize};

    use crate::{
        curvature::{CurvatureError, CurvatureInput, CurvatureVariant},
        dfa::DfaKind,
    };

    /// A fully literal set of curvature inputs that can be stored as JSON and
    /// rebuilt into a validated [`CurvatureInput`]. Used by the regression
    /// tests and benches, and handy for recording cases from a live driver.
    #[derive(Serialize, Deserialize)]
    pub struct CurvatureFixture {
        pub name: String,
        dfa: DfaKind,
        c_lo: Vec<Vec<f64>>,
        df_pmn: Vec<Vec<f64>>,
        df_vpq_inverse: Vec<Vec<f64>>,
        grid_basis_value: Vec<Vec<f64>>,
        grid_weight: Vec<f64>,
    }

    impl CurvatureFixture {
        pub fn new(
            name: String,
            dfa: DfaKind,
            c_lo: Vec<Vec<f64>>,
            df_pmn: Vec<Vec<f64>>,
            df_vpq_inverse: Vec<Vec<f64>>,
            grid_basis_value: Vec<Vec<f64>>,
            grid_weight: Vec<f64>,
        ) -> Self {
            Self {
                name,
                dfa,
                c_lo,
                df_pmn,
                df_vpq_inverse,
                grid_basis_value,
                grid_weight,
            }
        }

        pub fn load(path: impl AsRef<Path>) -> Result<Self, Box<dyn Error>> {
            Ok(serde_json::from_reader(File::open(path)?)?)
        }

        pub fn save(&self, path: impl AsRef<Path>) -> Result<(), Box<dyn Error>> {
            Ok(serde_json::to_writer(
                File::options()
                    .create(true)
                    .write(true)
                    .truncate(true)
                    .open(path)?,
                self,
            )?)
        }

        /// Rebuild a validated input state from the stored literals.
        pub fn to_input(&self, variant: CurvatureVariant) -> Result<CurvatureInput, CurvatureError> {
            CurvatureInput::new(
                variant,
                self.dfa,
                Arc::new(matrix(&self.c_lo)),
                Arc::new(matrix(&self.df_pmn)),
                Arc::new(matrix(&self.df_vpq_inverse)),
                Arc::new(matrix(&self.grid_basis_value)),
                Arc::new(self.grid_weight.clone()),
            )
        }
    }

    fn matrix(rows: &[Vec<f64>]) -> DMatrix<f64> {
        let ncols = rows.first().map_or(0, Vec::len);
        DMatrix::from_fn(rows.len(), ncols, |i, j| rows[i][j])
    }
}
