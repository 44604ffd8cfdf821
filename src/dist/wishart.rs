//! Wishart distribution over positive-definite matrices
#[cfg(feature = "serde1")]
use serde::{Deserialize, Serialize};

use nalgebra::DMatrix;
use rand::Rng;
use rand_distr::{ChiSquared, StandardNormal};
use std::f64::consts::LN_2;
use std::fmt;
use std::sync::OnceLock;

use crate::misc::lnmv_gamma;
use crate::traits::{ContinuousDistr, HasDensity, Mean, Sampleable, Support};

/// [Wishart distribution](https://en.wikipedia.org/wiki/Wishart_distribution),
/// W(ν, **V**) over p-by-p positive-definite matrices, parameterized by the
/// lower Cholesky factor of the scale matrix **V**.
///
/// Draws use the Bartlett decomposition: a lower-triangular matrix **A** with
/// χ² diagonal and standard-normal subdiagonal entries gives
/// W = (L<sub>V</sub>A)(L<sub>V</sub>A)ᵗ from O(p²) scalar draws.
///
/// # Example
///
/// ```
/// use nalgebra::DMatrix;
/// use matvariate::prelude::*;
///
/// let wishart = Wishart::identity(3);
///
/// let mut rng = rand::thread_rng();
/// let w: DMatrix<f64> = wishart.draw(&mut rng);
///
/// // Draws are positive definite
/// assert!(w.cholesky().is_some());
/// ```
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde1", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde1", serde(rename_all = "snake_case"))]
pub struct Wishart {
    /// Degrees of freedom, ν >= p
    df: usize,
    /// Lower Cholesky factor of the p-by-p scale matrix, **V**
    scale_tril: DMatrix<f64>,
    /// Cached ln of the normalizing constant
    #[cfg_attr(feature = "serde1", serde(skip))]
    ln_z: OnceLock<f64>,
}

impl PartialEq for Wishart {
    fn eq(&self, other: &Wishart) -> bool {
        self.df == other.df && self.scale_tril == other.scale_tril
    }
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde1", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde1", serde(rename_all = "snake_case"))]
pub enum WishartError {
    /// The df parameter is less than the number of dimensions
    DfLessThanDimensions { df: usize, ndims: usize },
    /// The scale factor is not square
    ScaleTrilNotSquare {
        /// number of rows
        nrows: usize,
        /// number of columns
        ncols: usize,
    },
    /// The scale factor is not lower triangular with a positive diagonal
    ScaleTrilNotLowerTriangular,
    /// The scale matrix is not positive definite
    ScaleNotPositiveDefinite,
}

impl Wishart {
    /// Create a Wishart distribution, W(ν, **V**), from the lower Cholesky
    /// factor of **V**.
    ///
    /// # Arguments
    /// - df: Degrees of freedom, ν >= p
    /// - scale_tril: p-by-p lower-triangular factor with positive diagonal
    pub fn new(
        df: usize,
        scale_tril: DMatrix<f64>,
    ) -> Result<Self, WishartError> {
        if !scale_tril.is_square() {
            return Err(WishartError::ScaleTrilNotSquare {
                nrows: scale_tril.nrows(),
                ncols: scale_tril.ncols(),
            });
        }
        let n = scale_tril.nrows();
        let lower_tri = (0..n).all(|i| {
            scale_tril[(i, i)] > 0.0
                && ((i + 1)..n).all(|j| scale_tril[(i, j)] == 0.0)
        });
        if !lower_tri {
            Err(WishartError::ScaleTrilNotLowerTriangular)
        } else if df < n {
            Err(WishartError::DfLessThanDimensions { df, ndims: n })
        } else {
            Ok(Wishart {
                df,
                scale_tril,
                ln_z: OnceLock::new(),
            })
        }
    }

    /// Creates a new Wishart without checking whether the parameters are
    /// valid.
    #[inline]
    pub fn new_unchecked(df: usize, scale_tril: DMatrix<f64>) -> Self {
        Wishart {
            df,
            scale_tril,
            ln_z: OnceLock::new(),
        }
    }

    /// Create a Wishart distribution from the scale matrix itself, factoring
    /// it internally.
    pub fn from_scale(
        df: usize,
        scale: DMatrix<f64>,
    ) -> Result<Self, WishartError> {
        if !scale.is_square() {
            return Err(WishartError::ScaleTrilNotSquare {
                nrows: scale.nrows(),
                ncols: scale.ncols(),
            });
        }
        let scale_tril = scale
            .cholesky()
            .map(|chol| chol.unpack())
            .ok_or(WishartError::ScaleNotPositiveDefinite)?;
        Wishart::new(df, scale_tril)
    }

    /// Create a Wishart distribution, W(p, **I**<sub>p</sub>)
    pub fn identity(dims: usize) -> Self {
        Wishart {
            df: dims,
            scale_tril: DMatrix::identity(dims, dims),
            ln_z: OnceLock::new(),
        }
    }

    /// Get the degrees of freedom, ν
    #[inline]
    pub fn df(&self) -> usize {
        self.df
    }

    /// Get a reference to the lower Cholesky factor of the scale matrix
    #[inline]
    pub fn scale_tril(&self) -> &DMatrix<f64> {
        &self.scale_tril
    }

    /// Get the number of dimensions
    #[inline]
    pub fn ndims(&self) -> usize {
        self.scale_tril.nrows()
    }

    // ln of the normalizer: νp/2 ln2 + ν/2 ln|V| + ln Γ_p(ν/2)
    fn ln_z(&self) -> f64 {
        *self.ln_z.get_or_init(|| {
            let p = self.ndims();
            let v = self.df as f64;
            let half_ln_det_scale: f64 =
                self.scale_tril.diagonal().iter().map(|&l| l.ln()).sum();
            v * (p as f64) / 2.0 * LN_2
                + v * half_ln_det_scale
                + lnmv_gamma(p, v / 2.0)
        })
    }
}

impl HasDensity<DMatrix<f64>> for Wishart {
    fn ln_f(&self, x: &DMatrix<f64>) -> f64 {
        let p = self.ndims();
        let v = self.df as f64;
        match x.clone().cholesky() {
            Some(chol) => {
                let l_x = chol.unpack();
                let half_ln_det_x: f64 =
                    l_x.diagonal().iter().map(|&l| l.ln()).sum();
                // tr(V⁻¹X) = ‖L_V⁻¹ L_X‖²_F
                let a = self
                    .scale_tril
                    .solve_lower_triangular(&l_x)
                    .expect("scale_tril has a positive diagonal");
                (v - p as f64 - 1.0) * half_ln_det_x
                    - 0.5 * a.norm_squared()
                    - self.ln_z()
            }
            None => f64::NEG_INFINITY,
        }
    }
}

impl Sampleable<DMatrix<f64>> for Wishart {
    fn draw<R: Rng>(&self, rng: &mut R) -> DMatrix<f64> {
        let p = self.ndims();
        let mut a = DMatrix::<f64>::zeros(p, p);
        for i in 0..p {
            let x2 = ChiSquared::new((self.df - i) as f64)
                .expect("df >= ndims keeps the shape positive");
            a[(i, i)] = rng.sample(x2).sqrt();
            for j in 0..i {
                a[(i, j)] = rng.sample::<f64, _>(StandardNormal);
            }
        }
        let la = &self.scale_tril * a;
        &la * la.transpose()
    }
}

impl Support<DMatrix<f64>> for Wishart {
    fn supports(&self, x: &DMatrix<f64>) -> bool {
        x.nrows() == self.ndims() && x.clone().cholesky().is_some()
    }
}

impl ContinuousDistr<DMatrix<f64>> for Wishart {}

impl Mean<DMatrix<f64>> for Wishart {
    fn mean(&self) -> Option<DMatrix<f64>> {
        let scale = &self.scale_tril * self.scale_tril.transpose();
        Some(scale * self.df as f64)
    }
}

impl std::error::Error for WishartError {}

impl fmt::Display for WishartError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DfLessThanDimensions { df, ndims } => write!(
                f,
                "df, the degrees of freedom must be greater than or equal \
                 to the number of dimensions, but {} < {}",
                df, ndims
            ),
            Self::ScaleTrilNotSquare { nrows, ncols } => write!(
                f,
                "The scale factor is not square: {} x {}",
                nrows, ncols
            ),
            Self::ScaleTrilNotLowerTriangular => write!(
                f,
                "The scale factor is not lower triangular with a positive \
                 diagonal"
            ),
            Self::ScaleNotPositiveDefinite => {
                write!(f, "The scale matrix is not positive definite")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dist::InvWishart;
    use rand::SeedableRng;
    use rand_xoshiro::Xoshiro256Plus;

    const TOL: f64 = 1E-12;

    #[test]
    fn new_should_reject_df_too_low() {
        let scale_tril = DMatrix::identity(4, 4);
        assert!(Wishart::new(4, scale_tril.clone()).is_ok());
        assert!(Wishart::new(5, scale_tril.clone()).is_ok());
        match Wishart::new(3, scale_tril) {
            Err(WishartError::DfLessThanDimensions { df: 3, ndims: 4 }) => (),
            res => panic!("wrong result: {:?}", res),
        }
    }

    #[test]
    fn new_should_reject_non_square_scale_tril() {
        let scale_tril = DMatrix::identity(4, 3);
        match Wishart::new(5, scale_tril) {
            Err(WishartError::ScaleTrilNotSquare { nrows: 4, ncols: 3 }) => (),
            res => panic!("wrong result: {:?}", res),
        }
    }

    #[test]
    fn new_should_reject_non_triangular_scale_tril() {
        let scale_tril = DMatrix::from_row_slice(2, 2, &[1.0, 0.5, 0.5, 1.0]);
        match Wishart::new(3, scale_tril) {
            Err(WishartError::ScaleTrilNotLowerTriangular) => (),
            res => panic!("wrong result: {:?}", res),
        }
    }

    #[test]
    fn from_scale_should_reject_non_positive_definite() {
        let scale = DMatrix::from_row_slice(2, 2, &[1.0, 2.0, 2.0, 1.0]);
        match Wishart::from_scale(3, scale) {
            Err(WishartError::ScaleNotPositiveDefinite) => (),
            res => panic!("wrong result: {:?}", res),
        }
    }

    #[test]
    fn from_scale_factors_the_scale_matrix() {
        let scale = DMatrix::from_row_slice(2, 2, &[4.0, 1.0, 1.0, 3.0]);
        let w = Wishart::from_scale(3, scale.clone()).unwrap();
        let rebuilt = w.scale_tril() * w.scale_tril().transpose();
        assert::close(rebuilt[(0, 0)], scale[(0, 0)], 1E-10);
        assert::close(rebuilt[(1, 0)], scale[(1, 0)], 1E-10);
        assert::close(rebuilt[(1, 1)], scale[(1, 1)], 1E-10);
    }

    #[test]
    fn ln_f_standard_ident() {
        // ln p(I) = -p/2 - νp/2 ln2 - ln Γ_p(ν/2), hand-derived for p = ν = 2
        let w = Wishart::identity(2);
        let x = DMatrix::<f64>::identity(2, 2);
        assert::close(w.ln_f(&x), -3.5310242469692908, TOL);
    }

    #[test]
    fn ln_f_is_neg_inf_outside_the_support() {
        let w = Wishart::identity(2);
        let x = DMatrix::from_row_slice(2, 2, &[1.0, 2.0, 2.0, 1.0]);
        assert_eq!(w.ln_f(&x), f64::NEG_INFINITY);
    }

    #[test]
    fn ln_f_agrees_with_inv_wishart_change_of_variable() {
        // If W ~ W(ν, Ψ⁻¹) then W⁻¹ ~ W⁻¹(Ψ, ν), and the densities relate
        // by ln p(Σ) = ln p_W(Σ⁻¹) - (p+1) ln|Σ|
        let psi = DMatrix::from_row_slice(
            3,
            3,
            &[
                1.10576891, -0.20160336, 0.09378834, -0.20160336, 0.66794786,
                -0.16020905, 0.09378834, -0.16020905, 1.15263284,
            ],
        );
        let df = 5;
        let w =
            Wishart::from_scale(df, psi.clone().try_inverse().unwrap())
                .unwrap();
        let iw = InvWishart::new(psi, df).unwrap();

        let mut rng = Xoshiro256Plus::seed_from_u64(0xABCD);
        for sigma in iw.sample(10, &mut rng) {
            let p = sigma.nrows() as f64;
            let w_side = w.ln_f(&sigma.clone().try_inverse().unwrap())
                - (p + 1.0) * sigma.determinant().ln();
            assert::close(iw.ln_f(&sigma), w_side, 1E-8);
        }
    }

    #[test]
    fn draws_should_be_positive_definite() {
        let scale_tril = DMatrix::from_row_slice(2, 2, &[1.3, 0.0, -0.4, 0.8]);
        let w = Wishart::new(4, scale_tril).unwrap();
        let mut rng = rand::thread_rng();
        for x in w.sample(100, &mut rng) {
            assert!(x.clone().cholesky().is_some());
        }
    }

    #[test]
    fn draws_concentrate_near_the_mean() {
        // Law of large numbers sanity check on the Bartlett sampler
        let w = Wishart::identity(3);
        let mut rng = Xoshiro256Plus::seed_from_u64(0x1234);
        let n = 5_000;
        let sum = w
            .sample(n, &mut rng)
            .iter()
            .fold(DMatrix::<f64>::zeros(3, 3), |acc, x| acc + x);
        let mean_hat = sum / n as f64;
        let mean = w.mean().unwrap();
        for i in 0..3 {
            for j in 0..3 {
                assert::close(mean_hat[(i, j)], mean[(i, j)], 0.2);
            }
        }
    }

    #[test]
    fn should_impl_debug_clone_and_partialeq() {
        let w = Wishart::identity(3);
        assert_eq!(w, w.clone());
        let _s = format!("{:?}", w);
    }
}
