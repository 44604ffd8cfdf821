//! Inverse-Wishart distribution over positive-definite matrices
#[cfg(feature = "serde1")]
use serde::{Deserialize, Serialize};

use nalgebra::DMatrix;
use rand::Rng;
use std::f64::consts::LN_2;
use std::fmt;
use std::sync::OnceLock;

use crate::dist::Wishart;
use crate::misc::lnmv_gamma;
use crate::traits::{
    ContinuousDistr, HasDensity, Mean, Mode, Sampleable, Support,
};

/// [Inverse Wishart distribution](https://en.wikipedia.org/wiki/Inverse-Wishart_distribution),
/// W<sup>-1</sup>(**Ψ**, ν) over p-by-p positive definite matrices.
///
/// The density is evaluated directly from the closed-form expression; nothing
/// here goes through a transform chain, which is what makes this
/// distribution a useful independent reference for
/// [`NormalInvWishart`](crate::dist::NormalInvWishart), whose covariance arm
/// is built by transforming a [`Wishart`].
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde1", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde1", serde(rename_all = "snake_case"))]
pub struct InvWishart {
    /// p-dimensional scale matrix, **Ψ**
    inv_scale: DMatrix<f64>,
    /// Degrees of freedom, ν >= p
    df: usize,
    /// Cached lower Cholesky factor of **Ψ**
    #[cfg_attr(feature = "serde1", serde(skip))]
    inv_scale_chol: OnceLock<DMatrix<f64>>,
    /// Cached Wishart over the precision, W(ν, chol(**Ψ**⁻¹)), used to draw
    #[cfg_attr(feature = "serde1", serde(skip))]
    base: OnceLock<Wishart>,
}

impl PartialEq for InvWishart {
    fn eq(&self, other: &InvWishart) -> bool {
        self.df == other.df && self.inv_scale == other.inv_scale
    }
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde1", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde1", serde(rename_all = "snake_case"))]
pub enum InvWishartError {
    /// The df parameter is less than the number of dimensions
    DfLessThanDimensions { df: usize, ndims: usize },
    /// The scale matrix is not square
    InvScaleNotSquare {
        /// number of rows
        nrows: usize,
        /// number of columns
        ncols: usize,
    },
    /// The scale matrix is not positive definite
    InvScaleNotPositiveDefinite,
}

impl InvWishart {
    /// Create an Inverse Wishart distribution, W<sup>-1</sup>(**Ψ**, ν) with
    /// p-by-p scale matrix, **Ψ**, and degrees of freedom, ν >= p.
    pub fn new(
        inv_scale: DMatrix<f64>,
        df: usize,
    ) -> Result<Self, InvWishartError> {
        if !inv_scale.is_square() {
            return Err(InvWishartError::InvScaleNotSquare {
                nrows: inv_scale.nrows(),
                ncols: inv_scale.ncols(),
            });
        }
        let ndims = inv_scale.nrows();
        if df < ndims {
            Err(InvWishartError::DfLessThanDimensions { df, ndims })
        } else {
            match inv_scale.clone().cholesky() {
                Some(chol) => {
                    let inv_scale_chol = OnceLock::new();
                    inv_scale_chol.set(chol.unpack()).ok();
                    Ok(InvWishart {
                        inv_scale,
                        df,
                        inv_scale_chol,
                        base: OnceLock::new(),
                    })
                }
                None => Err(InvWishartError::InvScaleNotPositiveDefinite),
            }
        }
    }

    /// Creates a new InvWishart without checking whether the parameters are
    /// valid.
    #[inline]
    pub fn new_unchecked(inv_scale: DMatrix<f64>, df: usize) -> Self {
        InvWishart {
            inv_scale,
            df,
            inv_scale_chol: OnceLock::new(),
            base: OnceLock::new(),
        }
    }

    /// Create an Inverse Wishart distribution,
    /// W<sup>-1</sup>(**I**<sub>p</sub>, p)
    pub fn identity(dims: usize) -> Self {
        InvWishart {
            inv_scale: DMatrix::identity(dims, dims),
            df: dims,
            inv_scale_chol: OnceLock::new(),
            base: OnceLock::new(),
        }
    }

    /// Get a reference to the scale matrix, **Ψ**
    #[inline]
    pub fn inv_scale(&self) -> &DMatrix<f64> {
        &self.inv_scale
    }

    /// Get the degrees of freedom, ν
    #[inline]
    pub fn df(&self) -> usize {
        self.df
    }

    /// Get the number of dimensions
    #[inline]
    pub fn ndims(&self) -> usize {
        self.inv_scale.nrows()
    }

    fn inv_scale_chol(&self) -> &DMatrix<f64> {
        self.inv_scale_chol.get_or_init(|| {
            self.inv_scale
                .clone()
                .cholesky()
                .expect("scale matrix is not positive definite")
                .unpack()
        })
    }

    // Draws go through W(ν, chol(Ψ⁻¹)) on the precision and invert
    fn base(&self) -> &Wishart {
        self.base.get_or_init(|| {
            let p = self.ndims();
            let k = self
                .inv_scale_chol()
                .solve_lower_triangular(&DMatrix::identity(p, p))
                .expect("Cholesky factor has a positive diagonal");
            let tril = (k.transpose() * &k)
                .cholesky()
                .expect(
                    "inverse of a positive-definite matrix is positive definite",
                )
                .unpack();
            Wishart::new_unchecked(self.df, tril)
        })
    }
}

impl HasDensity<DMatrix<f64>> for InvWishart {
    fn ln_f(&self, x: &DMatrix<f64>) -> f64 {
        let p = self.ndims();
        let pf = p as f64;
        let v = self.df as f64;

        match x.clone().cholesky() {
            Some(chol) => {
                let l_x = chol.unpack();
                let half_ln_det_x: f64 =
                    l_x.diagonal().iter().map(|&l| l.ln()).sum();
                let half_ln_det_s: f64 = self
                    .inv_scale_chol()
                    .diagonal()
                    .iter()
                    .map(|&l| l.ln())
                    .sum();
                // tr(ΨX⁻¹) = ‖L_X⁻¹ L_Ψ‖²_F
                let a = l_x
                    .solve_lower_triangular(self.inv_scale_chol())
                    .expect("Cholesky factor has a positive diagonal");

                let denom = v * pf * 0.5 * LN_2 + lnmv_gamma(p, 0.5 * v);

                v * half_ln_det_s - denom - (v + pf + 1.0) * half_ln_det_x
                    - 0.5 * a.norm_squared()
            }
            None => f64::NEG_INFINITY,
        }
    }
}

impl Sampleable<DMatrix<f64>> for InvWishart {
    fn draw<R: Rng>(&self, rng: &mut R) -> DMatrix<f64> {
        let w = self.base().draw(rng);
        w.cholesky()
            .expect("Wishart draws are positive definite")
            .inverse()
    }
}

impl Support<DMatrix<f64>> for InvWishart {
    fn supports(&self, x: &DMatrix<f64>) -> bool {
        x.nrows() == self.ndims() && x.clone().cholesky().is_some()
    }
}

impl ContinuousDistr<DMatrix<f64>> for InvWishart {}

impl Mean<DMatrix<f64>> for InvWishart {
    fn mean(&self) -> Option<DMatrix<f64>> {
        let p = self.ndims();
        if self.df > p + 1 {
            Some(&self.inv_scale / (self.df - p - 1) as f64)
        } else {
            None
        }
    }
}

impl Mode<DMatrix<f64>> for InvWishart {
    fn mode(&self) -> Option<DMatrix<f64>> {
        let p = self.ndims();
        Some(&self.inv_scale / (self.df + p + 1) as f64)
    }
}

impl std::error::Error for InvWishartError {}

impl fmt::Display for InvWishartError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DfLessThanDimensions { df, ndims } => write!(
                f,
                "df, the degrees of freedom must be greater than or equal \
                 to the number of dimensions, but {} < {}",
                df, ndims
            ),
            Self::InvScaleNotSquare { nrows, ncols } => write!(
                f,
                "The scale matrix is not square: {} x {}",
                nrows, ncols
            ),
            Self::InvScaleNotPositiveDefinite => {
                write!(f, "The scale matrix is not positive definite")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOL: f64 = 1E-12;

    fn nonstandard_inv_scale() -> DMatrix<f64> {
        let slice = vec![
            1.10576891,
            -0.20160336,
            0.09378834,
            -0.19339029,
            -0.20160336,
            0.66794786,
            -0.46020905,
            -0.62806951,
            0.09378834,
            -0.46020905,
            1.15263284,
            0.98443641,
            -0.19339029,
            -0.62806951,
            0.98443641,
            1.21050189,
        ];
        DMatrix::from_row_slice(4, 4, &slice)
    }

    #[test]
    fn new_should_reject_df_too_low() {
        let inv_scale = DMatrix::identity(4, 4);
        assert!(InvWishart::new(inv_scale.clone(), 4).is_ok());
        assert!(InvWishart::new(inv_scale.clone(), 5).is_ok());
        match InvWishart::new(inv_scale, 3) {
            Err(InvWishartError::DfLessThanDimensions { df: 3, ndims: 4 }) => {}
            res => panic!("wrong result: {:?}", res),
        }
    }

    #[test]
    fn new_should_reject_non_square_scale() {
        let inv_scale = DMatrix::identity(4, 3);
        match InvWishart::new(inv_scale, 5) {
            Err(InvWishartError::InvScaleNotSquare { nrows: 4, ncols: 3 }) => {}
            res => panic!("wrong result: {:?}", res),
        }
    }

    #[test]
    fn new_should_reject_non_positive_definite_scale() {
        let inv_scale = DMatrix::from_row_slice(2, 2, &[1.0, 2.0, 2.0, 1.0]);
        match InvWishart::new(inv_scale, 3) {
            Err(InvWishartError::InvScaleNotPositiveDefinite) => (),
            res => panic!("wrong result: {:?}", res),
        }
    }

    #[test]
    fn ln_f_standard_ident() {
        let iw = InvWishart::identity(4);
        let x = DMatrix::<f64>::identity(4, 4);
        assert::close(iw.ln_f(&x), -11.430949807317218, TOL)
    }

    #[test]
    fn ln_f_standard_mode() {
        let iw = InvWishart::identity(4);
        let x = DMatrix::<f64>::identity(4, 4) / 9.0;
        assert::close(iw.ln_f(&x), 12.11909258473473, TOL)
    }

    #[test]
    fn ln_f_nonstandard_ident() {
        let iw = InvWishart::new(nonstandard_inv_scale(), 5).unwrap();
        let x = DMatrix::<f64>::identity(4, 4);
        assert::close(iw.ln_f(&x), -18.939673925150899, TOL)
    }

    #[test]
    fn ln_f_nonstandard_mode() {
        let x = nonstandard_inv_scale();
        let iw = InvWishart::new(nonstandard_inv_scale(), 5).unwrap();
        assert::close(iw.ln_f(&x), -6.187876016819759, TOL)
    }

    #[test]
    fn draws_should_be_positive_definite() {
        let iw = InvWishart::new(nonstandard_inv_scale(), 5).unwrap();
        let mut rng = rand::thread_rng();
        for x in iw.sample(100, &mut rng) {
            assert!(iw.supports(&x));
        }
    }

    #[test]
    fn mean_requires_df_above_ndims_plus_one() {
        let iw = InvWishart::identity(4);
        assert!(iw.mean().is_none());
        let iw = InvWishart::new(DMatrix::identity(4, 4), 6).unwrap();
        let mean = iw.mean().unwrap();
        assert::close(mean[(0, 0)], 1.0, TOL);
    }

    #[test]
    fn should_impl_debug_clone_and_partialeq() {
        let iw = InvWishart::identity(3);
        assert_eq!(iw, iw.clone());
        let _s = format!("{:?}", iw);
    }
}
