//! A common conjugate prior on the mean and covariance of a multivariate
//! Gaussian
//!
//! For a reference see section 9 of [Kevin Murphy's
//! whitepaper](https://www.cs.ubc.ca/~murphyk/Papers/bayesGauss.pdf).
#[cfg(feature = "serde1")]
use serde::{Deserialize, Serialize};

use nalgebra::{DMatrix, DVector};
use rand::Rng;
use std::fmt;

use crate::dist::{MatrixTransformed, MvGaussian, Wishart};
use crate::impl_display;
use crate::traits::{
    ContinuousDistr, HasDensity, Parameterized, Sampleable, Support,
};
use crate::transform::{Chain, CholeskyInverse, MatrixTransform};

/// Common conjugate prior on the μ and Σ parameters in the Multivariate
/// Gaussian, Ν(μ, Σ)
///
/// Ν(μ, Σ) ~ NIW(μ<sub>0</sub>, κ<sub>0</sub>, ν, Ψ) implies
/// μ ~ N(μ<sub>0</sub>, Σ/κ<sub>0</sub>) and
/// Σ ~ W<sup>-1</sup>(Ψ, ν)
///
/// The Σ arm is not a hard-coded inverse-Wishart: it is a [`Wishart`] over
/// the precision, parameterized by chol(Ψ⁻¹), pushed through the
/// [`Chain::spd_inversion`] transform chain. The chain contributes the
/// change-of-variables Jacobian, so the density follows from the base
/// Wishart density plus bookkeeping; the closed-form
/// [`InvWishart`](crate::dist::InvWishart) density is kept as an independent
/// reference and the two must agree.
///
/// # Example
///
/// Draw a Multivariate Gaussian from NIW
///
/// ```
/// use nalgebra::{DMatrix, DVector};
/// use matvariate::prelude::*;
///
/// let mu = DVector::zeros(3);
/// let k = 1.0;
/// let df = 3;
/// let scale = DMatrix::identity(3, 3);
///
/// let niw = NormalInvWishart::new(mu, k, df, scale).unwrap();
///
/// let mut rng = rand::thread_rng();
///
/// let mvg: MvGaussian = niw.draw(&mut rng);
/// ```
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde1", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde1", serde(rename_all = "snake_case"))]
#[cfg_attr(feature = "serde1", serde(try_from = "NormalInvWishartParameters"))]
#[cfg_attr(feature = "serde1", serde(into = "NormalInvWishartParameters"))]
pub struct NormalInvWishart {
    /// The mean of μ, μ<sub>0</sub>
    mu: DVector<f64>,
    /// A scale factor on Σ, κ<sub>0</sub>
    k: f64,
    /// The degrees of freedom, ν >= |μ|
    df: usize,
    /// The positive-definite scale matrix, Ψ
    scale: DMatrix<f64>,
    /// Derived distribution of Σ: a Wishart over the precision pushed through
    /// the inversion chain. Rebuilt from the hyperparameters, never emitted.
    sigma_dist: MatrixTransformed<Wishart>,
}

impl PartialEq for NormalInvWishart {
    fn eq(&self, other: &NormalInvWishart) -> bool {
        self.mu == other.mu
            && self.k == other.k
            && self.df == other.df
            && self.scale == other.scale
    }
}

/// The constructor arguments of a [`NormalInvWishart`]
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde1", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde1", serde(rename_all = "snake_case"))]
pub struct NormalInvWishartParameters {
    pub mu: DVector<f64>,
    pub k: f64,
    pub df: usize,
    pub scale: DMatrix<f64>,
}

impl Parameterized for NormalInvWishart {
    type Parameters = NormalInvWishartParameters;

    fn emit_params(&self) -> Self::Parameters {
        Self::Parameters {
            mu: self.mu.clone(),
            k: self.k,
            df: self.df,
            scale: self.scale.clone(),
        }
    }

    fn from_params(params: Self::Parameters) -> Self {
        Self::new_unchecked(params.mu, params.k, params.df, params.scale)
    }
}

impl TryFrom<NormalInvWishartParameters> for NormalInvWishart {
    type Error = NormalInvWishartError;

    fn try_from(
        params: NormalInvWishartParameters,
    ) -> Result<Self, Self::Error> {
        NormalInvWishart::new(params.mu, params.k, params.df, params.scale)
    }
}

impl From<NormalInvWishart> for NormalInvWishartParameters {
    fn from(niw: NormalInvWishart) -> Self {
        niw.emit_params()
    }
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde1", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde1", serde(rename_all = "snake_case"))]
pub enum NormalInvWishartError {
    /// The k parameter is less than or equal to zero
    KTooLow { k: f64 },
    /// The df parameter is less than the number of dimensions
    DfLessThanDimensions { df: usize, ndims: usize },
    /// The scale matrix is not square
    ScaleMatrixNotSquare {
        /// number of rows
        nrows: usize,
        /// number of columns
        ncols: usize,
    },
    /// The dimensions of the mu vector and the scale matrix do not align
    MuScaleDimensionMismatch {
        /// Number of dimensions in the mean vector
        n_mu: usize,
        /// Number of dimensions in the scale matrix
        n_scale: usize,
    },
    /// The scale matrix is not positive definite
    ScaleMatrixNotPositiveDefinite,
}

fn validate_params(
    mu: &DVector<f64>,
    k: f64,
    df: usize,
    scale: &DMatrix<f64>,
) -> Result<(), NormalInvWishartError> {
    let ndims = mu.len();
    if k <= 0.0 {
        Err(NormalInvWishartError::KTooLow { k })
    } else if df < ndims {
        Err(NormalInvWishartError::DfLessThanDimensions { df, ndims })
    } else if !scale.is_square() {
        Err(NormalInvWishartError::ScaleMatrixNotSquare {
            nrows: scale.nrows(),
            ncols: scale.ncols(),
        })
    } else if ndims != scale.nrows() {
        Err(NormalInvWishartError::MuScaleDimensionMismatch {
            n_mu: ndims,
            n_scale: scale.nrows(),
        })
    } else {
        Ok(())
    }
}

// Σ ~ W(ν, chol(Ψ⁻¹)) on the precision, pushed through the inversion chain.
// chol(Ψ⁻¹) is exactly what CholeskyInverse computes from chol(Ψ).
fn sigma_dist(
    df: usize,
    scale_chol: &DMatrix<f64>,
) -> MatrixTransformed<Wishart> {
    let inv_scale_chol = CholeskyInverse
        .forward(scale_chol)
        .expect("chol(Ψ) is a Cholesky factor");
    MatrixTransformed::new(
        Wishart::new_unchecked(df, inv_scale_chol),
        Chain::spd_inversion(),
    )
}

impl NormalInvWishart {
    /// Create a new `NormalInvWishart` distribution
    ///
    /// # Arguments
    /// - mu: The mean of μ, μ<sub>0</sub>
    /// - k: A scale factor on Σ, κ<sub>0</sub>
    /// - df: The degrees of freedom, ν >= |μ|
    /// - scale: The positive-definite scale matrix, Ψ
    pub fn new(
        mu: DVector<f64>,
        k: f64,
        df: usize,
        scale: DMatrix<f64>,
    ) -> Result<Self, NormalInvWishartError> {
        validate_params(&mu, k, df, &scale)?;
        let scale_chol = scale
            .clone()
            .cholesky()
            .map(|chol| chol.unpack())
            .ok_or(NormalInvWishartError::ScaleMatrixNotPositiveDefinite)?;
        let sigma_dist = sigma_dist(df, &scale_chol);
        Ok(NormalInvWishart {
            mu,
            k,
            df,
            scale,
            sigma_dist,
        })
    }

    /// Creates a new NormalInvWishart without checking whether the parameters
    /// are valid.
    pub fn new_unchecked(
        mu: DVector<f64>,
        k: f64,
        df: usize,
        scale: DMatrix<f64>,
    ) -> Self {
        let scale_chol = scale
            .clone()
            .cholesky()
            .expect("scale matrix is not positive definite")
            .unpack();
        let sigma_dist = sigma_dist(df, &scale_chol);
        NormalInvWishart {
            mu,
            k,
            df,
            scale,
            sigma_dist,
        }
    }

    /// Get the number of dimensions
    #[inline]
    pub fn ndims(&self) -> usize {
        self.mu.len()
    }

    /// Get a reference to the mu vector
    #[inline]
    pub fn mu(&self) -> &DVector<f64> {
        &self.mu
    }

    /// Get the k parameter
    #[inline]
    pub fn k(&self) -> f64 {
        self.k
    }

    /// Get the degrees of freedom, df
    #[inline]
    pub fn df(&self) -> usize {
        self.df
    }

    /// Get a reference to the scale matrix
    #[inline]
    pub fn scale(&self) -> &DMatrix<f64> {
        &self.scale
    }

    /// The marginal distribution of Σ: the transformed Wishart
    #[inline]
    pub fn sigma_dist(&self) -> &MatrixTransformed<Wishart> {
        &self.sigma_dist
    }

    // The distribution of μ given a realized Σ, N(μ₀, Σ/κ₀). The realized
    // value is passed in explicitly; nothing is captured.
    fn mu_given_sigma(&self, sigma: &DMatrix<f64>) -> MvGaussian {
        MvGaussian::new_unchecked(self.mu.clone(), sigma.clone() / self.k)
    }
}

impl From<&NormalInvWishart> for String {
    fn from(niw: &NormalInvWishart) -> String {
        format!(
            "NIW (\n μ: {}\n κ: {}\n ν: {}\n Ψ: {}",
            niw.mu, niw.k, niw.df, niw.scale
        )
    }
}

impl_display!(NormalInvWishart);

impl HasDensity<MvGaussian> for NormalInvWishart {
    // ln p(Σ) + ln p(μ | Σ): the chain rule in ancestral order
    fn ln_f(&self, x: &MvGaussian) -> f64 {
        match self.sigma_dist.try_ln_f(x.cov()) {
            Ok(ln_f_sigma) => {
                ln_f_sigma + self.mu_given_sigma(x.cov()).ln_f(x.mu())
            }
            Err(_) => f64::NEG_INFINITY,
        }
    }
}

impl Sampleable<MvGaussian> for NormalInvWishart {
    fn draw<R: Rng>(&self, mut rng: &mut R) -> MvGaussian {
        // Σ must be fully realized before the distribution of μ exists
        let sigma = self.sigma_dist.draw(&mut rng);
        let mu = self.mu_given_sigma(&sigma).draw(&mut rng);
        MvGaussian::new_unchecked(mu, sigma)
    }
}

impl Support<MvGaussian> for NormalInvWishart {
    fn supports(&self, x: &MvGaussian) -> bool {
        let p = self.ndims();
        x.mu().len() == p && x.cov().clone().cholesky().is_some()
    }
}

impl ContinuousDistr<MvGaussian> for NormalInvWishart {}

impl std::error::Error for NormalInvWishartError {}

impl fmt::Display for NormalInvWishartError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::KTooLow { k } => {
                write!(f, "k ({}) must be greater than zero", k)
            }
            Self::DfLessThanDimensions { df, ndims } => write!(
                f,
                "df, the degrees of freedom must be greater than or \
                    equal to the number of dimensions, but {} < {}",
                df, ndims
            ),
            Self::ScaleMatrixNotSquare { nrows, ncols } => write!(
                f,
                "The scale matrix is not square: {} x {}",
                nrows, ncols
            ),
            Self::MuScaleDimensionMismatch { n_mu, n_scale } => write!(
                f,
                "The mu vector (nrows = {}) must have the same \
                    number of entries as the scale matrix has columns/rows \
                    (ndims = {}). ",
                n_mu, n_scale
            ),
            Self::ScaleMatrixNotPositiveDefinite => {
                write!(f, "The scale matrix is not positive definite")
            }
        }
    }
}
