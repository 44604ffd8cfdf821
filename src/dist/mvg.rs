//! Multivariate Gaussian/Normal distribution over x in ℝᵖ
#[cfg(feature = "serde1")]
use serde::{Deserialize, Serialize};

use nalgebra::{DMatrix, DVector};
use rand::Rng;
use rand_distr::StandardNormal;
use std::fmt;
use std::sync::OnceLock;

use crate::consts::HALF_LN_2PI;
use crate::impl_display;
use crate::traits::{
    ContinuousDistr, HasDensity, Mean, Mode, Sampleable, Support, Variance,
};

/// [Multivariate Gaussian/Normal distribution](https://en.wikipedia.org/wiki/Multivariate_normal_distribution),
/// 𝒩(μ, Σ) over column vectors.
///
/// # Example
///
/// ```
/// use nalgebra::{DMatrix, DVector};
/// use matvariate::prelude::*;
///
/// let mu = DVector::zeros(3);
/// let cov = DMatrix::identity(3, 3);
/// let mvg = MvGaussian::new(mu, cov).unwrap();
///
/// let mut rng = rand::thread_rng();
/// let x: DVector<f64> = mvg.draw(&mut rng);
/// assert_eq!(x.len(), 3);
/// ```
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde1", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde1", serde(rename_all = "snake_case"))]
pub struct MvGaussian {
    /// Mean vector, μ
    mu: DVector<f64>,
    /// Covariance matrix, Σ
    cov: DMatrix<f64>,
    /// Cached lower Cholesky factor of Σ
    #[cfg_attr(feature = "serde1", serde(skip))]
    cov_chol: OnceLock<DMatrix<f64>>,
}

impl PartialEq for MvGaussian {
    fn eq(&self, other: &MvGaussian) -> bool {
        self.mu == other.mu && self.cov == other.cov
    }
}

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde1", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde1", serde(rename_all = "snake_case"))]
pub enum MvGaussianError {
    /// The mu and cov parameters have incompatible dimensions
    MuCovDimensionMismatch {
        /// Number of dimensions in the mean vector
        n_mu: usize,
        /// Number of dimensions of the covariance matrix
        n_cov: usize,
    },
    /// The cov matrix is not square
    CovNotSquare {
        /// number of rows
        nrows: usize,
        /// number of columns
        ncols: usize,
    },
    /// The cov matrix is not positive definite
    CovNotPositiveDefinite,
    /// Requested dimension is too low
    ZeroDimension,
}

impl MvGaussian {
    /// Create a new multivariate Gaussian distribution
    ///
    /// # Arguments
    /// - mu: k-length mean vector
    /// - cov: k-by-k positive-definite covariance matrix
    pub fn new(
        mu: DVector<f64>,
        cov: DMatrix<f64>,
    ) -> Result<Self, MvGaussianError> {
        if !cov.is_square() {
            Err(MvGaussianError::CovNotSquare {
                nrows: cov.nrows(),
                ncols: cov.ncols(),
            })
        } else if mu.len() != cov.nrows() {
            Err(MvGaussianError::MuCovDimensionMismatch {
                n_mu: mu.len(),
                n_cov: cov.nrows(),
            })
        } else {
            match cov.clone().cholesky() {
                Some(chol) => {
                    let cov_chol = OnceLock::new();
                    cov_chol.set(chol.unpack()).ok();
                    Ok(MvGaussian { mu, cov, cov_chol })
                }
                None => Err(MvGaussianError::CovNotPositiveDefinite),
            }
        }
    }

    /// Creates a new MvGaussian without checking whether the parameters are
    /// valid.
    #[inline]
    pub fn new_unchecked(mu: DVector<f64>, cov: DMatrix<f64>) -> Self {
        MvGaussian {
            mu,
            cov,
            cov_chol: OnceLock::new(),
        }
    }

    /// Creates a standard Gaussian distribution with zero mean and identity
    /// covariance matrix.
    pub fn standard(dims: usize) -> Result<Self, MvGaussianError> {
        if dims == 0 {
            Err(MvGaussianError::ZeroDimension)
        } else {
            let mu = DVector::zeros(dims);
            let cov = DMatrix::identity(dims, dims);
            let cov_chol = OnceLock::new();
            cov_chol.set(DMatrix::identity(dims, dims)).ok();
            Ok(MvGaussian { mu, cov, cov_chol })
        }
    }

    /// Get the number of dimensions
    #[inline]
    pub fn ndims(&self) -> usize {
        self.mu.len()
    }

    /// Get a reference to the mean vector
    #[inline]
    pub fn mu(&self) -> &DVector<f64> {
        &self.mu
    }

    /// Get a reference to the covariance matrix
    #[inline]
    pub fn cov(&self) -> &DMatrix<f64> {
        &self.cov
    }

    fn cov_chol(&self) -> &DMatrix<f64> {
        self.cov_chol.get_or_init(|| {
            self.cov
                .clone()
                .cholesky()
                .expect("covariance matrix is not positive definite")
                .unpack()
        })
    }
}

impl From<&MvGaussian> for String {
    fn from(mvg: &MvGaussian) -> String {
        format!("Nₖ({})\n μ: {}\n Σ: {}", mvg.ndims(), mvg.mu, mvg.cov)
    }
}

impl_display!(MvGaussian);

impl HasDensity<DVector<f64>> for MvGaussian {
    fn ln_f(&self, x: &DVector<f64>) -> f64 {
        let diff = x - &self.mu;
        let chol = self.cov_chol();
        let half_ln_det: f64 = chol.diagonal().iter().map(|&v| v.ln()).sum();
        let z = chol
            .solve_lower_triangular(&diff)
            .expect("Cholesky factor has a positive diagonal");
        -(self.ndims() as f64) * HALF_LN_2PI
            - half_ln_det
            - 0.5 * z.norm_squared()
    }
}

impl Sampleable<DVector<f64>> for MvGaussian {
    fn draw<R: Rng>(&self, rng: &mut R) -> DVector<f64> {
        let z = DVector::from_fn(self.ndims(), |_, _| {
            rng.sample::<f64, _>(StandardNormal)
        });
        &self.mu + self.cov_chol() * z
    }
}

impl Support<DVector<f64>> for MvGaussian {
    fn supports(&self, x: &DVector<f64>) -> bool {
        x.len() == self.mu.len() && x.iter().all(|v| v.is_finite())
    }
}

impl ContinuousDistr<DVector<f64>> for MvGaussian {}

impl Mean<DVector<f64>> for MvGaussian {
    fn mean(&self) -> Option<DVector<f64>> {
        Some(self.mu.clone())
    }
}

impl Mode<DVector<f64>> for MvGaussian {
    fn mode(&self) -> Option<DVector<f64>> {
        Some(self.mu.clone())
    }
}

impl Variance<DMatrix<f64>> for MvGaussian {
    fn variance(&self) -> Option<DMatrix<f64>> {
        Some(self.cov.clone())
    }
}

impl std::error::Error for MvGaussianError {}

impl fmt::Display for MvGaussianError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MuCovDimensionMismatch { n_mu, n_cov } => write!(
                f,
                "The mu vector (nrows = {}) must have the same number of \
                 entries as the cov matrix has columns/rows (ndims = {})",
                n_mu, n_cov
            ),
            Self::CovNotSquare { nrows, ncols } => {
                write!(f, "The cov matrix is not square: {} x {}", nrows, ncols)
            }
            Self::CovNotPositiveDefinite => {
                write!(f, "The cov matrix is not positive definite")
            }
            Self::ZeroDimension => write!(f, "ndims must be >= 1"),
        }
    }
}
