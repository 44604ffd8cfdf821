//! Invertible transforms between matrix representations
//!
//! A [`MatrixTransform`] is a deterministic, invertible, differentiable map
//! between spaces of square matrices. Re-expressing a distribution over one
//! space as a distribution over the other requires the transform's
//! log-determinant-of-Jacobian, which every implementation reports for both
//! directions; see [`MatrixTransformed`](crate::dist::MatrixTransformed) for
//! the change-of-variables wiring.
//!
//! The transforms here manipulate symmetric positive-definite matrices
//! through their Cholesky factors: [`CholeskyOuterProduct`] rebuilds a matrix
//! from its factor, [`CholeskyInverse`] maps the factor of a matrix to the
//! factor of its inverse, [`Inverted`] swaps a transform's two directions, and
//! [`Chain`] composes an ordered sequence of transforms into one.
mod chain;
mod cholesky;

pub use chain::{Chain, Inverted};
pub use cholesky::{CholeskyInverse, CholeskyOuterProduct};

use nalgebra::DMatrix;
#[cfg(feature = "serde1")]
use serde::{Deserialize, Serialize};
use std::fmt;

/// Domain errors raised by matrix transforms
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde1", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde1", serde(rename_all = "snake_case"))]
pub enum TransformError {
    /// The input matrix is not square
    NotSquare {
        /// number of rows
        nrows: usize,
        /// number of columns
        ncols: usize,
    },
    /// The input matrix is not positive definite (Cholesky decomposition hit
    /// a non-positive pivot)
    NotPositiveDefinite,
    /// The input matrix is not lower triangular with a positive diagonal
    NotCholeskyFactor,
}

impl std::error::Error for TransformError {}

impl fmt::Display for TransformError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotSquare { nrows, ncols } => {
                write!(f, "matrix is not square: {} x {}", nrows, ncols)
            }
            Self::NotPositiveDefinite => {
                write!(f, "matrix is not positive definite")
            }
            Self::NotCholeskyFactor => {
                write!(
                    f,
                    "matrix is not lower triangular with a positive diagonal"
                )
            }
        }
    }
}

/// A deterministic, invertible, differentiable map between matrix spaces
///
/// The forward and inverse maps must be exact inverses of one another, and
/// `inv_ln_det_jacobian(y)` must equal `-ln_det_jacobian(inverse(y))`; the
/// provided default makes that identity the single source of truth. Inputs
/// outside a map's domain surface as a [`TransformError`] and are never
/// masked.
pub trait MatrixTransform: fmt::Debug {
    /// Apply the forward map to `x`
    fn forward(&self, x: &DMatrix<f64>) -> Result<DMatrix<f64>, TransformError>;

    /// Apply the inverse map to `y`
    fn inverse(&self, y: &DMatrix<f64>) -> Result<DMatrix<f64>, TransformError>;

    /// ln |det J| of the forward map, evaluated at the forward input `x`
    fn ln_det_jacobian(&self, x: &DMatrix<f64>) -> Result<f64, TransformError>;

    /// ln |det J| of the inverse map, evaluated at the forward output `y`
    fn inv_ln_det_jacobian(
        &self,
        y: &DMatrix<f64>,
    ) -> Result<f64, TransformError> {
        let x = self.inverse(y)?;
        self.ln_det_jacobian(&x).map(|ldj| -ldj)
    }

    /// Clone into a boxed trait object, for storage in a [`Chain`]
    fn clone_boxed(&self) -> Box<dyn MatrixTransform>;
}

impl Clone for Box<dyn MatrixTransform> {
    fn clone(&self) -> Self {
        self.clone_boxed()
    }
}

/// Errors if `m` is not square
pub(crate) fn check_square(m: &DMatrix<f64>) -> Result<(), TransformError> {
    if m.is_square() {
        Ok(())
    } else {
        Err(TransformError::NotSquare {
            nrows: m.nrows(),
            ncols: m.ncols(),
        })
    }
}

/// Errors unless `m` is lower triangular with a strictly positive diagonal
pub(crate) fn check_cholesky_factor(
    m: &DMatrix<f64>,
) -> Result<(), TransformError> {
    check_square(m)?;
    let n = m.nrows();
    for i in 0..n {
        if m[(i, i)] <= 0.0 {
            return Err(TransformError::NotCholeskyFactor);
        }
        for j in (i + 1)..n {
            if m[(i, j)] != 0.0 {
                return Err(TransformError::NotCholeskyFactor);
            }
        }
    }
    Ok(())
}
