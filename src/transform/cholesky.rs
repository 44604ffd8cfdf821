//! Transforms between a positive-definite matrix and its Cholesky factor
use std::f64::consts::LN_2;

use nalgebra::DMatrix;

use super::{check_cholesky_factor, check_square, MatrixTransform, TransformError};

/// Maps a Cholesky factor to the matrix it factors, L ↦ L·Lᵗ
///
/// The forward direction takes any lower-triangular matrix with a positive
/// diagonal to a symmetric positive-definite matrix; the inverse direction is
/// Cholesky decomposition. The Jacobian is taken with respect to the
/// n(n+1)/2 free entries of each representation.
///
/// # Example
///
/// ```
/// use nalgebra::DMatrix;
/// use matvariate::transform::{CholeskyOuterProduct, MatrixTransform};
///
/// let l = DMatrix::from_row_slice(2, 2, &[2.0, 0.0, -1.0, 3.0]);
/// let m = CholeskyOuterProduct.forward(&l).unwrap();
///
/// let l_again = CholeskyOuterProduct.inverse(&m).unwrap();
/// assert!((l_again - l).abs().max() < 1e-12);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CholeskyOuterProduct;

impl MatrixTransform for CholeskyOuterProduct {
    fn forward(&self, x: &DMatrix<f64>) -> Result<DMatrix<f64>, TransformError> {
        check_cholesky_factor(x)?;
        Ok(x * x.transpose())
    }

    fn inverse(&self, y: &DMatrix<f64>) -> Result<DMatrix<f64>, TransformError> {
        check_square(y)?;
        y.clone()
            .cholesky()
            .map(|chol| chol.unpack())
            .ok_or(TransformError::NotPositiveDefinite)
    }

    // The map from the free entries of L to those of L·Lᵗ has a triangular
    // Jacobian with determinant 2ⁿ·Π Lᵢᵢ^(n-i+1), i counted from 1.
    fn ln_det_jacobian(&self, x: &DMatrix<f64>) -> Result<f64, TransformError> {
        check_cholesky_factor(x)?;
        let n = x.nrows();
        let ldj = (0..n)
            .map(|i| (n - i) as f64 * x[(i, i)].ln())
            .sum::<f64>()
            + n as f64 * LN_2;
        Ok(ldj)
    }

    fn clone_boxed(&self) -> Box<dyn MatrixTransform> {
        Box::new(*self)
    }
}

/// Maps the Cholesky factor of a matrix to the Cholesky factor of its
/// inverse, chol(M) ↦ chol(M⁻¹)
///
/// Computed with triangular solves; neither M nor M⁻¹ in its symmetric form
/// is part of the input or output. The map is an involution: applying it
/// twice returns the original factor, and `inverse` is `forward`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CholeskyInverse;

impl MatrixTransform for CholeskyInverse {
    fn forward(&self, x: &DMatrix<f64>) -> Result<DMatrix<f64>, TransformError> {
        check_cholesky_factor(x)?;
        let n = x.nrows();
        // K = L⁻¹, so M⁻¹ = (L·Lᵗ)⁻¹ = Kᵗ·K
        let k = x
            .solve_lower_triangular(&DMatrix::identity(n, n))
            .ok_or(TransformError::NotCholeskyFactor)?;
        let m_inv = k.transpose() * &k;
        m_inv
            .cholesky()
            .map(|chol| chol.unpack())
            .ok_or(TransformError::NotPositiveDefinite)
    }

    fn inverse(&self, y: &DMatrix<f64>) -> Result<DMatrix<f64>, TransformError> {
        self.forward(y)
    }

    // Composition of the outer-product Jacobian at L, the symmetric-inversion
    // Jacobian -(n+1)·ln det M, and the decomposition Jacobian at M⁻¹. The
    // last term depends on the diagonal of the output factor L′, so one
    // forward application is required.
    fn ln_det_jacobian(&self, x: &DMatrix<f64>) -> Result<f64, TransformError> {
        let y = self.forward(x)?;
        let n = x.nrows();
        let ldj = -(0..n)
            .map(|i| {
                (n + i + 2) as f64 * x[(i, i)].ln()
                    + (n - i) as f64 * y[(i, i)].ln()
            })
            .sum::<f64>();
        Ok(ldj)
    }

    fn clone_boxed(&self) -> Box<dyn MatrixTransform> {
        Box::new(*self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use proptest::prelude::*;

    const TOL: f64 = 1E-8;

    fn spd_3x3() -> DMatrix<f64> {
        DMatrix::from_row_slice(
            3,
            3,
            &[
                1.01742788,
                0.36586652,
                -0.65620486,
                0.36586652,
                1.00564553,
                -0.42597261,
                -0.65620486,
                -0.42597261,
                1.27247972,
            ],
        )
    }

    #[test]
    fn outer_product_then_decomposition_is_identity() {
        let m = spd_3x3();
        let l = CholeskyOuterProduct.inverse(&m).unwrap();
        let m_again = CholeskyOuterProduct.forward(&l).unwrap();
        assert_abs_diff_eq!(m, m_again, epsilon = TOL);
    }

    #[test]
    fn forward_rejects_non_triangular_input() {
        let m = spd_3x3();
        assert_eq!(
            CholeskyOuterProduct.forward(&m),
            Err(TransformError::NotCholeskyFactor)
        );
    }

    #[test]
    fn forward_rejects_non_positive_diagonal() {
        let l = DMatrix::from_row_slice(2, 2, &[1.0, 0.0, 0.5, -2.0]);
        assert_eq!(
            CholeskyOuterProduct.forward(&l),
            Err(TransformError::NotCholeskyFactor)
        );
    }

    #[test]
    fn inverse_rejects_non_positive_definite_input() {
        // eigenvalues 3 and -1
        let m = DMatrix::from_row_slice(2, 2, &[1.0, 2.0, 2.0, 1.0]);
        assert_eq!(
            CholeskyOuterProduct.inverse(&m),
            Err(TransformError::NotPositiveDefinite)
        );
    }

    #[test]
    fn inverse_rejects_non_square_input() {
        let m = DMatrix::zeros(2, 3);
        assert_eq!(
            CholeskyOuterProduct.inverse(&m),
            Err(TransformError::NotSquare { nrows: 2, ncols: 3 })
        );
    }

    #[test]
    fn outer_product_ln_det_jacobian_closed_form() {
        let l =
            DMatrix::from_row_slice(3, 3, &[1.0, 0.0, 0.0, 0.2, 2.0, 0.0, -0.4, 0.1, 3.0]);
        // 3 ln2 + 3 ln(1) + 2 ln(2) + 1 ln(3)
        let expected = 3.0 * LN_2 + 2.0 * 2.0_f64.ln() + 3.0_f64.ln();
        assert::close(
            CholeskyOuterProduct.ln_det_jacobian(&l).unwrap(),
            expected,
            1E-12,
        );
    }

    #[test]
    fn outer_product_jacobian_directions_cancel() {
        let l =
            DMatrix::from_row_slice(2, 2, &[1.5, 0.0, -0.3, 0.8]);
        let m = CholeskyOuterProduct.forward(&l).unwrap();
        let fwd = CholeskyOuterProduct.ln_det_jacobian(&l).unwrap();
        let inv = CholeskyOuterProduct.inv_ln_det_jacobian(&m).unwrap();
        assert::close(fwd + inv, 0.0, 1E-10);
    }

    #[test]
    fn cholesky_inverse_is_involution() {
        let l = CholeskyOuterProduct.inverse(&spd_3x3()).unwrap();
        let l_inv = CholeskyInverse.forward(&l).unwrap();
        let l_again = CholeskyInverse.forward(&l_inv).unwrap();
        assert_abs_diff_eq!(l, l_again, epsilon = TOL);
    }

    #[test]
    fn cholesky_inverse_factors_the_matrix_inverse() {
        let m = spd_3x3();
        let l = CholeskyOuterProduct.inverse(&m).unwrap();
        let l_inv = CholeskyInverse.forward(&l).unwrap();
        let m_inv = &l_inv * l_inv.transpose();
        assert_abs_diff_eq!(
            m_inv,
            m.clone().try_inverse().unwrap(),
            epsilon = TOL
        );
    }

    #[test]
    fn cholesky_inverse_jacobian_is_antisymmetric() {
        // An involution's Jacobians at L and at its image must cancel
        let l = CholeskyOuterProduct.inverse(&spd_3x3()).unwrap();
        let l_inv = CholeskyInverse.forward(&l).unwrap();
        let at_l = CholeskyInverse.ln_det_jacobian(&l).unwrap();
        let at_l_inv = CholeskyInverse.ln_det_jacobian(&l_inv).unwrap();
        assert::close(at_l + at_l_inv, 0.0, 1E-10);
    }

    #[test]
    fn cholesky_inverse_jacobian_two_by_two_closed_form() {
        // For L = [[a, 0], [b, c]] the stage composition gives
        // -2 ln a - 3 ln c - ln(b² + c²)/2
        let (a, b, c): (f64, f64, f64) = (1.2, -0.7, 0.9);
        let l = DMatrix::from_row_slice(2, 2, &[a, 0.0, b, c]);
        let expected = -2.0 * a.ln() - 3.0 * c.ln()
            - 0.5 * (b * b + c * c).ln();
        assert::close(
            CholeskyInverse.ln_det_jacobian(&l).unwrap(),
            expected,
            1E-10,
        );
    }

    proptest! {
        #[test]
        fn round_trip_recovers_the_factor(
            d0 in 0.5f64..2.0,
            d1 in 0.5f64..2.0,
            d2 in 0.5f64..2.0,
            o0 in -1.0f64..1.0,
            o1 in -1.0f64..1.0,
            o2 in -1.0f64..1.0,
        ) {
            let l = DMatrix::from_row_slice(
                3,
                3,
                &[d0, 0.0, 0.0, o0, d1, 0.0, o1, o2, d2],
            );
            let m = CholeskyOuterProduct.forward(&l).unwrap();
            let l_again = CholeskyOuterProduct.inverse(&m).unwrap();
            prop_assert!((l_again - l).abs().max() < TOL);
        }
    }
}
