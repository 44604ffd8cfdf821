//! A matrix distribution pushed through a chain of invertible transforms
use nalgebra::DMatrix;
use rand::Rng;

use crate::traits::{ContinuousDistr, HasDensity, Sampleable, Support};
use crate::transform::{Chain, MatrixTransform, TransformError};

/// Distribution of Y = T(X) for a base distribution over X and an invertible
/// transform T
///
/// Draws push a base sample through the chain's forward map. The density
/// pulls an observation back through the inverse map and adds the
/// inverse-direction log-determinant-of-Jacobian:
///
/// > ln p<sub>Y</sub>(y) = ln p<sub>X</sub>(T⁻¹(y)) + ln |det J<sub>T⁻¹</sub>(y)|
///
/// # Example
///
/// Push a Wishart through the inversion chain to get an inverse-Wishart:
///
/// ```
/// use nalgebra::DMatrix;
/// use matvariate::prelude::*;
/// use matvariate::transform::Chain;
///
/// let covariance =
///     MatrixTransformed::new(Wishart::identity(3), Chain::spd_inversion());
///
/// let mut rng = rand::thread_rng();
/// let sigma: DMatrix<f64> = covariance.draw(&mut rng);
///
/// assert!(covariance.supports(&sigma));
/// assert!(covariance.ln_f(&sigma).is_finite());
/// ```
#[derive(Debug, Clone)]
pub struct MatrixTransformed<D> {
    parent: D,
    transform: Chain,
}

impl<D> MatrixTransformed<D> {
    /// Creates a new distribution over the transformed variable
    pub fn new(parent: D, transform: Chain) -> Self {
        MatrixTransformed { parent, transform }
    }

    /// Return a reference to the base distribution
    pub fn parent(&self) -> &D {
        &self.parent
    }

    /// Return a reference to the transform chain
    pub fn transform(&self) -> &Chain {
        &self.transform
    }
}

impl<D> MatrixTransformed<D>
where
    D: HasDensity<DMatrix<f64>>,
{
    /// Log density of the transformed variable, surfacing domain errors
    ///
    /// The plain [`HasDensity::ln_f`] maps a value outside the image of the
    /// transform to a log density of -∞; this variant reports why the
    /// pull-back failed instead.
    pub fn try_ln_f(&self, y: &DMatrix<f64>) -> Result<f64, TransformError> {
        let x = self.transform.inverse(y)?;
        let ldj = self.transform.inv_ln_det_jacobian(y)?;
        Ok(self.parent.ln_f(&x) + ldj)
    }
}

impl<D> Sampleable<DMatrix<f64>> for MatrixTransformed<D>
where
    D: Sampleable<DMatrix<f64>>,
{
    fn draw<R: Rng>(&self, rng: &mut R) -> DMatrix<f64> {
        let x = self.parent.draw(rng);
        self.transform
            .forward(&x)
            .expect("base distribution drew outside the transform domain")
    }
}

impl<D> HasDensity<DMatrix<f64>> for MatrixTransformed<D>
where
    D: HasDensity<DMatrix<f64>>,
{
    fn ln_f(&self, y: &DMatrix<f64>) -> f64 {
        self.try_ln_f(y).unwrap_or(f64::NEG_INFINITY)
    }
}

impl<D> Support<DMatrix<f64>> for MatrixTransformed<D>
where
    D: Support<DMatrix<f64>>,
{
    fn supports(&self, y: &DMatrix<f64>) -> bool {
        self.transform
            .inverse(y)
            .map(|x| self.parent.supports(&x))
            .unwrap_or(false)
    }
}

impl<D> ContinuousDistr<DMatrix<f64>> for MatrixTransformed<D> where
    D: ContinuousDistr<DMatrix<f64>>
{
}
