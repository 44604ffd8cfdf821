//! Traits for sampling from and evaluating probability distributions
use rand::Rng;

/// A distribution that can be sampled from
pub trait Sampleable<X> {
    /// Single draw
    fn draw<R: Rng>(&self, rng: &mut R) -> X;

    /// Multiple draws, advancing the one supplied generator
    fn sample<R: Rng>(&self, n: usize, mut rng: &mut R) -> Vec<X> {
        (0..n).map(|_| self.draw(&mut rng)).collect()
    }
}

/// A distribution with a density (or mass) function
pub trait HasDensity<X> {
    /// Probability function
    fn f(&self, x: &X) -> f64 {
        self.ln_f(x).exp()
    }

    /// Log probability function
    fn ln_f(&self, x: &X) -> f64;
}

/// Random variable: a distribution that can be both sampled and evaluated
pub trait Rv<X>: Sampleable<X> + HasDensity<X> {}

impl<X, T> Rv<X> for T where T: Sampleable<X> + HasDensity<X> {}

/// Identifies the support of a distribution
pub trait Support<X> {
    /// Returns `true` if `x` is in the support
    fn supports(&self, x: &X) -> bool;
}

/// Continuous probability distributions
pub trait ContinuousDistr<X>: Rv<X> + Support<X> {
    /// The value of the Probability Density Function (PDF) at `x`
    fn pdf(&self, x: &X) -> f64 {
        self.ln_pdf(x).exp()
    }

    /// The value of the log Probability Density Function (PDF) at `x`
    fn ln_pdf(&self, x: &X) -> f64 {
        self.ln_f(x)
    }
}

pub trait Mean<X> {
    fn mean(&self) -> Option<X>;
}

pub trait Mode<X> {
    fn mode(&self) -> Option<X>;
}

pub trait Variance<X> {
    fn variance(&self) -> Option<X>;
}

/// Exposes the true constructor arguments of a distribution so it can be
/// inspected and rebuilt even when its internal representation holds derived
/// state (caches, transform chains) that is not itself a parameter.
pub trait Parameterized {
    type Parameters;

    /// Emit the constructor parameters
    fn emit_params(&self) -> Self::Parameters;

    /// Build from constructor parameters
    fn from_params(params: Self::Parameters) -> Self;
}
