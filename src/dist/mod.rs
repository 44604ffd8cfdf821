//! Probability distributions
mod invwishart;
mod mvg;
mod niw;
mod transformed;
mod wishart;

pub use invwishart::{InvWishart, InvWishartError};
pub use mvg::{MvGaussian, MvGaussianError};
pub use niw::{
    NormalInvWishart, NormalInvWishartError, NormalInvWishartParameters,
};
pub use transformed::MatrixTransformed;
pub use wishart::{Wishart, WishartError};
