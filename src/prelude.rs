//! Re-imports for convenience
#[doc(no_inline)]
pub use crate::dist::{
    InvWishart, MatrixTransformed, MvGaussian, NormalInvWishart, Wishart,
};
#[doc(no_inline)]
pub use crate::traits::*;
#[doc(no_inline)]
pub use crate::transform::{
    Chain, CholeskyInverse, CholeskyOuterProduct, Inverted, MatrixTransform,
    TransformError,
};
