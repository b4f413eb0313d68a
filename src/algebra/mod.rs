//! Numeric traits and the slice and dense block kernels used by the
//! storage engines.

mod floats;
pub use floats::*;
mod vecmath;
pub use vecmath::*;

pub(crate) mod dense;
pub(crate) use dense::*;
