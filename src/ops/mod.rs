//! Arithmetic and aggregation operators plus the PrintVars sink

pub mod aggregate;
pub mod arithmetic;
pub mod copy;
pub mod print_vars;

pub use aggregate::{Mean, Normalize, WeightedMean, WeightedSum};
pub use arithmetic::{ADividedByB, AMinusB, Maximum, Minimum, Multiply, Sum};
pub use copy::Copy;
pub use print_vars::PrintVars;
