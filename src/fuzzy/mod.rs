//! Fuzzy logic library
//!
//! Conversions into and out of fuzzy space (`convert`) and the fuzzy set
//! operators (`set_ops`). Every operator producing a `Fuzzy` layer clamps its
//! unmasked cells into the context's fuzzy range before publishing.

pub mod convert;
pub mod set_ops;

pub use convert::{
    CvtFromFuzzy, CvtToBinary, CvtToFuzzy, CvtToFuzzyCat, CvtToFuzzyCurve, CvtToFuzzyCurveZScore,
    CvtToFuzzyZScore,
};
pub use set_ops::{
    FuzzyAnd, FuzzyNot, FuzzyOr, FuzzySelectedUnion, FuzzyUnion, FuzzyWeightedUnion, FuzzyXOr,
};

use crate::command::Command;
use crate::config::FuzzyRange;
use crate::context::ExecutedNode;
use crate::error::NodeError;
use crate::grid::Grid;
use crate::types::DataType;

/// Which end of the input range counts as true
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    LowToHigh,
    HighToLow,
}

impl Direction {
    /// Parse the `arg` argument of `command`; anything but the two spellings
    /// fails with `InvalidDirection`
    pub fn from_arg(command: &Command, arg: &str) -> Result<Self, NodeError> {
        let value = command.require(arg)?;
        match value.as_str() {
            Some("LowToHigh") => Ok(Direction::LowToHigh),
            Some("HighToLow") => Ok(Direction::HighToLow),
            _ => Err(command.invalid_direction(arg, &value.to_string())),
        }
    }
}

/// Line through (x1, y1) and (x2, y2), applied to every cell
pub(crate) fn linear_map(grid: &Grid, x1: f64, y1: f64, x2: f64, y2: f64) -> Grid {
    let slope = (y2 - y1) / (x2 - x1);
    grid.map(|x| (x - x1) * slope + y1)
}

/// Clamp into the fuzzy range and wrap as a `Fuzzy` data layer
pub(crate) fn fuzzy_layer(result_name: &str, mut grid: Grid, range: FuzzyRange) -> ExecutedNode {
    grid.clamp_unmasked(range.min, range.max);
    ExecutedNode::layer(result_name, grid, DataType::Fuzzy)
}
