//! Semantic type tags and propagation rules
//!
//! Every executed node carries one `DataType`. "Positive" variants satisfy any
//! check that asks for their base type, and positivity of a derived numeric
//! result is decided from the data: strictly positive minimum over unmasked
//! cells.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::grid::Grid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DataType {
    Integer,
    #[serde(rename = "Positive Integer")]
    PositiveInteger,
    Float,
    #[serde(rename = "Positive Float")]
    PositiveFloat,
    Fuzzy,
    Bool,
    Any,
}

/// Integer family: accepted wherever an integer input is required
pub const INTEGERS: &[DataType] = &[DataType::Integer, DataType::PositiveInteger];

/// Integer or float family: the arithmetic operators' input set
pub const NUMERIC: &[DataType] = &[
    DataType::Integer,
    DataType::PositiveInteger,
    DataType::Float,
    DataType::PositiveFloat,
];

/// Numeric or fuzzy: inputs accepted by the fuzzification operators
pub const NUMERIC_OR_FUZZY: &[DataType] = &[
    DataType::Integer,
    DataType::PositiveInteger,
    DataType::Float,
    DataType::PositiveFloat,
    DataType::Fuzzy,
];

pub const FUZZY: &[DataType] = &[DataType::Fuzzy];

impl DataType {
    /// Display name as used in operator signatures
    pub fn name(&self) -> &'static str {
        match self {
            DataType::Integer => "Integer",
            DataType::PositiveInteger => "Positive Integer",
            DataType::Float => "Float",
            DataType::PositiveFloat => "Positive Float",
            DataType::Fuzzy => "Fuzzy",
            DataType::Bool => "Bool",
            DataType::Any => "Any",
        }
    }

    pub fn is_float(&self) -> bool {
        matches!(self, DataType::Float | DataType::PositiveFloat)
    }

    pub fn is_integer(&self) -> bool {
        matches!(self, DataType::Integer | DataType::PositiveInteger)
    }

    /// True if this type is acceptable where any of `allowed` is required
    ///
    /// `Any` in the allowed set accepts everything; a positive variant
    /// satisfies its base type.
    pub fn satisfies(&self, allowed: &[DataType]) -> bool {
        allowed.iter().any(|a| {
            *a == DataType::Any
                || a == self
                || (*a == DataType::Integer && *self == DataType::PositiveInteger)
                || (*a == DataType::Float && *self == DataType::PositiveFloat)
        })
    }

    /// Float or integer family tag, positive when the result says so
    pub fn numeric(float: bool, positive: bool) -> DataType {
        match (float, positive) {
            (true, true) => DataType::PositiveFloat,
            (true, false) => DataType::Float,
            (false, true) => DataType::PositiveInteger,
            (false, false) => DataType::Integer,
        }
    }

    /// Float-family tag chosen from the data
    pub fn float_for(result: &Grid) -> DataType {
        DataType::numeric(true, is_positive(result))
    }

    /// Integer or float family chosen from the inputs, positivity from the data
    pub fn propagate(inputs: &[DataType], result: &Grid) -> DataType {
        let float = inputs.iter().any(|t| t.is_float());
        DataType::numeric(float, is_positive(result))
    }
}

/// Strictly positive minimum over unmasked cells; an all-masked grid is not positive
pub fn is_positive(grid: &Grid) -> bool {
    grid.min().map_or(false, |m| m > 0.0)
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
