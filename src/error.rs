//! Node evaluation errors
//!
//! Every failure is fatal to the model evaluation. Each variant names the
//! offending argument and carries the declaring command's location and raw
//! text so the faulting model statement can be found.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::types::DataType;

/// Where a command was declared
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandSource {
    pub file: String,
    pub line: usize,
    pub raw: String,
}

impl fmt::Display for CommandSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "File: {}  Line number: {}\nFull command:\n{}",
            self.file, self.line, self.raw
        )
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum NodeError {
    #[error("{arg} is not a data layer\n{source_loc}")]
    NotADataLayer { arg: String, source_loc: CommandSource },

    #[error("{arg} has type {found}, expected one of {}\n{source_loc}", type_list(.allowed))]
    TypeMismatch {
        arg: String,
        found: DataType,
        allowed: Vec<DataType>,
        source_loc: CommandSource,
    },

    #[error("{arg} needs at least {required} entries, got {found}\n{source_loc}")]
    TooFewInputs {
        arg: String,
        required: usize,
        found: usize,
        source_loc: CommandSource,
    },

    #[error("list arguments {} must have equal lengths, got {lengths:?}\n{source_loc}", .args.join(", "))]
    LengthMismatch {
        args: Vec<String>,
        lengths: Vec<usize>,
        source_loc: CommandSource,
    },

    #[error("{arg} contains duplicate value {value}\n{source_loc}")]
    DuplicateValue {
        arg: String,
        value: String,
        source_loc: CommandSource,
    },

    #[error("True and False thresholds must not be equal ({arg})\n{source_loc}")]
    DegenerateThreshold { arg: String, source_loc: CommandSource },

    #[error("Invalid {arg} '{value}': must be one of LowToHigh, HighToLow\n{source_loc}")]
    InvalidDirection {
        arg: String,
        value: String,
        source_loc: CommandSource,
    },

    #[error("Missing required argument {arg}\n{source_loc}")]
    MissingArgument { arg: String, source_loc: CommandSource },

    #[error("Invalid argument {arg}: {reason}\n{source_loc}")]
    InvalidArgument {
        arg: String,
        reason: String,
        source_loc: CommandSource,
    },

    #[error("{arg}: grid shape {left:?} does not match {right:?}\n{source_loc}")]
    ShapeMismatch {
        arg: String,
        left: (usize, usize),
        right: (usize, usize),
        source_loc: CommandSource,
    },

    #[error("Result {arg} has not been computed\n{source_loc}")]
    MissingResult { arg: String, source_loc: CommandSource },

    #[error("Result {arg} was already written\n{source_loc}")]
    DuplicateResult { arg: String, source_loc: CommandSource },

    #[error("Unknown operator {arg}\n{source_loc}")]
    UnknownOperator { arg: String, source_loc: CommandSource },
}

impl NodeError {
    /// Name of the argument (or result) the error is about
    pub fn arg(&self) -> &str {
        match self {
            NodeError::NotADataLayer { arg, .. }
            | NodeError::TypeMismatch { arg, .. }
            | NodeError::TooFewInputs { arg, .. }
            | NodeError::DuplicateValue { arg, .. }
            | NodeError::DegenerateThreshold { arg, .. }
            | NodeError::InvalidDirection { arg, .. }
            | NodeError::MissingArgument { arg, .. }
            | NodeError::InvalidArgument { arg, .. }
            | NodeError::ShapeMismatch { arg, .. }
            | NodeError::MissingResult { arg, .. }
            | NodeError::DuplicateResult { arg, .. }
            | NodeError::UnknownOperator { arg, .. } => arg,
            NodeError::LengthMismatch { args, .. } => args.first().map_or("", |s| s.as_str()),
        }
    }

    /// Location of the faulting command
    pub fn source_loc(&self) -> &CommandSource {
        match self {
            NodeError::NotADataLayer { source_loc, .. }
            | NodeError::TypeMismatch { source_loc, .. }
            | NodeError::TooFewInputs { source_loc, .. }
            | NodeError::LengthMismatch { source_loc, .. }
            | NodeError::DuplicateValue { source_loc, .. }
            | NodeError::DegenerateThreshold { source_loc, .. }
            | NodeError::InvalidDirection { source_loc, .. }
            | NodeError::MissingArgument { source_loc, .. }
            | NodeError::InvalidArgument { source_loc, .. }
            | NodeError::ShapeMismatch { source_loc, .. }
            | NodeError::MissingResult { source_loc, .. }
            | NodeError::DuplicateResult { source_loc, .. }
            | NodeError::UnknownOperator { source_loc, .. } => source_loc,
        }
    }
}

fn type_list(types: &[DataType]) -> String {
    types.iter().map(|t| t.name()).collect::<Vec<_>>().join(", ")
}
