//! EEMS Fuzzy Logic Rust Implementation
//!
//! Multi-criteria fuzzy-logic suitability models over nodata-aware grids.
//! A model is a DAG of named nodes; each node reads earlier results from a
//! shared context and publishes one new grid (or, for sinks, a flag).
//!
//! Layout:
//! - `grid`, `types`: the value type every node produces and its semantic tag
//! - `command`, `node`: parsed commands, operator signatures, validation and
//!   the node contract
//! - `ops`: arithmetic, aggregation and the PrintVars sink
//! - `fuzzy`: fuzzification, defuzzification and fuzzy set operators
//! - `registry`, `model`: operator lookup and dependency-ordered evaluation

pub mod command;
pub mod config;
pub mod context;
pub mod error;
pub mod fuzzy;
pub mod grid;
pub mod model;
pub mod node;
pub mod ops;
pub mod registry;
pub mod types;

#[cfg(test)]
mod testing;

// Re-export commonly used types
pub use command::{ArgValue, Command};
pub use config::{EngineConfig, FuzzyRange};
pub use context::{ExecutedNode, NodeValue, ResultContext};
pub use error::{CommandSource, NodeError};
pub use grid::{Grid, MaskRule};
pub use model::{EvaluationSummary, Model, ModelFile};
pub use node::{ArgKind, EvaluationNode, Operator, Signature};
pub use registry::Registry;
pub use types::DataType;
