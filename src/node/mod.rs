//! Node contract
//!
//! Every operator implements `EvaluationNode`. The scheduler asks each node
//! for the results it reads (`dependency_names`), then calls `execute` once
//! all of those are present in the shared `ResultContext`. A node validates,
//! computes and publishes exactly one `ExecutedNode` under its own result
//! name; any validation failure aborts before anything is written.

pub mod signature;
pub mod validation;

pub use signature::{ArgKind, ArgSpec, Signature};
pub use validation::grids_of;

use std::fmt;

use crate::command::Command;
use crate::context::{ExecutedNode, ResultContext};
use crate::error::NodeError;

pub trait EvaluationNode: Send + Sync + fmt::Debug {
    /// The command this node was built from
    fn command(&self) -> &Command;

    /// Static self-description of the operator
    fn signature(&self) -> Signature;

    /// Validate inputs and compute the result without publishing it
    fn compute(&self, ctx: &ResultContext) -> Result<ExecutedNode, NodeError>;

    fn result_name(&self) -> &str {
        &self.command().result_name
    }

    /// Every result this node reads, list arguments and precursors included
    fn dependency_names(&self) -> Vec<String> {
        self.signature().field_references(self.command())
    }

    /// Compute and publish the result under this node's name
    fn execute(&self, ctx: &ResultContext) -> Result<(), NodeError> {
        let executed = self.compute(ctx)?;
        tracing::debug!(
            "{} = {} -> {}{}",
            self.result_name(),
            self.command().operator,
            executed.data_type(),
            if executed.is_data_layer() { "" } else { " (sink)" }
        );
        ctx.insert(executed, &self.command().source)
    }
}

/// An operator kind that can be built from a command
pub trait Operator: EvaluationNode + Sized + 'static {
    /// Registry name, e.g. "CvtToFuzzy"
    const NAME: &'static str;

    fn describe() -> Signature;

    /// Build the node after checking the command against `describe()`
    fn from_command(command: Command) -> Result<Self, NodeError>;
}

/// Implements the boilerplate half of `EvaluationNode` for an operator
/// struct holding its `command`
macro_rules! node_boilerplate {
    () => {
        fn command(&self) -> &$crate::command::Command {
            &self.command
        }

        fn signature(&self) -> $crate::node::Signature {
            <Self as $crate::node::Operator>::describe()
        }
    };
}

pub(crate) use node_boilerplate;
