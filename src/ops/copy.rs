//! Copy: republish another result under a new name

use crate::command::Command;
use crate::context::{ExecutedNode, ResultContext};
use crate::error::NodeError;
use crate::node::{node_boilerplate, ArgKind, EvaluationNode, Operator, Signature};
use crate::types::DataType;

/// Inherits the input's value, type and data-layer flag unchanged
#[derive(Debug)]
pub struct Copy {
    command: Command,
    field: String,
}

impl Operator for Copy {
    const NAME: &'static str = "Copy";

    fn describe() -> Signature {
        Signature::new(Self::NAME, "Copy", "Copies the data from another field")
            .returns(&[DataType::Any])
            .required("InFieldName", &[ArgKind::FieldName])
    }

    fn from_command(command: Command) -> Result<Self, NodeError> {
        Self::describe().check(&command)?;
        let field = command.field_name("InFieldName")?;
        Ok(Self { command, field })
    }
}

impl EvaluationNode for Copy {
    node_boilerplate!();

    fn compute(&self, ctx: &ResultContext) -> Result<ExecutedNode, NodeError> {
        let input = ctx.get(&self.field, &self.command.source)?;
        Ok(ExecutedNode::new(
            self.result_name(),
            input.result().clone(),
            input.data_type(),
            input.is_data_layer(),
        ))
    }
}
