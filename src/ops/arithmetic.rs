//! Elementwise arithmetic: A - B, A / B, Sum, Multiply, Minimum, Maximum
//!
//! Inputs must be integer- or float-family data layers. Output masks are the
//! OR of the input masks (A / B additionally masks cells where B is zero).
//!
//! Output type:
//!   - Sum, Multiply, Minimum, Maximum: float family if any input is float,
//!     integer family otherwise
//!   - AMinusB, ADividedByB: always float family
//!   - positive variant iff the unmasked minimum of the result is > 0

use crate::command::Command;
use crate::context::{ExecutedNode, ResultContext};
use crate::error::NodeError;
use crate::grid::MaskRule;
use crate::node::{grids_of, node_boilerplate, ArgKind, EvaluationNode, Operator, Signature};
use crate::types::{DataType, NUMERIC};

const NUMERIC_RETURNS: &[DataType] = &[
    DataType::Integer,
    DataType::PositiveInteger,
    DataType::Float,
    DataType::PositiveFloat,
];

const FLOAT_RETURNS: &[DataType] = &[DataType::Float, DataType::PositiveFloat];

/// Fold the `InFieldNames` layers with `f` and infer the numeric family
fn reduce_numeric(
    command: &Command,
    ctx: &ResultContext,
    fields: &[String],
    f: impl Fn(f64, f64) -> f64,
) -> Result<ExecutedNode, NodeError> {
    command.require_min_list_length("InFieldNames", 1)?;

    let inputs = command.input_layers(ctx, fields, NUMERIC)?;
    let result = command.fold_grids("InFieldNames", &grids_of(&inputs), f)?;

    let in_types: Vec<DataType> = inputs.iter().map(|n| n.data_type()).collect();
    let data_type = DataType::propagate(&in_types, &result);

    Ok(ExecutedNode::layer(&command.result_name, result, data_type))
}

fn list_signature(operator: &'static str, display: &'static str, desc: &'static str) -> Signature {
    Signature::new(operator, display, desc)
        .returns(NUMERIC_RETURNS)
        .required("InFieldNames", &[ArgKind::FieldName, ArgKind::FieldNameList])
}

fn pair_signature(operator: &'static str, display: &'static str, desc: &'static str) -> Signature {
    Signature::new(operator, display, desc)
        .returns(FLOAT_RETURNS)
        .required("A", &[ArgKind::FieldName])
        .required("B", &[ArgKind::FieldName])
}

// ============================================================================
// N-ary reductions
// ============================================================================

#[derive(Debug)]
pub struct Sum {
    command: Command,
    fields: Vec<String>,
}

impl Operator for Sum {
    const NAME: &'static str = "Sum";

    fn describe() -> Signature {
        list_signature(Self::NAME, "Sum", "Sums input variables")
    }

    fn from_command(command: Command) -> Result<Self, NodeError> {
        Self::describe().check(&command)?;
        let fields = command.field_names("InFieldNames")?;
        Ok(Self { command, fields })
    }
}

impl EvaluationNode for Sum {
    node_boilerplate!();

    fn compute(&self, ctx: &ResultContext) -> Result<ExecutedNode, NodeError> {
        reduce_numeric(&self.command, ctx, &self.fields, |a, b| a + b)
    }
}

#[derive(Debug)]
pub struct Multiply {
    command: Command,
    fields: Vec<String>,
}

impl Operator for Multiply {
    const NAME: &'static str = "Multiply";

    fn describe() -> Signature {
        list_signature(Self::NAME, "Multiply", "Multiplies input variables")
    }

    fn from_command(command: Command) -> Result<Self, NodeError> {
        Self::describe().check(&command)?;
        let fields = command.field_names("InFieldNames")?;
        Ok(Self { command, fields })
    }
}

impl EvaluationNode for Multiply {
    node_boilerplate!();

    fn compute(&self, ctx: &ResultContext) -> Result<ExecutedNode, NodeError> {
        reduce_numeric(&self.command, ctx, &self.fields, |a, b| a * b)
    }
}

#[derive(Debug)]
pub struct Minimum {
    command: Command,
    fields: Vec<String>,
}

impl Operator for Minimum {
    const NAME: &'static str = "Minimum";

    fn describe() -> Signature {
        list_signature(Self::NAME, "Minimum", "Takes the minimum input variables")
    }

    fn from_command(command: Command) -> Result<Self, NodeError> {
        Self::describe().check(&command)?;
        let fields = command.field_names("InFieldNames")?;
        Ok(Self { command, fields })
    }
}

impl EvaluationNode for Minimum {
    node_boilerplate!();

    fn compute(&self, ctx: &ResultContext) -> Result<ExecutedNode, NodeError> {
        reduce_numeric(&self.command, ctx, &self.fields, f64::min)
    }
}

#[derive(Debug)]
pub struct Maximum {
    command: Command,
    fields: Vec<String>,
}

impl Operator for Maximum {
    const NAME: &'static str = "Maximum";

    fn describe() -> Signature {
        list_signature(Self::NAME, "Maximum", "Takes the maximum input variables")
    }

    fn from_command(command: Command) -> Result<Self, NodeError> {
        Self::describe().check(&command)?;
        let fields = command.field_names("InFieldNames")?;
        Ok(Self { command, fields })
    }
}

impl EvaluationNode for Maximum {
    node_boilerplate!();

    fn compute(&self, ctx: &ResultContext) -> Result<ExecutedNode, NodeError> {
        reduce_numeric(&self.command, ctx, &self.fields, f64::max)
    }
}

// ============================================================================
// Binary operators
// ============================================================================

#[derive(Debug)]
pub struct AMinusB {
    command: Command,
    a: String,
    b: String,
}

impl Operator for AMinusB {
    const NAME: &'static str = "AMinusB";

    fn describe() -> Signature {
        pair_signature(Self::NAME, "A Minus B", "Performs A - B")
    }

    fn from_command(command: Command) -> Result<Self, NodeError> {
        Self::describe().check(&command)?;
        let a = command.field_name("A")?;
        let b = command.field_name("B")?;
        Ok(Self { command, a, b })
    }
}

impl EvaluationNode for AMinusB {
    node_boilerplate!();

    fn compute(&self, ctx: &ResultContext) -> Result<ExecutedNode, NodeError> {
        let cmd = &self.command;
        let a = cmd.input_layer(ctx, &self.a, NUMERIC)?;
        let b = cmd.input_layer(ctx, &self.b, NUMERIC)?;
        let a_grid = cmd.require_is_data_layer("A", &a)?;
        let b_grid = cmd.require_is_data_layer("B", &b)?;

        let result = a_grid
            .zip_with(b_grid, MaskRule::Union, |x, y| x - y)
            .map_err(|e| cmd.shape_error("B", e))?;
        let data_type = DataType::float_for(&result);

        Ok(ExecutedNode::layer(self.result_name(), result, data_type))
    }
}

#[derive(Debug)]
pub struct ADividedByB {
    command: Command,
    a: String,
    b: String,
}

impl Operator for ADividedByB {
    const NAME: &'static str = "ADividedByB";

    fn describe() -> Signature {
        pair_signature(Self::NAME, "A Divided By B", "Performs A / B")
    }

    fn from_command(command: Command) -> Result<Self, NodeError> {
        Self::describe().check(&command)?;
        let a = command.field_name("A")?;
        let b = command.field_name("B")?;
        Ok(Self { command, a, b })
    }
}

impl EvaluationNode for ADividedByB {
    node_boilerplate!();

    fn compute(&self, ctx: &ResultContext) -> Result<ExecutedNode, NodeError> {
        let cmd = &self.command;
        let a = cmd.input_layer(ctx, &self.a, NUMERIC)?;
        let b = cmd.input_layer(ctx, &self.b, NUMERIC)?;
        let a_grid = cmd.require_is_data_layer("A", &a)?;
        let b_grid = cmd.require_is_data_layer("B", &b)?;

        let mut result = a_grid
            .zip_with(b_grid, MaskRule::Union, |x, y| x / y)
            .map_err(|e| cmd.shape_error("B", e))?;

        // Division by zero is nodata, not infinity
        let mask: Vec<bool> = result
            .mask()
            .iter()
            .zip(b_grid.values())
            .map(|(&m, &divisor)| m || divisor == 0.0)
            .collect();
        result
            .replace_mask(&mask)
            .map_err(|e| cmd.shape_error("B", e))?;

        let data_type = DataType::float_for(&result);
        Ok(ExecutedNode::layer(self.result_name(), result, data_type))
    }
}
