//! Fuzzy set operators
//!
//! Inputs and outputs are all `Fuzzy`. Masks combine by OR. The stacked
//! operators (FuzzySelectedUnion, FuzzyXOr) sort each cell's values
//! ascending before reducing them.

use std::sync::Arc;

use crate::command::Command;
use crate::context::{ExecutedNode, ResultContext};
use crate::error::NodeError;
use crate::grid::SortedStack;
use crate::node::{grids_of, node_boilerplate, ArgKind, EvaluationNode, Operator, Signature};
use crate::types::{DataType, FUZZY};

use super::fuzzy_layer;

const FUZZY_RETURNS: &[DataType] = &[DataType::Fuzzy];

/// At least `min` fuzzy data layers from `InFieldNames`
fn fuzzy_inputs(
    command: &Command,
    ctx: &ResultContext,
    fields: &[String],
    min: usize,
) -> Result<Vec<Arc<ExecutedNode>>, NodeError> {
    command.require_min_list_length("InFieldNames", min)?;
    command.input_layers(ctx, fields, FUZZY)
}

fn stack_inputs(command: &Command, inputs: &[Arc<ExecutedNode>]) -> Result<SortedStack, NodeError> {
    SortedStack::build(&grids_of(inputs)).map_err(|e| command.shape_error("InFieldNames", e))
}

fn list_signature(operator: &'static str, display: &'static str, desc: &'static str) -> Signature {
    Signature::new(operator, display, desc)
        .returns(FUZZY_RETURNS)
        .required("InFieldNames", &[ArgKind::FieldName, ArgKind::FieldNameList])
}

/// Fold fuzzy layers elementwise and clamp
fn reduce_fuzzy(
    command: &Command,
    ctx: &ResultContext,
    fields: &[String],
    f: impl Fn(f64, f64) -> f64,
) -> Result<ExecutedNode, NodeError> {
    let inputs = fuzzy_inputs(command, ctx, fields, 1)?;
    let result = command.fold_grids("InFieldNames", &grids_of(&inputs), f)?;
    Ok(fuzzy_layer(&command.result_name, result, ctx.fuzzy_range()))
}

// ============================================================================
// Unions
// ============================================================================

/// Elementwise mean
#[derive(Debug)]
pub struct FuzzyUnion {
    command: Command,
    fields: Vec<String>,
}

impl Operator for FuzzyUnion {
    const NAME: &'static str = "FuzzyUnion";

    fn describe() -> Signature {
        list_signature(Self::NAME, "Fuzzy Union", "Takes the fuzzy Union (mean) of fuzzy input variables")
    }

    fn from_command(command: Command) -> Result<Self, NodeError> {
        Self::describe().check(&command)?;
        let fields = command.field_names("InFieldNames")?;
        Ok(Self { command, fields })
    }
}

impl EvaluationNode for FuzzyUnion {
    node_boilerplate!();

    fn compute(&self, ctx: &ResultContext) -> Result<ExecutedNode, NodeError> {
        let cmd = &self.command;
        let inputs = fuzzy_inputs(cmd, ctx, &self.fields, 1)?;
        let n = inputs.len() as f64;
        let total = cmd.fold_grids("InFieldNames", &grids_of(&inputs), |a, b| a + b)?;
        Ok(fuzzy_layer(self.result_name(), total.map(|v| v / n), ctx.fuzzy_range()))
    }
}

/// Elementwise weighted mean
#[derive(Debug)]
pub struct FuzzyWeightedUnion {
    command: Command,
    fields: Vec<String>,
    weights: Vec<f64>,
}

impl Operator for FuzzyWeightedUnion {
    const NAME: &'static str = "FuzzyWeightedUnion";

    fn describe() -> Signature {
        list_signature(
            Self::NAME,
            "Fuzzy Weighted Union",
            "Takes the weighted fuzzy Union (mean) of fuzzy input variables",
        )
        .required("Weights", &[ArgKind::Float, ArgKind::FloatList])
    }

    fn from_command(command: Command) -> Result<Self, NodeError> {
        Self::describe().check(&command)?;
        let fields = command.field_names("InFieldNames")?;
        let weights = command.float_list("Weights")?;
        Ok(Self { command, fields, weights })
    }
}

impl EvaluationNode for FuzzyWeightedUnion {
    node_boilerplate!();

    fn compute(&self, ctx: &ResultContext) -> Result<ExecutedNode, NodeError> {
        let cmd = &self.command;
        cmd.require_min_list_length("InFieldNames", 1)?;
        cmd.require_equal_list_lengths(&["InFieldNames", "Weights"])?;

        let inputs = fuzzy_inputs(cmd, ctx, &self.fields, 1)?;
        let weight_sum: f64 = self.weights.iter().sum();
        if weight_sum == 0.0 {
            return Err(cmd.invalid("Weights", "weights sum to zero"));
        }

        let total = cmd.weighted_sum("InFieldNames", &grids_of(&inputs), &self.weights)?;
        Ok(fuzzy_layer(
            self.result_name(),
            total.map(|v| v / weight_sum),
            ctx.fuzzy_range(),
        ))
    }
}

/// Which end of each sorted cell stack FuzzySelectedUnion averages
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selection {
    Truest,
    Falsest,
}

/// Mean of the K truest (or falsest) values per cell
#[derive(Debug)]
pub struct FuzzySelectedUnion {
    command: Command,
    fields: Vec<String>,
    selection: Selection,
    count: usize,
}

impl Operator for FuzzySelectedUnion {
    const NAME: &'static str = "FuzzySelectedUnion";

    fn describe() -> Signature {
        list_signature(
            Self::NAME,
            "Fuzzy Selected Union",
            "Takes the fuzzy Union (mean) of N Truest or Falsest fuzzy input variables",
        )
        .required("TruestOrFalsest", &[ArgKind::TruestOrFalsest])
        .required("NumberToConsider", &[ArgKind::PositiveInteger])
    }

    fn from_command(command: Command) -> Result<Self, NodeError> {
        Self::describe().check(&command)?;
        let fields = command.field_names("InFieldNames")?;

        let selection = match command.string("TruestOrFalsest")?.as_str() {
            "Truest" => Selection::Truest,
            "Falsest" => Selection::Falsest,
            other => {
                return Err(command.invalid(
                    "TruestOrFalsest",
                    format!("'{}' must be Truest or Falsest", other),
                ))
            }
        };

        let count = usize::try_from(command.int("NumberToConsider")?)
            .map_err(|_| command.invalid("NumberToConsider", "must be a positive integer"))?;

        Ok(Self { command, fields, selection, count })
    }
}

impl EvaluationNode for FuzzySelectedUnion {
    node_boilerplate!();

    fn compute(&self, ctx: &ResultContext) -> Result<ExecutedNode, NodeError> {
        let cmd = &self.command;
        let k = self.count;
        let inputs = fuzzy_inputs(cmd, ctx, &self.fields, k.max(1))?;
        let stack = stack_inputs(cmd, &inputs)?;

        let selection = self.selection;
        let result = stack.reduce(|cell| {
            let chosen = match selection {
                Selection::Truest => &cell[cell.len() - k..],
                Selection::Falsest => &cell[..k],
            };
            chosen.iter().sum::<f64>() / k as f64
        });

        Ok(fuzzy_layer(self.result_name(), result, ctx.fuzzy_range()))
    }
}

// ============================================================================
// Logical operators
// ============================================================================

/// Elementwise maximum
#[derive(Debug)]
pub struct FuzzyOr {
    command: Command,
    fields: Vec<String>,
}

impl Operator for FuzzyOr {
    const NAME: &'static str = "FuzzyOr";

    fn describe() -> Signature {
        list_signature(Self::NAME, "Fuzzy Or", "Takes the fuzzy Or (maximum) of fuzzy input variables")
    }

    fn from_command(command: Command) -> Result<Self, NodeError> {
        Self::describe().check(&command)?;
        let fields = command.field_names("InFieldNames")?;
        Ok(Self { command, fields })
    }
}

impl EvaluationNode for FuzzyOr {
    node_boilerplate!();

    fn compute(&self, ctx: &ResultContext) -> Result<ExecutedNode, NodeError> {
        reduce_fuzzy(&self.command, ctx, &self.fields, f64::max)
    }
}

/// Elementwise minimum
#[derive(Debug)]
pub struct FuzzyAnd {
    command: Command,
    fields: Vec<String>,
}

impl Operator for FuzzyAnd {
    const NAME: &'static str = "FuzzyAnd";

    fn describe() -> Signature {
        list_signature(Self::NAME, "Fuzzy And", "Takes the fuzzy And (minimum) of fuzzy input variables")
    }

    fn from_command(command: Command) -> Result<Self, NodeError> {
        Self::describe().check(&command)?;
        let fields = command.field_names("InFieldNames")?;
        Ok(Self { command, fields })
    }
}

impl EvaluationNode for FuzzyAnd {
    node_boilerplate!();

    fn compute(&self, ctx: &ResultContext) -> Result<ExecutedNode, NodeError> {
        reduce_fuzzy(&self.command, ctx, &self.fields, f64::min)
    }
}

/// Exclusive or over the two truest values per cell
///
/// `fmin` where the top value is at or below `fmin`, otherwise
/// `top - (top - second) * (second - fmin) / (top - fmin)`.
#[derive(Debug)]
pub struct FuzzyXOr {
    command: Command,
    fields: Vec<String>,
}

impl Operator for FuzzyXOr {
    const NAME: &'static str = "FuzzyXOr";

    fn describe() -> Signature {
        list_signature(Self::NAME, "Fuzzy XOr", "Computes Fuzzy XOr: Truest - (Truest - 2nd Truest) * (2nd Truest - full False)/(Truest - full False)")
    }

    fn from_command(command: Command) -> Result<Self, NodeError> {
        Self::describe().check(&command)?;
        let fields = command.field_names("InFieldNames")?;
        Ok(Self { command, fields })
    }
}

impl EvaluationNode for FuzzyXOr {
    node_boilerplate!();

    fn compute(&self, ctx: &ResultContext) -> Result<ExecutedNode, NodeError> {
        let cmd = &self.command;
        let inputs = fuzzy_inputs(cmd, ctx, &self.fields, 2)?;
        let stack = stack_inputs(cmd, &inputs)?;

        let range = ctx.fuzzy_range();
        let fmin = range.min;
        let result = stack.reduce(|cell| {
            let n = cell.len();
            let (top, second) = (cell[n - 1], cell[n - 2]);
            if top <= fmin {
                fmin
            } else {
                top - (top - second) * (second - fmin) / (top - fmin)
            }
        });

        Ok(fuzzy_layer(self.result_name(), result, range))
    }
}

/// Negation, valid because the fuzzy range is symmetric about zero
#[derive(Debug)]
pub struct FuzzyNot {
    command: Command,
    field: String,
}

impl Operator for FuzzyNot {
    const NAME: &'static str = "FuzzyNot";

    fn describe() -> Signature {
        Signature::new(Self::NAME, "Fuzzy Not", "Takes the fuzzy Not of a fuzzy input variable")
            .returns(FUZZY_RETURNS)
            .required("InFieldName", &[ArgKind::FieldName])
    }

    fn from_command(command: Command) -> Result<Self, NodeError> {
        Self::describe().check(&command)?;
        let field = command.field_name("InFieldName")?;
        Ok(Self { command, field })
    }
}

impl EvaluationNode for FuzzyNot {
    node_boilerplate!();

    fn compute(&self, ctx: &ResultContext) -> Result<ExecutedNode, NodeError> {
        let cmd = &self.command;
        let input = cmd.input_layer(ctx, &self.field, FUZZY)?;
        let grid = cmd.require_is_data_layer("InFieldName", &input)?;
        let range = ctx.fuzzy_range();
        Ok(fuzzy_layer(self.result_name(), grid.map(|v| range.complement(v)), range))
    }
}
