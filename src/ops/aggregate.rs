//! Aggregations producing float layers: WeightedSum, Mean, WeightedMean, Normalize
//!
//! Weighted forms apply the first (weight, field) pair once and then add
//! pairs 1..N-1; the weight list must be as long as the field list.
//! WeightedSum tags a strictly positive result `Positive Float`; the
//! other three always report `Float`.

use crate::command::Command;
use crate::context::{ExecutedNode, ResultContext};
use crate::error::NodeError;
use crate::node::{grids_of, node_boilerplate, ArgKind, EvaluationNode, Operator, Signature};
use crate::types::{DataType, NUMERIC};

const FLOAT_RETURNS: &[DataType] = &[DataType::Float, DataType::PositiveFloat];
const PLAIN_FLOAT: &[DataType] = &[DataType::Float];

/// Shared validation + weighted sum for WeightedSum / WeightedMean
fn weighted_total(
    command: &Command,
    ctx: &ResultContext,
    fields: &[String],
    weights: &[f64],
) -> Result<crate::grid::Grid, NodeError> {
    command.require_min_list_length("InFieldNames", 1)?;
    command.require_equal_list_lengths(&["InFieldNames", "Weights"])?;

    let inputs = command.input_layers(ctx, fields, NUMERIC)?;
    command.weighted_sum("InFieldNames", &grids_of(&inputs), weights)
}

#[derive(Debug)]
pub struct WeightedSum {
    command: Command,
    fields: Vec<String>,
    weights: Vec<f64>,
}

impl Operator for WeightedSum {
    const NAME: &'static str = "WeightedSum";

    fn describe() -> Signature {
        Signature::new(Self::NAME, "Weighted Sum", "Takes the weighted sum of input variables")
            .returns(FLOAT_RETURNS)
            .required("InFieldNames", &[ArgKind::FieldName, ArgKind::FieldNameList])
            .required("Weights", &[ArgKind::Float, ArgKind::FloatList])
    }

    fn from_command(command: Command) -> Result<Self, NodeError> {
        Self::describe().check(&command)?;
        let fields = command.field_names("InFieldNames")?;
        let weights = command.float_list("Weights")?;
        Ok(Self { command, fields, weights })
    }
}

impl EvaluationNode for WeightedSum {
    node_boilerplate!();

    fn compute(&self, ctx: &ResultContext) -> Result<ExecutedNode, NodeError> {
        let result = weighted_total(&self.command, ctx, &self.fields, &self.weights)?;
        let data_type = DataType::float_for(&result);
        Ok(ExecutedNode::layer(self.result_name(), result, data_type))
    }
}

#[derive(Debug)]
pub struct Mean {
    command: Command,
    fields: Vec<String>,
}

impl Operator for Mean {
    const NAME: &'static str = "Mean";

    fn describe() -> Signature {
        Signature::new(Self::NAME, "Mean", "Mean of input variables")
            .returns(PLAIN_FLOAT)
            .required("InFieldNames", &[ArgKind::FieldName, ArgKind::FieldNameList])
    }

    fn from_command(command: Command) -> Result<Self, NodeError> {
        Self::describe().check(&command)?;
        let fields = command.field_names("InFieldNames")?;
        Ok(Self { command, fields })
    }
}

impl EvaluationNode for Mean {
    node_boilerplate!();

    fn compute(&self, ctx: &ResultContext) -> Result<ExecutedNode, NodeError> {
        let cmd = &self.command;
        cmd.require_min_list_length("InFieldNames", 1)?;

        let inputs = cmd.input_layers(ctx, &self.fields, NUMERIC)?;
        let n = inputs.len() as f64;
        let total = cmd.fold_grids("InFieldNames", &grids_of(&inputs), |a, b| a + b)?;
        let result = total.map(|v| v / n);

        Ok(ExecutedNode::layer(self.result_name(), result, DataType::Float))
    }
}

#[derive(Debug)]
pub struct WeightedMean {
    command: Command,
    fields: Vec<String>,
    weights: Vec<f64>,
}

impl Operator for WeightedMean {
    const NAME: &'static str = "WeightedMean";

    fn describe() -> Signature {
        Signature::new(Self::NAME, "Weighted Mean", "Takes the weighted mean of input variables")
            .returns(PLAIN_FLOAT)
            .required("InFieldNames", &[ArgKind::FieldName, ArgKind::FieldNameList])
            .required("Weights", &[ArgKind::Float, ArgKind::FloatList])
    }

    fn from_command(command: Command) -> Result<Self, NodeError> {
        Self::describe().check(&command)?;
        let fields = command.field_names("InFieldNames")?;
        let weights = command.float_list("Weights")?;
        Ok(Self { command, fields, weights })
    }
}

impl EvaluationNode for WeightedMean {
    node_boilerplate!();

    fn compute(&self, ctx: &ResultContext) -> Result<ExecutedNode, NodeError> {
        let total = weighted_total(&self.command, ctx, &self.fields, &self.weights)?;

        let weight_sum: f64 = self.weights.iter().sum();
        if weight_sum == 0.0 {
            return Err(self.command.invalid("Weights", "weights sum to zero"));
        }
        let result = total.map(|v| v / weight_sum);

        Ok(ExecutedNode::layer(self.result_name(), result, DataType::Float))
    }
}

/// Linear rescale of a layer from its own [min, max] onto [StartVal, EndVal]
#[derive(Debug)]
pub struct Normalize {
    command: Command,
    field: String,
    start: f64,
    end: f64,
}

impl Operator for Normalize {
    const NAME: &'static str = "Normalize";

    fn describe() -> Signature {
        Signature::new(
            Self::NAME,
            "Normalize",
            "Normalizes the data from another field to range (default 0:1)",
        )
        .returns(PLAIN_FLOAT)
        .required("InFieldName", &[ArgKind::FieldName])
        .optional("StartVal", &[ArgKind::Float])
        .optional("EndVal", &[ArgKind::Float])
    }

    fn from_command(command: Command) -> Result<Self, NodeError> {
        Self::describe().check(&command)?;
        let field = command.field_name("InFieldName")?;
        let start = command.optional_float("StartVal")?.unwrap_or(0.0);
        let end = command.optional_float("EndVal")?.unwrap_or(1.0);
        Ok(Self { command, field, start, end })
    }
}

impl EvaluationNode for Normalize {
    node_boilerplate!();

    fn compute(&self, ctx: &ResultContext) -> Result<ExecutedNode, NodeError> {
        let cmd = &self.command;
        let input = cmd.input_layer(ctx, &self.field, NUMERIC)?;
        let grid = cmd.require_is_data_layer("InFieldName", &input)?;

        let (in_min, in_max) = match (grid.min(), grid.max()) {
            (Some(lo), Some(hi)) if lo != hi => (lo, hi),
            _ => return Err(cmd.degenerate_threshold("InFieldName")),
        };

        let (start, end) = (self.start, self.end);
        let result = grid.map(|v| (v - in_min) * (start - end) / (in_min - in_max) + start);

        Ok(ExecutedNode::layer(self.result_name(), result, DataType::Float))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{context, layer, masked_layer};
    use approx::assert_relative_eq;

    fn run<T: Operator>(command: Command, ctx: &ResultContext) -> Result<ExecutedNode, NodeError> {
        T::from_command(command)?.compute(ctx)
    }

    fn inputs() -> ResultContext {
        context(vec![
            layer("A", vec![1.0, 2.0, 3.0], DataType::PositiveInteger),
            layer("B", vec![3.0, 2.0, 1.0], DataType::PositiveFloat),
        ])
    }

    #[test]
    fn test_weighted_sum() {
        let cmd = Command::new("W", "WeightedSum")
            .arg("InFieldNames", vec!["A", "B"])
            .arg("Weights", vec![2.0, 1.0]);
        let out = run::<WeightedSum>(cmd, &inputs()).unwrap();
        assert_eq!(out.grid().unwrap().values(), &[5.0, 6.0, 7.0]);
        assert_eq!(out.data_type(), DataType::PositiveFloat);
    }

    #[test]
    fn test_weighted_sum_length_mismatch() {
        let cmd = Command::new("W", "WeightedSum")
            .arg("InFieldNames", vec!["A", "B"])
            .arg("Weights", vec![1.0]);
        assert!(matches!(
            run::<WeightedSum>(cmd, &inputs()),
            Err(NodeError::LengthMismatch { .. })
        ));
    }

    #[test]
    fn test_weighted_mean_length_mismatch() {
        let cmd = Command::new("W", "WeightedMean")
            .arg("InFieldNames", vec!["A"])
            .arg("Weights", vec![1.0, 2.0]);
        assert!(matches!(
            run::<WeightedMean>(cmd, &inputs()),
            Err(NodeError::LengthMismatch { .. })
        ));
    }

    #[test]
    fn test_mean() {
        let cmd = Command::new("M", "Mean").arg("InFieldNames", vec!["A", "B"]);
        let out = run::<Mean>(cmd, &inputs()).unwrap();
        assert_eq!(out.grid().unwrap().values(), &[2.0, 2.0, 2.0]);
        assert_eq!(out.data_type(), DataType::Float);
    }

    #[test]
    fn test_mean_empty_list() {
        let empty: Vec<&str> = Vec::new();
        let cmd = Command::new("M", "Mean").arg("InFieldNames", empty);
        assert!(matches!(
            run::<Mean>(cmd, &inputs()),
            Err(NodeError::TooFewInputs { .. })
        ));
    }

    #[test]
    fn test_weighted_mean() {
        let cmd = Command::new("W", "WeightedMean")
            .arg("InFieldNames", vec!["A", "B"])
            .arg("Weights", vec![3.0, 1.0]);
        let out = run::<WeightedMean>(cmd, &inputs()).unwrap();
        let values = out.grid().unwrap().values();
        assert_relative_eq!(values[0], 1.5);
        assert_relative_eq!(values[1], 2.0);
        assert_relative_eq!(values[2], 2.5);
    }

    #[test]
    fn test_weighted_mean_zero_weights() {
        let cmd = Command::new("W", "WeightedMean")
            .arg("InFieldNames", vec!["A", "B"])
            .arg("Weights", vec![1.0, -1.0]);
        assert!(matches!(
            run::<WeightedMean>(cmd, &inputs()),
            Err(NodeError::InvalidArgument { .. })
        ));
    }

    #[test]
    fn test_advertised_return_types() {
        assert_eq!(
            WeightedSum::describe().return_types,
            vec![DataType::Float, DataType::PositiveFloat]
        );
        for sig in [Mean::describe(), WeightedMean::describe(), Normalize::describe()] {
            assert_eq!(sig.return_types, vec![DataType::Float], "{}", sig.operator);
        }
    }

    #[test]
    fn test_normalize_default_range() {
        let ctx = context(vec![masked_layer(
            "A",
            vec![10.0, 20.0, 30.0, 999.0],
            vec![false, false, false, true],
            DataType::Float,
        )]);
        let cmd = Command::new("N", "Normalize").arg("InFieldName", "A");
        let out = run::<Normalize>(cmd, &ctx).unwrap();
        let grid = out.grid().unwrap();
        assert_relative_eq!(grid.values()[0], 0.0);
        assert_relative_eq!(grid.values()[1], 0.5);
        assert_relative_eq!(grid.values()[2], 1.0);
        assert!(grid.is_masked(3));
        assert_eq!(out.data_type(), DataType::Float);
    }

    #[test]
    fn test_normalize_custom_reversed_range() {
        let ctx = context(vec![layer("A", vec![0.0, 5.0, 10.0], DataType::Integer)]);
        let cmd = Command::new("N", "Normalize")
            .arg("InFieldName", "A")
            .arg("StartVal", 100.0)
            .arg("EndVal", 0.0);
        let out = run::<Normalize>(cmd, &ctx).unwrap();
        assert_eq!(out.grid().unwrap().values(), &[100.0, 50.0, 0.0]);
    }

    #[test]
    fn test_normalize_constant_input() {
        let ctx = context(vec![layer("A", vec![4.0, 4.0], DataType::Float)]);
        let cmd = Command::new("N", "Normalize").arg("InFieldName", "A");
        assert!(matches!(
            run::<Normalize>(cmd, &ctx),
            Err(NodeError::DegenerateThreshold { .. })
        ));
    }
}
