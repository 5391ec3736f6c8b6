//! Conversions into and out of fuzzy space
//!
//! CvtToFuzzy and its z-score form use a straight line through
//! `(TrueThreshold, fuzzy max)` and `(FalseThreshold, fuzzy min)`.
//! The curve forms interpolate piecewise through sorted control points.
//! CvtToFuzzyCat is a lookup table with a default. CvtToBinary is a step
//! at a threshold. CvtFromFuzzy runs the CvtToFuzzy line backwards and
//! produces a plain `Float` layer.
//!
//! Statistics (min, max, mean, std) are taken over unmasked cells only. An
//! input whose cells are all masked yields an all-masked result.

use crate::command::Command;
use crate::context::{ExecutedNode, ResultContext};
use crate::error::NodeError;
use crate::grid::Grid;
use crate::node::{node_boilerplate, ArgKind, EvaluationNode, Operator, Signature};
use crate::types::{DataType, FUZZY, INTEGERS, NUMERIC_OR_FUZZY};

use super::{fuzzy_layer, linear_map, Direction};

const FUZZY_RETURNS: &[DataType] = &[DataType::Fuzzy];

/// Result for an input with no unmasked cells
fn all_masked(command: &Command, field: &str, grid: &Grid, ctx: &ResultContext) -> ExecutedNode {
    tracing::warn!(
        "{} ({}): input {} has no unmasked cells, result is fully masked",
        command.result_name,
        command.operator,
        field
    );
    fuzzy_layer(&command.result_name, grid.clone(), ctx.fuzzy_range())
}

/// (raw, fuzzy) control points sorted by raw value
fn curve_points(raw: &[f64], fuzzy: &[f64]) -> Vec<(f64, f64)> {
    let mut points: Vec<(f64, f64)> = raw.iter().copied().zip(fuzzy.iter().copied()).collect();
    points.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal));
    points
}

/// Piecewise-linear interpolation through sorted control points
///
/// At or below the first point: its fuzzy value. Above the last: the last
/// fuzzy value. In `(p[i-1], p[i]]`: the segment's line.
fn interpolate_curve(grid: &Grid, points: &[(f64, f64)]) -> Grid {
    let (Some(&first), Some(&last)) = (points.first(), points.last()) else {
        return grid.clone();
    };

    grid.map(|x| {
        if x <= first.0 {
            return first.1;
        }
        if x > last.0 {
            return last.1;
        }
        points
            .windows(2)
            .find(|w| x > w[0].0 && x <= w[1].0)
            .map(|w| {
                let m = (w[1].1 - w[0].1) / (w[1].0 - w[0].0);
                let b = w[0].1 - m * w[0].0;
                m * x + b
            })
            .unwrap_or(last.1)
    })
}

fn curve_checks(command: &Command, raw_arg: &str) -> Result<(), NodeError> {
    command.require_min_list_length(raw_arg, 2)?;
    command.require_equal_list_lengths(&[raw_arg, "FuzzyValues"])?;
    command.require_unique_list_values(raw_arg)
}

// ============================================================================
// Linear conversions
// ============================================================================

#[derive(Debug)]
pub struct CvtToFuzzy {
    command: Command,
    field: String,
    true_threshold: Option<f64>,
    false_threshold: Option<f64>,
}

impl Operator for CvtToFuzzy {
    const NAME: &'static str = "CvtToFuzzy";

    fn describe() -> Signature {
        Signature::new(
            Self::NAME,
            "Convert to Fuzzy",
            "Converts input values into fuzzy values using linear interpolation",
        )
        .returns(FUZZY_RETURNS)
        .required("InFieldName", &[ArgKind::FieldName])
        .optional("TrueThreshold", &[ArgKind::Float])
        .optional("FalseThreshold", &[ArgKind::Float])
        .optional("Direction", &[ArgKind::Direction])
    }

    fn from_command(command: Command) -> Result<Self, NodeError> {
        Self::describe().check(&command)?;
        let field = command.field_name("InFieldName")?;
        let true_threshold = command.optional_float("TrueThreshold")?;
        let false_threshold = command.optional_float("FalseThreshold")?;
        Ok(Self { command, field, true_threshold, false_threshold })
    }
}

impl EvaluationNode for CvtToFuzzy {
    node_boilerplate!();

    fn compute(&self, ctx: &ResultContext) -> Result<ExecutedNode, NodeError> {
        let cmd = &self.command;
        let input = cmd.input_layer(ctx, &self.field, NUMERIC_OR_FUZZY)?;
        let grid = cmd.require_is_data_layer("InFieldName", &input)?;

        let direction = if cmd.has("Direction") {
            Some(Direction::from_arg(cmd, "Direction")?)
        } else {
            None
        };

        // STEP 1: thresholds derived from the data, as (true, false)
        let derived = match direction {
            Some(dir) => {
                let (Some(lo), Some(hi)) = (grid.min(), grid.max()) else {
                    return Ok(all_masked(cmd, &self.field, grid, ctx));
                };
                Some(match dir {
                    Direction::LowToHigh => (hi, lo),
                    Direction::HighToLow => (lo, hi),
                })
            }
            None => None,
        };

        // STEP 2: explicit thresholds win over derived ones
        let missing = |arg: &str| NodeError::MissingArgument {
            arg: arg.to_string(),
            source_loc: cmd.source.clone(),
        };
        let true_thr = self
            .true_threshold
            .or(derived.map(|d| d.0))
            .ok_or_else(|| missing("TrueThreshold"))?;
        let false_thr = self
            .false_threshold
            .or(derived.map(|d| d.1))
            .ok_or_else(|| missing("FalseThreshold"))?;

        if true_thr == false_thr {
            return Err(cmd.degenerate_threshold("TrueThreshold"));
        }

        // STEP 3: line through (true, max) and (false, min)
        let range = ctx.fuzzy_range();
        let result = linear_map(grid, true_thr, range.max, false_thr, range.min);
        Ok(fuzzy_layer(self.result_name(), result, range))
    }
}

#[derive(Debug)]
pub struct CvtToFuzzyZScore {
    command: Command,
    field: String,
    true_z: f64,
    false_z: f64,
}

impl Operator for CvtToFuzzyZScore {
    const NAME: &'static str = "CvtToFuzzyZScore";

    fn describe() -> Signature {
        Signature::new(
            Self::NAME,
            "Convert to Fuzzy",
            "Converts input values into fuzzy values using linear interpolation based on Z Score",
        )
        .returns(FUZZY_RETURNS)
        .required("InFieldName", &[ArgKind::FieldName])
        .required("TrueThresholdZScore", &[ArgKind::Float])
        .required("FalseThresholdZScore", &[ArgKind::Float])
    }

    fn from_command(command: Command) -> Result<Self, NodeError> {
        Self::describe().check(&command)?;
        let field = command.field_name("InFieldName")?;
        let true_z = command.float("TrueThresholdZScore")?;
        let false_z = command.float("FalseThresholdZScore")?;
        Ok(Self { command, field, true_z, false_z })
    }
}

impl EvaluationNode for CvtToFuzzyZScore {
    node_boilerplate!();

    fn compute(&self, ctx: &ResultContext) -> Result<ExecutedNode, NodeError> {
        let cmd = &self.command;
        let input = cmd.input_layer(ctx, &self.field, NUMERIC_OR_FUZZY)?;
        let grid = cmd.require_is_data_layer("InFieldName", &input)?;

        if self.true_z == self.false_z {
            return Err(cmd.degenerate_threshold("TrueThresholdZScore"));
        }

        let (Some(mean), Some(std)) = (grid.mean(), grid.std()) else {
            return Ok(all_masked(cmd, &self.field, grid, ctx));
        };
        let true_thr = mean + std * self.true_z;
        let false_thr = mean + std * self.false_z;

        // Zero spread collapses both thresholds onto the mean
        if true_thr == false_thr {
            return Err(cmd.degenerate_threshold("InFieldName"));
        }

        let range = ctx.fuzzy_range();
        let result = linear_map(grid, true_thr, range.max, false_thr, range.min);
        Ok(fuzzy_layer(self.result_name(), result, range))
    }
}

// ============================================================================
// Lookup and curve conversions
// ============================================================================

#[derive(Debug)]
pub struct CvtToFuzzyCat {
    command: Command,
    field: String,
    raw_values: Vec<i64>,
    fuzzy_values: Vec<f64>,
    default_value: f64,
}

impl Operator for CvtToFuzzyCat {
    const NAME: &'static str = "CvtToFuzzyCat";

    fn describe() -> Signature {
        Signature::new(
            Self::NAME,
            "Convert to Fuzzy by Category",
            "Converts integer input values into fuzzy values through a category lookup",
        )
        .returns(FUZZY_RETURNS)
        .required("InFieldName", &[ArgKind::FieldName])
        .required("RawValues", &[ArgKind::Integer, ArgKind::IntegerList])
        .required("FuzzyValues", &[ArgKind::FuzzyValue, ArgKind::FuzzyValueList])
        .required("DefaultFuzzyValue", &[ArgKind::FuzzyValue])
    }

    fn from_command(command: Command) -> Result<Self, NodeError> {
        Self::describe().check(&command)?;
        let field = command.field_name("InFieldName")?;
        let raw_values = command.int_list("RawValues")?;
        let fuzzy_values = command.float_list("FuzzyValues")?;
        let default_value = command.float("DefaultFuzzyValue")?;
        Ok(Self { command, field, raw_values, fuzzy_values, default_value })
    }
}

impl EvaluationNode for CvtToFuzzyCat {
    node_boilerplate!();

    fn compute(&self, ctx: &ResultContext) -> Result<ExecutedNode, NodeError> {
        let cmd = &self.command;
        let input = cmd.input_layer(ctx, &self.field, INTEGERS)?;
        let grid = cmd.require_is_data_layer("InFieldName", &input)?;

        cmd.require_equal_list_lengths(&["FuzzyValues", "RawValues"])?;
        cmd.require_unique_list_values("RawValues")?;

        let table: Vec<(f64, f64)> = self
            .raw_values
            .iter()
            .map(|&r| r as f64)
            .zip(self.fuzzy_values.iter().copied())
            .collect();
        let default_value = self.default_value;

        // map() keeps the input mask exactly; unmatched categories get the default
        let result = grid.map(|x| {
            table
                .iter()
                .find(|(raw, _)| *raw == x)
                .map_or(default_value, |&(_, fuzzy)| fuzzy)
        });

        Ok(fuzzy_layer(self.result_name(), result, ctx.fuzzy_range()))
    }
}

#[derive(Debug)]
pub struct CvtToFuzzyCurve {
    command: Command,
    field: String,
    raw_values: Vec<f64>,
    fuzzy_values: Vec<f64>,
}

impl Operator for CvtToFuzzyCurve {
    const NAME: &'static str = "CvtToFuzzyCurve";

    fn describe() -> Signature {
        Signature::new(
            Self::NAME,
            "Convert to Fuzzy Curve",
            "Converts input values into fuzzy based on user-defined curve.",
        )
        .returns(FUZZY_RETURNS)
        .required("InFieldName", &[ArgKind::FieldName])
        .required("RawValues", &[ArgKind::FloatList])
        .required("FuzzyValues", &[ArgKind::FuzzyValueList])
    }

    fn from_command(command: Command) -> Result<Self, NodeError> {
        Self::describe().check(&command)?;
        let field = command.field_name("InFieldName")?;
        let raw_values = command.float_list("RawValues")?;
        let fuzzy_values = command.float_list("FuzzyValues")?;
        Ok(Self { command, field, raw_values, fuzzy_values })
    }
}

impl EvaluationNode for CvtToFuzzyCurve {
    node_boilerplate!();

    fn compute(&self, ctx: &ResultContext) -> Result<ExecutedNode, NodeError> {
        let cmd = &self.command;
        let input = cmd.input_layer(ctx, &self.field, NUMERIC_OR_FUZZY)?;
        let grid = cmd.require_is_data_layer("InFieldName", &input)?;
        curve_checks(cmd, "RawValues")?;

        let points = curve_points(&self.raw_values, &self.fuzzy_values);
        let result = interpolate_curve(grid, &points);
        Ok(fuzzy_layer(self.result_name(), result, ctx.fuzzy_range()))
    }
}

/// Curve whose raw breakpoints sit at `mean + z * std` of the input
#[derive(Debug)]
pub struct CvtToFuzzyCurveZScore {
    command: Command,
    field: String,
    z_values: Vec<f64>,
    fuzzy_values: Vec<f64>,
}

impl Operator for CvtToFuzzyCurveZScore {
    const NAME: &'static str = "CvtToFuzzyCurveZScore";

    fn describe() -> Signature {
        Signature::new(
            Self::NAME,
            "Convert to Fuzzy Curve",
            "Converts input values into fuzzy based on user-defined curve of Z Scores.",
        )
        .returns(FUZZY_RETURNS)
        .required("InFieldName", &[ArgKind::FieldName])
        .required("ZScoreValues", &[ArgKind::FloatList])
        .required("FuzzyValues", &[ArgKind::FuzzyValueList])
    }

    fn from_command(command: Command) -> Result<Self, NodeError> {
        Self::describe().check(&command)?;
        let field = command.field_name("InFieldName")?;
        let z_values = command.float_list("ZScoreValues")?;
        let fuzzy_values = command.float_list("FuzzyValues")?;
        Ok(Self { command, field, z_values, fuzzy_values })
    }
}

impl EvaluationNode for CvtToFuzzyCurveZScore {
    node_boilerplate!();

    fn compute(&self, ctx: &ResultContext) -> Result<ExecutedNode, NodeError> {
        let cmd = &self.command;
        let input = cmd.input_layer(ctx, &self.field, NUMERIC_OR_FUZZY)?;
        let grid = cmd.require_is_data_layer("InFieldName", &input)?;
        curve_checks(cmd, "ZScoreValues")?;

        let (Some(mean), Some(std)) = (grid.mean(), grid.std()) else {
            return Ok(all_masked(cmd, &self.field, grid, ctx));
        };
        let raw: Vec<f64> = self.z_values.iter().map(|z| mean + z * std).collect();

        let points = curve_points(&raw, &self.fuzzy_values);
        let result = interpolate_curve(grid, &points);
        Ok(fuzzy_layer(self.result_name(), result, ctx.fuzzy_range()))
    }
}

// ============================================================================
// Step and inverse conversions
// ============================================================================

#[derive(Debug)]
pub struct CvtToBinary {
    command: Command,
    field: String,
    threshold: f64,
}

impl Operator for CvtToBinary {
    const NAME: &'static str = "CvtToBinary";

    fn describe() -> Signature {
        Signature::new(
            Self::NAME,
            "Convert to Binary",
            "Converts input values into binary 0 or 1 based on threshold",
        )
        .returns(FUZZY_RETURNS)
        .required("InFieldName", &[ArgKind::FieldName])
        .required("Threshold", &[ArgKind::Float])
        .required("Direction", &[ArgKind::Direction])
    }

    fn from_command(command: Command) -> Result<Self, NodeError> {
        Self::describe().check(&command)?;
        let field = command.field_name("InFieldName")?;
        let threshold = command.float("Threshold")?;
        Ok(Self { command, field, threshold })
    }
}

impl EvaluationNode for CvtToBinary {
    node_boilerplate!();

    fn compute(&self, ctx: &ResultContext) -> Result<ExecutedNode, NodeError> {
        let cmd = &self.command;
        let input = cmd.input_layer(ctx, &self.field, NUMERIC_OR_FUZZY)?;
        let grid = cmd.require_is_data_layer("InFieldName", &input)?;

        let (low, high) = match Direction::from_arg(cmd, "Direction")? {
            Direction::LowToHigh => (0.0, 1.0),
            Direction::HighToLow => (1.0, 0.0),
        };
        let threshold = self.threshold;
        let result = grid.map(|x| if x < threshold { low } else { high });

        Ok(fuzzy_layer(self.result_name(), result, ctx.fuzzy_range()))
    }
}

#[derive(Debug)]
pub struct CvtFromFuzzy {
    command: Command,
    field: String,
    true_threshold: f64,
    false_threshold: f64,
}

impl Operator for CvtFromFuzzy {
    const NAME: &'static str = "CvtFromFuzzy";

    fn describe() -> Signature {
        Signature::new(
            Self::NAME,
            "Convert from Fuzzy",
            "Converts input fuzzy values into non-fuzzy values using linear interpolation",
        )
        .returns(&[DataType::Float])
        .required("InFieldName", &[ArgKind::FieldName])
        .required("TrueThreshold", &[ArgKind::Float])
        .required("FalseThreshold", &[ArgKind::Float])
    }

    fn from_command(command: Command) -> Result<Self, NodeError> {
        Self::describe().check(&command)?;
        let field = command.field_name("InFieldName")?;
        let true_threshold = command.float("TrueThreshold")?;
        let false_threshold = command.float("FalseThreshold")?;
        Ok(Self { command, field, true_threshold, false_threshold })
    }
}

impl EvaluationNode for CvtFromFuzzy {
    node_boilerplate!();

    fn compute(&self, ctx: &ResultContext) -> Result<ExecutedNode, NodeError> {
        let cmd = &self.command;
        let input = cmd.input_layer(ctx, &self.field, FUZZY)?;
        let grid = cmd.require_is_data_layer("InFieldName", &input)?;

        if self.true_threshold == self.false_threshold {
            return Err(cmd.degenerate_threshold("TrueThreshold"));
        }

        // Same line as CvtToFuzzy with the axes swapped
        let range = ctx.fuzzy_range();
        let result = linear_map(
            grid,
            range.max,
            self.true_threshold,
            range.min,
            self.false_threshold,
        );
        Ok(ExecutedNode::layer(self.result_name(), result, DataType::Float))
    }
}
