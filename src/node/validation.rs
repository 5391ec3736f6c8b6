//! Argument validation shared by every operator
//!
//! Each check fails with a named `NodeError` that carries the offending
//! argument plus the command's source location and raw text.

use rustc_hash::FxHashSet;
use std::sync::Arc;

use crate::command::Command;
use crate::context::{ExecutedNode, ResultContext};
use crate::error::NodeError;
use crate::grid::{Grid, MaskRule, ShapeMismatch};
use crate::types::DataType;

impl Command {
    /// The referenced node must produce a grid; returns that grid
    pub fn require_is_data_layer<'a>(
        &self,
        arg: &str,
        node: &'a ExecutedNode,
    ) -> Result<&'a Grid, NodeError> {
        match node.grid() {
            Some(grid) if node.is_data_layer() => Ok(grid),
            _ => Err(NodeError::NotADataLayer {
                arg: arg.to_string(),
                source_loc: self.source.clone(),
            }),
        }
    }

    /// The referenced node's type must satisfy one of `allowed`
    pub fn require_type(
        &self,
        arg: &str,
        node: &ExecutedNode,
        allowed: &[DataType],
    ) -> Result<(), NodeError> {
        if node.data_type().satisfies(allowed) {
            return Ok(());
        }
        Err(NodeError::TypeMismatch {
            arg: arg.to_string(),
            found: node.data_type(),
            allowed: allowed.to_vec(),
            source_loc: self.source.clone(),
        })
    }

    pub fn require_min_list_length(&self, arg: &str, min: usize) -> Result<(), NodeError> {
        let found = self.list_len(arg);
        if found < min {
            return Err(NodeError::TooFewInputs {
                arg: arg.to_string(),
                required: min,
                found,
                source_loc: self.source.clone(),
            });
        }
        Ok(())
    }

    pub fn require_equal_list_lengths(&self, args: &[&str]) -> Result<(), NodeError> {
        let lengths: Vec<usize> = args.iter().map(|a| self.list_len(a)).collect();
        if lengths.windows(2).any(|w| w[0] != w[1]) {
            return Err(NodeError::LengthMismatch {
                args: args.iter().map(|a| a.to_string()).collect(),
                lengths,
                source_loc: self.source.clone(),
            });
        }
        Ok(())
    }

    /// List entries must be pairwise distinct; numbers compare by value, so
    /// 1 and 1.0 collide and so do -0.0 and 0.0
    pub fn require_unique_list_values(&self, arg: &str) -> Result<(), NodeError> {
        let Some(value) = self.get(arg) else {
            return Ok(());
        };
        let mut seen: FxHashSet<String> = FxHashSet::default();
        for item in value.items() {
            let key = match item.as_f64() {
                // Adding 0.0 folds -0.0 into 0.0
                Some(f) => format!("#{:016x}", (f + 0.0).to_bits()),
                None => item.to_string(),
            };
            if !seen.insert(key) {
                return Err(NodeError::DuplicateValue {
                    arg: arg.to_string(),
                    value: item.to_string(),
                    source_loc: self.source.clone(),
                });
            }
        }
        Ok(())
    }

    pub fn degenerate_threshold(&self, arg: &str) -> NodeError {
        NodeError::DegenerateThreshold {
            arg: arg.to_string(),
            source_loc: self.source.clone(),
        }
    }

    pub fn invalid_direction(&self, arg: &str, value: &str) -> NodeError {
        NodeError::InvalidDirection {
            arg: arg.to_string(),
            value: value.to_string(),
            source_loc: self.source.clone(),
        }
    }

    pub fn shape_error(&self, arg: &str, err: ShapeMismatch) -> NodeError {
        NodeError::ShapeMismatch {
            arg: arg.to_string(),
            left: err.left,
            right: err.right,
            source_loc: self.source.clone(),
        }
    }

    /// Fetch one input: present, of an allowed type, and a data layer
    pub fn input_layer(
        &self,
        ctx: &ResultContext,
        field: &str,
        allowed: &[DataType],
    ) -> Result<Arc<ExecutedNode>, NodeError> {
        let node = ctx.get(field, &self.source)?;
        self.require_is_data_layer(field, &node)?;
        self.require_type(field, &node, allowed)?;
        Ok(node)
    }

    /// Fetch every input named in `fields`, validated like `input_layer`
    pub fn input_layers(
        &self,
        ctx: &ResultContext,
        fields: &[String],
        allowed: &[DataType],
    ) -> Result<Vec<Arc<ExecutedNode>>, NodeError> {
        fields
            .iter()
            .map(|f| self.input_layer(ctx, f, allowed))
            .collect()
    }

    /// Left fold of several grids with OR-combined masks
    pub fn fold_grids(
        &self,
        arg: &str,
        grids: &[&Grid],
        f: impl Fn(f64, f64) -> f64,
    ) -> Result<Grid, NodeError> {
        let (first, rest) = match grids.split_first() {
            Some(split) => split,
            None => {
                return Err(NodeError::TooFewInputs {
                    arg: arg.to_string(),
                    required: 1,
                    found: 0,
                    source_loc: self.source.clone(),
                })
            }
        };
        let mut acc = (*first).clone();
        for g in rest {
            acc = acc
                .zip_with(g, MaskRule::Union, &f)
                .map_err(|e| self.shape_error(arg, e))?;
        }
        Ok(acc)
    }

    /// `sum(w_i * g_i)`: element 0 is applied once, then elements 1..N-1
    pub fn weighted_sum(
        &self,
        arg: &str,
        grids: &[&Grid],
        weights: &[f64],
    ) -> Result<Grid, NodeError> {
        let (first, rest) = match grids.split_first() {
            Some(split) => split,
            None => {
                return Err(NodeError::TooFewInputs {
                    arg: arg.to_string(),
                    required: 1,
                    found: 0,
                    source_loc: self.source.clone(),
                })
            }
        };
        let w0 = weights[0];
        let mut acc = first.map(|v| v * w0);
        for (g, &w) in rest.iter().zip(&weights[1..]) {
            acc = acc
                .zip_with(g, MaskRule::Union, |a, b| a + b * w)
                .map_err(|e| self.shape_error(arg, e))?;
        }
        Ok(acc)
    }
}

/// Grids of already-validated data layers
pub fn grids_of(nodes: &[Arc<ExecutedNode>]) -> Vec<&Grid> {
    nodes.iter().filter_map(|n| n.grid()).collect()
}
