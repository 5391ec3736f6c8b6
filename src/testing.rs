//! Shared fixtures for unit tests

use crate::config::FuzzyRange;
use crate::context::{ExecutedNode, ResultContext};
use crate::error::CommandSource;
use crate::grid::Grid;
use crate::types::DataType;

pub fn layer(name: &str, values: Vec<f64>, data_type: DataType) -> ExecutedNode {
    ExecutedNode::layer(name, Grid::from_row(values), data_type)
}

pub fn masked_layer(name: &str, values: Vec<f64>, mask: Vec<bool>, data_type: DataType) -> ExecutedNode {
    let n = values.len();
    let grid = Grid::with_mask(1, n, values, mask).expect("valid test grid");
    ExecutedNode::layer(name, grid, data_type)
}

/// Context with the default -1..+1 fuzzy range
pub fn context(nodes: Vec<ExecutedNode>) -> ResultContext {
    context_with_range(nodes, FuzzyRange::default())
}

pub fn context_with_range(nodes: Vec<ExecutedNode>, range: FuzzyRange) -> ResultContext {
    let ctx = ResultContext::new(range);
    for node in nodes {
        ctx.insert(node, &CommandSource::default()).expect("unique test layer");
    }
    ctx
}
