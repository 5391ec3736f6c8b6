//! Append-only result context
//!
//! Maps result names to executed nodes. Each name is written exactly once and
//! never replaced; readers only ever look up names that a dependency has
//! already written. The map sits behind an `RwLock` so independent branches
//! of a model can be evaluated on different threads.

use rustc_hash::FxHashMap;
use std::fmt;
use std::sync::{Arc, RwLock};

use crate::config::FuzzyRange;
use crate::error::{CommandSource, NodeError};
use crate::grid::Grid;
use crate::types::DataType;

/// Value produced by a node
#[derive(Debug, Clone, PartialEq)]
pub enum NodeValue {
    Grid(Grid),
    /// Sink nodes (PrintVars) produce a flag, not a grid
    Bool(bool),
}

impl NodeValue {
    pub fn as_grid(&self) -> Option<&Grid> {
        match self {
            NodeValue::Grid(g) => Some(g),
            NodeValue::Bool(_) => None,
        }
    }
}

impl fmt::Display for NodeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeValue::Grid(g) => write!(f, "{}", g),
            NodeValue::Bool(true) => f.write_str("True"),
            NodeValue::Bool(false) => f.write_str("False"),
        }
    }
}

/// Immutable record of one executed node
#[derive(Debug, Clone, PartialEq)]
pub struct ExecutedNode {
    result_name: String,
    value: NodeValue,
    data_type: DataType,
    is_data_layer: bool,
}

impl ExecutedNode {
    pub fn new(result_name: &str, value: NodeValue, data_type: DataType, is_data_layer: bool) -> Self {
        Self {
            result_name: result_name.to_string(),
            value,
            data_type,
            is_data_layer,
        }
    }

    /// A grid-producing node
    pub fn layer(result_name: &str, grid: Grid, data_type: DataType) -> Self {
        Self::new(result_name, NodeValue::Grid(grid), data_type, true)
    }

    pub fn result_name(&self) -> &str {
        &self.result_name
    }

    pub fn result(&self) -> &NodeValue {
        &self.value
    }

    /// The result grid; None for sink nodes
    pub fn grid(&self) -> Option<&Grid> {
        self.value.as_grid()
    }

    pub fn data_type(&self) -> DataType {
        self.data_type
    }

    pub fn is_data_layer(&self) -> bool {
        self.is_data_layer
    }
}

/// Shared, write-once map of executed results
#[derive(Debug, Default)]
pub struct ResultContext {
    fuzzy: FuzzyRange,
    results: RwLock<FxHashMap<String, Arc<ExecutedNode>>>,
}

impl ResultContext {
    pub fn new(fuzzy: FuzzyRange) -> Self {
        Self {
            fuzzy,
            results: RwLock::new(FxHashMap::default()),
        }
    }

    pub fn fuzzy_range(&self) -> FuzzyRange {
        self.fuzzy
    }

    /// Look up an executed result
    ///
    /// `source` identifies the reading command for the error message.
    pub fn get(&self, name: &str, source: &CommandSource) -> Result<Arc<ExecutedNode>, NodeError> {
        let results = self.results.read().unwrap_or_else(|e| e.into_inner());
        results
            .get(name)
            .cloned()
            .ok_or_else(|| NodeError::MissingResult {
                arg: name.to_string(),
                source_loc: source.clone(),
            })
    }

    pub fn contains(&self, name: &str) -> bool {
        let results = self.results.read().unwrap_or_else(|e| e.into_inner());
        results.contains_key(name)
    }

    /// Publish a result; a second write under the same name is rejected
    pub fn insert(&self, node: ExecutedNode, source: &CommandSource) -> Result<(), NodeError> {
        let mut results = self.results.write().unwrap_or_else(|e| e.into_inner());
        if results.contains_key(node.result_name()) {
            return Err(NodeError::DuplicateResult {
                arg: node.result_name().to_string(),
                source_loc: source.clone(),
            });
        }
        results.insert(node.result_name().to_string(), Arc::new(node));
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.results.read().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Sorted list of result names
    pub fn names(&self) -> Vec<String> {
        let results = self.results.read().unwrap_or_else(|e| e.into_inner());
        let mut names: Vec<String> = results.keys().cloned().collect();
        names.sort();
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_once() {
        let ctx = ResultContext::new(FuzzyRange::default());
        let src = CommandSource::default();
        let node = ExecutedNode::layer("A", Grid::from_row(vec![1.0]), DataType::PositiveFloat);

        ctx.insert(node.clone(), &src).unwrap();
        assert!(matches!(
            ctx.insert(node, &src),
            Err(NodeError::DuplicateResult { .. })
        ));
        assert_eq!(ctx.len(), 1);
    }

    #[test]
    fn test_missing_result() {
        let ctx = ResultContext::new(FuzzyRange::default());
        let err = ctx.get("Nope", &CommandSource::default()).unwrap_err();
        assert_eq!(err.arg(), "Nope");
    }

    #[test]
    fn test_concurrent_readers_and_writers() {
        let ctx = Arc::new(ResultContext::new(FuzzyRange::default()));
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let ctx = Arc::clone(&ctx);
                std::thread::spawn(move || {
                    let name = format!("L{}", i);
                    let node = ExecutedNode::layer(&name, Grid::from_row(vec![i as f64]), DataType::Float);
                    ctx.insert(node, &CommandSource::default()).unwrap();
                    assert!(ctx.contains(&name));
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(ctx.len(), 8);
    }
}
