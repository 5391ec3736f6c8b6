//! Model evaluation
//!
//! A `Model` is a set of input layers plus the nodes built from a model's
//! commands. Evaluation orders the nodes by their dependencies (Kahn's
//! algorithm, grouped into levels; ties keep declaration order) and runs each
//! level either sequentially or on the rayon pool. The first node failure
//! aborts the evaluation.

use anyhow::{anyhow, bail, Context, Result};
use rayon::prelude::*;
use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::{Duration, Instant};

use crate::command::Command;
use crate::context::{ExecutedNode, ResultContext};
use crate::error::{CommandSource, NodeError};
use crate::grid::Grid;
use crate::node::EvaluationNode;
use crate::registry::Registry;
use crate::types::DataType;

/// Outcome of a successful evaluation
#[derive(Debug, Clone)]
pub struct EvaluationSummary {
    pub inputs: usize,
    pub nodes_executed: usize,
    pub levels: usize,
    pub elapsed: Duration,
}

#[derive(Default)]
pub struct Model {
    inputs: Vec<ExecutedNode>,
    nodes: Vec<Box<dyn EvaluationNode>>,
}

impl Model {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build every command through `registry`, keeping declaration order
    pub fn from_commands(registry: &Registry, commands: Vec<Command>) -> Result<Self> {
        let mut model = Self::new();
        for command in commands {
            let name = command.result_name.clone();
            let node = registry
                .build(command)
                .with_context(|| format!("Failed to build node {}", name))?;
            model.add_node(node);
        }
        Ok(model)
    }

    /// Add a precomputed data layer, available to every node
    pub fn add_input(&mut self, layer: ExecutedNode) {
        self.inputs.push(layer);
    }

    pub fn add_node(&mut self, node: Box<dyn EvaluationNode>) {
        self.nodes.push(node);
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn nodes(&self) -> &[Box<dyn EvaluationNode>] {
        &self.nodes
    }

    /// Node indices grouped into dependency levels
    ///
    /// Every node in a level depends only on inputs and earlier levels, so the
    /// nodes of one level can run in any order. Within a level, indices are
    /// in declaration order.
    pub fn execution_levels(&self) -> Result<Vec<Vec<usize>>> {
        // STEP 1: result names must be unique across inputs and nodes
        let mut producers: FxHashMap<&str, usize> = FxHashMap::default();
        let input_names: FxHashSet<&str> = self.inputs.iter().map(|i| i.result_name()).collect();
        if input_names.len() != self.inputs.len() {
            bail!("Input layer names must be unique");
        }
        for (idx, node) in self.nodes.iter().enumerate() {
            let name = node.result_name();
            if input_names.contains(name) || producers.insert(name, idx).is_some() {
                bail!(
                    "Result {} is defined more than once\n{}",
                    name,
                    node.command().source
                );
            }
        }

        // STEP 2: edges from producer to consumer, one per distinct dependency
        let mut in_degree = vec![0usize; self.nodes.len()];
        let mut dependents: Vec<Vec<usize>> = vec![Vec::new(); self.nodes.len()];
        for (idx, node) in self.nodes.iter().enumerate() {
            let mut seen: FxHashSet<String> = FxHashSet::default();
            for dep in node.dependency_names() {
                if !seen.insert(dep.clone()) {
                    continue;
                }
                if let Some(&producer) = producers.get(dep.as_str()) {
                    in_degree[idx] += 1;
                    dependents[producer].push(idx);
                } else if !input_names.contains(dep.as_str()) {
                    bail!(
                        "{} depends on unknown result {}\n{}",
                        node.result_name(),
                        dep,
                        node.command().source
                    );
                }
            }
        }

        // STEP 3: peel off zero in-degree nodes level by level
        let mut levels: Vec<Vec<usize>> = Vec::new();
        let mut current: Vec<usize> = (0..self.nodes.len()).filter(|&i| in_degree[i] == 0).collect();
        let mut visited = 0;

        while !current.is_empty() {
            visited += current.len();
            let mut next = Vec::new();
            for &idx in &current {
                for &dependent in &dependents[idx] {
                    in_degree[dependent] -= 1;
                    if in_degree[dependent] == 0 {
                        next.push(dependent);
                    }
                }
            }
            next.sort_unstable();
            levels.push(std::mem::replace(&mut current, next));
        }

        if visited != self.nodes.len() {
            let cyclic: Vec<&str> = (0..self.nodes.len())
                .filter(|&i| in_degree[i] > 0)
                .map(|i| self.nodes[i].result_name())
                .collect();
            bail!("Dependency cycle among: {}", cyclic.join(", "));
        }

        Ok(levels)
    }

    /// Flattened execution order
    pub fn execution_order(&self) -> Result<Vec<usize>> {
        Ok(self.execution_levels()?.into_iter().flatten().collect())
    }

    /// Publish the inputs into `ctx` and execute every node
    pub fn evaluate(&self, ctx: &ResultContext, parallel: bool) -> Result<EvaluationSummary> {
        let start = Instant::now();
        let levels = self.execution_levels()?;

        for input in &self.inputs {
            ctx.insert(input.clone(), &CommandSource::default())
                .with_context(|| format!("Failed to inject input {}", input.result_name()))?;
        }

        for level in &levels {
            let run = |idx: &usize| -> Result<(), NodeError> { self.nodes[*idx].execute(ctx) };
            let outcome: Result<(), NodeError> = if parallel && level.len() > 1 {
                level.par_iter().map(run).collect()
            } else {
                level.iter().map(run).collect()
            };
            outcome.context("Model evaluation aborted")?;
        }

        let summary = EvaluationSummary {
            inputs: self.inputs.len(),
            nodes_executed: self.nodes.len(),
            levels: levels.len(),
            elapsed: start.elapsed(),
        };
        tracing::info!(
            "Evaluated {} nodes over {} inputs in {} levels ({:?}{})",
            summary.nodes_executed,
            summary.inputs,
            summary.levels,
            summary.elapsed,
            if parallel { ", parallel" } else { "" }
        );
        Ok(summary)
    }
}

// ============================================================================
// JSON model description
// ============================================================================

/// A named input grid in a model file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InputLayer {
    pub name: String,
    #[serde(rename = "type")]
    pub data_type: DataType,
    pub rows: Vec<Vec<f64>>,
    /// Same shape as `rows`; `true` marks nodata
    #[serde(default)]
    pub mask: Option<Vec<Vec<bool>>>,
}

impl InputLayer {
    pub fn to_layer(&self) -> Result<ExecutedNode> {
        let mut grid = Grid::from_rows(self.rows.clone())
            .with_context(|| format!("Invalid grid for input {}", self.name))?;
        if let Some(mask) = &self.mask {
            let ragged = mask.len() != self.rows.len()
                || mask.iter().zip(&self.rows).any(|(m, r)| m.len() != r.len());
            if ragged {
                bail!("Mask of input {} does not match its rows", self.name);
            }
            let flat: Vec<bool> = mask.iter().flatten().copied().collect();
            grid.replace_mask(&flat)
                .map_err(|e| anyhow!("Mask of input {}: {}", self.name, e))?;
        }
        Ok(ExecutedNode::layer(&self.name, grid, self.data_type))
    }
}

/// Inputs plus commands, as read by `evaluate_model`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelFile {
    #[serde(default)]
    pub inputs: Vec<InputLayer>,
    pub commands: Vec<Command>,
}

impl ModelFile {
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read model file: {:?}", path))?;
        serde_json::from_str(&contents).with_context(|| "Failed to parse model JSON")
    }

    pub fn into_model(self, registry: &Registry) -> Result<Model> {
        let mut model = Model::from_commands(registry, self.commands)?;
        for input in &self.inputs {
            model.add_input(input.to_layer()?);
        }
        Ok(model)
    }
}
