//! Operator registry
//!
//! Maps operator names to constructors so a scheduler can turn parsed
//! commands into nodes without knowing the concrete operator types.

use rustc_hash::FxHashMap;

use crate::command::Command;
use crate::error::NodeError;
use crate::fuzzy::{
    CvtFromFuzzy, CvtToBinary, CvtToFuzzy, CvtToFuzzyCat, CvtToFuzzyCurve, CvtToFuzzyCurveZScore,
    CvtToFuzzyZScore, FuzzyAnd, FuzzyNot, FuzzyOr, FuzzySelectedUnion, FuzzyUnion,
    FuzzyWeightedUnion, FuzzyXOr,
};
use crate::node::{EvaluationNode, Operator, Signature};
use crate::ops::{
    self, ADividedByB, AMinusB, Maximum, Mean, Minimum, Multiply, Normalize, PrintVars, Sum,
    WeightedMean, WeightedSum,
};

type Constructor = fn(Command) -> Result<Box<dyn EvaluationNode>, NodeError>;

struct Entry {
    construct: Constructor,
    describe: fn() -> Signature,
}

fn construct<T: Operator>(command: Command) -> Result<Box<dyn EvaluationNode>, NodeError> {
    Ok(Box::new(T::from_command(command)?))
}

#[derive(Default)]
pub struct Registry {
    entries: FxHashMap<&'static str, Entry>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry holding every operator in this crate
    pub fn standard() -> Self {
        let mut registry = Self::new();

        macro_rules! register_all {
            ($($op:ty),* $(,)?) => {
                $( registry.register::<$op>(); )*
            };
        }

        // Arithmetic and aggregation
        register_all!(
            ops::Copy, AMinusB, ADividedByB, Sum, WeightedSum, Multiply, Minimum, Maximum, Mean,
            WeightedMean, Normalize, PrintVars,
        );

        // Fuzzy conversions
        register_all!(
            CvtToFuzzy, CvtToFuzzyZScore, CvtToFuzzyCat, CvtToFuzzyCurve, CvtToFuzzyCurveZScore,
            CvtToBinary, CvtFromFuzzy,
        );

        // Fuzzy set operators
        register_all!(
            FuzzyUnion, FuzzyWeightedUnion, FuzzySelectedUnion, FuzzyOr, FuzzyAnd, FuzzyXOr,
            FuzzyNot,
        );

        registry
    }

    /// Add an operator; a later registration under the same name replaces
    /// the earlier one
    pub fn register<T: Operator>(&mut self) -> &mut Self {
        self.entries.insert(
            T::NAME,
            Entry {
                construct: construct::<T>,
                describe: T::describe,
            },
        );
        self
    }

    pub fn contains(&self, operator: &str) -> bool {
        self.entries.contains_key(operator)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Construct the node for `command`, validating it against the
    /// operator's signature
    pub fn build(&self, command: Command) -> Result<Box<dyn EvaluationNode>, NodeError> {
        match self.entries.get(command.operator.as_str()) {
            Some(entry) => (entry.construct)(command),
            None => Err(NodeError::UnknownOperator {
                arg: command.operator.clone(),
                source_loc: command.source,
            }),
        }
    }

    pub fn describe(&self, operator: &str) -> Option<Signature> {
        self.entries.get(operator).map(|e| (e.describe)())
    }

    /// All signatures, sorted by operator name
    pub fn signatures(&self) -> Vec<Signature> {
        let mut names: Vec<&&'static str> = self.entries.keys().collect();
        names.sort();
        names
            .into_iter()
            .filter_map(|name| self.describe(name))
            .collect()
    }
}
