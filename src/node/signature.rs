//! Operator self-description
//!
//! Each operator publishes a static `Signature`: display name, short
//! description, return type(s) and the semantic kind of every required and
//! optional argument. External validators and doc generators consume it as
//! plain metadata; inside the crate it is also the schema every command is
//! checked against when a node is constructed.

use serde::Serialize;

use crate::command::{ArgValue, Command};
use crate::error::NodeError;
use crate::types::DataType;

/// Semantic kind of an argument value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ArgKind {
    #[serde(rename = "Field Name")]
    FieldName,
    #[serde(rename = "Field Name List")]
    FieldNameList,
    Float,
    #[serde(rename = "Float List")]
    FloatList,
    Integer,
    #[serde(rename = "Integer List")]
    IntegerList,
    #[serde(rename = "Positive Integer")]
    PositiveInteger,
    #[serde(rename = "Fuzzy Value")]
    FuzzyValue,
    #[serde(rename = "Fuzzy Value List")]
    FuzzyValueList,
    Direction,
    #[serde(rename = "Truest Or Falsest")]
    TruestOrFalsest,
    #[serde(rename = "File Name")]
    FileName,
    Any,
}

impl ArgKind {
    pub fn name(&self) -> &'static str {
        match self {
            ArgKind::FieldName => "Field Name",
            ArgKind::FieldNameList => "Field Name List",
            ArgKind::Float => "Float",
            ArgKind::FloatList => "Float List",
            ArgKind::Integer => "Integer",
            ArgKind::IntegerList => "Integer List",
            ArgKind::PositiveInteger => "Positive Integer",
            ArgKind::FuzzyValue => "Fuzzy Value",
            ArgKind::FuzzyValueList => "Fuzzy Value List",
            ArgKind::Direction => "Direction",
            ArgKind::TruestOrFalsest => "Truest Or Falsest",
            ArgKind::FileName => "File Name",
            ArgKind::Any => "Any",
        }
    }

    /// Primitive-kind check; semantic checks (direction spelling, fuzzy
    /// range) happen when the node executes
    pub fn accepts(&self, value: &ArgValue) -> bool {
        let all = |pred: fn(&ArgValue) -> bool| match value {
            ArgValue::List(items) => items.iter().all(pred),
            _ => false,
        };
        match self {
            ArgKind::FieldName | ArgKind::FileName | ArgKind::TruestOrFalsest => {
                value.as_str().is_some()
            }
            ArgKind::Direction => !value.is_list(),
            ArgKind::FieldNameList => all(|v| v.as_str().is_some()),
            ArgKind::Float | ArgKind::FuzzyValue => value.as_f64().is_some(),
            ArgKind::FloatList | ArgKind::FuzzyValueList => all(|v| v.as_f64().is_some()),
            ArgKind::Integer => value.as_i64().is_some(),
            ArgKind::IntegerList => all(|v| v.as_i64().is_some()),
            ArgKind::PositiveInteger => value.as_i64().map_or(false, |i| i > 0),
            ArgKind::Any => true,
        }
    }

    /// Kinds whose values name other results
    pub fn is_field_reference(&self) -> bool {
        matches!(self, ArgKind::FieldName | ArgKind::FieldNameList)
    }
}

/// One declared argument and the kinds it may take
#[derive(Debug, Clone, Serialize)]
pub struct ArgSpec {
    pub name: &'static str,
    pub kinds: Vec<ArgKind>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Signature {
    pub operator: &'static str,
    pub display_name: &'static str,
    pub short_desc: &'static str,
    pub return_types: Vec<DataType>,
    pub required: Vec<ArgSpec>,
    pub optional: Vec<ArgSpec>,
}

impl Signature {
    /// New signature with the optional arguments every operator accepts
    pub fn new(operator: &'static str, display_name: &'static str, short_desc: &'static str) -> Self {
        Self {
            operator,
            display_name,
            short_desc,
            return_types: Vec::new(),
            required: Vec::new(),
            optional: vec![
                ArgSpec { name: "OutFileName", kinds: vec![ArgKind::FileName] },
                ArgSpec { name: "Metadata", kinds: vec![ArgKind::Any] },
                ArgSpec {
                    name: "PrecursorFieldNames",
                    kinds: vec![ArgKind::FieldName, ArgKind::FieldNameList],
                },
            ],
        }
    }

    pub fn returns(mut self, types: &[DataType]) -> Self {
        self.return_types = types.to_vec();
        self
    }

    pub fn required(mut self, name: &'static str, kinds: &[ArgKind]) -> Self {
        self.required.push(ArgSpec { name, kinds: kinds.to_vec() });
        self
    }

    pub fn optional(mut self, name: &'static str, kinds: &[ArgKind]) -> Self {
        self.optional.push(ArgSpec { name, kinds: kinds.to_vec() });
        self
    }

    pub fn spec(&self, name: &str) -> Option<&ArgSpec> {
        self.required
            .iter()
            .chain(self.optional.iter())
            .find(|s| s.name == name)
    }

    /// Check a command against this schema
    ///
    /// Every required argument must be present, no undeclared argument may
    /// appear, and each value must match one of its declared kinds.
    pub fn check(&self, command: &Command) -> Result<(), NodeError> {
        for spec in &self.required {
            command.require(spec.name)?;
        }

        // Sorted for a stable error when several arguments are bad
        let mut names: Vec<&String> = command.args.keys().collect();
        names.sort();

        for name in names {
            let value = &command.args[name];
            let spec = self.spec(name).ok_or_else(|| {
                command.invalid(name, format!("not an argument of {}", self.operator))
            })?;
            if !spec.kinds.iter().any(|k| k.accepts(value)) {
                let expected: Vec<&str> = spec.kinds.iter().map(|k| k.name()).collect();
                return Err(command.invalid(
                    name,
                    format!("expected {}, got {}", expected.join(" or "), value),
                ));
            }
        }
        Ok(())
    }

    /// Result names referenced by a command, in declaration order
    pub fn field_references(&self, command: &Command) -> Vec<String> {
        self.required
            .iter()
            .chain(self.optional.iter())
            .filter(|s| s.kinds.iter().any(|k| k.is_field_reference()))
            .filter_map(|s| command.get(s.name))
            .flat_map(|v| v.items().into_iter().filter_map(|i| i.as_str().map(str::to_string)))
            .collect()
    }
}
