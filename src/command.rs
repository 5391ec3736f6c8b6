//! Parsed command descriptors
//!
//! A `Command` is what the host engine hands over for each model statement:
//! the result name, the operator name, already-parsed argument values and the
//! statement's source location. Accessors re-check the primitive kind of each
//! argument and convert scalars to one-element lists where a list is accepted.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{CommandSource, NodeError};

/// One parsed argument value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ArgValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    List(Vec<ArgValue>),
}

impl ArgValue {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            ArgValue::Int(i) => Some(*i as f64),
            ArgValue::Float(f) => Some(*f),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            ArgValue::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            ArgValue::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Elements of a list; a scalar is a list of one
    pub fn items(&self) -> Vec<&ArgValue> {
        match self {
            ArgValue::List(items) => items.iter().collect(),
            other => vec![other],
        }
    }

    pub fn is_list(&self) -> bool {
        matches!(self, ArgValue::List(_))
    }
}

impl fmt::Display for ArgValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgValue::Bool(b) => write!(f, "{}", b),
            ArgValue::Int(i) => write!(f, "{}", i),
            ArgValue::Float(x) => write!(f, "{}", x),
            ArgValue::Str(s) => f.write_str(s),
            ArgValue::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ",")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, "]")
            }
        }
    }
}

impl From<f64> for ArgValue {
    fn from(v: f64) -> Self {
        ArgValue::Float(v)
    }
}

impl From<i64> for ArgValue {
    fn from(v: i64) -> Self {
        ArgValue::Int(v)
    }
}

impl From<&str> for ArgValue {
    fn from(v: &str) -> Self {
        ArgValue::Str(v.to_string())
    }
}

impl<T: Into<ArgValue>> From<Vec<T>> for ArgValue {
    fn from(v: Vec<T>) -> Self {
        ArgValue::List(v.into_iter().map(Into::into).collect())
    }
}

/// A parsed model statement
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Command {
    pub result_name: String,
    pub operator: String,
    #[serde(default)]
    pub args: FxHashMap<String, ArgValue>,
    #[serde(default)]
    pub source: CommandSource,
}

impl Command {
    pub fn new(result_name: &str, operator: &str) -> Self {
        Self {
            result_name: result_name.to_string(),
            operator: operator.to_string(),
            args: FxHashMap::default(),
            source: CommandSource::default(),
        }
    }

    /// Builder-style argument setter
    pub fn arg(mut self, name: &str, value: impl Into<ArgValue>) -> Self {
        self.args.insert(name.to_string(), value.into());
        self
    }

    /// Builder-style source location setter
    pub fn at(mut self, file: &str, line: usize, raw: &str) -> Self {
        self.source = CommandSource {
            file: file.to_string(),
            line,
            raw: raw.to_string(),
        };
        self
    }

    pub fn get(&self, name: &str) -> Option<&ArgValue> {
        self.args.get(name)
    }

    pub fn has(&self, name: &str) -> bool {
        self.args.contains_key(name)
    }

    pub fn require(&self, name: &str) -> Result<&ArgValue, NodeError> {
        self.args.get(name).ok_or_else(|| NodeError::MissingArgument {
            arg: name.to_string(),
            source_loc: self.source.clone(),
        })
    }

    pub(crate) fn invalid(&self, name: &str, reason: impl Into<String>) -> NodeError {
        NodeError::InvalidArgument {
            arg: name.to_string(),
            reason: reason.into(),
            source_loc: self.source.clone(),
        }
    }

    /// Number of entries in a list argument (scalar = 1, absent = 0)
    pub fn list_len(&self, name: &str) -> usize {
        self.get(name).map_or(0, |v| v.items().len())
    }

    pub fn field_name(&self, name: &str) -> Result<String, NodeError> {
        self.string(name)
    }

    /// Field name list; a single name counts as a list of one
    pub fn field_names(&self, name: &str) -> Result<Vec<String>, NodeError> {
        self.require(name)?
            .items()
            .into_iter()
            .map(|v| {
                v.as_str()
                    .map(str::to_string)
                    .ok_or_else(|| self.invalid(name, format!("expected field name, got {}", v)))
            })
            .collect()
    }

    /// Field name list, empty when the argument is absent
    pub fn optional_field_names(&self, name: &str) -> Result<Vec<String>, NodeError> {
        if self.has(name) {
            self.field_names(name)
        } else {
            Ok(Vec::new())
        }
    }

    pub fn float(&self, name: &str) -> Result<f64, NodeError> {
        let v = self.require(name)?;
        v.as_f64()
            .ok_or_else(|| self.invalid(name, format!("expected number, got {}", v)))
    }

    pub fn optional_float(&self, name: &str) -> Result<Option<f64>, NodeError> {
        if self.has(name) {
            self.float(name).map(Some)
        } else {
            Ok(None)
        }
    }

    pub fn float_list(&self, name: &str) -> Result<Vec<f64>, NodeError> {
        self.require(name)?
            .items()
            .into_iter()
            .map(|v| {
                v.as_f64()
                    .ok_or_else(|| self.invalid(name, format!("expected number, got {}", v)))
            })
            .collect()
    }

    pub fn int(&self, name: &str) -> Result<i64, NodeError> {
        let v = self.require(name)?;
        v.as_i64()
            .ok_or_else(|| self.invalid(name, format!("expected integer, got {}", v)))
    }

    pub fn int_list(&self, name: &str) -> Result<Vec<i64>, NodeError> {
        self.require(name)?
            .items()
            .into_iter()
            .map(|v| {
                v.as_i64()
                    .ok_or_else(|| self.invalid(name, format!("expected integer, got {}", v)))
            })
            .collect()
    }

    pub fn string(&self, name: &str) -> Result<String, NodeError> {
        let v = self.require(name)?;
        v.as_str()
            .map(str::to_string)
            .ok_or_else(|| self.invalid(name, format!("expected text, got {}", v)))
    }

    pub fn optional_string(&self, name: &str) -> Result<Option<String>, NodeError> {
        if self.has(name) {
            self.string(name).map(Some)
        } else {
            Ok(None)
        }
    }
}
