//! PrintVars sink
//!
//! Writes one `name: value` line per referenced result, to `OutFileName`
//! when given and to stdout otherwise. The node itself is not a data layer;
//! its value is `true` so later statements can list it as a precursor.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use crate::command::Command;
use crate::context::{ExecutedNode, NodeValue, ResultContext};
use crate::error::NodeError;
use crate::node::{node_boilerplate, ArgKind, EvaluationNode, Operator, Signature};
use crate::types::DataType;

#[derive(Debug)]
pub struct PrintVars {
    command: Command,
    fields: Vec<String>,
    out_file: Option<String>,
}

fn write_lines(out: &mut impl Write, lines: &[String]) -> io::Result<()> {
    for line in lines {
        writeln!(out, "{}", line)?;
    }
    out.flush()
}

impl Operator for PrintVars {
    const NAME: &'static str = "PrintVars";

    fn describe() -> Signature {
        Signature::new(
            Self::NAME,
            "Print Variables",
            "Prints variables to a file or to standard output",
        )
        .returns(&[DataType::Bool])
        .required("InFieldNames", &[ArgKind::FieldName, ArgKind::FieldNameList])
    }

    fn from_command(command: Command) -> Result<Self, NodeError> {
        Self::describe().check(&command)?;
        let fields = command.field_names("InFieldNames")?;
        let out_file = command.optional_string("OutFileName")?;
        Ok(Self { command, fields, out_file })
    }
}

impl EvaluationNode for PrintVars {
    node_boilerplate!();

    fn compute(&self, ctx: &ResultContext) -> Result<ExecutedNode, NodeError> {
        let cmd = &self.command;

        let mut lines = Vec::with_capacity(self.fields.len());
        for field in &self.fields {
            let node = ctx.get(field, &cmd.source)?;
            lines.push(format!("{}: {}", field, node.result()));
        }

        match &self.out_file {
            Some(path) => {
                let file = File::create(Path::new(path))
                    .map_err(|e| cmd.invalid("OutFileName", format!("cannot create {}: {}", path, e)))?;
                write_lines(&mut BufWriter::new(file), &lines)
                    .map_err(|e| cmd.invalid("OutFileName", format!("cannot write {}: {}", path, e)))?;
                tracing::debug!("Wrote {} variables to {}", lines.len(), path);
            }
            None => {
                let stdout = io::stdout();
                write_lines(&mut stdout.lock(), &lines)
                    .map_err(|e| cmd.invalid("InFieldNames", format!("cannot write to stdout: {}", e)))?;
            }
        }

        Ok(ExecutedNode::new(
            self.result_name(),
            NodeValue::Bool(true),
            DataType::Bool,
            false,
        ))
    }
}
