//! Command output for tasktrack.
//!
//! `--json` prints one envelope per invocation:
//!
//! ```text
//! { schema_version, command, status: "success" | "error",
//!   data | error, warnings?, next_steps? }
//! ```
//!
//! Text mode prints a titled block of aligned fields and rows on stdout.
//! Warnings and errors always go to stderr, even with `--quiet`.

use std::fmt;
use std::io::{self, Write};

use serde::Serialize;

use crate::error::{EntityKind, Error, Result};

pub const SCHEMA_VERSION: &str = "tasktrack.v1";

#[derive(Debug, Clone, Copy, Default)]
pub struct OutputOptions {
    pub json: bool,
    pub quiet: bool,
}

/// Text form of a command result
#[derive(Debug, Clone, Default)]
pub struct HumanOutput {
    title: String,
    fields: Vec<(String, String)>,
    rows: Vec<String>,
    warnings: Vec<String>,
    next_steps: Vec<String>,
}

impl HumanOutput {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    /// A labelled field. An empty value prints the label alone, as a flag.
    pub fn push_summary(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.fields.push((key.into(), value.into()));
    }

    /// One listed record, e.g. a task line.
    pub fn push_detail(&mut self, value: impl Into<String>) {
        self.rows.push(value.into());
    }

    pub fn push_warning(&mut self, value: impl Into<String>) {
        self.warnings.push(value.into());
    }

    pub fn push_next_step(&mut self, value: impl Into<String>) {
        self.next_steps.push(value.into());
    }

    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }
}

impl fmt::Display for HumanOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.title)?;

        let width = self
            .fields
            .iter()
            .map(|(key, _)| key.chars().count())
            .max()
            .unwrap_or(0);
        for (key, value) in &self.fields {
            if value.is_empty() {
                write!(f, "\n  {key}")?;
            } else {
                write!(f, "\n  {key:<width$}  {value}")?;
            }
        }

        if !self.rows.is_empty() {
            f.write_str("\n")?;
            for row in &self.rows {
                write!(f, "\n  {row}")?;
            }
        }

        if !self.next_steps.is_empty() {
            f.write_str("\n")?;
            for step in &self.next_steps {
                write!(f, "\nnext: {step}")?;
            }
        }
        Ok(())
    }
}

#[derive(Serialize)]
#[serde(rename_all = "lowercase")]
enum Status {
    Success,
    Error,
}

#[derive(Serialize)]
enum Body<'a, T: Serialize> {
    #[serde(rename = "data")]
    Data(&'a T),
    #[serde(rename = "error")]
    Error(ErrorBody),
}

#[derive(Serialize)]
struct ErrorBody {
    message: String,
    code: i32,
    kind: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<serde_json::Value>,
}

impl From<&Error> for ErrorBody {
    fn from(err: &Error) -> Self {
        Self {
            message: err.to_string(),
            code: err.exit_code(),
            kind: err.kind(),
            details: err.details(),
        }
    }
}

#[derive(Serialize)]
struct Envelope<'a, T: Serialize> {
    schema_version: &'static str,
    command: &'a str,
    status: Status,
    #[serde(flatten)]
    body: Body<'a, T>,
    #[serde(skip_serializing_if = "is_empty")]
    warnings: &'a [String],
    #[serde(skip_serializing_if = "is_empty")]
    next_steps: &'a [String],
}

fn is_empty(items: &&[String]) -> bool {
    items.is_empty()
}

fn print_envelope<T: Serialize>(envelope: &Envelope<'_, T>) -> Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    serde_json::to_writer_pretty(&mut out, envelope)?;
    writeln!(out)?;
    Ok(())
}

/// Print a successful result: the envelope with `--json`, otherwise the
/// text form unless `--quiet`.
pub fn emit_success<T: Serialize>(
    options: OutputOptions,
    command: &str,
    data: &T,
    human: Option<&HumanOutput>,
) -> Result<()> {
    if options.json {
        let (warnings, next_steps) = human
            .map(|h| (h.warnings.as_slice(), h.next_steps.as_slice()))
            .unwrap_or_default();
        return print_envelope(&Envelope {
            schema_version: SCHEMA_VERSION,
            command,
            status: Status::Success,
            body: Body::Data(data),
            warnings,
            next_steps,
        });
    }

    let Some(human) = human else {
        return Ok(());
    };
    for warning in &human.warnings {
        eprintln!("warning: {warning}");
    }
    if !options.quiet {
        println!("{human}");
    }
    Ok(())
}

pub fn emit_error(command: &str, err: &Error, json: bool) -> Result<()> {
    let next_steps = recovery_steps(command, err);
    if json {
        return print_envelope::<()>(&Envelope {
            schema_version: SCHEMA_VERSION,
            command,
            status: Status::Error,
            body: Body::Error(ErrorBody::from(err)),
            warnings: &[],
            next_steps: &next_steps,
        });
    }

    eprintln!("error: {err}");
    for step in &next_steps {
        eprintln!("hint: {step}");
    }
    Ok(())
}

/// Commands or actions that help after `err` in `command`.
pub fn recovery_steps(command: &str, err: &Error) -> Vec<String> {
    match err {
        Error::NotFound {
            kind: EntityKind::Project,
            ..
        } => vec!["tasktrack project list --all".to_string()],
        Error::NotFound {
            kind: EntityKind::Task,
            ..
        } => vec!["tasktrack task list".to_string()],
        Error::Validation(_) | Error::InvalidArgument(_) => {
            vec![format!("tasktrack {command} --help")]
        }
        Error::InvalidConfig(_) | Error::TomlParse(_) => {
            vec!["check --env and the file given by --config or TASKTRACK_CONFIG".to_string()]
        }
        Error::Integrity(_) | Error::Json(_) => {
            vec!["inspect projects.json and tasks.json in the data directory".to_string()]
        }
        Error::Io(_) => vec!["check that the data directory is writable, then retry".to_string()],
        Error::TomlSerialize(_) => Vec::new(),
    }
}
