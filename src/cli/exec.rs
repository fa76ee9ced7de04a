//! Command execution: argument remapping, panic containment, and the
//! single-shot completion handshake between the dispatcher and a handler.

use std::cell::RefCell;
use std::fmt;
use std::fs::OpenOptions;
use std::io::Write;
use std::panic::{self, AssertUnwindSafe};

use serde_json::Value;
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

use super::node::{CommandTree, NodeId};
use super::options::{OptionValues, ParsedArgv};
use crate::config;
use crate::output::Output;

/// Name of the diagnostic dump written next to the config on failure.
const ERROR_FILE: &str = "nimbus.err";

/// What a handler receives: remapped positionals, remaining option values,
/// and the output sink for the run.
pub struct Invocation {
    /// One slot per declared positional, in declaration order. `None` means
    /// an optional positional was not supplied.
    pub positionals: Vec<Option<String>>,
    pub options: OptionValues,
    pub output: Output,
}

impl Invocation {
    pub fn positional(&self, index: usize) -> Option<&str> {
        self.positionals.get(index).and_then(|p| p.as_deref())
    }
}

/// Error surfaced by a handler.
#[derive(Debug, Clone, PartialEq)]
pub enum HandlerError {
    Message(String),
    /// Message plus structured detail carried into the diagnostic dump.
    Detailed { message: String, detail: Value },
    /// Raw payload; a human-readable message is fished out of it if present.
    Payload(Value),
}

impl HandlerError {
    pub fn msg(text: impl Into<String>) -> Self {
        HandlerError::Message(text.into())
    }
}

impl fmt::Display for HandlerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HandlerError::Message(m) => f.write_str(m),
            HandlerError::Detailed { message, .. } => f.write_str(message),
            HandlerError::Payload(value) => {
                let text = value
                    .get("message")
                    .or_else(|| value.get("Message"))
                    .and_then(Value::as_str)
                    .map(str::to_string)
                    .unwrap_or_else(|| value.to_string());
                f.write_str(&text)
            }
        }
    }
}

impl std::error::Error for HandlerError {}

impl From<anyhow::Error> for HandlerError {
    fn from(err: anyhow::Error) -> Self {
        HandlerError::Message(format!("{err:#}"))
    }
}

/// Single-shot completion token. A handler resolves it exactly once; the
/// first resolution wins and later ones are ignored.
pub struct Completion {
    state: RefCell<Option<Result<(), HandlerError>>>,
}

impl Completion {
    pub fn new() -> Self {
        Self {
            state: RefCell::new(None),
        }
    }

    pub fn ok(&self) {
        self.resolve(Ok(()));
    }

    pub fn fail(&self, err: HandlerError) {
        self.resolve(Err(err));
    }

    pub fn resolve(&self, result: Result<(), HandlerError>) {
        let mut state = self.state.borrow_mut();
        if state.is_none() {
            *state = Some(result);
        }
    }

    fn take(&self) -> Option<Result<(), HandlerError>> {
        self.state.borrow_mut().take()
    }
}

impl Default for Completion {
    fn default() -> Self {
        Self::new()
    }
}

pub type Handler = Box<dyn Fn(Invocation, &Completion)>;

/// Run a resolved command node against its parsed arguments. Returns the
/// process exit code.
pub fn execute(tree: &CommandTree, out: &Output, node: NodeId, parsed: ParsedArgv) -> i32 {
    let full = tree.full_name(node);
    if out.json {
        out.verbose(&format!("Executing command {full}"));
    } else {
        out.info(&format!("Executing command {full}"));
    }

    let command = tree.node(node);
    let ParsedArgv {
        mut positionals,
        mut values,
        ..
    } = parsed;

    // Remap declared positionals: an option value recorded under the same
    // name as a positional fills that slot, otherwise the next free
    // positional token does.
    let mut slots: Vec<Option<String>> = Vec::with_capacity(command.positionals.len());
    let mut free = positionals.drain(..);
    for spec in &command.positionals {
        if let Some(value) = values.remove(&spec.name) {
            slots.push(Some(value.into_string()));
        } else {
            slots.push(free.next());
        }
    }
    // Tokens left over once every declared slot is filled are as fatal as
    // unknown options.
    if let Some(extra) = free.next() {
        return report_failure(
            out,
            &full,
            &HandlerError::Message(format!("unexpected argument '{extra}'")),
        );
    }
    drop(free);

    for (slot, spec) in slots.iter().zip(&command.positionals) {
        if spec.required && slot.is_none() {
            return report_failure(
                out,
                &full,
                &HandlerError::Message(format!("missing required argument <{}>", spec.name)),
            );
        }
    }

    let handler = match &command.handler {
        Some(handler) => handler,
        None => {
            return report_failure(
                out,
                &full,
                &HandlerError::Message("command has no handler".to_string()),
            );
        }
    };

    let invocation = Invocation {
        positionals: slots,
        options: values,
        output: out.clone(),
    };

    let completion = Completion::new();
    let run = panic::catch_unwind(AssertUnwindSafe(|| handler(invocation, &completion)));
    if let Err(payload) = run {
        let message = payload
            .downcast_ref::<&str>()
            .map(|s| s.to_string())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "command panicked".to_string());
        completion.fail(HandlerError::Message(message));
    }

    match completion.take() {
        Some(Ok(())) => {
            if out.json {
                out.verbose(&format!("{full} command OK"));
            } else {
                out.info(&format!("{full} command OK"));
            }
            0
        }
        Some(Err(err)) => report_failure(out, &full, &err),
        None => {
            out.error(&format!("{full} did not signal completion"));
            1
        }
    }
}

fn report_failure(out: &Output, full: &str, err: &HandlerError) -> i32 {
    out.error(&err.to_string());
    if let Err(io_err) = record_error(full, err) {
        out.warn(&format!("could not write {ERROR_FILE}: {io_err}"));
    }
    out.error(&format!("{full} command failed"));
    1
}

/// Append a diagnostic record to `nimbus.err` in the config directory.
fn record_error(full: &str, err: &HandlerError) -> std::io::Result<()> {
    let dir = config::config_home();
    std::fs::create_dir_all(&dir)?;
    let path = dir.join(ERROR_FILE);
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;

    let stamp = OffsetDateTime::now_utc()
        .format(&Rfc3339)
        .unwrap_or_else(|_| "unknown-time".to_string());
    writeln!(file, "{stamp}: {full}")?;
    writeln!(file, "  {err}")?;
    if let HandlerError::Detailed { detail, .. } = err {
        writeln!(file, "  {detail}")?;
    }
    writeln!(file)?;
    Ok(())
}
