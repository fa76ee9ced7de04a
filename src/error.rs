//! Error taxonomy for command resolution.
//!
//! All resolution failures converge on a single reporting path in the
//! entrypoint: the message is printed, contextual help is rendered, and the
//! process exits with code 1. Handler-side failures have their own type
//! ([`crate::cli::exec::HandlerError`]) because they carry structured
//! payloads rather than tree positions.

use thiserror::Error;

use crate::cli::node::NodeId;

/// Errors produced while tokenizing an argument vector against an option
/// scope. Unknown options are *not* an error at this layer; they are
/// collected into `ParsedArgv::unknown` and the dispatcher decides.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// A required-value option had no usable following token.
    #[error("option '{option}' requires a value")]
    MissingArgument {
        option: String,
        /// The flag-looking token that appeared where a value was expected,
        /// if any.
        flag: Option<String>,
    },
}

/// Errors produced by command-tree resolution.
#[derive(Debug, Error)]
pub enum CliError {
    /// The first non-option token matched no top-level category or command.
    #[error("'{name}' is not a nimbus command. See 'nimbus --help'.")]
    UnknownCategory {
        name: String,
        suggestion: Option<String>,
    },

    /// A token matched no child of the category reached so far.
    #[error("'{name}' is not a command in '{category}'.")]
    UnknownCommand {
        name: String,
        category: String,
        /// Node whose help should be rendered alongside the message.
        parent: NodeId,
        suggestion: Option<String>,
    },

    /// An option survived parsing without matching any declared spec.
    #[error("unknown option '{option}' for '{command}'")]
    UnknownOption { option: String, command: String },

    #[error(transparent)]
    Parse(#[from] ParseError),
}

impl CliError {
    /// "Did you mean" hint, when one was computed during resolution.
    pub fn suggestion(&self) -> Option<&str> {
        match self {
            CliError::UnknownCategory { suggestion, .. }
            | CliError::UnknownCommand { suggestion, .. } => suggestion.as_deref(),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_argument_message() {
        let err = ParseError::MissingArgument {
            option: "--endpoint-name".to_string(),
            flag: None,
        };
        assert_eq!(err.to_string(), "option '--endpoint-name' requires a value");
    }

    #[test]
    fn test_unknown_category_message() {
        let err = CliError::UnknownCategory {
            name: "vms".to_string(),
            suggestion: Some("vm".to_string()),
        };
        assert!(err.to_string().contains("'vms' is not a nimbus command"));
        assert_eq!(err.suggestion(), Some("vm"));
    }
}
