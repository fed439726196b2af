use miette::Diagnostic;
use thiserror::Error;

use crate::ids::{BindingHandle, DenotedValueId};

/// Result type for tracer operations
pub type Result<T> = std::result::Result<T, Error>;

/// Custom error types for the promise tracer
#[derive(Error, Debug, Diagnostic, Clone, PartialEq)]
pub enum Error {
    #[error("I/O error: {0}")]
    #[diagnostic(code(promise_tracer::io_error))]
    Io(String),

    #[error("Cannot free argument of denoted value {id}: only the sentinel entry is left")]
    #[diagnostic(
        code(promise_tracer::argument_stack_underflow),
        help("the tracer freed more arguments than it made; call entry and exit events are out of sync")
    )]
    ArgumentStackUnderflow { id: DenotedValueId },

    #[error("Denoted value {id} is not currently an argument")]
    #[diagnostic(code(promise_tracer::not_an_argument))]
    NotAnArgument { id: DenotedValueId },

    #[error("Unknown binding handle {handle}")]
    #[diagnostic(
        code(promise_tracer::unknown_binding),
        help("every binding must be announced by a create event before it is used")
    )]
    UnknownBinding { handle: BindingHandle },

    #[error("Call exit without a matching call entry")]
    #[diagnostic(code(promise_tracer::call_stack_underflow))]
    CallStackUnderflow,

    #[error("Force exit for {found} does not match innermost force entry {expected:?}")]
    #[diagnostic(code(promise_tracer::force_stack_mismatch))]
    ForceStackMismatch {
        expected: Option<DenotedValueId>,
        found: DenotedValueId,
    },

    #[error("Parse error at line {line}: {message}")]
    #[diagnostic(code(promise_tracer::parse_error))]
    Parse { line: usize, message: String },

    #[error("Configuration error: {message}")]
    #[diagnostic(code(promise_tracer::config_error))]
    Config { message: String },

    #[error("Internal error: {message}")]
    #[diagnostic(code(promise_tracer::internal_error))]
    Internal { message: String },
}

impl Error {
    /// Create a parse error for a trace line
    pub fn parse(line: usize, message: impl Into<String>) -> Self {
        Error::Parse {
            line,
            message: message.into(),
        }
    }

    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Error::Config {
            message: message.into(),
        }
    }

    /// Create an internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Error::Internal {
            message: message.into(),
        }
    }

    /// Whether this error reports a broken precondition of the denoted value model,
    /// i.e. the event stream lost synchronisation with the host's call structure.
    pub fn is_precondition_violation(&self) -> bool {
        matches!(
            self,
            Error::ArgumentStackUnderflow { .. }
                | Error::NotAnArgument { .. }
                | Error::UnknownBinding { .. }
                | Error::CallStackUnderflow
                | Error::ForceStackMismatch { .. }
        )
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io(err.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Parse {
            line: err.line(),
            message: err.to_string(),
        }
    }
}
