/*!
Error types for [`parley`][crate].

Run time failures are all [`Error`]: usage errors (with their
[`UsageErrorKind`]), [`Abort`][Error::Abort], the help and exit control flow
outcomes, and opaque handler errors. Mistakes in the declaration of a command
are [`DeclarationError`], which is only ever returned from builders.
 */

use std::{fmt::Display, io};

use joinery::JoinableIterator;
use lazy_format::lazy_format;
use thiserror::Error;

/// Boxed error type for failures raised by handlers
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// The result of running a handler or invoking a command
pub type Result<T, E = Error> = std::result::Result<T, E>;

/**
What a usage error needs to know about the context it came from, so that it
can be rendered after that context is gone: the command path, the usage
synopsis, and the help option (if any) for the "Try ... for help" hint.
 */
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UsageHint {
    pub command_path: String,
    pub usage: String,
    pub help_option: Option<String>,
}

/// A specific parameter's value failed conversion or validation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{}", bad_parameter_message(.param_hint.as_deref(), .message))]
pub struct BadParameter {
    pub message: String,

    /// The user-facing name of the parameter, like `'--count'`. Filled in
    /// automatically when the error propagates through the parameter.
    pub param_hint: Option<String>,
}

impl BadParameter {
    pub fn new(message: impl Display) -> Self {
        Self {
            message: message.to_string(),
            param_hint: None,
        }
    }

    /// Attach a parameter hint, unless there's one already
    #[must_use]
    pub fn with_hint(mut self, hint: impl FnOnce() -> String) -> Self {
        if self.param_hint.is_none() {
            self.param_hint = Some(hint());
        }
        self
    }
}

fn bad_parameter_message<'a>(hint: Option<&'a str>, message: &'a str) -> impl Display + 'a {
    lazy_format!(match (hint) {
        Some(hint) => "Invalid value for {hint}: {message}",
        None => "Invalid value: {message}",
    })
}

/// Which kind of parameter was missing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
    Option,
    Argument,
}

impl Display for ParamKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            ParamKind::Option => "option",
            ParamKind::Argument => "argument",
        })
    }
}

/// The different ways an invocation can be malformed
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum UsageErrorKind {
    /// Something else; usually from `ctx.fail`
    #[error("{0}")]
    Message(String),

    /// An option-shaped token that no parameter declares
    #[error("No such option: {name}{}", suggestions(.possibilities))]
    NoSuchOption {
        name: String,
        possibilities: Vec<String>,
    },

    /// An option was used incorrectly, like missing its value
    #[error("{message}")]
    BadOptionUsage { option: String, message: String },

    /// Positional arguments were used incorrectly, like extra arguments
    #[error("{message}")]
    BadArgumentUsage { message: String },

    #[error(transparent)]
    BadParameter(BadParameter),

    /// A required parameter has no value from any source
    #[error("Missing {kind} {hint}.")]
    MissingParameter { kind: ParamKind, hint: String },

    /// The subcommand wasn't recognized by the group
    #[error("No such command '{name}'.{}", suggestions(.possibilities))]
    NoSuchCommand {
        name: String,
        possibilities: Vec<String>,
    },
}

fn suggestions(possibilities: &[String]) -> impl Display + '_ {
    lazy_format!(match (possibilities) {
        [] => "",
        [only] => " Did you mean {only}?",
        all => (
            " (Possible options: {all})",
            all = all.iter().join_with(", ")
        ),
    })
}

/// A malformed invocation, detected before any handler runs.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind}")]
pub struct UsageError {
    pub kind: UsageErrorKind,

    /// Information about the responsible context, for rendering
    pub hint: Option<Box<UsageHint>>,
}

impl UsageError {
    pub fn new(kind: UsageErrorKind) -> Self {
        Self { kind, hint: None }
    }
}

impl From<UsageErrorKind> for UsageError {
    fn from(kind: UsageErrorKind) -> Self {
        Self::new(kind)
    }
}

/// Everything that can go wrong (or deliberately stop) while running a
/// command.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// The invocation was malformed
    #[error(transparent)]
    Usage(#[from] UsageError),

    /// The user deliberately stopped, for instance by closing a prompt
    #[error("Aborted!")]
    Abort,

    /// A help message was printed in place of running the command
    #[error("help was displayed")]
    HelpShown,

    /// A handler or callback asked to exit with a specific status
    #[error("exit with status {0}")]
    Exit(i32),

    /// Reading a prompt response or writing output failed
    #[error("i/o error: {0}")]
    Io(#[from] io::Error),

    /// A handler failed. These are never interpreted by parley.
    #[error(transparent)]
    Handler(BoxError),
}

impl Error {
    /// A general usage error with a message
    pub fn usage(message: impl Display) -> Self {
        UsageErrorKind::Message(message.to_string()).into()
    }

    /// A validation failure. When returned from a parameter callback, the
    /// parameter's name is filled in automatically.
    pub fn bad_parameter(message: impl Display) -> Self {
        BadParameter::new(message).into()
    }

    /// Wrap an arbitrary error from a handler
    pub fn handler(error: impl Into<BoxError>) -> Self {
        Self::Handler(error.into())
    }

    #[must_use]
    pub fn as_usage(&self) -> Option<&UsageError> {
        match self {
            Self::Usage(error) => Some(error),
            _ => None,
        }
    }

    /// The process exit status for this error in standalone mode
    #[must_use]
    pub fn exit_code(&self) -> i32 {
        match *self {
            Self::Usage(_) => 2,
            Self::HelpShown => 0,
            Self::Exit(code) => code,
            Self::Abort | Self::Io(_) | Self::Handler(_) => 1,
        }
    }

    /// Attach a usage hint to a usage error, unless it already carries one
    /// from a more specific context.
    #[must_use]
    pub(crate) fn with_hint(self, hint: impl FnOnce() -> UsageHint) -> Self {
        match self {
            Self::Usage(UsageError { kind, hint: None }) => Self::Usage(UsageError {
                kind,
                hint: Some(Box::new(hint())),
            }),
            error => error,
        }
    }

    /// Name the parameter in a bad parameter error
    #[must_use]
    pub(crate) fn with_param_hint(self, hint: impl FnOnce() -> String) -> Self {
        match self {
            Self::Usage(UsageError {
                kind: UsageErrorKind::BadParameter(error),
                hint: usage,
            }) => Self::Usage(UsageError {
                kind: UsageErrorKind::BadParameter(error.with_hint(hint)),
                hint: usage,
            }),
            error => error,
        }
    }
}

impl From<UsageErrorKind> for Error {
    fn from(kind: UsageErrorKind) -> Self {
        Self::Usage(kind.into())
    }
}

impl From<BadParameter> for Error {
    fn from(error: BadParameter) -> Self {
        UsageErrorKind::BadParameter(error).into()
    }
}

/// A command or parameter was declared incorrectly. These come from
/// builders, never from parsing.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum DeclarationError {
    #[error("command {command:?}: parameter identifier {identifier:?} is declared more than once")]
    DuplicateIdentifier { command: String, identifier: String },

    #[error("command {command:?}: option name {name:?} is declared more than once")]
    DuplicateOptionName { command: String, name: String },

    #[error("command {command:?}: subcommand {name:?} is declared more than once")]
    DuplicateSubcommand { command: String, name: String },

    #[error("an option must have at least one name")]
    NoNames,

    #[error("{name:?} is not a valid option name")]
    InvalidOptionName { name: String },

    #[error("an option declares more than one explicit identifier ({first:?} and {second:?})")]
    MultipleIdentifiers { first: String, second: String },

    #[error("can't derive an identifier from {names:?}; give the option an explicit name")]
    NoIdentifier { names: Vec<String> },

    #[error("argument {name:?}: an argument takes exactly one value or is variadic")]
    InvalidArgumentArity { name: String },

    #[error("argument {name:?}: only the last argument may be variadic")]
    VariadicNotLast { name: String },

    #[error("option {name:?}: {message}")]
    InvalidOption { name: String, message: &'static str },

    #[error("parameter {name:?}: {message}")]
    InvalidType { name: String, message: String },

    #[error("group {command:?}: a chained group can't have optional arguments ({name:?})")]
    ChainedOptionalArgument { command: String, name: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_such_option_suggestions() {
        let single = UsageErrorKind::NoSuchOption {
            name: "--cout".into(),
            possibilities: Vec::from(["--count".into()]),
        };
        assert_eq!(single.to_string(), "No such option: --cout Did you mean --count?");

        let many = UsageErrorKind::NoSuchOption {
            name: "--co".into(),
            possibilities: Vec::from(["--count".into(), "--color".into()]),
        };
        assert_eq!(
            many.to_string(),
            "No such option: --co (Possible options: --count, --color)"
        );
    }

    #[test]
    fn parameter_hints_are_attached_once() {
        let error = Error::bad_parameter("'x' is not a valid integer.")
            .with_param_hint(|| "'--count'".into())
            .with_param_hint(|| "'--other'".into());

        assert_eq!(
            error.to_string(),
            "Invalid value for '--count': 'x' is not a valid integer."
        );
    }

    #[test]
    fn exit_codes() {
        assert_eq!(Error::usage("bad").exit_code(), 2);
        assert_eq!(Error::Abort.exit_code(), 1);
        assert_eq!(Error::HelpShown.exit_code(), 0);
        assert_eq!(Error::Exit(3).exit_code(), 3);
    }
}
