//! Error types.
//!
//! There are two disjoint families. [`StructuralError`] is a mistake in the
//! declared command tree and is returned by the builder methods. [`ParseError`]
//! is a mistake in the user's command line; it is reported (and swallowed) by
//! [`Command::parse`](crate::Command::parse).

use thiserror::Error;

/// A problem with the declared command tree.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StructuralError {
    #[error("Command '{0}' is already declared")]
    DuplicateCommand(String),

    #[error("Option '{0}' is already declared")]
    DuplicateOption(String),

    #[error("Arguments of '{0}' are already declared")]
    ArgumentsAlreadyDeclared(String),

    #[error("Required argument '{0}' after optional arguments")]
    RequiredAfterOptional(String),

    #[error("Variadic argument '{0}' must be the last argument")]
    VariadicNotLast(String),

    #[error("Invalid argument declaration '{0}'")]
    InvalidArgument(String),

    #[error("Option alias must begin with `-`: '{0}'")]
    InvalidOptionAlias(String),

    #[error("Option declaration has no aliases: '{0}'")]
    EmptyOption(String),

    #[error("Option argument can't be a literal: '{0}'")]
    LiteralOptionArgument(String),

    #[error("Invalid command name: '{0}'")]
    InvalidCommandName(String),

    #[error("No argument named '{0}'")]
    NoSuchArgument(String),

    #[error("You must set a version first")]
    VersionNotSet,
}

/// A problem with the command line being parsed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("Unknown option '{0}'")]
    UnknownOption(String),

    #[error("Too many arguments")]
    TooManyArguments,

    #[error("Missing required argument '{0}'")]
    MissingArgument(String),

    #[error("Missing required argument '{argument}' for option '{option}'")]
    MissingOptionArgument { argument: String, option: String },

    #[error("Invalid value '{value}' for '{argument}' argument")]
    InvalidValue { value: String, argument: String },

    #[error("Can't parse '{argument}', {reason}")]
    Conversion { argument: String, reason: String },

    #[error("Expected '{expected}', got '{found}'")]
    ExpectedLiteral { expected: String, found: String },

    #[error("No command chosen")]
    NoCommandSelected,
}

impl ParseError {
    /// Whether a value parser rejected the value.
    pub fn is_validation(&self) -> bool {
        matches!(self, ParseError::InvalidValue { .. } | ParseError::Conversion { .. })
    }
}

/// Why [`Command::try_parse`](crate::Command::try_parse) failed.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Parse(#[from] ParseError),

    /// A handler (action, side effect, unknown option handler) failed with
    /// something other than a [`ParseError`].
    #[error(transparent)]
    Handler(anyhow::Error),
}

impl Error {
    pub(crate) fn from_handler(err: anyhow::Error) -> Error {
        match err.downcast::<ParseError>() {
            Ok(it) => Error::Parse(it),
            Err(err) => Error::Handler(err),
        }
    }

    pub fn as_parse_error(&self) -> Option<&ParseError> {
        match self {
            Error::Parse(it) => Some(it),
            Error::Handler(_) => None,
        }
    }
}
