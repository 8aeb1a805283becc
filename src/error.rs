use std::{fmt, io};

/// Identifies the kind of a terminal [`CommandError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    Error,
    MissingArgument,
    OptionMissingArgument,
    MissingMandatoryOptionValue,
    ConflictingOption,
    UnknownOption,
    ExcessArguments,
    UnknownCommand,
    InvalidArgument,
    Help,
    HelpDisplayed,
    Version,
    ExecuteSubCommand,
}

impl ErrorCode {
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorCode::Error => "error",
            ErrorCode::MissingArgument => "missing-argument",
            ErrorCode::OptionMissingArgument => "option-missing-argument",
            ErrorCode::MissingMandatoryOptionValue => "missing-mandatory-option-value",
            ErrorCode::ConflictingOption => "conflicting-option",
            ErrorCode::UnknownOption => "unknown-option",
            ErrorCode::ExcessArguments => "excess-arguments",
            ErrorCode::UnknownCommand => "unknown-command",
            ErrorCode::InvalidArgument => "invalid-argument",
            ErrorCode::Help => "help",
            ErrorCode::HelpDisplayed => "help-displayed",
            ErrorCode::Version => "version",
            ErrorCode::ExecuteSubCommand => "execute-subcommand",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A user-facing error that ends the parse: the message has already been
/// written to the error sink by the time this value exists.
#[derive(Debug, thiserror::Error)]
#[error("{message}")]
pub struct CommandError {
    exit_code: i32,
    code: ErrorCode,
    message: String,
    #[source]
    nested: Option<io::Error>,
}

impl CommandError {
    pub fn new(exit_code: i32, code: ErrorCode, message: impl Into<String>) -> CommandError {
        CommandError { exit_code, code, message: message.into(), nested: None }
    }

    pub(crate) fn with_nested(mut self, err: io::Error) -> CommandError {
        self.nested = Some(err);
        self
    }

    pub fn exit_code(&self) -> i32 {
        self.exit_code
    }

    pub fn code(&self) -> ErrorCode {
        self.code
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn nested(&self) -> Option<&io::Error> {
        self.nested.as_ref()
    }
}

/// Returned by value parsers to reject a raw command-line value.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct InvalidArgumentError {
    message: String,
    exit_code: Option<i32>,
}

impl InvalidArgumentError {
    pub fn new(message: impl Into<String>) -> InvalidArgumentError {
        InvalidArgumentError { message: message.into(), exit_code: None }
    }

    pub fn with_exit_code(mut self, exit_code: i32) -> InvalidArgumentError {
        self.exit_code = Some(exit_code);
        self
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn exit_code(&self) -> Option<i32> {
        self.exit_code
    }
}

/// Misuse of the declaration API, detected while building the command tree.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DefinitionError {
    #[error("option creation failed due to no flags found in '{0}'")]
    NoFlags(String),
    #[error("option creation failed due to '{flag}' in option flags '{flags}'\n- {reason}")]
    BadFlag { flag: String, flags: String, reason: &'static str },
    #[error("Cannot add option '{flags}'{command} due to conflicting flag '{flag}'\n-  already used by option '{existing}'")]
    FlagConflict { flags: String, command: String, flag: String, existing: String },
    #[error("cannot add command '{new}' as already have command '{existing}'")]
    CommandConflict { new: String, existing: String },
    #[error("Command alias can't be the same as its name")]
    AliasIsName,
    #[error("Command passed to add_command() must have a name")]
    UnnamedCommand,
    #[error("only the last argument can be variadic '{0}'")]
    VariadicNotLast(String),
    #[error("a default value for a required argument is never used: '{0}'")]
    UnusedDefault(String),
    #[error("invalid argument syntax: '{0}'")]
    BadArgument(String),
    #[error("passThroughOptions cannot be used for '{0}' without turning on enablePositionalOptions for parent command(s)")]
    BrokenPassThrough(String),
}

/// Failure to start an executable subcommand.
#[derive(Debug, thiserror::Error)]
pub enum LaunchError {
    #[error("{0}")]
    Missing(String),
    #[error("'{0}' not executable")]
    NotExecutable(String),
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Exit(#[from] CommandError),
    #[error(transparent)]
    Definition(#[from] DefinitionError),
    #[error(transparent)]
    Launch(#[from] LaunchError),
    #[error(transparent)]
    Handler(Box<dyn std::error::Error + Send + Sync>),
}

impl Error {
    /// Wraps an error raised inside an action, hook or listener.
    pub fn handler(err: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Error {
        Error::Handler(err.into())
    }

    pub fn as_command_error(&self) -> Option<&CommandError> {
        match self {
            Error::Exit(it) => Some(it),
            _ => None,
        }
    }

    /// The exit code of a terminal error, `None` for everything else.
    pub fn exit_code(&self) -> Option<i32> {
        self.as_command_error().map(CommandError::exit_code)
    }

    pub fn code(&self) -> Option<ErrorCode> {
        self.as_command_error().map(CommandError::code)
    }
}
