//! Command error types.

use thiserror::Error;

use crate::client::ClientError;
use crate::exitcode;

/// Terminal outcome of a failed command.
///
/// Every failure is classified exactly once. Only the binary entry point turns
/// the classification into a process exit code.
#[derive(Debug, Error)]
pub enum CommandError {
    /// Invalid invocation, detected before any cluster call.
    #[error("{0}")]
    BadArgs(String),

    /// The cluster call failed.
    #[error(transparent)]
    Operation(#[from] ClientError),

    /// Rendering the response failed.
    #[error("output error: {0}")]
    Output(String),
}

impl CommandError {
    /// Exit code for this error.
    #[must_use]
    pub const fn exit_code(&self) -> u8 {
        match self {
            Self::BadArgs(_) => exitcode::BAD_ARGS,
            Self::Operation(_) | Self::Output(_) => exitcode::ERROR,
        }
    }

    /// Whether this error was raised before any cluster call.
    #[must_use]
    pub const fn is_bad_args(&self) -> bool {
        matches!(self, Self::BadArgs(_))
    }
}

impl From<std::io::Error> for CommandError {
    fn from(err: std::io::Error) -> Self {
        Self::Output(err.to_string())
    }
}
