use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// Classifies errors for programmatic matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Recoverable error reported to the caller
    General,
    /// Unrecoverable error, aborts the current operation
    Fatal,
    /// Unrecoverable file I/O error
    FatalIo,
}

/// File operation that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IoOp {
    Read,
    Write,
}

impl fmt::Display for IoOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IoOp::Read => f.write_str("read"),
            IoOp::Write => f.write_str("write"),
        }
    }
}

/// genpac-util error types
#[derive(Error, Debug)]
pub enum Error {
    #[error("{message}")]
    General { message: String },

    #[error("{message}")]
    Fatal {
        message: String,
        #[source]
        cause: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Failed to {op} file '{}': {cause}", path.display())]
    FatalIo {
        op: IoOp,
        path: PathBuf,
        #[source]
        cause: std::io::Error,
    },
}

impl Error {
    /// Create a general (recoverable) error.
    pub fn general(message: impl Into<String>) -> Self {
        Error::General {
            message: message.into(),
        }
    }

    /// Create a fatal error without an underlying cause.
    pub fn fatal(message: impl Into<String>) -> Self {
        Error::Fatal {
            message: message.into(),
            cause: None,
        }
    }

    /// Create a fatal error wrapping the error that triggered it.
    pub fn fatal_with<E>(message: impl Into<String>, cause: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Error::Fatal {
            message: message.into(),
            cause: Some(Box::new(cause)),
        }
    }

    pub(crate) fn io(op: IoOp, path: impl Into<PathBuf>, cause: std::io::Error) -> Self {
        Error::FatalIo {
            op,
            path: path.into(),
            cause,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::General { .. } => ErrorKind::General,
            Error::Fatal { .. } => ErrorKind::Fatal,
            Error::FatalIo { .. } => ErrorKind::FatalIo,
        }
    }

    /// Fatal I/O errors are a specialization of fatal errors.
    pub fn is_fatal(&self) -> bool {
        matches!(self.kind(), ErrorKind::Fatal | ErrorKind::FatalIo)
    }
}

impl From<regex::Error> for Error {
    fn from(e: regex::Error) -> Self {
        Error::general(format!("Regex error: {}", e))
    }
}

pub type Result<T> = std::result::Result<T, Error>;
