//! Error types for the OS abstraction.

use std::io;

use thiserror::Error;

/// Category of a filesystem failure, independent of the wrapping message.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    #[error("file exists")]
    Exists,

    #[error("file does not exist")]
    NotExist,

    #[error("not a directory")]
    NotDirectory,

    #[error("not a file")]
    NotFile,

    #[error("directory not empty")]
    NotEmpty,

    #[error("operation failed")]
    OperationFailed,
}

impl From<io::ErrorKind> for ErrorKind {
    fn from(kind: io::ErrorKind) -> Self {
        match kind {
            io::ErrorKind::AlreadyExists => ErrorKind::Exists,
            io::ErrorKind::NotFound => ErrorKind::NotExist,
            io::ErrorKind::NotADirectory => ErrorKind::NotDirectory,
            io::ErrorKind::IsADirectory => ErrorKind::NotFile,
            io::ErrorKind::DirectoryNotEmpty => ErrorKind::NotEmpty,
            _ => ErrorKind::OperationFailed,
        }
    }
}

/// Errors returned by [`Os`](crate::Os) implementations and their handles.
#[derive(Error, Debug)]
pub enum OsaError {
    #[error("{op} {path}: {kind}")]
    Path {
        op: &'static str,
        path: String,
        kind: ErrorKind,
    },

    #[error("{op} {path}: {source}")]
    Io {
        op: &'static str,
        path: String,
        #[source]
        source: io::Error,
    },

    #[error("file already closed")]
    Closed,

    #[error("End of file")]
    Eof,

    #[error("ZIP error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl OsaError {
    pub(crate) fn path(op: &'static str, path: impl Into<String>, kind: ErrorKind) -> Self {
        OsaError::Path {
            op,
            path: path.into(),
            kind,
        }
    }

    pub(crate) fn io(op: &'static str, path: impl Into<String>, source: io::Error) -> Self {
        OsaError::Io {
            op,
            path: path.into(),
            source,
        }
    }

    /// The failure category, if this error carries one.
    ///
    /// Handle misuse, end-of-stream and archive errors have no category.
    pub fn kind(&self) -> Option<ErrorKind> {
        match self {
            OsaError::Path { kind, .. } => Some(*kind),
            OsaError::Io { source, .. } => Some(source.kind().into()),
            _ => None,
        }
    }

    /// Reports whether the error says a file or directory already exists.
    pub fn is_exist(&self) -> bool {
        self.kind() == Some(ErrorKind::Exists)
    }

    /// Reports whether the error says a file or directory does not exist.
    pub fn is_not_exist(&self) -> bool {
        self.kind() == Some(ErrorKind::NotExist)
    }

    pub fn is_eof(&self) -> bool {
        matches!(self, OsaError::Eof)
    }
}

/// Result type for OS abstraction operations.
pub type OsaResult<T> = Result<T, OsaError>;
