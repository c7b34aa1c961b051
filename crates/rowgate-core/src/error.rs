//! Error types for Rowgate operations.

use std::fmt;

/// Convenience alias used throughout the workspace.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// The primary error type for all Rowgate operations.
#[derive(Debug)]
pub enum Error {
    /// No grammar rule matched an accessor name. Fatal to the caller,
    /// never retried.
    UnrecognizedAccessor {
        /// The accessor name as the caller supplied it.
        name: String,
    },
    /// Field-list length differs from the supplied argument count.
    ArgumentCount(ArgumentCountError),
    /// An argument or descriptor component had the wrong shape.
    Type(TypeError),
    /// A failure raised by the storage backend, propagated unchanged.
    Storage(StorageError),
    /// A flush stopped partway through the write queue.
    Flush(FlushError),
}

/// Raised before any binding happens when an accessor's field list and the
/// positional arguments disagree in length. Partial binds never occur.
#[derive(Debug)]
pub struct ArgumentCountError {
    /// The accessor name being dispatched.
    pub accessor: String,
    /// Number of arguments the parsed field list requires.
    pub expected: usize,
    /// Number of arguments the caller supplied.
    pub supplied: usize,
}

/// A value, condition, or count target of the wrong shape.
#[derive(Debug)]
pub struct TypeError {
    /// What the operation required.
    pub expected: &'static str,
    /// What was actually supplied.
    pub actual: String,
    /// The accessor or operation being dispatched, when known.
    pub context: Option<String>,
}

/// Any failure coming out of a storage backend.
#[derive(Debug)]
pub struct StorageError {
    pub kind: StorageErrorKind,
    pub message: String,
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageErrorKind {
    /// Connection lost or could not be established
    Connection,
    /// Constraint violation (unique, foreign key, etc.)
    Constraint,
    /// The backend rejected the query as malformed
    InvalidQuery,
    /// Other backend error
    Database,
}

impl StorageError {
    /// Create a storage error with no underlying source.
    pub fn new(kind: StorageErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            source: None,
        }
    }

    /// Attach an underlying error as the source.
    #[must_use]
    pub fn with_source(
        mut self,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        self.source = Some(Box::new(source));
        self
    }
}

/// Report of a flush that failed partway through.
///
/// The first `flushed` records were written and removed from the queue;
/// the record that failed and everything queued after it remain queued,
/// so calling `flush()` again retries exactly the remainder.
#[derive(Debug)]
pub struct FlushError {
    /// Records written before the failure.
    pub flushed: usize,
    /// Records still in the queue, starting with the one that failed.
    pub remaining: usize,
    /// The error raised by the failing save.
    pub source: Box<Error>,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::UnrecognizedAccessor { name } => {
                write!(f, "unrecognized accessor name: {name}")
            }
            Error::ArgumentCount(e) => e.fmt(f),
            Error::Type(e) => e.fmt(f),
            Error::Storage(e) => e.fmt(f),
            Error::Flush(e) => e.fmt(f),
        }
    }
}

impl fmt::Display for ArgumentCountError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "accessor {} requires {} argument(s), got {}",
            self.accessor, self.expected, self.supplied
        )
    }
}

impl fmt::Display for TypeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "expected {}, got {}", self.expected, self.actual)?;
        if let Some(ctx) = &self.context {
            write!(f, " (in {ctx})")?;
        }
        Ok(())
    }
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self.kind {
            StorageErrorKind::Connection => "connection error",
            StorageErrorKind::Constraint => "constraint violation",
            StorageErrorKind::InvalidQuery => "invalid query",
            StorageErrorKind::Database => "database error",
        };
        write!(f, "{kind}: {}", self.message)
    }
}

impl fmt::Display for FlushError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "flush stopped after {} record(s); {} still queued: {}",
            self.flushed, self.remaining, self.source
        )
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Storage(e) => e
                .source
                .as_deref()
                .map(|s| s as &(dyn std::error::Error + 'static)),
            Error::Flush(e) => Some(e.source.as_ref()),
            _ => None,
        }
    }
}

impl From<StorageError> for Error {
    fn from(e: StorageError) -> Self {
        Error::Storage(e)
    }
}

impl Error {
    /// True for errors a caller could fix by changing the accessor name or
    /// its arguments, as opposed to backend failures.
    pub const fn is_caller_error(&self) -> bool {
        matches!(
            self,
            Error::UnrecognizedAccessor { .. } | Error::ArgumentCount(_) | Error::Type(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let e = Error::UnrecognizedAccessor {
            name: "fetchStuff".into(),
        };
        assert_eq!(e.to_string(), "unrecognized accessor name: fetchStuff");

        let e = Error::ArgumentCount(ArgumentCountError {
            accessor: "getByNameAndStatus".into(),
            expected: 2,
            supplied: 1,
        });
        assert!(e.to_string().contains("requires 2 argument(s), got 1"));
    }

    #[test]
    fn test_flush_error_reports_progress() {
        let e = Error::Flush(FlushError {
            flushed: 3,
            remaining: 2,
            source: Box::new(Error::Storage(StorageError::new(
                StorageErrorKind::Constraint,
                "duplicate key",
            ))),
        });
        let msg = e.to_string();
        assert!(msg.contains("after 3 record(s)"));
        assert!(msg.contains("2 still queued"));
        assert!(msg.contains("duplicate key"));
    }

    #[test]
    fn test_caller_error_classification() {
        assert!(
            Error::UnrecognizedAccessor {
                name: "x".into()
            }
            .is_caller_error()
        );
        assert!(
            !Error::Storage(StorageError::new(StorageErrorKind::Database, "boom"))
                .is_caller_error()
        );
    }
}
