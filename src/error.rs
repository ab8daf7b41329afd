//! Global error handling for dumpmd
//!
//! Errors that abort a run. Per-manifest and per-file failures are rendered
//! into the document instead and never reach this type.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Global error type for dumpmd operations
#[derive(Error, Debug)]
pub enum DumpMdError {
    /// File system errors
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// The scan root could not be listed
    #[error("Failed to scan {}: {source}", path.display())]
    Scan {
        path: PathBuf,
        #[source]
        source: walkdir::Error,
    },

    /// Path not found
    #[error("Path not found: {0}")]
    PathNotFound(String),

    /// Invalid argument
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Unexpected error
    #[error("Unexpected error: {0}")]
    Unexpected(String),
}

/// Specialized Result type for dumpmd operations
pub type Result<T> = std::result::Result<T, DumpMdError>;

/// Creates a DumpMdError with a formatted message
#[macro_export]
macro_rules! error {
    ($error_type:ident, $($arg:tt)*) => {
        $crate::error::DumpMdError::$error_type(format!($($arg)*))
    };
}

/// Returns an error result with a formatted message
#[macro_export]
macro_rules! bail {
    ($error_type:ident, $($arg:tt)*) => {
        return Err($crate::error!($error_type, $($arg)*))
    };
}

/// Ensures a condition is true, otherwise returns an error
#[macro_export]
macro_rules! ensure {
    ($cond:expr, $error_type:ident, $($arg:tt)*) => {
        if !($cond) {
            $crate::bail!($error_type, $($arg)*)
        }
    };
}

/// Extension trait for adding context to errors
pub trait ResultExt<T, E> {
    /// Add additional context to an error
    fn with_context<C, F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> C,
        C: std::fmt::Display;
}

impl<T, E: std::error::Error + 'static> ResultExt<T, E> for std::result::Result<T, E> {
    fn with_context<C, F>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> C,
        C: std::fmt::Display,
    {
        self.map_err(|e| {
            let context = f();
            DumpMdError::Unexpected(format!("{}: {}", context, e))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn check_positive(n: i32) -> Result<i32> {
        ensure!(n > 0, InvalidArgument, "expected a positive number, got {}", n);
        Ok(n)
    }

    #[test]
    fn test_ensure_macro() {
        assert_eq!(check_positive(3).unwrap(), 3);
        let err = check_positive(-1).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid argument: expected a positive number, got -1"
        );
    }

    #[test]
    fn test_with_context() {
        let res: std::result::Result<(), io::Error> =
            Err(io::Error::new(io::ErrorKind::NotFound, "gone"));
        let err = res.with_context(|| "reading root").unwrap_err();
        assert_eq!(err.to_string(), "Unexpected error: reading root: gone");
    }

    #[test]
    fn test_scan_error_names_the_root() {
        let path = PathBuf::from("/definitely/not/here");
        let source = walkdir::WalkDir::new(&path)
            .into_iter()
            .find_map(|entry| entry.err())
            .unwrap();

        let err = DumpMdError::Scan { path, source };
        assert!(err.to_string().starts_with("Failed to scan /definitely/not/here: "));
        assert!(std::error::Error::source(&err).is_some());
    }
}
