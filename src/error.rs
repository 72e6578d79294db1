//! Error types for the playback core
//!
//! Provides unified error handling using thiserror.

use thiserror::Error;

// == Crate Error Enum ==
/// Errors raised by the playback core itself.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum Error {
    /// A configuration value is unusable
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

// == Fetch Error ==
/// Failure of a read-through `get_or_fetch` call.
///
/// The caller's own error type is carried untouched in `Fetcher`.
#[derive(Error, Debug)]
pub enum FetchError<E> {
    /// The fetcher ran and failed; nothing was cached
    #[error("{0}")]
    Fetcher(E),

    /// The fetch task was cancelled before finishing (runtime shutting down)
    #[error("Fetch aborted for key: {0}")]
    Aborted(String),
}

impl<E> FetchError<E> {
    /// Returns the fetcher's error, if that is what failed.
    pub fn into_fetcher_error(self) -> Option<E> {
        match self {
            FetchError::Fetcher(err) => Some(err),
            FetchError::Aborted(_) => None,
        }
    }
}

// == Result Type Alias ==
/// Convenience Result type for the playback core.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fetch_error_keeps_fetcher_error() {
        let err: FetchError<std::io::Error> =
            FetchError::Fetcher(std::io::Error::other("search api down"));

        assert_eq!(err.to_string(), "search api down");
        let inner = err.into_fetcher_error().unwrap();
        assert_eq!(inner.kind(), std::io::ErrorKind::Other);
    }

    #[test]
    fn test_aborted_has_no_fetcher_error() {
        let err: FetchError<std::io::Error> = FetchError::Aborted("search:lofi".to_string());

        assert_eq!(err.to_string(), "Fetch aborted for key: search:lofi");
        assert!(err.into_fetcher_error().is_none());
    }
}
