//! Error types for the intronic library.

use thiserror::Error;

/// Errors that can occur during intronic operations.
#[derive(Debug, Error)]
pub enum Error {
    /// An I/O error occurred.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// The record store rejected an operation.
    #[error("store error: {0}")]
    Store(String),

    /// A batch worker thread panicked.
    #[error("worker thread panicked: {0}")]
    Worker(String),
}
