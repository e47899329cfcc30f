//! Error types for greendots-core.

use thiserror::Error;

/// Result type for greendots-core operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while forking or waiting on a worker.
#[derive(Debug, Error)]
pub enum Error {
    /// Failed to create the pipe backing a channel.
    #[error("failed to create channel: {0}")]
    Pipe(#[source] std::io::Error),

    /// The fork primitive could not create a child process.
    #[error("fork failed: {0}")]
    Fork(#[source] std::io::Error),

    /// Waiting on the child process failed.
    #[error("waitpid failed: {0}")]
    Wait(#[source] std::io::Error),

    /// Scoped acquisition of an endpoint that was already released.
    #[error("channel {0} endpoint already closed")]
    EndpointClosed(&'static str),

    /// IO error while reading the channel.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
