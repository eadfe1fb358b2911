/// Error types shared across the crate
use thiserror::Error;

/// Errors that can occur while talking to a Proxmox VE cluster
#[derive(Debug, Error)]
pub enum CloudError {
    /// Provider or profile configuration is missing or malformed
    #[error("Configuration error: {0}")]
    Config(String),

    /// The API answered with a non-success HTTP status
    #[error("Proxmox API error: HTTP {status} {reason}: {body}")]
    Api {
        status: u16,
        reason: String,
        body: String,
    },

    /// Network-related errors
    #[error("Network error: {0}")]
    Network(String),

    /// The requested VM, container or node does not exist
    #[error("{0}")]
    NotFound(String),

    /// A wait loop exceeded its time bound
    #[error("{0}")]
    Timeout(String),

    /// An asynchronous task reached a terminal state without succeeding
    #[error("Task did not finish successfully: {0}")]
    TaskFailed(String),

    /// A task handle could not be decoded
    #[error("Invalid UPID: {0}")]
    InvalidUpid(String),

    /// A user-supplied value could not be parsed
    #[error("Invalid value: {0}")]
    InvalidValue(String),
}
