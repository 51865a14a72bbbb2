//! Typed error handling for failure routing.
//!
//! Routing itself never fails; everything here originates from a
//! collaborator (publisher, forwarder, handler) or from configuration:
//! - Publish failures - the record could not reach the dead-letter topic
//! - Forward failures - the record could not reach the error topic
//! - Handler failures - an exhaustion handler returned an error
//! - Configuration errors - settings could not be loaded or are unusable

use std::{io, path::PathBuf};

use thiserror::Error;

/// Error returned from [`DeadLetterRecovery::recover`](crate::DeadLetterRecovery::recover).
///
/// None of these are retried locally. The caller decides whether to crash
/// the consumption loop, skip the delivery, or alert.
#[derive(Debug, Error)]
pub enum RecoveryError {
    /// Publishing to the dead-letter topic failed.
    #[error("Dead-letter publish failed: {0}")]
    Publish(#[source] PublishError),

    /// Forwarding to the error topic failed.
    #[error("Error-topic forward failed: {0}")]
    Forward(#[source] PublishError),

    /// An exhaustion handler failed; later handlers and the forward were skipped.
    #[error("Exhaustion handler #{index} failed: {source}")]
    Handler {
        index: usize,
        #[source]
        source: anyhow::Error,
    },
}

impl RecoveryError {
    /// Returns `true` if the broker rejected or could not carry the record.
    #[must_use]
    pub const fn is_transport(&self) -> bool {
        matches!(self, Self::Publish(_) | Self::Forward(_))
    }

    /// Returns `true` if an exhaustion handler aborted the recovery.
    #[must_use]
    pub const fn is_handler(&self) -> bool {
        matches!(self, Self::Handler { .. })
    }
}

/// Errors a [`Publisher`](crate::Publisher) may report.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PublishError {
    /// The broker connection failed or was lost.
    #[error("Transport error: {0}")]
    Transport(String),

    /// The publish did not complete within the publisher's own deadline.
    #[error("Publish timed out: {0}")]
    Timeout(String),

    /// The broker refused the record.
    #[error("Broker rejected record for {topic}: {reason}")]
    Rejected { topic: String, reason: String },
}

/// Errors raised while loading or assembling the recovery configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The settings file could not be read.
    #[error("Failed to read settings from {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The settings file is not valid RON.
    #[error("Failed to parse settings: {0}")]
    Parse(#[from] ron::error::SpannedError),

    /// A setting has an unusable value.
    #[error("Invalid setting {field}: {reason}")]
    Invalid { field: &'static str, reason: String },

    /// The builder was finished without a required collaborator.
    #[error("Missing collaborator: {0}")]
    MissingCollaborator(&'static str),
}
