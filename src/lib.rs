//! Failure routing for broker consumers
//!
//! When processing of a consumed record permanently fails, this crate decides
//! where the record goes next:
//! - Its dead-letter topic, while it has retries left
//! - The error topic, once its retries are exhausted
//! - Nowhere, when it is not eligible or exposes no retry count
//!
//! and runs the registered exhaustion handlers.

mod config;
mod convention;
mod error;
mod forwarder;
mod handler;
pub mod logging;
mod message;
pub mod publisher;
mod record;
mod recovery;

// Re-export configuration types
pub use config::DeadLetterSettings;
// Re-export collaborator seams
pub use convention::{DeadLetterTopicNameConvention, SuffixConvention};
pub use forwarder::{ErrorTopicForwarder, PublisherForwarder};
pub use handler::{ExhaustionHandler, ExhaustionHandlers};
pub use publisher::{MemoryPublisher, Publisher, SentRecord};
// Re-export error types
pub use error::{ConfigError, PublishError, RecoveryError};
// Re-export core types
pub use message::{
    DeadLetterMessage, Payload, RETRIES_FIELD, RetryableMessage, RetryableView, StructuralRetries,
};
pub use record::{AttemptContext, FailedDelivery, FailureCause, Record, RoutingOutcome};
pub use recovery::{DeadLetterRecovery, DeadLetterRecoveryBuilder};
