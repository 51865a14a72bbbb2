//! Type definitions for failed deliveries and routing outcomes

use std::{error::Error as StdError, fmt, sync::Arc};

use crate::message::Payload;

/// Shared handle to the error that made a delivery fail.
pub type FailureCause = Arc<dyn StdError + Send + Sync>;

/// A record consumed from the broker.
#[derive(Debug, Clone)]
pub struct Record {
    topic: Arc<str>,
    partition: i32,
    offset: i64,
    key: Option<String>,
    payload: Arc<dyn Payload>,
}

impl Record {
    pub fn new(
        topic: impl Into<Arc<str>>,
        key: Option<String>,
        payload: Arc<dyn Payload>,
    ) -> Self {
        Self {
            topic: topic.into(),
            partition: 0,
            offset: 0,
            key,
            payload,
        }
    }

    /// Set the partition and offset the record was consumed from.
    #[must_use]
    pub fn at(mut self, partition: i32, offset: i64) -> Self {
        self.partition = partition;
        self.offset = offset;
        self
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }

    pub const fn partition(&self) -> i32 {
        self.partition
    }

    pub const fn offset(&self) -> i64 {
        self.offset
    }

    pub fn key(&self) -> Option<&str> {
        self.key.as_deref()
    }

    pub fn payload(&self) -> &dyn Payload {
        &*self.payload
    }

    /// A second handle to the payload, for publishing.
    pub fn shared_payload(&self) -> Arc<dyn Payload> {
        Arc::clone(&self.payload)
    }
}

/// Execution context of the failed delivery, handed to exhaustion handlers.
#[derive(Clone)]
pub struct AttemptContext {
    record: Record,
    last_error: FailureCause,
    attempts: u32,
}

impl AttemptContext {
    pub const fn record(&self) -> &Record {
        &self.record
    }

    /// The most recent processing failure.
    pub fn last_error(&self) -> &(dyn StdError + Send + Sync) {
        &*self.last_error
    }

    /// Number of processing attempts the retry mechanism made.
    pub const fn attempts(&self) -> u32 {
        self.attempts
    }
}

impl fmt::Debug for AttemptContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AttemptContext")
            .field("record", &self.record)
            .field("last_error", &self.last_error.to_string())
            .field("attempts", &self.attempts)
            .finish()
    }
}

/// A record whose processing failed for the last time.
///
/// Built by the retry mechanism once all attempts are spent, then handed by
/// value to [`DeadLetterRecovery::recover`](crate::DeadLetterRecovery::recover).
#[derive(Debug)]
pub struct FailedDelivery {
    context: AttemptContext,
}

impl FailedDelivery {
    pub fn new(record: Record, last_error: FailureCause, attempts: u32) -> Self {
        Self {
            context: AttemptContext {
                record,
                last_error,
                attempts,
            },
        }
    }

    /// Convenience constructor taking the error by value.
    pub fn from_error<E>(record: Record, error: E, attempts: u32) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        Self::new(record, Arc::new(error), attempts)
    }

    pub fn topic(&self) -> &str {
        self.context.record.topic()
    }

    pub fn key(&self) -> Option<&str> {
        self.context.record.key()
    }

    pub fn payload(&self) -> &dyn Payload {
        self.context.record.payload()
    }

    pub fn last_error(&self) -> &(dyn StdError + Send + Sync) {
        self.context.last_error()
    }

    pub const fn record(&self) -> &Record {
        &self.context.record
    }

    pub const fn attempt_context(&self) -> &AttemptContext {
        &self.context
    }
}

/// What the recovery engine did with a delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoutingOutcome {
    /// The payload lacked the dead-letter marker; handlers ran, nothing was published.
    Ignored,
    /// Retries were exhausted; handlers ran and the record went to the error topic.
    Exhausted,
    /// The record was published to this dead-letter topic.
    DeadLettered { topic: String },
    /// The payload exposes no retry count; nothing happened.
    Unclassified,
}

impl RoutingOutcome {
    /// Returns `true` if the record was published anywhere.
    #[must_use]
    pub const fn published(&self) -> bool {
        matches!(self, Self::Exhausted | Self::DeadLettered { .. })
    }
}

impl fmt::Display for RoutingOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ignored => f.write_str("ignored"),
            Self::Exhausted => f.write_str("exhausted"),
            Self::DeadLettered { topic } => write!(f, "dead-lettered to {topic}"),
            Self::Unclassified => f.write_str("unclassified"),
        }
    }
}
