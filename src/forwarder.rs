//! Forwarding of exhausted records to the error topic.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;

use crate::{error::PublishError, publisher::Publisher, record::Record};

/// Moves a record whose retries are exhausted to a terminal error topic.
///
/// The record is forwarded as consumed: same key, same payload.
#[async_trait]
pub trait ErrorTopicForwarder: Send + Sync {
    async fn forward(&self, record: &Record) -> Result<(), PublishError>;
}

/// Forwards through a [`Publisher`] to a fixed topic.
pub struct PublisherForwarder {
    publisher: Arc<dyn Publisher>,
    error_topic: String,
}

impl PublisherForwarder {
    pub fn new(publisher: Arc<dyn Publisher>, error_topic: impl Into<String>) -> Self {
        Self {
            publisher,
            error_topic: error_topic.into(),
        }
    }

    pub fn error_topic(&self) -> &str {
        &self.error_topic
    }
}

#[async_trait]
impl ErrorTopicForwarder for PublisherForwarder {
    async fn forward(&self, record: &Record) -> Result<(), PublishError> {
        info!(
            topic = record.topic(),
            error_topic = %self.error_topic,
            "Forwarding record to error topic"
        );

        self.publisher
            .send(&self.error_topic, record.key(), record.shared_payload())
            .await
    }
}
