use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use tracing::trace;

use super::Publisher;
use crate::{error::PublishError, message::Payload};

/// A record captured by [`MemoryPublisher`].
#[derive(Debug, Clone)]
pub struct SentRecord {
    pub topic: String,
    pub key: Option<String>,
    pub payload: Arc<dyn Payload>,
}

/// In-memory publisher
///
/// Records every send in order. Clones share the same log, so a handle can
/// be given to the recovery engine while the test keeps another for
/// assertions. A failure can be injected to exercise transport errors.
#[derive(Debug, Clone, Default)]
pub struct MemoryPublisher {
    sent: Arc<Mutex<Vec<SentRecord>>>,
    failure: Arc<Mutex<Option<PublishError>>>,
}

impl MemoryPublisher {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent send fail with `error`, or succeed again with `None`.
    pub fn set_failure(&self, error: Option<PublishError>) {
        *self.failure.lock() = error;
    }

    /// All records sent so far, oldest first.
    #[must_use]
    pub fn sent(&self) -> Vec<SentRecord> {
        self.sent.lock().clone()
    }

    /// Records sent to one topic.
    #[must_use]
    pub fn sent_to(&self, topic: &str) -> Vec<SentRecord> {
        self.sent
            .lock()
            .iter()
            .filter(|record| record.topic == topic)
            .cloned()
            .collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.sent.lock().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&self) {
        self.sent.lock().clear();
    }
}

#[async_trait]
impl Publisher for MemoryPublisher {
    async fn send(
        &self,
        topic: &str,
        key: Option<&str>,
        payload: Arc<dyn Payload>,
    ) -> Result<(), PublishError> {
        if let Some(error) = self.failure.lock().clone() {
            return Err(error);
        }

        trace!(topic, key, "Captured record");
        self.sent.lock().push(SentRecord {
            topic: topic.to_string(),
            key: key.map(str::to_string),
            payload,
        });

        Ok(())
    }
}
