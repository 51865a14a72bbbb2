//! Broker publishing seam.
//!
//! - `memory`: in-memory publisher that records every send

pub mod memory;

use std::sync::Arc;

use async_trait::async_trait;

use crate::{error::PublishError, message::Payload};

pub use memory::{MemoryPublisher, SentRecord};

/// Sends records to the broker.
///
/// A failed send must be reported as an error; a swallowed failure would
/// silently lose the record. Timeouts are the implementation's concern.
#[async_trait]
pub trait Publisher: Send + Sync {
    async fn send(
        &self,
        topic: &str,
        key: Option<&str>,
        payload: Arc<dyn Payload>,
    ) -> Result<(), PublishError>;
}
