//! Recovery decision engine
//!
//! Terminal step of a retry mechanism. Given one [`FailedDelivery`] it
//! decides whether the record is ignored, forwarded to the error topic, or
//! published to its dead-letter topic, and runs the exhaustion handlers.
//!
//! The engine holds no mutable state, so one instance can be shared by
//! every consumer task in the process.

use std::sync::Arc;

use tracing::{Instrument, debug, error, info, info_span};

use crate::{
    config::DeadLetterSettings,
    convention::{DeadLetterTopicNameConvention, SuffixConvention},
    error::{ConfigError, RecoveryError},
    forwarder::{ErrorTopicForwarder, PublisherForwarder},
    handler::{ExhaustionHandler, ExhaustionHandlers},
    message::{self, RetryableView},
    publisher::Publisher,
    record::{FailedDelivery, RoutingOutcome},
};

/// Routes failed deliveries to the error topic or a dead-letter topic.
///
/// # Examples
///
/// ```no_run
/// use std::sync::Arc;
///
/// use deadletter::{
///     AttemptContext, DeadLetterRecovery, DeadLetterSettings, FailedDelivery, MemoryPublisher,
///     Record,
/// };
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let recovery = DeadLetterRecovery::builder()
///     .settings(DeadLetterSettings::load("/etc/deadletter/deadletter.config.ron")?)
///     .publisher(MemoryPublisher::new())
///     .handler(|context: &AttemptContext| -> anyhow::Result<()> {
///         println!("giving up on {}", context.record().topic());
///         Ok(())
///     })
///     .build()?;
///
/// let record = Record::new("orders", None, Arc::new(serde_json::json!({ "retries": 1 })));
/// let delivery = FailedDelivery::from_error(record, std::io::Error::other("boom"), 3);
/// let outcome = recovery.recover(delivery).await?;
/// # Ok(())
/// # }
/// ```
pub struct DeadLetterRecovery {
    settings: DeadLetterSettings,
    publisher: Arc<dyn Publisher>,
    forwarder: Arc<dyn ErrorTopicForwarder>,
    convention: Arc<dyn DeadLetterTopicNameConvention>,
    handlers: ExhaustionHandlers,
}

impl DeadLetterRecovery {
    #[must_use]
    pub fn builder() -> DeadLetterRecoveryBuilder {
        DeadLetterRecoveryBuilder::default()
    }

    pub const fn settings(&self) -> &DeadLetterSettings {
        &self.settings
    }

    /// Decide and carry out the terminal action for one delivery.
    ///
    /// At most one publish happens: to the error topic when retries are
    /// exhausted, otherwise to the dead-letter topic. Handlers run on the
    /// exhausted path and when the marker gate rejects the payload; a payload
    /// without a retry count triggers neither.
    ///
    /// # Errors
    /// Returns an error if a handler fails or if the publish or forward fails
    pub async fn recover(&self, delivery: FailedDelivery) -> Result<RoutingOutcome, RecoveryError> {
        let span = info_span!(
            "recover",
            topic = delivery.topic(),
            partition = delivery.record().partition(),
            offset = delivery.record().offset(),
        );

        self.route(&delivery).instrument(span).await
    }

    async fn route(&self, delivery: &FailedDelivery) -> Result<RoutingOutcome, RecoveryError> {
        if self.settings.require_annotation && !delivery.payload().is_dead_letter_message() {
            debug!("Message is not marked for dead-letter routing, ignoring");
            self.handlers.dispatch(delivery.attempt_context())?;
            return Ok(RoutingOutcome::Ignored);
        }

        let Some(retries) = RetryableView::of(delivery.payload()).retries() else {
            debug!("Payload exposes no retry count, leaving it alone");
            return Ok(RoutingOutcome::Unclassified);
        };

        if retries >= self.settings.max_retries {
            self.exhaust(delivery, retries).await
        } else {
            self.dead_letter(delivery, retries).await
        }
    }

    async fn exhaust(
        &self,
        delivery: &FailedDelivery,
        retries: u32,
    ) -> Result<RoutingOutcome, RecoveryError> {
        error!(
            retries,
            max_retries = self.settings.max_retries,
            payload = %message::render(delivery.payload()),
            "Retries exhausted for message"
        );

        self.handlers.dispatch(delivery.attempt_context())?;

        self.forwarder
            .forward(delivery.record())
            .await
            .map_err(RecoveryError::Forward)?;

        Ok(RoutingOutcome::Exhausted)
    }

    async fn dead_letter(
        &self,
        delivery: &FailedDelivery,
        retries: u32,
    ) -> Result<RoutingOutcome, RecoveryError> {
        let topic = self.convention.dead_letter_topic(delivery.topic());

        error!(
            retries,
            payload = %message::render(delivery.payload()),
            error = %delivery.last_error(),
            "Failed to process message"
        );
        info!(dead_letter_topic = %topic, "Sending to dead letter topic");

        self.publisher
            .send(&topic, delivery.key(), delivery.record().shared_payload())
            .await
            .map_err(RecoveryError::Publish)?;

        Ok(RoutingOutcome::DeadLettered { topic })
    }
}

/// Assembles a [`DeadLetterRecovery`].
///
/// Only the publisher is required. Without an explicit forwarder, exhausted
/// records go through the same publisher to `settings.error_topic`; without
/// an explicit convention, dead-letter topics use `settings.dead_letter_suffix`.
#[derive(Default)]
pub struct DeadLetterRecoveryBuilder {
    settings: DeadLetterSettings,
    publisher: Option<Arc<dyn Publisher>>,
    forwarder: Option<Arc<dyn ErrorTopicForwarder>>,
    convention: Option<Arc<dyn DeadLetterTopicNameConvention>>,
    handlers: ExhaustionHandlers,
}

impl DeadLetterRecoveryBuilder {
    #[must_use]
    pub fn settings(mut self, settings: DeadLetterSettings) -> Self {
        self.settings = settings;
        self
    }

    #[must_use]
    pub fn publisher(self, publisher: impl Publisher + 'static) -> Self {
        self.shared_publisher(Arc::new(publisher))
    }

    #[must_use]
    pub fn shared_publisher(mut self, publisher: Arc<dyn Publisher>) -> Self {
        self.publisher = Some(publisher);
        self
    }

    #[must_use]
    pub fn forwarder(mut self, forwarder: impl ErrorTopicForwarder + 'static) -> Self {
        self.forwarder = Some(Arc::new(forwarder));
        self
    }

    #[must_use]
    pub fn convention(mut self, convention: impl DeadLetterTopicNameConvention + 'static) -> Self {
        self.convention = Some(Arc::new(convention));
        self
    }

    /// Register an exhaustion handler after those already registered.
    #[must_use]
    pub fn handler(mut self, handler: impl ExhaustionHandler + 'static) -> Self {
        self.handlers.register(handler);
        self
    }

    /// Replace the handler registry.
    #[must_use]
    pub fn handlers(mut self, handlers: ExhaustionHandlers) -> Self {
        self.handlers = handlers;
        self
    }

    /// # Errors
    /// Returns an error if no publisher was given or the settings are invalid
    pub fn build(self) -> Result<DeadLetterRecovery, ConfigError> {
        self.settings.validate()?;

        let publisher = self
            .publisher
            .ok_or(ConfigError::MissingCollaborator("publisher"))?;

        let forwarder: Arc<dyn ErrorTopicForwarder> = match self.forwarder {
            Some(forwarder) => forwarder,
            None => Arc::new(PublisherForwarder::new(
                Arc::clone(&publisher),
                self.settings.error_topic.clone(),
            )),
        };

        let convention: Arc<dyn DeadLetterTopicNameConvention> = match self.convention {
            Some(convention) => convention,
            None => Arc::new(SuffixConvention::new(
                self.settings.dead_letter_suffix.clone(),
            )),
        };

        Ok(DeadLetterRecovery {
            settings: self.settings,
            publisher,
            forwarder,
            convention,
            handlers: self.handlers,
        })
    }
}
