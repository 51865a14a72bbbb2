//! Payload capabilities consulted when routing a failed record.
//!
//! A payload can expose its retry count in two ways:
//! - natively, by implementing [`RetryableMessage`] and returning itself
//!   from [`Payload::as_retryable`]
//! - structurally, by carrying a non-negative integer `retries` field in
//!   its [`Payload::to_value`] representation
//!
//! [`RetryableView::of`] runs the probes in that order and the first match
//! wins. A payload that satisfies neither is unclassifiable, which is not an
//! error.

use std::fmt;

use serde_json::Value;

/// Field name looked up by the structural probe.
pub const RETRIES_FIELD: &str = "retries";

/// A message that knows how many times it has been retried.
pub trait RetryableMessage {
    fn retries(&self) -> u32;
}

/// The body of a consumed record.
///
/// Only [`Payload::to_value`] is required. It is used for the structural
/// retry probe and for diagnostic logging.
pub trait Payload: fmt::Debug + Send + Sync {
    /// Structured representation of the payload.
    ///
    /// # Errors
    /// Returns an error if the payload cannot be represented as JSON
    fn to_value(&self) -> serde_json::Result<Value>;

    /// Native retry capability, if the payload implements it.
    fn as_retryable(&self) -> Option<&dyn RetryableMessage> {
        None
    }

    /// Whether the payload opted in to dead-letter routing.
    ///
    /// Only consulted when `require_annotation` is enabled.
    fn is_dead_letter_message(&self) -> bool {
        false
    }
}

impl Payload for Value {
    fn to_value(&self) -> serde_json::Result<Value> {
        Ok(self.clone())
    }
}

/// Marks a payload as opted in to dead-letter routing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeadLetterMessage<P>(pub P);

impl<P: Payload> Payload for DeadLetterMessage<P> {
    fn to_value(&self) -> serde_json::Result<Value> {
        self.0.to_value()
    }

    fn as_retryable(&self) -> Option<&dyn RetryableMessage> {
        self.0.as_retryable()
    }

    fn is_dead_letter_message(&self) -> bool {
        true
    }
}

/// Retry count discovered by inspecting a payload's structure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StructuralRetries(u32);

impl StructuralRetries {
    /// Look for [`RETRIES_FIELD`] in a structured value.
    ///
    /// Counts beyond `u32::MAX` saturate.
    #[must_use]
    pub fn inspect(value: &Value) -> Option<Self> {
        let retries = value.as_object()?.get(RETRIES_FIELD)?.as_u64()?;
        Some(Self(u32::try_from(retries).unwrap_or(u32::MAX)))
    }
}

impl RetryableMessage for StructuralRetries {
    fn retries(&self) -> u32 {
        self.0
    }
}

/// How, if at all, a payload exposes its retry count.
#[derive(Clone, Copy)]
pub enum RetryableView<'a> {
    Native(&'a dyn RetryableMessage),
    Structural(StructuralRetries),
    Unsupported,
}

type Probe = for<'a> fn(&'a dyn Payload) -> Option<RetryableView<'a>>;

const PROBES: &[Probe] = &[native_probe, structural_probe];

fn native_probe(payload: &dyn Payload) -> Option<RetryableView<'_>> {
    payload.as_retryable().map(RetryableView::Native)
}

fn structural_probe(payload: &dyn Payload) -> Option<RetryableView<'_>> {
    let value = payload.to_value().ok()?;
    StructuralRetries::inspect(&value).map(RetryableView::Structural)
}

impl<'a> RetryableView<'a> {
    /// Resolve the view for a payload.
    #[must_use]
    pub fn of(payload: &'a dyn Payload) -> Self {
        PROBES
            .iter()
            .find_map(|probe| probe(payload))
            .unwrap_or(Self::Unsupported)
    }

    /// The retry count, or `None` for an unsupported payload.
    #[must_use]
    pub fn retries(&self) -> Option<u32> {
        match self {
            Self::Native(message) => Some(message.retries()),
            Self::Structural(structural) => Some(structural.retries()),
            Self::Unsupported => None,
        }
    }

    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Native(_) => "native",
            Self::Structural(_) => "structural",
            Self::Unsupported => "unsupported",
        }
    }
}

impl fmt::Debug for RetryableView<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RetryableView")
            .field("kind", &self.kind())
            .field("retries", &self.retries())
            .finish()
    }
}

/// Render a payload for log output.
///
/// Falls back to the `Debug` form when the payload has no JSON representation.
pub(crate) fn render(payload: &dyn Payload) -> String {
    payload
        .to_value()
        .and_then(|value| serde_json::to_string(&value))
        .unwrap_or_else(|_| format!("{payload:?}"))
}
