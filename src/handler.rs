//! Exhaustion handlers
//!
//! Hooks such as metrics or alerting that observe every terminal delivery.
//! Handlers run sequentially in registration order with no isolation: the
//! first failure stops the chain and is returned to the caller.

use std::{fmt, sync::Arc};

use tracing::trace;

use crate::{error::RecoveryError, record::AttemptContext};

/// A side-effect hook invoked with the context of a failed delivery.
pub trait ExhaustionHandler: Send + Sync {
    /// # Errors
    /// Any error aborts the remaining handlers and the routing step
    fn on_failure(&self, context: &AttemptContext) -> anyhow::Result<()>;
}

impl<F> ExhaustionHandler for F
where
    F: Fn(&AttemptContext) -> anyhow::Result<()> + Send + Sync,
{
    fn on_failure(&self, context: &AttemptContext) -> anyhow::Result<()> {
        self(context)
    }
}

/// Ordered registry of exhaustion handlers.
#[derive(Clone, Default)]
pub struct ExhaustionHandlers {
    handlers: Vec<Arc<dyn ExhaustionHandler>>,
}

impl ExhaustionHandlers {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a handler; it runs after every handler registered before it.
    pub fn register(&mut self, handler: impl ExhaustionHandler + 'static) -> &mut Self {
        self.handlers.push(Arc::new(handler));
        self
    }

    /// Append an already shared handler.
    pub fn register_shared(&mut self, handler: Arc<dyn ExhaustionHandler>) -> &mut Self {
        self.handlers.push(handler);
        self
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// Run every handler in order, stopping at the first failure.
    ///
    /// # Errors
    /// Returns [`RecoveryError::Handler`] carrying the failing handler's index
    pub fn dispatch(&self, context: &AttemptContext) -> Result<(), RecoveryError> {
        for (index, handler) in self.handlers.iter().enumerate() {
            trace!(index, "Running exhaustion handler");
            handler
                .on_failure(context)
                .map_err(|source| RecoveryError::Handler { index, source })?;
        }

        Ok(())
    }
}

impl fmt::Debug for ExhaustionHandlers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExhaustionHandlers")
            .field("len", &self.handlers.len())
            .finish()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Mutex;

    use serde_json::json;

    use super::*;
    use crate::record::{FailedDelivery, Record};

    fn context() -> AttemptContext {
        let record = Record::new("orders", None, Arc::new(json!({ "retries": 4 })));
        FailedDelivery::from_error(record, std::io::Error::other("boom"), 4)
            .attempt_context()
            .clone()
    }

    #[test]
    fn test_dispatch_in_registration_order() {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let mut handlers = ExhaustionHandlers::new();

        for name in ["metrics", "alerting", "audit"] {
            let calls = Arc::clone(&calls);
            handlers.register(move |_: &AttemptContext| -> anyhow::Result<()> {
                calls.lock().unwrap().push(name);
                Ok(())
            });
        }

        handlers.dispatch(&context()).unwrap();
        assert_eq!(*calls.lock().unwrap(), vec!["metrics", "alerting", "audit"]);
    }

    #[test]
    fn test_first_failure_stops_the_chain() {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let mut handlers = ExhaustionHandlers::new();

        let first = Arc::clone(&calls);
        handlers.register(move |_: &AttemptContext| -> anyhow::Result<()> {
            first.lock().unwrap().push(0);
            Ok(())
        });
        handlers.register(|_: &AttemptContext| -> anyhow::Result<()> {
            anyhow::bail!("alerting unavailable")
        });
        let third = Arc::clone(&calls);
        handlers.register(move |_: &AttemptContext| -> anyhow::Result<()> {
            third.lock().unwrap().push(2);
            Ok(())
        });

        let error = handlers.dispatch(&context()).unwrap_err();
        assert!(matches!(error, RecoveryError::Handler { index: 1, .. }));
        assert_eq!(*calls.lock().unwrap(), vec![0]);
    }

    #[test]
    fn test_handlers_see_the_context() {
        let mut handlers = ExhaustionHandlers::new();
        handlers.register(|context: &AttemptContext| -> anyhow::Result<()> {
            anyhow::ensure!(context.record().topic() == "orders", "wrong topic");
            anyhow::ensure!(context.attempts() == 4, "wrong attempt count");
            anyhow::ensure!(context.last_error().to_string() == "boom", "wrong error");
            Ok(())
        });

        assert!(handlers.dispatch(&context()).is_ok());
        assert_eq!(handlers.len(), 1);
    }

    #[test]
    fn test_shared_handler_runs_at_each_registration() {
        let calls = Arc::new(Mutex::new(0));
        let counter = Arc::clone(&calls);
        let shared: Arc<dyn ExhaustionHandler> =
            Arc::new(move |_: &AttemptContext| -> anyhow::Result<()> {
                *counter.lock().unwrap() += 1;
                Ok(())
            });

        let mut handlers = ExhaustionHandlers::new();
        handlers
            .register_shared(Arc::clone(&shared))
            .register_shared(shared);

        handlers.dispatch(&context()).unwrap();
        assert_eq!(handlers.len(), 2);
        assert_eq!(*calls.lock().unwrap(), 2);
    }

    #[test]
    fn test_empty_registry_is_a_no_op() {
        let handlers = ExhaustionHandlers::new();
        assert!(handlers.is_empty());
        assert!(handlers.dispatch(&context()).is_ok());
    }
}
