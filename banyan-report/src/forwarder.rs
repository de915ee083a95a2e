//! Best-effort fan-out of violations to the configured sinks.

use crate::error::ReportResult;
use crate::sentry::SentrySink;
use crate::sink::{ForwardedViolation, HttpLogSink, ViolationSink};
use banyan_config::ReportingConfig;
use futures::future::join_all;
use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::{debug, error, warn};

/// How many sinks accepted or rejected one violation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ForwardOutcome {
    pub delivered: usize,
    pub failed: usize,
}

/// Sends each violation to every sink.
///
/// Sink failures are logged and counted, never returned, so a broken log
/// collector cannot fail the acknowledgement sent back to the browser.
#[derive(Clone, Default)]
pub struct ReportForwarder {
    sinks: Vec<Arc<dyn ViolationSink>>,
}

impl ReportForwarder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_sink<S: ViolationSink + 'static>(mut self, sink: S) -> Self {
        self.sinks.push(Arc::new(sink));
        self
    }

    /// Build the sinks present in `config`.
    pub fn from_config(config: &ReportingConfig) -> ReportResult<Self> {
        let mut forwarder = Self::new();

        if let Some(ref endpoint) = config.logging_endpoint {
            forwarder = forwarder.with_sink(HttpLogSink::new(
                endpoint.clone(),
                config.logging_token.clone(),
                config.forward_timeout,
            )?);
        }

        if let Some(ref dsn) = config.sentry_dsn {
            forwarder = forwarder.with_sink(SentrySink::new(dsn, config.forward_timeout)?);
        }

        Ok(forwarder)
    }

    pub fn is_empty(&self) -> bool {
        self.sinks.is_empty()
    }

    pub fn len(&self) -> usize {
        self.sinks.len()
    }

    pub fn sink_names(&self) -> Vec<&'static str> {
        self.sinks.iter().map(|s| s.name()).collect()
    }

    /// Send to all sinks concurrently and wait for every one of them.
    pub async fn forward(&self, violation: &ForwardedViolation) -> ForwardOutcome {
        let results = join_all(self.sinks.iter().map(|sink| async move {
            (sink.name(), sink.send(violation).await)
        }))
        .await;

        let mut outcome = ForwardOutcome::default();
        for (sink, result) in results {
            match result {
                Ok(()) => {
                    debug!(sink, "Forwarded CSP violation");
                    outcome.delivered += 1;
                }
                Err(err) => {
                    error!(sink, error = %err, "Failed to forward CSP violation");
                    outcome.failed += 1;
                }
            }
        }

        outcome
    }

    /// Forward on a background task without waiting for the result.
    ///
    /// Returns `None` when there is nothing to forward to or no tokio runtime
    /// is available.
    pub fn dispatch(&self, violation: ForwardedViolation) -> Option<JoinHandle<ForwardOutcome>> {
        if self.is_empty() {
            return None;
        }

        let handle = match Handle::try_current() {
            Ok(handle) => handle,
            Err(_) => {
                warn!("No async runtime available, dropping CSP violation forward");
                return None;
            }
        };

        let forwarder = self.clone();
        Some(handle.spawn(async move { forwarder.forward(&violation).await }))
    }
}

impl std::fmt::Debug for ReportForwarder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReportForwarder")
            .field("sinks", &self.sink_names())
            .finish()
    }
}
