//! Forwarding sinks for accepted violations.

use crate::error::{ReportError, ReportResult};
use async_trait::async_trait;
use banyan_core::RuntimeMode;
use banyan_security::CspViolation;
use banyan_security::violation_report::REPORT_KEY;
use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::{Value, json};
use std::time::Duration;

/// A violation accepted by the endpoint, ready to be forwarded.
///
/// `report` is the document exactly as the browser sent it; `violation` is
/// the projection used for logging.
#[derive(Debug, Clone, PartialEq)]
pub struct ForwardedViolation {
    pub environment: RuntimeMode,
    pub received_at: DateTime<Utc>,
    pub violation: CspViolation,
    pub report: Value,
}

impl ForwardedViolation {
    /// Wrap a received report. Returns `None` when the report is malformed.
    pub fn from_report(environment: RuntimeMode, report: Value) -> Option<Self> {
        let violation = CspViolation::from_report(&report)?;

        Some(Self {
            environment,
            received_at: Utc::now(),
            violation,
            report,
        })
    }

    /// The body under the `csp-report` key.
    pub fn report_body(&self) -> &Value {
        &self.report[REPORT_KEY]
    }

    /// `received_at` as RFC 3339 with millisecond precision and a `Z` suffix.
    pub fn timestamp(&self) -> String {
        self.received_at.to_rfc3339_opts(SecondsFormat::Millis, true)
    }
}

/// Destination for forwarded violations.
#[async_trait]
pub trait ViolationSink: Send + Sync {
    /// Short name used in logs and errors
    fn name(&self) -> &'static str;

    /// Deliver one violation
    async fn send(&self, violation: &ForwardedViolation) -> ReportResult<()>;
}

/// Posts violations as JSON to an external log collector.
///
/// Authenticates with `Authorization: Bearer <token>` when a token is set.
pub struct HttpLogSink {
    client: reqwest::Client,
    endpoint: String,
    token: Option<String>,
}

impl HttpLogSink {
    pub fn new(
        endpoint: impl Into<String>,
        token: Option<String>,
        timeout: Duration,
    ) -> ReportResult<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            endpoint: endpoint.into(),
            token,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn payload(violation: &ForwardedViolation) -> serde_json::Value {
        json!({
            "type": "csp-violation",
            "environment": violation.environment.as_str(),
            "timestamp": violation.timestamp(),
            "report": violation.report_body(),
        })
    }
}

#[async_trait]
impl ViolationSink for HttpLogSink {
    fn name(&self) -> &'static str {
        "logging-endpoint"
    }

    async fn send(&self, violation: &ForwardedViolation) -> ReportResult<()> {
        let mut request = self
            .client
            .post(&self.endpoint)
            .json(&Self::payload(violation));

        if let Some(ref token) = self.token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await?;
        let status = response.status();

        if status.is_success() {
            Ok(())
        } else {
            Err(ReportError::Status {
                sink: self.name(),
                status: status.as_u16(),
            })
        }
    }
}
