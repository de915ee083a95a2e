//! HTTP endpoint browsers send violation reports to.

use crate::forwarder::ReportForwarder;
use crate::sink::ForwardedViolation;
use async_trait::async_trait;
use banyan_config::ShieldConfig;
use banyan_core::{Error, HttpRequest, HttpResponse, RequestHandler, RuntimeMode};
use banyan_security::violation_report::{missing_fields, validate_violation_report};
use chrono::{SecondsFormat, Utc};
use serde_json::{Value, json};
use std::sync::Arc;
use tracing::{debug, warn};

/// Path the endpoint is mounted at; matches the policies' `report-uri`.
pub const REPORT_PATH: &str = banyan_security::content_security_policy::REPORT_URI;

/// Default upper bound on a report body.
pub const DEFAULT_MAX_REPORT_BYTES: usize = 64 * 1024;

/// Receives, validates, logs and forwards CSP violation reports.
///
/// - `GET` is a liveness check
/// - `POST` accepts one `{"csp-report": {...}}` document
#[derive(Debug, Clone)]
pub struct CspReportController {
    mode: RuntimeMode,
    max_report_bytes: usize,
    forwarder: Arc<ReportForwarder>,
}

impl CspReportController {
    pub fn new(mode: RuntimeMode, forwarder: ReportForwarder) -> Self {
        Self {
            mode,
            max_report_bytes: DEFAULT_MAX_REPORT_BYTES,
            forwarder: Arc::new(forwarder),
        }
    }

    /// Controller wired to the sinks configured in `config`.
    pub fn from_config(config: &ShieldConfig) -> crate::ReportResult<Self> {
        let forwarder = ReportForwarder::from_config(&config.reporting)?;
        Ok(Self::new(config.mode, forwarder).with_max_report_bytes(config.reporting.max_report_bytes))
    }

    pub fn with_max_report_bytes(mut self, max: usize) -> Self {
        self.max_report_bytes = max;
        self
    }

    pub fn forwarder(&self) -> &ReportForwarder {
        &self.forwarder
    }

    /// Route a request aimed at [`REPORT_PATH`] by method.
    pub fn handle(&self, req: &HttpRequest) -> Result<HttpResponse, Error> {
        match req.method.to_ascii_uppercase().as_str() {
            "GET" => Self::liveness(),
            "POST" => self.receive(req),
            other => {
                debug!(method = %other, "Method not allowed on CSP report endpoint");
                Ok(error_response(HttpResponse::method_not_allowed(), "Method not allowed")?
                    .with_header("Allow", "GET, POST"))
            }
        }
    }

    fn liveness() -> Result<HttpResponse, Error> {
        HttpResponse::ok().with_json(&json!({
            "message": "CSP report endpoint is active",
            "timestamp": Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        }))
    }

    fn receive(&self, req: &HttpRequest) -> Result<HttpResponse, Error> {
        if req.body.len() > self.max_report_bytes {
            warn!(
                size = req.body.len(),
                limit = self.max_report_bytes,
                "Rejected oversized CSP report"
            );
            return error_response(HttpResponse::payload_too_large(), "CSP report too large");
        }

        let report: Value = match serde_json::from_slice(&req.body) {
            Ok(value) => value,
            Err(err) => {
                debug!(error = %err, "Rejected CSP report with malformed JSON");
                return error_response(HttpResponse::bad_request(), "Invalid JSON body");
            }
        };

        if !validate_violation_report(&report) {
            debug!(missing = ?missing_fields(&report), "Rejected malformed CSP report");
            return error_response(HttpResponse::bad_request(), "Invalid CSP report format");
        }

        let Some(forwarded) = ForwardedViolation::from_report(self.mode, report) else {
            return error_response(HttpResponse::bad_request(), "Invalid CSP report format");
        };
        let violation = &forwarded.violation;

        warn!(
            blocked_uri = %violation.blocked_uri,
            document_uri = %violation.document_uri,
            effective_directive = %violation.effective_directive,
            violated_directive = %violation.violated_directive,
            original_policy = %violation.original_policy,
            referrer = %violation.referrer,
            status_code = %violation.status_code,
            environment = %self.mode,
            "CSP violation reported"
        );

        self.forwarder.dispatch(forwarded);

        HttpResponse::ok().with_json(&json!({ "status": "received" }))
    }
}

#[async_trait]
impl RequestHandler for CspReportController {
    async fn handle(&self, req: HttpRequest) -> Result<HttpResponse, Error> {
        if req.path != REPORT_PATH {
            return Err(Error::NotFound(req.path));
        }
        CspReportController::handle(self, &req)
    }
}

fn error_response(response: HttpResponse, message: &str) -> Result<HttpResponse, Error> {
    response.with_json(&json!({ "error": message }))
}
