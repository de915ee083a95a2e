//! Sentry forwarding through the project's security-report endpoint.

use crate::error::{ReportError, ReportResult};
use crate::sink::{ForwardedViolation, ViolationSink};
use async_trait::async_trait;
use std::time::Duration;
use url::Url;

/// Components of a `scheme://public_key@host[:port][/prefix]/project_id` DSN.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentryDsn {
    scheme: String,
    public_key: String,
    host: String,
    port: Option<u16>,
    path_prefix: String,
    project_id: String,
}

impl SentryDsn {
    pub fn parse(dsn: &str) -> ReportResult<Self> {
        let url = Url::parse(dsn).map_err(|e| ReportError::InvalidDsn(e.to_string()))?;

        let public_key = url.username();
        if public_key.is_empty() {
            return Err(ReportError::InvalidDsn("missing public key".to_string()));
        }

        let host = url
            .host_str()
            .ok_or_else(|| ReportError::InvalidDsn("missing host".to_string()))?;

        let path = url.path().trim_end_matches('/');
        let (prefix, project_id) = path.rsplit_once('/').unwrap_or(("", path));
        if project_id.is_empty() {
            return Err(ReportError::InvalidDsn("missing project id".to_string()));
        }

        Ok(Self {
            scheme: url.scheme().to_string(),
            public_key: public_key.to_string(),
            host: host.to_string(),
            port: url.port(),
            path_prefix: prefix.to_string(),
            project_id: project_id.to_string(),
        })
    }

    pub fn project_id(&self) -> &str {
        &self.project_id
    }

    pub fn public_key(&self) -> &str {
        &self.public_key
    }

    /// The URL browsers-style CSP reports are accepted at.
    pub fn security_endpoint(&self) -> String {
        let port = self.port.map(|p| format!(":{}", p)).unwrap_or_default();
        format!(
            "{}://{}{}{}/api/{}/security/?sentry_key={}",
            self.scheme, self.host, port, self.path_prefix, self.project_id, self.public_key
        )
    }
}

/// Mirrors violations to Sentry in the browser's own report format.
pub struct SentrySink {
    client: reqwest::Client,
    endpoint: String,
}

impl SentrySink {
    pub fn new(dsn: &str, timeout: Duration) -> ReportResult<Self> {
        let dsn = SentryDsn::parse(dsn)?;
        let client = reqwest::Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            endpoint: dsn.security_endpoint(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl ViolationSink for SentrySink {
    fn name(&self) -> &'static str {
        "sentry"
    }

    async fn send(&self, violation: &ForwardedViolation) -> ReportResult<()> {
        let body = serde_json::to_vec(&violation.report)?;

        let response = self
            .client
            .post(&self.endpoint)
            .header("Content-Type", "application/csp-report")
            .body(body)
            .send()
            .await?;

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
