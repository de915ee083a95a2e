// Banyan Shield - Content Security Policy service for the Banyan console
//
// Builds the console's CSP for each runtime mode, attaches it (and the
// companion security headers) to every response, and receives the violation
// reports browsers send back.

pub use banyan_config;
pub use banyan_core;
pub use banyan_report;
pub use banyan_security;

pub use banyan_core::{Error, HttpRequest, HttpResponse, RequestHandler, RuntimeMode, Server};

use async_trait::async_trait;
use banyan_config::ShieldConfig;
use banyan_report::{CspReportController, REPORT_PATH, ReportResult};
use banyan_security::{SecurityMiddleware, generate_nonce};
use serde_json::json;
use tracing::debug;

/// Path of the liveness route.
pub const HEALTH_PATH: &str = "/health";

/// Response header carrying the per-response nonce when strict CSP is on.
pub const NONCE_HEADER: &str = "X-Nonce";

/// The application: routes requests and secures every response.
#[derive(Debug, Clone)]
pub struct ShieldApp {
    mode: RuntimeMode,
    strict_csp: bool,
    security: SecurityMiddleware,
    reports: CspReportController,
}

impl ShieldApp {
    pub fn new(mode: RuntimeMode, reports: CspReportController) -> Self {
        Self {
            mode,
            strict_csp: false,
            security: SecurityMiddleware::for_mode(mode),
            reports,
        }
    }

    /// Application wired from a loaded configuration.
    pub fn from_config(config: &ShieldConfig) -> ReportResult<Self> {
        let reports = CspReportController::from_config(config)?;
        Ok(Self::new(config.mode, reports)
            .report_only(config.report_only)
            .strict_csp(config.strict_csp))
    }

    /// Send the policy as `Content-Security-Policy-Report-Only`.
    pub fn report_only(mut self, enabled: bool) -> Self {
        self.security = self.security.report_only(enabled);
        self
    }

    /// Use the nonce-scoped strict policy with a fresh nonce per response.
    pub fn strict_csp(mut self, enabled: bool) -> Self {
        self.strict_csp = enabled;
        self
    }

    pub fn with_security(mut self, security: SecurityMiddleware) -> Self {
        self.security = security;
        self
    }

    pub fn mode(&self) -> RuntimeMode {
        self.mode
    }

    pub fn security(&self) -> &SecurityMiddleware {
        &self.security
    }

    fn route(&self, req: &HttpRequest) -> Result<HttpResponse, Error> {
        match req.path.as_str() {
            REPORT_PATH => self.reports.handle(req),
            HEALTH_PATH => HttpResponse::ok().with_json(&json!({
                "status": "ok",
                "mode": self.mode.as_str(),
            })),
            other => Err(Error::NotFound(other.to_string())),
        }
    }

    fn secure(&self, response: HttpResponse) -> HttpResponse {
        if self.strict_csp {
            let nonce = generate_nonce();
            self.security
                .apply_with_nonce(response, &nonce)
                .with_header(NONCE_HEADER, nonce)
        } else {
            self.security.apply(response)
        }
    }
}

#[async_trait]
impl RequestHandler for ShieldApp {
    async fn handle(&self, req: HttpRequest) -> Result<HttpResponse, Error> {
        debug!(method = %req.method, path = %req.path, "Handling request");

        let response = match self.route(&req) {
            Ok(response) => response,
            Err(err) => err.into_response(),
        };

        Ok(self.secure(response))
    }
}

// Prelude for common imports
pub mod prelude {
    pub use crate::{HEALTH_PATH, NONCE_HEADER, ShieldApp};
    pub use banyan_config::{ReportingConfig, ShieldConfig};
    pub use banyan_core::{Error, HttpRequest, HttpResponse, RequestHandler, RuntimeMode, Server};
    pub use banyan_report::{CspReportController, ReportForwarder, ViolationSink};
    pub use banyan_security::{
        CspPolicy, CspViolation, SecurityMiddleware, build_nonce_scoped_policy, generate_nonce,
        is_known_directive_name, parse_policy, policy_for_mode, validate_violation_report,
    };
}
