//! Content-Security-Policy support for the Banyan claims console.
//!
//! - [`policy_for_mode`] returns the canonical policy for development or production
//! - [`build_nonce_scoped_policy`] fills the strict template with a request nonce
//! - [`parse_policy`], [`validate_policy`] and [`is_known_directive_name`] inspect
//!   arbitrary policy strings
//! - [`validate_violation_report`] checks the shape of a browser violation report
//! - [`SecurityMiddleware`] attaches the CSP and companion headers to responses
//!
//! # Example
//!
//! ```
//! use banyan_core::{HttpResponse, RuntimeMode};
//! use banyan_security::SecurityMiddleware;
//!
//! let security = SecurityMiddleware::for_mode(RuntimeMode::Production);
//! let response = security.apply(HttpResponse::ok());
//!
//! assert!(response.headers.contains_key("Content-Security-Policy"));
//! assert!(response.headers.contains_key("Strict-Transport-Security"));
//! ```

pub mod content_security_policy;
pub mod directive;
pub mod error;
pub mod headers;
pub mod nonce;
pub mod parser;
pub mod violation_report;

pub use content_security_policy::{CspPolicy, policy_for_mode};
pub use directive::{Directive, KNOWN_DIRECTIVES, is_known_directive_name};
pub use error::PolicyError;
pub use headers::{FrameGuard, Hsts, PermissionsPolicy, ReferrerPolicy};
pub use nonce::{build_nonce_scoped_policy, generate_nonce};
pub use parser::{PolicyIssue, is_valid_policy, parse_policy, validate_policy};
pub use violation_report::{CspViolation, validate_violation_report};

use banyan_core::{HttpResponse, RuntimeMode};

/// Attaches the console's security headers to outgoing responses.
#[derive(Debug, Clone)]
pub struct SecurityMiddleware {
    /// Selects the canonical CSP
    pub mode: RuntimeMode,

    /// Send the CSP as `Content-Security-Policy-Report-Only`
    pub report_only: bool,

    /// X-Frame-Options
    pub frame_guard: FrameGuard,

    /// Referrer-Policy
    pub referrer_policy: ReferrerPolicy,

    /// Strict-Transport-Security, production only by default
    pub hsts: Option<Hsts>,

    /// Permissions-Policy
    pub permissions_policy: PermissionsPolicy,

    /// Strip X-Powered-By
    pub hide_powered_by: bool,
}

impl SecurityMiddleware {
    /// Default header set for `mode`
    pub fn for_mode(mode: RuntimeMode) -> Self {
        Self {
            mode,
            report_only: false,
            frame_guard: FrameGuard::Deny,
            referrer_policy: ReferrerPolicy::StrictOriginWhenCrossOrigin,
            hsts: mode.is_production().then_some(Hsts::ONE_YEAR),
            permissions_policy: PermissionsPolicy::default(),
            hide_powered_by: true,
        }
    }

    pub fn report_only(mut self, enabled: bool) -> Self {
        self.report_only = enabled;
        self
    }

    pub fn with_frame_guard(mut self, guard: FrameGuard) -> Self {
        self.frame_guard = guard;
        self
    }

    pub fn with_referrer_policy(mut self, policy: ReferrerPolicy) -> Self {
        self.referrer_policy = policy;
        self
    }

    pub fn with_hsts(mut self, hsts: Option<Hsts>) -> Self {
        self.hsts = hsts;
        self
    }

    /// Name of the CSP header this middleware emits
    pub fn csp_header_name(&self) -> &'static str {
        if self.report_only {
            content_security_policy::REPORT_ONLY_HEADER_NAME
        } else {
            content_security_policy::HEADER_NAME
        }
    }

    /// Apply headers with the canonical policy for the configured mode
    pub fn apply(&self, response: HttpResponse) -> HttpResponse {
        self.apply_policy(response, policy_for_mode(self.mode))
    }

    /// Apply headers with the strict policy scoped to `nonce`
    pub fn apply_with_nonce(&self, response: HttpResponse, nonce: &str) -> HttpResponse {
        self.apply_policy(response, build_nonce_scoped_policy(nonce))
    }

    fn apply_policy(&self, mut response: HttpResponse, policy: String) -> HttpResponse {
        let mut headers = vec![
            (self.csp_header_name(), policy),
            ("X-Frame-Options", self.frame_guard.to_header_value().to_string()),
            ("X-Content-Type-Options", "nosniff".to_string()),
            ("Referrer-Policy", self.referrer_policy.to_header_value().to_string()),
            ("X-XSS-Protection", "1; mode=block".to_string()),
            ("Permissions-Policy", self.permissions_policy.to_string()),
        ];

        if let Some(ref hsts) = self.hsts {
            headers.push(("Strict-Transport-Security", hsts.to_header_value()));
        }

        for (name, value) in headers {
            set_header(&mut response, name, value);
        }

        if self.hide_powered_by {
            response
                .headers
                .retain(|key, _| !key.eq_ignore_ascii_case("X-Powered-By"));
        }

        response
    }
}

impl Default for SecurityMiddleware {
    fn default() -> Self {
        Self::for_mode(RuntimeMode::Production)
    }
}

/// Insert `name`, replacing any existing header that differs only in case.
fn set_header(response: &mut HttpResponse, name: &str, value: String) {
    response
        .headers
        .retain(|key, _| !key.eq_ignore_ascii_case(name));
    response.headers.insert(name.to_string(), value);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_production_headers() {
        let secured = SecurityMiddleware::for_mode(RuntimeMode::Production).apply(HttpResponse::ok());

        assert_eq!(
            secured.header("Content-Security-Policy"),
            Some(policy_for_mode(RuntimeMode::Production).as_str())
        );
        assert_eq!(secured.header("X-Frame-Options"), Some("DENY"));
        assert_eq!(secured.header("X-Content-Type-Options"), Some("nosniff"));
        assert_eq!(
            secured.header("Referrer-Policy"),
            Some("strict-origin-when-cross-origin")
        );
        assert_eq!(secured.header("X-XSS-Protection"), Some("1; mode=block"));
        assert_eq!(
            secured.header("Strict-Transport-Security"),
            Some("max-age=31536000; includeSubDomains; preload")
        );
    }

    #[test]
    fn test_development_has_no_hsts() {
        let secured = SecurityMiddleware::for_mode(RuntimeMode::Development).apply(HttpResponse::ok());

        assert!(secured.header("Strict-Transport-Security").is_none());
        assert!(
            secured
                .header("Content-Security-Policy")
                .unwrap()
                .contains("http://localhost:*")
        );
    }

    #[test]
    fn test_report_only() {
        let secured = SecurityMiddleware::for_mode(RuntimeMode::Production)
            .report_only(true)
            .apply(HttpResponse::ok());

        assert!(secured.header("Content-Security-Policy").is_none());
        assert!(secured.header("Content-Security-Policy-Report-Only").is_some());
    }

    #[test]
    fn test_apply_with_nonce() {
        let secured = SecurityMiddleware::default().apply_with_nonce(HttpResponse::ok(), "r4nd0m");
        let csp = secured.header("Content-Security-Policy").unwrap();

        assert!(csp.contains("'nonce-r4nd0m'"));
        assert!(!csp.contains("{NONCE}"));
        assert!(!csp.contains("'unsafe-inline'"));
    }

    #[test]
    fn test_replaces_existing_headers_and_hides_powered_by() {
        let response = HttpResponse::ok()
            .with_header("x-frame-options", "ALLOWALL")
            .with_header("x-powered-by", "Next.js");

        let secured = SecurityMiddleware::default().apply(response);

        assert_eq!(secured.header("X-Frame-Options"), Some("DENY"));
        assert_eq!(
            secured
                .headers
                .keys()
                .filter(|k| k.eq_ignore_ascii_case("x-frame-options"))
                .count(),
            1
        );
        assert!(secured.header("X-Powered-By").is_none());
    }

    #[test]
    fn test_custom_configuration() {
        let secured = SecurityMiddleware::for_mode(RuntimeMode::Development)
            .with_frame_guard(FrameGuard::SameOrigin)
            .with_referrer_policy(ReferrerPolicy::NoReferrer)
            .with_hsts(Some(Hsts::ONE_YEAR))
            .apply(HttpResponse::ok());

        assert_eq!(secured.header("X-Frame-Options"), Some("SAMEORIGIN"));
        assert_eq!(secured.header("Referrer-Policy"), Some("no-referrer"));
        assert!(secured.header("Strict-Transport-Security").is_some());
    }
}
