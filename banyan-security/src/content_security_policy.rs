//! Content Security Policy (CSP) construction
//!
//! The console ships two canonical policies, one per [`RuntimeMode`]. Both are
//! built once from static directive tables and handed out as header strings.
//!
//! ```
//! use banyan_core::RuntimeMode;
//! use banyan_security::content_security_policy::policy_for_mode;
//!
//! let policy = policy_for_mode(RuntimeMode::Production);
//! assert!(policy.starts_with("default-src 'self'; "));
//! assert!(policy.ends_with("report-uri /api/csp-report"));
//! ```

use crate::directive::Directive;
use crate::error::PolicyError;
use crate::parser::validate_policy;
use banyan_core::RuntimeMode;
use once_cell::sync::Lazy;
use std::fmt;
use std::str::FromStr;

/// Separator between serialized directives.
pub const DIRECTIVE_SEPARATOR: &str = "; ";

/// Where browsers POST violation reports.
pub const REPORT_URI: &str = "/api/csp-report";

pub const HEADER_NAME: &str = "Content-Security-Policy";
pub const REPORT_ONLY_HEADER_NAME: &str = "Content-Security-Policy-Report-Only";

type DirectiveTable = &'static [(&'static str, &'static [&'static str])];

const DEVELOPMENT_DIRECTIVES: DirectiveTable = &[
    ("default-src", &["'self'"]),
    (
        "script-src",
        &[
            "'self'",
            "'unsafe-eval'",
            "'unsafe-inline'",
            "https://cdn.jsdelivr.net",
            "https://unpkg.com",
        ],
    ),
    (
        "style-src",
        &[
            "'self'",
            "'unsafe-inline'",
            "https://fonts.googleapis.com",
            "https://cdn.jsdelivr.net",
        ],
    ),
    ("img-src", &["'self'", "data:", "blob:", "https:", "http:"]),
    (
        "font-src",
        &["'self'", "https://fonts.gstatic.com", "https://cdn.jsdelivr.net"],
    ),
    (
        "connect-src",
        &[
            "'self'",
            "https://api.banyanclaims.com",
            "https://banyan.backend.ricive.com",
            "wss:",
            "ws:",
            "http://localhost:*",
        ],
    ),
    ("media-src", &["'self'"]),
    ("object-src", &["'none'"]),
    ("frame-src", &["'none'"]),
    ("frame-ancestors", &["'none'"]),
    ("base-uri", &["'self'"]),
    ("form-action", &["'self'"]),
    ("manifest-src", &["'self'"]),
    ("worker-src", &["'self'", "blob:"]),
    ("child-src", &["'self'", "blob:"]),
];

const PRODUCTION_DIRECTIVES: DirectiveTable = &[
    ("default-src", &["'self'"]),
    (
        "script-src",
        &[
            "'self'",
            "'unsafe-eval'",
            "'unsafe-inline'",
            "https://cdn.jsdelivr.net",
            "https://unpkg.com",
        ],
    ),
    (
        "style-src",
        &[
            "'self'",
            "'unsafe-inline'",
            "https://fonts.googleapis.com",
            "https://cdn.jsdelivr.net",
        ],
    ),
    ("img-src", &["'self'", "data:", "blob:", "https:"]),
    (
        "font-src",
        &["'self'", "https://fonts.gstatic.com", "https://cdn.jsdelivr.net"],
    ),
    (
        "connect-src",
        &[
            "'self'",
            "https://api.banyanclaims.com",
            "https://banyan.backend.ricive.com",
            "wss:",
            "ws:",
        ],
    ),
    ("media-src", &["'self'"]),
    ("object-src", &["'none'"]),
    ("frame-src", &["'none'"]),
    ("frame-ancestors", &["'none'"]),
    ("base-uri", &["'self'"]),
    ("form-action", &["'self'"]),
    ("manifest-src", &["'self'"]),
    ("worker-src", &["'self'", "blob:"]),
    ("child-src", &["'self'", "blob:"]),
    ("upgrade-insecure-requests", &[]),
    ("block-all-mixed-content", &[]),
    ("report-uri", &[REPORT_URI]),
];

static DEVELOPMENT_POLICY: Lazy<CspPolicy> = Lazy::new(|| CspPolicy::from_table(DEVELOPMENT_DIRECTIVES));
static PRODUCTION_POLICY: Lazy<CspPolicy> = Lazy::new(|| CspPolicy::from_table(PRODUCTION_DIRECTIVES));

static DEVELOPMENT_HEADER: Lazy<String> = Lazy::new(|| DEVELOPMENT_POLICY.to_header_value());
static PRODUCTION_HEADER: Lazy<String> = Lazy::new(|| PRODUCTION_POLICY.to_header_value());

/// The canonical policy header value for `mode`.
pub fn policy_for_mode(mode: RuntimeMode) -> String {
    match mode {
        RuntimeMode::Development => DEVELOPMENT_HEADER.clone(),
        RuntimeMode::Production => PRODUCTION_HEADER.clone(),
    }
}

/// An ordered list of directives.
///
/// Directive order is preserved on output. Setting a directive that already
/// exists replaces its values in place.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CspPolicy {
    directives: Vec<Directive>,

    /// Report violations only (doesn't enforce)
    report_only: bool,
}

impl CspPolicy {
    /// Create an empty policy
    pub fn new() -> Self {
        Self::default()
    }

    /// The canonical policy for `mode`
    pub fn for_mode(mode: RuntimeMode) -> Self {
        match mode {
            RuntimeMode::Development => DEVELOPMENT_POLICY.clone(),
            RuntimeMode::Production => PRODUCTION_POLICY.clone(),
        }
    }

    fn from_table(table: DirectiveTable) -> Self {
        table
            .iter()
            .fold(Self::new(), |policy, (name, values)| {
                policy.directive(*name, values.iter().copied())
            })
    }

    /// Add or replace a directive
    pub fn directive<I, S>(mut self, name: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let directive = Directive::new(name, values);
        match self.directives.iter_mut().find(|d| d.name == directive.name) {
            Some(existing) => *existing = directive,
            None => self.directives.push(directive),
        }
        self
    }

    /// Add a value-less directive such as `upgrade-insecure-requests`
    pub fn flag(self, name: impl Into<String>) -> Self {
        self.directive(name, std::iter::empty::<String>())
    }

    /// Enable report-only mode
    pub fn report_only(mut self, enabled: bool) -> Self {
        self.report_only = enabled;
        self
    }

    pub fn is_report_only(&self) -> bool {
        self.report_only
    }

    pub fn directives(&self) -> &[Directive] {
        &self.directives
    }

    pub fn get(&self, name: &str) -> Option<&Directive> {
        self.directives.iter().find(|d| d.name == name)
    }

    /// Header name matching the report-only flag
    pub fn header_name(&self) -> &'static str {
        if self.report_only {
            REPORT_ONLY_HEADER_NAME
        } else {
            HEADER_NAME
        }
    }

    /// Convert to header value
    pub fn to_header_value(&self) -> String {
        self.directives
            .iter()
            .map(Directive::to_string)
            .collect::<Vec<_>>()
            .join(DIRECTIVE_SEPARATOR)
    }
}

impl fmt::Display for CspPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_header_value())
    }
}

/// Strict parse of a header value, keeping directive order.
///
/// Unlike [`parse_policy`](crate::parser::parse_policy) this rejects unknown
/// and repeated directive names.
impl FromStr for CspPolicy {
    type Err = PolicyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let issues = validate_policy(s);
        if !issues.is_empty() {
            return Err(PolicyError::Invalid(issues));
        }

        let policy = s
            .split(';')
            .filter_map(|segment| {
                let mut tokens = segment.split_whitespace();
                tokens.next().map(|name| (name, tokens))
            })
            .fold(Self::new(), |policy, (name, values)| policy.directive(name, values));

        if policy.directives.is_empty() {
            return Err(PolicyError::Empty);
        }
        Ok(policy)
    }
}
