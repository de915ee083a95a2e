//! Companion security headers sent alongside the CSP.

use std::fmt;

/// X-Frame-Options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameGuard {
    Deny,
    SameOrigin,
}

impl FrameGuard {
    pub fn to_header_value(&self) -> &'static str {
        match self {
            Self::Deny => "DENY",
            Self::SameOrigin => "SAMEORIGIN",
        }
    }
}

/// Referrer-Policy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReferrerPolicy {
    NoReferrer,
    SameOrigin,
    StrictOrigin,
    StrictOriginWhenCrossOrigin,
}

impl ReferrerPolicy {
    pub fn to_header_value(&self) -> &'static str {
        match self {
            Self::NoReferrer => "no-referrer",
            Self::SameOrigin => "same-origin",
            Self::StrictOrigin => "strict-origin",
            Self::StrictOriginWhenCrossOrigin => "strict-origin-when-cross-origin",
        }
    }
}

/// Strict-Transport-Security
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Hsts {
    pub max_age: u64,
    pub include_subdomains: bool,
    pub preload: bool,
}

impl Hsts {
    /// One year, subdomains included, preload-eligible.
    pub const ONE_YEAR: Hsts = Hsts {
        max_age: 31_536_000,
        include_subdomains: true,
        preload: true,
    };

    pub fn to_header_value(&self) -> String {
        let mut value = format!("max-age={}", self.max_age);
        if self.include_subdomains {
            value.push_str("; includeSubDomains");
        }
        if self.preload {
            value.push_str("; preload");
        }
        value
    }
}

/// Permissions-Policy listing browser features disabled for every origin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PermissionsPolicy {
    pub disabled: Vec<String>,
}

impl Default for PermissionsPolicy {
    fn default() -> Self {
        Self {
            disabled: ["camera", "microphone", "geolocation"]
                .into_iter()
                .map(String::from)
                .collect(),
        }
    }
}

impl fmt::Display for PermissionsPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let features: Vec<String> = self.disabled.iter().map(|f| format!("{}=()", f)).collect();
        f.write_str(&features.join(", "))
    }
}
