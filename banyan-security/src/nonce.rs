//! Nonce-scoped strict policy.
//!
//! The strict template drops `'unsafe-inline'`/`'unsafe-eval'` and instead
//! allows only scripts and styles carrying the per-request nonce.

use crate::content_security_policy::{CspPolicy, REPORT_URI};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use once_cell::sync::Lazy;
use rand::RngCore;

/// Placeholder replaced by the request nonce.
pub const NONCE_PLACEHOLDER: &str = "{NONCE}";

const NONCE_BYTES: usize = 16;

static STRICT_TEMPLATE: Lazy<String> = Lazy::new(|| {
    CspPolicy::new()
        .directive("default-src", ["'self'"])
        .directive("script-src", ["'self'", "'nonce-{NONCE}'", "'strict-dynamic'"])
        .directive(
            "style-src",
            ["'self'", "'nonce-{NONCE}'", "https://fonts.googleapis.com"],
        )
        .directive("img-src", ["'self'", "data:", "blob:", "https:"])
        .directive("font-src", ["'self'", "https://fonts.gstatic.com"])
        .directive(
            "connect-src",
            [
                "'self'",
                "https://api.banyanclaims.com",
                "https://banyan.backend.ricive.com",
                "wss:",
            ],
        )
        .directive("object-src", ["'none'"])
        .directive("frame-src", ["'none'"])
        .directive("frame-ancestors", ["'none'"])
        .directive("base-uri", ["'self'"])
        .directive("form-action", ["'self'"])
        .flag("upgrade-insecure-requests")
        .directive("report-uri", [REPORT_URI])
        .to_header_value()
});

/// The strict template with its `{NONCE}` placeholders intact.
pub fn strict_template() -> &'static str {
    STRICT_TEMPLATE.as_str()
}

/// The strict policy with every `{NONCE}` replaced by `nonce`.
///
/// The nonce is inserted verbatim. Callers must pass a value that cannot
/// terminate the surrounding `'nonce-...'` quoting; [`generate_nonce`]
/// always does.
pub fn build_nonce_scoped_policy(nonce: &str) -> String {
    STRICT_TEMPLATE.replace(NONCE_PLACEHOLDER, nonce)
}

/// A fresh base64 nonce built from 16 random bytes.
pub fn generate_nonce() -> String {
    let mut bytes = [0u8; NONCE_BYTES];
    rand::thread_rng().fill_bytes(&mut bytes);
    STANDARD.encode(bytes)
}
