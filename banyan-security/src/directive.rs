//! CSP directives and the closed set of directive names we recognise.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Directive names accepted by [`is_known_directive_name`].
///
/// Exactly the names the production policy emits.
pub const KNOWN_DIRECTIVES: [&str; 18] = [
    "default-src",
    "script-src",
    "style-src",
    "img-src",
    "font-src",
    "connect-src",
    "media-src",
    "object-src",
    "frame-src",
    "frame-ancestors",
    "base-uri",
    "form-action",
    "manifest-src",
    "worker-src",
    "child-src",
    "upgrade-insecure-requests",
    "block-all-mixed-content",
    "report-uri",
];

/// One named CSP rule and its source expressions, in order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Directive {
    pub name: String,
    pub values: Vec<String>,
}

impl Directive {
    pub fn new<I, S>(name: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            values: values.into_iter().map(Into::into).collect(),
        }
    }

    /// A directive that takes no values, e.g. `upgrade-insecure-requests`.
    pub fn flag(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            values: Vec::new(),
        }
    }

    pub fn is_known(&self) -> bool {
        KNOWN_DIRECTIVES.contains(&self.name.as_str())
    }
}

impl fmt::Display for Directive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)?;
        for value in &self.values {
            write!(f, " {}", value)?;
        }
        Ok(())
    }
}

/// Whether the first token of `segment` is a known directive name.
///
/// `segment` is one `name value value ...` piece of a policy. Only the text
/// before the first space is inspected; values are never checked.
pub fn is_known_directive_name(segment: &str) -> bool {
    let name = segment
        .split_once(' ')
        .map(|(name, _)| name)
        .unwrap_or(segment);

    KNOWN_DIRECTIVES.contains(&name)
}
