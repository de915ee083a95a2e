//! Parsing and linting of policy strings.

use crate::directive::is_known_directive_name;
use std::collections::{HashMap, HashSet};
use std::fmt;

/// Parse a policy into `directive name -> values`.
///
/// Segments are split on `;` and trimmed; empty segments are skipped. Within a
/// segment the first token is the name and the rest are its values. A name
/// that appears twice keeps only its last occurrence.
pub fn parse_policy(policy: &str) -> HashMap<String, Vec<String>> {
    let mut directives = HashMap::new();

    for segment in segments(policy) {
        let mut tokens = segment.split_whitespace();
        if let Some(name) = tokens.next() {
            directives.insert(name.to_string(), tokens.map(str::to_string).collect());
        }
    }

    directives
}

fn segments(policy: &str) -> impl Iterator<Item = &str> {
    policy
        .split(';')
        .map(str::trim)
        .filter(|segment| !segment.is_empty())
}

/// Problem found by [`validate_policy`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PolicyIssue {
    /// The segment's name is not in the known directive set
    UnknownDirective(String),
    /// The name appears more than once; only the last occurrence takes effect
    DuplicateDirective(String),
}

impl fmt::Display for PolicyIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PolicyIssue::UnknownDirective(name) => write!(f, "unknown directive '{}'", name),
            PolicyIssue::DuplicateDirective(name) => {
                write!(f, "directive '{}' is declared more than once", name)
            }
        }
    }
}

/// Lint an externally supplied policy string.
///
/// Issues are reported in segment order. An empty result means every
/// directive name is known and declared once.
pub fn validate_policy(policy: &str) -> Vec<PolicyIssue> {
    let mut issues = Vec::new();
    let mut seen = HashSet::new();

    for segment in segments(policy) {
        let name = segment.split_whitespace().next().unwrap_or(segment);

        if !is_known_directive_name(segment) {
            issues.push(PolicyIssue::UnknownDirective(name.to_string()));
        }
        if !seen.insert(name) {
            issues.push(PolicyIssue::DuplicateDirective(name.to_string()));
        }
    }

    issues
}

/// Whether [`validate_policy`] finds nothing to report.
pub fn is_valid_policy(policy: &str) -> bool {
    validate_policy(policy).is_empty()
}
