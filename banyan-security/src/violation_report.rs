//! Browser CSP violation reports.
//!
//! A report is a JSON object with a single `csp-report` member. Validation is
//! structural and presence-only: every required field must exist as a key,
//! whatever its value.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Top-level key holding the report body.
pub const REPORT_KEY: &str = "csp-report";

/// Fields a report body must contain.
pub const REQUIRED_FIELDS: [&str; 7] = [
    "blocked-uri",
    "document-uri",
    "effective-directive",
    "violated-directive",
    "original-policy",
    "referrer",
    "status-code",
];

/// Whether `report` has a `csp-report` object containing every required field.
///
/// Never panics on missing or mistyped members; those simply yield `false`.
pub fn validate_violation_report(report: &Value) -> bool {
    report
        .get(REPORT_KEY)
        .and_then(Value::as_object)
        .is_some_and(|body| REQUIRED_FIELDS.iter().all(|field| body.contains_key(*field)))
}

/// The missing required fields, in declaration order.
///
/// Every field is reported missing when the `csp-report` object is absent.
pub fn missing_fields(report: &Value) -> Vec<&'static str> {
    let body = report.get(REPORT_KEY).and_then(Value::as_object);

    REQUIRED_FIELDS
        .iter()
        .copied()
        .filter(|field| !body.is_some_and(|b| b.contains_key(*field)))
        .collect()
}

/// A validated violation, with every field rendered as text.
///
/// String values are kept verbatim; any other JSON value (numbers, `null`,
/// objects) is kept as its JSON text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct CspViolation {
    pub blocked_uri: String,
    pub document_uri: String,
    pub effective_directive: String,
    pub violated_directive: String,
    pub original_policy: String,
    pub referrer: String,
    pub status_code: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_file: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line_number: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub column_number: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disposition: Option<String>,
}

impl CspViolation {
    /// Project a report into a violation.
    ///
    /// Returns `None` exactly when [`validate_violation_report`] is `false`.
    pub fn from_report(report: &Value) -> Option<Self> {
        if !validate_violation_report(report) {
            return None;
        }
        let body = report.get(REPORT_KEY)?.as_object()?;
        let text = |key: &str| body.get(key).map(value_text).unwrap_or_default();

        Some(Self {
            blocked_uri: text("blocked-uri"),
            document_uri: text("document-uri"),
            effective_directive: text("effective-directive"),
            violated_directive: text("violated-directive"),
            original_policy: text("original-policy"),
            referrer: text("referrer"),
            status_code: text("status-code"),
            source_file: body.get("source-file").map(value_text),
            line_number: body.get("line-number").and_then(Value::as_u64),
            column_number: body.get("column-number").and_then(Value::as_u64),
            disposition: body
                .get("disposition")
                .and_then(Value::as_str)
                .map(str::to_string),
        })
    }
}

fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
