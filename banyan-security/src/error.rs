// Policy errors

use crate::parser::PolicyIssue;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PolicyError {
    #[error("empty policy")]
    Empty,

    #[error("invalid policy: {}", join_issues(.0))]
    Invalid(Vec<PolicyIssue>),
}

fn join_issues(issues: &[PolicyIssue]) -> String {
    issues
        .iter()
        .map(PolicyIssue::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}
