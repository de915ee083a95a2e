// Configuration validation

use crate::{ConfigError, Result};

/// Trait for validating configuration
pub trait Validate {
    fn validate(&self) -> Result<()>;
}

/// Validate that `value` looks like an absolute http(s) URL
pub fn http_url(value: &str, field: &str) -> Result<()> {
    let rest = value
        .strip_prefix("https://")
        .or_else(|| value.strip_prefix("http://"));

    match rest {
        Some(host) if !host.is_empty() && !host.starts_with('/') => Ok(()),
        _ => Err(ConfigError::invalid(
            field,
            value,
            "must be an absolute http:// or https:// URL",
        )),
    }
}

/// Validate that a number is within an inclusive range
pub fn in_range<T: PartialOrd + ToString>(value: T, min: T, max: T, field: &str) -> Result<()> {
    if value < min || value > max {
        return Err(ConfigError::invalid(
            field,
            &value.to_string(),
            format!("must be between {} and {}", min.to_string(), max.to_string()),
        ));
    }
    Ok(())
}
