//! CLI output: pretty JSON for results, stable strings for errors.

use crate::error::ApiError;
use serde_json::Value;

/// Map domain errors to a string for CLI output.
pub fn map_error(e: &ApiError) -> String {
    match e {
        ApiError::TemplateNotFound(path) => {
            format!("Template not found: {} (check context_dir)", path.display())
        }
        other => other.to_string(),
    }
}

pub fn to_pretty_json(value: &Value) -> String {
    // Serializing a Value cannot fail
    serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
}
