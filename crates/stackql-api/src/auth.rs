//! Normalization of provider credentials for `--auth`

use serde_json::Value;
use stackql_core::{Error, Result};

/// Credentials in both structured and wire form
#[derive(Debug, Clone, PartialEq)]
pub struct FormattedAuth {
    /// Parsed credentials document
    pub value: Value,
    /// Compact JSON passed to the binary
    pub text: String,
}

/// Normalize an auth setting.
///
/// A string is parsed as JSON; an object or array is used as is. Anything
/// else, including an absent or empty value, is a configuration error.
pub fn format_auth(auth: Option<&Value>) -> Result<FormattedAuth> {
    let value = match auth {
        None | Some(Value::Null) => return Err(no_value()),
        Some(Value::String(s)) if s.trim().is_empty() => return Err(no_value()),
        Some(Value::String(s)) => serde_json::from_str(s).map_err(|e| {
            Error::Configuration(format!("auth key supplied with invalid JSON: {}", e))
        })?,
        Some(v @ (Value::Object(_) | Value::Array(_))) => v.clone(),
        Some(_) => {
            return Err(Error::Configuration(
                "auth key supplied with invalid type".to_string(),
            ))
        }
    };

    let text = serde_json::to_string(&value).map_err(|e| Error::Serialization(e.to_string()))?;
    Ok(FormattedAuth { value, text })
}

fn no_value() -> Error {
    Error::Configuration("auth key supplied with no value".to_string())
}
