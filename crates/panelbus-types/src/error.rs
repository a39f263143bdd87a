use serde_json::Value;
use thiserror::Error;

/// A malformed call to the public bus API.
///
/// Raised synchronously on the caller's turn, before anything is registered
/// or handed to a transport. The display form is part of the public
/// contract and is matched verbatim by callers.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("argument \"{parameter}\" must be {expected}, but you provided a(n) {actual}")]
pub struct ArgumentError {
    /// Name of the offending parameter (e.g. `handler`).
    pub parameter: String,
    /// Human-readable expected type, including its article (e.g. `a function`).
    pub expected: String,
    /// Runtime type of the value that was supplied.
    pub actual: String,
}

impl ArgumentError {
    pub fn new(
        parameter: impl Into<String>,
        expected: impl Into<String>,
        actual: impl Into<String>,
    ) -> Self {
        Self {
            parameter: parameter.into(),
            expected: expected.into(),
            actual: actual.into(),
        }
    }

    /// A non-callable value was supplied where a handler was expected.
    pub fn not_a_function(parameter: impl Into<String>, supplied: &Value) -> Self {
        Self::new(parameter, "a function", runtime_type(supplied))
    }

    /// An empty string was supplied where a name was expected.
    pub fn empty_name(parameter: impl Into<String>) -> Self {
        Self::new(parameter, "a non-empty string", "empty string")
    }
}

/// Runtime type name of a dynamic value, in the dashboard scripting vocabulary.
pub fn runtime_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_not_a_function_display_is_verbatim() {
        let err = ArgumentError::not_a_function("handler", &json!("test"));
        assert_eq!(
            err.to_string(),
            "argument \"handler\" must be a function, but you provided a(n) string"
        );
    }

    #[test]
    fn test_runtime_type_names() {
        assert_eq!(runtime_type(&Value::Null), "null");
        assert_eq!(runtime_type(&json!(true)), "boolean");
        assert_eq!(runtime_type(&json!(1.5)), "number");
        assert_eq!(runtime_type(&json!("x")), "string");
        assert_eq!(runtime_type(&json!([1, 2])), "array");
        assert_eq!(runtime_type(&json!({"a": 1})), "object");
    }

    #[test]
    fn test_empty_name_display() {
        let err = ArgumentError::empty_name("message_name");
        assert_eq!(
            err.to_string(),
            "argument \"message_name\" must be a non-empty string, but you provided a(n) empty string"
        );
    }
}
