//! Synchronous argument checks for the public API.
//!
//! Everything here runs on the caller's turn and has no side effects; a
//! failed check means nothing was registered and nothing was sent.

use panelbus_types::error::ArgumentError;
use panelbus_types::name::{BundleName, MessageName};

use super::handler::{Handler, HandlerArg};

/// Accept a callable handler, reject anything else.
pub fn require_handler(arg: HandlerArg) -> Result<Handler, ArgumentError> {
    match arg {
        HandlerArg::Callable(handler) => Ok(handler),
        HandlerArg::Dynamic(value) => Err(ArgumentError::not_a_function("handler", &value)),
    }
}

pub fn message_name(name: &str) -> Result<MessageName, ArgumentError> {
    MessageName::new(name)
}

pub fn bundle_name(name: &str) -> Result<BundleName, ArgumentError> {
    BundleName::new(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{Value, json};

    #[test]
    fn test_rejects_every_non_callable_value() {
        let cases = [
            (json!("test"), "string"),
            (json!(3), "number"),
            (json!(false), "boolean"),
            (Value::Null, "null"),
            (json!([]), "array"),
            (json!({}), "object"),
        ];
        for (value, type_name) in cases {
            let err = require_handler(HandlerArg::Dynamic(value)).unwrap_err();
            assert_eq!(
                err.to_string(),
                format!("argument \"handler\" must be a function, but you provided a(n) {type_name}")
            );
        }
    }

    #[test]
    fn test_accepts_callable() {
        let arg = HandlerArg::Callable(Handler::new(|_| Ok(())));
        assert!(require_handler(arg).is_ok());
    }

    #[test]
    fn test_empty_message_name_is_rejected() {
        let err = message_name("").unwrap_err();
        assert_eq!(err.parameter, "message_name");
        assert!(message_name("serverToDashboard").is_ok());
    }
}
