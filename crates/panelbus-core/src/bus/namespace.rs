//! Resolution of short message names into qualified ids.

use panelbus_types::error::ArgumentError;
use panelbus_types::name::{BundleName, QualifiedMessageId};

use super::validate;

/// Qualify `message` with an explicit bundle, or with the caller's own bundle
/// when none is given.
pub fn resolve(
    message: &str,
    bundle: Option<&str>,
    context_bundle: &BundleName,
) -> Result<QualifiedMessageId, ArgumentError> {
    let message = validate::message_name(message)?;
    let bundle = match bundle {
        Some(name) => validate::bundle_name(name)?,
        None => context_bundle.clone(),
    };
    Ok(QualifiedMessageId::new(bundle, message))
}
