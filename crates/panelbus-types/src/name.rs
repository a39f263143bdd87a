//! Bundle and message names, and the qualified id built from them.
//!
//! A message name is only unique inside its bundle's namespace, so every
//! registration and lookup goes through a [`QualifiedMessageId`].

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ArgumentError;

/// Name of a bundle (a plugin/extension unit owning a message namespace).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct BundleName(String);

/// Name of a message inside a bundle namespace. Case-sensitive.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct MessageName(String);

macro_rules! name_newtype {
    ($ty:ident, $param:literal) => {
        impl $ty {
            /// Validate and wrap a name. Empty names are rejected.
            pub fn new(name: impl Into<String>) -> Result<Self, ArgumentError> {
                let name = name.into();
                if name.is_empty() {
                    return Err(ArgumentError::empty_name($param));
                }
                Ok(Self(name))
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl TryFrom<String> for $ty {
            type Error = ArgumentError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                Self::new(value)
            }
        }

        impl TryFrom<&str> for $ty {
            type Error = ArgumentError;

            fn try_from(value: &str) -> Result<Self, Self::Error> {
                Self::new(value)
            }
        }

        impl From<$ty> for String {
            fn from(value: $ty) -> Self {
                value.0
            }
        }

        impl AsRef<str> for $ty {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

name_newtype!(BundleName, "bundle_name");
name_newtype!(MessageName, "message_name");

/// The true identity of a message: `(bundle, message)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct QualifiedMessageId {
    pub bundle: BundleName,
    pub message: MessageName,
}

impl QualifiedMessageId {
    pub fn new(bundle: BundleName, message: MessageName) -> Self {
        Self { bundle, message }
    }
}

impl fmt::Display for QualifiedMessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.bundle, self.message)
    }
}
