//! Errors raised by the value model and the type registry.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum TypeError {
    #[error("unknown value type '{0}'")]
    UnknownTypeName(String),

    #[error("value type '{0}' is not registered")]
    Unregistered(&'static str),

    #[error("type name '{0}' is already registered for a different type")]
    NameTaken(&'static str),

    #[error("expected a '{expected}' value, found '{found}'")]
    WrongVariant {
        expected: &'static str,
        found: &'static str,
    },

    #[error("entry '{key}' holds '{from}' and cannot be changed to '{to}' in place")]
    TypeChanged {
        key: String,
        from: &'static str,
        to: &'static str,
    },

    #[error("failed to decode '{type_name}' value: {source}")]
    Decode {
        type_name: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to encode '{type_name}' value: {source}")]
    Encode {
        type_name: &'static str,
        #[source]
        source: serde_json::Error,
    },
}

pub type Result<T> = std::result::Result<T, TypeError>;
