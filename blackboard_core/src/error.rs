//! Errors raised by stores, the hierarchy resolver and the persistence bridge.

use blackboard_types::TypeError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BlackboardError {
    #[error("blackboard cannot be its own parent")]
    SelfParent,

    #[error("cannot set parent: would create circular reference")]
    ParentCycle,

    #[error("cannot create key '{key}': key already exists in parent blackboard hierarchy")]
    ParentKeyConflict { key: String },

    #[error("value type '{type_name}' is not supported by this blackboard")]
    UnsupportedType { type_name: &'static str },

    #[error("write to '{key}' from inside its own change notification was rejected")]
    ReentrantWrite { key: String },

    #[error("snapshot error: {0}")]
    Snapshot(#[from] serde_json::Error),

    #[error("invalid configuration: {0}")]
    Config(#[from] toml::de::Error),

    #[error(transparent)]
    Type(#[from] TypeError),
}

pub type Result<T> = std::result::Result<T, BlackboardError>;
