//! Entries - the persisted `(key, type, value)` unit of blackboard state.

use serde::{Deserialize, Serialize};

use crate::error::{Result, TypeError};
use crate::value::{Value, ValueType};

/// One key of one blackboard, with its typed value.
///
/// The type of an entry is fixed for its lifetime: writing a value of a
/// different type means building a new `Entry`, never patching this one.
#[derive(Debug, Clone, PartialEq)]
pub struct Entry {
    key: String,
    value: Value,
}

impl Entry {
    /// Create a new entry.
    pub fn new(key: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }

    /// The key this entry is stored under.
    pub fn key(&self) -> &str {
        &self.key
    }

    /// The stored value.
    pub fn value(&self) -> &Value {
        &self.value
    }

    /// Type tag of the stored value.
    pub fn value_type(&self) -> ValueType {
        self.value.value_type()
    }

    /// Replace the value, keeping the entry's type.
    ///
    /// Returns the previous value, or [`TypeError::TypeChanged`] if `value`
    /// has a different type (the entry is left untouched).
    pub fn replace_value(&mut self, value: Value) -> Result<Value> {
        let current = self.value_type();
        let requested = value.value_type();
        if current != requested {
            return Err(TypeError::TypeChanged {
                key: self.key.clone(),
                from: current.type_name(),
                to: requested.type_name(),
            });
        }
        Ok(std::mem::replace(&mut self.value, value))
    }

    /// Split into key and value.
    pub fn into_parts(self) -> (String, Value) {
        (self.key, self.value)
    }
}

/// Durable form of an [`Entry`].
///
/// `type_name` must resolve through a [`TypeRegistry`](crate::TypeRegistry);
/// `value` is the type's JSON encoding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntryRecord {
    pub key: String,

    #[serde(rename = "type")]
    pub type_name: String,

    /// Missing payloads decode to the type's default.
    #[serde(default)]
    pub value: serde_json::Value,
}

impl EntryRecord {
    pub fn new(
        key: impl Into<String>,
        type_name: impl Into<String>,
        value: serde_json::Value,
    ) -> Self {
        Self {
            key: key.into(),
            type_name: type_name.into(),
            value,
        }
    }
}
