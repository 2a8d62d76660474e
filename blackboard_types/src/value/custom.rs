//! Extension values - payloads of registered custom types.

use serde::Serialize;
use std::any::Any;
use std::fmt::Debug;
use std::rc::Rc;

/// Object-safe view of a custom payload.
///
/// Implemented for every `Debug + PartialEq + Serialize + 'static` type.
pub trait CustomData: Any + Debug {
    fn as_any(&self) -> &dyn Any;

    /// Structural equality against another payload; false across types.
    fn eq_dyn(&self, other: &dyn CustomData) -> bool;

    fn to_json(&self) -> serde_json::Result<serde_json::Value>;
}

impl<T> CustomData for T
where
    T: Any + Debug + PartialEq + Serialize,
{
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn eq_dyn(&self, other: &dyn CustomData) -> bool {
        other
            .as_any()
            .downcast_ref::<T>()
            .map_or(false, |other| self == other)
    }

    fn to_json(&self) -> serde_json::Result<serde_json::Value> {
        serde_json::to_value(self)
    }
}

/// A value of a registered extension type.
///
/// The payload is shared, so cloning is cheap; equality is structural.
#[derive(Debug, Clone)]
pub struct CustomValue {
    type_name: &'static str,
    data: Rc<dyn CustomData>,
}

impl CustomValue {
    /// Wrap a payload under the given durable type name.
    pub fn new<T: CustomData>(type_name: &'static str, data: T) -> Self {
        Self {
            type_name,
            data: Rc::new(data),
        }
    }

    /// Durable name of the extension type.
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Borrow the payload as `T`.
    pub fn downcast_ref<T: 'static>(&self) -> Option<&T> {
        self.data.as_any().downcast_ref::<T>()
    }

    /// Serialize the payload for a durable snapshot.
    pub fn to_json(&self) -> serde_json::Result<serde_json::Value> {
        self.data.to_json()
    }
}

impl PartialEq for CustomValue {
    fn eq(&self, other: &Self) -> bool {
        self.type_name == other.type_name && self.data.eq_dyn(other.data.as_ref())
    }
}
