//! Value model - every kind of data a blackboard can hold.
//!
//! Values are a closed tagged union over the built-in kinds plus a
//! [`Value::Custom`] escape hatch for types added through the
//! [`TypeRegistry`](crate::TypeRegistry). Typed access goes through the
//! [`BlackboardType`] trait so callers never match on [`Value`] directly.

mod custom;
mod object;
mod vector;

pub use custom::*;
pub use object::*;
pub use vector::*;

use std::rc::Rc;

/// Shared, homogeneous list value.
///
/// Lists are compared by identity when deciding whether a write changed
/// anything, so writing the same `Rc` back is a no-op while writing a fresh
/// list with equal contents is a change.
pub type List<T> = Rc<Vec<T>>;

/// Coarse grouping used to order types for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TypeGroup {
    Primitive,
    Engine,
    List,
    Custom,
}

/// Type tag attached to every stored value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueType {
    Int,
    Float,
    Bool,
    String,
    Vector3,
    Object,
    IntList,
    FloatList,
    BoolList,
    StringList,
    Vector3List,
    ObjectList,
    /// A registered extension type, identified by its durable type name.
    Custom(&'static str),
}

impl ValueType {
    /// All built-in types, in declaration order.
    pub const BUILTINS: [ValueType; 12] = [
        ValueType::Int,
        ValueType::Float,
        ValueType::Bool,
        ValueType::String,
        ValueType::Vector3,
        ValueType::Object,
        ValueType::IntList,
        ValueType::FloatList,
        ValueType::BoolList,
        ValueType::StringList,
        ValueType::Vector3List,
        ValueType::ObjectList,
    ];

    /// Name used in durable snapshots.
    pub fn type_name(&self) -> &'static str {
        match self {
            ValueType::Int => "int",
            ValueType::Float => "float",
            ValueType::Bool => "bool",
            ValueType::String => "string",
            ValueType::Vector3 => "vector3",
            ValueType::Object => "object",
            ValueType::IntList => "list<int>",
            ValueType::FloatList => "list<float>",
            ValueType::BoolList => "list<bool>",
            ValueType::StringList => "list<string>",
            ValueType::Vector3List => "list<vector3>",
            ValueType::ObjectList => "list<object>",
            ValueType::Custom(name) => *name,
        }
    }

    /// Look up a built-in type by its durable name.
    pub fn builtin_from_name(name: &str) -> Option<ValueType> {
        Self::BUILTINS
            .iter()
            .copied()
            .find(|value_type| value_type.type_name() == name)
    }

    /// Get the display group of this type.
    pub fn group(&self) -> TypeGroup {
        match self {
            ValueType::Int | ValueType::Float | ValueType::Bool | ValueType::String => {
                TypeGroup::Primitive
            }
            ValueType::Vector3 | ValueType::Object => TypeGroup::Engine,
            ValueType::Custom(_) => TypeGroup::Custom,
            _ => TypeGroup::List,
        }
    }
}

impl std::fmt::Display for ValueType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.type_name())
    }
}

/// A single stored value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Int(i32),
    Float(f32),
    Bool(bool),
    String(String),
    Vector3(Vector3),
    Object(ObjectRef),
    IntList(List<i32>),
    FloatList(List<f32>),
    BoolList(List<bool>),
    StringList(List<String>),
    Vector3List(List<Vector3>),
    ObjectList(List<ObjectRef>),
    Custom(CustomValue),
}

impl Value {
    /// Get the type tag of this value.
    pub fn value_type(&self) -> ValueType {
        match self {
            Value::Int(_) => ValueType::Int,
            Value::Float(_) => ValueType::Float,
            Value::Bool(_) => ValueType::Bool,
            Value::String(_) => ValueType::String,
            Value::Vector3(_) => ValueType::Vector3,
            Value::Object(_) => ValueType::Object,
            Value::IntList(_) => ValueType::IntList,
            Value::FloatList(_) => ValueType::FloatList,
            Value::BoolList(_) => ValueType::BoolList,
            Value::StringList(_) => ValueType::StringList,
            Value::Vector3List(_) => ValueType::Vector3List,
            Value::ObjectList(_) => ValueType::ObjectList,
            Value::Custom(custom) => ValueType::Custom(custom.type_name()),
        }
    }

    /// Change-detection equality.
    ///
    /// Scalars, vectors and custom values compare structurally (NaN equals
    /// NaN). Lists compare by identity and object references by handle.
    /// Values of different types are never the same.
    pub fn same_as(&self, other: &Value) -> bool {
        match (self, other) {
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b || (a.is_nan() && b.is_nan()),
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Vector3(a), Value::Vector3(b)) => a.same_as(b),
            (Value::Object(a), Value::Object(b)) => a == b,
            (Value::IntList(a), Value::IntList(b)) => Rc::ptr_eq(a, b),
            (Value::FloatList(a), Value::FloatList(b)) => Rc::ptr_eq(a, b),
            (Value::BoolList(a), Value::BoolList(b)) => Rc::ptr_eq(a, b),
            (Value::StringList(a), Value::StringList(b)) => Rc::ptr_eq(a, b),
            (Value::Vector3List(a), Value::Vector3List(b)) => Rc::ptr_eq(a, b),
            (Value::ObjectList(a), Value::ObjectList(b)) => Rc::ptr_eq(a, b),
            (Value::Custom(a), Value::Custom(b)) => a == b,
            _ => false,
        }
    }

    /// Borrow the payload of a custom value as `T`.
    pub fn as_custom<T: 'static>(&self) -> Option<&T> {
        match self {
            Value::Custom(custom) => custom.downcast_ref::<T>(),
            _ => None,
        }
    }
}

/// Rust types that can be stored in a blackboard.
///
/// Built-in kinds are implemented here. Extension types implement it with
/// [`CustomValue`]:
///
/// ```
/// use blackboard_types::{BlackboardType, CustomValue, Value, ValueType};
/// use serde::{Deserialize, Serialize};
///
/// #[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
/// struct Patrol {
///     waypoints: u32,
/// }
///
/// impl BlackboardType for Patrol {
///     fn value_type() -> ValueType {
///         ValueType::Custom("patrol")
///     }
///
///     fn into_value(self) -> Value {
///         Value::Custom(CustomValue::new("patrol", self))
///     }
///
///     fn from_value(value: &Value) -> Option<Self> {
///         value.as_custom::<Self>().cloned()
///     }
/// }
/// ```
pub trait BlackboardType: Sized + 'static {
    /// The exact type tag values of this type are stored under.
    fn value_type() -> ValueType;

    /// Wrap into a [`Value`].
    fn into_value(self) -> Value;

    /// Extract from a [`Value`]; `None` if the variant does not match.
    /// Never converts between kinds.
    fn from_value(value: &Value) -> Option<Self>;
}

macro_rules! builtin_type {
    ($ty:ty, $variant:ident) => {
        impl BlackboardType for $ty {
            fn value_type() -> ValueType {
                ValueType::$variant
            }

            fn into_value(self) -> Value {
                Value::$variant(self)
            }

            fn from_value(value: &Value) -> Option<Self> {
                match value {
                    Value::$variant(inner) => Some(inner.clone()),
                    _ => None,
                }
            }
        }

        impl From<$ty> for Value {
            fn from(inner: $ty) -> Self {
                Value::$variant(inner)
            }
        }
    };
}

builtin_type!(i32, Int);
builtin_type!(f32, Float);
builtin_type!(bool, Bool);
builtin_type!(String, String);
builtin_type!(Vector3, Vector3);
builtin_type!(ObjectRef, Object);
builtin_type!(List<i32>, IntList);
builtin_type!(List<f32>, FloatList);
builtin_type!(List<bool>, BoolList);
builtin_type!(List<String>, StringList);
builtin_type!(List<Vector3>, Vector3List);
builtin_type!(List<ObjectRef>, ObjectList);

impl From<&str> for Value {
    fn from(inner: &str) -> Self {
        Value::String(inner.to_owned())
    }
}
