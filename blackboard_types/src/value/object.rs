//! Opaque object references.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Non-owning handle to an object living outside the blackboard
/// (a scene object, an entity, a transform).
///
/// The blackboard never dereferences it; equality is handle identity.
/// [`ObjectRef::nil`] stands for "no object".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct ObjectRef(pub Uuid);

impl ObjectRef {
    /// Create a new random object handle.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Create a handle from a specific UUID.
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// The null handle.
    pub fn nil() -> Self {
        Self(Uuid::nil())
    }

    /// Check whether this is the null handle.
    pub fn is_nil(&self) -> bool {
        self.0.is_nil()
    }
}

impl std::fmt::Display for ObjectRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
