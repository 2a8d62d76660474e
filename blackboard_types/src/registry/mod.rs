//! Type registry - maps each storable value type to the factory that can
//! create, encode and decode it.
//!
//! The registry is populated by explicit registration. A store only accepts
//! values whose type its registry knows about, and snapshot decoding resolves
//! durable type names through it.

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::HashMap;
use std::marker::PhantomData;
use std::rc::Rc;

use crate::entry::{Entry, EntryRecord};
use crate::error::{Result, TypeError};
use crate::value::{BlackboardType, List, ObjectRef, Value, ValueType, Vector3};

/// Produces and (de)serializes values of one type.
pub trait ValueFactory {
    fn value_type(&self) -> ValueType;

    /// Human-readable name for tooling.
    fn display_name(&self) -> &str;

    /// Value a freshly created entry of this type holds.
    fn default_value(&self) -> Value;

    fn decode(&self, raw: serde_json::Value) -> Result<Value>;

    fn encode(&self, value: &Value) -> Result<serde_json::Value>;
}

/// Factory for any serde-capable [`BlackboardType`].
pub struct TypedFactory<T> {
    display_name: String,
    _marker: PhantomData<fn() -> T>,
}

impl<T> TypedFactory<T> {
    pub fn new(display_name: impl Into<String>) -> Self {
        Self {
            display_name: display_name.into(),
            _marker: PhantomData,
        }
    }
}

impl<T> ValueFactory for TypedFactory<T>
where
    T: BlackboardType + Default + Serialize + DeserializeOwned,
{
    fn value_type(&self) -> ValueType {
        T::value_type()
    }

    fn display_name(&self) -> &str {
        &self.display_name
    }

    fn default_value(&self) -> Value {
        T::default().into_value()
    }

    fn decode(&self, raw: serde_json::Value) -> Result<Value> {
        if raw.is_null() {
            return Ok(self.default_value());
        }
        serde_json::from_value::<T>(raw)
            .map(T::into_value)
            .map_err(|source| TypeError::Decode {
                type_name: T::value_type().type_name(),
                source,
            })
    }

    fn encode(&self, value: &Value) -> Result<serde_json::Value> {
        let typed = T::from_value(value).ok_or_else(|| TypeError::WrongVariant {
            expected: T::value_type().type_name(),
            found: value.value_type().type_name(),
        })?;
        serde_json::to_value(&typed).map_err(|source| TypeError::Encode {
            type_name: T::value_type().type_name(),
            source,
        })
    }
}

/// Registry of supported value types.
#[derive(Default)]
pub struct TypeRegistry {
    /// Durable type name -> factory.
    factories: HashMap<&'static str, Box<dyn ValueFactory>>,
}

thread_local! {
    static BUILTINS: Rc<TypeRegistry> = Rc::new(TypeRegistry::with_builtins());
}

impl TypeRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry holding every built-in value type.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.insert::<i32>("Int");
        registry.insert::<f32>("Float");
        registry.insert::<bool>("Bool");
        registry.insert::<String>("String");
        registry.insert::<Vector3>("Vector3");
        registry.insert::<ObjectRef>("Object");
        registry.insert::<List<i32>>("List<Int>");
        registry.insert::<List<f32>>("List<Float>");
        registry.insert::<List<bool>>("List<Bool>");
        registry.insert::<List<String>>("List<String>");
        registry.insert::<List<Vector3>>("List<Vector3>");
        registry.insert::<List<ObjectRef>>("List<Object>");
        registry
    }

    /// The shared built-in registry.
    ///
    /// Built on first use and never invalidated afterwards. Stores created
    /// without an explicit registry use it.
    pub fn shared_builtins() -> Rc<TypeRegistry> {
        BUILTINS.with(Rc::clone)
    }

    /// Register a type. A later registration for the same type replaces the
    /// earlier one.
    ///
    /// Fails with [`TypeError::NameTaken`] if the type's durable name already
    /// belongs to a different type, built-ins included.
    pub fn register<T>(&mut self, display_name: impl Into<String>) -> Result<&mut Self>
    where
        T: BlackboardType + Default + Serialize + DeserializeOwned,
    {
        self.register_factory(Box::new(TypedFactory::<T>::new(display_name)))
    }

    /// Register a hand-written factory. Same rules as [`TypeRegistry::register`].
    pub fn register_factory(&mut self, factory: Box<dyn ValueFactory>) -> Result<&mut Self> {
        let value_type = factory.value_type();
        let type_name = value_type.type_name();
        if let Some(existing) = self.factories.get(type_name) {
            if existing.value_type() != value_type {
                return Err(TypeError::NameTaken(type_name));
            }
        }
        self.factories.insert(type_name, factory);
        Ok(self)
    }

    fn insert<T>(&mut self, display_name: &str)
    where
        T: BlackboardType + Default + Serialize + DeserializeOwned,
    {
        let factory = TypedFactory::<T>::new(display_name);
        self.factories
            .insert(factory.value_type().type_name(), Box::new(factory));
    }

    /// Check whether a type is registered.
    pub fn supports(&self, value_type: &ValueType) -> bool {
        self.factory(value_type).is_some()
    }

    /// Get the factory for a type.
    pub fn factory(&self, value_type: &ValueType) -> Option<&dyn ValueFactory> {
        self.factories
            .get(value_type.type_name())
            .filter(|factory| factory.value_type() == *value_type)
            .map(|factory| &**factory)
    }

    /// Resolve a durable type name.
    pub fn resolve(&self, type_name: &str) -> Option<ValueType> {
        self.factories
            .get(type_name)
            .map(|factory| factory.value_type())
    }

    pub fn len(&self) -> usize {
        self.factories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }

    /// Display name for a type, falling back to its durable name.
    pub fn display_name(&self, value_type: &ValueType) -> String {
        self.factory(value_type)
            .map(|factory| factory.display_name().to_string())
            .unwrap_or_else(|| value_type.type_name().to_string())
    }

    /// All registered types with their display names.
    ///
    /// Ordered primitives first, then vectors and object references, then
    /// lists, then custom types; alphabetically by display name within each
    /// group.
    pub fn supported_types(&self) -> Vec<(String, ValueType)> {
        let mut types: Vec<(String, ValueType)> = self
            .factories
            .values()
            .map(|factory| (factory.display_name().to_string(), factory.value_type()))
            .collect();
        types.sort_by(|a, b| a.1.group().cmp(&b.1.group()).then_with(|| a.0.cmp(&b.0)));
        types
    }

    /// Create an entry holding the type's default value.
    pub fn create_entry(&self, key: impl Into<String>, value_type: &ValueType) -> Result<Entry> {
        let factory = self
            .factory(value_type)
            .ok_or(TypeError::Unregistered(value_type.type_name()))?;
        Ok(Entry::new(key, factory.default_value()))
    }

    /// Decode a durable record into an entry.
    pub fn decode_record(&self, record: &EntryRecord) -> Result<Entry> {
        let factory = self
            .factories
            .get(record.type_name.as_str())
            .ok_or_else(|| TypeError::UnknownTypeName(record.type_name.clone()))?;
        let value = factory.decode(record.value.clone())?;
        Ok(Entry::new(record.key.clone(), value))
    }

    /// Encode an entry into its durable record.
    pub fn encode_entry(&self, entry: &Entry) -> Result<EntryRecord> {
        let value_type = entry.value_type();
        let factory = self
            .factory(&value_type)
            .ok_or(TypeError::Unregistered(value_type.type_name()))?;
        let raw = factory.encode(entry.value())?;
        Ok(EntryRecord::new(entry.key(), value_type.type_name(), raw))
    }
}

impl std::fmt::Debug for TypeRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut names: Vec<&&'static str> = self.factories.keys().collect();
        names.sort();
        f.debug_struct("TypeRegistry").field("types", &names).finish()
    }
}
