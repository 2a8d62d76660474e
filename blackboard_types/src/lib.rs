//! # Blackboard Types
//!
//! The data side of the blackboard: what can be stored and how it persists.
//! This crate holds the value model, the persisted entry unit and the type
//! registry. It has no store logic; `blackboard_core` builds on it.
//!
//! ## Contents
//!
//! - **value**: [`Value`], [`ValueType`] and the [`BlackboardType`] typed-access trait
//! - **entry**: [`Entry`] and its durable [`EntryRecord`] form
//! - **registry**: [`TypeRegistry`], the value type -> factory map

pub mod entry;
pub mod error;
pub mod registry;
pub mod value;

pub use entry::*;
pub use error::*;
pub use registry::*;
pub use value::*;
