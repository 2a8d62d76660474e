//! # Blackboard Core
//!
//! The runtime side of the blackboard. Stores hold typed values under string
//! keys, fall back to their parents on a miss, notify subscribers when a
//! value actually changes, and sync with a durable entry list.
//!
//! ## Core Components
//!
//! - **store**: [`Blackboard`], local reads/writes and change listeners
//! - **hierarchy**: parent links, cycle rejection and inherited lookups
//! - **persistence**: load/save/resync, single-key edits, [`BlackboardAsset`]
//! - **config**: [`StoreConfig`], per-store behavior switches loaded from TOML
//!
//! ## Example
//!
//! ```
//! use blackboard_core::Blackboard;
//!
//! let parent = Blackboard::new();
//! let child = Blackboard::new();
//! child.set_parent(Some(&parent)).unwrap();
//!
//! parent.set("Score", 50).unwrap();
//! assert_eq!(child.get("Score", -1), 50);
//!
//! child.set("Score", 80).unwrap();
//! assert_eq!(child.get("Score", -1), 80);
//! ```
//!
//! Everything here is single-threaded: handles are `Rc`-based and neither
//! `Send` nor `Sync`.

pub mod config;
pub mod error;
pub mod hierarchy;
pub mod persistence;
pub mod store;

pub use config::*;
pub use error::*;
pub use hierarchy::*;
pub use persistence::*;
pub use store::*;

pub use blackboard_types::{
    BlackboardType, CustomValue, Entry, EntryRecord, List, ObjectRef, TypeRegistry, Value,
    ValueType, Vector3,
};
