//! Store configuration.

use serde::Deserialize;

use crate::error::Result;

/// How typed lookups treat a key defined at several levels of a chain with
/// different types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Shadowing {
    /// Each level is checked for the requested type only; a local key of
    /// another type does not hide an ancestor's key of the requested type.
    #[default]
    PerType,
    /// The nearest level defining the key name decides, whatever its type.
    ByName,
}

/// What happens when a subscriber writes the key it is being notified about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Reentrancy {
    /// The write fails with `ReentrantWrite` and nothing changes.
    #[default]
    Reject,
    /// The write goes through and notifies again. Avoiding endless loops is
    /// the subscriber's responsibility.
    Allow,
}

/// Per-store behavior switches.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub shadowing: Shadowing,
    pub reentrancy: Reentrancy,
    /// Longest parent chain a lookup will walk.
    pub max_chain_depth: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            shadowing: Shadowing::PerType,
            reentrancy: Reentrancy::Reject,
            max_chain_depth: 1024,
        }
    }
}

impl StoreConfig {
    /// Parse a configuration from TOML. Missing fields keep their defaults.
    pub fn from_toml_str(source: &str) -> Result<Self> {
        Ok(toml::from_str(source)?)
    }

    pub fn with_shadowing(mut self, shadowing: Shadowing) -> Self {
        self.shadowing = shadowing;
        self
    }

    pub fn with_reentrancy(mut self, reentrancy: Reentrancy) -> Self {
        self.reentrancy = reentrancy;
        self
    }

    pub fn with_max_chain_depth(mut self, depth: usize) -> Self {
        self.max_chain_depth = depth.max(1);
        self
    }
}
