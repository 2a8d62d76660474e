//! Durable snapshot - the JSON form of an asset's entry list.

use blackboard_types::{Entry, EntryRecord, TypeRegistry};
use log::warn;
use serde::{Deserialize, Serialize};

use super::SyncReport;
use crate::error::Result;

/// Ordered list of `{ key, type, value }` records.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AssetSnapshot {
    #[serde(default)]
    pub entries: Vec<EntryRecord>,
}

impl AssetSnapshot {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Encode entries through `registry`. Entries that fail to encode are
    /// skipped with a warning.
    pub fn encode(entries: &[Entry], registry: &TypeRegistry) -> (Self, SyncReport) {
        let mut report = SyncReport::default();
        let mut records = Vec::with_capacity(entries.len());

        for entry in entries {
            match registry.encode_entry(entry) {
                Ok(record) => {
                    records.push(record);
                    report.loaded += 1;
                }
                Err(err) => {
                    warn!("Skipping entry '{}' on save: {}", entry.key(), err);
                    report.skip(entry.key());
                }
            }
        }
        (Self { entries: records }, report)
    }

    /// Decode every record through `registry`. Records with an unknown type
    /// name or an undecodable payload are skipped with a warning.
    pub fn decode(&self, registry: &TypeRegistry) -> (Vec<Entry>, SyncReport) {
        let mut report = SyncReport::default();
        let mut entries = Vec::with_capacity(self.entries.len());

        for record in &self.entries {
            match registry.decode_record(record) {
                Ok(entry) => {
                    entries.push(entry);
                    report.loaded += 1;
                }
                Err(err) => {
                    warn!("Skipping entry '{}' on load: {}", record.key, err);
                    report.skip(&record.key);
                }
            }
        }
        (entries, report)
    }
}
