//! Constant registry: reversible patches over the shared video vocabularies.
//!
//! Every accepted change is recorded in the owning extension's
//! [`ConstantDelta`], so unregistering the extension can put the live tables
//! back the way they were before it ran.

use std::collections::{BTreeMap, HashMap};

use serde::Serialize;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use vidhub_core::constants::{ConstantFamily, ConstantKey, ConstantTable};

/// A recorded vocabulary entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConstantEntry {
    /// Entry key.
    pub key: ConstantKey,
    /// Label at the time of the change.
    pub label: String,
}

/// Changes one extension made to one family.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ConstantDelta {
    /// Entries the extension inserted.
    pub added: Vec<ConstantEntry>,
    /// Entries the extension removed, with their previous labels.
    pub deleted: Vec<ConstantEntry>,
}

#[derive(Debug, Default)]
struct ConstantState {
    tables: HashMap<ConstantFamily, ConstantTable>,
    deltas: HashMap<String, BTreeMap<ConstantFamily, ConstantDelta>>,
}

/// Shared vocabulary tables plus the per-extension undo log.
#[derive(Debug)]
pub struct ConstantRegistry {
    state: RwLock<ConstantState>,
}

impl ConstantRegistry {
    /// Creates a registry over the given tables.
    pub fn new(tables: HashMap<ConstantFamily, ConstantTable>) -> Self {
        Self {
            state: RwLock::new(ConstantState {
                tables,
                deltas: HashMap::new(),
            }),
        }
    }

    /// Creates a registry seeded with the built-in vocabularies.
    pub fn with_defaults() -> Self {
        let tables = ConstantFamily::ALL
            .iter()
            .map(|family| (*family, family.default_table()))
            .collect();
        Self::new(tables)
    }

    /// Inserts `key` into `family` on behalf of `npm_name`.
    ///
    /// Returns `false` without changing anything if the key already exists.
    pub async fn add_constant(
        &self,
        npm_name: &str,
        family: ConstantFamily,
        key: ConstantKey,
        label: &str,
    ) -> bool {
        let mut state = self.state.write().await;
        let table = state.tables.entry(family).or_default();

        if table.contains_key(&key) {
            warn!(
                npm_name = %npm_name,
                family = %family,
                key = %key,
                "Cannot add constant: key already exists"
            );
            return false;
        }

        table.insert(key.clone(), label.to_string());
        state
            .deltas
            .entry(npm_name.to_string())
            .or_default()
            .entry(family)
            .or_default()
            .added
            .push(ConstantEntry {
                key: key.clone(),
                label: label.to_string(),
            });

        debug!(npm_name = %npm_name, family = %family, key = %key, "Constant added");
        true
    }

    /// Removes `key` from `family` on behalf of `npm_name`.
    ///
    /// Returns `false` without changing anything if the key does not exist.
    /// Deleting a key the same extension added cancels the addition.
    pub async fn delete_constant(
        &self,
        npm_name: &str,
        family: ConstantFamily,
        key: &ConstantKey,
    ) -> bool {
        let mut state = self.state.write().await;

        let Some(previous) = state
            .tables
            .get_mut(&family)
            .and_then(|table| table.remove(key))
        else {
            warn!(
                npm_name = %npm_name,
                family = %family,
                key = %key,
                "Cannot delete constant: key does not exist"
            );
            return false;
        };

        let delta = state
            .deltas
            .entry(npm_name.to_string())
            .or_default()
            .entry(family)
            .or_default();

        if let Some(pos) = delta.added.iter().position(|e| &e.key == key) {
            delta.added.remove(pos);
        } else {
            delta.deleted.push(ConstantEntry {
                key: key.clone(),
                label: previous,
            });
        }

        debug!(npm_name = %npm_name, family = %family, key = %key, "Constant deleted");
        true
    }

    /// Undoes every change `npm_name` made, then forgets its delta.
    ///
    /// No-op for an extension without a delta.
    pub async fn revert_all(&self, npm_name: &str) {
        let mut state = self.state.write().await;

        let Some(deltas) = state.deltas.remove(npm_name) else {
            return;
        };

        for (family, delta) in deltas {
            let table = state.tables.entry(family).or_default();

            for entry in &delta.added {
                table.remove(&entry.key);
            }
            for entry in delta.deleted {
                table.insert(entry.key, entry.label);
            }
        }

        info!(npm_name = %npm_name, "Constants reverted");
    }

    /// Returns a copy of a live table.
    pub async fn table(&self, family: ConstantFamily) -> ConstantTable {
        let state = self.state.read().await;
        state.tables.get(&family).cloned().unwrap_or_default()
    }

    /// Looks up a single label.
    pub async fn label(&self, family: ConstantFamily, key: &ConstantKey) -> Option<String> {
        let state = self.state.read().await;
        state.tables.get(&family).and_then(|t| t.get(key).cloned())
    }

    /// Returns the recorded delta of an extension for a family, if any.
    pub async fn delta(&self, npm_name: &str, family: ConstantFamily) -> Option<ConstantDelta> {
        let state = self.state.read().await;
        state
            .deltas
            .get(npm_name)
            .and_then(|families| families.get(&family).cloned())
    }
}

impl Default for ConstantRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}
