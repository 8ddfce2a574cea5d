//! Vocabulary façades pre-bound to one extension.

use std::sync::Arc;

use vidhub_core::constants::{ConstantFamily, ConstantKey, ConstantTable};

use crate::constants::ConstantRegistry;

/// Adds and deletes entries of one family on behalf of one extension.
///
/// Used for languages, licences and categories.
#[derive(Debug, Clone)]
pub struct ConstantManager {
    npm_name: String,
    family: ConstantFamily,
    constants: Arc<ConstantRegistry>,
}

impl ConstantManager {
    pub(crate) fn new(npm_name: &str, family: ConstantFamily, constants: Arc<ConstantRegistry>) -> Self {
        Self {
            npm_name: npm_name.to_string(),
            family,
            constants,
        }
    }

    /// Family this manager edits.
    pub fn family(&self) -> ConstantFamily {
        self.family
    }

    /// Adds an entry; `false` if the key already exists.
    pub async fn add_constant(&self, key: impl Into<ConstantKey>, label: &str) -> bool {
        self.constants
            .add_constant(&self.npm_name, self.family, key.into(), label)
            .await
    }

    /// Deletes an entry; `false` if the key does not exist.
    pub async fn delete_constant(&self, key: impl Into<ConstantKey>) -> bool {
        self.constants
            .delete_constant(&self.npm_name, self.family, &key.into())
            .await
    }

    /// Current label of a key.
    pub async fn get_constant_value(&self, key: impl Into<ConstantKey>) -> Option<String> {
        self.constants.label(self.family, &key.into()).await
    }

    /// Current table.
    pub async fn get_constants(&self) -> ConstantTable {
        self.constants.table(self.family).await
    }
}

/// Deletes entries of a privacy family on behalf of one extension.
#[derive(Debug, Clone)]
pub struct PrivacyManager {
    inner: ConstantManager,
}

impl PrivacyManager {
    pub(crate) fn new(npm_name: &str, family: ConstantFamily, constants: Arc<ConstantRegistry>) -> Self {
        Self {
            inner: ConstantManager::new(npm_name, family, constants),
        }
    }

    /// Deletes a privacy; `false` if it does not exist.
    pub async fn delete_constant(&self, key: u32) -> bool {
        self.inner.delete_constant(key).await
    }

    /// Current table.
    pub async fn get_constants(&self) -> ConstantTable {
        self.inner.get_constants().await
    }
}
