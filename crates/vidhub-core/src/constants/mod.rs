//! Video vocabularies shared by the whole platform.
//!
//! These tables are the live lookup data for categories, licences,
//! languages and privacies. Extensions may patch them at runtime through
//! the plugin host, which records every change so it can be reverted.

pub mod video;

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

pub use video::{
    default_categories, default_languages, default_licences, default_playlist_privacies,
    default_privacies,
};

/// Key of a vocabulary entry: numeric ids for categories, licences and
/// privacies; ISO codes for languages.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ConstantKey {
    /// Numeric identifier.
    Id(u32),
    /// String code.
    Code(String),
}

impl fmt::Display for ConstantKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Id(id) => write!(f, "{id}"),
            Self::Code(code) => write!(f, "{code}"),
        }
    }
}

impl From<u32> for ConstantKey {
    fn from(id: u32) -> Self {
        Self::Id(id)
    }
}

impl From<&str> for ConstantKey {
    fn from(code: &str) -> Self {
        Self::Code(code.to_string())
    }
}

impl From<String> for ConstantKey {
    fn from(code: String) -> Self {
        Self::Code(code)
    }
}

/// A live key → label table.
pub type ConstantTable = BTreeMap<ConstantKey, String>;

/// The vocabularies extensions are allowed to alter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ConstantFamily {
    /// Video languages.
    Language,
    /// Video licences.
    Licence,
    /// Video categories.
    Category,
    /// Video privacies (delete only).
    Privacy,
    /// Playlist privacies (delete only).
    PlaylistPrivacy,
}

impl ConstantFamily {
    /// Every family, in revert order.
    pub const ALL: [ConstantFamily; 5] = [
        Self::Language,
        Self::Licence,
        Self::Category,
        Self::Privacy,
        Self::PlaylistPrivacy,
    ];

    /// Returns the string name of this family.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Language => "language",
            Self::Licence => "licence",
            Self::Category => "category",
            Self::Privacy => "privacy",
            Self::PlaylistPrivacy => "playlistPrivacy",
        }
    }

    /// The built-in table for this family.
    pub fn default_table(&self) -> ConstantTable {
        match self {
            Self::Language => default_languages(),
            Self::Licence => default_licences(),
            Self::Category => default_categories(),
            Self::Privacy => default_privacies(),
            Self::PlaylistPrivacy => default_playlist_privacies(),
        }
    }
}

impl fmt::Display for ConstantFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
