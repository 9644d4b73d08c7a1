//! Flat persisted form of an item, shared by every item type.

use serde::{Deserialize, Serialize};

/// Persisted readiness. The failure reason of an item is transient and is
/// recomputed by the loader.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReadyState {
    #[default]
    Pending,
    Yes,
    Failed,
}

impl ReadyState {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Yes => "yes",
            Self::Failed => "failed",
        }
    }

    /// Unknown values read back as `Pending` so the loader revalidates them.
    pub fn parse_lossy(s: &str) -> Self {
        match s {
            "yes" => Self::Yes,
            "failed" => Self::Failed,
            _ => Self::Pending,
        }
    }
}

/// One catalog row. Superset of the fields of every item type.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ItemRecord {
    pub id: String,
    #[serde(rename = "type")]
    pub item_type: String,
    pub title: String,
    pub artist: Option<String>,
    pub album: Option<String>,
    pub path: Option<String>,
    pub url: Option<String>,
    pub tags: Vec<String>,
    /// Lower-cased searchable text (title, artist, album, path/url).
    pub keywords: String,
    /// Seconds, `0.0` when unknown.
    pub duration: f64,
    pub ready: ReadyState,
    pub version: u64,
}
