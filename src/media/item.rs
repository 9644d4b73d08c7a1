//! Playable items: a closed set of kinds sharing one capability surface.

use std::fmt;
use std::path::PathBuf;

use sha1::{Digest, Sha1};

use crate::error::Result;

use super::file::FileItem;
use super::radio::RadioItem;
use super::record::{ItemRecord, ReadyState};

/// Environment items resolve their sources against.
#[derive(Debug, Clone)]
pub struct MediaContext {
    /// Relative file paths are rooted here.
    pub music_folder: PathBuf,
}

impl MediaContext {
    pub fn new(music_folder: impl Into<PathBuf>) -> Self {
        Self {
            music_folder: music_folder.into(),
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum ItemType {
    File,
    Radio,
}

impl ItemType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::File => "file",
            Self::Radio => "radio",
        }
    }
}

impl fmt::Display for ItemType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether the source behind an item has been checked.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Readiness {
    #[default]
    Unvalidated,
    Ready,
    /// Human-readable reason.
    Failed(String),
}

impl Readiness {
    pub fn state(&self) -> ReadyState {
        match self {
            Self::Unvalidated => ReadyState::Pending,
            Self::Ready => ReadyState::Yes,
            Self::Failed(_) => ReadyState::Failed,
        }
    }

    pub(crate) fn from_state(state: ReadyState) -> Self {
        match state {
            ReadyState::Pending => Self::Unvalidated,
            ReadyState::Yes => Self::Ready,
            ReadyState::Failed => Self::Failed("marked as failed in the catalog".to_string()),
        }
    }
}

/// Fields every item kind carries.
#[derive(Debug, Clone, PartialEq)]
pub struct ItemMeta {
    /// Derived once at construction, never recomputed.
    pub id: String,
    pub title: String,
    pub tags: Vec<String>,
    pub duration: f64,
    pub readiness: Readiness,
    /// Bumped whenever a persisted field changes after construction.
    pub version: u64,
}

impl ItemMeta {
    pub fn new(id: String, title: String) -> Self {
        Self {
            id,
            title,
            tags: Vec::new(),
            duration: 0.0,
            readiness: Readiness::Unvalidated,
            version: 0,
        }
    }

    pub(crate) fn from_record(record: &ItemRecord) -> Self {
        Self {
            id: record.id.clone(),
            title: record.title.clone(),
            tags: record.tags.clone(),
            duration: record.duration,
            readiness: Readiness::from_state(record.ready),
            version: record.version,
        }
    }

    /// Record with the shared fields filled in.
    pub(crate) fn base_record(&self, item_type: ItemType) -> ItemRecord {
        ItemRecord {
            id: self.id.clone(),
            item_type: item_type.as_str().to_string(),
            title: self.title.clone(),
            tags: self.tags.clone(),
            duration: self.duration,
            ready: self.readiness.state(),
            version: self.version,
            ..ItemRecord::default()
        }
    }

    /// Replace readiness, reporting whether the persisted state changed.
    pub(crate) fn set_readiness(&mut self, readiness: Readiness) -> bool {
        let changed = self.readiness.state() != readiness.state();
        self.readiness = readiness;
        changed
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Item {
    File(FileItem),
    Radio(RadioItem),
}

impl Item {
    pub fn meta(&self) -> &ItemMeta {
        match self {
            Item::File(f) => &f.meta,
            Item::Radio(r) => &r.meta,
        }
    }

    fn meta_mut(&mut self) -> &mut ItemMeta {
        match self {
            Item::File(f) => &mut f.meta,
            Item::Radio(r) => &mut r.meta,
        }
    }

    pub fn id(&self) -> &str {
        &self.meta().id
    }

    pub fn item_type(&self) -> ItemType {
        match self {
            Item::File(_) => ItemType::File,
            Item::Radio(_) => ItemType::Radio,
        }
    }

    pub fn title(&self) -> &str {
        &self.meta().title
    }

    pub fn tags(&self) -> &[String] {
        &self.meta().tags
    }

    pub fn duration(&self) -> f64 {
        self.meta().duration
    }

    pub fn readiness(&self) -> &Readiness {
        &self.meta().readiness
    }

    pub fn is_ready(&self) -> bool {
        self.meta().readiness == Readiness::Ready
    }

    pub fn version(&self) -> u64 {
        self.meta().version
    }

    /// "Artist - Title", or the title alone.
    pub fn format_title(&self) -> String {
        match self {
            Item::File(f) => f.format_title(),
            Item::Radio(r) => r.format_title(),
        }
    }

    pub fn format_debug_string(&self) -> String {
        match self {
            Item::File(f) => format!("[file] {} ({})", f.format_title(), f.path),
            Item::Radio(r) => format!("[radio] {} ({})", r.format_title(), r.url),
        }
    }

    pub fn to_record(&self) -> ItemRecord {
        match self {
            Item::File(f) => f.to_record(),
            Item::Radio(r) => r.to_record(),
        }
    }

    /// Re-check the source. Failure leaves the item in the failed state.
    pub fn validate(&mut self, ctx: &MediaContext) -> Result<()> {
        match self {
            Item::File(f) => f.validate(ctx),
            Item::Radio(r) => r.validate(),
        }
    }

    /// Returns `true` when at least one tag was new.
    pub fn add_tags(&mut self, tags: &[String]) -> bool {
        let meta = self.meta_mut();
        let before = meta.tags.len();
        for tag in tags {
            let tag = tag.trim();
            if !tag.is_empty() && !meta.tags.iter().any(|t| t == tag) {
                meta.tags.push(tag.to_string());
            }
        }
        let changed = meta.tags.len() != before;
        if changed {
            meta.version += 1;
        }
        changed
    }

    pub fn remove_tags(&mut self, tags: &[String]) -> bool {
        let meta = self.meta_mut();
        let before = meta.tags.len();
        meta.tags.retain(|t| !tags.iter().any(|r| r.trim() == t));
        let changed = meta.tags.len() != before;
        if changed {
            meta.version += 1;
        }
        changed
    }

    pub fn clear_tags(&mut self) -> bool {
        let meta = self.meta_mut();
        if meta.tags.is_empty() {
            return false;
        }
        meta.tags.clear();
        meta.version += 1;
        true
    }
}

/// Hex SHA-1 of the given key parts.
pub(crate) fn hash_id(parts: &[&str]) -> String {
    let mut hasher = Sha1::new();
    for part in parts {
        hasher.update(part.as_bytes());
    }
    hex::encode(hasher.finalize())
}

/// "Artist - Title" when an artist is known, else the first non-empty of
/// `title` / `fallback`.
pub(crate) fn display_title(title: &str, artist: Option<&str>, fallback: &str) -> String {
    let title = match title.trim() {
        "" => fallback.trim(),
        t => t,
    };
    match artist.map(str::trim).filter(|a| !a.is_empty()) {
        Some(a) => format!("{a} - {title}"),
        None => title.to_string(),
    }
}

pub(crate) fn make_keywords(parts: &[Option<&str>]) -> String {
    parts
        .iter()
        .flatten()
        .map(|p| p.trim())
        .filter(|p| !p.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}
