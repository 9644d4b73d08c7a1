//! Local audio files under the music folder.

use std::path::{Path, PathBuf};

use lofty::prelude::{Accessor, AudioFile, TaggedFileExt};
use tracing::{debug, warn};

use crate::error::{Error, Result};

use super::item::{
    Item, ItemMeta, ItemType, MediaContext, Readiness, display_title, hash_id, make_keywords,
};
use super::record::ItemRecord;
use super::registry::{ItemArgs, ItemHandler};

pub(crate) const HANDLER: ItemHandler = ItemHandler {
    build,
    load,
    make_id,
};

#[derive(Debug, Clone, PartialEq)]
pub struct FileItem {
    pub meta: ItemMeta,
    /// Relative to the music folder unless it lies outside of it.
    pub path: String,
    pub artist: Option<String>,
    pub album: Option<String>,
}

#[derive(Debug, Default)]
struct AudioTags {
    title: Option<String>,
    artist: Option<String>,
    album: Option<String>,
    duration: f64,
}

fn non_empty(v: Option<std::borrow::Cow<'_, str>>) -> Option<String> {
    v.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

fn read_tags(path: &Path) -> std::result::Result<AudioTags, String> {
    let tagged = lofty::read_from_path(path).map_err(|e| e.to_string())?;
    let mut found = AudioTags {
        duration: tagged.properties().duration().as_secs_f64(),
        ..AudioTags::default()
    };

    if let Some(tag) = tagged.primary_tag().or_else(|| tagged.first_tag()) {
        found.title = non_empty(tag.title());
        found.artist = non_empty(tag.artist());
        found.album = non_empty(tag.album());
    }
    Ok(found)
}

/// Paths inside the music folder are stored relative to it, so `./a.mp3`,
/// `a.mp3` and `<music_folder>/a.mp3` share one identity.
pub(crate) fn normalize_path(path: &str, ctx: &MediaContext) -> String {
    let trimmed = path.trim();
    let p = Path::new(trimmed);
    if p.is_absolute() {
        return match p.strip_prefix(&ctx.music_folder) {
            Ok(rel) => rel.to_string_lossy().into_owned(),
            Err(_) => trimmed.to_string(),
        };
    }
    let mut rel = trimmed;
    while let Some(rest) = rel.strip_prefix("./") {
        rel = rest;
    }
    rel.to_string()
}

impl FileItem {
    fn from_disk(path: String, ctx: &MediaContext) -> Self {
        let stem = Path::new(&path)
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or(&path)
            .to_string();
        let mut item = Self {
            meta: ItemMeta::new(hash_id(&[&path]), stem),
            path,
            artist: None,
            album: None,
        };

        let uri = item.uri(ctx);
        if !uri.is_file() {
            item.meta.readiness = Readiness::Failed(format!("file missing: {}", item.path));
            return item;
        }

        match read_tags(&uri) {
            Ok(p) => {
                if let Some(title) = p.title {
                    item.meta.title = title;
                }
                item.artist = p.artist;
                item.album = p.album;
                item.meta.duration = p.duration;
                item.meta.readiness = if p.duration > 0.0 {
                    Readiness::Ready
                } else {
                    Readiness::Failed(format!("unknown duration: {}", item.path))
                };
            }
            Err(e) => {
                debug!("file: reading tags failed for {}: {e}", item.path);
                item.meta.readiness = Readiness::Failed(format!("unreadable file {}: {e}", item.path));
            }
        }
        item
    }

    pub fn uri(&self, ctx: &MediaContext) -> PathBuf {
        let p = Path::new(&self.path);
        if p.is_absolute() {
            p.to_path_buf()
        } else {
            ctx.music_folder.join(p)
        }
    }

    pub fn format_title(&self) -> String {
        display_title(&self.meta.title, self.artist.as_deref(), &self.path)
    }

    pub fn to_record(&self) -> ItemRecord {
        ItemRecord {
            artist: self.artist.clone(),
            album: self.album.clone(),
            path: Some(self.path.clone()),
            keywords: make_keywords(&[
                Some(&self.meta.title),
                self.artist.as_deref(),
                self.album.as_deref(),
                Some(&self.path),
            ]),
            ..self.meta.base_record(ItemType::File)
        }
    }

    fn fail(&mut self, reason: String) -> Error {
        warn!("file: {reason}");
        if self.meta.set_readiness(Readiness::Failed(reason.clone())) {
            self.meta.version += 1;
        }
        Error::ValidationFailed(reason)
    }

    /// Check the file still exists and resolve a missing duration.
    pub fn validate(&mut self, ctx: &MediaContext) -> Result<()> {
        let uri = self.uri(ctx);
        if !uri.is_file() {
            return Err(self.fail(format!("file missing: {}", self.path)));
        }

        let mut changed = false;
        if self.meta.duration <= 0.0 {
            match read_tags(&uri) {
                Ok(p) if p.duration > 0.0 => {
                    self.meta.duration = p.duration;
                    changed = true;
                }
                Ok(_) => return Err(self.fail(format!("unknown duration: {}", self.path))),
                Err(e) => return Err(self.fail(format!("unreadable file {}: {e}", self.path))),
            }
        }

        changed |= self.meta.set_readiness(Readiness::Ready);
        if changed {
            self.meta.version += 1;
        }
        Ok(())
    }
}

fn build(args: &ItemArgs, ctx: &MediaContext) -> Result<Item> {
    let path = normalize_path(args.require_path()?, ctx);
    Ok(Item::File(FileItem::from_disk(path, ctx)))
}

fn load(record: &ItemRecord, ctx: &MediaContext) -> Result<Item> {
    let path = record.path.clone().ok_or_else(|| Error::MissingField {
        item_type: record.item_type.clone(),
        field: "path",
    })?;
    let mut item = FileItem {
        meta: ItemMeta::from_record(record),
        path,
        artist: record.artist.clone(),
        album: record.album.clone(),
    };
    if let Err(e) = item.validate(ctx) {
        debug!("file: loaded {} in failed state: {e}", item.path);
    }
    Ok(Item::File(item))
}

fn make_id(args: &ItemArgs, ctx: &MediaContext) -> Result<String> {
    Ok(hash_id(&[&normalize_path(args.require_path()?, ctx)]))
}
