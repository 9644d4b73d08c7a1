//! Command-level operations of the bot on top of the cache and the playlist.
//!
//! A [`Session`] owns the shortlist of the last search and turns user
//! requests (file paths, radio names, tags, keywords) into queued wrappers.
//! The chat layer that parses messages and renders replies sits above it.

mod shortlist;
mod suggest;

pub use shortlist::{Selection, Shortlist};
pub use suggest::CatalogSuggestions;

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use regex::Regex;
use tracing::{info, warn};

use crate::config::Settings;
use crate::error::{Error, Result};
use crate::media::{
    ItemArgs, ItemRecord, MediaCache, RescanReport, Wrapper, normalize_path, parse_stream_url,
};
use crate::playlist::{PlaybackMode, Playlist};
use crate::store::{Condition, Field, escape_like};

/// Result of a request that may match several items.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AddOutcome {
    /// Queued directly, starting at playlist index `first_index`.
    Added {
        first_index: usize,
        items: Vec<Wrapper>,
    },
    /// Too many matches; this many were put on the shortlist instead.
    Shortlisted(usize),
    NothingFound,
}

/// Playlist entries a tag command applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagTarget {
    Current,
    /// 1-based queue position.
    Position(usize),
    All,
}

impl FromStr for TagTarget {
    type Err = Error;

    /// Empty means the current entry, `*` every entry.
    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "" => Ok(Self::Current),
            "*" => Ok(Self::All),
            p => p
                .parse()
                .map(Self::Position)
                .map_err(|_| Error::NotFound(format!("queue position `{p}`"))),
        }
    }
}

/// Split a comma separated tag list, dropping blanks and duplicates.
pub fn parse_tags(text: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    text.split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty() && seen.insert(*t))
        .map(str::to_string)
        .collect()
}

/// One line of the queue listing.
#[derive(Debug, Clone, PartialEq)]
pub struct QueueEntry {
    /// 1-based.
    pub position: usize,
    pub item_type: &'static str,
    pub title: String,
    pub tags: Vec<String>,
    pub requested_by: String,
    pub current: bool,
}

impl fmt::Display for QueueEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let marker = if self.current { "> " } else { "  " };
        write!(
            f,
            "{marker}{}. [{}] {}",
            self.position, self.item_type, self.title
        )?;
        if !self.tags.is_empty() {
            write!(f, " <{}>", self.tags.join(", "))?;
        }
        Ok(())
    }
}

pub struct Session {
    cache: Arc<MediaCache>,
    playlist: Arc<Playlist>,
    settings: Settings,
    shortlist: Shortlist,
}

impl Session {
    pub fn new(cache: Arc<MediaCache>, playlist: Arc<Playlist>, settings: Settings) -> Self {
        Self {
            cache,
            playlist,
            settings,
            shortlist: Shortlist::default(),
        }
    }

    pub fn cache(&self) -> &Arc<MediaCache> {
        &self.cache
    }

    pub fn playlist(&self) -> &Arc<Playlist> {
        &self.playlist
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn shortlist(&self) -> &Shortlist {
        &self.shortlist
    }

    /// Queue local files by path.
    ///
    /// Tries an exact path, then every file under a folder of that name,
    /// then a case-insensitive partial match (one hit is queued, several
    /// go to the shortlist). When nothing matches the library is rescanned
    /// once and the lookup retried.
    pub fn add_file(&mut self, path: &str, user: &str) -> Result<AddOutcome> {
        let path = normalize_path(path, self.cache.registry().context());
        if path.is_empty() {
            return Ok(AddOutcome::NothingFound);
        }
        let outcome = self.match_files(&path, user)?;
        if outcome != AddOutcome::NothingFound {
            return Ok(outcome);
        }
        info!("session: {path} not in the catalog, rescanning");
        self.rescan()?;
        self.match_files(&path, user)
    }

    fn match_files(&mut self, path: &str, user: &str) -> Result<AddOutcome> {
        let store = self.cache.store();
        let files = || Condition::new().and_equal(Field::Type, "file");

        let exact = store.query(&files().and_equal(Field::Path, path).limit(1))?;
        if !exact.is_empty() {
            return Ok(self.enqueue_records(&exact, user));
        }

        let folder = escape_like(path.trim_end_matches('/'));
        let in_folder = store.query(
            &files()
                .and_like(Field::Path, format!("{folder}/%"), true)
                .order_by(Field::Path),
        )?;
        if !in_folder.is_empty() {
            return Ok(self.enqueue_records(&in_folder, user));
        }

        let partial = store.query(
            &files()
                .and_like(Field::Path, format!("%{}%", escape_like(path)), false)
                .order_by(Field::Path),
        )?;
        self.add_or_shortlist(partial, user)
    }

    /// Queue every local file whose title matches the regular expression
    /// `pattern`, in path order. When nothing matches the library is
    /// rescanned once and the match retried.
    pub fn add_matching(&self, pattern: &str, user: &str) -> Result<AddOutcome> {
        let pattern = pattern.trim();
        if pattern.is_empty() {
            return Ok(AddOutcome::NothingFound);
        }
        let re = Regex::new(pattern)?;
        let outcome = self.match_titles(&re, user)?;
        if outcome != AddOutcome::NothingFound {
            return Ok(outcome);
        }
        info!("session: no title matches /{pattern}/, rescanning");
        self.rescan()?;
        self.match_titles(&re, user)
    }

    fn match_titles(&self, re: &Regex, user: &str) -> Result<AddOutcome> {
        let hits: Vec<ItemRecord> = self
            .cache
            .store()
            .query(
                &Condition::new()
                    .and_equal(Field::Type, "file")
                    .order_by(Field::Path),
            )?
            .into_iter()
            .filter(|r| re.find(&r.title).is_some_and(|m| !m.is_empty()))
            .collect();
        Ok(self.enqueue_records(&hits, user))
    }

    /// Queue a stream given a preset name, a URL or a pasted link.
    pub fn add_radio(&self, name_or_url: &str, user: &str) -> Result<Wrapper> {
        let name = name_or_url.trim();
        let (raw, title) = match self.settings.radio_preset(name) {
            Some(url) => (url, Some(name)),
            None => (name, None),
        };
        let url = parse_stream_url(raw)?;
        let wrapper = self.cache.get_or_create(&ItemArgs::radio(url, title), user)?;
        self.playlist.append(wrapper.clone());
        self.start_if_idle();
        Ok(wrapper)
    }

    /// Queue every item carrying all of `tags`, in catalog order.
    pub fn add_tagged(&self, tags: &[String], user: &str) -> Result<AddOutcome> {
        let wrappers = self.cache.get_by_tags(tags, user)?;
        Ok(self.enqueue(wrappers))
    }

    /// Shortlist the items carrying all of `tags`. Returns how many.
    pub fn find_tagged(&mut self, tags: &[String]) -> Result<usize> {
        let records = self.cache.store().query_by_tags(tags)?;
        Ok(self.shortlist_records(records))
    }

    /// Shortlist local files ordered by path, optionally only those whose
    /// path contains `filter` (case-insensitive).
    pub fn list_files(&mut self, filter: Option<&str>) -> Result<usize> {
        let mut condition = Condition::new().and_equal(Field::Type, "file");
        if let Some(f) = filter.map(str::trim).filter(|f| !f.is_empty()) {
            condition = condition.and_like(Field::Path, format!("%{}%", escape_like(f)), false);
        }
        let records = self.cache.store().query(&condition.order_by(Field::Path))?;
        Ok(self.shortlist_records(records))
    }

    /// Keyword search over the whole catalog. A single hit is queued.
    pub fn search(&mut self, keywords: &str, user: &str) -> Result<AddOutcome> {
        let words: Vec<String> = keywords.split_whitespace().map(str::to_string).collect();
        if words.is_empty() {
            return Ok(AddOutcome::NothingFound);
        }
        let records = self.cache.store().query_by_keywords(&words)?;
        self.add_or_shortlist(records, user)
    }

    /// Queue shortlist entries. A bad position queues nothing.
    pub fn add_from_shortlist(&mut self, selection: &Selection, user: &str) -> Result<AddOutcome> {
        let records = self.shortlist.select(selection)?;
        Ok(self.enqueue_records(&records, user))
    }

    /// Remove the entry at 1-based `position`.
    pub fn remove(&self, position: usize) -> Result<Wrapper> {
        self.playlist.remove(self.index_of(position)?)
    }

    /// Move on to the next entry. When playing, the transport is
    /// interrupted and advances on its own; otherwise the playlist advances
    /// here and the new entry is returned.
    pub fn skip(&self) -> Option<Wrapper> {
        let transport = self.playlist.transport();
        if transport.is_playing() {
            transport.interrupt();
            None
        } else {
            self.playlist.advance()
        }
    }

    /// Play the entry at 1-based `position` next, right away.
    pub fn play_at(&self, position: usize) -> Result<()> {
        self.playlist.skip_to(self.index_of(position)?)
    }

    /// Jump to the last entry of the queue.
    pub fn jump_to_last(&self) -> Result<()> {
        match self.playlist.len() {
            0 => Err(Error::NotFound("the queue is empty".to_string())),
            len => self.playlist.skip_to(len - 1),
        }
    }

    pub fn repeat(&self, times: usize) -> Result<Wrapper> {
        self.playlist.repeat_current(times)
    }

    /// Switch mode. Entering random mode also shuffles.
    pub fn set_mode(&self, mode: PlaybackMode) {
        self.playlist.set_mode(mode);
        if mode == PlaybackMode::Random {
            self.shuffle();
        }
    }

    /// Reshuffle the queue around the current entry, keeping the mode, and
    /// interrupt playback so the new order takes effect.
    pub fn shuffle(&self) {
        self.playlist.randomize();
        let transport = self.playlist.transport();
        if transport.is_playing() {
            transport.interrupt();
        }
    }

    /// Called when the user stops playback. Clears a one-shot queue when
    /// configured; returns whether it did. Halting the transport is the
    /// caller's job.
    pub fn stop(&self) -> bool {
        if self.playlist.mode() == PlaybackMode::OneShot && self.settings.playlist.clear_when_stopped {
            self.playlist.clear();
            return true;
        }
        false
    }

    /// Called by the transport when an entry finished. Returns the next
    /// entry to play, skipping entries whose source is gone.
    pub fn playback_finished(&self) -> Option<Wrapper> {
        let mut attempts = self.playlist.len();
        while let Some(next) = self.playlist.advance() {
            match next.validate() {
                Ok(()) => {
                    info!("session: now playing {}", next.format_debug_string());
                    return Some(next);
                }
                Err(e) => warn!("session: skipping {}: {e}", next.format_debug_string()),
            }
            attempts = attempts.saturating_sub(1);
            if attempts == 0 {
                warn!("session: nothing playable left in the queue");
                return None;
            }
        }
        info!("session: reached the end of the queue");
        self.stop();
        None
    }

    pub fn add_tags(&self, target: TagTarget, tags: &[String]) -> Result<usize> {
        self.for_targets(target, |w| w.add_tags(tags))
    }

    /// Remove `tags` from the target entries; a `*` tag clears them all.
    pub fn remove_tags(&self, target: TagTarget, tags: &[String]) -> Result<usize> {
        if tags.iter().any(|t| t == "*") {
            return self.clear_tags(target);
        }
        self.for_targets(target, |w| w.remove_tags(tags))
    }

    pub fn clear_tags(&self, target: TagTarget) -> Result<usize> {
        self.for_targets(target, Wrapper::clear_tags)
    }

    /// Current queue, for display.
    pub fn queue_listing(&self) -> Vec<QueueEntry> {
        let current = self.playlist.current_index();
        self.playlist
            .entries()
            .iter()
            .enumerate()
            .map(|(i, w)| QueueEntry {
                position: i + 1,
                item_type: w.display_type(),
                title: w.format_title(),
                tags: w.tags(),
                requested_by: w.requested_by().to_string(),
                current: current == Some(i),
            })
            .collect()
    }

    /// Sync the catalog with the music folder, dropping queue entries whose
    /// item disappeared.
    pub fn rescan(&self) -> Result<RescanReport> {
        let report = self.cache.rescan(&self.settings.library)?;
        for w in self.playlist.entries() {
            if !w.is_valid() {
                self.playlist.remove_by_id(w.id());
            }
        }
        Ok(report)
    }

    pub fn save_queue(&self) -> Result<()> {
        let (ids, current) = self.playlist.ids();
        self.cache.store().save_queue(&ids, current)?;
        info!("session: saved {} queue entries", ids.len());
        Ok(())
    }

    /// Reload the saved queue. Entries whose item left the catalog are
    /// dropped and the cursor follows its entry. Returns the queue length.
    pub fn restore_queue(&self, user: &str) -> Result<usize> {
        let (ids, current) = self.cache.store().load_queue()?;
        let mut entries = Vec::with_capacity(ids.len());
        let mut cursor = None;
        for (i, id) in ids.iter().enumerate() {
            match self.cache.get_by_id(id, user) {
                Ok(w) => {
                    if current == Some(i) {
                        cursor = Some(entries.len());
                    }
                    entries.push(w);
                }
                Err(Error::NotFound(_)) => warn!("session: saved entry {id} is gone"),
                Err(e) => return Err(e),
            }
        }
        let len = entries.len();
        self.playlist.restore(entries, cursor);
        Ok(len)
    }

    fn index_of(&self, position: usize) -> Result<usize> {
        let len = self.playlist.len();
        position
            .checked_sub(1)
            .filter(|&i| i < len)
            .ok_or(Error::InvalidMutation {
                index: position,
                len,
            })
    }

    fn for_targets(
        &self,
        target: TagTarget,
        mut apply: impl FnMut(&Wrapper) -> Result<bool>,
    ) -> Result<usize> {
        let targets = match target {
            TagTarget::Current => vec![
                self.playlist
                    .current_item()
                    .ok_or_else(|| Error::NotFound("nothing is playing".to_string()))?,
            ],
            TagTarget::Position(p) => vec![self.playlist.get(self.index_of(p)?).ok_or(
                Error::InvalidMutation {
                    index: p,
                    len: self.playlist.len(),
                },
            )?],
            TagTarget::All => {
                let mut seen = HashSet::new();
                self.playlist
                    .entries()
                    .into_iter()
                    .filter(|w| seen.insert(w.id().to_string()))
                    .collect()
            }
        };
        let mut changed = 0;
        for w in &targets {
            if apply(w)? {
                changed += 1;
            }
        }
        Ok(changed)
    }

    fn shortlist_records(&mut self, records: Vec<ItemRecord>) -> usize {
        let n = self.shortlist.replace(records, self.settings.playlist.max_shortlist);
        info!("session: {n} item(s) on the shortlist");
        n
    }

    fn add_or_shortlist(&mut self, records: Vec<ItemRecord>, user: &str) -> Result<AddOutcome> {
        match records.len() {
            0 => Ok(AddOutcome::NothingFound),
            1 => Ok(self.enqueue_records(&records, user)),
            _ => Ok(AddOutcome::Shortlisted(self.shortlist_records(records))),
        }
    }

    /// Queue `records` in order, repeats included. Records that cannot be
    /// loaded are skipped.
    fn enqueue_records(&self, records: &[ItemRecord], user: &str) -> AddOutcome {
        let wrappers = records
            .iter()
            .filter_map(|r| match self.cache.get_from_record(r, user) {
                Ok(w) => Some(w),
                Err(e) => {
                    warn!("session: skipping {}: {e}", r.id);
                    None
                }
            })
            .collect();
        self.enqueue(wrappers)
    }

    fn enqueue(&self, items: Vec<Wrapper>) -> AddOutcome {
        if items.is_empty() {
            return AddOutcome::NothingFound;
        }
        let first_index = self.playlist.extend(items.clone());
        self.start_if_idle();
        AddOutcome::Added { first_index, items }
    }

    fn start_if_idle(&self) {
        let transport = self.playlist.transport();
        if !transport.is_playing() {
            transport.request_advance();
        }
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("playlist", &self.playlist)
            .field("shortlist", &self.shortlist.len())
            .finish_non_exhaustive()
    }
}
