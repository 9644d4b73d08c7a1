use std::sync::{Arc, Mutex, MutexGuard};

use rand::seq::SliceRandom;
use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::media::Wrapper;

use super::mode::PlaybackMode;
use super::transport::{SuggestionSource, Transport};

#[derive(Debug, Default)]
struct State {
    entries: Vec<Wrapper>,
    /// Entry playing (or last played). `None` until playback starts and
    /// whenever `entries` is empty.
    current: Option<usize>,
    mode: PlaybackMode,
    /// The next advance must land exactly on `current + 1`, even in random
    /// mode. Set when the cursor was parked before a chosen entry.
    pinned: bool,
}

impl State {
    fn entry(&self, index: Option<usize>) -> Option<Wrapper> {
        index.and_then(|i| self.entries.get(i)).cloned()
    }

    fn check(&self, index: usize) -> Result<()> {
        if index < self.entries.len() {
            Ok(())
        } else {
            Err(Error::InvalidMutation {
                index,
                len: self.entries.len(),
            })
        }
    }

    /// Move the cursor per mode. `None` when playback should stop.
    fn step(&mut self) -> Option<Wrapper> {
        let len = self.entries.len();
        if len == 0 {
            self.current = None;
            return None;
        }
        let next = self.current.map_or(0, |c| c + 1);
        let pinned = std::mem::take(&mut self.pinned);

        match self.mode {
            PlaybackMode::Random if next < len => {
                if !pinned {
                    self.entries[next..].shuffle(&mut rand::rng());
                }
                self.current = Some(next);
            }
            PlaybackMode::Random => {
                self.entries.shuffle(&mut rand::rng());
                self.current = Some(0);
            }
            _ if next < len => self.current = Some(next),
            _ => return None,
        }
        self.entry(self.current)
    }

    /// Remove `index`, returning the entry and whether the transport must be
    /// interrupted.
    fn remove(&mut self, index: usize, playing: bool) -> (Wrapper, bool) {
        let removed = self.entries.remove(index);
        let len = self.entries.len();
        let mut interrupt = false;

        match self.current {
            Some(c) if index < c => self.current = Some(c - 1),
            Some(c) if index == c => {
                if playing {
                    // Park before the successor; the transport's completion
                    // advances onto it (or stops when there is none).
                    self.current = c.checked_sub(1);
                    self.pinned = true;
                    interrupt = true;
                } else if c >= len {
                    self.current = c.checked_sub(1);
                }
            }
            _ => {}
        }
        if len == 0 {
            self.current = None;
        }
        (removed, interrupt)
    }
}

/// Shared playback queue.
pub struct Playlist {
    state: Mutex<State>,
    transport: Arc<dyn Transport>,
    suggestions: Option<Arc<dyn SuggestionSource>>,
}

impl Playlist {
    pub fn new(mode: PlaybackMode, transport: Arc<dyn Transport>) -> Self {
        Self {
            state: Mutex::new(State {
                mode,
                ..State::default()
            }),
            transport,
            suggestions: None,
        }
    }

    /// Source consulted by autoplay when the queue runs out.
    pub fn with_suggestions(mut self, source: Arc<dyn SuggestionSource>) -> Self {
        self.suggestions = Some(source);
        self
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn transport(&self) -> &Arc<dyn Transport> {
        &self.transport
    }

    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().entries.is_empty()
    }

    pub fn mode(&self) -> PlaybackMode {
        self.lock().mode
    }

    pub fn set_mode(&self, mode: PlaybackMode) {
        self.lock().mode = mode;
        info!("playlist: playback mode changed to {mode}");
    }

    pub fn current_index(&self) -> Option<usize> {
        self.lock().current
    }

    pub fn current_item(&self) -> Option<Wrapper> {
        let st = self.lock();
        st.entry(st.current)
    }

    pub fn get(&self, index: usize) -> Option<Wrapper> {
        self.lock().entries.get(index).cloned()
    }

    /// Snapshot of the queue.
    pub fn entries(&self) -> Vec<Wrapper> {
        self.lock().entries.clone()
    }

    /// Entry a plain advance would move to. Random mode draws its next
    /// entry on advance, so nothing is known ahead of time unless the cursor
    /// was parked.
    pub fn next_item(&self) -> Option<Wrapper> {
        let st = self.lock();
        if st.mode == PlaybackMode::Random && !st.pinned {
            return None;
        }
        st.entry(Some(st.current.map_or(0, |c| c + 1)))
    }

    /// Queue at the end. Returns the new entry's index.
    pub fn append(&self, wrapper: Wrapper) -> usize {
        let line = wrapper.format_debug_string();
        let index = {
            let mut st = self.lock();
            st.entries.push(wrapper);
            st.entries.len() - 1
        };
        info!("playlist: add to playlist: {line}");
        index
    }

    /// Queue all at the end. Returns the index of the first one.
    pub fn extend(&self, wrappers: Vec<Wrapper>) -> usize {
        let lines: Vec<String> = wrappers.iter().map(Wrapper::format_debug_string).collect();
        let first = {
            let mut st = self.lock();
            let first = st.entries.len();
            st.entries.extend(wrappers);
            first
        };
        for line in lines {
            info!("playlist: add to playlist: {line}");
        }
        first
    }

    /// Insert before `index` (`index == len` appends). The cursor keeps
    /// pointing at the same entry.
    pub fn insert(&self, index: usize, wrapper: Wrapper) -> Result<()> {
        let mut st = self.lock();
        let len = st.entries.len();
        if index > len {
            return Err(Error::InvalidMutation { index, len });
        }
        st.entries.insert(index, wrapper);
        if let Some(c) = st.current {
            if index <= c {
                st.current = Some(c + 1);
            }
        }
        Ok(())
    }

    /// Remove the entry at `index`.
    ///
    /// Removing the playing entry interrupts the transport with the cursor
    /// parked just before the successor. When idle the cursor moves to the
    /// successor directly, or to the new last entry.
    pub fn remove(&self, index: usize) -> Result<Wrapper> {
        let playing = self.transport.is_playing();
        let (removed, interrupt) = {
            let mut st = self.lock();
            st.check(index)?;
            st.remove(index, playing)
        };
        info!(
            "playlist: delete from playlist: {}",
            removed.format_debug_string()
        );
        if interrupt {
            self.transport.interrupt();
        }
        Ok(removed)
    }

    /// Remove every entry of item `id`. Returns how many were dropped.
    pub fn remove_by_id(&self, id: &str) -> usize {
        let playing = self.transport.is_playing();
        let mut removed = 0;
        let mut interrupt = false;
        {
            let mut st = self.lock();
            while let Some(index) = st.entries.iter().position(|w| w.id() == id) {
                let (_, hit_current) = st.remove(index, playing);
                interrupt |= hit_current;
                removed += 1;
            }
        }
        if removed > 0 {
            info!("playlist: removed {removed} entr(ies) of {id}");
        }
        if interrupt {
            self.transport.interrupt();
        }
        removed
    }

    pub fn clear(&self) {
        let mut st = self.lock();
        st.entries.clear();
        st.current = None;
        st.pinned = false;
        info!("playlist: cleared");
    }

    /// Shuffle every entry except the current one, which keeps its slot.
    pub fn randomize(&self) {
        let mut st = self.lock();
        let mut rng = rand::rng();
        match st.current {
            Some(c) => {
                let current = st.entries.remove(c);
                st.entries.shuffle(&mut rng);
                st.entries.insert(c, current);
            }
            None => st.entries.shuffle(&mut rng),
        }
        debug!("playlist: randomized {} entries", st.entries.len());
    }

    /// Move on after the current entry finished or was skipped. Returns the
    /// entry to play, or `None` when playback stops.
    pub fn advance(&self) -> Option<Wrapper> {
        let last = {
            let mut st = self.lock();
            if let Some(next) = st.step() {
                return Some(next);
            }
            if st.mode != PlaybackMode::Autoplay {
                return None;
            }
            st.entry(st.current).or_else(|| st.entries.last().cloned())?
        };

        // The suggestion source may hit the catalog; ask without the lock.
        let pick = self.suggestions.as_ref()?.suggest(&last)?;
        let line = pick.format_debug_string();
        {
            let mut st = self.lock();
            st.entries.push(pick.clone());
            st.current = Some(st.entries.len() - 1);
            st.pinned = false;
        }
        info!("playlist: autoplay added {line}");
        Some(pick)
    }

    /// Set the cursor without touching entries or the transport.
    pub fn point_to(&self, index: usize) -> Result<Wrapper> {
        let mut st = self.lock();
        st.check(index)?;
        st.current = Some(index);
        st.pinned = false;
        Ok(st.entries[index].clone())
    }

    /// Make `index` the next entry to play: park the cursor just before it
    /// and signal the transport (interrupt when playing, else request an
    /// advance).
    pub fn skip_to(&self, index: usize) -> Result<()> {
        let playing = self.transport.is_playing();
        {
            let mut st = self.lock();
            st.check(index)?;
            st.current = index.checked_sub(1);
            st.pinned = true;
        }
        if playing {
            self.transport.interrupt();
        } else {
            self.transport.request_advance();
        }
        Ok(())
    }

    /// Queue the current entry `times` more times right after itself.
    pub fn repeat_current(&self, times: usize) -> Result<Wrapper> {
        let current = {
            let mut st = self.lock();
            let c = st
                .current
                .ok_or_else(|| Error::NotFound("no current entry".to_string()))?;
            let current = st.entries[c].clone();
            for _ in 0..times {
                st.entries.insert(c + 1, current.clone());
            }
            if times > 0 {
                st.pinned = true;
            }
            current
        };
        info!(
            "playlist: repeat {} x{times}",
            current.format_debug_string()
        );
        Ok(current)
    }

    /// Ids in queue order plus the cursor, for persistence.
    pub fn ids(&self) -> (Vec<String>, Option<usize>) {
        let st = self.lock();
        (
            st.entries.iter().map(|w| w.id().to_string()).collect(),
            st.current,
        )
    }

    /// Replace the whole queue, e.g. with a saved one.
    pub fn restore(&self, entries: Vec<Wrapper>, current: Option<usize>) {
        let mut st = self.lock();
        st.current = current.filter(|&c| c < entries.len());
        st.entries = entries;
        st.pinned = false;
        info!(
            "playlist: restored {} entries (current {:?})",
            st.entries.len(),
            st.current
        );
    }
}

impl std::fmt::Debug for Playlist {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let st = self.lock();
        f.debug_struct("Playlist")
            .field("len", &st.entries.len())
            .field("current", &st.current)
            .field("mode", &st.mode)
            .finish()
    }
}
