//! Fixtures shared by the unit tests.

use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use crate::error::Result;
use crate::media::{ItemRecord, MediaCache, MediaContext, Registry};
use crate::playlist::Transport;
use crate::store::{Condition, MusicStore, SqliteStore};

const SAMPLE_RATE: u32 = 8000;

/// Write a silent mono 16-bit PCM WAV lasting `secs` seconds.
pub(crate) fn write_wav(path: &Path, secs: u32) {
    let data_len = SAMPLE_RATE * 2 * secs;
    let mut out = Vec::with_capacity(44 + data_len as usize);
    out.extend_from_slice(b"RIFF");
    out.extend_from_slice(&(36 + data_len).to_le_bytes());
    out.extend_from_slice(b"WAVE");
    out.extend_from_slice(b"fmt ");
    out.extend_from_slice(&16u32.to_le_bytes());
    out.extend_from_slice(&1u16.to_le_bytes()); // PCM
    out.extend_from_slice(&1u16.to_le_bytes()); // mono
    out.extend_from_slice(&SAMPLE_RATE.to_le_bytes());
    out.extend_from_slice(&(SAMPLE_RATE * 2).to_le_bytes());
    out.extend_from_slice(&2u16.to_le_bytes());
    out.extend_from_slice(&16u16.to_le_bytes());
    out.extend_from_slice(b"data");
    out.extend_from_slice(&data_len.to_le_bytes());
    out.resize(44 + data_len as usize, 0);

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, out).unwrap();
}

/// Transport double recording the signals it receives.
#[derive(Debug, Default)]
pub(crate) struct RecordingTransport {
    pub playing: AtomicBool,
    pub interrupts: AtomicUsize,
    pub advances: AtomicUsize,
}

impl RecordingTransport {
    pub fn playing() -> Arc<Self> {
        let t = Self::default();
        t.playing.store(true, Ordering::SeqCst);
        Arc::new(t)
    }

    pub fn idle() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn set_playing(&self, playing: bool) {
        self.playing.store(playing, Ordering::SeqCst);
    }

    pub fn interrupt_count(&self) -> usize {
        self.interrupts.load(Ordering::SeqCst)
    }

    pub fn advance_count(&self) -> usize {
        self.advances.load(Ordering::SeqCst)
    }
}

impl Transport for RecordingTransport {
    fn interrupt(&self) {
        self.interrupts.fetch_add(1, Ordering::SeqCst);
    }

    fn request_advance(&self) {
        self.advances.fetch_add(1, Ordering::SeqCst);
    }

    fn is_playing(&self) -> bool {
        self.playing.load(Ordering::SeqCst)
    }
}

/// In-memory store counting saves per id.
pub(crate) struct CountingStore {
    inner: SqliteStore,
    saves: Mutex<HashMap<String, usize>>,
}

impl CountingStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            inner: SqliteStore::open_in_memory().unwrap(),
            saves: Mutex::new(HashMap::new()),
        })
    }

    pub fn saves_of(&self, id: &str) -> usize {
        self.saves.lock().unwrap().get(id).copied().unwrap_or(0)
    }
}

impl MusicStore for CountingStore {
    fn query(&self, condition: &Condition) -> Result<Vec<ItemRecord>> {
        self.inner.query(condition)
    }

    fn query_by_tags(&self, tags: &[String]) -> Result<Vec<ItemRecord>> {
        self.inner.query_by_tags(tags)
    }

    fn query_by_keywords(&self, words: &[String]) -> Result<Vec<ItemRecord>> {
        self.inner.query_by_keywords(words)
    }

    fn fetch(&self, id: &str) -> Result<Option<ItemRecord>> {
        self.inner.fetch(id)
    }

    fn save(&self, record: &ItemRecord) -> Result<()> {
        *self
            .saves
            .lock()
            .unwrap()
            .entry(record.id.clone())
            .or_default() += 1;
        self.inner.save(record)
    }

    fn delete(&self, id: &str) -> Result<()> {
        self.inner.delete(id)
    }

    fn save_queue(&self, ids: &[String], current: Option<usize>) -> Result<()> {
        self.inner.save_queue(ids, current)
    }

    fn load_queue(&self) -> Result<(Vec<String>, Option<usize>)> {
        self.inner.load_queue()
    }
}

/// Cache over an in-memory catalog rooted at `music_folder`.
pub(crate) fn memory_cache(music_folder: &Path) -> Arc<MediaCache> {
    let store = Arc::new(SqliteStore::open_in_memory().unwrap());
    Arc::new(MediaCache::new(
        Registry::new(MediaContext::new(music_folder)),
        store,
    ))
}

/// Library with the given files (2 s each) plus a cache over it.
pub(crate) fn library(files: &[&str]) -> (tempfile::TempDir, Arc<MediaCache>) {
    let dir = tempfile::tempdir().unwrap();
    for f in files {
        write_wav(&dir.path().join(f), 2);
    }
    let cache = memory_cache(dir.path());
    (dir, cache)
}
