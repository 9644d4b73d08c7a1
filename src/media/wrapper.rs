//! Shared handle around one cached item.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::store::MusicStore;

use super::item::{Item, ItemType, MediaContext, Readiness};
use super::record::ItemRecord;

struct Slot {
    item: Item,
    /// Version of the last record written to the store.
    saved_version: Option<u64>,
}

struct Shared {
    id: String,
    item_type: ItemType,
    requested_by: String,
    slot: Mutex<Slot>,
    valid: AtomicBool,
    store: Arc<dyn MusicStore>,
    context: MediaContext,
}

/// Cheap-to-clone handle shared by every playlist entry and lookup of the
/// same item. Equality is handle identity.
#[derive(Clone)]
pub struct Wrapper {
    inner: Arc<Shared>,
}

impl Wrapper {
    pub(crate) fn new(
        item: Item,
        saved_version: Option<u64>,
        requested_by: &str,
        store: Arc<dyn MusicStore>,
        context: MediaContext,
    ) -> Self {
        Self {
            inner: Arc::new(Shared {
                id: item.id().to_string(),
                item_type: item.item_type(),
                requested_by: requested_by.to_string(),
                slot: Mutex::new(Slot {
                    item,
                    saved_version,
                }),
                valid: AtomicBool::new(true),
                store,
                context,
            }),
        }
    }

    fn slot(&self) -> MutexGuard<'_, Slot> {
        self.inner.slot.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn id(&self) -> &str {
        &self.inner.id
    }

    pub fn item_type(&self) -> ItemType {
        self.inner.item_type
    }

    pub fn display_type(&self) -> &'static str {
        self.inner.item_type.as_str()
    }

    /// User whose request first created this wrapper.
    pub fn requested_by(&self) -> &str {
        &self.inner.requested_by
    }

    pub fn title(&self) -> String {
        self.slot().item.title().to_string()
    }

    pub fn format_title(&self) -> String {
        self.slot().item.format_title()
    }

    pub fn format_debug_string(&self) -> String {
        self.slot().item.format_debug_string()
    }

    pub fn duration(&self) -> f64 {
        self.slot().item.duration()
    }

    pub fn tags(&self) -> Vec<String> {
        self.slot().item.tags().to_vec()
    }

    pub fn readiness(&self) -> Readiness {
        self.slot().item.readiness().clone()
    }

    pub fn version(&self) -> u64 {
        self.slot().item.version()
    }

    /// `false` once a rescan or catalog removal dropped this wrapper.
    pub fn is_valid(&self) -> bool {
        self.inner.valid.load(Ordering::Acquire)
    }

    pub fn is_ready(&self) -> bool {
        self.is_valid() && self.slot().item.is_ready()
    }

    /// Re-check the source and persist any resulting change.
    pub fn validate(&self) -> Result<()> {
        if !self.is_valid() {
            return Err(Error::ValidationFailed(format!(
                "{} is no longer in the library",
                self.inner.id
            )));
        }
        let mut slot = self.slot();
        let outcome = slot.item.validate(&self.inner.context);
        self.persist(&mut slot)?;
        outcome
    }

    pub fn add_tags(&self, tags: &[String]) -> Result<bool> {
        self.mutate(|item| item.add_tags(tags))
    }

    pub fn remove_tags(&self, tags: &[String]) -> Result<bool> {
        self.mutate(|item| item.remove_tags(tags))
    }

    pub fn clear_tags(&self) -> Result<bool> {
        self.mutate(Item::clear_tags)
    }

    pub fn to_record(&self) -> ItemRecord {
        self.slot().item.to_record()
    }

    pub fn ptr_eq(&self, other: &Wrapper) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    fn mutate(&self, f: impl FnOnce(&mut Item) -> bool) -> Result<bool> {
        let mut slot = self.slot();
        let changed = f(&mut slot.item);
        self.persist(&mut slot)?;
        Ok(changed)
    }

    /// Write the record if its version has not been saved yet.
    pub(crate) fn sync(&self) -> Result<()> {
        let mut slot = self.slot();
        self.persist(&mut slot)
    }

    fn persist(&self, slot: &mut Slot) -> Result<()> {
        let version = slot.item.version();
        if slot.saved_version == Some(version) {
            return Ok(());
        }
        if !self.is_valid() {
            debug!("cache: not saving dropped item {}", self.inner.id);
            return Ok(());
        }
        if let Err(e) = self.inner.store.save(&slot.item.to_record()) {
            warn!("cache: failed to save {}: {e}", self.inner.id);
            return Err(e);
        }
        slot.saved_version = Some(version);
        Ok(())
    }

    pub(crate) fn invalidate(&self) {
        self.inner.valid.store(false, Ordering::Release);
    }
}

impl PartialEq for Wrapper {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl Eq for Wrapper {}

impl fmt::Debug for Wrapper {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Wrapper")
            .field("id", &self.inner.id)
            .field("type", &self.inner.item_type)
            .field("valid", &self.is_valid())
            .finish()
    }
}
