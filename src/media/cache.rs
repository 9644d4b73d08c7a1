//! Identity-keyed wrapper cache.
//!
//! Lookups take the read lock only. Construction of a missing id is
//! serialized through a lock scoped to that id, so two callers asking for the
//! same new item build it once while different ids build in parallel. No
//! cache lock is held while an item is built or the store is touched.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use tracing::{debug, info, warn};

use crate::config::LibrarySettings;
use crate::error::{Error, Result};
use crate::store::{Condition, Field, MusicStore};

use super::item::Item;
use super::record::ItemRecord;
use super::registry::{ItemArgs, Registry};
use super::scan::audio_files;
use super::wrapper::Wrapper;

/// Outcome of a library rescan.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RescanReport {
    /// Files found on disk with no catalog record yet.
    pub added: usize,
    /// Catalog records whose file is gone.
    pub removed: usize,
    /// Audio files currently on disk.
    pub total: usize,
}

pub struct MediaCache {
    registry: Registry,
    store: Arc<dyn MusicStore>,
    wrappers: RwLock<HashMap<String, Wrapper>>,
    building: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl MediaCache {
    pub fn new(registry: Registry, store: Arc<dyn MusicStore>) -> Self {
        Self {
            registry,
            store,
            wrappers: RwLock::new(HashMap::new()),
            building: Mutex::new(HashMap::new()),
        }
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn store(&self) -> &Arc<dyn MusicStore> {
        &self.store
    }

    /// Number of live wrappers.
    pub fn len(&self) -> usize {
        self.wrappers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get_cached(&self, id: &str) -> Option<Wrapper> {
        self.wrappers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(id)
            .cloned()
    }

    /// Wrapper for the item `args` describe, building it on first request.
    ///
    /// A record already in the catalog is loaded rather than read from disk again.
    pub fn get_or_create(&self, args: &ItemArgs, user: &str) -> Result<Wrapper> {
        let id = self.registry.make_id(args)?;
        self.single_flight(&id, user, || match self.store.fetch(&id)? {
            Some(record) => Ok((self.registry.load(&record)?, Some(record.version))),
            None => Ok((self.registry.build(args)?, None)),
        })
    }

    pub fn get_by_id(&self, id: &str, user: &str) -> Result<Wrapper> {
        if let Some(wrapper) = self.get_cached(id) {
            return Ok(wrapper);
        }
        let record = self
            .store
            .fetch(id)?
            .ok_or_else(|| Error::NotFound(id.to_string()))?;
        self.get_from_record(&record, user)
    }

    /// Wrapper for a catalog record, trusting its stored fields.
    pub fn get_from_record(&self, record: &ItemRecord, user: &str) -> Result<Wrapper> {
        self.single_flight(&record.id, user, || {
            Ok((self.registry.load(record)?, Some(record.version)))
        })
    }

    /// Wrappers in input order, one per distinct id.
    ///
    /// Records that cannot be loaded are skipped so one bad row does not
    /// abort the batch.
    pub fn bulk_from_records(&self, records: &[ItemRecord], user: &str) -> Vec<Wrapper> {
        let mut seen = HashSet::new();
        records
            .iter()
            .filter(|r| seen.insert(r.id.clone()))
            .filter_map(|r| match self.get_from_record(r, user) {
                Ok(w) => Some(w),
                Err(e) => {
                    warn!("cache: skipping record {}: {e}", r.id);
                    None
                }
            })
            .collect()
    }

    /// Items carrying every tag, in store order.
    pub fn get_by_tags(&self, tags: &[String], user: &str) -> Result<Vec<Wrapper>> {
        let records = self.store.query_by_tags(tags)?;
        Ok(self.bulk_from_records(&records, user))
    }

    /// Drop the wrapper for `id`. Existing handles stay usable but no longer
    /// report ready.
    pub fn evict(&self, id: &str) -> Option<Wrapper> {
        let removed = self
            .wrappers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(id);
        if let Some(w) = &removed {
            w.invalidate();
            debug!("cache: evicted {id}");
        }
        removed
    }

    /// Evict every wrapper whose record left the catalog. Returns how many.
    pub fn invalidate_all(&self) -> Result<usize> {
        let ids: Vec<String> = self
            .wrappers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect();

        let mut evicted = 0;
        for id in ids {
            if self.store.fetch(&id)?.is_none() && self.evict(&id).is_some() {
                evicted += 1;
            }
        }
        if evicted > 0 {
            info!("cache: invalidated {evicted} stale item(s)");
        }
        Ok(evicted)
    }

    /// Delete an item from the catalog and the cache.
    pub fn remove(&self, id: &str) -> Result<()> {
        self.store.delete(id)?;
        self.evict(id);
        info!("cache: removed {id} from the catalog");
        Ok(())
    }

    /// Sync the catalog with the music folder.
    pub fn rescan(&self, settings: &LibrarySettings) -> Result<RescanReport> {
        let root = &self.registry.context().music_folder;
        let on_disk = audio_files(root, settings);
        let present: HashSet<&str> = on_disk.iter().map(String::as_str).collect();

        let known = self
            .store
            .query(&Condition::new().and_equal(Field::Type, "file"))?;
        let known_paths: HashSet<&str> = known.iter().filter_map(|r| r.path.as_deref()).collect();

        let mut report = RescanReport {
            total: on_disk.len(),
            ..RescanReport::default()
        };

        for path in on_disk.iter().filter(|p| !known_paths.contains(p.as_str())) {
            let item = self.registry.build(&ItemArgs::file(path.as_str()))?;
            self.store.save(&item.to_record())?;
            report.added += 1;
        }

        for record in &known {
            let gone = record
                .path
                .as_deref()
                .is_none_or(|p| !present.contains(p));
            if gone {
                self.store.delete(&record.id)?;
                report.removed += 1;
            }
        }

        self.invalidate_all()?;
        info!(
            "library: rescanned {}: {} added, {} removed, {} total",
            root.display(),
            report.added,
            report.removed,
            report.total
        );
        Ok(report)
    }

    fn single_flight<F>(&self, id: &str, user: &str, construct: F) -> Result<Wrapper>
    where
        F: FnOnce() -> Result<(Item, Option<u64>)>,
    {
        if let Some(wrapper) = self.get_cached(id) {
            debug!("cache: hit {id}");
            return Ok(wrapper);
        }

        let lock = self
            .building
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(id.to_string())
            .or_default()
            .clone();
        let _guard = lock.lock().unwrap_or_else(PoisonError::into_inner);

        if let Some(wrapper) = self.get_cached(id) {
            debug!("cache: hit {id} after wait");
            return Ok(wrapper);
        }

        debug!("cache: miss {id}");
        let result = construct().and_then(|(item, saved_version)| {
            if item.id() != id {
                return Err(Error::ValidationFailed(format!(
                    "{} item id {} does not match its key {id}",
                    item.item_type().as_str(),
                    item.id()
                )));
            }
            let wrapper = Wrapper::new(
                item,
                saved_version,
                user,
                Arc::clone(&self.store),
                self.registry.context().clone(),
            );
            wrapper.sync()?;
            Ok(self
                .wrappers
                .write()
                .unwrap_or_else(PoisonError::into_inner)
                .entry(id.to_string())
                .or_insert(wrapper)
                .clone())
        });

        // Success or not, later callers either hit the map or start over.
        let mut building = self.building.lock().unwrap_or_else(PoisonError::into_inner);
        if building.get(id).is_some_and(|l| Arc::ptr_eq(l, &lock)) {
            building.remove(id);
        }
        result
    }

    #[cfg(test)]
    fn pending_builds(&self) -> usize {
        self.building
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

impl std::fmt::Debug for MediaCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MediaCache")
            .field("registry", &self.registry)
            .field("len", &self.len())
            .finish()
    }
}
