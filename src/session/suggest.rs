use std::sync::Arc;

use rand::seq::IndexedRandom;
use tracing::{debug, warn};

use crate::error::Result;
use crate::media::{ItemRecord, MediaCache, Wrapper};
use crate::playlist::SuggestionSource;
use crate::store::{Condition, Field};

/// Autoplay picks drawn from the catalog.
///
/// Prefers items sharing a tag with the last entry and falls back to any
/// local file. The last entry itself is never suggested.
pub struct CatalogSuggestions {
    cache: Arc<MediaCache>,
    user: String,
}

impl CatalogSuggestions {
    pub fn new(cache: Arc<MediaCache>, user: impl Into<String>) -> Self {
        Self {
            cache,
            user: user.into(),
        }
    }

    fn candidates(&self, last: &Wrapper) -> Result<Vec<ItemRecord>> {
        let store = self.cache.store();
        let mut pool = Vec::new();
        for tag in last.tags() {
            pool.extend(store.query_by_tags(std::slice::from_ref(&tag))?);
        }
        pool.retain(|r| r.id != last.id());
        if pool.is_empty() {
            pool = store.query(&Condition::new().and_equal(Field::Type, "file"))?;
            pool.retain(|r| r.id != last.id());
        }
        Ok(pool)
    }
}

impl SuggestionSource for CatalogSuggestions {
    fn suggest(&self, last: &Wrapper) -> Option<Wrapper> {
        let pool = match self.candidates(last) {
            Ok(pool) => pool,
            Err(e) => {
                warn!("autoplay: catalog query failed: {e}");
                return None;
            }
        };
        let record = pool.choose(&mut rand::rng())?;
        debug!("autoplay: picked {} after {}", record.id, last.id());
        self.cache
            .get_from_record(record, &self.user)
            .inspect_err(|e| warn!("autoplay: cannot load {}: {e}", record.id))
            .ok()
    }
}

impl std::fmt::Debug for CatalogSuggestions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CatalogSuggestions")
            .field("user", &self.user)
            .finish_non_exhaustive()
    }
}
