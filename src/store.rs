//! Catalog access: predicate chains and the store contract the core relies on.
//!
//! The core composes [`Condition`]s and hands them to a [`MusicStore`]; it
//! never writes SQL itself. [`SqliteStore`] is the relational backend used
//! by the binary and the tests.

mod query;
mod sqlite;

pub use query::{Condition, Field, Order, Predicate, escape_like};
pub use sqlite::SqliteStore;

use crate::error::Result;
use crate::media::ItemRecord;

pub trait MusicStore: Send + Sync {
    /// Records matching every predicate. Ordered by the condition's
    /// order-by when present, else in a stable insertion order.
    fn query(&self, condition: &Condition) -> Result<Vec<ItemRecord>>;

    /// Records carrying all of `tags` (exact, case-sensitive), in store order.
    fn query_by_tags(&self, tags: &[String]) -> Result<Vec<ItemRecord>>;

    /// Records whose keyword text contains every word (case-insensitive).
    fn query_by_keywords(&self, words: &[String]) -> Result<Vec<ItemRecord>>;

    fn fetch(&self, id: &str) -> Result<Option<ItemRecord>>;

    /// Insert or replace the record with the same id.
    fn save(&self, record: &ItemRecord) -> Result<()>;

    fn delete(&self, id: &str) -> Result<()>;

    /// Persist the queue as ordered ids plus cursor.
    fn save_queue(&self, ids: &[String], current: Option<usize>) -> Result<()>;

    fn load_queue(&self) -> Result<(Vec<String>, Option<usize>)>;
}

#[cfg(test)]
mod tests;
