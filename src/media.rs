//! Media module: items, their catalog records and the shared wrapper cache.
//!
//! Items are built through a [`Registry`] of per-type handlers and handed out
//! as [`Wrapper`]s by the [`MediaCache`], which keeps at most one live wrapper
//! per item id.

mod cache;
mod file;
mod item;
mod radio;
mod record;
mod registry;
mod scan;
mod wrapper;

pub use cache::{MediaCache, RescanReport};
pub use file::FileItem;
pub(crate) use file::normalize_path;
pub use item::{Item, ItemMeta, ItemType, MediaContext, Readiness};
pub use radio::{RadioItem, parse_stream_url};
pub use record::{ItemRecord, ReadyState};
pub use registry::{BuildFn, IdFn, ItemArgs, ItemHandler, LoadFn, Registry};
pub use wrapper::Wrapper;
