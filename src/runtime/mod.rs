use std::env;
use std::path::PathBuf;
use std::sync::Arc;

use tracing::{info, warn};

use jukebot::media::{MediaCache, MediaContext, Registry};
use jukebot::playlist::{IdleTransport, Playlist};
use jukebot::session::{CatalogSuggestions, Session};
use jukebot::store::SqliteStore;

mod settings;
mod startup;

/// Open the catalog, sync it with the music folder and restore the saved
/// queue.
///
/// Usage: `jukebot [music_folder] [--dump-config]`
pub fn run() -> Result<(), Box<dyn std::error::Error>> {
    let mut settings = settings::load_settings();

    let mut dump_config = false;
    for arg in env::args().skip(1) {
        match arg.as_str() {
            "--dump-config" => dump_config = true,
            folder => settings.library.music_folder = PathBuf::from(folder),
        }
    }
    if dump_config {
        print!("{}", settings.to_toml()?);
        return Ok(());
    }

    startup::init_logging(&settings);
    info!("jukebot: music folder {}", settings.library.music_folder.display());

    let store = Arc::new(SqliteStore::open(&settings.database.path)?);
    let registry = Registry::new(MediaContext::new(&settings.library.music_folder));
    let cache = Arc::new(MediaCache::new(registry, store));
    let playlist = Arc::new(
        Playlist::new(settings.playlist.mode.into(), Arc::new(IdleTransport))
            .with_suggestions(Arc::new(CatalogSuggestions::new(cache.clone(), "autoplay"))),
    );

    let restore = settings.playlist.restore_queue;
    let session = Session::new(cache, playlist, settings);

    let report = session.rescan()?;
    if restore {
        match session.restore_queue("system") {
            Ok(n) => info!("jukebot: restored {n} queue entries"),
            Err(e) => warn!("jukebot: could not restore the queue: {e}"),
        }
    }

    info!(
        "jukebot: {} files in the library ({} new, {} gone), {} queued, mode {}",
        report.total,
        report.added,
        report.removed,
        session.playlist().len(),
        session.playlist().mode()
    );
    session.save_queue()?;
    Ok(())
}
