use tracing::debug;

use crate::media::Wrapper;

/// Playback side of the bot. The playlist only signals it and never waits.
pub trait Transport: Send + Sync {
    /// Stop the current entry early. The transport then reports completion
    /// as usual, which advances the playlist.
    fn interrupt(&self);

    /// Ask an idle transport to advance and start playing.
    fn request_advance(&self);

    fn is_playing(&self) -> bool;
}

/// Source of "play something similar" picks for autoplay.
pub trait SuggestionSource: Send + Sync {
    /// An item to queue after `last`, if any.
    fn suggest(&self, last: &Wrapper) -> Option<Wrapper>;
}

/// Transport that never plays; signals are only logged.
#[derive(Debug, Default, Clone, Copy)]
pub struct IdleTransport;

impl Transport for IdleTransport {
    fn interrupt(&self) {
        debug!("transport: interrupt (idle)");
    }

    fn request_advance(&self) {
        debug!("transport: advance requested (idle)");
    }

    fn is_playing(&self) -> bool {
        false
    }
}
