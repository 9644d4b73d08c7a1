//! Playlist module: the shared playback queue and the traits it drives.
//!
//! The [`Playlist`] owns an ordered list of [`crate::media::Wrapper`]s, a
//! cursor and a [`PlaybackMode`]. Every mutation runs under one lock; signals
//! to the [`Transport`] are sent after the lock is released.

mod mode;
mod model;
mod transport;

pub use mode::{ParseModeError, PlaybackMode};
pub use model::Playlist;
pub use transport::{IdleTransport, SuggestionSource, Transport};

#[cfg(test)]
mod tests;
