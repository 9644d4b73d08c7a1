//! Core of a voice-chat music bot: a catalog of local files and radio
//! streams, a cache handing out one shared wrapper per item, and the
//! playback queue built on top of them.

pub mod config;
pub mod error;
pub mod media;
pub mod playlist;
pub mod session;
pub mod store;

pub use error::{Error, Result};

#[cfg(test)]
mod testutil;
