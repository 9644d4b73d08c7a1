use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// What happens when the current entry finishes.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default)]
pub enum PlaybackMode {
    /// Play forward once and stop at the end.
    #[default]
    OneShot,
    /// Like one-shot; repeats are explicit re-inserts of the current entry.
    Repeat,
    /// Pick the next entry at random; starts over when everything played.
    Random,
    /// Like one-shot, but ask for a suggestion when the queue runs out.
    Autoplay,
}

impl PlaybackMode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::OneShot => "one-shot",
            Self::Repeat => "repeat",
            Self::Random => "random",
            Self::Autoplay => "autoplay",
        }
    }
}

impl fmt::Display for PlaybackMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown playback mode `{0}` (expected one-shot, repeat, random or autoplay)")]
pub struct ParseModeError(pub String);

impl FromStr for PlaybackMode {
    type Err = ParseModeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "one-shot" | "oneshot" | "one_shot" | "sequential" => Ok(Self::OneShot),
            "repeat" | "loop" => Ok(Self::Repeat),
            "random" | "shuffle" => Ok(Self::Random),
            "autoplay" | "auto" | "auto-play" => Ok(Self::Autoplay),
            _ => Err(ParseModeError(s.to_string())),
        }
    }
}
