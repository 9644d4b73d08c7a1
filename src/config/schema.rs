use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::playlist::PlaybackMode;

/// Top-level settings loaded from `config.toml`.
///
/// File format: TOML
/// Default path (Linux/XDG): `$XDG_CONFIG_HOME/jukebot/config.toml` or `~/.config/jukebot/config.toml`
///
/// Precedence (highest wins):
/// 1) Environment variables (prefix `JUKEBOT__`, `__` as nested separator)
/// 2) Config file (if present)
/// 3) Struct defaults
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Settings {
    pub library: LibrarySettings,
    pub playlist: PlaylistSettings,
    pub database: DatabaseSettings,
    pub logging: LoggingSettings,
    /// Named radio presets: `name = "url [comment]"`.
    pub radio: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LibrarySettings {
    /// Root folder of local music files. Relative item paths resolve against it.
    pub music_folder: PathBuf,
    /// File extensions to treat as audio (case-insensitive, without dot).
    pub extensions: Vec<String>,
    /// Whether to follow symlinks during rescans.
    pub follow_links: bool,
    /// Whether to include hidden files/directories (dotfiles).
    pub include_hidden: bool,
    /// Folder names (relative to `music_folder`) skipped during rescans.
    pub ignored_folders: Vec<String>,
    /// File names skipped during rescans.
    pub ignored_files: Vec<String>,
}

impl Default for LibrarySettings {
    fn default() -> Self {
        Self {
            music_folder: PathBuf::from("music"),
            extensions: vec![
                "mp3".into(),
                "flac".into(),
                "wav".into(),
                "ogg".into(),
                "opus".into(),
                "m4a".into(),
            ],
            follow_links: true,
            include_hidden: false,
            ignored_folders: vec!["tmp".into()],
            ignored_files: vec!["Thumbs.db".into()],
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct PlaylistSettings {
    /// Playback mode the queue starts in.
    pub mode: ModeSetting,
    /// Clear a one-shot queue once playback stops.
    pub clear_when_stopped: bool,
    /// Maximum number of candidates kept in a shortlist.
    pub max_shortlist: usize,
    /// Reload the queue saved in the catalog at startup.
    pub restore_queue: bool,
}

impl Default for PlaylistSettings {
    fn default() -> Self {
        Self {
            mode: ModeSetting::OneShot,
            clear_when_stopped: true,
            max_shortlist: 50,
            restore_queue: true,
        }
    }
}

#[derive(Debug, Copy, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ModeSetting {
    #[serde(alias = "oneshot", alias = "one_shot", alias = "sequential")]
    OneShot,
    #[serde(alias = "loop")]
    Repeat,
    #[serde(alias = "shuffle")]
    Random,
    #[serde(alias = "auto", alias = "auto-play")]
    Autoplay,
}

impl From<ModeSetting> for PlaybackMode {
    fn from(m: ModeSetting) -> Self {
        match m {
            ModeSetting::OneShot => PlaybackMode::OneShot,
            ModeSetting::Repeat => PlaybackMode::Repeat,
            ModeSetting::Random => PlaybackMode::Random,
            ModeSetting::Autoplay => PlaybackMode::Autoplay,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DatabaseSettings {
    /// SQLite catalog file.
    pub path: PathBuf,
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            path: PathBuf::from("music.db"),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingSettings {
    /// `tracing` filter directive used when `RUST_LOG` is not set.
    pub level: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl Settings {
    /// Stream URL of the radio preset `name`, without its comment.
    pub fn radio_preset(&self, name: &str) -> Option<&str> {
        self.radio
            .get(name.trim())
            .and_then(|v| v.split_whitespace().next())
    }

    /// Every preset as `(name, url, comment)`, sorted by name. The comment is
    /// whatever follows the URL, possibly empty.
    pub fn radio_presets(&self) -> Vec<(&str, &str, &str)> {
        self.radio
            .iter()
            .filter_map(|(name, value)| {
                let value = value.trim();
                let (url, comment) = value
                    .split_once(char::is_whitespace)
                    .unwrap_or((value, ""));
                (!url.is_empty()).then_some((name.as_str(), url, comment.trim()))
            })
            .collect()
    }
}
