use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

/// Top-level settings loaded from `config.toml`.
///
/// File format: TOML
/// Default path (Linux/XDG): `$XDG_CONFIG_HOME/soundscape/config.toml` or `~/.config/soundscape/config.toml`
///
/// Precedence (highest wins):
/// 1) Environment variables (prefix `SOUNDSCAPE__`, `__` as nested separator)
/// 2) Config file (if present)
/// 3) Struct defaults
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub session: SessionSettings,
    pub library: LibrarySettings,
    pub log: LogSettings,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SessionSettings {
    /// Track-descriptor batch (JSON array, or TOML with `[[track]]` tables).
    pub tracks_file: PathBuf,
    /// Directory scanned for playable assets.
    pub assets_dir: PathBuf,
    /// Envelope tick interval (milliseconds).
    pub tick_interval_ms: u64,
    /// How long an idle track waits before asking for an asset again (milliseconds).
    pub retry_interval_ms: u64,
    /// How often each track polls its backend for lifecycle changes (milliseconds).
    pub poll_interval_ms: u64,
    /// Assets tried per transition before a track gives up and holds.
    pub max_enqueue_attempts: u32,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            tracks_file: PathBuf::from("tracks.json"),
            assets_dir: PathBuf::from("assets"),
            tick_interval_ms: 50,
            retry_interval_ms: 5_000,
            poll_interval_ms: 100,
            max_enqueue_attempts: 3,
        }
    }
}

impl SessionSettings {
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    pub fn retry_interval(&self) -> Duration {
        Duration::from_millis(self.retry_interval_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LibrarySettings {
    /// File extensions to treat as audio (case-insensitive, without dot).
    pub extensions: Vec<String>,
    /// Whether to follow symlinks during scanning.
    pub follow_links: bool,
    /// Whether to include hidden files/directories (dotfiles).
    pub include_hidden: bool,
    /// Whether to recurse into subdirectories.
    pub recursive: bool,
    /// Optional cap on directory recursion depth.
    pub max_depth: Option<usize>,
}

impl Default for LibrarySettings {
    fn default() -> Self {
        Self {
            extensions: vec!["mp3".into(), "flac".into(), "wav".into(), "ogg".into(), "m4a".into()],
            follow_links: true,
            include_hidden: false,
            recursive: true,
            max_depth: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LogSettings {
    /// `tracing` filter directive, used when `RUST_LOG` is unset.
    pub filter: String,
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            filter: "soundscape=info".to_string(),
        }
    }
}
