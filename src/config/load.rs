use std::{env, path::PathBuf};

use super::schema::Settings;

/// Configuration loading helpers.
///
/// `Settings::load` reads an optional config file and then applies
/// environment variables (prefix `SOUNDSCAPE__`) on top of it.
impl Settings {
    /// Load settings from environment and optional config file.
    pub fn load() -> Result<Self, ::config::ConfigError> {
        let config_path = resolve_config_path();

        let mut builder = ::config::Config::builder();

        if let Some(path) = &config_path {
            builder = builder.add_source(::config::File::from(path.as_path()).required(false));
        }

        builder = builder.add_source(
            ::config::Environment::with_prefix("SOUNDSCAPE")
                .separator("__")
                .try_parsing(true),
        );

        let cfg = builder.build()?;
        let settings: Settings = cfg.try_deserialize()?;
        Ok(settings)
    }

    /// Perform basic validation checks on loaded settings.
    pub fn validate(&self) -> Result<(), String> {
        if self.session.tick_interval_ms == 0 {
            return Err("session.tick_interval_ms must be >= 1".to_string());
        }
        if self.session.retry_interval_ms == 0 {
            return Err("session.retry_interval_ms must be >= 1".to_string());
        }
        if self.session.poll_interval_ms == 0 {
            return Err("session.poll_interval_ms must be >= 1".to_string());
        }
        if self.session.max_enqueue_attempts == 0 {
            return Err("session.max_enqueue_attempts must be >= 1".to_string());
        }
        Ok(())
    }
}

/// Resolve the config path from `SOUNDSCAPE_CONFIG_PATH` or XDG defaults.
pub fn resolve_config_path() -> Option<PathBuf> {
    if let Some(p) = env::var_os("SOUNDSCAPE_CONFIG_PATH") {
        return Some(PathBuf::from(p));
    }
    default_config_path()
}

/// Compute the default config path under `$XDG_CONFIG_HOME/soundscape/config.toml`
/// or `~/.config/soundscape/config.toml` when `XDG_CONFIG_HOME` is not set.
pub fn default_config_path() -> Option<PathBuf> {
    let config_home = if let Some(xdg) = env::var_os("XDG_CONFIG_HOME") {
        Some(PathBuf::from(xdg))
    } else {
        env::var_os("HOME").map(|home| PathBuf::from(home).join(".config"))
    };

    config_home.map(|d| d.join("soundscape").join("config.toml"))
}
