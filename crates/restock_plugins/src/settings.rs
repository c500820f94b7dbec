//! Settings plugin: the `restock.toml` file.
//!
//! The file holds the operator-facing knobs. It is created with defaults the
//! first time a session starts in a directory that has none. A file that
//! cannot be read, parsed or validated never stops the session: the problem
//! is logged and the defaults apply.
//!
//! ```toml
//! reset_time_value = 7
//! reset_time_unit = "days"
//! only_reset_when_empty = true
//! include_secondary_containers = false
//! reconcile_interval_secs = 1
//! instance_search_radius = 2
//! ```

use core::time::Duration;
use restock_engine::config::{EngineConfig, TimeUnit};
use restock_engine::error::ConfigError;
use restock_system::plugin::Plugin;
use restock_system::resource::GlobalResource;
use restock_system::server::Server;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Name of the settings file inside the settings directory.
pub const SETTINGS_FILE_NAME: &str = "restock.toml";

// ─────────────────────────────────────────────────────────────────────────────
// SettingsFile
// ─────────────────────────────────────────────────────────────────────────────

/// Raw contents of `restock.toml`.
///
/// Missing keys take their default value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SettingsFile {
    /// Cooldown length, in `reset_time_unit`s.
    pub reset_time_value: u64,
    /// `seconds`, `minutes`, `hours` or `days`.
    pub reset_time_unit: String,
    /// Only reset containers that are empty.
    pub only_reset_when_empty: bool,
    /// Track barrel-like containers too.
    pub include_secondary_containers: bool,
    /// Seconds between reconciliation passes.
    pub reconcile_interval_secs: u64,
    /// Blocks searched around a mobile container's last known position.
    pub instance_search_radius: u32,
}

impl Default for SettingsFile {
    fn default() -> Self {
        Self {
            reset_time_value: 7,
            reset_time_unit: TimeUnit::Days.to_string(),
            only_reset_when_empty: true,
            include_secondary_containers: false,
            reconcile_interval_secs: 1,
            instance_search_radius: 2,
        }
    }
}

impl SettingsFile {
    /// Parses settings from TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] if the text is not valid TOML or a key
    /// has the wrong type.
    pub fn parse(path: &Path, content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }

    /// Reads `path`, writing a default file first if none exists.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read or the default
    /// cannot be written, and [`ConfigError::Parse`] if it is malformed.
    pub fn load_or_create(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => Self::parse(path, &content),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                let defaults = Self::default();
                defaults.write(path)?;
                tracing::info!(path = %path.display(), "created default settings file");
                Ok(defaults)
            }
            Err(source) => Err(ConfigError::Io {
                path: path.to_path_buf(),
                source,
            }),
        }
    }

    /// Writes these settings to `path`, creating parent directories.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] on filesystem failure.
    pub fn write(&self, path: &Path) -> Result<(), ConfigError> {
        let io = |source: std::io::Error| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        };
        let content = toml::to_string_pretty(self).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(io)?;
        }
        std::fs::write(path, content).map_err(io)
    }

    /// Validates the raw values and resolves them into an [`EngineConfig`].
    ///
    /// An unknown time unit is not an error: it is logged and days are used.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] if `reset_time_value` or
    /// `reconcile_interval_secs` is zero.
    pub fn resolve(&self) -> Result<EngineConfig, ConfigError> {
        if self.reset_time_value == 0 {
            return Err(ConfigError::invalid_value(
                "reset_time_value",
                "must be greater than 0",
            ));
        }
        if self.reconcile_interval_secs == 0 {
            return Err(ConfigError::invalid_value(
                "reconcile_interval_secs",
                "must be greater than 0",
            ));
        }

        let unit = self
            .reset_time_unit
            .parse::<TimeUnit>()
            .unwrap_or_else(|err| {
                tracing::warn!(error = %err, "unknown reset time unit, using days");
                TimeUnit::Days
            });

        Ok(EngineConfig::default()
            .with_cooldown(unit.times(self.reset_time_value))
            .with_empty_only(self.only_reset_when_empty)
            .with_secondary_containers(self.include_secondary_containers)
            .with_reconcile_interval(Duration::from_secs(self.reconcile_interval_secs))
            .with_instance_search_radius(self.instance_search_radius))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Settings Resource
// ─────────────────────────────────────────────────────────────────────────────

/// Resolved settings for the session.
#[derive(Debug, Clone)]
pub struct Settings {
    config: EngineConfig,
    path: PathBuf,
}

impl GlobalResource for Settings {}

impl Settings {
    /// Loads settings from `dir`, falling back to defaults on any error.
    #[must_use]
    pub fn load(dir: impl AsRef<Path>) -> Self {
        let path = dir.as_ref().join(SETTINGS_FILE_NAME);
        let config = match SettingsFile::load_or_create(&path).and_then(|file| file.resolve()) {
            Ok(config) => config,
            Err(err) => {
                tracing::warn!(error = %err, "invalid settings, using defaults");
                EngineConfig::default()
            }
        };
        Self { config, path }
    }

    /// The resolved engine configuration.
    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Path of the settings file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// SettingsPlugin
// ─────────────────────────────────────────────────────────────────────────────

/// Loads `restock.toml` when the session becomes ready.
///
/// # Resources Provided
///
/// | Resource | Scope | Description |
/// |----------|-------|-------------|
/// | [`Settings`] | Global | Resolved engine configuration |
#[derive(Debug, Clone)]
pub struct SettingsPlugin {
    dir: PathBuf,
}

impl SettingsPlugin {
    /// Reads settings from `dir`.
    #[must_use]
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

impl Plugin for SettingsPlugin {
    fn build(&self, _server: &mut Server) {}

    fn ready(&self, server: &mut Server) {
        let settings = Settings::load(&self.dir);
        tracing::info!(
            cooldown_secs = settings.config.policy.cooldown.as_secs(),
            empty_only = settings.config.policy.empty_only,
            "settings loaded"
        );
        server.insert_global(settings);
    }
}
