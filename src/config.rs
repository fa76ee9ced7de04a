//! Per-user configuration for nimbus.
//!
//! Loads optional `config.toml` from the nimbus config directory
//! (`$NIMBUS_CONFIG_DIR` or the platform config dir + `nimbus/`).
//! Missing or invalid files fall back to defaults with a warning.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::output::Output;

/// Execution mode loaded when none is configured.
pub const DEFAULT_MODE: &str = "classic";

/// File name of the config document inside the config directory.
pub const CONFIG_FILE: &str = "config.toml";

/// Resolve the nimbus config directory.
///
/// `NIMBUS_CONFIG_DIR` overrides the per-user location, which keeps tests
/// and scripted environments hermetic.
pub fn config_home() -> PathBuf {
    if let Ok(dir) = std::env::var("NIMBUS_CONFIG_DIR") {
        if !dir.is_empty() {
            return PathBuf::from(dir);
        }
    }
    dirs::config_dir()
        .map(|d| d.join("nimbus"))
        .unwrap_or_else(|| PathBuf::from(".nimbus"))
}

/// Serializes tests that point `NIMBUS_CONFIG_DIR` at a temp dir, since the
/// test harness runs threads in one process.
#[cfg(test)]
pub(crate) fn env_lock() -> std::sync::MutexGuard<'static, ()> {
    static LOCK: std::sync::Mutex<()> = std::sync::Mutex::new(());
    LOCK.lock()
        .unwrap_or_else(std::sync::PoisonError::into_inner)
}

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NimbusConfig {
    /// Execution mode selecting which command namespace loads
    /// (`classic` or `resource`).
    pub mode: String,
    /// Show the banner line at the top of root help output.
    pub banner: bool,
}

impl Default for NimbusConfig {
    fn default() -> Self {
        Self {
            mode: DEFAULT_MODE.to_string(),
            banner: true,
        }
    }
}

impl NimbusConfig {
    /// Load config from the nimbus config directory.
    /// Returns default config if the file doesn't exist or is invalid.
    pub fn load(out: &Output) -> Self {
        Self::load_from_path(&config_home().join(CONFIG_FILE), out)
    }

    /// Load config from a specific path.
    pub fn load_from_path(path: &Path, out: &Output) -> Self {
        if !path.exists() {
            return Self::default();
        }

        match std::fs::read_to_string(path) {
            Ok(content) => match toml::from_str(&content) {
                Ok(config) => config,
                Err(e) => {
                    out.warn(&format!("failed to parse {}: {}", path.display(), e));
                    Self::default()
                }
            },
            Err(e) => {
                out.warn(&format!("failed to read {}: {}", path.display(), e));
                Self::default()
            }
        }
    }

    /// Write the config back to the config directory.
    pub fn save(&self) -> std::io::Result<()> {
        self.save_to_path(&config_home().join(CONFIG_FILE))
    }

    pub fn save_to_path(&self, path: &Path) -> std::io::Result<()> {
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir)?;
        }
        let doc = toml::to_string_pretty(self)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        std::fs::write(path, doc)
    }

    /// Validate the configured mode against the modes this build knows.
    ///
    /// An unknown mode logs an error, resets the config to the default mode,
    /// and persists the reset so the bad value doesn't stick around.
    pub fn resolve_mode(&mut self, known_modes: &[&str], out: &Output) -> String {
        if known_modes.contains(&self.mode.as_str()) {
            return self.mode.clone();
        }

        out.error(&format!(
            "invalid config mode '{}'; resetting to '{}'",
            self.mode, DEFAULT_MODE
        ));
        self.mode = DEFAULT_MODE.to_string();
        if let Err(e) = self.save() {
            out.warn(&format!("could not rewrite config: {}", e));
        }
        self.mode.clone()
    }
}
