//! Layered configuration loading
//!
//! Layers, lowest first: built-in defaults, the config file, environment
//! variables. Callers with a higher layer of their own (CLI flags) take the
//! unvalidated result of [`ConfigLoader::layered`], apply it, and validate
//! once at the end.

use crate::{Result, config::Settings};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Environment variable naming the config file
pub const CONFIG_ENV_VAR: &str = "VOLTAR_CONFIG";

/// Builds [`Settings`] from defaults, file and environment
#[derive(Debug, Clone, Default)]
pub struct ConfigLoader {
    /// Base layer used when no file is read
    defaults: Settings,
}

impl ConfigLoader {
    /// Loader starting from the built-in defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Loader starting from caller-supplied defaults
    pub fn with_defaults(defaults: Settings) -> Self {
        Self { defaults }
    }

    /// The base layer
    pub fn defaults(&self) -> &Settings {
        &self.defaults
    }

    /// Which config file to read, if any
    ///
    /// An explicit path wins. Otherwise `VOLTAR_CONFIG` is authoritative when
    /// set, even if it names a missing file, so a stray user config can never
    /// leak into a run that pointed somewhere else. Only then is
    /// `<config_dir>/voltar/config.toml` considered, and only if it exists.
    pub fn locate(explicit: Option<&Path>) -> Option<PathBuf> {
        if let Some(path) = explicit {
            return Some(path.to_path_buf());
        }

        if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
            debug!("Config file from {}: {:?}", CONFIG_ENV_VAR, path);
            return Some(PathBuf::from(path));
        }

        dirs::config_dir()
            .map(|dir| dir.join("voltar").join("config.toml"))
            .filter(|path| path.exists())
    }

    /// Defaults, then the located file, then the environment; not validated
    pub fn layered(&self, config_file: Option<&Path>) -> Result<Settings> {
        let mut settings = match Self::locate(config_file) {
            Some(path) if path.exists() => {
                debug!("Reading configuration from {:?}", path);
                Settings::from_file(&path)?
            }
            Some(path) => {
                warn!("Config file {:?} does not exist, using defaults", path);
                self.defaults.clone()
            }
            None => self.defaults.clone(),
        };

        settings.apply_env()?;
        Ok(settings)
    }

    /// [`layered`](Self::layered) followed by validation
    pub fn load(&self, config_file: Option<&Path>) -> Result<Settings> {
        let settings = self.layered(config_file)?;
        settings.validate()?;
        debug!("Effective configuration: {:?}", settings);
        Ok(settings)
    }
}
