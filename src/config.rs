use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::ConfigError;
use crate::raster::MAX_DIMENSION;

/// Environment variable that overrides where the session is stored
pub const STATE_DIR_ENV: &str = "STYLIZE_STATE_DIR";
pub const CONFIG_FILE: &str = "stylize.json";

const APP_DIR: &str = "eframe_stylize";

/// Runtime settings read once at startup
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StylizeConfig {
    /// Where the session manifest and images live. `None` disables persistence.
    pub state_dir: Option<PathBuf>,
    /// Seconds of quiet after the last change before the session is saved
    pub autosave_delay_secs: f64,
    /// Long side of the image sent for image-to-image requests
    pub max_dimension: u32,
    /// How many image textures are kept uploaded
    pub texture_cache_size: usize,
}

impl Default for StylizeConfig {
    fn default() -> Self {
        Self {
            state_dir: default_state_dir(),
            autosave_delay_secs: 1.5,
            max_dimension: MAX_DIMENSION,
            texture_cache_size: 32,
        }
    }
}

impl StylizeConfig {
    /// Loads `stylize.json` from the state directory, or defaults if there is none.
    ///
    /// `STYLIZE_STATE_DIR` picks the directory and always wins over the file.
    pub fn load() -> Result<Self, ConfigError> {
        let env_dir = std::env::var_os(STATE_DIR_ENV).map(PathBuf::from);
        let dir = env_dir.clone().or_else(default_state_dir);

        let mut config = match &dir {
            Some(dir) => Self::load_from(dir)?,
            None => Self::default(),
        };
        if let Some(env_dir) = env_dir {
            config.state_dir = Some(env_dir);
        }
        config.validate();
        Ok(config)
    }

    /// Reads `stylize.json` in `dir`. A missing file yields defaults rooted at `dir`.
    pub fn load_from(dir: &Path) -> Result<Self, ConfigError> {
        let path = dir.join(CONFIG_FILE);
        if !path.exists() {
            log::info!("Config file not found, using defaults");
            log::debug!("Expected config at: {}", path.display());
            return Ok(Self {
                state_dir: Some(dir.to_path_buf()),
                ..Self::default()
            });
        }

        let json = fs::read_to_string(&path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        let mut config: StylizeConfig =
            serde_json::from_str(&json).map_err(|source| ConfigError::Parse {
                path: path.display().to_string(),
                source,
            })?;
        if config.state_dir.is_none() {
            config.state_dir = Some(dir.to_path_buf());
        }
        config.validate();

        log::info!("Loaded config from {}", path.display());
        log::debug!("Config: {:?}", config);
        Ok(config)
    }

    /// Clamps values into usable ranges
    fn validate(&mut self) {
        if !self.autosave_delay_secs.is_finite() || self.autosave_delay_secs < 0.0 {
            log::warn!(
                "Invalid autosave_delay_secs = {}, using 1.5",
                self.autosave_delay_secs
            );
            self.autosave_delay_secs = 1.5;
        }
        if !(64..=4096).contains(&self.max_dimension) {
            log::warn!("max_dimension = {} out of range, clamping to 64-4096", self.max_dimension);
            self.max_dimension = self.max_dimension.clamp(64, 4096);
        }
        self.texture_cache_size = self.texture_cache_size.max(4);
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn default_state_dir() -> Option<PathBuf> {
    dirs::data_dir().map(|dir| dir.join(APP_DIR))
}

#[cfg(target_arch = "wasm32")]
fn default_state_dir() -> Option<PathBuf> {
    None
}
