
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// XDG prefix for configuration files (e.g. `~/.config/joymouse`)
const XDG_PREFIX: &str = "joymouse";
/// Primary config file name
const CONFIG_FILE: &str = "config.json";
/// Pre-rename config file name, read-only for migration
const LEGACY_CONFIG_FILE: &str = "settings.json";

const MAX_DEADZONE: f64 = 0.30;
const MIN_ALPHA: f64 = 0.05;
const MAX_ALPHA: f64 = 0.95;
const MIN_GAMMA: f64 = 1.0;
const MAX_GAMMA: f64 = 2.5;

const DEFAULT_POINTER_ALPHA: f64 = 0.35;
const DEFAULT_SCROLL_ALPHA: f64 = 0.50;
const DEFAULT_SCROLL_GAMMA: f64 = 1.60;

/// Represents all possible errors loading or saving a [Config]
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("Could not read: {0}")]
    IoError(#[from] io::Error),
    #[error("Unable to deserialize: {0}")]
    DeserializeError(#[from] serde_json::Error),
    #[error("Unable to determine config path: {0}")]
    XdgError(#[from] xdg::BaseDirectoriesError),
}

/// User configuration for the translation engine.
///
/// Every numeric field is range-checked by [Config::normalize], which is
/// applied on every load and save; out-of-range values are clamped, never
/// surfaced as errors. The PascalCase aliases accept config files written
/// by the original Windows build of this tool.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default, rename_all = "snake_case")]
pub struct Config {
    /// Legacy single speed multiplier, folded into `pointer_speed` by the
    /// normalization pass
    #[serde(alias = "Sensitivity")]
    pub sensitivity: f64,
    /// Minimum stick magnitude treated as deflection, `[0, 0.30]`
    #[serde(alias = "Deadzone")]
    pub deadzone: f64,
    /// Cursor speed multiplier, must be positive
    #[serde(alias = "PointerSpeed")]
    pub pointer_speed: f64,
    /// Vertical scroll rate multiplier, must be positive
    #[serde(alias = "ScrollSpeedV")]
    pub scroll_speed_v: f64,
    /// Horizontal scroll rate multiplier, must be positive
    #[serde(alias = "ScrollSpeedH")]
    pub scroll_speed_h: f64,
    #[serde(alias = "InvertScrollV")]
    pub invert_scroll_v: bool,
    #[serde(alias = "InvertScrollH")]
    pub invert_scroll_h: bool,
    /// Pointer EMA coefficient, `[0.05, 0.95]`; higher is snappier
    #[serde(alias = "PointerAlpha")]
    pub pointer_alpha: f64,
    /// Scroll EMA coefficient, `[0.05, 0.95]`
    #[serde(alias = "ScrollAlpha")]
    pub scroll_alpha: f64,
    /// Scroll response exponent, `[1.0, 2.5]`
    #[serde(alias = "ScrollGamma")]
    pub scroll_gamma: f64,
    /// Command line to spawn when the keyboard button fires, e.g. an
    /// on-screen keyboard launcher. Empty disables the button.
    pub keyboard_command: String,
    /// When true the keyboard button also works while mouse mode is off
    pub keyboard_while_inactive: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            sensitivity: 1.0,
            deadzone: 0.12,
            pointer_speed: 1.0,
            scroll_speed_v: 1.0,
            scroll_speed_h: 1.0,
            invert_scroll_v: false,
            invert_scroll_h: false,
            pointer_alpha: DEFAULT_POINTER_ALPHA,
            scroll_alpha: DEFAULT_SCROLL_ALPHA,
            scroll_gamma: DEFAULT_SCROLL_GAMMA,
            keyboard_command: String::new(),
            keyboard_while_inactive: false,
        }
    }
}

impl Config {
    /// Load a [Config] from the given JSON string
    pub fn from_json(content: &str) -> Result<Config, LoadError> {
        let config: Config = serde_json::from_str(content)?;
        Ok(config)
    }

    /// Load a [Config] from the given JSON file
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Config, LoadError> {
        let file = std::fs::File::open(path)?;
        let config: Config = serde_json::from_reader(file)?;
        Ok(config)
    }

    /// One deterministic defaulting-and-clamping pass, applied on every
    /// load and save regardless of where the values came from.
    pub fn normalize(&mut self) {
        // Defaulting for fields older config revisions left unset or zero
        if self.pointer_speed <= 0.0 {
            self.pointer_speed = if self.sensitivity > 0.0 {
                self.sensitivity
            } else {
                1.0
            };
        }
        if self.scroll_speed_v <= 0.0 {
            self.scroll_speed_v = self.pointer_speed;
        }
        if self.scroll_speed_h <= 0.0 {
            self.scroll_speed_h = self.pointer_speed;
        }
        if self.pointer_alpha <= 0.0 {
            self.pointer_alpha = DEFAULT_POINTER_ALPHA;
        }
        if self.scroll_alpha <= 0.0 {
            self.scroll_alpha = DEFAULT_SCROLL_ALPHA;
        }
        if self.scroll_gamma <= 0.0 {
            self.scroll_gamma = DEFAULT_SCROLL_GAMMA;
        }

        self.deadzone = self.deadzone.clamp(0.0, MAX_DEADZONE);
        self.pointer_alpha = self.pointer_alpha.clamp(MIN_ALPHA, MAX_ALPHA);
        self.scroll_alpha = self.scroll_alpha.clamp(MIN_ALPHA, MAX_ALPHA);
        self.scroll_gamma = self.scroll_gamma.clamp(MIN_GAMMA, MAX_GAMMA);
    }

    /// Loads and normalizes the configuration. A missing file yields
    /// defaults and writes a fresh config; an unreadable or corrupt file
    /// is logged and replaced by defaults for this run.
    pub fn load(path: Option<&Path>) -> Config {
        let resolved = path.map(Path::to_path_buf).or_else(find_config_file);
        let mut config = match resolved {
            Some(path) => match Config::from_json_file(&path) {
                Ok(config) => {
                    log::info!("Loaded config from {}", path.display());
                    config
                }
                Err(e) => {
                    log::warn!("Unable to load config {}: {e}", path.display());
                    Config::default()
                }
            },
            None => {
                log::info!("No config file found, using defaults");
                let config = Config::default();
                if let Err(e) = config.save(None) {
                    log::warn!("Unable to write default config: {e}");
                }
                config
            }
        };
        config.normalize();
        config
    }

    /// Writes the normalized config as pretty JSON to the given path, or
    /// to the default XDG location when no path is given.
    pub fn save(&self, path: Option<&Path>) -> Result<(), LoadError> {
        let path = match path {
            Some(path) => path.to_path_buf(),
            None => {
                let base_dirs = xdg::BaseDirectories::with_prefix(XDG_PREFIX)?;
                base_dirs.place_config_file(CONFIG_FILE)?
            }
        };
        let mut config = self.clone();
        config.normalize();
        let content = serde_json::to_string_pretty(&config)?;
        std::fs::write(&path, content)?;
        log::debug!("Saved config to {}", path.display());
        Ok(())
    }
}

/// Returns the directory config files live in, for the reload watcher
pub fn config_dir() -> Option<PathBuf> {
    let base_dirs = xdg::BaseDirectories::with_prefix(XDG_PREFIX).ok()?;
    Some(base_dirs.get_config_home())
}

/// Returns the name of the config file to watch for changes
pub fn config_file_name() -> &'static str {
    CONFIG_FILE
}

fn find_config_file() -> Option<PathBuf> {
    let base_dirs = xdg::BaseDirectories::with_prefix(XDG_PREFIX).ok()?;
    base_dirs
        .find_config_file(CONFIG_FILE)
        .or_else(|| base_dirs.find_config_file(LEGACY_CONFIG_FILE))
}
