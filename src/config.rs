//! Configuration file handling for pyxpic.
//!
//! Loads configuration from `<config_dir>/pyxpic/config.toml` or a custom path.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::allocator::DEFAULT_MAX_ATTEMPTS;
use crate::ascii::{CharSet, ColorMode, RenderOptions};
use crate::camera::{is_valid_scale, MAX_SCALE};
use crate::camera::CaptureSettings;
use crate::store::{FileStore, DEFAULT_COLLECTION, FIRESTORE_BASE_URL};

/// Configuration file structure for pyxpic.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub capture: CaptureConfig,
    #[serde(default)]
    pub render: RenderConfig,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub allocator: AllocatorConfig,
    #[serde(default)]
    pub kiosk: KioskConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaptureConfig {
    #[serde(default = "default_scale")]
    pub scale: f32,
    #[serde(default = "default_true")]
    pub mirror: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input: Option<PathBuf>,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            scale: default_scale(),
            mirror: true,
            input: None,
        }
    }
}

impl CaptureConfig {
    /// Capture settings for `input`, using this section's scale and mirroring.
    pub fn settings_for(&self, input: PathBuf) -> CaptureSettings {
        CaptureSettings {
            input,
            scale: self.scale,
            mirror: self.mirror,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RenderConfig {
    #[serde(default)]
    pub charset: CharSet,
    #[serde(default)]
    pub color: ColorMode,
    #[serde(default)]
    pub background: bool,
    #[serde(default)]
    pub invert: bool,
}

impl RenderConfig {
    pub fn options(&self) -> RenderOptions {
        RenderOptions {
            charset: self.charset,
            invert: self.invert,
            color: self.color,
            background: self.background,
        }
    }
}

/// Which collection backend to use.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    Memory,
    #[default]
    File,
    Firestore,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoreConfig {
    #[serde(default)]
    pub backend: Backend,
    /// Directory of the file backend.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_id: Option<String>,
    #[serde(default = "default_collection")]
    pub collection: String,
    #[serde(default = "default_base_url")]
    pub base_url: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: Backend::default(),
            path: None,
            project_id: None,
            collection: default_collection(),
            base_url: default_base_url(),
        }
    }
}

impl StoreConfig {
    /// Directory of the file backend, falling back to the platform data dir.
    pub fn file_dir(&self) -> PathBuf {
        self.path.clone().unwrap_or_else(FileStore::default_dir)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AllocatorConfig {
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
}

impl Default for AllocatorConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KioskConfig {
    #[serde(default = "default_pause_secs")]
    pub pause_secs: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub save_dir: Option<PathBuf>,
}

impl Default for KioskConfig {
    fn default() -> Self {
        Self {
            pause_secs: default_pause_secs(),
            save_dir: None,
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_scale() -> f32 {
    5.0
}

fn default_collection() -> String {
    DEFAULT_COLLECTION.to_string()
}

fn default_base_url() -> String {
    FIRESTORE_BASE_URL.to_string()
}

fn default_max_attempts() -> u32 {
    DEFAULT_MAX_ATTEMPTS
}

fn default_pause_secs() -> u64 {
    10
}

impl Config {
    /// Load configuration from a file path.
    /// Returns default config if the file doesn't exist.
    /// Returns an error if the file exists but cannot be parsed.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let path = path.map(PathBuf::from).unwrap_or_else(default_path);

        if path.exists() {
            let content = std::fs::read_to_string(&path).map_err(|e| ConfigError::IoError {
                path: path.clone(),
                source: e,
            })?;
            let config = Self::parse(&content).map_err(|e| ConfigError::ParseError {
                path: path.clone(),
                source: e,
            })?;
            config
                .validate()
                .map_err(|message| ConfigError::InvalidValue { path, message })?;
            Ok(config)
        } else {
            log::debug!("No config file at {}, using defaults", path.display());
            Ok(Config::default())
        }
    }

    pub fn parse(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Check values the TOML types alone do not constrain.
    pub fn validate(&self) -> Result<(), String> {
        if !is_valid_scale(self.capture.scale) {
            return Err(format!(
                "[capture] scale must be in (0, {}], got {}",
                MAX_SCALE, self.capture.scale
            ));
        }
        Ok(())
    }

    /// Render the configuration as TOML.
    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }
}

/// Errors that can occur when loading configuration.
#[derive(Debug)]
pub enum ConfigError {
    IoError {
        path: PathBuf,
        source: std::io::Error,
    },
    ParseError {
        path: PathBuf,
        source: toml::de::Error,
    },
    InvalidValue {
        path: PathBuf,
        message: String,
    },
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::IoError { path, source } => {
                write!(
                    f,
                    "Failed to read config file '{}': {}",
                    path.display(),
                    source
                )
            }
            ConfigError::ParseError { path, source } => {
                write!(
                    f,
                    "Failed to parse config file '{}': {}",
                    path.display(),
                    source
                )
            }
            ConfigError::InvalidValue { path, message } => {
                write!(f, "Invalid config file '{}': {}", path.display(), message)
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::IoError { source, .. } => Some(source),
            ConfigError::ParseError { source, .. } => Some(source),
            ConfigError::InvalidValue { .. } => None,
        }
    }
}

/// Get the default config file path.
pub fn default_path() -> PathBuf {
    dirs::config_dir()
        .map(|d| d.join("pyxpic").join("config.toml"))
        .unwrap_or_else(|| {
            let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
            PathBuf::from(home).join(".config/pyxpic/config.toml")
        })
}

/// Contents written by `config init`.
pub const DEFAULT_CONFIG_TEMPLATE: &str = r#"# pyxpic configuration

[capture]
# Resize factor applied to the captured image (x: 0.045 * scale, y: 0.025 * scale)
scale = 5.0
# Mirror horizontally (selfie mode)
mirror = true
# Default still image to capture from
# input = "/path/to/photo.jpg"

[render]
# Character set: standard, blocks, minimal
charset = "standard"
# Color: none, truecolor, indexed
color = "none"
# Color the cell background instead of the glyph
background = false
# Invert brightness (for light themes)
invert = false

[store]
# Backend: memory, file, firestore
backend = "file"
# Record directory of the file backend
# path = "/path/to/records"
# Firestore project and collection
# project_id = "my-project"
collection = "pyxpic"
base_url = "https://firestore.googleapis.com/v1"

[allocator]
# Identifier draws before giving up
max_attempts = 16

[kiosk]
# Seconds between sessions
pause_secs = 10
# Also save each grid as <save_dir>/<owner>.txt
# save_dir = "/path/to/saves"
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load(Some(&dir.path().join("absent.toml"))).unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.capture.scale, 5.0);
        assert!(config.capture.mirror);
        assert_eq!(config.store.backend, Backend::File);
        assert_eq!(config.store.collection, "pyxpic");
        assert_eq!(config.allocator.max_attempts, 16);
        assert_eq!(config.kiosk.pause_secs, 10);
    }

    #[test]
    fn test_out_of_range_scale_is_rejected() {
        for scale in ["-3.0", "0.0", "1e9", "nan"] {
            let mut file = tempfile::NamedTempFile::new().unwrap();
            writeln!(file, "[capture]\nscale = {}", scale).unwrap();

            let result = Config::load(Some(file.path()));
            match result {
                Err(ConfigError::InvalidValue { message, .. }) => {
                    assert!(message.contains("scale"), "{}", message)
                }
                other => panic!("Expected InvalidValue for {}, got {:?}", scale, other),
            }
        }
    }

    #[test]
    fn test_partial_file_keeps_other_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[render]\ncolor = \"indexed\"\n\n[store]\nbackend = \"firestore\"\nproject_id = \"demo\""
        )
        .unwrap();

        let config = Config::load(Some(file.path())).unwrap();
        assert_eq!(config.render.color, ColorMode::Indexed);
        assert_eq!(config.render.charset, CharSet::Standard);
        assert_eq!(config.store.backend, Backend::Firestore);
        assert_eq!(config.store.project_id.as_deref(), Some("demo"));
        assert_eq!(config.store.base_url, FIRESTORE_BASE_URL);
        assert!(config.capture.mirror);
    }

    #[test]
    fn test_invalid_file_is_parse_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[store]\nbackend = \"floppy\"").unwrap();

        let err = Config::load(Some(file.path())).unwrap_err();
        assert!(matches!(err, ConfigError::ParseError { .. }));
        assert!(err.to_string().contains("Failed to parse config file"));
    }

    #[test]
    fn test_template_parses_to_defaults() {
        let config = Config::parse(DEFAULT_CONFIG_TEMPLATE).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_to_toml_reparses() {
        let mut config = Config::default();
        config.kiosk.save_dir = Some(PathBuf::from("/tmp/saves"));
        let text = config.to_toml().unwrap();
        assert_eq!(Config::parse(&text).unwrap(), config);
    }

    #[test]
    fn test_default_path_ends_with_app_dir() {
        assert!(default_path().ends_with("pyxpic/config.toml"));
    }
}
