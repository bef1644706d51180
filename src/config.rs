//! Settings: encode target, JPEG quality, response shape, backend, timeout.
//!
//! Resolution order: built-in defaults, then the JSON settings file, then
//! `SCREEN_GRAB_*` environment variables (a `.env` file is honoured).
//!
//! The settings file lives in the platform config directory:
//!   macOS:   ~/Library/Application Support/screen-grab/settings.json
//!   Linux:   ~/.config/screen-grab/settings.json
//!   Windows: %APPDATA%/screen-grab/settings.json
//! `SCREEN_GRAB_CONFIG` points somewhere else.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::capture::Backend;
use crate::channel::ResponseShape;
use crate::encode::{EncodeTarget, DEFAULT_JPEG_QUALITY};

pub const CONFIG_PATH_VAR: &str = "SCREEN_GRAB_CONFIG";

const TARGET_VAR: &str = "SCREEN_GRAB_TARGET";
const QUALITY_VAR: &str = "SCREEN_GRAB_JPEG_QUALITY";
const SHAPE_VAR: &str = "SCREEN_GRAB_RESPONSE_SHAPE";
const BACKEND_VAR: &str = "SCREEN_GRAB_BACKEND";
const TIMEOUT_VAR: &str = "SCREEN_GRAB_CAPTURE_TIMEOUT_MS";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    pub target: EncodeTarget,
    /// 1..=100, only used when `target` is JPEG.
    pub jpeg_quality: u8,
    pub response_shape: ResponseShape,
    pub backend: Backend,
    /// No timeout when unset.
    pub capture_timeout_ms: Option<u64>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            target: EncodeTarget::Png,
            jpeg_quality: DEFAULT_JPEG_QUALITY,
            response_shape: ResponseShape::Rich,
            backend: Backend::Auto,
            capture_timeout_ms: None,
        }
    }
}

impl Settings {
    /// The JPEG deployment: quality-50 JPEG in the `{buffer, format}` shape.
    pub fn jpeg_variant() -> Self {
        Self {
            target: EncodeTarget::Jpeg,
            response_shape: ResponseShape::Lightweight,
            ..Self::default()
        }
    }

    /// Loads settings from the default file plus the process environment.
    pub fn load() -> Result<Self, ConfigError> {
        if let Ok(path) = dotenvy::dotenv() {
            log::debug!("[CONFIG] Loaded environment from {}", path.display());
        }

        let mut settings = Self::load_file(&settings_path())?;
        settings.apply_overrides(|key| std::env::var(key).ok())?;
        settings.validate()?;

        log::info!("[CONFIG] {:?}", settings);
        Ok(settings)
    }

    /// Reads a settings file. A missing file yields the defaults.
    pub fn load_file(path: &Path) -> Result<Self, ConfigError> {
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                log::debug!("[CONFIG] No settings at {}, using defaults", path.display());
                return Ok(Self::default());
            }
            Err(source) => {
                return Err(ConfigError::Read {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };

        serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Applies `SCREEN_GRAB_*` overrides from `lookup`.
    pub fn apply_overrides(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<(), ConfigError> {
        if let Some(value) = lookup(TARGET_VAR) {
            self.target = parse_var(TARGET_VAR, &value)?;
        }
        if let Some(value) = lookup(QUALITY_VAR) {
            self.jpeg_quality = parse_var(QUALITY_VAR, &value)?;
        }
        if let Some(value) = lookup(SHAPE_VAR) {
            self.response_shape = parse_var(SHAPE_VAR, &value)?;
        }
        if let Some(value) = lookup(BACKEND_VAR) {
            self.backend = parse_var(BACKEND_VAR, &value)?;
        }
        if let Some(value) = lookup(TIMEOUT_VAR) {
            self.capture_timeout_ms = match value.trim() {
                "" | "0" | "none" => None,
                ms => Some(parse_var(TIMEOUT_VAR, ms)?),
            };
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(1..=100).contains(&self.jpeg_quality) {
            return Err(ConfigError::InvalidValue {
                key: "jpegQuality",
                value: self.jpeg_quality.to_string(),
            });
        }
        if self.capture_timeout_ms == Some(0) {
            return Err(ConfigError::InvalidValue {
                key: "captureTimeoutMs",
                value: "0".to_string(),
            });
        }
        Ok(())
    }

    pub fn capture_timeout(&self) -> Option<Duration> {
        self.capture_timeout_ms.map(Duration::from_millis)
    }
}

/// Path of the settings file, honouring `SCREEN_GRAB_CONFIG`.
pub fn settings_path() -> PathBuf {
    if let Ok(path) = std::env::var(CONFIG_PATH_VAR) {
        return PathBuf::from(path);
    }
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("screen-grab")
        .join("settings.json")
}

fn parse_var<T>(key: &'static str, value: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
{
    value.trim().parse().map_err(|_| ConfigError::InvalidValue {
        key,
        value: value.to_string(),
    })
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read settings {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse settings {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("Invalid value for {key}: '{value}'")]
    InvalidValue { key: &'static str, value: String },
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_are_png_rich_quality_50() {
        let settings = Settings::default();
        assert_eq!(settings.target, EncodeTarget::Png);
        assert_eq!(settings.jpeg_quality, 50);
        assert_eq!(settings.response_shape, ResponseShape::Rich);
        assert_eq!(settings.backend, Backend::Auto);
        assert_eq!(settings.capture_timeout(), None);
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn jpeg_variant_uses_lightweight_shape() {
        let settings = Settings::jpeg_variant();
        assert_eq!(settings.target, EncodeTarget::Jpeg);
        assert_eq!(settings.response_shape, ResponseShape::Lightweight);
        assert_eq!(settings.jpeg_quality, 50);
    }

    #[test]
    fn settings_path_uses_screen_grab_dir() {
        if std::env::var(CONFIG_PATH_VAR).is_ok() {
            return;
        }
        let path = settings_path();
        let s = path.to_string_lossy();
        assert!(s.contains("screen-grab"));
        assert!(s.ends_with("settings.json"));
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let settings: Settings =
            serde_json::from_str(r#"{"target": "jpeg", "jpegQuality": 80}"#).unwrap();
        assert_eq!(settings.target, EncodeTarget::Jpeg);
        assert_eq!(settings.jpeg_quality, 80);
        assert_eq!(settings.response_shape, ResponseShape::Rich);
    }

    #[test]
    fn missing_file_gives_defaults() {
        let settings = Settings::load_file(Path::new("/no/such/screen-grab.json")).unwrap();
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn malformed_file_is_a_parse_error() {
        let path = std::env::temp_dir().join(format!("screen-grab-bad-{}.json", std::process::id()));
        std::fs::write(&path, "{ not json").unwrap();
        let result = Settings::load_file(&path);
        let _ = std::fs::remove_file(&path);
        assert!(matches!(result, Err(ConfigError::Parse { .. })));
    }

    #[test]
    fn env_overrides_win() {
        let mut settings = Settings::default();
        settings
            .apply_overrides(lookup(&[
                ("SCREEN_GRAB_TARGET", "jpg"),
                ("SCREEN_GRAB_JPEG_QUALITY", " 75 "),
                ("SCREEN_GRAB_RESPONSE_SHAPE", "lightweight"),
                ("SCREEN_GRAB_BACKEND", "monitor"),
                ("SCREEN_GRAB_CAPTURE_TIMEOUT_MS", "1500"),
            ]))
            .unwrap();

        assert_eq!(settings.target, EncodeTarget::Jpeg);
        assert_eq!(settings.jpeg_quality, 75);
        assert_eq!(settings.response_shape, ResponseShape::Lightweight);
        assert_eq!(settings.backend, Backend::Monitor);
        assert_eq!(settings.capture_timeout(), Some(Duration::from_millis(1500)));
    }

    #[test]
    fn timeout_override_can_disable() {
        let mut settings = Settings {
            capture_timeout_ms: Some(200),
            ..Settings::default()
        };
        settings
            .apply_overrides(lookup(&[("SCREEN_GRAB_CAPTURE_TIMEOUT_MS", "none")]))
            .unwrap();
        assert_eq!(settings.capture_timeout_ms, None);
    }

    #[test]
    fn bad_override_names_the_variable() {
        let mut settings = Settings::default();
        let err = settings
            .apply_overrides(lookup(&[("SCREEN_GRAB_JPEG_QUALITY", "high")]))
            .unwrap_err();
        assert!(err.to_string().contains("SCREEN_GRAB_JPEG_QUALITY"));
    }

    #[test]
    fn quality_out_of_range_fails_validation() {
        let settings = Settings {
            jpeg_quality: 0,
            ..Settings::default()
        };
        assert!(matches!(
            settings.validate(),
            Err(ConfigError::InvalidValue { key: "jpegQuality", .. })
        ));
    }
}
