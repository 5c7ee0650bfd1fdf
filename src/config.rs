//! Runtime configuration for the bridge.
//!
//! Covers the knobs that vary per deployment: the body-specific choice
//! strings used by the preview sequence and the whole-operation timeout
//! applied around each serialized session call.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BridgeConfig {
    pub session: SessionConfig,
    pub preview: PreviewConfig,
}

/// Session-wide behavior.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Upper bound on one whole session operation, in milliseconds.
    /// 0 disables the timeout. A timed-out operation forces the next one
    /// to reconnect before touching the device.
    pub operation_timeout_ms: u64,
}

/// Choice strings written during preview setup.
///
/// The write order and the viewfinder toggle are protocol-fixed, but these
/// two literals are body vocabulary: Nikon says "JPEG Normal" where other
/// bodies say "JPEG Fine".
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PreviewConfig {
    /// Choice written to `capturetarget` so frames stay in camera memory.
    pub capture_target: String,
    /// Choice written to `imagequality` for the preview frame.
    pub image_quality: String,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            session: SessionConfig {
                operation_timeout_ms: 30_000,
            },
            preview: PreviewConfig::default(),
        }
    }
}

impl Default for PreviewConfig {
    fn default() -> Self {
        Self {
            capture_target: "Internal RAM".to_string(),
            image_quality: "JPEG Normal".to_string(),
        }
    }
}

impl BridgeConfig {
    /// Load configuration from a TOML file, falling back to defaults when
    /// the file does not exist.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, String> {
        let path = path.as_ref();

        if !path.exists() {
            log::info!("Config file not found at {:?}, using defaults", path);
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .map_err(|e| format!("Failed to read config file: {}", e))?;

        let config: BridgeConfig =
            toml::from_str(&contents).map_err(|e| format!("Failed to parse config file: {}", e))?;

        log::info!("Loaded configuration from {:?}", path);
        Ok(config)
    }

    /// Save configuration to a TOML file.
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), String> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| format!("Failed to create config directory: {}", e))?;
        }

        let toml_string = toml::to_string_pretty(self)
            .map_err(|e| format!("Failed to serialize config: {}", e))?;

        fs::write(path, toml_string).map_err(|e| format!("Failed to write config file: {}", e))?;

        log::info!("Saved configuration to {:?}", path);
        Ok(())
    }

    /// Default config file path.
    pub fn default_path() -> PathBuf {
        PathBuf::from("tethercam.toml")
    }

    /// Load from the default location or fall back to defaults.
    pub fn load_or_default() -> Self {
        Self::load_from_file(Self::default_path()).unwrap_or_else(|e| {
            log::warn!("Failed to load config, using defaults: {}", e);
            Self::default()
        })
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), String> {
        if self.session.operation_timeout_ms != 0 && self.session.operation_timeout_ms < 100 {
            return Err("Operation timeout must be 0 (disabled) or at least 100ms".to_string());
        }
        if self.preview.capture_target.trim().is_empty() {
            return Err("Preview capture target must not be empty".to_string());
        }
        if self.preview.image_quality.trim().is_empty() {
            return Err("Preview image quality must not be empty".to_string());
        }
        Ok(())
    }
}
