//! Paths and persisted settings.
//!
//! Directory resolution:
//! 1. CLI `--config-dir`
//! 2. `WTL_LIVE_CONFIG_DIR` environment variable
//! 3. Current directory IF it holds a `wtl-live.json` or `wtl-live.log`
//! 4. Platform config/data directory from dirs-next
//!
//! Platform paths:
//! - Linux: ~/.config/wtl-live/{name}, ~/.local/share/wtl-live/{name}
//! - macOS: ~/Library/Application Support/wtl-live/{name}
//! - Windows: %APPDATA%\wtl-live\{name}

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use log::debug;
use serde::{Deserialize, Serialize};

use crate::bridge::setup::ResolutionPresets;
use crate::core::refresh::DEFAULT_REFRESH_MS;
use crate::protocol::{DEFAULT_CONTROL_ROUTE, DEFAULT_PARAMS_ROUTE};

pub const APP_DIR: &str = "wtl-live";
pub const SETTINGS_FILE: &str = "wtl-live.json";
pub const LOG_FILE: &str = "wtl-live.log";
pub const CONFIG_DIR_ENV: &str = "WTL_LIVE_CONFIG_DIR";
pub const BACKEND_ENV: &str = "WTL_LIVE_BACKEND";
pub const DEFAULT_BACKEND_URL: &str = "http://127.0.0.1:8188";

// ============================================================================
// Paths
// ============================================================================

/// Overrides for default application paths
#[derive(Debug, Clone, Default)]
pub struct PathConfig {
    /// Custom config directory (from CLI or ENV)
    pub config_dir: Option<PathBuf>,
}

impl PathConfig {
    /// Priority: CLI arg → ENV var → None (use defaults)
    pub fn from_env_and_cli(cli_dir: Option<PathBuf>) -> Self {
        let config_dir = cli_dir.or_else(|| std::env::var(CONFIG_DIR_ENV).ok().map(PathBuf::from));
        Self { config_dir }
    }
}

pub fn config_file(name: &str, config: &PathConfig) -> PathBuf {
    config_dir(config).join(name)
}

/// Logs and other runtime output.
pub fn data_file(name: &str, config: &PathConfig) -> PathBuf {
    data_dir(config).join(name)
}

/// Create config and data directories if missing.
pub fn ensure_dirs(config: &PathConfig) -> Result<()> {
    let config_dir = config_dir(config);
    let data_dir = data_dir(config);
    std::fs::create_dir_all(&config_dir)
        .with_context(|| format!("Failed to create config directory: {}", config_dir.display()))?;
    if data_dir != config_dir {
        std::fs::create_dir_all(&data_dir)
            .with_context(|| format!("Failed to create data directory: {}", data_dir.display()))?;
    }
    Ok(())
}

fn has_local_files(dir: &Path) -> bool {
    [SETTINGS_FILE, LOG_FILE].iter().any(|f| dir.join(f).exists())
}

fn resolve_dir(config: &PathConfig, platform: Option<PathBuf>) -> PathBuf {
    if let Some(dir) = &config.config_dir {
        return dir.clone();
    }
    if let Ok(current) = std::env::current_dir()
        && has_local_files(&current)
    {
        return current;
    }
    platform
        .map(|d| d.join(APP_DIR))
        .unwrap_or_else(|| PathBuf::from("."))
}

fn config_dir(config: &PathConfig) -> PathBuf {
    resolve_dir(config, dirs_next::config_dir())
}

fn data_dir(config: &PathConfig) -> PathBuf {
    resolve_dir(config, dirs_next::data_dir())
}

// ============================================================================
// Settings
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Backend base URL
    pub backend_url: String,
    pub params_route: String,
    pub control_route: String,
    /// Refresh scheduler poll period
    pub refresh_interval_ms: u64,
    /// Send on a background thread instead of the caller's
    pub background_dispatch: bool,
    /// Ratio → resolution choices for latent nodes
    pub resolution_presets: ResolutionPresets,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            backend_url: DEFAULT_BACKEND_URL.to_string(),
            params_route: DEFAULT_PARAMS_ROUTE.to_string(),
            control_route: DEFAULT_CONTROL_ROUTE.to_string(),
            refresh_interval_ms: DEFAULT_REFRESH_MS,
            background_dispatch: true,
            resolution_presets: ResolutionPresets::new(),
        }
    }
}

impl Settings {
    /// Read settings from `path`. A missing file yields defaults.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!("No settings at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings: {}", path.display()))?;
        serde_json::from_str(&text).with_context(|| format!("Malformed settings: {}", path.display()))
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }
        let text = serde_json::to_string_pretty(self).context("Failed to serialize settings")?;
        std::fs::write(path, text).with_context(|| format!("Failed to write settings: {}", path.display()))
    }

    /// Settings file from the resolved config directory, then
    /// environment and CLI overrides.
    pub fn resolve(paths: &PathConfig, backend_override: Option<&str>) -> Result<Self> {
        let mut settings = Self::load(&config_file(SETTINGS_FILE, paths))?;
        if let Ok(url) = std::env::var(BACKEND_ENV) {
            settings.backend_url = url;
        }
        if let Some(url) = backend_override {
            settings.backend_url = url.to_string();
        }
        Ok(settings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_file_with_custom_dir() {
        let config = PathConfig {
            config_dir: Some(PathBuf::from("/custom")),
        };
        assert_eq!(config_file("test.json", &config), PathBuf::from("/custom/test.json"));
        assert_eq!(data_file(LOG_FILE, &config), PathBuf::from("/custom/wtl-live.log"));
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let settings = Settings::load(&dir.path().join(SETTINGS_FILE)).unwrap();
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.params_route, "/params");
        assert_eq!(settings.refresh_interval_ms, 100);
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(SETTINGS_FILE);
        std::fs::write(
            &path,
            r#"{"backend_url": "http://10.0.0.5:9000", "resolution_presets": {"1:1": ["512x512"]}}"#,
        )
        .unwrap();
        let settings = Settings::load(&path).unwrap();
        assert_eq!(settings.backend_url, "http://10.0.0.5:9000");
        assert_eq!(settings.control_route, "/control");
        assert_eq!(settings.resolution_presets["1:1"], vec!["512x512".to_string()]);
    }

    #[test]
    fn test_malformed_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(SETTINGS_FILE);
        std::fs::write(&path, "{ not json").unwrap();
        let err = Settings::load(&path).unwrap_err();
        assert!(format!("{:#}", err).contains("Malformed settings"));
    }

    #[test]
    fn test_save_load_and_cli_override() {
        let dir = tempfile::tempdir().unwrap();
        let paths = PathConfig {
            config_dir: Some(dir.path().join("nested")),
        };
        let mut settings = Settings::default();
        settings.refresh_interval_ms = 250;
        settings.save(&config_file(SETTINGS_FILE, &paths)).unwrap();

        let resolved = Settings::resolve(&paths, Some("http://127.0.0.1:9999")).unwrap();
        assert_eq!(resolved.refresh_interval_ms, 250);
        assert_eq!(resolved.backend_url, "http://127.0.0.1:9999");
    }
}
