//! Application configuration.
//!
//! Configuration is loaded from a TOML file at:
//! 1. `$TGEXPORT_CONFIG` (environment variable)
//! 2. `~/.config/tgexport/config.toml` (Linux/macOS)
//!    `%APPDATA%\tgexport\config.toml` (Windows)
//! 3. Built-in defaults
//!
//! Command-line flags override whatever is loaded here.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{ExportError, Result};
use crate::export::options::{ExportMode, ExportOptions, DEFAULT_MAX_MESSAGES};
use crate::export::pacing::Pacing;
use crate::filter::extension::{ExtensionPolicy, DEFAULT_EXTENSIONS};
use crate::filter::size::DEFAULT_SIZE_LIMIT_MIB;

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// General behavior settings.
    pub general: GeneralConfig,
    /// Export defaults.
    pub export: ExportConfig,
    /// Delay between messages.
    pub pacing: PacingConfig,
}

/// General behavior settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Override cache directory for logs.
    pub cache_dir: Option<PathBuf>,
    /// Log level: "error", "warn", "info", "debug", "trace".
    pub log_level: String,
}

/// Export defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    /// Allowed extensions, case-insensitive, with or without the leading dot.
    pub extensions: Vec<String>,
    /// Size ceiling in MiB.
    pub size_limit_mb: f64,
    /// Maximum number of messages to process.
    pub max_messages: usize,
    /// "list" or "download".
    pub mode: ExportMode,
    /// Download destination (default: current directory).
    pub download_dir: Option<PathBuf>,
    /// Write the JSON manifest at the end of a run.
    pub write_manifest: bool,
    /// Directory for the manifest file (default: current directory).
    pub output_dir: Option<PathBuf>,
}

/// Inter-message delay bounds, in milliseconds.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PacingConfig {
    pub min_delay_ms: u64,
    pub max_delay_ms: u64,
}

// ── Default implementations ─────────────────────────────────────

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            cache_dir: None,
            log_level: "info".to_string(),
        }
    }
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            extensions: DEFAULT_EXTENSIONS.iter().map(|e| e.to_string()).collect(),
            size_limit_mb: DEFAULT_SIZE_LIMIT_MIB,
            max_messages: DEFAULT_MAX_MESSAGES,
            mode: ExportMode::List,
            download_dir: None,
            write_manifest: true,
            output_dir: None,
        }
    }
}

impl Default for PacingConfig {
    fn default() -> Self {
        Self {
            min_delay_ms: 1000,
            max_delay_ms: 3000,
        }
    }
}

impl Config {
    /// Run options as configured, before command-line overrides.
    pub fn export_options(&self) -> ExportOptions {
        ExportOptions {
            extensions: ExtensionPolicy::new(&self.export.extensions),
            size_limit_mib: self.export.size_limit_mb,
            max_messages: self.export.max_messages,
            mode: self.export.mode,
            download_dir: self
                .export
                .download_dir
                .clone()
                .unwrap_or_else(|| PathBuf::from(".")),
            pacing: Pacing::new(
                Duration::from_millis(self.pacing.min_delay_ms),
                Duration::from_millis(self.pacing.max_delay_ms),
            ),
        }
    }
}

// ── Load ────────────────────────────────────────────────────────

/// Load configuration, searching standard locations.
///
/// Returns the default configuration if no file is found. A file that
/// cannot be read or parsed is an error; callers decide whether to fall
/// back to defaults once logging is up.
pub fn load_config() -> Result<Config> {
    match config_file_path() {
        Some(path) if path.exists() => load_config_from(&path),
        _ => Ok(Config::default()),
    }
}

/// Load configuration from a specific TOML file.
pub fn load_config_from(path: &Path) -> Result<Config> {
    let contents = std::fs::read_to_string(path).map_err(|e| ExportError::io(path, e))?;
    toml::from_str::<Config>(&contents)
        .map_err(|e| ExportError::InvalidConfig(format!("{}: {e}", path.display())))
}

/// Determine the config file path (checking env var first, then standard dirs).
pub fn config_file_path() -> Option<PathBuf> {
    if let Ok(env_path) = std::env::var("TGEXPORT_CONFIG") {
        return Some(PathBuf::from(env_path));
    }
    dirs::config_dir().map(|d| d.join("tgexport").join("config.toml"))
}

/// Return the cache directory for logs.
pub fn cache_dir(config: &Config) -> PathBuf {
    if let Some(ref dir) = config.general.cache_dir {
        return dir.clone();
    }
    dirs::cache_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("tgexport")
}

/// Return the log file path.
pub fn log_file_path(config: &Config) -> PathBuf {
    cache_dir(config).join("tgexport.log")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let cfg = Config::default();
        assert_eq!(cfg.export.mode, ExportMode::List);
        assert_eq!(cfg.export.max_messages, 100);
        assert_eq!(cfg.export.size_limit_mb, 3072.0);
        assert_eq!(cfg.export.extensions.len(), 11);
        assert!(cfg.export.write_manifest);
        assert_eq!(cfg.pacing.min_delay_ms, 1000);
    }

    #[test]
    fn test_serialize_deserialize_roundtrip() {
        let cfg = Config::default();
        let toml_str = toml::to_string_pretty(&cfg).expect("serialize");
        let parsed: Config = toml::from_str(&toml_str).expect("deserialize");
        assert_eq!(parsed.export.extensions, cfg.export.extensions);
        assert_eq!(parsed.export.mode, cfg.export.mode);
        assert_eq!(parsed.pacing.max_delay_ms, cfg.pacing.max_delay_ms);
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let partial = r#"
[export]
mode = "download"
extensions = ["PDF", ".csv"]

[pacing]
max_delay_ms = 500
"#;
        let cfg: Config = toml::from_str(partial).expect("parse partial");
        assert_eq!(cfg.export.mode, ExportMode::Download);
        assert_eq!(cfg.export.max_messages, 100);
        assert_eq!(cfg.pacing.min_delay_ms, 1000);

        let opts = cfg.export_options();
        assert!(opts.extensions.allows_file("paper.pdf"));
        assert!(!opts.extensions.allows_file("dump.zip"));
        // bounds given out of order are swapped
        assert_eq!(opts.pacing.min(), Duration::from_millis(500));
        assert_eq!(opts.pacing.max(), Duration::from_millis(1000));
        assert_eq!(opts.download_dir, PathBuf::from("."));
    }

    #[test]
    fn test_load_config_from_file() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("config.toml");
        std::fs::write(&path, "[export]\nmax_messages = 7\n").unwrap();
        let cfg = load_config_from(&path).unwrap();
        assert_eq!(cfg.export.max_messages, 7);
    }

    #[test]
    fn test_unparsable_config_is_reported() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("config.toml");
        std::fs::write(&path, "[export\nmax_messages = ").unwrap();
        let err = load_config_from(&path).unwrap_err();
        assert!(matches!(err, ExportError::InvalidConfig(_)));
        assert!(err.to_string().contains("config.toml"));

        let err = load_config_from(&tmp.path().join("missing.toml")).unwrap_err();
        assert!(matches!(err, ExportError::Io { .. }));
    }

    #[test]
    fn test_log_file_under_cache_dir() {
        let mut cfg = Config::default();
        cfg.general.cache_dir = Some(PathBuf::from("/tmp/tgexport-cache"));
        assert_eq!(log_file_path(&cfg), PathBuf::from("/tmp/tgexport-cache/tgexport.log"));
    }
}
