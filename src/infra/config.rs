//! Configuration management infrastructure.
//!
//! Loads and saves envelope preferences (cipher policy, scratch directory,
//! engine selection) as a TOML file in the user's configuration directory.

use crate::domain::cipher::CipherChoice;
use crate::infra::error::{SmimeError, SmimeResult};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Application configuration with all envelope preferences
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnvelopeConfiguration {
    /// Directory for scratch files (system temp directory when unset)
    pub scratch_dir: Option<PathBuf>,

    /// Symmetric cipher policy
    pub cipher: CipherPolicyConfig,

    /// PKCS#7 engine selection
    pub engine: EngineConfig,
}

/// Symmetric cipher policy
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CipherPolicyConfig {
    /// Preferred content-encryption cipher
    pub preferred: String,

    /// Fall back to 3DES-CBC when the preferred cipher is unavailable
    pub allow_legacy_fallback: bool,
}

/// Which PKCS#7 engine performs the encryption
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EngineKind {
    /// In-process OpenSSL library calls
    Library,
    /// The `openssl smime` command-line tool
    Command,
}

/// Engine configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub kind: EngineKind,

    /// Executable used by the command engine
    pub openssl_binary: String,

    /// Upper bound on a single command-engine run
    pub timeout_seconds: u64,
}

impl Default for CipherPolicyConfig {
    fn default() -> Self {
        Self {
            preferred: CipherChoice::Aes256Cbc.as_str().to_string(),
            allow_legacy_fallback: false,
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            kind: EngineKind::Library,
            openssl_binary: "openssl".to_string(),
            timeout_seconds: 30,
        }
    }
}

impl EnvelopeConfiguration {
    /// Directory where scratch files are created.
    #[must_use]
    pub fn scratch_dir(&self) -> PathBuf {
        self.scratch_dir
            .clone()
            .unwrap_or_else(std::env::temp_dir)
    }

    /// Preferred cipher, parsed.
    pub fn preferred_cipher(&self) -> SmimeResult<CipherChoice> {
        self.cipher.preferred.parse::<CipherChoice>()
    }

    #[must_use]
    pub fn engine_timeout(&self) -> Duration {
        Duration::from_secs(self.engine.timeout_seconds)
    }
}

/// Configuration manager for handling config files
pub struct ConfigManager {
    config_path: PathBuf,
}

impl ConfigManager {
    /// Create a new configuration manager with default path
    pub fn new() -> SmimeResult<Self> {
        let config_path = Self::default_config_path()?;
        Ok(Self { config_path })
    }

    /// Create a configuration manager with custom path
    pub fn with_path<P: AsRef<Path>>(path: P) -> Self {
        Self {
            config_path: path.as_ref().to_path_buf(),
        }
    }

    /// Get the default configuration file path
    pub fn default_config_path() -> SmimeResult<PathBuf> {
        if let Some(config_dir) = dirs::config_dir() {
            Ok(config_dir.join("smime-envelope").join("config.toml"))
        } else {
            Ok(PathBuf::from("smime-envelope-config.toml"))
        }
    }

    /// Load configuration from file, creating default if it doesn't exist
    pub fn load_or_create_default(&self) -> SmimeResult<EnvelopeConfiguration> {
        if self.config_path.exists() {
            self.load()
        } else {
            log::info!(
                "Configuration file not found, creating default: {}",
                self.config_path.display()
            );
            let default_config = EnvelopeConfiguration::default();
            self.save(&default_config)?;
            Ok(default_config)
        }
    }

    /// Load configuration from file, falling back to defaults when absent
    pub fn load_or_default(&self) -> SmimeResult<EnvelopeConfiguration> {
        if self.config_path.exists() {
            self.load()
        } else {
            Ok(EnvelopeConfiguration::default())
        }
    }

    /// Load configuration from file
    pub fn load(&self) -> SmimeResult<EnvelopeConfiguration> {
        log::info!("Loading configuration from: {}", self.config_path.display());

        let content = fs::read_to_string(&self.config_path).map_err(|e| {
            SmimeError::ConfigurationError(format!(
                "Failed to read config file {}: {}",
                self.config_path.display(),
                e
            ))
        })?;

        let config: EnvelopeConfiguration = toml::from_str(&content).map_err(|e| {
            SmimeError::ConfigurationError(format!("Failed to parse config file: {e}"))
        })?;

        Self::validate(&config)?;
        Ok(config)
    }

    /// Save configuration to file
    pub fn save(&self, config: &EnvelopeConfiguration) -> SmimeResult<()> {
        Self::validate(config)?;
        log::info!("Saving configuration to: {}", self.config_path.display());

        if let Some(parent) = self.config_path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                SmimeError::ConfigurationError(format!(
                    "Failed to create config directory {}: {}",
                    parent.display(),
                    e
                ))
            })?;
        }

        let content = toml::to_string_pretty(config).map_err(|e| {
            SmimeError::ConfigurationError(format!("Failed to serialize config: {e}"))
        })?;

        fs::write(&self.config_path, content).map_err(|e| {
            SmimeError::ConfigurationError(format!(
                "Failed to write config file {}: {}",
                self.config_path.display(),
                e
            ))
        })?;

        log::info!("Configuration saved successfully");
        Ok(())
    }

    /// Validate configuration values
    pub fn validate(config: &EnvelopeConfiguration) -> SmimeResult<()> {
        config.preferred_cipher().map_err(|_| {
            SmimeError::ConfigurationError(format!(
                "Invalid cipher: {}",
                config.cipher.preferred
            ))
        })?;

        if config.engine.timeout_seconds == 0 {
            return Err(SmimeError::ConfigurationError(
                "Engine timeout must be greater than 0".to_string(),
            ));
        }

        if config.engine.openssl_binary.trim().is_empty() {
            return Err(SmimeError::ConfigurationError(
                "OpenSSL binary must not be empty".to_string(),
            ));
        }

        if let Some(dir) = &config.scratch_dir {
            if dir.as_os_str().is_empty() {
                return Err(SmimeError::ConfigurationError(
                    "Scratch directory must not be empty".to_string(),
                ));
            }
        }

        Ok(())
    }

    /// Update a specific configuration value
    pub fn update_value(&self, key: &str, value: &str) -> SmimeResult<()> {
        let mut config = self.load_or_default()?;

        match key {
            "cipher.preferred" => {
                value.parse::<CipherChoice>().map_err(|_| {
                    SmimeError::ConfigurationError(format!("Invalid cipher: {value}"))
                })?;
                config.cipher.preferred = value.to_string();
            }
            "cipher.allow_legacy_fallback" => {
                config.cipher.allow_legacy_fallback = parse_bool(value)?;
            }
            "scratch_dir" => {
                config.scratch_dir = if value.is_empty() {
                    None
                } else {
                    Some(PathBuf::from(value))
                };
            }
            "engine.kind" => {
                config.engine.kind = match value {
                    "library" => EngineKind::Library,
                    "command" => EngineKind::Command,
                    _ => {
                        return Err(SmimeError::ConfigurationError(format!(
                            "Invalid engine kind: {value}"
                        )))
                    }
                };
            }
            "engine.openssl_binary" => {
                config.engine.openssl_binary = value.to_string();
            }
            "engine.timeout_seconds" => {
                config.engine.timeout_seconds = value.parse().map_err(|_| {
                    SmimeError::ConfigurationError(format!("Invalid timeout: {value}"))
                })?;
            }
            _ => {
                return Err(SmimeError::ConfigurationError(format!(
                    "Unknown configuration key: {key}"
                )));
            }
        }

        self.save(&config)
    }

    /// Get the configuration file path
    #[must_use]
    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    /// Export configuration as a portable format
    pub fn export_config(&self, format: ExportFormat) -> SmimeResult<String> {
        let config = self.load_or_default()?;

        match format {
            ExportFormat::Toml => toml::to_string_pretty(&config)
                .map_err(|e| SmimeError::ConfigurationError(format!("TOML export failed: {e}"))),
            ExportFormat::Json => serde_json::to_string_pretty(&config)
                .map_err(|e| SmimeError::ConfigurationError(format!("JSON export failed: {e}"))),
        }
    }
}

/// Configuration export formats
#[derive(Debug, Clone, Copy)]
pub enum ExportFormat {
    Toml,
    Json,
}

fn parse_bool(value: &str) -> SmimeResult<bool> {
    value
        .parse()
        .map_err(|_| SmimeError::ConfigurationError(format!("Invalid boolean value: {value}")))
}
