//! Configuration loading and credential resolution
//!
//! Config file location priority:
//! 1. Command-line argument (highest priority)
//! 2. `DVT_CONFIG` environment variable
//! 3. `~/.config/dvt/config.toml`
//! 4. Built-in defaults (no file)
//!
//! A missing or malformed config file never stops startup: a warning is
//! logged and the built-in defaults apply.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::{Error, Result};

/// Environment variable naming the config file
pub const CONFIG_ENV_VAR: &str = "DVT_CONFIG";
/// Environment override for `[backend] url`
pub const BACKEND_URL_ENV_VAR: &str = "DVT_BACKEND_URL";
/// Environment override for `[backend] anon_key`
pub const BACKEND_KEY_ENV_VAR: &str = "DVT_BACKEND_ANON_KEY";
/// Environment override for `admin_key`
pub const ADMIN_KEY_ENV_VAR: &str = "DVT_ADMIN_KEY";

pub const DEFAULT_SURVEY_PORT: u16 = 5740;
pub const DEFAULT_ADMIN_PORT: u16 = 5741;

/// Bootstrap configuration loaded from TOML
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TomlConfig {
    /// Hosted table store connection
    #[serde(default)]
    pub backend: BackendSection,

    /// Shared secret unlocking the export panel
    #[serde(default)]
    pub admin_key: Option<String>,

    /// Drop catalog JSON; the bundled catalog is used when absent
    #[serde(default)]
    pub catalog_path: Option<PathBuf>,

    #[serde(default)]
    pub survey: ServiceSection,

    #[serde(default)]
    pub admin: ServiceSection,

    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct BackendSection {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub anon_key: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ServiceSection {
    #[serde(default)]
    pub port: Option<u16>,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

impl TomlConfig {
    /// Load configuration, falling back to defaults on any problem
    pub fn load(cli_arg: Option<&Path>) -> Self {
        let (config, origin) = Self::load_with_origin(cli_arg);
        origin.log();
        config
    }

    /// Like `load`, but reports where the values came from instead of logging
    ///
    /// Binaries use this to read `[logging] level` before the subscriber
    /// exists, then log the origin once tracing is up.
    pub fn load_with_origin(cli_arg: Option<&Path>) -> (Self, ConfigOrigin) {
        let Some(path) = resolve_config_path(cli_arg) else {
            return (Self::default(), ConfigOrigin::Defaults);
        };

        match Self::load_from_path(&path) {
            Ok(config) => (config, ConfigOrigin::File(path)),
            Err(e) => (
                Self::default(),
                ConfigOrigin::Ignored {
                    path,
                    reason: e.to_string(),
                },
            ),
        }
    }

    /// Strictly parse one config file
    pub fn load_from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content)
            .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))
    }

    pub fn survey_port(&self) -> u16 {
        self.survey.port.unwrap_or(DEFAULT_SURVEY_PORT)
    }

    pub fn admin_port(&self) -> u16 {
        self.admin.port.unwrap_or(DEFAULT_ADMIN_PORT)
    }
}

/// Where the effective configuration came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigOrigin {
    Defaults,
    File(PathBuf),
    /// File found but unreadable or malformed; defaults used
    Ignored { path: PathBuf, reason: String },
}

impl ConfigOrigin {
    pub fn log(&self) {
        match self {
            ConfigOrigin::Defaults => info!("No config file found, using built-in defaults"),
            ConfigOrigin::File(path) => info!("Loaded config from {}", path.display()),
            ConfigOrigin::Ignored { path, reason } => {
                warn!("Ignoring config file {}: {}", path.display(), reason)
            }
        }
    }
}

/// Pick the config file to read, if any
pub fn resolve_config_path(cli_arg: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = cli_arg {
        return Some(path.to_path_buf());
    }

    if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
        if !path.trim().is_empty() {
            return Some(PathBuf::from(path));
        }
    }

    default_config_path().filter(|p| p.exists())
}

/// Per-user default config location
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("dvt").join("config.toml"))
}

/// Credentials for the hosted table store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendCredentials {
    pub url: String,
    pub anon_key: String,
}

/// Resolve backend credentials (environment overrides TOML)
///
/// Returns `None` when either value is missing or blank. That is the
/// unconfigured mode: writes become no-ops and reads return nothing.
pub fn resolve_backend_credentials(config: &TomlConfig) -> Option<BackendCredentials> {
    let url = env_or(BACKEND_URL_ENV_VAR, config.backend.url.as_deref());
    let anon_key = env_or(BACKEND_KEY_ENV_VAR, config.backend.anon_key.as_deref());

    match (url, anon_key) {
        (Some(url), Some(anon_key)) => {
            info!("Backend configured at {}", url);
            Some(BackendCredentials {
                url: url.trim_end_matches('/').to_string(),
                anon_key,
            })
        }
        _ => {
            warn!(
                "Backend not configured ({} / {} missing) - records will not be saved",
                BACKEND_URL_ENV_VAR, BACKEND_KEY_ENV_VAR
            );
            None
        }
    }
}

/// Resolve the admin shared secret (environment overrides TOML)
pub fn resolve_admin_key(config: &TomlConfig) -> Option<String> {
    let key = env_or(ADMIN_KEY_ENV_VAR, config.admin_key.as_deref());
    if key.is_none() {
        warn!("Admin key not configured - export panel will stay locked");
    }
    key
}

fn env_or(var: &str, fallback: Option<&str>) -> Option<String> {
    std::env::var(var)
        .ok()
        .filter(|v| is_present(v))
        .or_else(|| fallback.filter(|v| is_present(v)).map(str::to_string))
}

fn is_present(value: &str) -> bool {
    !value.trim().is_empty()
}
