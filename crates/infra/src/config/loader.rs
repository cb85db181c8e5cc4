//! Configuration loader
//!
//! Loads the MDR environment configuration from environment variables or
//! files.
//!
//! ## Loading Strategy
//! 1. First, attempts to load from environment variables
//! 2. If incomplete, falls back to loading from file
//! 3. Probes multiple paths for config files
//! 4. Supports JSON and TOML formats
//!
//! ## Environment Variables
//! Required:
//! - `MDR_URL`: API root, e.g. `https://mdr.example.com`
//! - `MDR_LOGIN`, `MDR_PASSWORD`, `MDR_CLIENT_ID`: default account
//! - `UIS_URL`, `UIS_CLIENT_ID`, `UIS_CLIENT_SECRET`: identity provider
//!
//! Optional:
//! - `MDR_API_PREFIX` (default `api/v1`)
//! - `MDR_TIMEOUT_SECONDS` (default 30)
//! - `MDR_TRANSPORT_ATTEMPTS` (default 1)
//! - `MDR_SESSION_ROLE` (default `SUPERVISOR`)
//! - `MDR_REFRESH_THRESHOLD_SECONDS` (default 60)
//! - `MDR_ORG_DELETE_ATTEMPTS` (default 20)
//! - `MDR_ORG_DELETE_DELAY_MS` (default 6000)
//!
//! ## File Locations
//! The loader probes `mdrkit.{json,toml}` and `config.{json,toml}` in:
//! 1. The current working directory
//! 2. Its parent and grandparent
//! 3. The executable's directory and its parents

use std::path::{Path, PathBuf};
use std::str::FromStr;

use mdrkit_domain::constants::{
    DEFAULT_API_PREFIX, DEFAULT_REFRESH_THRESHOLD_SECONDS, DEFAULT_TIMEOUT_SECONDS,
    DEFAULT_TRANSPORT_ATTEMPTS, ORGANIZATION_DELETE_ATTEMPTS, ORGANIZATION_DELETE_DELAY_MS,
};
use mdrkit_domain::{
    AccountSettings, ApiSettings, IdentitySettings, MdrConfig, MdrError, Result, RetrySettings,
    Role, Secret, SessionSettings,
};

const CONFIG_FILE_NAMES: [&str; 4] = ["mdrkit.json", "mdrkit.toml", "config.json", "config.toml"];

/// Load configuration with automatic fallback strategy
///
/// First attempts to load from environment variables. If any required
/// variables are missing, falls back to loading from a config file.
///
/// # Errors
/// Returns `MdrError::Config` if:
/// - Configuration cannot be loaded from either source
/// - File format is invalid
/// - Required fields are missing
pub fn load() -> Result<MdrConfig> {
    match load_from_env() {
        Ok(config) => {
            tracing::info!("Configuration loaded from environment variables");
            Ok(config)
        }
        Err(e) => {
            tracing::debug!(error = %e, "Failed to load from environment, trying file");
            load_from_file(None)
        }
    }
}

/// Load configuration from environment variables
///
/// # Errors
/// Returns `MdrError::Config` if required variables are missing or
/// optional ones have invalid values.
pub fn load_from_env() -> Result<MdrConfig> {
    let api = ApiSettings {
        url: env_var("MDR_URL")?,
        prefix: env_or("MDR_API_PREFIX", DEFAULT_API_PREFIX.to_string())?,
        timeout_seconds: env_or("MDR_TIMEOUT_SECONDS", DEFAULT_TIMEOUT_SECONDS)?,
        transport_attempts: env_or("MDR_TRANSPORT_ATTEMPTS", DEFAULT_TRANSPORT_ATTEMPTS)?,
    };

    let identity = IdentitySettings {
        url: env_var("UIS_URL")?,
        client_id: env_var("UIS_CLIENT_ID")?,
        client_secret: Secret::new(env_var("UIS_CLIENT_SECRET")?),
    };

    let account = AccountSettings {
        login: env_var("MDR_LOGIN")?,
        password: Secret::new(env_var("MDR_PASSWORD")?),
        client_id: env_var("MDR_CLIENT_ID")?,
    };

    let session = SessionSettings {
        role: std::env::var("MDR_SESSION_ROLE").map(Role::new).unwrap_or_default(),
        refresh_threshold_seconds: env_or(
            "MDR_REFRESH_THRESHOLD_SECONDS",
            DEFAULT_REFRESH_THRESHOLD_SECONDS,
        )?,
    };

    let retry = RetrySettings {
        organization_delete_attempts: env_or(
            "MDR_ORG_DELETE_ATTEMPTS",
            ORGANIZATION_DELETE_ATTEMPTS,
        )?,
        organization_delete_delay_ms: env_or(
            "MDR_ORG_DELETE_DELAY_MS",
            ORGANIZATION_DELETE_DELAY_MS,
        )?,
    };

    Ok(MdrConfig { api, identity, account, session, retry })
}

/// Load configuration from a file
///
/// If `path` is `None`, probes multiple locations for config files.
/// Supports both JSON and TOML formats (detected by file extension).
///
/// # Errors
/// Returns `MdrError::Config` if:
/// - File not found (when path is specified)
/// - No config file found (when path is `None`)
/// - File format is invalid
/// - Required fields are missing
pub fn load_from_file(path: Option<PathBuf>) -> Result<MdrConfig> {
    let config_path = match path {
        Some(p) => {
            if !p.exists() {
                return Err(MdrError::Config(format!("Config file not found: {}", p.display())));
            }
            p
        }
        None => probe_config_paths().ok_or_else(|| {
            MdrError::Config("No config file found in any of the standard locations".to_string())
        })?,
    };

    tracing::info!(path = %config_path.display(), "Loading configuration from file");

    let contents = std::fs::read_to_string(&config_path)
        .map_err(|e| MdrError::Config(format!("Failed to read config file: {e}")))?;

    parse_config(&contents, &config_path)
}

/// Parse configuration, picking the format from the extension of `path`.
///
/// # Errors
/// Returns `MdrError::Config` if format is invalid or parsing fails.
pub fn parse_config(contents: &str, path: &Path) -> Result<MdrConfig> {
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("json");

    match extension {
        "toml" => toml::from_str(contents)
            .map_err(|e| MdrError::Config(format!("Invalid TOML format: {e}"))),
        "json" => serde_json::from_str(contents)
            .map_err(|e| MdrError::Config(format!("Invalid JSON format: {e}"))),
        _ => Err(MdrError::Config(format!("Unsupported config format: {extension}"))),
    }
}

/// Probe the standard locations for a configuration file
///
/// # Returns
/// The first config file found, or `None` if no file exists.
pub fn probe_config_paths() -> Option<PathBuf> {
    let mut roots = Vec::new();

    if let Ok(cwd) = std::env::current_dir() {
        roots.extend(cwd.ancestors().take(3).map(Path::to_path_buf));
    }

    if let Ok(exe_path) = std::env::current_exe() {
        if let Some(exe_dir) = exe_path.parent() {
            roots.extend(exe_dir.ancestors().take(3).map(Path::to_path_buf));
        }
    }

    probe_in(&roots)
}

fn probe_in(roots: &[PathBuf]) -> Option<PathBuf> {
    roots
        .iter()
        .flat_map(|root| CONFIG_FILE_NAMES.iter().map(move |name| root.join(name)))
        .find(|path| path.is_file())
}

/// Get required environment variable
///
/// # Errors
/// Returns `MdrError::Config` if the variable is not set.
fn env_var(key: &str) -> Result<String> {
    std::env::var(key)
        .map_err(|_| MdrError::Config(format!("Missing required environment variable: {key}")))
}

/// Parse an optional environment variable, falling back to `default`.
///
/// # Errors
/// Returns `MdrError::Config` if the variable is set but does not parse.
fn env_or<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|e| MdrError::Config(format!("Invalid value for {key}: {e}"))),
        Err(_) => Ok(default),
    }
}
