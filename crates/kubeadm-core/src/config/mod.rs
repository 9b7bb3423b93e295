//! Configuration loading and management
//!
//! # Hierarchy
//!
//! Settings are loaded in this order (later overrides earlier):
//! 1. Built-in defaults
//! 2. Settings file: `$KUBEADM_SETTINGS`, else `<config dir>/kubeadm/settings.toml`
//! 3. Environment variables: `KUBEADM_*`
//! 4. CLI flags (command-specific)
//!
//! # Example Settings
//!
//! ```toml
//! log_level = "info"
//! kubernetes_version = "v1.8.2"
//! cert_dir = "/etc/kubernetes/pki"
//! ```

mod master;

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

pub use master::{
    parse_duration, Api, MasterConfiguration, Networking, DEFAULT_BIND_PORT, DEFAULT_DNS_DOMAIN,
    DEFAULT_SERVICE_SUBNET, DEFAULT_TOKEN_TTL,
};

use crate::{Error, Result};

pub const DEFAULT_LOG_LEVEL: &str = "warn";
pub const DEFAULT_KUBERNETES_VERSION: &str = "stable-1.8";
pub const DEFAULT_CERT_DIR: &str = "/etc/kubernetes/pki";
pub const DEFAULT_KUBECONFIG_DIR: &str = "/etc/kubernetes";
pub const DEFAULT_MANIFESTS_DIR: &str = "/etc/kubernetes/manifests";

/// Environment variable naming an explicit settings file.
pub const SETTINGS_ENV: &str = "KUBEADM_SETTINGS";

/// Process-level settings shared by every command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub log_level: String,
    pub kubernetes_version: String,
    pub cert_dir: PathBuf,
    pub kubeconfig_dir: PathBuf,
    pub manifests_dir: PathBuf,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            log_level: DEFAULT_LOG_LEVEL.to_string(),
            kubernetes_version: DEFAULT_KUBERNETES_VERSION.to_string(),
            cert_dir: PathBuf::from(DEFAULT_CERT_DIR),
            kubeconfig_dir: PathBuf::from(DEFAULT_KUBECONFIG_DIR),
            manifests_dir: PathBuf::from(DEFAULT_MANIFESTS_DIR),
        }
    }
}

impl Settings {
    /// Apply `KUBEADM_*` overrides read through `lookup`.
    pub fn apply_env_vars<F>(self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        Self {
            log_level: lookup("KUBEADM_LOG_LEVEL").unwrap_or(self.log_level),
            kubernetes_version: lookup("KUBEADM_KUBERNETES_VERSION")
                .unwrap_or(self.kubernetes_version),
            cert_dir: lookup("KUBEADM_CERT_DIR").map_or(self.cert_dir, PathBuf::from),
            kubeconfig_dir: lookup("KUBEADM_KUBECONFIG_DIR")
                .map_or(self.kubeconfig_dir, PathBuf::from),
            manifests_dir: lookup("KUBEADM_MANIFESTS_DIR")
                .map_or(self.manifests_dir, PathBuf::from),
        }
    }

    /// # Errors
    ///
    /// Returns error if a value is empty or a directory is not absolute.
    pub fn validate(&self) -> Result<()> {
        if self.log_level.trim().is_empty() {
            return Err(Error::invalid_config("log_level must not be empty"));
        }
        if self.kubernetes_version.trim().is_empty() {
            return Err(Error::invalid_config("kubernetes_version must not be empty"));
        }
        [
            ("cert_dir", &self.cert_dir),
            ("kubeconfig_dir", &self.kubeconfig_dir),
            ("manifests_dir", &self.manifests_dir),
        ]
        .into_iter()
        .try_for_each(|(key, dir)| {
            if dir.is_absolute() {
                Ok(())
            } else {
                Err(Error::invalid_config(format!(
                    "{key} must be an absolute path, got {}",
                    dir.display()
                )))
            }
        })
    }
}

/// Load settings from all sources using the process environment.
///
/// # Errors
///
/// Returns error if:
/// - `$KUBEADM_SETTINGS` names a file that does not exist
/// - A settings file is malformed TOML
/// - Settings fail validation
pub fn load_settings() -> Result<Settings> {
    let explicit = std::env::var_os(SETTINGS_ENV).map(PathBuf::from);
    load_settings_from(
        explicit.as_deref(),
        default_settings_path(),
        |key| std::env::var(key).ok(),
    )
}

/// Load settings from an optional explicit file, an optional default
/// file, and an environment lookup.
///
/// # Errors
///
/// See [`load_settings`].
pub fn load_settings_from<F>(
    explicit: Option<&Path>,
    default_path: Option<PathBuf>,
    lookup: F,
) -> Result<Settings>
where
    F: Fn(&str) -> Option<String>,
{
    let settings = match explicit {
        Some(path) if !path.exists() => {
            return Err(Error::not_found(format!(
                "settings file {} (from ${SETTINGS_ENV})",
                path.display()
            )));
        }
        Some(path) => load_toml_file(path)?,
        None => match default_path {
            Some(path) if path.is_file() => load_toml_file(&path)?,
            _ => Settings::default(),
        },
    };

    let settings = settings.apply_env_vars(lookup);
    settings.validate()?;
    tracing::debug!(?settings, "loaded settings");
    Ok(settings)
}

/// Get path to the per-user settings file
pub fn default_settings_path() -> Option<PathBuf> {
    directories::ProjectDirs::from("io", "k8s", "kubeadm")
        .map(|dirs| dirs.config_dir().join("settings.toml"))
}

/// Load a TOML settings file; missing keys take their defaults.
///
/// # Errors
///
/// Returns error if the file cannot be read or is malformed TOML.
pub fn load_toml_file(path: &Path) -> Result<Settings> {
    if path.is_dir() {
        return Err(Error::io_error(format!(
            "settings path is a directory, not a file: {}",
            path.display()
        )));
    }
    let content = std::fs::read_to_string(path).map_err(|e| {
        Error::io_error(format!(
            "failed to read settings file {}: {e}",
            path.display()
        ))
    })?;
    toml::from_str(&content)
        .map_err(|e| Error::parse_error(format!("settings file {}", path.display()), e))
}
