//! Shared configuration for getAir tools.
//!
//! Profiles live in a TOML file under the platform config directory,
//! with `GETAIR_*` environment overrides layered on top. Passwords
//! resolve in order: inline profile value, `GETAIR_PASSWORD`, OS
//! keyring. A validated profile translates into the [`Credentials`]
//! and coordinator settings the other crates consume.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use figment::Figment;
use figment::providers::{Env, Format, Toml};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

use getair_api::{Credentials, DEFAULT_CLIENT_ID};
use getair_core::CoordinatorConfig;
use getair_core::entity::EnabledZones;

/// Valid polling interval bounds, in seconds.
pub const MIN_POLLING_INTERVAL_SECS: u64 = 10;
pub const MAX_POLLING_INTERVAL_SECS: u64 = 3600;
pub const DEFAULT_POLLING_INTERVAL_SECS: u64 = 60;

const KEYRING_SERVICE: &str = "getair";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not determine a config directory for this platform")]
    NoConfigDir,

    #[error("could not read config: {0}")]
    Read(#[from] figment::Error),

    #[error("could not write config {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("could not serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("profile '{0}' not found")]
    UnknownProfile(String),

    #[error("invalid value for {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error(
        "no password for profile '{profile}': set it in the config file, \
         the GETAIR_PASSWORD environment variable, or the OS keyring"
    )]
    MissingPassword { profile: String },

    #[error("keyring error: {0}")]
    Keyring(#[from] keyring::Error),
}

/// Top-level config file: named profiles plus a default selection.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_profile: Option<String>,
    #[serde(default)]
    pub profiles: BTreeMap<String, Profile>,
}

/// One account + device combination.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Profile {
    pub auth_url: Url,
    pub api_url: Url,
    #[serde(default = "default_client_id")]
    pub client_id: String,
    /// Device id as printed on the unit; normalized before use.
    pub device_id: String,
    pub username: String,
    /// Inline password. Prefer the keyring or `GETAIR_PASSWORD`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(default = "default_polling_interval")]
    pub polling_interval_secs: u64,
    #[serde(default = "default_true")]
    pub enable_zone_1: bool,
    #[serde(default = "default_true")]
    pub enable_zone_2: bool,
    #[serde(default = "default_true")]
    pub enable_zone_3: bool,
}

fn default_client_id() -> String {
    DEFAULT_CLIENT_ID.to_owned()
}

fn default_polling_interval() -> u64 {
    DEFAULT_POLLING_INTERVAL_SECS
}

fn default_true() -> bool {
    true
}

// ── Loading and saving ───────────────────────────────────────────────

/// Path of the config file: `<config_dir>/getair/config.toml`.
pub fn config_path() -> Result<PathBuf, ConfigError> {
    directories::ProjectDirs::from("", "", "getair")
        .map(|dirs| dirs.config_dir().join("config.toml"))
        .ok_or(ConfigError::NoConfigDir)
}

/// Persistent data directory for runtime state (credentials file).
pub fn storage_dir() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", "getair").map(|dirs| dirs.data_dir().to_path_buf())
}

/// Load the config from `path` with `GETAIR_*` env overrides. A
/// missing file yields the defaults, still with overrides applied.
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    Figment::new()
        .merge(Toml::file(path))
        .merge(Env::prefixed("GETAIR_").split("__"))
        .extract()
        .map_err(Into::into)
}

/// Load from the default location.
pub fn load_config_or_default() -> Result<Config, ConfigError> {
    load_config(&config_path()?)
}

/// Write the config file, creating parent directories.
pub fn save_config(config: &Config, path: &Path) -> Result<(), ConfigError> {
    let body = toml::to_string_pretty(config)?;
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|source| ConfigError::Write {
            path: path.to_path_buf(),
            source,
        })?;
    }
    std::fs::write(path, body).map_err(|source| ConfigError::Write {
        path: path.to_path_buf(),
        source,
    })
}

impl Config {
    pub fn profile(&self, name: &str) -> Result<&Profile, ConfigError> {
        self.profiles
            .get(name)
            .ok_or_else(|| ConfigError::UnknownProfile(name.to_owned()))
    }

    /// Active profile name: explicit override, configured default,
    /// then `"default"`.
    pub fn active_profile_name(&self, override_name: Option<&str>) -> String {
        override_name
            .map(ToOwned::to_owned)
            .or_else(|| self.default_profile.clone())
            .unwrap_or_else(|| "default".to_owned())
    }
}

// ── Profile resolution ───────────────────────────────────────────────

impl Profile {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(MIN_POLLING_INTERVAL_SECS..=MAX_POLLING_INTERVAL_SECS)
            .contains(&self.polling_interval_secs)
        {
            return Err(ConfigError::Validation {
                field: "polling_interval_secs".into(),
                reason: format!(
                    "expected {MIN_POLLING_INTERVAL_SECS}-{MAX_POLLING_INTERVAL_SECS}, got {}",
                    self.polling_interval_secs
                ),
            });
        }
        if self.normalized_device_id().is_empty() {
            return Err(ConfigError::Validation {
                field: "device_id".into(),
                reason: "must not be empty".into(),
            });
        }
        Ok(())
    }

    /// Device id as the cloud expects it: uppercase, colons stripped.
    pub fn normalized_device_id(&self) -> String {
        self.device_id.to_uppercase().replace(':', "")
    }

    pub fn polling_interval(&self) -> Duration {
        Duration::from_secs(self.polling_interval_secs)
    }

    pub fn enabled_zones(&self) -> EnabledZones {
        EnabledZones {
            zone_1: self.enable_zone_1,
            zone_2: self.enable_zone_2,
            zone_3: self.enable_zone_3,
        }
    }

    pub fn coordinator_config(&self) -> CoordinatorConfig {
        CoordinatorConfig {
            device_id: self.normalized_device_id(),
            polling_interval: self.polling_interval(),
        }
    }
}

/// Resolve the password: inline value, `GETAIR_PASSWORD`, OS keyring.
pub fn resolve_password(profile: &Profile, profile_name: &str) -> Result<SecretString, ConfigError> {
    if let Some(inline) = &profile.password {
        if !inline.is_empty() {
            return Ok(SecretString::from(inline.clone()));
        }
    }
    if let Ok(env) = std::env::var("GETAIR_PASSWORD") {
        if !env.is_empty() {
            return Ok(SecretString::from(env));
        }
    }
    match keyring::Entry::new(KEYRING_SERVICE, profile_name)?.get_password() {
        Ok(password) => Ok(SecretString::from(password)),
        Err(keyring::Error::NoEntry) => Err(ConfigError::MissingPassword {
            profile: profile_name.to_owned(),
        }),
        Err(e) => Err(ConfigError::Keyring(e)),
    }
}

/// Store a password in the OS keyring for later resolution.
pub fn store_password(profile_name: &str, password: &str) -> Result<(), ConfigError> {
    keyring::Entry::new(KEYRING_SERVICE, profile_name)?
        .set_password(password)
        .map_err(Into::into)
}

/// Build the cloud credentials for a validated profile.
pub fn credentials(profile: &Profile, profile_name: &str) -> Result<Credentials, ConfigError> {
    profile.validate()?;
    let password = resolve_password(profile, profile_name)?;
    Ok(Credentials {
        auth_url: profile.auth_url.clone(),
        api_url: profile.api_url.clone(),
        client_id: profile.client_id.clone(),
        username: profile.username.clone(),
        password,
    })
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use pretty_assertions::assert_eq;

    use super::*;

    fn profile_toml(extra: &str) -> String {
        format!(
            r#"
            default_profile = "home"

            [profiles.home]
            auth_url = "https://auth.example/oauth/token"
            api_url = "https://api.example/"
            device_id = "aa:bb:cc:dd:ee:ff"
            username = "user@example.com"
            {extra}
            "#
        )
    }

    fn parse(extra: &str) -> Config {
        Figment::new()
            .merge(Toml::string(&profile_toml(extra)))
            .extract()
            .unwrap()
    }

    #[test]
    fn profile_parses_with_defaults() {
        let config = parse("");
        let profile = config.profile("home").unwrap();

        assert_eq!(profile.client_id, DEFAULT_CLIENT_ID);
        assert_eq!(profile.polling_interval_secs, 60);
        assert!(profile.enable_zone_1 && profile.enable_zone_2 && profile.enable_zone_3);
        assert_eq!(config.active_profile_name(None), "home");
        assert_eq!(config.active_profile_name(Some("other")), "other");
    }

    #[test]
    fn device_id_is_normalized() {
        let config = parse("");
        let profile = config.profile("home").unwrap();
        assert_eq!(profile.normalized_device_id(), "AABBCCDDEEFF");
    }

    #[test]
    fn polling_interval_bounds_are_enforced() {
        let config = parse("polling_interval_secs = 5");
        assert!(matches!(
            config.profile("home").unwrap().validate(),
            Err(ConfigError::Validation { ref field, .. }) if field == "polling_interval_secs"
        ));

        let config = parse("polling_interval_secs = 4000");
        assert!(config.profile("home").unwrap().validate().is_err());

        let config = parse("polling_interval_secs = 600");
        config.profile("home").unwrap().validate().unwrap();
    }

    #[test]
    fn zone_enable_flags_map_through() {
        let config = parse("enable_zone_2 = false");
        let zones = config.profile("home").unwrap().enabled_zones();
        assert!(zones.zone_1);
        assert!(!zones.zone_2);
        assert!(zones.zone_3);
    }

    #[test]
    fn inline_password_wins_resolution() {
        let config = parse(r#"password = "hunter2""#);
        let profile = config.profile("home").unwrap();
        let secret = resolve_password(profile, "home").unwrap();
        use secrecy::ExposeSecret;
        assert_eq!(secret.expose_secret(), "hunter2");
    }

    #[test]
    fn unknown_profile_is_an_error() {
        let config = parse("");
        assert!(matches!(
            config.profile("missing"),
            Err(ConfigError::UnknownProfile(_))
        ));
    }

    #[test]
    fn save_and_reload_round_trips() {
        let config = parse("polling_interval_secs = 120");
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");

        save_config(&config, &path).unwrap();
        let reloaded = load_config(&path).unwrap();

        assert_eq!(
            reloaded.profile("home").unwrap().polling_interval_secs,
            120
        );
        assert_eq!(reloaded.default_profile.as_deref(), Some("home"));
    }
}
