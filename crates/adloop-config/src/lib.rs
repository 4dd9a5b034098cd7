//! Configuration for the AdLoop signage client.
//!
//! A flat TOML file plus `ADLOOP_*` environment overrides, and translation
//! to `adloop_core::ControllerConfig`. The binary layers its command-line
//! flags on top.

use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

use adloop_core::{ControllerConfig, DEFAULT_POLL_INTERVAL, IdentityConfig, PlayerCommand};

/// Environment variable prefix for overrides (`ADLOOP_API_BASE_URL`, ...).
pub const ENV_PREFIX: &str = "ADLOOP_";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config ─────────────────────────────────────────────────────

/// Top-level configuration file.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    /// Backend base address, e.g. `https://signage.example.com`. Empty means
    /// unset.
    pub api_base_url: String,

    pub heartbeat_interval_ms: u64,

    pub branch_check_interval_ms: u64,

    /// Per-request timeout.
    pub timeout_secs: u64,

    /// Explicit device identifier; skips platform and stored identities.
    pub device_id: Option<String>,

    /// Platform-native identifier file.
    pub platform_id_path: Option<PathBuf>,

    /// Where a generated identifier is stored. Defaults to the platform data
    /// directory.
    pub device_id_file: Option<PathBuf>,

    /// External player program.
    pub player_program: String,

    /// Arguments passed before the media URL.
    pub player_args: Vec<String>,

    /// Drive pause/resume over the player's IPC socket.
    pub player_ipc: bool,
}

impl Default for Config {
    fn default() -> Self {
        let identity = IdentityConfig::default();
        let player = PlayerCommand::default();
        Self {
            api_base_url: String::new(),
            heartbeat_interval_ms: millis(DEFAULT_POLL_INTERVAL),
            branch_check_interval_ms: millis(DEFAULT_POLL_INTERVAL),
            timeout_secs: 30,
            device_id: None,
            platform_id_path: identity.platform_id_path,
            device_id_file: None,
            player_program: player.program,
            player_args: player.args,
            player_ipc: player.ipc,
        }
    }
}

fn millis(d: Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}

impl Config {
    /// Validated base URL. `Ok(None)` when unset.
    pub fn base_url(&self) -> Result<Option<Url>, ConfigError> {
        let raw = self.api_base_url.trim().trim_end_matches('/');
        if raw.is_empty() {
            return Ok(None);
        }
        let url = Url::parse(raw).map_err(|e| ConfigError::Validation {
            field: "api_base_url".into(),
            reason: format!("{e}: {raw}"),
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ConfigError::Validation {
                field: "api_base_url".into(),
                reason: format!("expected an http(s) URL, got '{raw}'"),
            });
        }
        Ok(Some(url))
    }

    /// Translate to the core controller configuration.
    pub fn to_controller_config(&self) -> Result<ControllerConfig, ConfigError> {
        let base_url = self.base_url()?;

        Ok(ControllerConfig {
            base_url,
            heartbeat_interval: Duration::from_millis(non_zero(
                "heartbeat_interval_ms",
                self.heartbeat_interval_ms,
            )?),
            branch_check_interval: Duration::from_millis(non_zero(
                "branch_check_interval_ms",
                self.branch_check_interval_ms,
            )?),
            timeout: Duration::from_secs(non_zero("timeout_secs", self.timeout_secs)?),
            identity: IdentityConfig {
                device_id: self
                    .device_id
                    .as_deref()
                    .map(str::trim)
                    .filter(|id| !id.is_empty())
                    .map(ToOwned::to_owned),
                platform_id_path: self.platform_id_path.clone(),
                store_path: self.device_id_file.clone().or_else(default_device_id_file),
            },
            player: PlayerCommand {
                program: self.player_program.clone(),
                args: self.player_args.clone(),
                ipc: self.player_ipc,
            },
        })
    }
}

fn non_zero(field: &str, value: u64) -> Result<u64, ConfigError> {
    if value == 0 {
        return Err(ConfigError::Validation {
            field: field.into(),
            reason: "must be greater than zero".into(),
        });
    }
    Ok(value)
}

// ── Paths ───────────────────────────────────────────────────────────

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("com", "adloop", "adloop")
}

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    project_dirs().map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

/// Default location of the generated device identifier.
pub fn default_device_id_file() -> Option<PathBuf> {
    project_dirs().map(|dirs| dirs.data_local_dir().join("device_id"))
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("adloop");
    p
}

// ── Loading ─────────────────────────────────────────────────────────

/// Load the config from the canonical file + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load the config from `path` + environment. A missing file is not an
/// error; defaults apply.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let config: Config = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed(ENV_PREFIX))
        .extract()?;
    Ok(config)
}

// ── Saving ──────────────────────────────────────────────────────────

/// Serialize config to TOML and write to the canonical config path.
pub fn save_config(cfg: &Config) -> Result<PathBuf, ConfigError> {
    let path = config_path();
    save_config_to(cfg, &path)?;
    Ok(path)
}

pub fn save_config_to(cfg: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn defaults_translate() {
        let cfg = Config::default().to_controller_config().unwrap();

        assert_eq!(cfg.base_url, None);
        assert_eq!(cfg.heartbeat_interval, Duration::from_millis(10_000));
        assert_eq!(cfg.branch_check_interval, Duration::from_millis(10_000));
        assert_eq!(cfg.timeout, Duration::from_secs(30));
        assert_eq!(cfg.player.program, "mpv");
    }

    #[test]
    fn file_values_override_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
api_base_url = "https://signage.example.com/"
heartbeat_interval_ms = 30000
device_id = "lobby-tv"
player_args = ["--fs"]
"#,
        )
        .unwrap();

        let cfg = load_config_from(&path).unwrap();

        assert_eq!(cfg.heartbeat_interval_ms, 30_000);
        assert_eq!(cfg.branch_check_interval_ms, 10_000);
        assert_eq!(cfg.player_args, vec!["--fs"]);

        let controller = cfg.to_controller_config().unwrap();
        assert_eq!(
            controller.base_url.map(String::from).as_deref(),
            Some("https://signage.example.com/")
        );
        assert_eq!(controller.identity.device_id.as_deref(), Some("lobby-tv"));
    }

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = load_config_from(&dir.path().join("absent.toml")).unwrap();

        assert_eq!(cfg.timeout_secs, Config::default().timeout_secs);
    }

    #[test]
    fn zero_interval_is_rejected() {
        let cfg = Config {
            branch_check_interval_ms: 0,
            ..Config::default()
        };

        let err = cfg.to_controller_config().unwrap_err();
        assert!(
            matches!(&err, ConfigError::Validation { field, .. } if field == "branch_check_interval_ms"),
            "got {err:?}"
        );
    }

    #[test]
    fn bad_base_url_is_rejected() {
        for raw in ["not a url", "ftp://signage.example.com"] {
            let cfg = Config {
                api_base_url: raw.into(),
                ..Config::default()
            };
            assert!(cfg.base_url().is_err(), "{raw} should be rejected");
        }
    }

    #[test]
    fn blank_device_id_is_ignored() {
        let cfg = Config {
            device_id: Some("   ".into()),
            ..Config::default()
        };

        assert_eq!(cfg.to_controller_config().unwrap().identity.device_id, None);
    }

    #[test]
    fn saved_config_loads_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        let cfg = Config {
            api_base_url: "http://10.0.0.5:8000".into(),
            device_id_file: Some(dir.path().join("device_id")),
            ..Config::default()
        };

        save_config_to(&cfg, &path).unwrap();

        assert_eq!(load_config_from(&path).unwrap(), cfg);
    }
}
