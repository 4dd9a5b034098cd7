//! CLI-aware configuration: file + environment, then command-line flags.

use std::path::PathBuf;

use adloop_api::{SignageClient, TransportConfig};
use adloop_config::Config;
use adloop_core::{ControllerConfig, IdentityProvider, ResolvedIdentity};

use crate::cli::GlobalOpts;
use crate::error::CliError;

/// Config file in effect: `--config`, else the platform default.
pub fn config_path(global: &GlobalOpts) -> PathBuf {
    global
        .config
        .clone()
        .unwrap_or_else(adloop_config::config_path)
}

/// Load the config file and apply flag overrides.
pub fn load(global: &GlobalOpts) -> Result<Config, CliError> {
    let mut cfg = adloop_config::load_config_from(&config_path(global))?;
    apply_overrides(&mut cfg, global);
    Ok(cfg)
}

pub fn apply_overrides(cfg: &mut Config, global: &GlobalOpts) {
    if let Some(url) = &global.api_url {
        cfg.api_base_url.clone_from(url);
    }
    if let Some(id) = &global.device_id {
        cfg.device_id = Some(id.clone());
    }
    if let Some(timeout) = global.timeout {
        cfg.timeout_secs = timeout;
    }
}

/// Controller configuration with a backend URL required.
pub fn controller_config(global: &GlobalOpts) -> Result<ControllerConfig, CliError> {
    let cfg = load(global)?.to_controller_config()?;
    if cfg.base_url.is_none() {
        return Err(CliError::NoApiUrl {
            path: config_path(global).display().to_string(),
        });
    }
    Ok(cfg)
}

/// One-shot client plus this display's identity.
pub fn client(global: &GlobalOpts) -> Result<(SignageClient, ResolvedIdentity), CliError> {
    let cfg = controller_config(global)?;
    let transport = TransportConfig::default().with_timeout(cfg.timeout);
    let client = SignageClient::new(cfg.base_url.clone(), &transport)?;
    let identity = IdentityProvider::new(cfg.identity).resolve();
    Ok((client, identity))
}

/// Identity only; needs no backend URL.
pub fn identity(global: &GlobalOpts) -> Result<ResolvedIdentity, CliError> {
    let cfg = load(global)?.to_controller_config()?;
    Ok(IdentityProvider::new(cfg.identity).resolve())
}
