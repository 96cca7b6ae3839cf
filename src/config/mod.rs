mod store;
mod types;

pub use store::ConfigStore;
pub use types::*;

use anyhow::{Context, Result};
use std::path::Path;

/// Load configuration from a TOML file
pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {:?}", path))?;

    let config: Config = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {:?}", path))?;

    validate_config(&config)?;

    Ok(config)
}

/// Load config from default locations or return default config
pub fn load_config_or_default(custom_path: Option<&Path>) -> Result<Config> {
    if let Some(path) = custom_path {
        return load_config(path);
    }

    let default_paths = [
        "./config.toml",
        "./overseer.toml",
        "~/.config/overseer/config.toml",
        "/etc/overseer/config.toml",
    ];

    for path_str in default_paths {
        let path = shellexpand::tilde(path_str);
        let path = Path::new(path.as_ref());
        if path.exists() {
            return load_config(path);
        }
    }

    Ok(Config::default())
}

/// Validate configuration
pub fn validate_config(config: &Config) -> Result<()> {
    if config.tmdb.api_key.is_empty() {
        tracing::warn!("No TMDB API key configured; discovery requests will fail");
    }

    if config.plex.enabled && config.plex.url.is_empty() {
        anyhow::bail!("Plex is enabled but has no URL");
    }

    if config.emby.enabled && config.emby.url.is_empty() {
        anyhow::bail!("Emby is enabled but has no URL");
    }

    if config.reconcile.max_concurrent_probes == 0 {
        anyhow::bail!("reconcile.max_concurrent_probes must be at least 1");
    }

    if config.reconcile.max_concurrent_details == 0 {
        anyhow::bail!("reconcile.max_concurrent_details must be at least 1");
    }

    if config.reconcile.probe_timeout_secs == 0 {
        anyhow::bail!("reconcile.probe_timeout_secs must be at least 1");
    }

    Ok(())
}
