//! Runtime media-server settings.
//!
//! Availability probes read their settings from a [`ConfigStore`] at the
//! start of every batch, so settings changed at runtime take effect on the
//! next batch without rebuilding the engine.

use parking_lot::RwLock;

use super::{Config, EmbyConfig, PlexConfig};

/// Mutable media-server settings shared between probes and whoever edits
/// them.
///
/// Fields are behind [`RwLock`] so readers never block each other and writes
/// are short-lived.
#[derive(Debug, Default)]
pub struct ConfigStore {
    plex: RwLock<PlexConfig>,
    emby: RwLock<EmbyConfig>,
}

impl ConfigStore {
    pub fn new(config: &Config) -> Self {
        Self {
            plex: RwLock::new(config.plex.clone()),
            emby: RwLock::new(config.emby.clone()),
        }
    }

    /// Read a snapshot of the current Plex settings.
    pub fn plex(&self) -> PlexConfig {
        self.plex.read().clone()
    }

    pub fn set_plex(&self, plex: PlexConfig) {
        *self.plex.write() = plex;
    }

    /// Read a snapshot of the current Emby settings.
    pub fn emby(&self) -> EmbyConfig {
        self.emby.read().clone()
    }

    pub fn set_emby(&self, emby: EmbyConfig) {
        *self.emby.write() = emby;
    }
}
