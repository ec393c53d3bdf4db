//! Process-wide authorization settings.
//!
//! Stored as a JSON file next to the ledgers. Loaded once at startup and
//! saved immediately after every change.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use warden_common::{CommunityId, MemberId};

/// Owner value written until someone configures a real owner.
pub const OWNER_PLACEHOLDER: &str = "<please enter your member ID>";

/// Settings errors.
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("Failed to write settings file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to serialize settings: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Owner identity and the community allow-list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    #[serde(rename = "bot owner")]
    pub owner: MemberId,
    #[serde(rename = "authorized servers")]
    pub authorized_servers: Vec<CommunityId>,
    #[serde(rename = "server authorization")]
    pub server_authorization: bool,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            owner: MemberId::new(OWNER_PLACEHOLDER),
            authorized_servers: Vec::new(),
            server_authorization: false,
        }
    }
}

impl AuthConfig {
    /// Whether a real owner has been configured.
    #[must_use]
    pub fn has_owner(&self) -> bool {
        self.owner.as_str() != OWNER_PLACEHOLDER && !self.owner.as_str().is_empty()
    }

    #[must_use]
    pub fn is_owner(&self, member_id: &MemberId) -> bool {
        self.has_owner() && &self.owner == member_id
    }

    #[must_use]
    pub fn is_listed(&self, community_id: &CommunityId) -> bool {
        self.authorized_servers.contains(community_id)
    }

    /// Add a community to the allow-list. Returns `false` if already listed.
    pub fn authorize(&mut self, community_id: &CommunityId) -> bool {
        if self.is_listed(community_id) {
            return false;
        }
        self.authorized_servers.push(community_id.clone());
        true
    }

    /// Remove a community from the allow-list. Returns `false` if not listed.
    pub fn deauthorize(&mut self, community_id: &CommunityId) -> bool {
        let before = self.authorized_servers.len();
        self.authorized_servers.retain(|id| id != community_id);
        self.authorized_servers.len() != before
    }
}

/// `AuthConfig` bound to the file it is persisted in.
#[derive(Debug)]
pub struct SettingsStore {
    path: PathBuf,
    config: AuthConfig,
}

impl SettingsStore {
    /// Load settings from `path`.
    ///
    /// A missing file yields defaults. A corrupt or unreadable file is logged
    /// and also yields defaults.
    pub fn load<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref().to_path_buf();
        let config = match std::fs::read_to_string(&path) {
            Ok(contents) => serde_json::from_str(&contents).unwrap_or_else(|e| {
                tracing::warn!("Corrupt settings file, using defaults: {e}");
                AuthConfig::default()
            }),
            Err(e) if e.kind() == ErrorKind::NotFound => AuthConfig::default(),
            Err(e) => {
                tracing::warn!("Failed to read settings file, using defaults: {e}");
                AuthConfig::default()
            }
        };
        Self { path, config }
    }

    /// Bind an explicit configuration to `path` without reading it.
    pub fn with_config<P: AsRef<Path>>(path: P, config: AuthConfig) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            config,
        }
    }

    #[must_use]
    pub const fn config(&self) -> &AuthConfig {
        &self.config
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write the current configuration to disk.
    pub fn save(&self) -> Result<(), SettingsError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(&self.config)?;
        std::fs::write(&self.path, json)?;
        tracing::debug!(path = %self.path.display(), "Settings saved");
        Ok(())
    }

    /// Change the configuration and save it. The change is undone if the
    /// save fails.
    pub fn update<T>(&mut self, change: impl FnOnce(&mut AuthConfig) -> T) -> Result<T, SettingsError> {
        let snapshot = self.config.clone();
        let outcome = change(&mut self.config);
        if let Err(e) = self.save() {
            tracing::error!(error = %e, "Settings save failed, rolling back");
            self.config = snapshot;
            return Err(e);
        }
        Ok(outcome)
    }
}
