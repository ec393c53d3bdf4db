//! Server Configuration
//!
//! Loads configuration from environment variables.

use anyhow::{Context, Result};
use std::env;
use std::path::{Path, PathBuf};

use warden_common::CommunityId;

/// Server configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Server bind address (e.g., "0.0.0.0:8080")
    pub bind_address: String,

    /// Root directory for per-community ledgers
    pub data_dir: PathBuf,

    /// Settings file holding the owner and the community allow-list
    pub settings_path: PathBuf,

    /// Prefix the bot front-end uses for commands, shown in reply hints
    pub command_prefix: String,

    /// Maximum characters per reply message (default: 2000)
    pub message_limit: usize,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        let data_dir = PathBuf::from(env::var("WARDEN_DATA_DIR").unwrap_or_else(|_| "./data".into()));
        let settings_path = env::var("WARDEN_SETTINGS_PATH")
            .map_or_else(|_| data_dir.join("settings.json"), PathBuf::from);
        let message_limit = match env::var("WARDEN_MESSAGE_LIMIT") {
            Ok(value) => value
                .parse()
                .with_context(|| format!("WARDEN_MESSAGE_LIMIT must be a positive integer, got {value:?}"))?,
            Err(_) => 2000,
        };
        anyhow::ensure!(message_limit > 0, "WARDEN_MESSAGE_LIMIT must be greater than zero");

        Ok(Self {
            bind_address: env::var("BIND_ADDRESS").unwrap_or_else(|_| "0.0.0.0:8080".into()),
            data_dir,
            settings_path,
            command_prefix: env::var("WARDEN_COMMAND_PREFIX").unwrap_or_else(|_| ".".into()),
            message_limit,
        })
    }

    /// Ledger file of one community.
    ///
    /// The ID must already be validated with [`is_valid_community_id`].
    #[must_use]
    pub fn ledger_path(&self, community_id: &CommunityId) -> PathBuf {
        self.data_dir
            .join("communities")
            .join(community_id.as_str())
            .join("permissions.json")
    }

    /// Create a configuration rooted at `dir` for testing.
    #[must_use]
    pub fn default_for_test(dir: &Path) -> Self {
        Self {
            bind_address: "127.0.0.1:8080".into(),
            data_dir: dir.to_path_buf(),
            settings_path: dir.join("settings.json"),
            command_prefix: ".".into(),
            message_limit: 2000,
        }
    }
}

/// Community IDs become directory names, so only `[A-Za-z0-9_-]` is allowed.
#[must_use]
pub fn is_valid_community_id(community_id: &CommunityId) -> bool {
    let id = community_id.as_str();
    !id.is_empty()
        && id.len() <= 128
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}
