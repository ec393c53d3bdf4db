//! Permission service: shared entry point for the HTTP layer.
//!
//! One grant store per community, opened lazily and guarded by its own
//! mutex, so different communities proceed in parallel. Settings sit behind
//! a read/write lock. Lock order is always community store, then settings.
//! File I/O runs on the blocking pool.

use std::sync::Arc;

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use serde::Serialize;
use tokio::sync::{Mutex, RwLock};
use tracing::{info, warn};
use warden_common::{CommunityId, Member};

use crate::commands::{self, pack_into_messages, Command, CommandContext, CommandError};
use crate::config::{is_valid_community_id, Config};
use crate::permissions::{
    is_server_authorized, Clock, ExpiryMarker, FileLedgerRepository, GrantKind, GrantStore,
};
use crate::settings::SettingsStore;

/// Outcome of a single grant check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GrantCheck {
    pub active: bool,
    /// `"never"`, an RFC 3339 timestamp, or `null` when not active.
    pub expires: Option<ExpiryMarker>,
}

pub struct PermissionService {
    config: Arc<Config>,
    settings: RwLock<SettingsStore>,
    stores: DashMap<CommunityId, Arc<Mutex<GrantStore>>>,
    clock: Arc<dyn Clock>,
}

impl PermissionService {
    #[must_use]
    pub fn new(config: Arc<Config>, settings: SettingsStore, clock: Arc<dyn Clock>) -> Self {
        Self {
            config,
            settings: RwLock::new(settings),
            stores: DashMap::new(),
            clock,
        }
    }

    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Number of communities with an open grant store.
    #[must_use]
    pub fn open_communities(&self) -> usize {
        self.stores.len()
    }

    /// Grant store of `community_id`, loading it on first use.
    ///
    /// Blocks on file I/O; call from the blocking pool.
    fn store_for(&self, community_id: &CommunityId) -> Result<Arc<Mutex<GrantStore>>, CommandError> {
        if !is_valid_community_id(community_id) {
            warn!(community_id = %community_id, "Rejected malformed community ID");
            return Err(CommandError::UserInput(format!(
                "Invalid community ID \"{community_id}\""
            )));
        }

        match self.stores.entry(community_id.clone()) {
            Entry::Occupied(entry) => Ok(Arc::clone(entry.get())),
            Entry::Vacant(entry) => {
                let repository = FileLedgerRepository::new(self.config.ledger_path(community_id));
                let store = GrantStore::open(
                    community_id.clone(),
                    Box::new(repository),
                    Arc::clone(&self.clock),
                )?;
                Ok(Arc::clone(entry.insert(Arc::new(Mutex::new(store))).value()))
            }
        }
    }

    /// Gate and run a command. Returns the reply split into messages.
    pub async fn run_command(
        self: &Arc<Self>,
        ctx: CommandContext,
        command: Command,
    ) -> Result<Vec<String>, CommandError> {
        let service = Arc::clone(self);
        tokio::task::spawn_blocking(move || service.run_command_blocking(&ctx, command))
            .await
            .map_err(|e| CommandError::Internal(format!("command task failed: {e}")))?
    }

    fn run_command_blocking(
        &self,
        ctx: &CommandContext,
        command: Command,
    ) -> Result<Vec<String>, CommandError> {
        let name = command.name();
        let prefix = self.config.command_prefix.as_str();
        let store = self.store_for(&ctx.community.id)?;
        let mut store = store.blocking_lock();

        let lines = if command.mutates_settings() {
            let mut settings = self.settings.blocking_write();
            commands::authorize(&mut store, settings.config(), ctx, &command)?;
            commands::execute_settings(&mut settings, ctx, command, prefix)?
        } else {
            let settings = self.settings.blocking_read();
            commands::authorize(&mut store, settings.config(), ctx, &command)?;
            commands::execute(&mut store, settings.config(), ctx, command, prefix)?
        };

        info!(
            command = name,
            community_id = %ctx.community.id,
            member_id = %ctx.invoker.id,
            "Command executed"
        );
        Ok(pack_into_messages(&lines, self.config.message_limit))
    }

    /// Whether the bot may serve `community_id`.
    pub async fn is_server_authorized(&self, community_id: &CommunityId) -> bool {
        is_server_authorized(self.settings.read().await.config(), community_id)
    }

    /// Whether `member` currently holds `kind` in `community_id`, and until when.
    pub async fn check(
        self: &Arc<Self>,
        community_id: CommunityId,
        member: Member,
        kind: GrantKind,
    ) -> Result<GrantCheck, CommandError> {
        let service = Arc::clone(self);
        tokio::task::spawn_blocking(move || {
            let store = service.store_for(&community_id)?;
            let mut store = store.blocking_lock();
            let expires = store.expiry_of(&member, kind)?;
            Ok(GrantCheck {
                active: expires.is_some(),
                expires,
            })
        })
        .await
        .map_err(|e| CommandError::Internal(format!("check task failed: {e}")))?
    }
}
