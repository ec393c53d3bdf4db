//! Moderation commands.
//!
//! The bot front-end resolves mentions and hands over typed targets; this
//! module gates each command (allow-list, ban, privilege), applies the
//! moderation rules and produces reply lines.

pub mod error;
mod format;
mod grants;
mod servers;

use serde::{Deserialize, Serialize};
use warden_common::{Community, Member, RoleName};

use crate::permissions::{Authorizer, GrantKind, GrantStore, Privilege};
use crate::settings::{AuthConfig, SettingsStore};

pub use error::CommandError;
pub use format::pack_into_messages;

/// Default ban length in hours.
pub const DEFAULT_BAN_HOURS: f64 = 24.0;
/// Default blessing length in hours.
pub const DEFAULT_BLESS_HOURS: f64 = 1.0;
/// Default moderator/admin appointment length (forever).
pub const DEFAULT_APPOINTMENT_HOURS: f64 = 0.0;

/// Everything the front-end knows about where a command was issued.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandContext {
    /// Member who issued the command.
    pub invoker: Member,
    /// Community the command was issued in.
    pub community: Community,
    /// Current members of the community, used by listings.
    #[serde(default)]
    pub roster: Vec<Member>,
    /// Every community the bot has joined, in display order.
    #[serde(default)]
    pub joined: Vec<Community>,
}

/// Resolved targets of a grant command.
#[derive(Debug, Clone, PartialEq)]
pub struct Targets {
    pub members: Vec<Member>,
    pub roles: Vec<RoleName>,
    pub duration_hours: f64,
}

impl Targets {
    fn new(members: Vec<Member>, roles: Vec<RoleName>, duration_hours: f64) -> Result<Self, CommandError> {
        if members.is_empty() && roles.is_empty() {
            return Err(CommandError::UserInput(
                "Specify at least one user or role.".to_string(),
            ));
        }
        Ok(Self {
            members,
            roles,
            duration_hours,
        })
    }

    fn with_duration(
        members: Vec<Member>,
        roles: Vec<RoleName>,
        argument: Option<&str>,
        default_hours: f64,
    ) -> Result<Self, CommandError> {
        let hours = argument.map(parse_hours).transpose()?.unwrap_or(default_hours);
        Self::new(members, roles, hours)
    }
}

/// Parse a trailing duration argument, in hours.
fn parse_hours(argument: &str) -> Result<f64, CommandError> {
    argument
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|hours| hours.is_finite())
        .ok_or_else(|| {
            CommandError::UserInput(format!(
                "Invalid duration \"{argument}\": expected a number of hours"
            ))
        })
}

/// A fully parsed command.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    ModList,
    BanList,
    BlessList,
    Ban(Targets),
    Unban(Targets),
    Bless(Targets),
    Unbless(Targets),
    Mod(Targets),
    Unmod(Targets),
    Admin(Targets),
    Unadmin(Targets),
    AddServer,
    RmServer { index: Option<String> },
    ServerList,
    ServerAuth { toggle: Option<String> },
}

impl Command {
    /// Build a command from its name, resolved targets and optional trailing
    /// argument (a duration in hours, a server index, or `enable`/`disable`).
    pub fn parse(
        name: &str,
        members: Vec<Member>,
        roles: Vec<RoleName>,
        argument: Option<&str>,
    ) -> Result<Self, CommandError> {
        let argument = argument.map(str::trim).filter(|a| !a.is_empty());
        let command = match name.trim().to_ascii_lowercase().as_str() {
            "modlist" => Self::ModList,
            "banlist" => Self::BanList,
            "blesslist" => Self::BlessList,
            "ban" => Self::Ban(Targets::with_duration(members, roles, argument, DEFAULT_BAN_HOURS)?),
            "unban" => Self::Unban(Targets::new(members, roles, 0.0)?),
            "bless" => Self::Bless(Targets::with_duration(
                members,
                roles,
                argument,
                DEFAULT_BLESS_HOURS,
            )?),
            "unbless" => Self::Unbless(Targets::new(members, roles, 0.0)?),
            "mod" => Self::Mod(Targets::with_duration(
                members,
                roles,
                argument,
                DEFAULT_APPOINTMENT_HOURS,
            )?),
            "unmod" => Self::Unmod(Targets::new(members, roles, 0.0)?),
            "admin" => Self::Admin(Targets::with_duration(
                members,
                roles,
                argument,
                DEFAULT_APPOINTMENT_HOURS,
            )?),
            "unadmin" => Self::Unadmin(Targets::new(members, roles, 0.0)?),
            "addserver" => Self::AddServer,
            "rmserver" => Self::RmServer {
                index: argument.map(str::to_owned),
            },
            "serverlist" => Self::ServerList,
            "serverauth" => Self::ServerAuth {
                toggle: argument.map(str::to_owned),
            },
            other => return Err(CommandError::UnknownCommand(other.to_owned())),
        };
        Ok(command)
    }

    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::ModList => "modlist",
            Self::BanList => "banlist",
            Self::BlessList => "blesslist",
            Self::Ban(_) => "ban",
            Self::Unban(_) => "unban",
            Self::Bless(_) => "bless",
            Self::Unbless(_) => "unbless",
            Self::Mod(_) => "mod",
            Self::Unmod(_) => "unmod",
            Self::Admin(_) => "admin",
            Self::Unadmin(_) => "unadmin",
            Self::AddServer => "addserver",
            Self::RmServer { .. } => "rmserver",
            Self::ServerList => "serverlist",
            Self::ServerAuth { .. } => "serverauth",
        }
    }

    /// Privilege the invoker must hold.
    #[must_use]
    pub const fn required_privilege(&self) -> Privilege {
        match self {
            Self::ModList | Self::BanList | Self::BlessList => Privilege::Everyone,
            Self::Ban(_) | Self::Unban(_) | Self::Bless(_) | Self::Unbless(_) => {
                Privilege::Moderator
            }
            Self::Mod(_) | Self::Unmod(_) => Privilege::Admin,
            Self::Admin(_)
            | Self::Unadmin(_)
            | Self::AddServer
            | Self::RmServer { .. }
            | Self::ServerList
            | Self::ServerAuth { .. } => Privilege::Owner,
        }
    }

    /// Whether the command changes the process-wide settings.
    #[must_use]
    pub const fn mutates_settings(&self) -> bool {
        matches!(
            self,
            Self::AddServer | Self::RmServer { .. } | Self::ServerAuth { .. }
        )
    }
}

/// Gate a command: allow-list, then ban, then privilege.
///
/// The owner passes every gate.
pub fn authorize(
    store: &mut GrantStore,
    config: &AuthConfig,
    ctx: &CommandContext,
    command: &Command,
) -> Result<(), CommandError> {
    let mut auth = Authorizer::new(store, config);
    if auth.require_owner(&ctx.invoker) {
        return Ok(());
    }

    if !auth.is_server_authorized(&ctx.community.id) {
        return Err(CommandError::ServerNotAuthorized);
    }

    if auth.is_banned(&ctx.invoker)? {
        let until = auth.store().expiry_of(&ctx.invoker, GrantKind::Banned)?;
        return Err(CommandError::Banned { until });
    }

    let required = command.required_privilege();
    if !auth.require(&ctx.invoker, required)? {
        tracing::debug!(
            command = command.name(),
            member_id = %ctx.invoker.id,
            %required,
            "Command refused"
        );
        return Err(CommandError::Forbidden { required });
    }
    Ok(())
}

/// Run a command that only reads the settings. Returns reply lines.
pub fn execute(
    store: &mut GrantStore,
    config: &AuthConfig,
    ctx: &CommandContext,
    command: Command,
    prefix: &str,
) -> Result<Vec<String>, CommandError> {
    match command {
        Command::ModList => grants::mod_list(store, config, ctx),
        Command::BanList => grants::marked_list(store, ctx, GrantKind::Banned),
        Command::BlessList => grants::marked_list(store, ctx, GrantKind::Blessed),
        Command::Ban(targets) => grants::ban(store, ctx, targets),
        Command::Bless(targets) => grants::mark(store, targets, GrantKind::Blessed),
        Command::Unban(targets) => grants::unmark(store, targets, GrantKind::Banned),
        Command::Unbless(targets) => grants::unmark(store, targets, GrantKind::Blessed),
        Command::Mod(targets) => grants::appoint_moderator(store, config, ctx, targets),
        Command::Unmod(targets) => grants::unmark(store, targets, GrantKind::Moderator),
        Command::Admin(targets) => grants::appoint_admin(store, targets),
        Command::Unadmin(targets) => grants::unmark(store, targets, GrantKind::Admin),
        Command::ServerList => Ok(servers::server_list(config, ctx, prefix)),
        Command::AddServer | Command::RmServer { .. } | Command::ServerAuth { .. } => {
            Err(CommandError::Internal(format!(
                "{} needs write access to settings",
                command.name()
            )))
        }
    }
}

/// Run a command that changes the settings. Returns reply lines.
pub fn execute_settings(
    settings: &mut SettingsStore,
    ctx: &CommandContext,
    command: Command,
    prefix: &str,
) -> Result<Vec<String>, CommandError> {
    match command {
        Command::AddServer => servers::add_server(settings, ctx),
        Command::RmServer { index } => servers::remove_server(settings, ctx, index.as_deref()),
        Command::ServerAuth { toggle } => servers::server_auth(settings, toggle.as_deref(), prefix),
        other => Err(CommandError::Internal(format!(
            "{} does not change settings",
            other.name()
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::permissions::{InMemoryLedgerRepository, ManualClock};
    use chrono::{TimeZone, Utc};
    use std::sync::Arc;
    use warden_common::{CommunityId, MemberId};

    fn store() -> GrantStore {
        GrantStore::open(
            CommunityId::from("g1"),
            Box::new(InMemoryLedgerRepository::new()),
            Arc::new(ManualClock::new(Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap())),
        )
        .unwrap()
    }

    fn ctx(invoker: Member) -> CommandContext {
        CommandContext {
            invoker,
            community: Community::new("g1", "Guild"),
            roster: vec![],
            joined: vec![],
        }
    }

    fn owner_config() -> AuthConfig {
        AuthConfig {
            owner: MemberId::from("owner"),
            ..AuthConfig::default()
        }
    }

    #[test]
    fn test_parse_defaults() {
        let alice = Member::new("1", "alice");
        let ban = Command::parse("ban", vec![alice.clone()], vec![], None).unwrap();
        assert!(matches!(ban, Command::Ban(Targets { duration_hours, .. }) if duration_hours == 24.0));

        let bless = Command::parse("BLESS", vec![alice.clone()], vec![], None).unwrap();
        assert!(matches!(bless, Command::Bless(Targets { duration_hours, .. }) if duration_hours == 1.0));

        let appoint = Command::parse("mod", vec![alice], vec![], Some("12.5")).unwrap();
        assert!(matches!(appoint, Command::Mod(Targets { duration_hours, .. }) if duration_hours == 12.5));
    }

    #[test]
    fn test_parse_rejects_bad_duration() {
        let alice = Member::new("1", "alice");
        for bad in ["soon", "NaN", "inf"] {
            let result = Command::parse("ban", vec![alice.clone()], vec![], Some(bad));
            assert!(matches!(result, Err(CommandError::UserInput(_))), "{bad}");
        }
    }

    #[test]
    fn test_parse_requires_targets() {
        let result = Command::parse("unban", vec![], vec![], None);
        assert!(matches!(result, Err(CommandError::UserInput(_))));
    }

    #[test]
    fn test_parse_unknown_command() {
        let result = Command::parse("quote", vec![], vec![], None);
        assert!(matches!(result, Err(CommandError::UnknownCommand(name)) if name == "quote"));
    }

    #[test]
    fn test_required_privileges() {
        let t = || Targets {
            members: vec![Member::new("1", "a")],
            roles: vec![],
            duration_hours: 0.0,
        };
        assert_eq!(Command::BanList.required_privilege(), Privilege::Everyone);
        assert_eq!(Command::Unbless(t()).required_privilege(), Privilege::Moderator);
        assert_eq!(Command::Unmod(t()).required_privilege(), Privilege::Admin);
        assert_eq!(Command::Admin(t()).required_privilege(), Privilege::Owner);
        assert_eq!(Command::ServerList.required_privilege(), Privilege::Owner);
        assert!(Command::AddServer.mutates_settings());
        assert!(!Command::ServerList.mutates_settings());
    }

    #[test]
    fn test_gate_order() {
        let mut store = store();
        let mut config = owner_config();
        let user = Member::new("u", "user");

        let refused = authorize(&mut store, &config, &ctx(user.clone()), &Command::AddServer);
        assert!(matches!(refused, Err(CommandError::Forbidden { required: Privilege::Owner })));

        store.mark_entities(&[user.clone()], &[], GrantKind::Banned, 0.0).unwrap();
        let banned = authorize(&mut store, &config, &ctx(user.clone()), &Command::BanList);
        assert!(matches!(banned, Err(CommandError::Banned { .. })));

        config.server_authorization = true;
        let gated = authorize(&mut store, &config, &ctx(user), &Command::BanList);
        assert!(matches!(gated, Err(CommandError::ServerNotAuthorized)));

        let owner = Member::new("owner", "boss");
        assert!(authorize(&mut store, &config, &ctx(owner), &Command::AddServer).is_ok());
    }

    #[test]
    fn test_listings_are_open_to_everyone() {
        let mut store = store();
        let config = owner_config();
        let user = Member::new("u", "user");
        assert!(authorize(&mut store, &config, &ctx(user), &Command::ModList).is_ok());
    }
}
