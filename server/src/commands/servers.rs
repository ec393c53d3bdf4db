//! Owner-only commands managing the community allow-list.

use tracing::info;

use super::{CommandContext, CommandError};
use crate::settings::{AuthConfig, SettingsStore};

type Reply = Result<Vec<String>, CommandError>;

pub(super) fn add_server(settings: &mut SettingsStore, ctx: &CommandContext) -> Reply {
    let community = &ctx.community;
    if settings.config().is_listed(&community.id) {
        return Ok(vec!["Server already authorized".to_owned()]);
    }

    settings.update(|config| config.authorize(&community.id))?;
    info!(community_id = %community.id, "Community authorized");
    Ok(vec![format!(
        "This server ({}) is now authorized to use this bot.",
        community.name
    )])
}

/// Remove the current community, or the `index`-th (1-based) joined one.
pub(super) fn remove_server(
    settings: &mut SettingsStore,
    ctx: &CommandContext,
    index: Option<&str>,
) -> Reply {
    let community = match index {
        None => &ctx.community,
        Some(raw) => {
            let position = raw
                .trim()
                .parse::<usize>()
                .map_err(|_| CommandError::UserInput(format!("Error: invalid server index \"{raw}\"")))?;
            if position < 1 || position > ctx.joined.len() {
                return Err(CommandError::UserInput("Error: Index out of range".to_owned()));
            }
            &ctx.joined[position - 1]
        }
    };

    if !settings.config().is_listed(&community.id) {
        return Ok(vec!["Server already removed.".to_owned()]);
    }

    settings.update(|config| config.deauthorize(&community.id))?;
    info!(community_id = %community.id, "Community deauthorized");
    Ok(vec![format!("Server ({}) removed.", community.name)])
}

pub(super) fn server_list(config: &AuthConfig, ctx: &CommandContext, prefix: &str) -> Vec<String> {
    let mut lines: Vec<String> = ctx
        .joined
        .iter()
        .enumerate()
        .map(|(index, community)| {
            let status = if config.is_listed(&community.id) { "yes" } else { "**no**" };
            format!(" {}. {}: {status}", index + 1, community.name)
        })
        .collect();

    if !config.server_authorization {
        lines.push(format!(
            "Note: Serverauth is not enabled, so all servers will be able to use your bot anyway. \
             You can enable serverauth with {prefix}serverauth"
        ));
    }
    lines
}

pub(super) fn server_auth(settings: &mut SettingsStore, toggle: Option<&str>, prefix: &str) -> Reply {
    let enable = match toggle.map(str::trim) {
        Some("enable") => true,
        Some("disable") => false,
        _ => {
            return Err(CommandError::UserInput(format!(
                "Usage: {prefix}serverauth <enable|disable>"
            )))
        }
    };

    settings.update(|config| config.server_authorization = enable)?;
    info!(enabled = enable, "Server authorization toggled");
    let reply = if enable {
        "Enabled. Your bot will ignore all messages if not authorized"
    } else {
        "Disabled. Anyone who adds your bot to their server can use it"
    };
    Ok(vec![reply.to_owned()])
}
