//! Grant commands: listings, ban/bless and staff appointments.

use tracing::info;
use warden_common::Member;

use super::format::{member_line, owner_label};
use super::{CommandContext, CommandError, Targets};
use crate::permissions::{Authorizer, GrantKind, GrantStore, MarkReport};
use crate::settings::AuthConfig;

pub(super) const MODERATORS_CANT_BAN_ADMINS: &str = "Moderators can't ban admins";
pub(super) const CANT_DEMOTE_ADMINS: &str = "Can't demote admins to moderators.";

type Reply = Result<Vec<String>, CommandError>;

pub(super) fn mod_list(store: &mut GrantStore, config: &AuthConfig, ctx: &CommandContext) -> Reply {
    let moderators = store.list_marked(&ctx.roster, GrantKind::Moderator)?;
    let admins = store.list_marked(&ctx.roster, GrantKind::Admin)?;

    let mut lines = vec!["**Moderators:**".to_owned()];
    lines.extend(moderators.iter().map(member_line));
    lines.push("**Administrators:**".to_owned());
    lines.extend(admins.iter().map(member_line));
    lines.push(format!("**Owner:** {}", owner_label(config, &ctx.roster)));
    Ok(lines)
}

/// `banlist` / `blesslist`.
pub(super) fn marked_list(store: &mut GrantStore, ctx: &CommandContext, kind: GrantKind) -> Reply {
    let marked = store.list_marked(&ctx.roster, kind)?;
    if marked.is_empty() {
        return Ok(vec![format!("No one is {kind}.")]);
    }

    let title = match kind {
        GrantKind::Banned => "**Banned Users**",
        GrantKind::Blessed => "**Blessed Users**",
        GrantKind::Moderator => "**Moderators:**",
        GrantKind::Admin => "**Administrators:**",
    };
    let mut lines = vec![title.to_owned()];
    lines.extend(marked.iter().map(member_line));
    Ok(lines)
}

pub(super) fn mark(store: &mut GrantStore, targets: Targets, kind: GrantKind) -> Reply {
    let report = store.mark_entities(&targets.members, &targets.roles, kind, targets.duration_hours)?;
    mark_reply(&report)
}

fn mark_reply(report: &MarkReport) -> Reply {
    if report.is_empty() {
        return Ok(vec![format!("Nobody left to mark as {}.", report.kind)]);
    }
    Ok(vec![report.summary()])
}

/// Take `from` away and grant `to` in a single save.
fn reassign(store: &mut GrantStore, targets: Targets, from: GrantKind, to: GrantKind) -> Reply {
    let (_, report) = store.reassign(
        &targets.members,
        &targets.roles,
        from,
        to,
        targets.duration_hours,
    )?;
    mark_reply(&report)
}

pub(super) fn unmark(store: &mut GrantStore, targets: Targets, kind: GrantKind) -> Reply {
    let report = store.unmark_entities(&targets.members, &targets.roles, kind)?;
    Ok(report.lines())
}

/// Moderators may not ban admins: admin targets and all of their roles are
/// dropped before the rest are banned.
pub(super) fn ban(store: &mut GrantStore, ctx: &CommandContext, mut targets: Targets) -> Reply {
    let mut lines = Vec::new();

    if store.is_active(&ctx.invoker, GrantKind::Moderator)? {
        let mut kept: Vec<Member> = Vec::with_capacity(targets.members.len());
        let mut refused = false;
        for member in targets.members {
            if store.is_active(&member, GrantKind::Admin)? {
                targets.roles.retain(|role| !member.has_role(role));
                refused = true;
            } else {
                kept.push(member);
            }
        }
        targets.members = kept;

        if refused {
            info!(
                community_id = %ctx.community.id,
                member_id = %ctx.invoker.id,
                "Moderator tried to ban an admin"
            );
            lines.push(MODERATORS_CANT_BAN_ADMINS.to_owned());
        }
    }

    lines.extend(mark(store, targets, GrantKind::Banned)?);
    Ok(lines)
}

/// `mod`: only the owner may turn an admin into a moderator.
pub(super) fn appoint_moderator(
    store: &mut GrantStore,
    config: &AuthConfig,
    ctx: &CommandContext,
    targets: Targets,
) -> Reply {
    let mut auth = Authorizer::new(store, config);
    if !auth.require_owner(&ctx.invoker) {
        for member in &targets.members {
            if auth.is_admin(member)? {
                return Err(CommandError::PolicyViolation(CANT_DEMOTE_ADMINS.to_owned()));
            }
        }
    }

    reassign(store, targets, GrantKind::Admin, GrantKind::Moderator)
}

/// `admin`: drops any moderator grant before granting admin.
pub(super) fn appoint_admin(store: &mut GrantStore, targets: Targets) -> Reply {
    reassign(store, targets, GrantKind::Moderator, GrantKind::Admin)
}
