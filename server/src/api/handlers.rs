//! Command and Grant Check Handlers
//!
//! HTTP boundary used by the bot front-end.

use axum::extract::{Path, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use warden_common::{CommunityId, Member, RoleName};

use crate::api::AppState;
use crate::commands::{Command, CommandContext, CommandError};
use crate::permissions::GrantKind;
use crate::service::GrantCheck;

// ============================================================================
// Types
// ============================================================================

/// A command as resolved by the front-end.
#[derive(Debug, Deserialize)]
pub struct CommandRequest {
    pub context: CommandContext,
    pub command: String,
    #[serde(default)]
    pub members: Vec<Member>,
    #[serde(default)]
    pub roles: Vec<RoleName>,
    /// Trailing argument: hours, server index or `enable`/`disable`.
    #[serde(default)]
    pub argument: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CommandResponse {
    pub messages: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AuthorizationResponse {
    pub authorized: bool,
}

#[derive(Debug, Deserialize)]
pub struct CheckRequest {
    pub member: Member,
    pub kind: GrantKind,
}

// ============================================================================
// Handlers
// ============================================================================

/// Run a moderation command.
///
/// POST /api/commands
pub async fn run_command(
    State(state): State<AppState>,
    Json(request): Json<CommandRequest>,
) -> Result<Json<CommandResponse>, CommandError> {
    let command = Command::parse(
        &request.command,
        request.members,
        request.roles,
        request.argument.as_deref(),
    )?;
    let messages = state.service.run_command(request.context, command).await?;
    Ok(Json(CommandResponse { messages }))
}

/// Whether the bot may serve a community.
///
/// GET /api/communities/{community_id}/authorization
pub async fn community_authorization(
    State(state): State<AppState>,
    Path(community_id): Path<CommunityId>,
) -> Json<AuthorizationResponse> {
    let authorized = state.service.is_server_authorized(&community_id).await;
    Json(AuthorizationResponse { authorized })
}

/// Whether a member currently holds a grant.
///
/// POST /api/communities/{community_id}/checks
pub async fn check_grant(
    State(state): State<AppState>,
    Path(community_id): Path<CommunityId>,
    Json(request): Json<CheckRequest>,
) -> Result<Json<GrantCheck>, CommandError> {
    let check = state
        .service
        .check(community_id, request.member, request.kind)
        .await?;
    Ok(Json(check))
}
