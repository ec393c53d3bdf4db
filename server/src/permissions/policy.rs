//! Authorization policy.
//!
//! Privilege ladder, lowest to highest: everyone, moderator, admin, owner.
//! Each level includes the ones below it. The owner is a configured identity
//! and never expires. Banned and blessed are independent of the ladder.
//!
//! The community allow-list is a separate gate, checked before any member
//! level permission.

use std::fmt;

use serde::{Deserialize, Serialize};
use warden_common::{CommunityId, Member};

use super::error::Result;
use super::kind::GrantKind;
use super::store::GrantStore;
use crate::settings::AuthConfig;

/// Privilege a command requires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Privilege {
    Everyone,
    Moderator,
    Admin,
    Owner,
}

impl fmt::Display for Privilege {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Everyone => write!(f, "everyone"),
            Self::Moderator => write!(f, "moderator"),
            Self::Admin => write!(f, "admin"),
            Self::Owner => write!(f, "owner"),
        }
    }
}

/// Whether the bot may serve `community_id`.
///
/// Always true while the allow-list is disabled.
#[must_use]
pub fn is_server_authorized(config: &AuthConfig, community_id: &CommunityId) -> bool {
    !config.server_authorization || config.is_listed(community_id)
}

/// Permission checks for one community.
///
/// Checks other than `require_owner` read the grant store and may prune
/// expired grants as a side effect.
pub struct Authorizer<'a> {
    store: &'a mut GrantStore,
    config: &'a AuthConfig,
}

impl<'a> Authorizer<'a> {
    pub fn new(store: &'a mut GrantStore, config: &'a AuthConfig) -> Self {
        Self { store, config }
    }

    pub fn store(&mut self) -> &mut GrantStore {
        &mut *self.store
    }

    #[must_use]
    pub const fn config(&self) -> &AuthConfig {
        self.config
    }

    /// Identity equality against the configured owner.
    #[must_use]
    pub fn require_owner(&self, member: &Member) -> bool {
        self.config.is_owner(&member.id)
    }

    /// Owner, or an active admin grant.
    pub fn require_admin(&mut self, member: &Member) -> Result<bool> {
        if self.require_owner(member) {
            return Ok(true);
        }
        self.is_admin(member)
    }

    /// Admin, or an active moderator grant.
    pub fn require_moderator(&mut self, member: &Member) -> Result<bool> {
        if self.require_admin(member)? {
            return Ok(true);
        }
        self.is_moderator(member)
    }

    pub fn is_banned(&mut self, member: &Member) -> Result<bool> {
        self.store.is_active(member, GrantKind::Banned)
    }

    pub fn is_blessed(&mut self, member: &Member) -> Result<bool> {
        self.store.is_active(member, GrantKind::Blessed)
    }

    pub fn is_moderator(&mut self, member: &Member) -> Result<bool> {
        self.store.is_active(member, GrantKind::Moderator)
    }

    pub fn is_admin(&mut self, member: &Member) -> Result<bool> {
        self.store.is_active(member, GrantKind::Admin)
    }

    /// Whether `member` holds at least `required`.
    pub fn require(&mut self, member: &Member, required: Privilege) -> Result<bool> {
        match required {
            Privilege::Everyone => Ok(true),
            Privilege::Moderator => self.require_moderator(member),
            Privilege::Admin => self.require_admin(member),
            Privilege::Owner => Ok(self.require_owner(member)),
        }
    }

    #[must_use]
    pub fn is_server_authorized(&self, community_id: &CommunityId) -> bool {
        is_server_authorized(self.config, community_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::permissions::clock::ManualClock;
    use crate::permissions::repository::InMemoryLedgerRepository;
    use chrono::{TimeDelta, TimeZone, Utc};
    use std::sync::Arc;
    use warden_common::{MemberId, RoleName};

    fn setup() -> (GrantStore, AuthConfig, ManualClock) {
        let clock = ManualClock::new(Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap());
        let store = GrantStore::open(
            CommunityId::from("guild"),
            Box::new(InMemoryLedgerRepository::new()),
            Arc::new(clock.clone()),
        )
        .unwrap();
        let config = AuthConfig {
            owner: MemberId::from("owner"),
            ..AuthConfig::default()
        };
        (store, config, clock)
    }

    #[test]
    fn test_owner_passes_every_level() {
        let (mut store, config, _clock) = setup();
        let owner = Member::new("owner", "boss");
        let mut auth = Authorizer::new(&mut store, &config);

        for level in [Privilege::Everyone, Privilege::Moderator, Privilege::Admin, Privilege::Owner] {
            assert!(auth.require(&owner, level).unwrap(), "owner failed {level}");
        }
    }

    #[test]
    fn test_owner_is_unaffected_by_grants() {
        let (mut store, config, clock) = setup();
        let owner = Member::new("owner", "boss");
        store.mark_entities(&[owner.clone()], &[], GrantKind::Admin, 1.0).unwrap();
        store.unmark_entities(&[owner.clone()], &[], GrantKind::Admin).unwrap();
        store.mark_entities(&[owner.clone()], &[], GrantKind::Banned, 1.0).unwrap();
        clock.advance(TimeDelta::days(365 * 50));

        let auth = Authorizer::new(&mut store, &config);
        assert!(auth.require_owner(&owner));
    }

    #[test]
    fn test_hierarchy() {
        let (mut store, config, _clock) = setup();
        let admin = Member::new("a", "admin");
        let moderator = Member::new("m", "mod").with_role("Mods");
        let user = Member::new("u", "user");
        store.mark_entities(&[admin.clone()], &[], GrantKind::Admin, 0.0).unwrap();
        store
            .mark_entities(&[], &[RoleName::from("Mods")], GrantKind::Moderator, 0.0)
            .unwrap();

        let mut auth = Authorizer::new(&mut store, &config);
        assert!(auth.require_admin(&admin).unwrap());
        assert!(auth.require_moderator(&admin).unwrap());
        assert!(!auth.require_owner(&admin));

        assert!(!auth.require_admin(&moderator).unwrap());
        assert!(auth.require_moderator(&moderator).unwrap());

        assert!(!auth.require_moderator(&user).unwrap());
        assert!(auth.require(&user, Privilege::Everyone).unwrap());
    }

    #[test]
    fn test_banned_and_blessed_are_independent() {
        let (mut store, config, _clock) = setup();
        let member = Member::new("x", "x");
        store.mark_entities(&[member.clone()], &[], GrantKind::Banned, 0.0).unwrap();

        let mut auth = Authorizer::new(&mut store, &config);
        assert!(auth.is_banned(&member).unwrap());
        assert!(!auth.is_blessed(&member).unwrap());
        assert!(!auth.require_moderator(&member).unwrap());
    }

    #[test]
    fn test_placeholder_owner_matches_no_one() {
        let (mut store, _config, _clock) = setup();
        let config = AuthConfig::default();
        let auth = Authorizer::new(&mut store, &config);
        assert!(!auth.require_owner(&Member::new(crate::settings::OWNER_PLACEHOLDER, "x")));
    }

    #[test]
    fn test_server_gate() {
        let mut config = AuthConfig::default();
        let listed = CommunityId::from("g1");
        let other = CommunityId::from("g2");
        config.authorize(&listed);

        assert!(is_server_authorized(&config, &other));

        config.server_authorization = true;
        assert!(is_server_authorized(&config, &listed));
        assert!(!is_server_authorized(&config, &other));
    }

    #[test]
    fn test_privilege_ordering() {
        assert!(Privilege::Owner > Privilege::Admin);
        assert!(Privilege::Admin > Privilege::Moderator);
        assert!(Privilege::Moderator > Privilege::Everyone);
    }
}
