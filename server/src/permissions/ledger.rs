//! Grant ledger: the durable state of one community.
//!
//! Document layout (keys sorted, pretty-printed):
//!
//! ```json
//! {
//!   "admin":     { "IDs": { "<member id>": "never" }, "roles": {} },
//!   "banned":    { "IDs": {}, "roles": { "<role name>": "2026-01-02T00:00:00Z" } },
//!   "blessed":   { "IDs": {}, "roles": {} },
//!   "moderator": { "IDs": {}, "roles": {} }
//! }
//! ```

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use warden_common::{MemberId, RoleName};

use super::error::Result;
use super::expiry::ExpiryMarker;
use super::kind::GrantKind;

/// Who a grant applies to.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum GrantTarget {
    Member(MemberId),
    Role(RoleName),
}

impl fmt::Display for GrantTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Member(id) => write!(f, "member {id}"),
            Self::Role(name) => write!(f, "role {name}"),
        }
    }
}

/// Grants of a single kind, keyed by member ID and by role name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GrantTable {
    #[serde(rename = "IDs", default)]
    pub members: BTreeMap<MemberId, ExpiryMarker>,
    #[serde(default)]
    pub roles: BTreeMap<RoleName, ExpiryMarker>,
}

impl GrantTable {
    /// Get the marker stored for a target.
    #[must_use]
    pub fn get(&self, target: &GrantTarget) -> Option<ExpiryMarker> {
        match target {
            GrantTarget::Member(id) => self.members.get(id).copied(),
            GrantTarget::Role(name) => self.roles.get(name).copied(),
        }
    }

    /// Insert or replace a grant.
    pub fn grant(&mut self, target: GrantTarget, marker: ExpiryMarker) {
        match target {
            GrantTarget::Member(id) => {
                self.members.insert(id, marker);
            }
            GrantTarget::Role(name) => {
                self.roles.insert(name, marker);
            }
        }
    }

    /// Remove a grant. Removing an absent target is a no-op.
    pub fn revoke(&mut self, target: &GrantTarget) -> Option<ExpiryMarker> {
        match target {
            GrantTarget::Member(id) => self.members.remove(id),
            GrantTarget::Role(name) => self.roles.remove(name),
        }
    }

    /// Remove every listed target.
    pub fn revoke_all<'a>(&mut self, targets: impl IntoIterator<Item = &'a GrantTarget>) {
        for target in targets {
            self.revoke(target);
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.members.is_empty() && self.roles.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.members.len() + self.roles.len()
    }
}

/// Full grant state for one community.
///
/// Every kind always has a table; missing keys in a stored document load as
/// empty tables. Fields are declared in key order so the document is written
/// with sorted keys.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ledger {
    #[serde(default)]
    admin: GrantTable,
    #[serde(default)]
    banned: GrantTable,
    #[serde(default)]
    blessed: GrantTable,
    #[serde(default)]
    moderator: GrantTable,
}

impl Ledger {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub const fn table(&self, kind: GrantKind) -> &GrantTable {
        match kind {
            GrantKind::Banned => &self.banned,
            GrantKind::Blessed => &self.blessed,
            GrantKind::Moderator => &self.moderator,
            GrantKind::Admin => &self.admin,
        }
    }

    pub fn table_mut(&mut self, kind: GrantKind) -> &mut GrantTable {
        match kind {
            GrantKind::Banned => &mut self.banned,
            GrantKind::Blessed => &mut self.blessed,
            GrantKind::Moderator => &mut self.moderator,
            GrantKind::Admin => &mut self.admin,
        }
    }

    /// Encode the whole ledger as a pretty-printed document.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Decode a stored ledger document.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}
