//! Grant kinds tracked by the ledger.
//!
//! The owner is deliberately absent: ownership is a single configured
//! identity, not a revocable grant.

use std::fmt;

/// Kind of time-bounded grant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GrantKind {
    /// Ignored by the bot
    Banned,
    /// Exempt from the punishment system
    Blessed,
    /// May ban, unban, bless and unbless
    Moderator,
    /// May do everything a moderator can, and appoint moderators
    Admin,
}

impl GrantKind {
    /// Returns the key used for this kind in the durable ledger document.
    ///
    /// # Examples
    ///
    /// ```
    /// use warden_server::permissions::GrantKind;
    ///
    /// assert_eq!(GrantKind::Moderator.key(), "moderator");
    /// ```
    #[must_use]
    pub const fn key(&self) -> &'static str {
        match self {
            Self::Banned => "banned",
            Self::Blessed => "blessed",
            Self::Moderator => "moderator",
            Self::Admin => "admin",
        }
    }

    /// Returns all grant kinds as a slice.
    #[must_use]
    pub const fn all() -> &'static [Self] {
        &[Self::Banned, Self::Blessed, Self::Moderator, Self::Admin]
    }

    /// Returns a human-readable description of the grant.
    #[must_use]
    pub const fn description(&self) -> &'static str {
        match self {
            Self::Banned => "Blacklisted from using the bot",
            Self::Blessed => "Allowed to evade the punishment system",
            Self::Moderator => "Can ban, unban, bless and unbless users",
            Self::Admin => "Can do everything moderators can and assign moderators",
        }
    }
}

impl fmt::Display for GrantKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_returns_all_variants() {
        let all = GrantKind::all();
        assert_eq!(all.len(), 4);
        assert!(all.contains(&GrantKind::Banned));
        assert!(all.contains(&GrantKind::Blessed));
        assert!(all.contains(&GrantKind::Moderator));
        assert!(all.contains(&GrantKind::Admin));
    }

    #[test]
    fn test_serde_matches_key() {
        for kind in GrantKind::all() {
            let json = serde_json::to_string(kind).unwrap();
            assert_eq!(json, format!("\"{}\"", kind.key()));
            let restored: GrantKind = serde_json::from_str(&json).unwrap();
            assert_eq!(*kind, restored);
        }
    }

    #[test]
    fn test_descriptions_are_not_empty() {
        for kind in GrantKind::all() {
            assert!(!kind.description().is_empty(), "{kind:?} has no description");
        }
    }
}
