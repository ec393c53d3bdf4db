//! Expiry resolution.
//!
//! Computes whether a member is currently marked under a grant kind. The
//! evaluation is pure: it reports which entries have lapsed and leaves pruning
//! and persistence to the store.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use warden_common::{MemberId, RoleName};

use super::expiry::ExpiryMarker;
use super::ledger::{GrantTable, GrantTarget};

/// Outcome of evaluating one member against one grant table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Evaluation {
    /// Candidate grants still in force.
    pub live: Vec<(GrantTarget, ExpiryMarker)>,
    /// Candidate grants that have lapsed and must be removed from the table.
    pub expired: Vec<GrantTarget>,
}

impl Evaluation {
    /// At least one candidate grant is still in force.
    #[must_use]
    pub fn is_active(&self) -> bool {
        !self.live.is_empty()
    }

    #[must_use]
    pub fn needs_prune(&self) -> bool {
        !self.expired.is_empty()
    }

    /// The longest-lasting live grant.
    #[must_use]
    pub fn strongest(&self) -> Option<ExpiryMarker> {
        self.live.iter().map(|(_, marker)| *marker).max()
    }

    /// Whether the member's own (not role-derived) grant is live.
    #[must_use]
    pub fn has_live_direct(&self) -> bool {
        self.live
            .iter()
            .any(|(target, _)| matches!(target, GrantTarget::Member(_)))
    }
}

/// Evaluate a member against a grant table.
///
/// Candidates are the member's direct grant plus the grant of every role the
/// member currently holds. Each candidate expires independently; the member
/// is active while any one of them is live.
pub fn evaluate(
    table: &GrantTable,
    member_id: &MemberId,
    roles: &[RoleName],
    now: DateTime<Utc>,
) -> Evaluation {
    let direct = GrantTarget::Member(member_id.clone());
    let held: BTreeSet<&RoleName> = roles.iter().collect();

    let candidates = std::iter::once(direct).chain(
        held.into_iter()
            .map(|role| GrantTarget::Role(role.clone())),
    );

    let mut evaluation = Evaluation::default();
    for target in candidates {
        if let Some(marker) = table.get(&target) {
            if marker.is_expired(now) {
                evaluation.expired.push(target);
            } else {
                evaluation.live.push((target, marker));
            }
        }
    }
    evaluation
}

/// Evaluate a single grant entry, such as a role grant on its own.
pub fn evaluate_target(table: &GrantTable, target: &GrantTarget, now: DateTime<Utc>) -> Evaluation {
    let mut evaluation = Evaluation::default();
    if let Some(marker) = table.get(target) {
        if marker.is_expired(now) {
            evaluation.expired.push(target.clone());
        } else {
            evaluation.live.push((target.clone(), marker));
        }
    }
    evaluation
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeDelta, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 6, 1, 0, 0, 0).unwrap()
    }

    fn member(id: &str) -> GrantTarget {
        GrantTarget::Member(MemberId::from(id))
    }

    fn role(name: &str) -> GrantTarget {
        GrantTarget::Role(RoleName::from(name))
    }

    #[test]
    fn test_unmarked_member_is_inactive() {
        let table = GrantTable::default();
        let evaluation = evaluate(&table, &MemberId::from("1"), &[RoleName::from("Any")], now());
        assert!(!evaluation.is_active());
        assert!(!evaluation.needs_prune());
        assert_eq!(evaluation.strongest(), None);
    }

    #[test]
    fn test_direct_grant_is_live() {
        let mut table = GrantTable::default();
        table.grant(member("1"), ExpiryMarker::At(now() + TimeDelta::hours(1)));

        let evaluation = evaluate(&table, &MemberId::from("1"), &[], now());
        assert!(evaluation.is_active());
        assert!(evaluation.has_live_direct());
    }

    #[test]
    fn test_expired_direct_grant_is_reported_for_pruning() {
        let mut table = GrantTable::default();
        table.grant(member("1"), ExpiryMarker::At(now() - TimeDelta::hours(1)));

        let evaluation = evaluate(&table, &MemberId::from("1"), &[], now());
        assert!(!evaluation.is_active());
        assert_eq!(evaluation.expired, vec![member("1")]);
    }

    #[test]
    fn test_role_grant_applies_to_holders_only() {
        let mut table = GrantTable::default();
        table.grant(role("Trusted"), ExpiryMarker::Never);

        let holder = evaluate(&table, &MemberId::from("2"), &[RoleName::from("Trusted")], now());
        assert!(holder.is_active());
        assert!(!holder.has_live_direct());

        let other = evaluate(&table, &MemberId::from("2"), &[RoleName::from("Guest")], now());
        assert!(!other.is_active());
    }

    #[test]
    fn test_candidates_expire_independently() {
        let mut table = GrantTable::default();
        table.grant(member("1"), ExpiryMarker::At(now() - TimeDelta::hours(1)));
        table.grant(role("Trusted"), ExpiryMarker::At(now() + TimeDelta::hours(5)));
        table.grant(role("Old"), ExpiryMarker::At(now() - TimeDelta::minutes(1)));

        let evaluation = evaluate(
            &table,
            &MemberId::from("1"),
            &[RoleName::from("Trusted"), RoleName::from("Old")],
            now(),
        );
        assert!(evaluation.is_active());
        assert_eq!(evaluation.live, vec![(role("Trusted"), ExpiryMarker::At(now() + TimeDelta::hours(5)))]);
        assert_eq!(evaluation.expired.len(), 2);
        assert!(evaluation.expired.contains(&member("1")));
        assert!(evaluation.expired.contains(&role("Old")));
    }

    #[test]
    fn test_strongest_prefers_never() {
        let mut table = GrantTable::default();
        table.grant(member("1"), ExpiryMarker::At(now() + TimeDelta::hours(1)));
        table.grant(role("Staff"), ExpiryMarker::Never);

        let evaluation = evaluate(&table, &MemberId::from("1"), &[RoleName::from("Staff")], now());
        assert_eq!(evaluation.strongest(), Some(ExpiryMarker::Never));
    }

    #[test]
    fn test_duplicate_roles_are_counted_once() {
        let mut table = GrantTable::default();
        table.grant(role("Old"), ExpiryMarker::At(now() - TimeDelta::hours(1)));

        let roles = [RoleName::from("Old"), RoleName::from("Old")];
        let evaluation = evaluate(&table, &MemberId::from("1"), &roles, now());
        assert_eq!(evaluation.expired, vec![role("Old")]);
    }

    #[test]
    fn test_evaluate_target() {
        let mut table = GrantTable::default();
        table.grant(role("Trusted"), ExpiryMarker::Never);

        assert!(evaluate_target(&table, &role("Trusted"), now()).is_active());
        assert!(!evaluate_target(&table, &role("Missing"), now()).is_active());
    }
}
