//! Grant store: one community's ledger with write-through persistence.
//!
//! Reads may prune expired grants; every change to the ledger, including a
//! prune, is saved before the operation returns. A failed save restores the
//! previous in-memory state and fails the operation.

use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, error, info, instrument};
use warden_common::{CommunityId, Member, RoleName};

use super::clock::Clock;
use super::error::Result;
use super::expiry::ExpiryMarker;
use super::kind::GrantKind;
use super::ledger::{GrantTarget, Ledger};
use super::report::{MarkReport, MarkedMember, UnmarkReport};
use super::repository::LedgerRepository;
use super::resolver::{self, Evaluation};

/// Grant state of a single community.
///
/// Not internally synchronised: callers serialise access per community.
pub struct GrantStore {
    community_id: CommunityId,
    ledger: Ledger,
    repository: Box<dyn LedgerRepository>,
    clock: Arc<dyn Clock>,
}

impl GrantStore {
    /// Load the community's ledger from `repository`.
    pub fn open(
        community_id: CommunityId,
        repository: Box<dyn LedgerRepository>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self> {
        let ledger = repository.load()?;
        info!(community_id = %community_id, "Grant ledger loaded");
        Ok(Self {
            community_id,
            ledger,
            repository,
            clock,
        })
    }

    #[must_use]
    pub const fn community_id(&self) -> &CommunityId {
        &self.community_id
    }

    #[must_use]
    pub const fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    #[must_use]
    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// Apply `change` to the ledger and save it, restoring the previous state
    /// if the save fails.
    fn commit<T>(&mut self, change: impl FnOnce(&mut Ledger) -> T) -> Result<T> {
        let snapshot = self.ledger.clone();
        let outcome = change(&mut self.ledger);
        if let Err(e) = self.repository.save(&self.ledger) {
            error!(
                community_id = %self.community_id,
                error = %e,
                "Ledger save failed, rolling back in-memory change"
            );
            self.ledger = snapshot;
            return Err(e);
        }
        Ok(outcome)
    }

    fn prune(&mut self, kind: GrantKind, expired: &[GrantTarget]) -> Result<()> {
        if expired.is_empty() {
            return Ok(());
        }
        debug!(
            community_id = %self.community_id,
            %kind,
            count = expired.len(),
            "Pruning expired grants"
        );
        self.commit(|ledger| ledger.table_mut(kind).revoke_all(expired))
    }

    /// Evaluate a member and prune whatever lapsed.
    pub fn evaluate(&mut self, member: &Member, kind: GrantKind) -> Result<Evaluation> {
        let evaluation =
            resolver::evaluate(self.ledger.table(kind), &member.id, &member.roles, self.now());
        self.prune(kind, &evaluation.expired)?;
        Ok(evaluation)
    }

    /// Whether `member` is currently marked under `kind`, directly or through
    /// one of their roles.
    #[instrument(skip(self, member), fields(community_id = %self.community_id, member_id = %member.id))]
    pub fn is_active(&mut self, member: &Member, kind: GrantKind) -> Result<bool> {
        Ok(self.evaluate(member, kind)?.is_active())
    }

    /// The longest-lasting live marker that makes `member` active, if any.
    pub fn expiry_of(&mut self, member: &Member, kind: GrantKind) -> Result<Option<ExpiryMarker>> {
        Ok(self.evaluate(member, kind)?.strongest())
    }

    /// Grant `kind` to every member (by ID) and every role (by name).
    ///
    /// Positive durations expire that many hours from now; zero or negative
    /// durations never expire. All grants are written, then saved once.
    #[instrument(skip(self, members, roles), fields(community_id = %self.community_id))]
    pub fn mark_entities(
        &mut self,
        members: &[Member],
        roles: &[RoleName],
        kind: GrantKind,
        duration_hours: f64,
    ) -> Result<MarkReport> {
        let marker = ExpiryMarker::from_duration_hours(duration_hours, self.now())?;

        if !members.is_empty() || !roles.is_empty() {
            self.commit(|ledger| {
                let table = ledger.table_mut(kind);
                for member in members {
                    table.grant(GrantTarget::Member(member.id.clone()), marker);
                }
                for role in roles {
                    table.grant(GrantTarget::Role(role.clone()), marker);
                }
            })?;
            info!(
                community_id = %self.community_id,
                %kind,
                members = members.len(),
                roles = roles.len(),
                expires = %marker,
                "Grants applied"
            );
        }

        Ok(MarkReport {
            kind,
            marker,
            members: members.iter().map(|m| m.name.clone()).collect(),
            roles: roles.to_vec(),
        })
    }

    /// Remove `kind` from every member and role given.
    ///
    /// Removal is unconditional, but only grants that were live are reported.
    /// A member lands in `unmarked` only when their own grant was live. A
    /// member whose status comes from a role not being unmarked is reported in
    /// `still_marked` instead, since removing their direct entry does not make
    /// them inactive.
    #[instrument(skip(self, members, roles), fields(community_id = %self.community_id))]
    pub fn unmark_entities(
        &mut self,
        members: &[Member],
        roles: &[RoleName],
        kind: GrantKind,
    ) -> Result<UnmarkReport> {
        let (removals, report) = self.plan_unmark(members, roles, kind);

        let table = self.ledger.table(kind);
        let changed = removals.iter().any(|target| table.get(target).is_some());
        if changed {
            self.commit(|ledger| ledger.table_mut(kind).revoke_all(&removals))?;
            info!(
                community_id = %self.community_id,
                %kind,
                unmarked = report.unmarked.len(),
                "Grants removed"
            );
        }

        Ok(report)
    }

    /// Move every member and role given from `from` to `to` in one save.
    ///
    /// Either both the removal and the new grants are stored, or neither is.
    #[instrument(skip(self, members, roles), fields(community_id = %self.community_id))]
    pub fn reassign(
        &mut self,
        members: &[Member],
        roles: &[RoleName],
        from: GrantKind,
        to: GrantKind,
        duration_hours: f64,
    ) -> Result<(UnmarkReport, MarkReport)> {
        let marker = ExpiryMarker::from_duration_hours(duration_hours, self.now())?;
        let (removals, unmark_report) = self.plan_unmark(members, roles, from);

        if !members.is_empty() || !roles.is_empty() {
            self.commit(|ledger| {
                ledger.table_mut(from).revoke_all(&removals);
                let table = ledger.table_mut(to);
                for member in members {
                    table.grant(GrantTarget::Member(member.id.clone()), marker);
                }
                for role in roles {
                    table.grant(GrantTarget::Role(role.clone()), marker);
                }
            })?;
            info!(
                community_id = %self.community_id,
                %from,
                %to,
                members = members.len(),
                roles = roles.len(),
                expires = %marker,
                "Grants reassigned"
            );
        }

        let mark_report = MarkReport {
            kind: to,
            marker,
            members: members.iter().map(|m| m.name.clone()).collect(),
            roles: roles.to_vec(),
        };
        Ok((unmark_report, mark_report))
    }

    /// Work out which entries an unmark removes and what it reports, without
    /// touching the ledger.
    fn plan_unmark(
        &self,
        members: &[Member],
        roles: &[RoleName],
        kind: GrantKind,
    ) -> (Vec<GrantTarget>, UnmarkReport) {
        let now = self.now();
        let table = self.ledger.table(kind);

        let mut removals = Vec::new();
        let mut unmarked = Vec::new();
        let mut still_marked = Vec::new();

        for member in members {
            let evaluation = resolver::evaluate(table, &member.id, &member.roles, now);
            removals.extend(evaluation.expired.iter().cloned());
            if evaluation.has_live_direct() {
                unmarked.push(member.name.clone());
            }
            let keeps_role_grant = evaluation.live.iter().any(|(target, _)| {
                matches!(target, GrantTarget::Role(role) if !roles.contains(role))
            });
            if keeps_role_grant {
                still_marked.push(member.name.clone());
            }
            removals.push(GrantTarget::Member(member.id.clone()));
        }

        for role in roles {
            let target = GrantTarget::Role(role.clone());
            if resolver::evaluate_target(table, &target, now).is_active() {
                unmarked.push(role.to_string());
            }
            removals.push(target);
        }

        let report = UnmarkReport {
            kind,
            unmarked,
            still_marked,
        };
        (removals, report)
    }

    /// Members of `roster` currently marked under `kind`, with the time left on
    /// their longest-lasting grant.
    pub fn list_marked(&mut self, roster: &[Member], kind: GrantKind) -> Result<Vec<MarkedMember>> {
        let now = self.now();
        let table = self.ledger.table(kind);

        let mut expired = BTreeSet::new();
        let mut marked = Vec::new();
        for member in roster {
            let evaluation = resolver::evaluate(table, &member.id, &member.roles, now);
            expired.extend(evaluation.expired.iter().cloned());
            if let Some(marker) = evaluation.strongest() {
                marked.push(MarkedMember {
                    id: member.id.clone(),
                    name: member.name.clone(),
                    marker,
                    remaining: marker.remaining(now),
                });
            }
        }

        let expired: Vec<GrantTarget> = expired.into_iter().collect();
        self.prune(kind, &expired)?;
        Ok(marked)
    }
}
