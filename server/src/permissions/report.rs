//! Results of mutations and listings, with their reply text.

use warden_common::{MemberId, RoleName};

use super::expiry::{ExpiryMarker, Remaining};
use super::kind::GrantKind;

/// Grants applied by one mark operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkReport {
    pub kind: GrantKind,
    pub marker: ExpiryMarker,
    /// Display names of the members marked.
    pub members: Vec<String>,
    pub roles: Vec<RoleName>,
}

impl MarkReport {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.members.is_empty() && self.roles.is_empty()
    }

    /// Human-readable summary, e.g. `Users "alice, bob" are banned until 2026-01-02 12:00 UTC`.
    #[must_use]
    pub fn summary(&self) -> String {
        let mut subject = Vec::new();
        if !self.members.is_empty() {
            subject.push(format!(
                "User{} \"{}\"",
                plural(self.members.len()),
                self.members.join(", ")
            ));
        }
        if !self.roles.is_empty() {
            let names: Vec<&str> = self.roles.iter().map(|r| r.as_str()).collect();
            subject.push(format!(
                "Role{} \"{}\"",
                plural(self.roles.len()),
                names.join(", ")
            ));
        }

        let verb = if self.members.len() + self.roles.len() > 1 { "are" } else { "is" };
        let until = match self.marker {
            ExpiryMarker::Never => "forever".to_owned(),
            ExpiryMarker::At(_) => format!("until {}", self.marker),
        };
        format!("{} {verb} {} {until}", subject.join(" and "), self.kind)
    }
}

/// Grants removed by one unmark operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnmarkReport {
    pub kind: GrantKind,
    /// Display names of members and roles whose live grant was removed.
    pub unmarked: Vec<String>,
    /// Members whose direct grant is gone but who still hold a marked role.
    pub still_marked: Vec<String>,
}

impl UnmarkReport {
    #[must_use]
    pub fn lines(&self) -> Vec<String> {
        let mut lines = Vec::new();
        if self.unmarked.is_empty() {
            lines.push(format!("Nothing to undo: none of them were {}.", self.kind));
        } else {
            lines.push(format!("\"{}\": No longer {}", self.unmarked.join(", "), self.kind));
        }
        if !self.still_marked.is_empty() {
            lines.push(format!(
                "\"{}\": still {} through a role",
                self.still_marked.join(", "),
                self.kind
            ));
        }
        lines
    }
}

/// One entry of a listing.
#[derive(Debug, Clone, PartialEq)]
pub struct MarkedMember {
    pub id: MemberId,
    pub name: String,
    pub marker: ExpiryMarker,
    pub remaining: Remaining,
}

const fn plural(count: usize) -> &'static str {
    if count > 1 {
        "s"
    } else {
        ""
    }
}
