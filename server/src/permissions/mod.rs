//! Time-bounded grants and the authorization policy built on them.
//!
//! - Ledger: per-community grant tables, one per kind, persisted as JSON
//! - Resolver: lazy expiry evaluation, pure
//! - Store: write-through ledger with pruning on read and rollback on failed saves
//! - Policy: owner > admin > moderator ladder plus the community allow-list

pub mod clock;
pub mod error;
pub mod expiry;
pub mod kind;
pub mod ledger;
pub mod policy;
pub mod report;
pub mod repository;
pub mod resolver;
pub mod store;

pub use clock::{Clock, ManualClock, SystemClock};
pub use error::GrantError;
pub use expiry::{ExpiryMarker, Remaining};
pub use kind::GrantKind;
pub use ledger::{GrantTable, GrantTarget, Ledger};
pub use policy::{is_server_authorized, Authorizer, Privilege};
pub use report::{MarkReport, MarkedMember, UnmarkReport};
pub use repository::{FileLedgerRepository, InMemoryLedgerRepository, LedgerRepository};
pub use resolver::{evaluate, Evaluation};
pub use store::GrantStore;
