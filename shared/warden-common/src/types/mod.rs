//! Shared Types

mod community;
mod member;

pub use community::{Community, CommunityId};
pub use member::{Member, MemberId, RoleName};
