//! Community Types

use std::fmt;

use serde::{Deserialize, Serialize};

/// Community (server) identity.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CommunityId(pub String);

impl CommunityId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CommunityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for CommunityId {
    fn from(value: &str) -> Self {
        Self(value.to_owned())
    }
}

/// A community the bot has joined.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Community {
    /// Community ID.
    pub id: CommunityId,
    /// Community name.
    pub name: String,
}

impl Community {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: CommunityId::new(id),
            name: name.into(),
        }
    }
}
