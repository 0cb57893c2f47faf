//! Team model.
//!
//! A team is a pure roster entity: it carries a stable identifier and the
//! public handle (team number or slug) used on printed schedules. Teams
//! have no scheduling behavior of their own.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Public team handle: a competition number or a slug.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TeamHandle {
    /// Numeric team number (e.g., `1234`).
    Number(u32),
    /// Text slug (e.g., `"robo-lions"`).
    Slug(String),
}

impl fmt::Display for TeamHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TeamHandle::Number(n) => write!(f, "{n}"),
            TeamHandle::Slug(s) => f.write_str(s),
        }
    }
}

/// A team to be scheduled.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Team {
    /// Unique team identifier (storage key).
    pub id: String,
    /// Public handle.
    pub handle: TeamHandle,
}

impl Team {
    /// Creates a team identified by a competition number.
    pub fn numbered(id: impl Into<String>, number: u32) -> Self {
        Self {
            id: id.into(),
            handle: TeamHandle::Number(number),
        }
    }

    /// Creates a team identified by a slug.
    pub fn slugged(id: impl Into<String>, slug: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            handle: TeamHandle::Slug(slug.into()),
        }
    }
}
