//! Location model.
//!
//! Locations are the physical stations teams visit: judging rooms and
//! robot-game tables. The two pools are disjoint and never mixed; a
//! location's index within its pool is what windows and grids refer to.

use serde::{Deserialize, Serialize};

/// Location pool classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LocationKind {
    /// Judging room.
    Room,
    /// Robot-game table.
    Table,
}

/// A room or table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    /// Unique location identifier.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Pool this location belongs to.
    pub kind: LocationKind,
}

impl Location {
    /// Creates a new location.
    pub fn new(id: impl Into<String>, kind: LocationKind) -> Self {
        Self {
            id: id.into(),
            name: String::new(),
            kind,
        }
    }

    /// Creates a judging room.
    pub fn room(id: impl Into<String>) -> Self {
        Self::new(id, LocationKind::Room)
    }

    /// Creates a robot-game table.
    pub fn table(id: impl Into<String>) -> Self {
        Self::new(id, LocationKind::Table)
    }

    /// Sets the display name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Display name, falling back to the identifier.
    pub fn label(&self) -> &str {
        if self.name.is_empty() {
            &self.id
        } else {
            &self.name
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_location_builder() {
        let r = Location::room("r1").with_name("Blue Room");
        assert_eq!(r.kind, LocationKind::Room);
        assert_eq!(r.label(), "Blue Room");

        let t = Location::table("t1");
        assert_eq!(t.kind, LocationKind::Table);
        assert_eq!(t.label(), "t1");
    }
}
