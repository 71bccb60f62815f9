//! Narrative objects and the relationships between them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::hash::{Hash, Hasher};

/// A directed, described link from one object to another by name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Relationship {
    /// Name of the object this relationship points at.
    pub target: String,
    /// What the link means ("mentor of", "lives in").
    pub description: String,
}

impl Relationship {
    /// Create a new relationship.
    pub fn new(target: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            description: description.into(),
        }
    }
}

/// A named thing extracted from text: a person, place, item or event.
///
/// Two objects with the same name are the same logical object, whatever
/// their descriptions say. Names compare exactly and case-sensitively.
#[derive(Debug, Clone)]
pub struct NarrativeObject {
    /// Identity key.
    pub name: String,
    /// Current description.
    pub description: String,
    /// Outgoing relationships, in the order the model reported them.
    pub relationships: Vec<Relationship>,
    /// When this object was first extracted.
    pub first_seen: DateTime<Utc>,
    /// When the description or relationship set last actually changed.
    pub last_updated: DateTime<Utc>,
}

impl NarrativeObject {
    /// Create a new object stamped with the current time.
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        relationships: Vec<Relationship>,
    ) -> Self {
        let now = Utc::now();
        Self {
            name: name.into(),
            description: description.into(),
            relationships,
            first_seen: now,
            last_updated: now,
        }
    }

    /// Add a relationship.
    pub fn with_relationship(mut self, relationship: Relationship) -> Self {
        self.relationships.push(relationship);
        self
    }

    /// Override both timestamps, keeping `first_seen <= last_updated`.
    pub fn with_timestamps(mut self, first_seen: DateTime<Utc>, last_updated: DateTime<Utc>) -> Self {
        self.first_seen = first_seen;
        self.last_updated = last_updated.max(first_seen);
        self
    }

    /// The relationships as an order-insensitive set.
    pub fn relationship_set(&self) -> HashSet<&Relationship> {
        self.relationships.iter().collect()
    }

    /// Take the description and relationships from another object with the same name.
    ///
    /// Returns true if anything changed. `last_updated` is bumped only on a change.
    /// Objects with different names are never merged.
    pub fn update_from(&mut self, other: &NarrativeObject) -> bool {
        if self.name != other.name {
            return false;
        }

        let mut changed = false;

        if self.description != other.description {
            self.description = other.description.clone();
            changed = true;
        }

        if self.relationship_set() != other.relationship_set() {
            self.relationships = other.relationships.clone();
            changed = true;
        }

        if changed {
            self.last_updated = Utc::now().max(self.first_seen);
        }

        changed
    }

    /// Keep only relationships whose target is in `names`.
    ///
    /// Returns the number of relationships dropped.
    pub fn retain_targets(&mut self, names: &HashSet<&str>) -> usize {
        let before = self.relationships.len();
        self.relationships
            .retain(|rel| names.contains(rel.target.as_str()));
        before - self.relationships.len()
    }
}

impl PartialEq for NarrativeObject {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl Eq for NarrativeObject {}

impl Hash for NarrativeObject {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
    }
}
