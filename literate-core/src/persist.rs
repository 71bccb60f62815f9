//! Saving and loading the object collection as JSON.
//!
//! The file is a mapping from object name to object plus an informational
//! count:
//!
//! ```text
//! {"objects": {"Alice": {"name": "Alice", "description": "...",
//!              "relationships": [...], "first_seen": "...",
//!              "last_updated": "..."}},
//!  "count": 1}
//! ```

use crate::narrative::{NarrativeObject, ObjectCollection, Relationship};
use chrono::{DateTime, Local, NaiveDateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use thiserror::Error;
use tokio::fs;

/// Errors from persistence operations.
#[derive(Debug, Error)]
pub enum PersistError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid timestamp '{value}' on object '{name}'")]
    InvalidTimestamp { name: String, value: String },
}

/// The on-disk form of a collection.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CollectionSnapshot {
    pub objects: BTreeMap<String, StoredObject>,
    /// Number of objects when saved. Not used on load.
    #[serde(default)]
    pub count: usize,
}

/// The on-disk form of one object.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredObject {
    #[serde(default)]
    pub name: String,
    pub description: String,
    #[serde(default)]
    pub relationships: Vec<Relationship>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_seen: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<String>,
}

impl CollectionSnapshot {
    /// Capture the current state of a collection.
    pub fn from_collection(collection: &ObjectCollection) -> Self {
        let objects: BTreeMap<_, _> = collection
            .iter()
            .map(|obj| {
                let stored = StoredObject {
                    name: obj.name.clone(),
                    description: obj.description.clone(),
                    relationships: obj.relationships.clone(),
                    first_seen: Some(obj.first_seen.to_rfc3339()),
                    last_updated: Some(obj.last_updated.to_rfc3339()),
                };
                (obj.name.clone(), stored)
            })
            .collect();

        Self {
            count: objects.len(),
            objects,
        }
    }

    /// Rebuild a collection. Missing timestamps default to now.
    pub fn into_collection(self) -> Result<ObjectCollection, PersistError> {
        let now = Utc::now();
        let mut collection = ObjectCollection::new();

        for (key, stored) in self.objects {
            let name = if stored.name.is_empty() { key } else { stored.name };

            let first_seen = match &stored.first_seen {
                Some(value) => parse_timestamp(value).ok_or_else(|| PersistError::InvalidTimestamp {
                    name: name.clone(),
                    value: value.clone(),
                })?,
                None => now,
            };
            let last_updated = match &stored.last_updated {
                Some(value) => parse_timestamp(value).ok_or_else(|| PersistError::InvalidTimestamp {
                    name: name.clone(),
                    value: value.clone(),
                })?,
                None => now,
            };

            let obj = NarrativeObject::new(name, stored.description, stored.relationships)
                .with_timestamps(first_seen, last_updated);
            collection.add_or_update(obj);
        }

        Ok(collection)
    }

    /// Save to a JSON file.
    pub async fn save_json(&self, path: impl AsRef<Path>) -> Result<(), PersistError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json).await?;
        Ok(())
    }

    /// Load from a JSON file.
    pub async fn load_json(path: impl AsRef<Path>) -> Result<Self, PersistError> {
        let json = fs::read_to_string(path).await?;
        let snapshot = serde_json::from_str(&json)?;
        Ok(snapshot)
    }
}

/// Parse an RFC 3339 timestamp, or a naive ISO-8601 one taken as local time.
pub fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc));
    }

    let naive = NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f").ok()?;
    Local
        .from_local_datetime(&naive)
        .earliest()
        .map(|dt| dt.with_timezone(&Utc))
}

/// Save a collection to a JSON file.
pub async fn save_collection(collection: &ObjectCollection, path: impl AsRef<Path>) -> Result<(), PersistError> {
    CollectionSnapshot::from_collection(collection).save_json(path).await
}

/// Load a collection from a JSON file.
pub async fn load_collection(path: impl AsRef<Path>) -> Result<ObjectCollection, PersistError> {
    CollectionSnapshot::load_json(path).await?.into_collection()
}
