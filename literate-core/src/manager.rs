//! The object manager: parse, filter, merge and persist.

use crate::extraction::{NarrativeParser, ParseError};
use crate::narrative::{CollectionStatistics, MergeStats, NarrativeObject, ObjectCollection};
use crate::persist::{self, PersistError};
use serde::Serialize;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Why an update did not apply.
#[derive(Debug, Clone, Error)]
pub enum UpdateError {
    #[error(transparent)]
    Model(#[from] llm_client::Error),

    #[error("Failed to convert response: {0}")]
    Parse(#[from] ParseError),

    #[error("Object '{name}' not found")]
    NotFound { name: String },

    #[error("No corrected version of '{name}' was produced")]
    NoCorrection { name: String },

    #[error("Another request is already in progress")]
    Busy,

    #[error("There is no text to work from")]
    NoText,

    #[error("Model call failed unexpectedly: {0}")]
    Crashed(String),
}

/// The outcome of one extraction or correction.
#[derive(Debug, Clone)]
pub struct UpdateResult {
    pub stats: MergeStats,
    /// Every object in the collection after the update.
    pub objects: Vec<NarrativeObject>,
    pub total_count: usize,
    pub error: Option<UpdateError>,
}

impl UpdateResult {
    pub fn success(&self) -> bool {
        self.error.is_none()
    }
}

/// One row of [`ObjectManager::summary`].
#[derive(Debug, Clone, Serialize)]
pub struct ObjectSummary {
    pub name: String,
    pub description: String,
    pub relationship_count: usize,
    pub last_updated: String,
}

/// Owns the collection and applies parsed model output to it.
#[derive(Debug, Default)]
pub struct ObjectManager {
    collection: ObjectCollection,
    parser: NarrativeParser,
    save_file: Option<PathBuf>,
    remove_missing: bool,
}

impl ObjectManager {
    /// Create an in-memory manager with no save file.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a manager that saves to `path` after every change.
    ///
    /// An existing file is loaded; if it cannot be read the manager starts
    /// empty and logs a warning.
    pub async fn with_save_file(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let mut manager = Self {
            save_file: Some(path.clone()),
            ..Self::default()
        };

        if path.exists() {
            match persist::load_collection(&path).await {
                Ok(collection) => {
                    tracing::info!(path = %path.display(), count = collection.len(), "loaded saved objects");
                    manager.collection = collection;
                }
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "failed to load saved objects, starting empty");
                }
            }
        }

        manager
    }

    /// Open a manager with an optional save file.
    pub async fn open(save_file: Option<PathBuf>) -> Self {
        match save_file {
            Some(path) => Self::with_save_file(path).await,
            None => Self::new(),
        }
    }

    pub fn with_remove_missing(mut self, remove_missing: bool) -> Self {
        self.remove_missing = remove_missing;
        self
    }

    pub fn save_file(&self) -> Option<&Path> {
        self.save_file.as_deref()
    }

    pub fn parser(&self) -> &NarrativeParser {
        &self.parser
    }

    pub fn collection(&self) -> &ObjectCollection {
        &self.collection
    }

    /// Apply a raw extraction response to the collection.
    pub async fn process_response(&mut self, raw: &str) -> UpdateResult {
        let objects = match self.parser.parse_response(raw) {
            Ok(objects) => objects,
            Err(e) => {
                tracing::warn!(error = %e, "could not convert extraction response");
                return self.failure(e.into());
            }
        };
        let objects = self.parser.validate_relationships(objects);

        let stats = self.collection.merge_from_list(objects, self.remove_missing);
        tracing::info!(
            added = stats.added,
            updated = stats.updated,
            unchanged = stats.unchanged,
            removed = stats.removed,
            total = self.collection.len(),
            "merged extraction"
        );

        self.autosave().await;
        self.result(stats)
    }

    /// Apply a raw correction response for the object called `name`.
    ///
    /// The first parsed object replaces `name`. Its relationships may point at
    /// any object already in the collection, or at itself.
    pub async fn apply_correction(&mut self, name: &str, raw: &str) -> UpdateResult {
        if !self.collection.contains(name) {
            return self.failure(UpdateError::NotFound {
                name: name.to_string(),
            });
        }

        let mut corrected = match self.parser.parse_response(raw) {
            Ok(objects) => match objects.into_iter().next() {
                Some(obj) => obj,
                None => {
                    return self.failure(UpdateError::NoCorrection {
                        name: name.to_string(),
                    })
                }
            },
            Err(e) => return self.failure(e.into()),
        };

        let mut names: HashSet<String> = self
            .collection
            .names()
            .into_iter()
            .map(str::to_string)
            .collect();
        names.insert(corrected.name.clone());
        let names: HashSet<&str> = names.iter().map(String::as_str).collect();
        corrected.retain_targets(&names);

        self.replace_object(name, corrected).await
    }

    /// Atomically replace the object called `old_name`.
    pub async fn replace_object(&mut self, old_name: &str, new_object: NarrativeObject) -> UpdateResult {
        let new_name = new_object.name.clone();
        match self.collection.replace(old_name, new_object) {
            Some(_) => {
                tracing::info!(old = old_name, new = %new_name, "replaced object");
                self.autosave().await;
                self.result(MergeStats {
                    updated: 1,
                    ..MergeStats::default()
                })
            }
            None => self.failure(UpdateError::NotFound {
                name: old_name.to_string(),
            }),
        }
    }

    /// Remove one object. Returns false if it did not exist.
    pub async fn remove_object(&mut self, name: &str) -> bool {
        let removed = self.collection.remove(name).is_some();
        if removed {
            self.autosave().await;
        }
        removed
    }

    /// Remove every object.
    pub async fn clear(&mut self) {
        self.collection.clear();
        self.autosave().await;
    }

    pub fn get_object(&self, name: &str) -> Option<&NarrativeObject> {
        self.collection.get(name)
    }

    /// Every object, most recently updated first.
    pub fn all_objects(&self) -> Vec<NarrativeObject> {
        self.collection
            .sorted_by_recency()
            .into_iter()
            .cloned()
            .collect()
    }

    pub fn object_count(&self) -> usize {
        self.collection.len()
    }

    /// Display rows, most recently updated first.
    pub fn summary(&self) -> Vec<ObjectSummary> {
        self.collection
            .sorted_by_recency()
            .into_iter()
            .map(|obj| ObjectSummary {
                name: obj.name.clone(),
                description: obj.description.clone(),
                relationship_count: obj.relationships.len(),
                last_updated: obj.last_updated.to_rfc3339(),
            })
            .collect()
    }

    pub fn statistics(&self) -> CollectionStatistics {
        self.collection.statistics()
    }

    /// Write the collection to the save file, if one is configured.
    pub async fn save(&self) -> Result<(), PersistError> {
        match &self.save_file {
            Some(path) => persist::save_collection(&self.collection, path).await,
            None => Ok(()),
        }
    }

    async fn autosave(&self) {
        if let Err(e) = self.save().await {
            tracing::warn!(error = %e, "failed to save objects");
        }
    }

    fn result(&self, stats: MergeStats) -> UpdateResult {
        UpdateResult {
            stats,
            objects: self.all_objects(),
            total_count: self.collection.len(),
            error: None,
        }
    }

    /// A failed result that leaves the collection as it is.
    pub fn failure(&self, error: UpdateError) -> UpdateResult {
        UpdateResult {
            stats: MergeStats::default(),
            objects: self.all_objects(),
            total_count: self.collection.len(),
            error: Some(error),
        }
    }
}

impl From<ObjectCollection> for ObjectManager {
    fn from(collection: ObjectCollection) -> Self {
        Self {
            collection,
            ..Self::default()
        }
    }
}
