//! The name-keyed collection of narrative objects and its merge logic.

use super::object::NarrativeObject;
use serde::Serialize;
use std::collections::{HashMap, HashSet};

/// What happened to a single object passed to [`ObjectCollection::add_or_update`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeOutcome {
    Added,
    Updated,
    Unchanged,
}

/// Change counts from one merge.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MergeStats {
    pub added: usize,
    pub updated: usize,
    pub unchanged: usize,
    pub removed: usize,
}

impl MergeStats {
    /// Whether the merge changed anything.
    pub fn has_changes(&self) -> bool {
        self.added + self.updated + self.removed > 0
    }

    fn record(&mut self, outcome: MergeOutcome) {
        match outcome {
            MergeOutcome::Added => self.added += 1,
            MergeOutcome::Updated => self.updated += 1,
            MergeOutcome::Unchanged => self.unchanged += 1,
        }
    }
}

/// Summary numbers over the whole collection.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CollectionStatistics {
    pub total_objects: usize,
    pub total_relationships: usize,
    pub average_relationships: f64,
    pub objects_with_relationships: usize,
    /// Name of the object seen first.
    pub oldest: Option<String>,
    /// Name of the object seen most recently.
    pub newest: Option<String>,
}

/// Every narrative object known so far, keyed by name.
///
/// Mutated only through [`add_or_update`](Self::add_or_update),
/// [`remove`](Self::remove), [`merge_from_list`](Self::merge_from_list) and
/// [`replace`](Self::replace).
#[derive(Debug, Clone, Default)]
pub struct ObjectCollection {
    objects: HashMap<String, NarrativeObject>,
}

impl ObjectCollection {
    /// Create an empty collection.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.objects.contains_key(name)
    }

    /// Get an object by exact name.
    pub fn get(&self, name: &str) -> Option<&NarrativeObject> {
        self.objects.get(name)
    }

    /// Iterate over all objects in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = &NarrativeObject> {
        self.objects.values()
    }

    /// Clone out every object.
    pub fn list_all(&self) -> Vec<NarrativeObject> {
        self.objects.values().cloned().collect()
    }

    /// All object names.
    pub fn names(&self) -> HashSet<&str> {
        self.objects.keys().map(String::as_str).collect()
    }

    /// Insert a new object or update the existing one with the same name.
    pub fn add_or_update(&mut self, obj: NarrativeObject) -> MergeOutcome {
        match self.objects.get_mut(&obj.name) {
            Some(existing) => {
                if existing.update_from(&obj) {
                    MergeOutcome::Updated
                } else {
                    MergeOutcome::Unchanged
                }
            }
            None => {
                self.objects.insert(obj.name.clone(), obj);
                MergeOutcome::Added
            }
        }
    }

    /// Remove an object by name, returning it if it existed.
    pub fn remove(&mut self, name: &str) -> Option<NarrativeObject> {
        self.objects.remove(name)
    }

    pub fn clear(&mut self) {
        self.objects.clear();
    }

    /// Merge a freshly extracted list into the collection.
    ///
    /// Objects not mentioned in `new_objects` are kept unless `remove_missing`
    /// is set. A name that appears twice in `new_objects` is added once and
    /// counted as an update (or unchanged) the second time.
    pub fn merge_from_list(
        &mut self,
        new_objects: Vec<NarrativeObject>,
        remove_missing: bool,
    ) -> MergeStats {
        let mut stats = MergeStats::default();
        let incoming: HashSet<String> = new_objects.iter().map(|o| o.name.clone()).collect();

        for obj in new_objects {
            stats.record(self.add_or_update(obj));
        }

        if remove_missing {
            let before = self.objects.len();
            self.objects.retain(|name, _| incoming.contains(name));
            stats.removed = before - self.objects.len();
        }

        stats
    }

    /// Atomically swap the object called `old_name` for `new_object`.
    ///
    /// Returns the merge outcome for the new object, or `None` (and changes
    /// nothing) if `old_name` is not present.
    pub fn replace(&mut self, old_name: &str, new_object: NarrativeObject) -> Option<MergeOutcome> {
        self.objects.remove(old_name)?;
        Some(self.add_or_update(new_object))
    }

    /// Objects ordered most recently updated first; ties break by name.
    pub fn sorted_by_recency(&self) -> Vec<&NarrativeObject> {
        let mut objects: Vec<_> = self.objects.values().collect();
        objects.sort_by(|a, b| {
            b.last_updated
                .cmp(&a.last_updated)
                .then_with(|| a.name.cmp(&b.name))
        });
        objects
    }

    pub fn statistics(&self) -> CollectionStatistics {
        if self.objects.is_empty() {
            return CollectionStatistics::default();
        }

        let total_relationships: usize = self.iter().map(|o| o.relationships.len()).sum();
        let objects_with_relationships = self.iter().filter(|o| !o.relationships.is_empty()).count();

        let oldest = self
            .iter()
            .min_by(|a, b| a.first_seen.cmp(&b.first_seen).then_with(|| a.name.cmp(&b.name)))
            .map(|o| o.name.clone());
        let newest = self
            .iter()
            .max_by(|a, b| a.first_seen.cmp(&b.first_seen).then_with(|| b.name.cmp(&a.name)))
            .map(|o| o.name.clone());

        CollectionStatistics {
            total_objects: self.objects.len(),
            total_relationships,
            average_relationships: total_relationships as f64 / self.objects.len() as f64,
            objects_with_relationships,
            oldest,
            newest,
        }
    }
}

impl FromIterator<NarrativeObject> for ObjectCollection {
    fn from_iter<I: IntoIterator<Item = NarrativeObject>>(iter: I) -> Self {
        let mut collection = Self::new();
        for obj in iter {
            collection.add_or_update(obj);
        }
        collection
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::narrative::Relationship;
    use chrono::{Duration, Utc};

    fn obj(name: &str, description: &str) -> NarrativeObject {
        NarrativeObject::new(name, description, Vec::new())
    }

    #[test]
    fn test_merge_into_empty() {
        let mut collection = ObjectCollection::new();
        let stats = collection.merge_from_list(vec![obj("Alice", "A scientist")], false);

        assert_eq!(
            stats,
            MergeStats {
                added: 1,
                updated: 0,
                unchanged: 0,
                removed: 0
            }
        );
        assert_eq!(collection.len(), 1);
    }

    #[test]
    fn test_merge_same_list_twice() {
        let mut collection = ObjectCollection::new();
        let list = || vec![obj("Alice", "A scientist"), obj("Bob", "A pilot")];

        collection.merge_from_list(list(), false);
        let stats = collection.merge_from_list(list(), false);

        assert_eq!(stats.added, 0);
        assert_eq!(stats.updated, 0);
        assert_eq!(stats.unchanged, 2);
        assert!(!stats.has_changes());
    }

    #[test]
    fn test_merge_preserves_missing_by_default() {
        let mut collection = ObjectCollection::new();
        collection.merge_from_list(vec![obj("Alice", "A scientist")], false);

        let stats = collection.merge_from_list(vec![obj("Castle", "An old fortress")], false);
        assert_eq!(stats.added, 1);
        assert_eq!(stats.removed, 0);
        assert_eq!(collection.len(), 2);
        assert!(collection.contains("Alice"));
    }

    #[test]
    fn test_merge_remove_missing() {
        let mut collection = ObjectCollection::new();
        collection.merge_from_list(
            vec![obj("Alice", "A scientist"), obj("Bob", "A pilot"), obj("Eve", "A spy")],
            false,
        );

        let stats = collection.merge_from_list(vec![obj("Bob", "A pilot")], true);
        assert_eq!(stats.removed, 2);
        assert_eq!(stats.unchanged, 1);
        assert_eq!(collection.names(), ["Bob"].into_iter().collect());
    }

    #[test]
    fn test_merge_updates_description() {
        let mut collection = ObjectCollection::new();
        collection.merge_from_list(vec![obj("Alice", "A scientist")], false);

        let stats = collection.merge_from_list(vec![obj("Alice", "A retired scientist")], false);
        assert_eq!(stats.updated, 1);
        assert_eq!(collection.get("Alice").unwrap().description, "A retired scientist");
    }

    #[test]
    fn test_duplicate_names_in_one_list() {
        let mut collection = ObjectCollection::new();
        let stats = collection.merge_from_list(
            vec![obj("Alice", "A scientist"), obj("Alice", "A pilot")],
            false,
        );

        assert_eq!(stats.added, 1);
        assert_eq!(stats.updated, 1);
        assert_eq!(collection.len(), 1);
        assert_eq!(collection.get("Alice").unwrap().description, "A pilot");
    }

    #[test]
    fn test_replace() {
        let mut collection = ObjectCollection::new();
        collection.merge_from_list(vec![obj("Alice", "A scientist"), obj("Bob", "A pilot")], false);

        let outcome = collection.replace("Alice", obj("Alice Smith", "A physicist"));
        assert_eq!(outcome, Some(MergeOutcome::Added));
        assert!(!collection.contains("Alice"));
        assert!(collection.contains("Alice Smith"));
        assert_eq!(collection.get("Bob").unwrap().description, "A pilot");

        assert_eq!(collection.replace("Nobody", obj("Nobody", "Ghost")), None);
        assert!(!collection.contains("Nobody"));
        assert_eq!(collection.len(), 2);
    }

    #[test]
    fn test_sorted_by_recency() {
        let now = Utc::now();
        let collection: ObjectCollection = [
            obj("Old", "Seen long ago").with_timestamps(now - Duration::hours(2), now - Duration::hours(2)),
            obj("New", "Seen just now").with_timestamps(now - Duration::hours(2), now),
            obj("Mid", "Seen a while ago").with_timestamps(now - Duration::hours(1), now - Duration::hours(1)),
        ]
        .into_iter()
        .collect();

        let names: Vec<_> = collection.sorted_by_recency().iter().map(|o| o.name.as_str()).collect();
        assert_eq!(names, vec!["New", "Mid", "Old"]);
    }

    #[test]
    fn test_statistics() {
        let now = Utc::now();
        let collection: ObjectCollection = [
            obj("Alice", "A scientist")
                .with_relationship(Relationship::new("Bob", "colleague"))
                .with_relationship(Relationship::new("Lab", "works in"))
                .with_timestamps(now - Duration::hours(3), now),
            obj("Bob", "A pilot").with_timestamps(now - Duration::hours(1), now),
        ]
        .into_iter()
        .collect();

        let stats = collection.statistics();
        assert_eq!(stats.total_objects, 2);
        assert_eq!(stats.total_relationships, 2);
        assert_eq!(stats.objects_with_relationships, 1);
        assert!((stats.average_relationships - 1.0).abs() < f64::EPSILON);
        assert_eq!(stats.oldest.as_deref(), Some("Alice"));
        assert_eq!(stats.newest.as_deref(), Some("Bob"));
    }

    #[test]
    fn test_statistics_empty() {
        let stats = ObjectCollection::new().statistics();
        assert_eq!(stats, CollectionStatistics::default());
    }
}
