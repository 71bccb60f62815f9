//! Entity model: narrative objects, relationships and the collection that owns them.

mod collection;
mod object;

pub use collection::{CollectionStatistics, MergeOutcome, MergeStats, ObjectCollection};
pub use object::{NarrativeObject, Relationship};
