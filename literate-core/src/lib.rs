//! Narrative object extraction and reconciliation.
//!
//! This crate provides:
//! - The entity model: narrative objects, relationships and their collection
//! - An extraction pipeline that turns unreliable model output into objects
//! - Merge logic that grows the collection without losing earlier objects
//! - A debounced, single-flight orchestrator for continuously edited text
//! - JSON persistence of the collection
//!
//! # Quick Start
//!
//! ```ignore
//! use literate_core::{spawn_orchestrator, LiterateConfig, ObjectManager};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = LiterateConfig::from_env()?;
//!     let model = Arc::new(config.build_model()?);
//!     let manager = ObjectManager::open(config.save_file.clone()).await;
//!
//!     let (handle, mut events) =
//!         spawn_orchestrator(model, manager, config.orchestrator_config());
//!     handle.text_changed("Alice met Bob at the old library.").await?;
//!
//!     while let Some(event) = events.recv().await {
//!         println!("{event:?}");
//!     }
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod extraction;
pub mod manager;
pub mod model;
pub mod narrative;
pub mod orchestrator;
pub mod persist;
pub mod prompts;
pub mod testing;

// Primary public API
pub use config::{ConfigError, LiterateConfig};
pub use extraction::{NarrativeParser, ParseError};
pub use manager::{ObjectManager, ObjectSummary, UpdateError, UpdateResult};
pub use model::{LlmNarrativeModel, NarrativeModel};
pub use narrative::{
    CollectionStatistics, MergeStats, NarrativeObject, ObjectCollection, Relationship,
};
pub use orchestrator::{
    spawn_orchestrator, OrchestratorConfig, OrchestratorError, OrchestratorEvent,
    OrchestratorHandle,
};
pub use persist::{CollectionSnapshot, PersistError};
pub use testing::{MockModel, MockReply};
