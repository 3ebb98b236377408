//! Gazprep Core - Admission filtering and field normalization for gazetteer records
//!
//! This crate provides the per-record stage a search-indexing pipeline runs
//! immediately before a record is committed to the index. For each added record
//! the stage decides whether it is indexed at all and, if so, derives a few
//! fields on it.
//!
//! # Main Components
//!
//! - **Record Access**: [`RecordAccessor`] and the [`JsonRecord`] adapter
//! - **Configuration**: [`StageParams`] from the host, resolved into an immutable [`StageConfig`]
//! - **Admission**: [`AdmissionFilter`] producing a [`Verdict`]
//! - **Normalization**: [`FieldNormalizer`] (geo synthesis, name-type compaction, search-only flags)
//! - **Lifecycle**: [`ProcessingStage`] handling add/delete/merge/commit/rollback/finish
//!
//! # Example
//!
//! ```
//! use gazprep_core::{JsonRecord, ProcessingStage, RecordAccessor, StageConfigBuilder, Verdict};
//! use serde_json::json;
//!
//! fn example() -> gazprep_core::Result<()> {
//!     let config = StageConfigBuilder::new().include_categories(["A"]).build()?;
//!     let stage = ProcessingStage::new(config);
//!
//!     let mut record = JsonRecord::from_value(json!({
//!         "SplitCategory": "A",
//!         "lat": "1",
//!         "lon": "2",
//!         "name": "Al",
//!         "name_type": "abbrev"
//!     }))?;
//!
//!     assert_eq!(stage.on_add(&mut record), Verdict::Include);
//!     assert_eq!(record.get("geo").as_deref(), Some("1,2"));
//!     assert_eq!(record.get("name_type").as_deref(), Some("A"));
//!     Ok(())
//! }
//! # example().unwrap();
//! ```

pub mod admission;
pub mod config;
pub mod error;
pub mod fields;
pub mod normalizer;
pub mod record;
pub mod stage;

#[cfg(test)]
mod proptest_strategies;

// Re-export main types for convenience
pub use admission::{AdmissionFilter, ExclusionReason, Verdict};
pub use config::{
    IncludePolicy, MissingCategoryPolicy, StageConfig, StageConfigBuilder, StageParams,
};
pub use error::{Error, Result};
pub use normalizer::{AppliedChange, FieldNormalizer, NormalizationReport, NormalizationStep};
pub use record::{JsonRecord, RecordAccessor};
pub use stage::{
    AddOutcome, EventOutcome, LifecycleEvent, ProcessingStage, StatsSnapshot, UpdateProcessor,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
