//! Field normalization for admitted records
//!
//! Once a record has been admitted, the normalizer derives and rewrites a small
//! set of fields in place:
//!
//! - **Geo synthesis**: `lat` and `lon` become `geo = "<lat>,<lon>"`
//! - **Name-type compaction**: `abbrev` becomes `A`, `name` becomes `N`
//! - **Short-name flag**: names below the length threshold get `search_only = "true"`
//! - **Stop-term flag**: names matching a stop term get `search_only = "true"`;
//!   short names are compared again with their diacritics folded
//! - **Short-alphanumeric flag** (opt-in): codes like `"ab 123"` get
//!   `search_only = "true"` unless the feature is a place or administrative area
//! - **Script fan-out**: `script = "[LATIN,ARABIC]"` becomes a multi-valued field
//!   and the name is copied to `name_ar` / `name_cjk`
//!
//! A stale `search_only` from the source is dropped when no flag applies.
//!
//! # Module Organization
//!
//! - [`types`] - Steps and the report of applied changes
//! - [`pipeline`] - The [`FieldNormalizer`] itself
//! - [`built_in`] - Pre-configured steps for gazetteer records
//!
//! # Example
//!
//! ```
//! use gazprep_core::{FieldNormalizer, JsonRecord, RecordAccessor, StageConfig};
//! use serde_json::json;
//!
//! let normalizer = FieldNormalizer::from_config(&StageConfig::default());
//! let mut record = JsonRecord::from_value(json!({
//!     "name": "Springfield",
//!     "lat": "10.0",
//!     "lon": "20.0",
//!     "name_type": "name"
//! })).unwrap();
//!
//! normalizer.apply(&mut record);
//! assert_eq!(record.get("geo").as_deref(), Some("10.0,20.0"));
//! assert_eq!(record.get("name_type").as_deref(), Some("N"));
//! ```
//!
//! Copyright (c) 2025 Gazprep Team
//! Licensed under the MIT OR Apache-2.0 license

pub mod types;

pub mod pipeline;

pub mod built_in;


pub use pipeline::{fold_diacritics, normalize_term, parse_scripts, FieldNormalizer};
pub use types::{AppliedChange, NormalizationReport, NormalizationStep};
