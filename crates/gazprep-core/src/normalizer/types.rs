//! Core types for the field normalizer
//!
//! Copyright (c) 2025 Gazprep Team
//! Licensed under the MIT OR Apache-2.0 license

use serde::Serialize;
use std::collections::{BTreeSet, HashMap};

/// One normalization applied to an admitted record
#[derive(Debug, Clone, PartialEq)]
pub enum NormalizationStep {
    /// Merge latitude and longitude into a single `"<lat>,<lon>"` field
    GeoSynthesis {
        lat_field: String,
        lon_field: String,
        target_field: String,
        /// Remove the source fields once the target is written
        remove_source: bool,
    },
    /// Rewrite recognized values of a field; unrecognized values stay as they are
    EnumMapping {
        field: String,
        mappings: HashMap<String, String>,
    },
    /// Flag names shorter than `threshold` characters as search-only
    ShortNameFlag { threshold: usize },
    /// Flag names that match a stop term as search-only
    StopTermFlag { terms: BTreeSet<String> },
    /// Flag names of at most `max_length` characters that mix a word with
    /// trailing digits, such as `"ab 123"`. Administrative areas and
    /// populated places are exempt.
    ShortAlphanumericFlag { max_length: usize },
    /// Split a bracketed script list and copy the name into script-specific fields
    ScriptFanOut,
}

impl NormalizationStep {
    /// Short name used in logs
    pub fn name(&self) -> &'static str {
        match self {
            NormalizationStep::GeoSynthesis { .. } => "geo_synthesis",
            NormalizationStep::EnumMapping { .. } => "enum_mapping",
            NormalizationStep::ShortNameFlag { .. } => "short_name_flag",
            NormalizationStep::StopTermFlag { .. } => "stop_term_flag",
            NormalizationStep::ShortAlphanumericFlag { .. } => "short_alphanumeric_flag",
            NormalizationStep::ScriptFanOut => "script_fan_out",
        }
    }

    /// Whether this step can mark a record search-only
    pub fn sets_search_only(&self) -> bool {
        matches!(
            self,
            NormalizationStep::ShortNameFlag { .. }
                | NormalizationStep::StopTermFlag { .. }
                | NormalizationStep::ShortAlphanumericFlag { .. }
        )
    }
}

/// A change the normalizer made to a record
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "step", rename_all = "snake_case")]
pub enum AppliedChange {
    /// `geo` was written; `removed_source` tells whether lat/lon were dropped
    GeoSynthesized { geo: String, removed_source: bool },
    /// A field value was rewritten through an enum mapping
    ValueMapped { field: String, from: String, to: String },
    /// The name was shorter than the threshold
    FlaggedShortName { name: Option<String> },
    /// The name matched a stop term
    FlaggedStopTerm { name: String, term: String },
    /// The name is a short word-and-digits code
    FlaggedShortAlphanumeric { name: String },
    /// A `search_only` value from the source was removed because no flag applied
    SearchOnlyCleared { previous: String },
    /// The script list was split and the name copied to script fields
    ScriptsExpanded { scripts: Vec<String> },
}

/// Everything the normalizer changed on one record
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct NormalizationReport {
    pub changes: Vec<AppliedChange>,
}

impl NormalizationReport {
    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    /// Whether this pass marked the record search-only
    pub fn flagged_search_only(&self) -> bool {
        self.changes.iter().any(|c| {
            matches!(
                c,
                AppliedChange::FlaggedShortName { .. }
                    | AppliedChange::FlaggedStopTerm { .. }
                    | AppliedChange::FlaggedShortAlphanumeric { .. }
            )
        })
    }

    pub(crate) fn push(&mut self, change: AppliedChange) {
        self.changes.push(change);
    }
}
