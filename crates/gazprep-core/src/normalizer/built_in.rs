//! Built-in normalization steps for gazetteer records
//!
//! Copyright (c) 2025 Gazprep Team
//! Licensed under the MIT OR Apache-2.0 license

use super::types::NormalizationStep;
use crate::fields;
use std::collections::{BTreeSet, HashMap};

/// Short codes stored in place of verbose `name_type` values
pub fn name_type_codes() -> HashMap<String, String> {
    let mut mappings = HashMap::new();
    mappings.insert("abbrev".to_string(), "A".to_string());
    mappings.insert("name".to_string(), "N".to_string());
    mappings
}

/// Write `geo` from `lat` and `lon`
pub fn geo_synthesis(remove_source: bool) -> NormalizationStep {
    NormalizationStep::GeoSynthesis {
        lat_field: fields::LAT.to_string(),
        lon_field: fields::LON.to_string(),
        target_field: fields::GEO.to_string(),
        remove_source,
    }
}

/// Compact `name_type` to its one-letter code
pub fn name_type_compaction() -> NormalizationStep {
    NormalizationStep::EnumMapping {
        field: fields::NAME_TYPE.to_string(),
        mappings: name_type_codes(),
    }
}

/// Flag names shorter than `threshold` characters
pub fn short_name_flag(threshold: usize) -> NormalizationStep {
    NormalizationStep::ShortNameFlag { threshold }
}

/// Flag names matching one of `terms`
pub fn stop_term_flag(terms: BTreeSet<String>) -> NormalizationStep {
    NormalizationStep::StopTermFlag { terms }
}

/// Flag short word-and-digits names
pub fn short_alphanumeric_flag() -> NormalizationStep {
    NormalizationStep::ShortAlphanumericFlag {
        max_length: fields::DEFAULT_SHORT_ALPHANUMERIC_LENGTH,
    }
}

/// Expand the `script` list
pub fn script_fan_out() -> NormalizationStep {
    NormalizationStep::ScriptFanOut
}
