//! Property-based testing strategies for generating gazetteer records
//!
//! These strategies produce random but plausible records and configurations
//! for property tests of the admission filter and the normalizer.

#![cfg(test)]

use crate::config::{IncludePolicy, MissingCategoryPolicy, StageConfig, StageConfigBuilder};
use crate::record::JsonRecord;
use proptest::collection::btree_set;
use proptest::option;
use proptest::prelude::*;
use serde_json::{Map, Value};

/// Strategy for category values, including the default category
pub fn category_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("general".to_string()),
        Just("A".to_string()),
        Just("B".to_string()),
        "[A-Za-z]{1,8}",
    ]
}

/// Strategy for coordinate text as it appears in source data
pub fn coordinate_strategy() -> impl Strategy<Value = String> {
    (-180.0f64..180.0).prop_map(|c| format!("{:.4}", c))
}

/// Strategy for name_type values, recognized and not
pub fn name_type_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("abbrev".to_string()),
        Just("name".to_string()),
        Just("A".to_string()),
        Just("N".to_string()),
        "[a-z]{1,6}",
    ]
}

/// Strategy for include policies
pub fn include_policy_strategy() -> impl Strategy<Value = IncludePolicy> {
    prop_oneof![
        Just(IncludePolicy::Unrestricted),
        Just(IncludePolicy::All),
        btree_set(category_strategy(), 1..4).prop_map(IncludePolicy::Set),
    ]
}

/// Strategy for whole stage configurations
pub fn stage_config_strategy() -> impl Strategy<Value = StageConfig> {
    (
        include_policy_strategy(),
        prop_oneof![
            Just(MissingCategoryPolicy::DefaultCategory),
            Just(MissingCategoryPolicy::AlwaysInclude),
        ],
        0usize..5,    // short_name_threshold
        any::<bool>(), // flag_short_names
        any::<bool>(), // remove_source_lat_lon
        any::<bool>(), // expand_scripts
        any::<bool>(), // flag_short_alphanumeric
    )
        .prop_map(|(policy, missing, threshold, flag, remove, expand, alnum)| {
            StageConfigBuilder::new()
                .include_policy(policy)
                .missing_category(missing)
                .short_name_threshold(threshold)
                .flag_short_names(flag)
                .remove_source_lat_lon(remove)
                .expand_scripts(expand)
                .flag_short_alphanumeric(alnum)
                .stop_terms(["hotel", "airport"])
                .build()
                .expect("generated configuration is valid")
        })
}

/// Strategy for records with any subset of the relevant fields
pub fn record_strategy() -> impl Strategy<Value = JsonRecord> {
    (
        option::of(category_strategy()),
        option::of("[A-Za-z0-9 .]{0,12}"),
        option::of(coordinate_strategy()),
        option::of(coordinate_strategy()),
        option::of(name_type_strategy()),
        option::of(prop_oneof![
            Just("[LATIN]".to_string()),
            Just("[LATIN,ARABIC]".to_string()),
            Just("CJK".to_string()),
        ]),
    )
        .prop_map(|(category, name, lat, lon, name_type, script)| {
            let mut fields = Map::new();
            let entries = [
                ("SplitCategory", category),
                ("name", name),
                ("lat", lat),
                ("lon", lon),
                ("name_type", name_type),
                ("script", script),
            ];
            for (field, value) in entries {
                if let Some(value) = value {
                    fields.insert(field.to_string(), Value::String(value));
                }
            }
            JsonRecord::from(fields)
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::admission::AdmissionFilter;
    use crate::normalizer::FieldNormalizer;
    use crate::record::RecordAccessor;

    proptest! {
        #[test]
        fn test_record_strategy_generates_objects(record in record_strategy()) {
            assert!(record.len() <= 6);
        }

        #[test]
        fn test_unrestricted_always_includes(record in record_strategy()) {
            let config = StageConfig::default();
            assert!(AdmissionFilter::new(&config).evaluate(&record).is_include());
        }

        #[test]
        fn test_normalizer_is_idempotent(
            config in stage_config_strategy(),
            record in record_strategy(),
        ) {
            let normalizer = FieldNormalizer::from_config(&config);
            let mut once = record.clone();
            normalizer.apply(&mut once);
            let mut twice = once.clone();
            normalizer.apply(&mut twice);
            prop_assert_eq!(once, twice);
        }

        #[test]
        fn test_geo_only_with_both_coordinates(
            config in stage_config_strategy(),
            record in record_strategy(),
        ) {
            let had_both = record.has("lat") && record.has("lon");
            let mut record = record;
            FieldNormalizer::from_config(&config).apply(&mut record);
            prop_assert_eq!(record.has("geo"), had_both);
        }
    }
}
