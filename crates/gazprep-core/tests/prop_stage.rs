//! Property-based tests for the processing stage
//!
//! These verify invariants that must hold for every record and configuration.

use gazprep_core::{
    AdmissionFilter, IncludePolicy, JsonRecord, ProcessingStage, RecordAccessor,
    StageConfigBuilder,
};
use proptest::prelude::*;
use serde_json::{Map, Value};

/// Strategy for generating records with optional gazetteer fields
fn record_strategy() -> impl Strategy<Value = JsonRecord> {
    (
        proptest::option::of(prop_oneof![
            Just("A".to_string()),
            Just("B".to_string()),
            Just("general".to_string()),
            Just(String::new()),
        ]),
        proptest::option::of("[A-Za-z]{0,6}"),  // name
        proptest::option::of("-?[0-9]{1,2}\\.[0-9]{1,4}"),  // lat
        proptest::option::of("-?[0-9]{1,3}\\.[0-9]{1,4}"),  // lon
    )
        .prop_map(|(category, name, lat, lon)| {
            let mut fields = Map::new();
            for (field, value) in [("SplitCategory", category), ("name", name), ("lat", lat), ("lon", lon)] {
                if let Some(value) = value {
                    fields.insert(field.to_string(), Value::String(value));
                }
            }
            JsonRecord::from(fields)
        })
}

proptest! {
    /// Property: an unrestricted stage keeps every record
    #[test]
    fn prop_unrestricted_keeps_everything(mut record in record_strategy()) {
        let stage = ProcessingStage::new(Default::default());
        prop_assert!(stage.on_add(&mut record).is_include());
    }

    /// Property: with a set policy, a record is kept iff its category is listed
    #[test]
    fn prop_set_policy_is_membership(record in record_strategy()) {
        let config = StageConfigBuilder::new()
            .include_categories(["A", "general"])
            .build()
            .unwrap();
        let verdict = AdmissionFilter::new(&config).evaluate(&record);

        let category = record
            .get("SplitCategory")
            .filter(|c| !c.is_empty())
            .unwrap_or_else(|| "general".to_string());
        let IncludePolicy::Set(categories) = config.include_policy() else {
            unreachable!("configured with a set");
        };
        prop_assert_eq!(verdict.is_include(), categories.contains(&category));
    }

    /// Property: geo is exactly "<lat>,<lon>" whenever both are present
    #[test]
    fn prop_geo_is_concatenation(mut record in record_strategy()) {
        let lat = record.get("lat");
        let lon = record.get("lon");
        let stage = ProcessingStage::new(Default::default());
        stage.on_add(&mut record);

        match (lat, lon) {
            (Some(lat), Some(lon)) => {
                prop_assert_eq!(record.get("geo"), Some(format!("{},{}", lat, lon)));
            }
            _ => prop_assert!(!record.has("geo")),
        }
    }

    /// Property: an excluded record is left exactly as it was
    #[test]
    fn prop_excluded_records_untouched(mut record in record_strategy()) {
        let stage = ProcessingStage::new(
            StageConfigBuilder::new().include_categories(["B"]).build().unwrap(),
        );
        let before = record.clone();
        if stage.on_add(&mut record).is_exclude() {
            prop_assert_eq!(record, before);
        }
    }
}
