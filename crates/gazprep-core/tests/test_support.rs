//! Shared test support utilities for integration tests

#![allow(dead_code)]

use gazprep_core::{JsonRecord, ProcessingStage, StageConfigBuilder};
use serde_json::{json, Value};

/// Build a record from a JSON object literal
pub fn record(value: Value) -> JsonRecord {
    JsonRecord::from_value(value).expect("test record must be a JSON object")
}

/// A typical gazetteer row
pub fn place(category: &str, name: &str, lat: &str, lon: &str) -> JsonRecord {
    record(json!({
        "SplitCategory": category,
        "name": name,
        "lat": lat,
        "lon": lon,
        "name_type": "name",
        "cc": "FR"
    }))
}

/// Stage that keeps only the given categories, otherwise defaults
pub fn stage_for(categories: &[&str]) -> ProcessingStage {
    let config = StageConfigBuilder::new()
        .include_categories(categories.iter().copied())
        .build()
        .expect("valid test configuration");
    ProcessingStage::new(config)
}
