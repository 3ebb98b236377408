//! Field normalizer implementation
//!
//! Applies an ordered list of [`NormalizationStep`]s to an admitted record in
//! place. Every step is idempotent, so a second pass over the same record
//! leaves it unchanged.
//!
//! Copyright (c) 2025 Gazprep Team
//! Licensed under the MIT OR Apache-2.0 license

use super::built_in;
use super::types::{AppliedChange, NormalizationReport, NormalizationStep};
use crate::config::StageConfig;
use crate::fields;
use crate::record::RecordAccessor;
use regex::Regex;
use std::collections::{BTreeSet, HashMap};
use std::sync::OnceLock;
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

static TERM_SEPARATORS: OnceLock<Regex> = OnceLock::new();
static SHORT_ALPHANUMERIC: OnceLock<Regex> = OnceLock::new();

/// Scripts whose names are copied into `name_cjk`
const CJK_SCRIPTS: &[&str] = &["CJK", "HANGUL", "KATAKANA", "HIRAGANA"];

/// An ordered list of normalization steps
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldNormalizer {
    steps: Vec<NormalizationStep>,
}

impl FieldNormalizer {
    /// Create a normalizer with no steps
    pub fn new() -> Self {
        Self { steps: Vec::new() }
    }

    /// Build the standard step list for a stage configuration
    ///
    /// Order: geo synthesis, name-type compaction, short-name flag, stop-term
    /// flag, short-alphanumeric flag, script fan-out. Gated steps are only
    /// added when enabled.
    pub fn from_config(config: &StageConfig) -> Self {
        let mut normalizer = Self::new()
            .add_step(built_in::geo_synthesis(config.remove_source_lat_lon()))
            .add_step(built_in::name_type_compaction());

        if config.flag_short_names() {
            normalizer = normalizer.add_step(built_in::short_name_flag(config.short_name_threshold()));
        }
        if !config.stop_terms().is_empty() {
            normalizer = normalizer.add_step(built_in::stop_term_flag(config.stop_terms().clone()));
        }
        if config.flag_short_alphanumeric() {
            normalizer = normalizer.add_step(built_in::short_alphanumeric_flag());
        }
        if config.expand_scripts() {
            normalizer = normalizer.add_step(built_in::script_fan_out());
        }

        normalizer
    }

    /// Append a step; steps run in insertion order
    pub fn add_step(mut self, step: NormalizationStep) -> Self {
        self.steps.push(step);
        self
    }

    pub fn steps(&self) -> &[NormalizationStep] {
        &self.steps
    }

    pub fn step_count(&self) -> usize {
        self.steps.len()
    }

    /// Apply every step to the record
    ///
    /// When the normalizer has at least one flag step and none of them fires,
    /// a `search_only` value carried in from the source is removed.
    pub fn apply<R>(&self, record: &mut R) -> NormalizationReport
    where
        R: RecordAccessor + ?Sized,
    {
        let mut report = NormalizationReport::default();

        for step in &self.steps {
            match step {
                NormalizationStep::GeoSynthesis {
                    lat_field,
                    lon_field,
                    target_field,
                    remove_source,
                } => synthesize_geo(record, lat_field, lon_field, target_field, *remove_source, &mut report),
                NormalizationStep::EnumMapping { field, mappings } => {
                    map_enum(record, field, mappings, &mut report)
                }
                NormalizationStep::ShortNameFlag { threshold } => {
                    flag_short_name(record, *threshold, &mut report)
                }
                NormalizationStep::StopTermFlag { terms } => {
                    if !report.flagged_search_only() {
                        flag_stop_term(record, terms, &mut report)
                    }
                }
                NormalizationStep::ShortAlphanumericFlag { max_length } => {
                    if !report.flagged_search_only() {
                        flag_short_alphanumeric(record, *max_length, &mut report)
                    }
                }
                NormalizationStep::ScriptFanOut => fan_out_scripts(record, &mut report),
            }
        }

        if !report.flagged_search_only() && self.steps.iter().any(NormalizationStep::sets_search_only) {
            clear_search_only(record, &mut report);
        }

        report
    }
}

fn synthesize_geo<R>(
    record: &mut R,
    lat_field: &str,
    lon_field: &str,
    target_field: &str,
    remove_source: bool,
    report: &mut NormalizationReport,
) where
    R: RecordAccessor + ?Sized,
{
    let (Some(lat), Some(lon)) = (record.get(lat_field), record.get(lon_field)) else {
        return;
    };

    let geo = format!("{},{}", lat, lon);
    record.set(target_field, geo.clone());
    if remove_source {
        record.remove(lat_field);
        record.remove(lon_field);
    }

    report.push(AppliedChange::GeoSynthesized {
        geo,
        removed_source: remove_source,
    });
}

fn map_enum<R>(
    record: &mut R,
    field: &str,
    mappings: &HashMap<String, String>,
    report: &mut NormalizationReport,
) where
    R: RecordAccessor + ?Sized,
{
    let Some(value) = record.get(field) else {
        return;
    };
    let Some(mapped) = mappings.get(&value) else {
        return;
    };

    record.set(field, mapped.clone());
    report.push(AppliedChange::ValueMapped {
        field: field.to_string(),
        from: value,
        to: mapped.clone(),
    });
}

fn flag_short_name<R>(record: &mut R, threshold: usize, report: &mut NormalizationReport)
where
    R: RecordAccessor + ?Sized,
{
    let name = record.get(fields::NAME);
    let length = name.as_deref().map_or(0, |n| n.chars().count());
    if length >= threshold {
        return;
    }

    tracing::debug!(name = ?name, threshold, "Short name set search only");
    record.set(fields::SEARCH_ONLY, fields::FLAG_TRUE.to_string());
    report.push(AppliedChange::FlaggedShortName { name });
}

fn flag_stop_term<R>(record: &mut R, terms: &BTreeSet<String>, report: &mut NormalizationReport)
where
    R: RecordAccessor + ?Sized,
{
    let Some(name) = record.get(fields::NAME) else {
        return;
    };
    let mut term = normalize_term(&name);
    if !terms.contains(&term) {
        if name.chars().count() >= fields::DIACRITIC_FOLD_MAX_CHARS {
            return;
        }
        term = normalize_term(&fold_diacritics(&name));
        if !terms.contains(&term) {
            return;
        }
    }

    tracing::debug!(name = %name, term = %term, "Stop term set search only");
    record.set(fields::SEARCH_ONLY, fields::FLAG_TRUE.to_string());
    report.push(AppliedChange::FlaggedStopTerm { name, term });
}

fn flag_short_alphanumeric<R>(record: &mut R, max_length: usize, report: &mut NormalizationReport)
where
    R: RecordAccessor + ?Sized,
{
    let Some(name) = record.get(fields::NAME) else {
        return;
    };
    if let Some(class) = record.get(fields::FEAT_CLASS) {
        let class = class.trim();
        if fields::EXEMPT_FEAT_CLASSES
            .iter()
            .any(|exempt| class.eq_ignore_ascii_case(exempt))
        {
            return;
        }
    }

    let compact = name.replace('.', "");
    let compact = compact.trim();
    if compact.chars().count() > max_length || !is_short_alphanumeric(compact) {
        return;
    }

    tracing::debug!(name = %name, "Short alphanumeric name set search only");
    record.set(fields::SEARCH_ONLY, fields::FLAG_TRUE.to_string());
    report.push(AppliedChange::FlaggedShortAlphanumeric { name });
}

fn clear_search_only<R>(record: &mut R, report: &mut NormalizationReport)
where
    R: RecordAccessor + ?Sized,
{
    let Some(previous) = record.get(fields::SEARCH_ONLY) else {
        return;
    };
    record.remove(fields::SEARCH_ONLY);
    report.push(AppliedChange::SearchOnlyCleared { previous });
}

fn fan_out_scripts<R>(record: &mut R, report: &mut NormalizationReport)
where
    R: RecordAccessor + ?Sized,
{
    let scripts = parse_scripts(&record.get_all(fields::SCRIPT));
    if scripts.is_empty() {
        return;
    }

    record.set_all(fields::SCRIPT, scripts.clone());

    if let Some(name) = record.get(fields::NAME) {
        if scripts.iter().any(|s| s == "ARABIC") {
            record.set(fields::NAME_ARABIC, name.clone());
        }
        if scripts.iter().any(|s| CJK_SCRIPTS.contains(&s.as_str())) {
            record.set(fields::NAME_CJK, name);
        }
    }

    report.push(AppliedChange::ScriptsExpanded { scripts });
}

/// Split values such as `"[LATIN,ARABIC]"` into distinct script names, keeping order
pub fn parse_scripts(values: &[String]) -> Vec<String> {
    let mut scripts: Vec<String> = Vec::new();
    for value in values {
        let inner: String = value.chars().filter(|c| *c != '[' && *c != ']').collect();
        for script in inner.split(',').map(str::trim).filter(|s| !s.is_empty()) {
            if !scripts.iter().any(|s| s == script) {
                scripts.push(script.to_string());
            }
        }
    }
    scripts
}

/// Reduce a name to the form stop terms are matched against
///
/// Lowercases, drops periods, and turns quote marks, hyphens and whitespace
/// runs into single spaces.
pub fn normalize_term(name: &str) -> String {
    let separators = TERM_SEPARATORS.get_or_init(|| {
        Regex::new(r"[\s\-\u{2018}\u{2019}]+").expect("term separator pattern is valid")
    });
    let lowered = name.to_lowercase().replace('.', "");
    separators.replace_all(&lowered, " ").trim().to_string()
}

/// Strip combining marks after canonical decomposition, so `"Hôtel"` becomes `"Hotel"`
pub fn fold_diacritics(name: &str) -> String {
    name.nfd().filter(|c| !is_combining_mark(*c)).collect()
}

/// A word followed by anything that ends in digits, e.g. `"ab 123"` or `"N7"`
fn is_short_alphanumeric(name: &str) -> bool {
    let pattern = SHORT_ALPHANUMERIC.get_or_init(|| {
        Regex::new(r"^[A-Za-z0-9_]+.+[0-9]+$").expect("short alphanumeric pattern is valid")
    });
    pattern.is_match(name)
}
