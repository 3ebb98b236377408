//! Stage configuration
//!
//! The host supplies [`StageParams`] once at startup. They are resolved into a
//! [`StageConfig`], which the [`ProcessingStage`](crate::ProcessingStage) owns
//! and never mutates afterwards. Per-record calls only ever borrow it.
//!
//! Copyright (c) 2025 Gazprep Team
//! Licensed under the MIT OR Apache-2.0 license

use crate::error::{Error, Result};
use crate::fields;
use crate::normalizer::normalize_term;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

/// Which categories are admitted into the index
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum IncludePolicy {
    /// No category parameter was configured
    #[default]
    Unrestricted,
    /// The configured categories contained the `all` sentinel
    All,
    /// Only records whose category is in the set
    Set(BTreeSet<String>),
}

impl IncludePolicy {
    /// Build a policy from the multi-valued `include_category` parameter
    ///
    /// Each entry may itself be a comma-separated list. `None` selects
    /// [`IncludePolicy::Unrestricted`]; the `all` sentinel anywhere selects
    /// [`IncludePolicy::All`].
    pub fn from_values<I, S>(values: Option<I>) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let Some(values) = values else {
            return Ok(IncludePolicy::Unrestricted);
        };

        let categories = split_list(values);
        if categories.contains(fields::ALL_CATEGORIES) {
            return Ok(IncludePolicy::All);
        }
        if categories.is_empty() {
            return Err(Error::configuration(
                "include_category is present but names no categories",
            ));
        }
        Ok(IncludePolicy::Set(categories))
    }

    /// Whether every record passes the category rule
    pub fn admits_everything(&self) -> bool {
        matches!(self, IncludePolicy::Unrestricted | IncludePolicy::All)
    }
}

impl fmt::Display for IncludePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IncludePolicy::Unrestricted => write!(f, "unrestricted"),
            IncludePolicy::All => write!(f, "all"),
            IncludePolicy::Set(categories) => {
                let joined: Vec<&str> = categories.iter().map(String::as_str).collect();
                write!(f, "{{{}}}", joined.join(","))
            }
        }
    }
}

/// How a record with a missing or empty category is treated under
/// [`IncludePolicy::Set`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum MissingCategoryPolicy {
    /// Resolve to the default category and require set membership
    #[default]
    #[serde(rename = "default", alias = "default_category")]
    DefaultCategory,
    /// Always admit the record
    #[serde(rename = "include", alias = "always_include")]
    AlwaysInclude,
}

impl fmt::Display for MissingCategoryPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MissingCategoryPolicy::DefaultCategory => write!(f, "default"),
            MissingCategoryPolicy::AlwaysInclude => write!(f, "include"),
        }
    }
}

/// Initialization parameters as the host supplies them
///
/// Every field is optional; unset fields take the [`StageConfig`] defaults.
/// List-valued parameters accept either a single string or a list, and each
/// entry may be comma-separated.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StageParams {
    /// Categories to keep; `all` keeps everything
    #[serde(deserialize_with = "one_or_many", skip_serializing_if = "Option::is_none")]
    pub include_category: Option<Vec<String>>,

    /// Field holding a record's category
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category_field: Option<String>,

    /// Treatment of missing or empty categories
    #[serde(skip_serializing_if = "Option::is_none")]
    pub missing_category: Option<MissingCategoryPolicy>,

    /// Country codes to keep
    #[serde(deserialize_with = "one_or_many", skip_serializing_if = "Option::is_none")]
    pub countries: Option<Vec<String>>,

    /// Field holding a record's country code
    #[serde(skip_serializing_if = "Option::is_none")]
    pub country_field: Option<String>,

    /// Drop records that carry no name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub require_name: Option<bool>,

    /// Minimum acceptable name length
    #[serde(skip_serializing_if = "Option::is_none")]
    pub short_name_threshold: Option<usize>,

    /// Mark names shorter than the threshold as search-only
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flag_short_names: Option<bool>,

    /// Mark short names made of letters and digits, like `"ab 123"`, as search-only
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flag_short_alphanumeric: Option<bool>,

    /// Remove `lat`/`lon` once `geo` has been written
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remove_source_lat_lon: Option<bool>,

    /// Inline stop terms
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub stop_terms: Vec<String>,

    /// File of stop terms: a CSV with an `exclusion` column, or one term per line
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stop_terms_file: Option<PathBuf>,

    /// Split `script` lists and copy names into script-specific fields
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expand_scripts: Option<bool>,
}

/// Immutable configuration shared by every per-record call
#[derive(Debug, Clone, PartialEq)]
pub struct StageConfig {
    pub(crate) category_field: String,
    pub(crate) include_policy: IncludePolicy,
    pub(crate) missing_category: MissingCategoryPolicy,
    pub(crate) default_category: String,
    pub(crate) include_countries: Option<BTreeSet<String>>,
    pub(crate) country_field: String,
    pub(crate) require_name: bool,
    pub(crate) short_name_threshold: usize,
    pub(crate) flag_short_names: bool,
    pub(crate) flag_short_alphanumeric: bool,
    pub(crate) remove_source_lat_lon: bool,
    pub(crate) stop_terms: BTreeSet<String>,
    pub(crate) expand_scripts: bool,
}

impl Default for StageConfig {
    fn default() -> Self {
        Self {
            category_field: fields::DEFAULT_CATEGORY_FIELD.to_string(),
            include_policy: IncludePolicy::Unrestricted,
            missing_category: MissingCategoryPolicy::DefaultCategory,
            default_category: fields::DEFAULT_CATEGORY.to_string(),
            include_countries: None,
            country_field: fields::DEFAULT_COUNTRY_FIELD.to_string(),
            require_name: false,
            short_name_threshold: fields::DEFAULT_SHORT_NAME_THRESHOLD,
            flag_short_names: true,
            flag_short_alphanumeric: false,
            remove_source_lat_lon: false,
            stop_terms: BTreeSet::new(),
            expand_scripts: false,
        }
    }
}

impl StageConfig {
    /// Resolve host parameters into a configuration
    pub fn from_params(params: &StageParams) -> Result<Self> {
        let mut builder = StageConfigBuilder::new()
            .include_policy(IncludePolicy::from_values(params.include_category.as_ref())?);

        if let Some(field) = &params.category_field {
            builder = builder.category_field(field.clone());
        }
        if let Some(policy) = params.missing_category {
            builder = builder.missing_category(policy);
        }
        if let Some(countries) = &params.countries {
            builder = builder.include_countries(split_list(countries));
        }
        if let Some(field) = &params.country_field {
            builder = builder.country_field(field.clone());
        }
        if let Some(require) = params.require_name {
            builder = builder.require_name(require);
        }
        if let Some(threshold) = params.short_name_threshold {
            builder = builder.short_name_threshold(threshold);
        }
        if let Some(flag) = params.flag_short_names {
            builder = builder.flag_short_names(flag);
        }
        if let Some(flag) = params.flag_short_alphanumeric {
            builder = builder.flag_short_alphanumeric(flag);
        }
        if let Some(remove) = params.remove_source_lat_lon {
            builder = builder.remove_source_lat_lon(remove);
        }
        if let Some(expand) = params.expand_scripts {
            builder = builder.expand_scripts(expand);
        }

        builder = builder.stop_terms(params.stop_terms.iter().cloned());
        if let Some(path) = &params.stop_terms_file {
            builder = builder.stop_terms(load_stop_terms(path)?);
        }

        builder.build()
    }

    pub fn category_field(&self) -> &str {
        &self.category_field
    }

    pub fn include_policy(&self) -> &IncludePolicy {
        &self.include_policy
    }

    pub fn missing_category(&self) -> MissingCategoryPolicy {
        self.missing_category
    }

    pub fn default_category(&self) -> &str {
        &self.default_category
    }

    pub fn include_countries(&self) -> Option<&BTreeSet<String>> {
        self.include_countries.as_ref()
    }

    pub fn country_field(&self) -> &str {
        &self.country_field
    }

    pub fn require_name(&self) -> bool {
        self.require_name
    }

    pub fn short_name_threshold(&self) -> usize {
        self.short_name_threshold
    }

    pub fn flag_short_names(&self) -> bool {
        self.flag_short_names
    }

    pub fn flag_short_alphanumeric(&self) -> bool {
        self.flag_short_alphanumeric
    }

    pub fn remove_source_lat_lon(&self) -> bool {
        self.remove_source_lat_lon
    }

    pub fn stop_terms(&self) -> &BTreeSet<String> {
        &self.stop_terms
    }

    pub fn expand_scripts(&self) -> bool {
        self.expand_scripts
    }
}

/// Builder for creating stage configurations programmatically
#[derive(Debug, Clone, Default)]
pub struct StageConfigBuilder {
    config: StageConfig,
}

impl StageConfigBuilder {
    /// Create a builder holding the default configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the field holding a record's category
    pub fn category_field(mut self, field: impl Into<String>) -> Self {
        self.config.category_field = field.into();
        self
    }

    /// Set the inclusion policy
    pub fn include_policy(mut self, policy: IncludePolicy) -> Self {
        self.config.include_policy = policy;
        self
    }

    /// Keep only the given categories
    pub fn include_categories<I, S>(self, categories: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let set = categories.into_iter().map(Into::into).collect();
        self.include_policy(IncludePolicy::Set(set))
    }

    /// Keep every category
    pub fn include_all(self) -> Self {
        self.include_policy(IncludePolicy::All)
    }

    /// Set the missing-category policy
    pub fn missing_category(mut self, policy: MissingCategoryPolicy) -> Self {
        self.config.missing_category = policy;
        self
    }

    /// Set the category assumed when a record has none
    pub fn default_category(mut self, category: impl Into<String>) -> Self {
        self.config.default_category = category.into();
        self
    }

    /// Keep only records from the given countries
    pub fn include_countries<I, S>(mut self, countries: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.include_countries = Some(countries.into_iter().map(Into::into).collect());
        self
    }

    /// Set the field holding a record's country code
    pub fn country_field(mut self, field: impl Into<String>) -> Self {
        self.config.country_field = field.into();
        self
    }

    pub fn require_name(mut self, require: bool) -> Self {
        self.config.require_name = require;
        self
    }

    pub fn short_name_threshold(mut self, threshold: usize) -> Self {
        self.config.short_name_threshold = threshold;
        self
    }

    pub fn flag_short_names(mut self, flag: bool) -> Self {
        self.config.flag_short_names = flag;
        self
    }

    pub fn flag_short_alphanumeric(mut self, flag: bool) -> Self {
        self.config.flag_short_alphanumeric = flag;
        self
    }

    pub fn remove_source_lat_lon(mut self, remove: bool) -> Self {
        self.config.remove_source_lat_lon = remove;
        self
    }

    /// Add stop terms
    ///
    /// Terms are stored in the same normalized form names are reduced to
    /// before lookup, so `"St. Louis"` is kept as `"st louis"`.
    pub fn stop_terms<I, S>(mut self, terms: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.config.stop_terms.extend(
            terms
                .into_iter()
                .map(|t| normalize_term(t.as_ref()))
                .filter(|t| !t.is_empty()),
        );
        self
    }

    pub fn expand_scripts(mut self, expand: bool) -> Self {
        self.config.expand_scripts = expand;
        self
    }

    /// Build the configuration
    pub fn build(self) -> Result<StageConfig> {
        let config = self.config;

        if config.category_field.trim().is_empty() {
            return Err(Error::configuration("category_field must not be empty"));
        }
        if config.country_field.trim().is_empty() {
            return Err(Error::configuration("country_field must not be empty"));
        }
        if let IncludePolicy::Set(categories) = &config.include_policy {
            if categories.is_empty() {
                return Err(Error::configuration("include policy set must not be empty"));
            }
        }
        if matches!(&config.include_countries, Some(countries) if countries.is_empty()) {
            return Err(Error::configuration("countries must name at least one country"));
        }

        tracing::debug!(
            category_field = %config.category_field,
            include_policy = %config.include_policy,
            missing_category = %config.missing_category,
            stop_terms = config.stop_terms.len(),
            "Stage configuration built"
        );

        Ok(config)
    }
}

/// Split comma-separated list entries into a set of trimmed, non-empty values
pub fn split_list<I, S>(values: I) -> BTreeSet<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    values
        .into_iter()
        .flat_map(|v| {
            v.as_ref()
                .split(',')
                .map(|s| s.trim().to_string())
                .collect::<Vec<_>>()
        })
        .filter(|s| !s.is_empty())
        .collect()
}

/// Load stop terms from a file
///
/// A CSV file whose header names an `exclusion` column contributes that
/// column, with quoted fields such as `"bed, breakfast"` kept whole. Any other
/// file is read as one term per line. Blank terms and terms starting with `#`
/// are skipped either way. Terms are normalized like names.
pub fn load_stop_terms(path: &Path) -> Result<BTreeSet<String>> {
    let read_error = |e: anyhow::Error| Error::Configuration {
        message: format!("cannot read stop terms from {}", path.display()),
        source: Some(e),
    };

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(|e| read_error(e.into()))?;

    let column = reader
        .headers()
        .map_err(|e| read_error(e.into()))?
        .iter()
        .position(|h| h.eq_ignore_ascii_case(fields::STOP_TERM_COLUMN));

    let raw: Vec<String> = match column {
        Some(index) => {
            let mut terms = Vec::new();
            for record in reader.records() {
                let record = record.map_err(|e| read_error(e.into()))?;
                if let Some(term) = record.get(index) {
                    terms.push(term.to_string());
                }
            }
            terms
        }
        None => fs::read_to_string(path)
            .map_err(|e| read_error(e.into()))?
            .lines()
            .map(str::to_string)
            .collect(),
    };

    let terms: BTreeSet<String> = raw
        .iter()
        .map(|term| term.trim())
        .filter(|term| !term.is_empty() && !term.starts_with('#'))
        .map(normalize_term)
        .filter(|term| !term.is_empty())
        .collect();

    tracing::info!(
        path = %path.display(),
        count = terms.len(),
        csv = column.is_some(),
        "Loaded stop terms"
    );
    Ok(terms)
}

fn one_or_many<'de, D>(deserializer: D) -> std::result::Result<Option<Vec<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One(String),
        Many(Vec<String>),
    }

    Ok(Option::<OneOrMany>::deserialize(deserializer)?.map(|v| match v {
        OneOrMany::One(s) => vec![s],
        OneOrMany::Many(list) => list,
    }))
}
