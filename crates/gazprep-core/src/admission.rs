//! Admission filtering
//!
//! Decides whether a record enters the index at all. Evaluation only reads the
//! record, so the verdict is always computed before any normalization runs.
//!
//! Rules, in order:
//!
//! 1. With `require_name`, a record without a name is excluded.
//! 2. With a country filter, a record whose country is not listed is excluded.
//! 3. [`IncludePolicy::Unrestricted`] and [`IncludePolicy::All`] keep the record.
//! 4. [`IncludePolicy::Set`] keeps the record iff its category is in the set. A
//!    missing or empty category follows the [`MissingCategoryPolicy`].
//!
//! Copyright (c) 2025 Gazprep Team
//! Licensed under the MIT OR Apache-2.0 license

use crate::config::{IncludePolicy, MissingCategoryPolicy, StageConfig};
use crate::fields;
use crate::record::RecordAccessor;
use serde::Serialize;
use std::fmt;

/// Why a record was kept out of the index
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum ExclusionReason {
    /// The record carries no name and names are required
    MissingName,
    /// The record's country is not in the configured set
    Country(Option<String>),
    /// The record's resolved category is not in the configured set
    Category(String),
}

impl fmt::Display for ExclusionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExclusionReason::MissingName => write!(f, "missing name"),
            ExclusionReason::Country(Some(cc)) => write!(f, "country {} not included", cc),
            ExclusionReason::Country(None) => write!(f, "no country"),
            ExclusionReason::Category(cat) => write!(f, "category {} not included", cat),
        }
    }
}

/// Outcome of an add event
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    /// Pass the record on to the index
    Include,
    /// Drop the record silently
    Exclude(ExclusionReason),
}

impl Verdict {
    pub fn is_include(&self) -> bool {
        matches!(self, Verdict::Include)
    }

    pub fn is_exclude(&self) -> bool {
        !self.is_include()
    }

    /// The exclusion reason, if the record was dropped
    pub fn reason(&self) -> Option<&ExclusionReason> {
        match self {
            Verdict::Include => None,
            Verdict::Exclude(reason) => Some(reason),
        }
    }
}

impl From<Verdict> for bool {
    fn from(verdict: Verdict) -> Self {
        verdict.is_include()
    }
}

/// Keep/drop decision over one record and the stage configuration
#[derive(Debug, Clone, Copy)]
pub struct AdmissionFilter<'a> {
    config: &'a StageConfig,
}

impl<'a> AdmissionFilter<'a> {
    pub fn new(config: &'a StageConfig) -> Self {
        Self { config }
    }

    /// Evaluate a record without modifying it
    pub fn evaluate<R>(&self, record: &R) -> Verdict
    where
        R: RecordAccessor + ?Sized,
    {
        if self.config.require_name && non_blank(record.get(fields::NAME)).is_none() {
            return Verdict::Exclude(ExclusionReason::MissingName);
        }

        if let Some(countries) = &self.config.include_countries {
            let cc = non_blank(record.get(&self.config.country_field));
            let listed = cc.as_ref().is_some_and(|cc| countries.contains(cc));
            if !listed {
                return Verdict::Exclude(ExclusionReason::Country(cc));
            }
        }

        self.evaluate_category(record)
    }

    /// Apply only the category rule
    pub fn evaluate_category<R>(&self, record: &R) -> Verdict
    where
        R: RecordAccessor + ?Sized,
    {
        let categories = match &self.config.include_policy {
            IncludePolicy::Unrestricted | IncludePolicy::All => return Verdict::Include,
            IncludePolicy::Set(categories) => categories,
        };

        let category = match non_blank(record.get(&self.config.category_field)) {
            Some(category) => category,
            None => match self.config.missing_category {
                MissingCategoryPolicy::AlwaysInclude => return Verdict::Include,
                MissingCategoryPolicy::DefaultCategory => self.config.default_category.clone(),
            },
        };

        if categories.contains(&category) {
            Verdict::Include
        } else {
            Verdict::Exclude(ExclusionReason::Category(category))
        }
    }
}

/// Treat empty and whitespace-only values as absent
fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}
