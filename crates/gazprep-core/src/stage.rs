//! Processing stage lifecycle
//!
//! The host pipeline drives a [`ProcessingStage`] with one call per lifecycle
//! event. Only `add` carries decision logic: the record is evaluated by the
//! [`AdmissionFilter`] and, if kept, rewritten by the [`FieldNormalizer`]. The
//! remaining events are accepted and ignored.
//!
//! The stage is `Send + Sync`. Per-record calls borrow the stage immutably and
//! the record mutably, so a multi-threaded host can share one stage across
//! workers. The only shared state besides the configuration are diagnostic
//! counters, which never influence a verdict.
//!
//! Copyright (c) 2025 Gazprep Team
//! Licensed under the MIT OR Apache-2.0 license

use crate::admission::{AdmissionFilter, Verdict};
use crate::config::{StageConfig, StageParams};
use crate::error::Result;
use crate::fields;
use crate::normalizer::{FieldNormalizer, NormalizationReport};
use crate::record::RecordAccessor;
use serde::Serialize;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Lifecycle hooks a host pipeline invokes on an update stage
pub trait UpdateProcessor {
    /// A record is about to be added to the index
    fn process_add<R>(&self, record: &mut R) -> Verdict
    where
        R: RecordAccessor + ?Sized;

    /// A record is being deleted
    fn process_delete(&self, _id: &str) -> Result<()> {
        Ok(())
    }

    /// Index segments are being merged
    fn process_merge_indexes(&self) -> Result<()> {
        Ok(())
    }

    /// Pending changes are being committed
    fn process_commit(&self) -> Result<()> {
        Ok(())
    }

    /// Pending changes are being rolled back
    fn process_rollback(&self) -> Result<()> {
        Ok(())
    }

    /// The stage is being torn down
    fn finish(&self) -> Result<()> {
        Ok(())
    }
}

/// A lifecycle event dispatched by the host
#[derive(Debug)]
pub enum LifecycleEvent<'a, R: ?Sized> {
    Add(&'a mut R),
    Delete(&'a str),
    MergeIndexes,
    Commit,
    Rollback,
    Finish,
}

impl<R: ?Sized> LifecycleEvent<'_, R> {
    /// Event name used in logs
    pub fn kind(&self) -> &'static str {
        match self {
            LifecycleEvent::Add(_) => "add",
            LifecycleEvent::Delete(_) => "delete",
            LifecycleEvent::MergeIndexes => "merge_indexes",
            LifecycleEvent::Commit => "commit",
            LifecycleEvent::Rollback => "rollback",
            LifecycleEvent::Finish => "finish",
        }
    }
}

/// Result of dispatching one lifecycle event
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventOutcome {
    /// Keep/drop verdict of an add event
    Verdict(Verdict),
    /// Any other event; nothing to report
    Acknowledged,
}

/// Outcome of an add event together with what normalization changed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddOutcome {
    pub verdict: Verdict,
    /// `None` when the record was excluded
    pub report: Option<NormalizationReport>,
}

/// Point-in-time copy of the stage counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatsSnapshot {
    pub rows: u64,
    pub included: u64,
    pub excluded: u64,
    pub search_only: u64,
}

impl fmt::Display for StatsSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "rows={} included={} excluded={} search_only={}",
            self.rows, self.included, self.excluded, self.search_only
        )
    }
}

#[derive(Debug, Default)]
struct StageStats {
    rows: AtomicU64,
    included: AtomicU64,
    excluded: AtomicU64,
    search_only: AtomicU64,
}

impl StageStats {
    fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            rows: self.rows.load(Ordering::Relaxed),
            included: self.included.load(Ordering::Relaxed),
            excluded: self.excluded.load(Ordering::Relaxed),
            search_only: self.search_only.load(Ordering::Relaxed),
        }
    }
}

/// Filter-and-normalize stage run before records are committed to an index
#[derive(Debug)]
pub struct ProcessingStage {
    config: StageConfig,
    normalizer: FieldNormalizer,
    stats: StageStats,
}

impl ProcessingStage {
    /// Create a stage from a finished configuration
    pub fn new(config: StageConfig) -> Self {
        let normalizer = FieldNormalizer::from_config(&config);
        tracing::info!(
            category_field = %config.category_field(),
            include_policy = %config.include_policy(),
            steps = normalizer.step_count(),
            "Processing stage initialized"
        );
        Self {
            config,
            normalizer,
            stats: StageStats::default(),
        }
    }

    /// Create a stage from host initialization parameters
    pub fn from_params(params: &StageParams) -> Result<Self> {
        Ok(Self::new(StageConfig::from_params(params)?))
    }

    pub fn config(&self) -> &StageConfig {
        &self.config
    }

    pub fn normalizer(&self) -> &FieldNormalizer {
        &self.normalizer
    }

    /// Current counter values
    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }

    /// Handle an add event, returning the keep/drop verdict
    pub fn on_add<R>(&self, record: &mut R) -> Verdict
    where
        R: RecordAccessor + ?Sized,
    {
        self.on_add_detailed(record).verdict
    }

    /// Handle an add event, also returning the normalization report
    pub fn on_add_detailed<R>(&self, record: &mut R) -> AddOutcome
    where
        R: RecordAccessor + ?Sized,
    {
        let row = self.stats.rows.fetch_add(1, Ordering::Relaxed) + 1;
        if row % fields::PROGRESS_INTERVAL == 0 {
            let stats = self.stats.snapshot();
            tracing::info!(row, included = stats.included, excluded = stats.excluded, "Processing progress");
        }

        let verdict = AdmissionFilter::new(&self.config).evaluate(record);
        if let Verdict::Exclude(reason) = &verdict {
            self.stats.excluded.fetch_add(1, Ordering::Relaxed);
            tracing::debug!(reason = %reason, name = ?record.get(fields::NAME), "Exclude");
            return AddOutcome { verdict, report: None };
        }

        let report = self.normalizer.apply(record);
        if report.flagged_search_only() {
            self.stats.search_only.fetch_add(1, Ordering::Relaxed);
        }
        self.stats.included.fetch_add(1, Ordering::Relaxed);

        AddOutcome {
            verdict,
            report: Some(report),
        }
    }

    pub fn on_delete(&self, id: &str) -> Result<()> {
        tracing::trace!(id, "Delete passed through");
        Ok(())
    }

    pub fn on_merge_indexes(&self) -> Result<()> {
        Ok(())
    }

    pub fn on_commit(&self) -> Result<()> {
        Ok(())
    }

    pub fn on_rollback(&self) -> Result<()> {
        Ok(())
    }

    /// Teardown hook; logs a summary of the counters
    pub fn finish(&self) -> Result<()> {
        let stats = self.stats.snapshot();
        tracing::info!(
            rows = stats.rows,
            included = stats.included,
            excluded = stats.excluded,
            search_only = stats.search_only,
            "Processing stage finished"
        );
        Ok(())
    }

    /// Dispatch any lifecycle event
    pub fn process<R>(&self, event: LifecycleEvent<'_, R>) -> Result<EventOutcome>
    where
        R: RecordAccessor + ?Sized,
    {
        tracing::trace!(event = event.kind(), "Lifecycle event");
        match event {
            LifecycleEvent::Add(record) => Ok(EventOutcome::Verdict(self.on_add(record))),
            LifecycleEvent::Delete(id) => self.on_delete(id).map(|_| EventOutcome::Acknowledged),
            LifecycleEvent::MergeIndexes => self.on_merge_indexes().map(|_| EventOutcome::Acknowledged),
            LifecycleEvent::Commit => self.on_commit().map(|_| EventOutcome::Acknowledged),
            LifecycleEvent::Rollback => self.on_rollback().map(|_| EventOutcome::Acknowledged),
            LifecycleEvent::Finish => self.finish().map(|_| EventOutcome::Acknowledged),
        }
    }
}

impl UpdateProcessor for ProcessingStage {
    fn process_add<R>(&self, record: &mut R) -> Verdict
    where
        R: RecordAccessor + ?Sized,
    {
        self.on_add(record)
    }

    fn process_delete(&self, id: &str) -> Result<()> {
        self.on_delete(id)
    }

    fn process_merge_indexes(&self) -> Result<()> {
        self.on_merge_indexes()
    }

    fn process_commit(&self) -> Result<()> {
        self.on_commit()
    }

    fn process_rollback(&self) -> Result<()> {
        self.on_rollback()
    }

    fn finish(&self) -> Result<()> {
        ProcessingStage::finish(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::admission::ExclusionReason;
    use crate::config::StageConfigBuilder;
    use crate::record::JsonRecord;
    use serde_json::json;

    fn stage(categories: &[&str]) -> ProcessingStage {
        let config = StageConfigBuilder::new()
            .include_categories(categories.iter().copied())
            .build()
            .unwrap();
        ProcessingStage::new(config)
    }

    #[test]
    fn test_stage_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<ProcessingStage>();
    }

    #[test]
    fn test_add_end_to_end() {
        let stage = stage(&["A"]);
        let mut rec = JsonRecord::from_value(json!({
            "SplitCategory": "A",
            "lat": "1",
            "lon": "2",
            "name": "Al",
            "name_type": "abbrev"
        }))
        .unwrap();

        assert_eq!(stage.on_add(&mut rec), Verdict::Include);
        assert_eq!(rec.get("geo").as_deref(), Some("1,2"));
        assert_eq!(rec.get("name_type").as_deref(), Some("A"));
        assert!(!rec.has("search_only"));
    }

    #[test]
    fn test_excluded_record_is_not_normalized() {
        let stage = stage(&["A"]);
        let mut rec = JsonRecord::from_value(json!({
            "SplitCategory": "B",
            "lat": "1",
            "lon": "2",
            "name_type": "abbrev"
        }))
        .unwrap();
        let before = rec.clone();

        let outcome = stage.on_add_detailed(&mut rec);
        assert_eq!(
            outcome.verdict,
            Verdict::Exclude(ExclusionReason::Category("B".to_string()))
        );
        assert!(outcome.report.is_none());
        assert_eq!(rec, before);
    }

    #[test]
    fn test_other_events_are_no_ops() {
        let stage = stage(&["A"]);
        assert!(stage.on_delete("42").is_ok());
        assert!(stage.on_merge_indexes().is_ok());
        assert!(stage.on_commit().is_ok());
        assert!(stage.on_rollback().is_ok());
        assert!(stage.finish().is_ok());
        assert_eq!(stage.stats(), StatsSnapshot::default());
    }

    #[test]
    fn test_dispatch() {
        let stage = stage(&["A"]);
        let mut rec = JsonRecord::from_value(json!({"SplitCategory": "A", "name": "Oslo"})).unwrap();

        let outcome = stage.process(LifecycleEvent::Add(&mut rec)).unwrap();
        assert_eq!(outcome, EventOutcome::Verdict(Verdict::Include));

        let outcome = stage.process(LifecycleEvent::<JsonRecord>::Commit).unwrap();
        assert_eq!(outcome, EventOutcome::Acknowledged);
        let outcome = stage.process(LifecycleEvent::<JsonRecord>::Delete("7")).unwrap();
        assert_eq!(outcome, EventOutcome::Acknowledged);
    }

    #[test]
    fn test_stats_count_outcomes() {
        let stage = stage(&["A"]);
        for (cat, name) in [("A", "X"), ("A", "Oslo"), ("B", "Bergen")] {
            let mut rec = JsonRecord::from_value(json!({"SplitCategory": cat, "name": name})).unwrap();
            stage.on_add(&mut rec);
        }
        let stats = stage.stats();
        assert_eq!(stats.rows, 3);
        assert_eq!(stats.included, 2);
        assert_eq!(stats.excluded, 1);
        assert_eq!(stats.search_only, 1);
    }

    #[test]
    fn test_update_processor_trait() {
        fn run<P: UpdateProcessor>(processor: &P, record: &mut JsonRecord) -> bool {
            let keep = processor.process_add(record).is_include();
            processor.process_commit().unwrap();
            processor.finish().unwrap();
            keep
        }

        let stage = stage(&["general"]);
        let mut rec = JsonRecord::from_value(json!({"name": "Paris"})).unwrap();
        assert!(run(&stage, &mut rec));
    }
}
