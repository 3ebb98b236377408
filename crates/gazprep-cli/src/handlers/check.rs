//! Check command handler

use super::utils::{build_stage, input_label, open_input, parse_line};
use crate::cli::{CheckArgs, OutputFormat};
use crate::config::Config;
use crate::error::Result;
use crate::logging::timing::Timer;
use crate::output::OutputWriter;
use gazprep_core::{
    AddOutcome, AppliedChange, ExclusionReason, ProcessingStage, RecordAccessor, StatsSnapshot,
};
use serde::Serialize;
use std::io::BufRead;
use tracing::instrument;

/// Verdict and normalizations for one input line
#[derive(Debug, Serialize)]
struct CheckEntry {
    line: usize,
    name: Option<String>,
    included: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    reason: Option<ExclusionReason>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    changes: Vec<AppliedChange>,
}

impl CheckEntry {
    fn new(line: usize, name: Option<String>, outcome: AddOutcome) -> Self {
        Self {
            line,
            name,
            included: outcome.verdict.is_include(),
            reason: outcome.verdict.reason().cloned(),
            changes: outcome.report.map(|r| r.changes).unwrap_or_default(),
        }
    }

    fn detail(&self) -> String {
        if let Some(reason) = &self.reason {
            return reason.to_string();
        }
        self.changes
            .iter()
            .map(describe_change)
            .collect::<Vec<_>>()
            .join("; ")
    }
}

#[derive(Debug, Serialize)]
struct CheckReport {
    entries: Vec<CheckEntry>,
    stats: StatsSnapshot,
}

fn describe_change(change: &AppliedChange) -> String {
    match change {
        AppliedChange::GeoSynthesized { geo, removed_source } => {
            if *removed_source {
                format!("geo={} (lat/lon removed)", geo)
            } else {
                format!("geo={}", geo)
            }
        }
        AppliedChange::ValueMapped { field, from, to } => format!("{} {}→{}", field, from, to),
        AppliedChange::FlaggedShortName { .. } => "search-only (short name)".to_string(),
        AppliedChange::FlaggedStopTerm { term, .. } => format!("search-only (stop term '{}')", term),
        AppliedChange::FlaggedShortAlphanumeric { .. } => {
            "search-only (short alphanumeric)".to_string()
        }
        AppliedChange::SearchOnlyCleared { previous } => {
            format!("search_only={} removed", previous)
        }
        AppliedChange::ScriptsExpanded { scripts } => format!("scripts {}", scripts.join(",")),
    }
}

/// Handle the check command
#[instrument(skip_all, fields(input = %input_label(args.input.as_deref())))]
pub async fn handle_check(args: CheckArgs, config: &Config, output: &mut OutputWriter) -> Result<()> {
    let label = input_label(args.input.as_deref());
    let _timer = Timer::with_details("check_command", &label);

    let stage = build_stage(config, &args.stage)?;
    let reader = open_input(args.input.as_deref())?;
    let report = check_records(&stage, reader, args.only_excluded)?;

    if output.format() != OutputFormat::Human {
        return output.data(&report);
    }

    output.section(&format!("Check: {}", label))?;
    let rows = report
        .entries
        .iter()
        .map(|entry| {
            vec![
                entry.line.to_string(),
                entry.name.clone().unwrap_or_default(),
                if entry.included { "include" } else { "exclude" }.to_string(),
                entry.detail(),
            ]
        })
        .collect();
    output.table(&["line", "name", "verdict", "detail"], rows)?;
    output.writeln("")?;
    output.info(&report.stats.to_string())
}

/// Run every record through the stage, collecting one entry per record
fn check_records(
    stage: &ProcessingStage,
    reader: Box<dyn BufRead + Send>,
    only_excluded: bool,
) -> Result<CheckReport> {
    let mut entries = Vec::new();

    for (index, line) in reader.lines().enumerate() {
        let line_no = index + 1;
        let Some(mut record) = parse_line(line_no, &line?)? else {
            continue;
        };
        let name = record.get(gazprep_core::fields::NAME);
        let outcome = stage.on_add_detailed(&mut record);
        if only_excluded && outcome.verdict.is_include() {
            continue;
        }
        entries.push(CheckEntry::new(line_no, name, outcome));
    }

    stage.finish()?;
    Ok(CheckReport {
        entries,
        stats: stage.stats(),
    })
}
