//! Process command handler
//!
//! Input lines are grouped into batches and each batch is handed to a
//! blocking worker sharing one `ProcessingStage`. Finished batches are
//! written in submission order, so the output keeps the input order.

use super::utils::{build_stage, input_label, open_input, parse_line};
use crate::cli::ProcessArgs;
use crate::config::Config;
use crate::error::{Error, Result};
use crate::logging::timing::Timer;
use crate::output::OutputWriter;
use gazprep_core::{ProcessingStage, StatsSnapshot};
use indicatif::ProgressBar;
use serde::Serialize;
use std::collections::VecDeque;
use std::fs::File;
use std::io::{self, BufRead, BufWriter, Write};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument};

type BatchHandle = JoinHandle<Result<Vec<String>>>;

/// What a process run did
#[derive(Debug, Serialize)]
struct ProcessSummary {
    input: String,
    output: String,
    elapsed_ms: u128,
    #[serde(flatten)]
    stats: StatsSnapshot,
}

/// Handle the process command
#[instrument(skip_all, fields(input = %input_label(args.input.as_deref())))]
pub async fn handle_process(
    args: ProcessArgs,
    config: &Config,
    output: &mut OutputWriter,
) -> Result<()> {
    let label = input_label(args.input.as_deref());
    let timer = Timer::with_details("process_command", &label);

    if args.jobs == 0 {
        return Err(Error::invalid_args("--jobs must be at least 1"));
    }
    if args.batch_size == 0 {
        return Err(Error::invalid_args("--batch-size must be at least 1"));
    }

    let stage = Arc::new(build_stage(config, &args.stage)?);
    let reader = open_input(args.input.as_deref())?;

    let (sink, destination): (Box<dyn Write + Send>, String) = match &args.save_to {
        Some(path) => (
            Box::new(BufWriter::new(File::create(path)?)),
            path.display().to_string(),
        ),
        None => {
            output.redirect_to_stderr();
            (Box::new(BufWriter::new(io::stdout())), "<stdout>".to_string())
        }
    };

    if !config.output.progress {
        output.disable_progress();
    }
    let spinner = output.spinner(&format!("Processing {}", label));

    info!(jobs = args.jobs, batch_size = args.batch_size, "Processing records");
    let stats = run_pipeline(
        Arc::clone(&stage),
        reader,
        sink,
        args.jobs,
        args.batch_size,
        spinner.as_ref(),
    )
    .await?;

    if let Some(pb) = spinner {
        pb.finish_and_clear();
    }

    let summary = ProcessSummary {
        input: label,
        output: destination,
        elapsed_ms: timer.elapsed().as_millis(),
        stats,
    };
    write_summary(&summary, output)
}

/// Feed every line through the stage and write the kept records
///
/// The stage sees `commit` and then `finish` once all input is written.
async fn run_pipeline(
    stage: Arc<ProcessingStage>,
    reader: Box<dyn BufRead + Send>,
    mut sink: Box<dyn Write + Send>,
    jobs: usize,
    batch_size: usize,
    spinner: Option<&ProgressBar>,
) -> Result<StatsSnapshot> {
    let mut pending: VecDeque<BatchHandle> = VecDeque::with_capacity(jobs);
    let mut batch = Vec::with_capacity(batch_size);

    for (index, line) in reader.lines().enumerate() {
        batch.push((index + 1, line?));
        if batch.len() == batch_size {
            let full = std::mem::replace(&mut batch, Vec::with_capacity(batch_size));
            pending.push_back(spawn_batch(&stage, full));
            if pending.len() >= jobs {
                drain_one(&mut pending, sink.as_mut(), &stage, spinner).await?;
            }
        }
    }
    if !batch.is_empty() {
        pending.push_back(spawn_batch(&stage, batch));
    }
    while !pending.is_empty() {
        drain_one(&mut pending, sink.as_mut(), &stage, spinner).await?;
    }
    sink.flush()?;

    stage.on_commit()?;
    stage.finish()?;
    Ok(stage.stats())
}

fn spawn_batch(stage: &Arc<ProcessingStage>, batch: Vec<(usize, String)>) -> BatchHandle {
    let stage = Arc::clone(stage);
    tokio::task::spawn_blocking(move || process_batch(&stage, batch))
}

/// Wait for the oldest batch and write its records
async fn drain_one(
    pending: &mut VecDeque<BatchHandle>,
    sink: &mut (dyn Write + Send),
    stage: &ProcessingStage,
    spinner: Option<&ProgressBar>,
) -> Result<()> {
    let Some(handle) = pending.pop_front() else {
        return Ok(());
    };
    let lines = handle
        .await
        .map_err(|e| Error::other(format!("Worker task failed: {}", e)))??;

    for line in &lines {
        sink.write_all(line.as_bytes())?;
        sink.write_all(b"\n")?;
    }
    debug!(kept = lines.len(), "Batch written");

    if let Some(pb) = spinner {
        let stats = stage.stats();
        pb.set_message(format!("{} rows, {} kept", stats.rows, stats.included));
    }
    Ok(())
}

/// Run one batch through the stage, returning the kept records serialized
fn process_batch(stage: &ProcessingStage, batch: Vec<(usize, String)>) -> Result<Vec<String>> {
    let mut kept = Vec::with_capacity(batch.len());
    for (line, text) in batch {
        let Some(mut record) = parse_line(line, &text)? else {
            continue;
        };
        if stage.on_add(&mut record).is_include() {
            kept.push(serde_json::to_string(&record)?);
        }
    }
    Ok(kept)
}

fn write_summary(summary: &ProcessSummary, output: &mut OutputWriter) -> Result<()> {
    if output.format() != crate::cli::OutputFormat::Human {
        return output.data(summary);
    }

    output.success(&format!(
        "✓ Kept {} of {} records from {}",
        summary.stats.included, summary.stats.rows, summary.input
    ))?;
    output.info(&format!("Excluded: {}", summary.stats.excluded))?;
    output.info(&format!("Search-only: {}", summary.stats.search_only))?;
    output.info(&format!(
        "Written to {} in {} ms",
        summary.output, summary.elapsed_ms
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::test_support::SharedBuffer;
    use gazprep_core::StageConfigBuilder;
    use serde_json::Value;
    use std::io::Cursor;

    fn stage(categories: &[&str]) -> Arc<ProcessingStage> {
        let config = StageConfigBuilder::new()
            .include_categories(categories.iter().copied())
            .build()
            .unwrap();
        Arc::new(ProcessingStage::new(config))
    }

    fn input(lines: &[&str]) -> Box<dyn BufRead + Send> {
        Box::new(Cursor::new(lines.join("\n").into_bytes()))
    }

    #[test]
    fn test_process_batch_keeps_and_normalizes() {
        let stage = stage(&["A"]);
        let batch = vec![
            (1, r#"{"SplitCategory":"A","name":"Lyon","lat":"45.7","lon":"4.8","name_type":"name"}"#.to_string()),
            (2, r#"{"SplitCategory":"B","name":"Nice"}"#.to_string()),
            (3, String::new()),
        ];
        let kept = process_batch(&stage, batch).unwrap();

        assert_eq!(kept.len(), 1);
        let record: Value = serde_json::from_str(&kept[0]).unwrap();
        assert_eq!(record["geo"], "45.7,4.8");
        assert_eq!(record["name_type"], "N");
        assert_eq!(stage.stats().rows, 2);
    }

    #[test]
    fn test_process_batch_reports_line_of_bad_record() {
        let stage = stage(&["A"]);
        let batch = vec![
            (10, r#"{"SplitCategory":"A"}"#.to_string()),
            (11, "not json".to_string()),
        ];
        assert!(matches!(
            process_batch(&stage, batch),
            Err(Error::InvalidRecord { line: 11, .. })
        ));
    }

    #[tokio::test]
    async fn test_pipeline_preserves_input_order() {
        let stage = stage(&["A"]);
        let lines: Vec<String> = (0..50)
            .map(|i| {
                let category = if i % 3 == 0 { "B" } else { "A" };
                format!(r#"{{"SplitCategory":"{}","name":"Place {}"}}"#, category, i)
            })
            .collect();
        let refs: Vec<&str> = lines.iter().map(String::as_str).collect();
        let buffer = SharedBuffer::default();

        let stats = run_pipeline(
            Arc::clone(&stage),
            input(&refs),
            Box::new(buffer.clone()),
            3,
            4,
            None,
        )
        .await
        .unwrap();

        let names: Vec<String> = buffer
            .contents()
            .lines()
            .map(|l| serde_json::from_str::<Value>(l).unwrap()["name"].as_str().unwrap().to_string())
            .collect();
        let expected: Vec<String> = (0..50)
            .filter(|i| i % 3 != 0)
            .map(|i| format!("Place {}", i))
            .collect();

        assert_eq!(names, expected);
        assert_eq!(stats.rows, 50);
        assert_eq!(stats.included, 33);
        assert_eq!(stats.excluded, 17);
    }

    #[tokio::test]
    async fn test_pipeline_stops_on_malformed_line() {
        let buffer = SharedBuffer::default();
        let result = run_pipeline(
            stage(&["A"]),
            input(&[r#"{"SplitCategory":"A"}"#, "{", r#"{"SplitCategory":"A"}"#]),
            Box::new(buffer),
            2,
            1,
            None,
        )
        .await;

        assert!(matches!(result, Err(Error::InvalidRecord { line: 2, .. })));
    }

    #[test]
    fn test_summary_as_json() {
        let buffer = SharedBuffer::default();
        let mut output = OutputWriter::with_writer(
            crate::cli::OutputFormat::Json,
            false,
            false,
            Box::new(buffer.clone()),
        );
        let summary = ProcessSummary {
            input: "places.jsonl".into(),
            output: "<stdout>".into(),
            elapsed_ms: 12,
            stats: StatsSnapshot {
                rows: 3,
                included: 2,
                excluded: 1,
                search_only: 0,
            },
        };
        write_summary(&summary, &mut output).unwrap();

        let value: Value = serde_json::from_str(buffer.contents().trim()).unwrap();
        assert_eq!(value["rows"], 3);
        assert_eq!(value["included"], 2);
        assert_eq!(value["input"], "places.jsonl");
    }
}
