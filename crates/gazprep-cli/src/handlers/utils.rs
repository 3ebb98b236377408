//! Shared utilities for command handlers

use crate::cli::{input_path, StageOverrides};
use crate::config::Config;
use crate::error::{Error, Result};
use gazprep_core::{JsonRecord, ProcessingStage};
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;

/// Build the processing stage from the config file and command-line overrides
pub fn build_stage(config: &Config, overrides: &StageOverrides) -> Result<ProcessingStage> {
    let mut params = config.stage.clone();
    overrides.apply(&mut params);
    Ok(ProcessingStage::from_params(&params)?)
}

/// Open a JSON Lines input, stdin when no path (or `-`) is given
pub fn open_input(input: Option<&Path>) -> Result<Box<dyn BufRead + Send>> {
    match input_path(input) {
        Some(path) => {
            if !path.exists() {
                return Err(Error::FileNotFound {
                    path: path.to_path_buf(),
                });
            }
            Ok(Box::new(BufReader::new(File::open(path)?)))
        }
        None => Ok(Box::new(BufReader::new(io::stdin()))),
    }
}

/// Display name for an input in summaries
pub fn input_label(input: Option<&Path>) -> String {
    input_path(input)
        .map(|path| path.display().to_string())
        .unwrap_or_else(|| "<stdin>".to_string())
}

/// Parse one input line; blank lines yield `None`
pub fn parse_line(line: usize, text: &str) -> Result<Option<JsonRecord>> {
    if text.trim().is_empty() {
        return Ok(None);
    }
    JsonRecord::from_json_str(text)
        .map(Some)
        .map_err(|e| Error::InvalidRecord {
            line,
            message: e.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use gazprep_core::{RecordAccessor, Verdict};
    use std::path::PathBuf;

    #[test]
    fn test_parse_line() {
        let record = parse_line(1, r#"{"name": "Lyon"}"#).unwrap().unwrap();
        assert_eq!(record.get("name").as_deref(), Some("Lyon"));

        assert!(parse_line(2, "   ").unwrap().is_none());

        match parse_line(7, "[1, 2]") {
            Err(Error::InvalidRecord { line, .. }) => assert_eq!(line, 7),
            other => panic!("expected invalid record, got {:?}", other.map(|_| ())),
        }
        assert!(matches!(
            parse_line(8, "{not json"),
            Err(Error::InvalidRecord { line: 8, .. })
        ));
    }

    #[test]
    fn test_build_stage_applies_overrides() {
        let mut config = Config::default();
        config.stage.include_category = Some(vec!["A".into()]);
        let overrides = StageOverrides {
            include_category: vec!["B".into()],
            ..Default::default()
        };
        let stage = build_stage(&config, &overrides).unwrap();

        let mut record = JsonRecord::new().with_field("SplitCategory", "B");
        assert_eq!(stage.on_add(&mut record), Verdict::Include);
    }

    #[test]
    fn test_missing_input_file() {
        let path = PathBuf::from("/nonexistent/places.jsonl");
        assert!(matches!(
            open_input(Some(&path)),
            Err(Error::FileNotFound { .. })
        ));
        assert_eq!(input_label(None), "<stdin>");
        assert_eq!(input_label(Some(Path::new("-"))), "<stdin>");
    }
}
