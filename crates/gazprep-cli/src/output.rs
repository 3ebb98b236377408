//! Output formatting and writing utilities
//!
//! Reports (summaries, verdicts, configuration) are written in the format
//! chosen with `--output`. Processed records never pass through here; they
//! are always JSON Lines.

use crate::cli::OutputFormat;
use crate::error::Result;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use is_terminal::IsTerminal;
use serde::Serialize;
use std::io::{self, Write};
use std::time::Duration;
use tracing::trace;

/// Trait for formatting serializable values
pub trait OutputFormatter {
    /// Format a serializable value
    fn format<T: Serialize>(&self, value: &T) -> Result<String>;
}

impl OutputFormatter for OutputFormat {
    fn format<T: Serialize>(&self, value: &T) -> Result<String> {
        match self {
            OutputFormat::Json => Ok(serde_json::to_string(value)?),
            OutputFormat::JsonPretty => Ok(serde_json::to_string_pretty(value)?),
            OutputFormat::Yaml => Ok(serde_yaml::to_string(value)?),
            // Human callers format their own tables; this is the fallback
            OutputFormat::Human => Ok(serde_json::to_string_pretty(value)?),
        }
    }
}

/// Output writer that handles different output formats and colors
pub struct OutputWriter {
    format: OutputFormat,
    use_color: bool,
    show_progress: bool,
    quiet: bool,
    writer: Box<dyn Write + Send>,
}

impl OutputWriter {
    /// Create a new output writer on stdout
    pub fn new(format: OutputFormat, use_color: bool, quiet: bool) -> Self {
        Self {
            format,
            use_color,
            show_progress: !quiet && io::stderr().is_terminal(),
            quiet,
            writer: Box::new(io::stdout()),
        }
    }

    /// Create an output writer with a custom writer
    pub fn with_writer(
        format: OutputFormat,
        use_color: bool,
        quiet: bool,
        writer: Box<dyn Write + Send>,
    ) -> Self {
        Self {
            format,
            use_color,
            show_progress: false, // No progress bars with custom writers
            quiet,
            writer,
        }
    }

    /// Send reports to stderr, leaving stdout to the records
    pub fn redirect_to_stderr(&mut self) {
        self.writer = Box::new(io::stderr());
    }

    /// Get the output format
    pub fn format(&self) -> OutputFormat {
        self.format
    }

    /// Disable progress indicators
    pub fn disable_progress(&mut self) {
        self.show_progress = false;
    }

    /// Write raw output
    pub fn write(&mut self, content: &str) -> Result<()> {
        write!(self.writer, "{}", content)?;
        self.writer.flush()?;
        Ok(())
    }

    /// Write a line of output
    pub fn writeln(&mut self, content: &str) -> Result<()> {
        writeln!(self.writer, "{}", content)?;
        self.writer.flush()?;
        Ok(())
    }

    /// Write an info message
    pub fn info(&mut self, message: &str) -> Result<()> {
        if self.quiet || self.format != OutputFormat::Human {
            return Ok(());
        }

        if self.use_color {
            self.writeln(&format!("{} {}", "ℹ".blue(), message))
        } else {
            self.writeln(&format!("INFO: {}", message))
        }
    }

    /// Write a success message
    pub fn success(&mut self, message: &str) -> Result<()> {
        if self.quiet || self.format != OutputFormat::Human {
            return Ok(());
        }

        if self.use_color {
            self.writeln(&message.green().to_string())
        } else {
            self.writeln(message)
        }
    }

    /// Write a warning message
    pub fn warning(&mut self, message: &str) -> Result<()> {
        if self.format != OutputFormat::Human {
            return Ok(());
        }

        if self.use_color {
            self.writeln(&message.yellow().to_string())
        } else {
            self.writeln(&format!("WARNING: {}", message))
        }
    }

    /// Write a section header
    pub fn section(&mut self, title: &str) -> Result<()> {
        if self.quiet || self.format != OutputFormat::Human {
            return Ok(());
        }

        self.writeln("")?;
        if self.use_color {
            self.writeln(&format!("═══ {} ═══", title).bright_blue().to_string())
        } else {
            self.writeln(&format!("=== {} ===", title))
        }
    }

    /// Write data in the configured format
    pub fn data<T: Serialize>(&mut self, value: &T) -> Result<()> {
        let formatted = self.format.format(value)?;
        trace!(bytes = formatted.len(), "Outputting data");

        match self.format {
            OutputFormat::Yaml => self.write(&formatted),
            _ => self.writeln(&formatted),
        }
    }

    /// Write a table (for human format)
    pub fn table(&mut self, headers: &[&str], rows: Vec<Vec<String>>) -> Result<()> {
        if self.quiet || self.format != OutputFormat::Human {
            return Ok(());
        }

        let mut widths = headers
            .iter()
            .map(|h| h.chars().count())
            .collect::<Vec<_>>();
        for row in &rows {
            for (i, cell) in row.iter().enumerate() {
                if i < widths.len() {
                    widths[i] = widths[i].max(cell.chars().count());
                }
            }
        }

        let header_row = headers
            .iter()
            .enumerate()
            .map(|(i, h)| format!("{:width$}", h, width = widths[i]))
            .collect::<Vec<_>>()
            .join(" │ ");

        if self.use_color {
            self.writeln(&header_row.bold().to_string())?;
        } else {
            self.writeln(&header_row)?;
        }

        let separator = widths
            .iter()
            .map(|w| "─".repeat(*w))
            .collect::<Vec<_>>()
            .join("─┼─");
        self.writeln(&separator)?;

        for row in rows {
            let row_str = row
                .iter()
                .enumerate()
                .map(|(i, cell)| match widths.get(i) {
                    Some(width) => format!("{:width$}", cell, width = *width),
                    None => cell.clone(),
                })
                .collect::<Vec<_>>()
                .join(" │ ");
            self.writeln(row_str.trim_end())?;
        }

        Ok(())
    }

    /// Create a spinner for indeterminate progress
    pub fn spinner(&self, message: &str) -> Option<ProgressBar> {
        if !self.show_progress {
            return None;
        }

        let pb = ProgressBar::new_spinner();
        pb.set_style(default_spinner_style());
        pb.set_message(message.to_string());
        pb.enable_steady_tick(Duration::from_millis(100));
        Some(pb)
    }
}

/// Helper function to create a spinner style
pub fn default_spinner_style() -> ProgressStyle {
    ProgressStyle::default_spinner()
        .template("{spinner:.green} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner())
}


#[cfg(test)]
mod tests {
    use super::test_support::SharedBuffer;
    use super::*;
    use serde_json::json;

    fn writer(format: OutputFormat, quiet: bool) -> (OutputWriter, SharedBuffer) {
        let buffer = SharedBuffer::default();
        let output = OutputWriter::with_writer(format, false, quiet, Box::new(buffer.clone()));
        (output, buffer)
    }

    #[test]
    fn test_human_messages() {
        let (mut output, buffer) = writer(OutputFormat::Human, false);
        output.info("reading input").unwrap();
        output.warning("3 records without category").unwrap();
        output.section("Summary").unwrap();

        assert_eq!(
            buffer.contents(),
            "INFO: reading input\nWARNING: 3 records without category\n\n=== Summary ===\n"
        );
    }

    #[test]
    fn test_quiet_suppresses_info_but_not_warnings() {
        let (mut output, buffer) = writer(OutputFormat::Human, true);
        output.info("hidden").unwrap();
        output.success("hidden").unwrap();
        output.warning("shown").unwrap();
        assert_eq!(buffer.contents(), "WARNING: shown\n");
    }

    #[test]
    fn test_machine_formats_only_emit_data() {
        let (mut output, buffer) = writer(OutputFormat::Json, false);
        output.info("hidden").unwrap();
        output.data(&json!({"rows": 2})).unwrap();
        assert_eq!(buffer.contents(), "{\"rows\":2}\n");

        let (mut output, buffer) = writer(OutputFormat::Yaml, false);
        output.data(&json!({"rows": 2})).unwrap();
        assert_eq!(buffer.contents(), "rows: 2\n");
    }

    #[test]
    fn test_table_alignment() {
        let (mut output, buffer) = writer(OutputFormat::Human, false);
        output
            .table(
                &["line", "verdict"],
                vec![
                    vec!["1".into(), "include".into()],
                    vec!["12".into(), "exclude".into()],
                ],
            )
            .unwrap();

        let lines: Vec<String> = buffer.contents().lines().map(str::to_string).collect();
        assert_eq!(lines[0], "line │ verdict");
        assert_eq!(lines[2], "1    │ include");
        assert_eq!(lines[3], "12   │ exclude");
    }

    #[test]
    fn test_no_spinner_with_custom_writer() {
        let (output, _) = writer(OutputFormat::Human, false);
        assert!(output.spinner("working").is_none());
    }
}
