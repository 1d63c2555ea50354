// Terminal rendering for features, error rows and statistics
use crate::categorize::{ErrorCategory, ErrorRow};
use crate::features::FeatureSet;
use crate::report::ErrorAnalysisReport;
use crate::statistics::{ConfidenceSummary, ErrorStatistics};
use anyhow::Result;
use colored::Colorize;
use comfy_table::presets::{ASCII_FULL, UTF8_FULL};
use comfy_table::Table;
use serde::Serialize;
use std::io::{self, IsTerminal};

pub const JSON_ENV: &str = "SENTILENS_JSON";

/// Output mode for CLI commands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// Human-friendly output with colors
    Human,
    /// Machine-readable JSON output
    Json,
    /// Plain text without colors (for pipes/logs)
    Plain,
}

impl OutputMode {
    /// Auto-detect output mode based on environment
    pub fn auto() -> Self {
        if std::env::var(JSON_ENV).is_ok() {
            Self::Json
        } else if !io::stdout().is_terminal() {
            Self::Plain
        } else {
            Self::Human
        }
    }

    /// "json" and "plain" force a mode, anything else auto-detects
    pub fn from_format(format: &str) -> Self {
        match format {
            "json" => Self::Json,
            "plain" => Self::Plain,
            _ => Self::auto(),
        }
    }
}

/// CLI output writer with mode awareness
pub struct OutputWriter {
    mode: OutputMode,
}

impl OutputWriter {
    pub fn new(mode: OutputMode) -> Self {
        Self { mode }
    }

    pub fn is_json(&self) -> bool {
        matches!(self.mode, OutputMode::Json)
    }

    /// Print a section header
    pub fn section(&self, title: &str) {
        match self.mode {
            OutputMode::Human => {
                println!();
                println!("{}", title.cyan().bold());
                println!("{}", "═".repeat(title.chars().count()).cyan());
            }
            OutputMode::Plain => {
                println!();
                println!("{}", title);
                println!("{}", "=".repeat(title.chars().count()));
            }
            OutputMode::Json => {}
        }
    }

    /// Print a success message
    pub fn success(&self, message: &str) {
        match self.mode {
            OutputMode::Human => println!("  {} {}", "✓".green(), message),
            OutputMode::Plain => println!("  [OK] {}", message),
            OutputMode::Json => {}
        }
    }

    /// Print a warning message
    pub fn warning(&self, message: &str) {
        match self.mode {
            OutputMode::Human => eprintln!("  {} {}", "⚠".yellow(), message),
            OutputMode::Plain | OutputMode::Json => eprintln!("  [WARN] {}", message),
        }
    }

    /// Print a key-value table
    pub fn key_values(&self, rows: &[(&str, String)]) {
        let max_key_len = rows.iter().map(|(k, _)| k.len()).max().unwrap_or(0);
        match self.mode {
            OutputMode::Human => {
                for (key, value) in rows {
                    let padded = format!("{:width$}", key, width = max_key_len);
                    println!("  {} │ {}", padded.yellow(), value);
                }
            }
            OutputMode::Plain => {
                for (key, value) in rows {
                    println!("  {:width$} : {}", key, value, width = max_key_len);
                }
            }
            OutputMode::Json => {}
        }
    }

    /// Print horizontal bar chart
    pub fn bar_chart(&self, label: &str, pct: f64, width: usize) {
        let filled = ((pct / 100.0 * width as f64).round() as usize).min(width);
        let bar = match self.mode {
            OutputMode::Human => {
                format!("{}{}", "█".repeat(filled).cyan(), "░".repeat(width - filled))
            }
            OutputMode::Plain => format!("{}{}", "#".repeat(filled), "-".repeat(width - filled)),
            OutputMode::Json => return,
        };

        println!("  {:<16} │{} {:.1}%", label, bar, pct);
    }

    /// Pretty-print any serializable value as JSON
    pub fn json<T: Serialize>(&self, value: &T) -> Result<()> {
        println!("{}", serde_json::to_string_pretty(value)?);
        Ok(())
    }

    fn new_table(&self) -> Table {
        let mut table = Table::new();
        match self.mode {
            OutputMode::Human => table.load_preset(UTF8_FULL),
            _ => table.load_preset(ASCII_FULL),
        };
        table
    }

    pub fn features(&self, text: &str, features: &FeatureSet) -> Result<()> {
        if self.is_json() {
            return self.json(&serde_json::json!({ "text": text, "features": features }));
        }

        self.key_values(&[
            ("has_negation", features.has_negation.to_string()),
            ("has_positive", features.has_positive.to_string()),
            ("has_negative", features.has_negative.to_string()),
            (
                "has_mixed_sentiment",
                features.has_mixed_sentiment.to_string(),
            ),
            ("word_count", features.word_count.to_string()),
        ]);
        Ok(())
    }

    /// Text, true label, prediction and category of each error row
    pub fn error_rows(&self, rows: &[ErrorRow]) -> Result<()> {
        if self.is_json() {
            return self.json(&rows);
        }

        if rows.is_empty() {
            self.success("No prediction errors");
            return Ok(());
        }

        let mut table = self.new_table();
        table.set_header(vec!["", "text", "true_label", "predicted", "error_type"]);
        for (i, row) in rows.iter().enumerate() {
            table.add_row(vec![
                i.to_string(),
                row.text.clone(),
                row.true_label.to_string(),
                row.predicted.to_string(),
                row.error_type.to_string(),
            ]);
        }
        println!("{table}");
        Ok(())
    }

    pub fn statistics(&self, stats: &ErrorStatistics) -> Result<()> {
        if self.is_json() {
            return self.json(stats);
        }

        let rows: Vec<(&str, String)> = stats
            .entries()
            .into_iter()
            .map(|(key, value)| (key, value.to_string()))
            .collect();
        self.key_values(&rows);

        if stats.total_errors > 0 {
            println!();
            for category in ErrorCategory::ALL {
                self.bar_chart(category.as_str(), stats.pct(category), 30);
            }
        }
        Ok(())
    }

    pub fn confidence(&self, summary: &ConfidenceSummary) {
        if self.is_json() {
            return;
        }

        let mut table = self.new_table();
        table.set_header(vec!["error_type", "scored", "mean", "median"]);
        table.add_row(vec![
            "all".to_string(),
            summary.overall.scored_rows.to_string(),
            format!("{:.3}", summary.overall.mean),
            format!("{:.3}", summary.overall.median),
        ]);
        for (error_type, stats) in &summary.by_error_type {
            table.add_row(vec![
                error_type.clone(),
                stats.scored_rows.to_string(),
                format!("{:.3}", stats.mean),
                format!("{:.3}", stats.median),
            ]);
        }
        println!("{table}");
    }

    pub fn analysis_report(&self, report: &ErrorAnalysisReport) -> Result<()> {
        if self.is_json() {
            return self.json(report);
        }

        self.section("Error Analysis Results");
        self.key_values(&[
            (
                "Total errors analyzed",
                report.summary.total_errors.to_string(),
            ),
            ("Total examples", report.summary.total_examples.to_string()),
            ("Error rate", format!("{:.1}%", report.summary.error_rate)),
        ]);

        self.section("Error distribution");
        for entry in &report.error_distribution {
            println!("  {}: {}", entry.error_type, entry.count);
        }

        if let Some(confidence) = &report.confidence {
            self.section("Confidence of misclassified examples");
            self.confidence(confidence);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_format() {
        assert_eq!(OutputMode::from_format("json"), OutputMode::Json);
        assert_eq!(OutputMode::from_format("plain"), OutputMode::Plain);
        // Will be Plain when running in cargo test (no TTY)
        assert!(matches!(
            OutputMode::from_format("table"),
            OutputMode::Plain | OutputMode::Human | OutputMode::Json
        ));
    }

    #[test]
    fn test_writer_modes() {
        assert!(OutputWriter::new(OutputMode::Json).is_json());
        assert!(!OutputWriter::new(OutputMode::Plain).is_json());
    }
}
