use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::io::IsTerminal;
use std::path::PathBuf;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

mod cache;
mod categorize;
mod cli_output;
mod config;
mod dataset;
mod error;
mod features;
mod report;
mod sample_errors;
mod statistics;

use cache::JsonCache;
use categorize::{truncate_text, ErrorCategorizer, Label};
use cli_output::{OutputMode, OutputWriter};
use config::AnalysisConfig;
use dataset::{extract_texts_and_labels, load_data, DataSource, HuggingFaceSource, Split};
use features::detect_linguistic_features;
use sample_errors::{
    read_predictions, write_error_rows, write_error_rows_csv, CsvTableSource, PredictionTable,
    TableSource,
};
use statistics::{compute_error_statistics, confidence_summary};

/// Reviews run through `categorize --demo`, with labels [1, 0, 0] and predictions [0, 1, 1]
const DEMO_TEXTS: [&str; 3] = [
    "This film is not without its flaws but overall excellent",
    "Oh wonderful another masterpiece",
    "Great acting but terrible plot",
];
const DEMO_LABELS: [i64; 3] = [1, 0, 0];
const DEMO_PREDICTIONS: [i64; 3] = [0, 1, 1];

#[derive(Parser)]
#[command(name = "sentilens")]
#[command(about = "Find which linguistic patterns a sentiment classifier gets wrong", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Load the IMDB dataset and show an example review
    Load {
        /// Load only this split (default: train and test)
        #[arg(short, long, value_enum)]
        split: Option<Split>,

        /// Fetch at most this many reviews per split
        #[arg(short, long)]
        limit: Option<usize>,

        /// Dataset id on the Hugging Face hub
        #[arg(long)]
        dataset: Option<String>,

        /// Rows requested per API call (1-100)
        #[arg(long, default_value = "100")]
        page_size: usize,

        /// Ignore and do not write the local dataset cache
        #[arg(long)]
        no_cache: bool,
    },

    /// Show the lexical features detected in a text
    Features {
        /// Text to inspect
        text: String,

        /// Output format (table, plain, json)
        #[arg(short, long, default_value = "table")]
        format: String,
    },

    /// Categorize prediction errors by linguistic feature
    Categorize {
        /// Predictions CSV with text, true_label, predicted and optional confidence columns
        #[arg(short, long, conflicts_with = "demo")]
        input: Option<PathBuf>,

        /// Run the built-in demo reviews (default when no input is given)
        #[arg(long)]
        demo: bool,

        /// Write error rows to this file (.json for JSON, CSV otherwise)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Output format (table, plain, json, csv)
        #[arg(short, long, default_value = "table")]
        format: String,

        /// Characters of review text kept per error row (default: 100)
        #[arg(long)]
        display_chars: Option<usize>,
    },

    /// Summarize a table of sample errors
    Analyze {
        /// Sample errors CSV (needs an error_type column)
        #[arg(short, long)]
        sample_errors: Option<PathBuf>,

        /// Size of the evaluated test set (default: 5)
        #[arg(short, long, conflicts_with = "from_dataset")]
        total_examples: Option<usize>,

        /// Take the test set size from the IMDB test split
        #[arg(long)]
        from_dataset: bool,

        /// Output format (table, plain, json)
        #[arg(short, long, default_value = "table")]
        format: String,
    },

    /// Show or clear the local dataset cache
    Cache {
        /// Remove every cached split
        #[arg(long)]
        clear: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    match cli.command {
        Commands::Load {
            split,
            limit,
            dataset,
            page_size,
            no_cache,
        } => {
            info!("Loading IMDB dataset from Hugging Face...");

            let config = AnalysisConfig::from_env()
                .with_dataset(dataset)
                .with_row_limit(limit)
                .with_page_size(page_size)
                .with_cache(!no_cache);
            let display_chars = config.display_chars;
            let source =
                HuggingFaceSource::new(config).with_progress(std::io::stderr().is_terminal());
            let data = load_data(&source, split).await?;

            let out = OutputWriter::new(OutputMode::auto());
            out.section("Dataset");
            let shown = match split {
                Some(split) => vec![split],
                None => vec![Split::Train, Split::Test],
            };
            let mut sizes: Vec<(&str, String)> = Vec::new();
            for s in &shown {
                let (_, labels) = extract_texts_and_labels(data.get(*s).unwrap_or_default());
                let positive = labels.iter().filter(|&&l| l == 1).count();
                let (size_key, positive_key) = match s {
                    Split::Train => ("Train size", "Train positive"),
                    Split::Test => ("Test size", "Test positive"),
                };
                sizes.push((size_key, labels.len().to_string()));
                sizes.push((positive_key, positive.to_string()));
            }
            out.key_values(&sizes);

            let example = data.get(shown[0]).and_then(|records| records.first());
            match example {
                Some(example) => {
                    out.section("Example review");
                    println!("  {}", truncate_text(&example.text, display_chars));
                    let label = match Label::from_code(example.label) {
                        Label::Positive => "Positive",
                        Label::Negative => "Negative",
                    };
                    out.key_values(&[("Label", label.to_string())]);

                    out.section("Detected features");
                    out.features(&example.text, &detect_linguistic_features(&example.text))?;
                }
                None => out.warning("Split is empty"),
            }

            Ok(())
        }

        Commands::Features { text, format } => {
            let out = OutputWriter::new(OutputMode::from_format(&format));
            out.features(&text, &detect_linguistic_features(&text))
        }

        Commands::Categorize {
            input,
            demo,
            output,
            format,
            display_chars,
        } => {
            let table = match input {
                Some(path) => read_predictions(&path)
                    .with_context(|| format!("Failed to read predictions from {}", path.display()))?,
                None => {
                    if !demo {
                        info!("No --input given, running the demo reviews");
                    }
                    PredictionTable {
                        texts: DEMO_TEXTS.iter().map(|t| t.to_string()).collect(),
                        true_labels: DEMO_LABELS.to_vec(),
                        predictions: DEMO_PREDICTIONS.to_vec(),
                        confidences: None,
                    }
                }
            };

            let config = AnalysisConfig::from_env().with_display_chars(display_chars);

            info!("Categorizing {} predictions...", table.texts.len());
            let rows = ErrorCategorizer::new()
                .with_display_chars(config.display_chars)
                .categorize(
                    &table.texts,
                    &table.true_labels,
                    &table.predictions,
                    table.confidences.as_deref(),
                )?;
            let stats = compute_error_statistics(&rows);

            if let Some(path) = &output {
                write_error_rows(path, &rows)
                    .with_context(|| format!("Failed to write {}", path.display()))?;
                info!("Wrote {} error rows to {}", rows.len(), path.display());
            }

            if format == "csv" {
                write_error_rows_csv(std::io::stdout(), &rows)?;
                return Ok(());
            }

            let out = OutputWriter::new(OutputMode::from_format(&format));
            if out.is_json() {
                return out.json(&serde_json::json!({
                    "errors": rows,
                    "statistics": stats,
                    "confidence": confidence_summary(&rows),
                }));
            }

            out.section("Error categorization");
            out.error_rows(&rows)?;

            out.section("Error statistics");
            out.statistics(&stats)?;

            if let Some(summary) = confidence_summary(&rows) {
                out.section("Confidence of misclassified examples");
                out.confidence(&summary);
            }

            Ok(())
        }

        Commands::Analyze {
            sample_errors,
            total_examples,
            from_dataset,
            format,
        } => {
            let config = AnalysisConfig::from_env().with_sample_errors_path(sample_errors);
            let path = config.sample_errors_path.clone();
            let fallback = config.fallback_total_examples;

            let total_examples = if from_dataset {
                let source =
                    HuggingFaceSource::new(config).with_progress(std::io::stderr().is_terminal());
                Some(source.fetch(Split::Test).await?.len())
            } else {
                total_examples
            };

            let rows = CsvTableSource
                .read_table(&path)
                .with_context(|| format!("Failed to read sample errors from {}", path.display()))?;

            let report = report::analyze_errors(rows, total_examples, fallback);
            OutputWriter::new(OutputMode::from_format(&format)).analysis_report(&report)
        }

        Commands::Cache { clear } => {
            let cache = JsonCache::user_default();
            let out = OutputWriter::new(OutputMode::auto());

            if clear {
                cache.clear_all()?;
                out.success(&format!("Cleared {}", cache.dir().display()));
                return Ok(());
            }

            let stats = cache.stats()?;
            out.section("Dataset cache");
            out.key_values(&[
                ("Directory", stats.cache_dir.display().to_string()),
                ("Cached splits", stats.file_count.to_string()),
                ("Size", stats.format_size()),
            ]);
            Ok(())
        }
    }
}
