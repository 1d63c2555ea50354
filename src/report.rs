// Error analysis report over a sample-errors table
use crate::sample_errors::SampleError;
use crate::statistics::{
    compute_error_statistics, confidence_summary, error_distribution, percentage,
    ConfidenceSummary, ErrorStatistics,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::info;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorSummary {
    pub total_examples: usize,
    pub total_errors: usize,
    pub error_rate: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DistributionEntry {
    pub error_type: String,
    pub count: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct ErrorAnalysisReport {
    pub generated_at: DateTime<Utc>,
    pub summary: ErrorSummary,
    pub error_distribution: Vec<DistributionEntry>,
    pub statistics: ErrorStatistics,
    pub confidence: Option<ConfidenceSummary>,
    pub sample_errors: Vec<SampleError>,
}

/// Summarize a table of already-categorized errors.
///
/// `total_examples` is the size of the evaluated test set; when it is unknown
/// (or empty) `fallback_total_examples` stands in for it.
pub fn analyze_errors(
    sample_errors: Vec<SampleError>,
    total_examples: Option<usize>,
    fallback_total_examples: usize,
) -> ErrorAnalysisReport {
    let total_examples = total_examples
        .filter(|&n| n > 0)
        .unwrap_or(fallback_total_examples);
    let total_errors = sample_errors.len();

    let error_distribution = error_distribution(&sample_errors)
        .into_iter()
        .map(|(error_type, count)| DistributionEntry { error_type, count })
        .collect();

    info!(
        "Analyzed {} errors over {} examples",
        total_errors, total_examples
    );

    ErrorAnalysisReport {
        generated_at: Utc::now(),
        summary: ErrorSummary {
            total_examples,
            total_errors,
            error_rate: percentage(total_errors, total_examples),
        },
        error_distribution,
        statistics: compute_error_statistics(&sample_errors),
        confidence: confidence_summary(&sample_errors),
        sample_errors,
    }
}
