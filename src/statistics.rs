// Error distribution statistics over categorized rows
use crate::categorize::{ErrorCategory, ErrorRow};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Anything that carries an error category label
pub trait Categorized {
    fn error_type(&self) -> &str;

    fn confidence(&self) -> Option<f64> {
        None
    }
}

impl Categorized for ErrorRow {
    fn error_type(&self) -> &str {
        self.error_type.as_str()
    }

    fn confidence(&self) -> Option<f64> {
        self.confidence
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ErrorStatistics {
    pub total_errors: usize,
    pub negation_count: usize,
    pub negation_pct: f64,
    pub mixed_sentiment_count: usize,
    pub mixed_sentiment_pct: f64,
    pub other_count: usize,
    pub other_pct: f64,
}

impl ErrorStatistics {
    pub fn pct(&self, category: ErrorCategory) -> f64 {
        match category {
            ErrorCategory::Negation => self.negation_pct,
            ErrorCategory::MixedSentiment => self.mixed_sentiment_pct,
            ErrorCategory::Other => self.other_pct,
        }
    }

    /// Key/value pairs in report order
    pub fn entries(&self) -> Vec<(&'static str, StatValue)> {
        vec![
            ("total_errors", StatValue::Count(self.total_errors)),
            ("negation_count", StatValue::Count(self.negation_count)),
            ("negation_pct", StatValue::Pct(self.negation_pct)),
            (
                "mixed_sentiment_count",
                StatValue::Count(self.mixed_sentiment_count),
            ),
            (
                "mixed_sentiment_pct",
                StatValue::Pct(self.mixed_sentiment_pct),
            ),
            ("other_count", StatValue::Count(self.other_count)),
            ("other_pct", StatValue::Pct(self.other_pct)),
        ]
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StatValue {
    Count(usize),
    Pct(f64),
}

impl std::fmt::Display for StatValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StatValue::Count(n) => write!(f, "{}", n),
            StatValue::Pct(p) => write!(f, "{:.1}%", p),
        }
    }
}

/// Count / total × 100, or 0.0 for an empty total
pub fn percentage(count: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        count as f64 / total as f64 * 100.0
    }
}

/// Compute the error distribution over the three categories.
///
/// Labels outside the category set still count towards `total_errors`, so the
/// three percentages only sum to 100 when every row is categorized.
pub fn compute_error_statistics<R: Categorized>(rows: &[R]) -> ErrorStatistics {
    let total_errors = rows.len();
    let count_of = |category: ErrorCategory| {
        rows.iter()
            .filter(|row| row.error_type() == category.as_str())
            .count()
    };

    let negation_count = count_of(ErrorCategory::Negation);
    let mixed_sentiment_count = count_of(ErrorCategory::MixedSentiment);
    let other_count = count_of(ErrorCategory::Other);

    ErrorStatistics {
        total_errors,
        negation_count,
        negation_pct: percentage(negation_count, total_errors),
        mixed_sentiment_count,
        mixed_sentiment_pct: percentage(mixed_sentiment_count, total_errors),
        other_count,
        other_pct: percentage(other_count, total_errors),
    }
}

/// Count per distinct error type, most frequent first (ties by name)
pub fn error_distribution<R: Categorized>(rows: &[R]) -> Vec<(String, usize)> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for row in rows {
        *counts.entry(row.error_type()).or_insert(0) += 1;
    }

    let mut distribution: Vec<(String, usize)> = counts
        .into_iter()
        .map(|(error_type, count)| (error_type.to_string(), count))
        .collect();
    distribution.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    distribution
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfidenceStats {
    pub scored_rows: usize,
    pub mean: f64,
    pub median: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfidenceSummary {
    pub overall: ConfidenceStats,
    pub by_error_type: Vec<(String, ConfidenceStats)>,
}

/// Mean and median confidence of misclassified rows, overall and per error
/// type. Rows without a score are skipped; `None` when nothing is scored.
pub fn confidence_summary<R: Categorized>(rows: &[R]) -> Option<ConfidenceSummary> {
    let overall = confidence_stats(rows.iter().filter_map(|row| row.confidence()).collect())?;

    let by_error_type = error_distribution(rows)
        .into_iter()
        .filter_map(|(error_type, _)| {
            let scores: Vec<f64> = rows
                .iter()
                .filter(|row| row.error_type() == error_type)
                .filter_map(|row| row.confidence())
                .collect();
            confidence_stats(scores).map(|stats| (error_type, stats))
        })
        .collect();

    Some(ConfidenceSummary {
        overall,
        by_error_type,
    })
}

fn confidence_stats(scores: Vec<f64>) -> Option<ConfidenceStats> {
    if scores.is_empty() {
        return None;
    }

    Some(ConfidenceStats {
        scored_rows: scores.len(),
        mean: statistical::mean(&scores),
        median: statistical::median(&scores),
    })
}
