// Error categorization - one row per misclassified text, tagged by linguistic feature
use crate::error::{AnalysisError, AnalysisResult};
use crate::features::{detect_linguistic_features, FeatureSet};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

/// Characters of review text kept in an error row before truncation
pub const DISPLAY_TEXT_CHARS: usize = 100;

const ELLIPSIS: &str = "...";

/// Binary sentiment label. Integer code 1 is positive, anything else negative.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Label {
    Negative,
    Positive,
}

impl Label {
    pub fn from_code(code: i64) -> Self {
        if code == 1 {
            Self::Positive
        } else {
            Self::Negative
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Negative => "negative",
            Self::Positive => "positive",
        }
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Primary reason a prediction went wrong. Exactly one per error row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    Negation,
    MixedSentiment,
    Other,
}

impl ErrorCategory {
    pub const ALL: [ErrorCategory; 3] = [Self::Negation, Self::MixedSentiment, Self::Other];

    /// Negation wins over mixed sentiment; everything else is "other".
    pub fn from_features(features: &FeatureSet) -> Self {
        if features.has_negation {
            Self::Negation
        } else if features.has_mixed_sentiment {
            Self::MixedSentiment
        } else {
            Self::Other
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Negation => "negation",
            Self::MixedSentiment => "mixed_sentiment",
            Self::Other => "other",
        }
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single misclassified example with its features flattened in
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorRow {
    pub text: String,
    pub true_label: Label,
    pub predicted: Label,
    pub error_type: ErrorCategory,
    pub confidence: Option<f64>,
    #[serde(flatten)]
    pub features: FeatureSet,
}

impl ErrorRow {
    pub const COLUMNS: [&'static str; 10] = [
        "text",
        "true_label",
        "predicted",
        "error_type",
        "confidence",
        "has_negation",
        "has_positive",
        "has_negative",
        "has_mixed_sentiment",
        "word_count",
    ];

    /// Cells in `COLUMNS` order. An absent confidence is an empty cell.
    pub fn to_record(&self) -> Vec<String> {
        vec![
            self.text.clone(),
            self.true_label.to_string(),
            self.predicted.to_string(),
            self.error_type.to_string(),
            self.confidence.map(|c| c.to_string()).unwrap_or_default(),
            self.features.has_negation.to_string(),
            self.features.has_positive.to_string(),
            self.features.has_negative.to_string(),
            self.features.has_mixed_sentiment.to_string(),
            self.features.word_count.to_string(),
        ]
    }
}

pub struct ErrorCategorizer {
    display_chars: usize,
}

impl ErrorCategorizer {
    pub fn new() -> Self {
        Self {
            display_chars: DISPLAY_TEXT_CHARS,
        }
    }

    pub fn with_display_chars(mut self, chars: usize) -> Self {
        self.display_chars = chars;
        self
    }

    /// Build one error row for every position where the true label and the
    /// prediction differ, in input order.
    ///
    /// `texts`, `true_labels` and `predictions` must have the same length, as
    /// must `confidences` when given.
    pub fn categorize<S>(
        &self,
        texts: &[S],
        true_labels: &[i64],
        predictions: &[i64],
        confidences: Option<&[f64]>,
    ) -> AnalysisResult<Vec<ErrorRow>>
    where
        S: AsRef<str> + Sync,
    {
        if texts.len() != true_labels.len() || texts.len() != predictions.len() {
            return Err(AnalysisError::LengthMismatch {
                texts: texts.len(),
                true_labels: true_labels.len(),
                predictions: predictions.len(),
            });
        }

        if let Some(scores) = confidences {
            if scores.len() != texts.len() {
                return Err(AnalysisError::ConfidenceLengthMismatch {
                    expected: texts.len(),
                    actual: scores.len(),
                });
            }
        }

        let mismatches: Vec<usize> = true_labels
            .iter()
            .zip(predictions)
            .enumerate()
            .filter(|(_, (truth, pred))| truth != pred)
            .map(|(i, _)| i)
            .collect();

        debug!(
            "{} of {} predictions are errors",
            mismatches.len(),
            texts.len()
        );

        // Indexed parallel collect keeps input order
        let rows = mismatches
            .par_iter()
            .map(|&i| {
                let text = texts[i].as_ref();
                let features = detect_linguistic_features(text);

                ErrorRow {
                    text: truncate_text(text, self.display_chars),
                    true_label: Label::from_code(true_labels[i]),
                    predicted: Label::from_code(predictions[i]),
                    error_type: ErrorCategory::from_features(&features),
                    confidence: confidences.map(|scores| scores[i]),
                    features,
                }
            })
            .collect();

        Ok(rows)
    }
}

impl Default for ErrorCategorizer {
    fn default() -> Self {
        Self::new()
    }
}

/// Categorize prediction errors with the default display width.
pub fn categorize_errors<S>(
    texts: &[S],
    true_labels: &[i64],
    predictions: &[i64],
    confidences: Option<&[f64]>,
) -> AnalysisResult<Vec<ErrorRow>>
where
    S: AsRef<str> + Sync,
{
    ErrorCategorizer::new().categorize(texts, true_labels, predictions, confidences)
}

/// Keep the first `max_chars` characters, marking the cut with "...".
pub fn truncate_text(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => format!("{}{}", &text[..byte_idx], ELLIPSIS),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn demo_texts() -> Vec<&'static str> {
        vec![
            "This film is not without its flaws but overall excellent",
            "Oh wonderful another masterpiece",
            "Great acting but terrible plot",
        ]
    }

    #[test]
    fn test_demo_categories() {
        let rows = categorize_errors(&demo_texts(), &[1, 0, 0], &[0, 1, 1], None).unwrap();

        let categories: Vec<_> = rows.iter().map(|r| r.error_type).collect();
        assert_eq!(
            categories,
            vec![
                ErrorCategory::Negation,
                ErrorCategory::Other,
                ErrorCategory::MixedSentiment
            ]
        );
        assert_eq!(rows[0].true_label, Label::Positive);
        assert_eq!(rows[0].predicted, Label::Negative);
    }

    #[test]
    fn test_negation_beats_mixed_sentiment() {
        let text = "Not great, not terrible";
        let features = detect_linguistic_features(text);
        assert!(features.has_mixed_sentiment);

        let rows = categorize_errors(&[text], &[1], &[0], None).unwrap();
        assert_eq!(rows[0].error_type, ErrorCategory::Negation);
    }

    #[test]
    fn test_single_other_error() {
        let rows =
            categorize_errors(&["Oh wonderful another masterpiece"], &[0], &[1], None).unwrap();

        assert_eq!(rows.len(), 1);
        let row = &rows[0];
        assert!(row.features.has_positive);
        assert!(!row.features.has_negative);
        assert!(!row.features.has_negation);
        assert!(!row.features.has_mixed_sentiment);
        assert_eq!(row.error_type, ErrorCategory::Other);
        assert_eq!(row.true_label, Label::Negative);
        assert_eq!(row.predicted, Label::Positive);
        assert_eq!(row.confidence, None);
    }

    #[test]
    fn test_only_mismatches_in_order() {
        let texts: Vec<String> = (0..50).map(|i| format!("review number {}", i)).collect();
        let truth: Vec<i64> = (0..50).map(|i| i % 2).collect();
        let preds: Vec<i64> = (0..50).map(|i| if i % 3 == 0 { 1 - i % 2 } else { i % 2 }).collect();

        let rows = categorize_errors(&texts, &truth, &preds, None).unwrap();

        let expected: Vec<String> = (0..50)
            .filter(|i| i % 3 == 0)
            .map(|i| format!("review number {}", i))
            .collect();
        let got: Vec<String> = rows.iter().map(|r| r.text.clone()).collect();
        assert_eq!(got, expected);
    }

    #[test]
    fn test_no_errors() {
        let rows = categorize_errors(&["fine", "ok"], &[1, 0], &[1, 0], None).unwrap();
        assert!(rows.is_empty());
    }

    #[test]
    fn test_confidence_follows_position() {
        let rows = categorize_errors(
            &["a", "b", "c"],
            &[1, 1, 0],
            &[1, 0, 1],
            Some(&[0.9, 0.6, 0.7][..]),
        )
        .unwrap();

        let confidences: Vec<_> = rows.iter().map(|r| r.confidence).collect();
        assert_eq!(confidences, vec![Some(0.6), Some(0.7)]);
    }

    #[test]
    fn test_length_mismatch() {
        let err = categorize_errors(&["a", "b"], &[1], &[0, 0], None).unwrap_err();
        assert!(matches!(
            err,
            AnalysisError::LengthMismatch {
                texts: 2,
                true_labels: 1,
                predictions: 2
            }
        ));

        let err = categorize_errors(&["a"], &[1], &[0], Some(&[0.5, 0.5][..])).unwrap_err();
        assert!(matches!(
            err,
            AnalysisError::ConfidenceLengthMismatch {
                expected: 1,
                actual: 2
            }
        ));
    }

    #[test]
    fn test_truncation() {
        let long = "x".repeat(150);
        let rows = categorize_errors(&[long.as_str()], &[1], &[0], None).unwrap();
        assert_eq!(rows[0].text.chars().count(), 103);
        assert!(rows[0].text.ends_with("..."));

        let exact = "y".repeat(100);
        assert_eq!(truncate_text(&exact, 100), exact);
    }

    #[test]
    fn test_truncation_counts_characters() {
        let text = "é".repeat(120);
        let truncated = truncate_text(&text, 100);
        assert_eq!(truncated, format!("{}...", "é".repeat(100)));
    }

    #[test]
    fn test_label_codes() {
        assert_eq!(Label::from_code(1), Label::Positive);
        assert_eq!(Label::from_code(0), Label::Negative);
        assert_eq!(Label::from_code(2), Label::Negative);

        // Raw codes are compared, so 2 vs 0 is still an error
        let rows = categorize_errors(&["odd"], &[2], &[0], None).unwrap();
        assert_eq!(rows.len(), 1);
    }

    #[test]
    fn test_row_serialization_flattens_features() {
        let rows = categorize_errors(&["Great acting but terrible plot"], &[0], &[1], None).unwrap();
        let json = serde_json::to_value(&rows[0]).unwrap();

        assert_eq!(json["error_type"], "mixed_sentiment");
        assert_eq!(json["true_label"], "negative");
        assert_eq!(json["has_mixed_sentiment"], true);
        assert_eq!(json["word_count"], 5);
        assert!(json["confidence"].is_null());

        let record = rows[0].to_record();
        assert_eq!(record.len(), ErrorRow::COLUMNS.len());
        assert_eq!(record[4], "");
    }
}
