// Tabular inputs and outputs: sample-error tables, prediction files, error row exports
use crate::categorize::ErrorRow;
use crate::error::{AnalysisError, AnalysisResult};
use crate::statistics::Categorized;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;
use tracing::debug;

const ERROR_TYPE_COLUMN: &str = "error_type";

/// One row of a sample-errors table, every column kept as text
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SampleError {
    #[serde(skip)]
    pub error_type: String,
    #[serde(flatten)]
    pub columns: BTreeMap<String, String>,
}

impl SampleError {
    pub fn get(&self, column: &str) -> Option<&str> {
        self.columns.get(column).map(String::as_str)
    }
}

impl Categorized for SampleError {
    fn error_type(&self) -> &str {
        &self.error_type
    }

    fn confidence(&self) -> Option<f64> {
        self.get("confidence").and_then(parse_confidence)
    }
}

/// A probability in [0, 1]; NaN, infinities and anything outside the range are rejected
fn parse_confidence(value: &str) -> Option<f64> {
    value
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|score| (0.0..=1.0).contains(score))
}

/// Source of sample-error tables
pub trait TableSource {
    fn read_table(&self, path: &Path) -> AnalysisResult<Vec<SampleError>>;
}

/// Comma-separated file with a header row
pub struct CsvTableSource;

impl TableSource for CsvTableSource {
    fn read_table(&self, path: &Path) -> AnalysisResult<Vec<SampleError>> {
        let file = File::open(path)?;
        let rows = read_sample_errors(file, path)?;
        debug!("Read {} sample errors from {}", rows.len(), path.display());
        Ok(rows)
    }
}

/// Parse a sample-errors CSV. `path` is only used in error messages.
pub fn read_sample_errors<R: Read>(reader: R, path: &Path) -> AnalysisResult<Vec<SampleError>> {
    let mut reader = csv::Reader::from_reader(reader);
    let headers = reader.headers()?.clone();

    let error_type_idx = headers
        .iter()
        .position(|h| h.trim() == ERROR_TYPE_COLUMN)
        .ok_or_else(|| AnalysisError::MissingColumn {
            path: path.to_path_buf(),
            column: ERROR_TYPE_COLUMN.to_string(),
        })?;

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        let columns: BTreeMap<String, String> = headers
            .iter()
            .zip(record.iter())
            .map(|(h, v)| (h.trim().to_string(), v.to_string()))
            .collect();

        rows.push(SampleError {
            error_type: record.get(error_type_idx).unwrap_or("").trim().to_string(),
            columns,
        });
    }

    Ok(rows)
}

/// Parallel sequences read from a predictions file
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PredictionTable {
    pub texts: Vec<String>,
    pub true_labels: Vec<i64>,
    pub predictions: Vec<i64>,
    pub confidences: Option<Vec<f64>>,
}

/// Read a predictions CSV with `text`, `true_label`, `predicted` and an
/// optional `confidence` column. Labels are integer codes or
/// "positive"/"negative".
pub fn read_predictions(path: &Path) -> AnalysisResult<PredictionTable> {
    let file = File::open(path)?;
    read_predictions_from(file, path)
}

pub fn read_predictions_from<R: Read>(reader: R, path: &Path) -> AnalysisResult<PredictionTable> {
    let mut reader = csv::Reader::from_reader(reader);
    let headers = reader.headers()?.clone();

    let column = |name: &str| -> AnalysisResult<usize> {
        headers
            .iter()
            .position(|h| h.trim() == name)
            .ok_or_else(|| AnalysisError::MissingColumn {
                path: path.to_path_buf(),
                column: name.to_string(),
            })
    };
    let text_idx = column("text")?;
    let truth_idx = column("true_label")?;
    let pred_idx = column("predicted")?;
    let confidence_idx = headers.iter().position(|h| h.trim() == "confidence");

    let mut table = PredictionTable {
        confidences: confidence_idx.map(|_| Vec::new()),
        ..PredictionTable::default()
    };

    for (row, record) in reader.records().enumerate() {
        let record = record?;
        let cell = |idx: usize| record.get(idx).unwrap_or("");

        table.texts.push(cell(text_idx).to_string());
        table
            .true_labels
            .push(parse_label(cell(truth_idx), "true_label", row)?);
        table
            .predictions
            .push(parse_label(cell(pred_idx), "predicted", row)?);

        if let (Some(idx), Some(scores)) = (confidence_idx, table.confidences.as_mut()) {
            let value = cell(idx).trim();
            let score = parse_confidence(value).ok_or_else(|| AnalysisError::InvalidValue {
                column: "confidence".to_string(),
                row,
                value: value.to_string(),
            })?;
            scores.push(score);
        }
    }

    Ok(table)
}

fn parse_label(value: &str, column: &str, row: usize) -> AnalysisResult<i64> {
    let value = value.trim();
    match value.to_lowercase().as_str() {
        "positive" => Ok(1),
        "negative" => Ok(0),
        other => other.parse().map_err(|_| AnalysisError::InvalidValue {
            column: column.to_string(),
            row,
            value: value.to_string(),
        }),
    }
}

/// Write error rows as JSON (`.json` extension) or CSV (anything else)
pub fn write_error_rows(path: &Path, rows: &[ErrorRow]) -> AnalysisResult<()> {
    let is_json = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

    let mut file = File::create(path)?;
    if is_json {
        serde_json::to_writer_pretty(&mut file, rows)?;
        writeln!(file)?;
    } else {
        write_error_rows_csv(file, rows)?;
    }

    Ok(())
}

pub fn write_error_rows_csv<W: Write>(writer: W, rows: &[ErrorRow]) -> AnalysisResult<()> {
    let mut writer = csv::Writer::from_writer(writer);
    writer.write_record(ErrorRow::COLUMNS)?;
    for row in rows {
        writer.write_record(row.to_record())?;
    }
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::categorize::categorize_errors;
    use crate::statistics::confidence_summary;
    use tempfile::NamedTempFile;

    const SAMPLE: &str = "\
text,true_label,predicted,error_type,confidence
\"This film is not without its flaws, but overall excellent\",positive,negative,negation,0.62
Oh wonderful another masterpiece,negative,positive,sarcasm,0.91
Great acting but terrible plot,negative,positive,mixed_sentiment,0.55
";

    #[test]
    fn test_read_sample_errors() {
        let rows = read_sample_errors(SAMPLE.as_bytes(), Path::new("sample.csv")).unwrap();

        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].error_type, "negation");
        assert_eq!(
            rows[0].get("text"),
            Some("This film is not without its flaws, but overall excellent")
        );
        assert_eq!(rows[1].error_type(), "sarcasm");
        assert_eq!(rows[2].confidence(), Some(0.55));
    }

    #[test]
    fn test_missing_error_type_column() {
        let err = read_sample_errors("text,label\nhi,1\n".as_bytes(), Path::new("bad.csv"))
            .unwrap_err();
        match err {
            AnalysisError::MissingColumn { column, path } => {
                assert_eq!(column, "error_type");
                assert_eq!(path, Path::new("bad.csv"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_missing_file_surfaces_io_error() {
        let err = CsvTableSource
            .read_table(Path::new("/definitely/not/here.csv"))
            .unwrap_err();
        assert!(matches!(err, AnalysisError::Io(_)));
    }

    #[test]
    fn test_read_table_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(SAMPLE.as_bytes()).unwrap();

        let rows = CsvTableSource.read_table(file.path()).unwrap();
        assert_eq!(rows.len(), 3);
    }

    #[test]
    fn test_sample_error_serializes_all_columns() {
        let rows = read_sample_errors(SAMPLE.as_bytes(), Path::new("sample.csv")).unwrap();
        let json = serde_json::to_value(&rows[2]).unwrap();

        assert_eq!(json["error_type"], "mixed_sentiment");
        assert_eq!(json["predicted"], "positive");
        assert_eq!(json.as_object().map(|o| o.len()), Some(5));
    }

    #[test]
    fn test_read_predictions() {
        let csv = "text,true_label,predicted,confidence\nGood,1,0,0.8\nBad,negative,positive,0.3\n";
        let table = read_predictions_from(csv.as_bytes(), Path::new("preds.csv")).unwrap();

        assert_eq!(table.texts, vec!["Good", "Bad"]);
        assert_eq!(table.true_labels, vec![1, 0]);
        assert_eq!(table.predictions, vec![0, 1]);
        assert_eq!(table.confidences, Some(vec![0.8, 0.3]));
    }

    #[test]
    fn test_read_predictions_without_confidence() {
        let csv = "predicted,text,true_label\n1,Fine,1\n";
        let table = read_predictions_from(csv.as_bytes(), Path::new("preds.csv")).unwrap();
        assert_eq!(table.confidences, None);
        assert_eq!(table.predictions, vec![1]);
    }

    #[test]
    fn test_read_predictions_invalid_label() {
        let csv = "text,true_label,predicted\nGood,yes,0\n";
        let err = read_predictions_from(csv.as_bytes(), Path::new("preds.csv")).unwrap_err();
        assert!(matches!(
            err,
            AnalysisError::InvalidValue { ref column, row: 0, .. } if column == "true_label"
        ));
    }

    #[test]
    fn test_read_predictions_rejects_bad_confidence() {
        for bad in ["NaN", "inf", "7.5", "-0.1"] {
            let csv = format!("text,true_label,predicted,confidence\nGood,1,0,0.3\nBad,0,1,{bad}\n");
            let err = read_predictions_from(csv.as_bytes(), Path::new("preds.csv")).unwrap_err();
            match err {
                AnalysisError::InvalidValue { column, row, value } => {
                    assert_eq!(column, "confidence");
                    assert_eq!(row, 1);
                    assert_eq!(value, bad);
                }
                other => panic!("unexpected error: {other}"),
            }
        }

        let edges = "text,true_label,predicted,confidence\nA,1,0,0\nB,0,1,1.0\n";
        let table = read_predictions_from(edges.as_bytes(), Path::new("preds.csv")).unwrap();
        assert_eq!(table.confidences, Some(vec![0.0, 1.0]));
    }

    #[test]
    fn test_sample_error_ignores_bad_confidence() {
        let csv = "\
text,error_type,confidence
a,other,NaN
b,other,0.3
c,other,0.5
d,other,7.5
";
        let rows = read_sample_errors(csv.as_bytes(), Path::new("sample.csv")).unwrap();
        assert_eq!(rows[0].confidence(), None);
        assert_eq!(rows[3].confidence(), None);

        let summary = confidence_summary(&rows).unwrap();
        assert_eq!(summary.overall.scored_rows, 2);
        assert!((summary.overall.median - 0.4).abs() < 1e-9);
        assert_eq!(summary.by_error_type[0].1, summary.overall);
    }

    #[test]
    fn test_write_error_rows_csv_round_trips_through_sample_reader() {
        let rows = categorize_errors(
            &["Great acting but terrible plot", "Not for me"],
            &[0, 1],
            &[1, 0],
            None,
        )
        .unwrap();

        let mut buffer = Vec::new();
        write_error_rows_csv(&mut buffer, &rows).unwrap();

        let read_back = read_sample_errors(buffer.as_slice(), Path::new("errors.csv")).unwrap();
        assert_eq!(read_back.len(), 2);
        assert_eq!(read_back[0].error_type, "mixed_sentiment");
        assert_eq!(read_back[1].error_type, "negation");
        assert_eq!(read_back[1].get("word_count"), Some("3"));
        assert_eq!(read_back[1].confidence(), None);
    }

    #[test]
    fn test_write_error_rows_json() {
        let rows = categorize_errors(&["Awful but amazing"], &[1], &[0], Some(&[0.4][..])).unwrap();
        let file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();

        write_error_rows(file.path(), &rows).unwrap();

        let content = std::fs::read_to_string(file.path()).unwrap();
        let json: serde_json::Value = serde_json::from_str(&content).unwrap();
        assert_eq!(json[0]["error_type"], "mixed_sentiment");
        assert_eq!(json[0]["confidence"], 0.4);
    }
}
