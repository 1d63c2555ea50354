// Runtime configuration with CLI/env overrides
use crate::categorize::DISPLAY_TEXT_CHARS;
use std::path::PathBuf;
use std::time::Duration;

pub const DEFAULT_DATASET: &str = "stanfordnlp/imdb";
pub const DEFAULT_DATASET_CONFIG: &str = "plain_text";
pub const DEFAULT_ROWS_ENDPOINT: &str = "https://datasets-server.huggingface.co/rows";
pub const ENDPOINT_ENV: &str = "SENTILENS_DATASETS_ENDPOINT";

/// The rows API serves at most 100 rows per request
pub const MAX_PAGE_SIZE: usize = 100;

/// Example count reported when no test split is supplied
pub const FALLBACK_TOTAL_EXAMPLES: usize = 5;

#[derive(Debug, Clone)]
pub struct AnalysisConfig {
    pub dataset: String,
    pub dataset_config: String,
    pub rows_endpoint: String,
    pub page_size: usize,
    pub row_limit: Option<usize>,
    pub display_chars: usize,
    pub use_cache: bool,
    pub cache_max_age: Duration,
    pub sample_errors_path: PathBuf,
    pub fallback_total_examples: usize,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            dataset: DEFAULT_DATASET.to_string(),
            dataset_config: DEFAULT_DATASET_CONFIG.to_string(),
            rows_endpoint: DEFAULT_ROWS_ENDPOINT.to_string(),
            page_size: MAX_PAGE_SIZE,
            row_limit: None,
            display_chars: DISPLAY_TEXT_CHARS,
            use_cache: true,
            cache_max_age: Duration::from_secs(7 * 24 * 60 * 60),
            sample_errors_path: PathBuf::from("data/sample_errors.csv"),
            fallback_total_examples: FALLBACK_TOTAL_EXAMPLES,
        }
    }
}

impl AnalysisConfig {
    /// Defaults plus environment overrides
    pub fn from_env() -> Self {
        let config = Self::default();
        match std::env::var(ENDPOINT_ENV) {
            Ok(endpoint) if !endpoint.trim().is_empty() => config.with_endpoint(endpoint),
            _ => config,
        }
    }

    pub fn with_dataset(mut self, dataset: Option<String>) -> Self {
        if let Some(dataset) = dataset {
            self.dataset = dataset;
        }
        self
    }

    pub fn with_endpoint(mut self, endpoint: String) -> Self {
        self.rows_endpoint = endpoint;
        self
    }

    pub fn with_row_limit(mut self, limit: Option<usize>) -> Self {
        self.row_limit = limit;
        self
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.clamp(1, MAX_PAGE_SIZE);
        self
    }

    pub fn with_display_chars(mut self, chars: Option<usize>) -> Self {
        if let Some(chars) = chars {
            self.display_chars = chars;
        }
        self
    }

    pub fn with_cache(mut self, use_cache: bool) -> Self {
        self.use_cache = use_cache;
        self
    }

    pub fn with_sample_errors_path(mut self, path: Option<PathBuf>) -> Self {
        if let Some(path) = path {
            self.sample_errors_path = path;
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AnalysisConfig::default();
        assert_eq!(config.dataset, "stanfordnlp/imdb");
        assert_eq!(config.page_size, 100);
        assert_eq!(config.display_chars, 100);
        assert_eq!(config.fallback_total_examples, 5);
        assert!(config.row_limit.is_none());
    }

    #[test]
    fn test_overrides() {
        let config = AnalysisConfig::default()
            .with_dataset(Some("imdb".to_string()))
            .with_dataset(None)
            .with_page_size(500)
            .with_row_limit(Some(10))
            .with_sample_errors_path(Some(PathBuf::from("/tmp/errors.csv")));

        assert_eq!(config.dataset, "imdb");
        assert_eq!(config.page_size, MAX_PAGE_SIZE);
        assert_eq!(config.row_limit, Some(10));
        assert_eq!(config.sample_errors_path, PathBuf::from("/tmp/errors.csv"));

        assert_eq!(AnalysisConfig::default().with_page_size(0).page_size, 1);
        assert_eq!(AnalysisConfig::default().with_display_chars(None).display_chars, 100);
        assert_eq!(AnalysisConfig::default().with_display_chars(Some(40)).display_chars, 40);
    }
}
