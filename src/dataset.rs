// IMDB dataset loading through the Hugging Face datasets-server rows API
use crate::cache::{split_key, JsonCache};
use crate::config::AnalysisConfig;
use crate::error::{AnalysisError, AnalysisResult};
use indicatif::{ProgressBar, ProgressStyle};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, clap::ValueEnum)]
pub enum Split {
    Train,
    Test,
}

impl Split {
    pub fn as_str(&self) -> &'static str {
        match self {
            Split::Train => "train",
            Split::Test => "test",
        }
    }
}

impl fmt::Display for Split {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A review and its integer sentiment label (1 positive, 0 negative)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabeledText {
    pub text: String,
    pub label: i64,
}

/// Result of `load_data`: one named split, or both train and test
#[derive(Debug, Clone)]
pub enum DatasetSplits {
    Single {
        split: Split,
        records: Vec<LabeledText>,
    },
    Both {
        train: Vec<LabeledText>,
        test: Vec<LabeledText>,
    },
}

impl DatasetSplits {
    pub fn get(&self, wanted: Split) -> Option<&[LabeledText]> {
        match self {
            DatasetSplits::Single { split, records } if *split == wanted => {
                Some(records.as_slice())
            }
            DatasetSplits::Single { .. } => None,
            DatasetSplits::Both { train, test } => match wanted {
                Split::Train => Some(train.as_slice()),
                Split::Test => Some(test.as_slice()),
            },
        }
    }
}

/// Source of labeled review text
#[allow(async_fn_in_trait)]
pub trait DataSource {
    async fn fetch(&self, split: Split) -> AnalysisResult<Vec<LabeledText>>;
}

/// Load one split when `split` is given, otherwise both train and test.
pub async fn load_data<D: DataSource>(
    source: &D,
    split: Option<Split>,
) -> AnalysisResult<DatasetSplits> {
    match split {
        Some(split) => {
            info!("Loading {} split...", split);
            let records = source.fetch(split).await?;
            Ok(DatasetSplits::Single { split, records })
        }
        None => {
            info!("Loading train and test splits...");
            let train = source.fetch(Split::Train).await?;
            let test = source.fetch(Split::Test).await?;
            Ok(DatasetSplits::Both { train, test })
        }
    }
}

/// Split records into parallel text and label sequences
pub fn extract_texts_and_labels(records: &[LabeledText]) -> (Vec<String>, Vec<i64>) {
    records
        .iter()
        .map(|record| (record.text.clone(), record.label))
        .unzip()
}

#[derive(Debug, Deserialize)]
struct RowsPage {
    rows: Vec<RowEntry>,
    num_rows_total: usize,
}

#[derive(Debug, Deserialize)]
struct RowEntry {
    row: LabeledText,
}

/// Pages through a dataset split via `GET {endpoint}?dataset=..&config=..&split=..&offset=..&length=..`
pub struct HuggingFaceSource {
    client: reqwest::Client,
    config: AnalysisConfig,
    cache: Option<JsonCache>,
    show_progress: bool,
}

impl HuggingFaceSource {
    pub fn new(config: AnalysisConfig) -> Self {
        let cache = config.use_cache.then(JsonCache::user_default);
        Self {
            client: reqwest::Client::new(),
            config,
            cache,
            show_progress: true,
        }
    }

    pub fn with_progress(mut self, show: bool) -> Self {
        self.show_progress = show;
        self
    }

    fn cache_key(&self, split: Split) -> String {
        split_key(
            &self.config.dataset,
            &self.config.dataset_config,
            split.as_str(),
            self.config.row_limit,
        )
    }

    async fn fetch_page(&self, split: Split, offset: usize) -> AnalysisResult<RowsPage> {
        debug!(
            "GET {} split={} offset={} length={}",
            self.config.rows_endpoint, split, offset, self.config.page_size
        );

        let offset = offset.to_string();
        let length = self.config.page_size.to_string();
        let response = self
            .client
            .get(&self.config.rows_endpoint)
            .query(&[
                ("dataset", self.config.dataset.as_str()),
                ("config", self.config.dataset_config.as_str()),
                ("split", split.as_str()),
                ("offset", offset.as_str()),
                ("length", length.as_str()),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AnalysisError::Dataset(format!(
                "{} {} split returned {}: {}",
                self.config.dataset,
                split,
                status,
                body.trim()
            )));
        }

        let bytes = response.bytes().await?;
        parse_rows_page(&bytes)
    }

    fn progress_bar(&self, len: usize, split: Split) -> Option<ProgressBar> {
        if !self.show_progress {
            return None;
        }

        let pb = ProgressBar::new(len as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("[{elapsed}] {bar:40.cyan/blue} {pos}/{len} reviews {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("=>-"),
        );
        pb.set_message(split.to_string());
        Some(pb)
    }

    async fn download(&self, split: Split) -> AnalysisResult<Vec<LabeledText>> {
        let first = self.fetch_page(split, 0).await?;
        let target = match self.config.row_limit {
            Some(limit) => limit.min(first.num_rows_total),
            None => first.num_rows_total,
        };

        let pb = self.progress_bar(target, split);
        let mut records: Vec<LabeledText> = Vec::with_capacity(target);
        let mut page = first;

        loop {
            if page.rows.is_empty() {
                break;
            }
            records.extend(page.rows.into_iter().map(|entry| entry.row));
            if let Some(pb) = &pb {
                pb.set_position(records.len().min(target) as u64);
            }
            if records.len() >= target {
                break;
            }
            page = self.fetch_page(split, records.len()).await?;
        }

        if let Some(pb) = pb {
            pb.finish_and_clear();
        }

        records.truncate(target);
        Ok(records)
    }
}

impl DataSource for HuggingFaceSource {
    async fn fetch(&self, split: Split) -> AnalysisResult<Vec<LabeledText>> {
        let key = self.cache_key(split);

        if let Some(cache) = &self.cache {
            if let Some(records) =
                cache.load_fresh::<Vec<LabeledText>>(&key, self.config.cache_max_age)?
            {
                info!("Using cached {} split ({} reviews)", split, records.len());
                return Ok(records);
            }
        }

        info!(
            "Downloading {} {} split from {}",
            self.config.dataset, split, self.config.rows_endpoint
        );
        let records = self.download(split).await?;

        if let Some(cache) = &self.cache {
            cache.save(&key, &records)?;
        }

        Ok(records)
    }
}

fn parse_rows_page(bytes: &[u8]) -> AnalysisResult<RowsPage> {
    Ok(serde_json::from_slice(bytes)?)
}
