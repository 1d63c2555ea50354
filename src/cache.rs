// On-disk JSON cache for fetched dataset splits
use crate::error::AnalysisResult;
use serde::{de::DeserializeOwned, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};
use tracing::debug;

/// Get the cache directory
pub fn get_cache_dir() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("sentilens")
        .join("cache")
}

/// Cache key for one split of a dataset, e.g. "stanfordnlp_imdb-plain_text-train"
pub fn split_key(dataset: &str, config: &str, split: &str, limit: Option<usize>) -> String {
    let base = format!("{}-{}-{}", dataset, config, split);
    let base = match limit {
        Some(n) => format!("{}-first{}", base, n),
        None => base,
    };
    base.chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect()
}

fn cache_path(dir: &Path, key: &str) -> PathBuf {
    dir.join(format!("{}.json", key))
}

/// JSON cache rooted at a directory
pub struct JsonCache {
    dir: PathBuf,
}

impl JsonCache {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    pub fn user_default() -> Self {
        Self::new(get_cache_dir())
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Save data to cache
    pub fn save<T: Serialize>(&self, key: &str, data: &T) -> AnalysisResult<()> {
        fs::create_dir_all(&self.dir)?;

        let bytes = serde_json::to_vec(data)?;
        let path = cache_path(&self.dir, key);
        fs::write(&path, &bytes)?;
        debug!("Cached {} ({} bytes)", path.display(), bytes.len());

        Ok(())
    }

    /// Load from cache if fresh, otherwise return None
    pub fn load_fresh<T: DeserializeOwned>(
        &self,
        key: &str,
        max_age: Duration,
    ) -> AnalysisResult<Option<T>> {
        let path = cache_path(&self.dir, key);

        if !path.exists() {
            return Ok(None);
        }

        // Check age
        let modified = fs::metadata(&path)?.modified()?;
        let age = SystemTime::now()
            .duration_since(modified)
            .unwrap_or(Duration::ZERO);

        if age > max_age {
            debug!("Cache entry {} is stale", key);
            return Ok(None);
        }

        let bytes = fs::read(&path)?;
        match serde_json::from_slice(&bytes) {
            Ok(data) => Ok(Some(data)),
            Err(e) => {
                debug!("Ignoring unreadable cache entry {}: {}", key, e);
                Ok(None)
            }
        }
    }

    /// Clear all cache
    pub fn clear_all(&self) -> AnalysisResult<()> {
        if self.dir.exists() {
            fs::remove_dir_all(&self.dir)?;
        }
        Ok(())
    }

    /// Get cache stats
    pub fn stats(&self) -> AnalysisResult<CacheStats> {
        if !self.dir.exists() {
            return Ok(CacheStats {
                cache_dir: self.dir.clone(),
                ..CacheStats::default()
            });
        }

        let mut total_size = 0u64;
        let mut file_count = 0usize;

        for entry in fs::read_dir(&self.dir)? {
            let entry = entry?;
            if entry.path().extension().is_some_and(|e| e == "json") {
                total_size += entry.metadata()?.len();
                file_count += 1;
            }
        }

        Ok(CacheStats {
            total_size,
            file_count,
            cache_dir: self.dir.clone(),
        })
    }
}

#[derive(Debug, Default)]
pub struct CacheStats {
    pub total_size: u64,
    pub file_count: usize,
    pub cache_dir: PathBuf,
}

impl CacheStats {
    pub fn format_size(&self) -> String {
        if self.total_size >= 1024 * 1024 {
            format!("{:.2} MB", self.total_size as f64 / (1024.0 * 1024.0))
        } else if self.total_size >= 1024 {
            format!("{:.2} KB", self.total_size as f64 / 1024.0)
        } else {
            format!("{} B", self.total_size)
        }
    }
}
