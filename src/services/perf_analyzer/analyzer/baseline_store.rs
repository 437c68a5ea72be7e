//! Baseline persistence
//!
//! One pretty-printed JSON file per baseline, named
//! `{testName}-{sanitized timestamp}.json`, in a single baselines directory.
//! Files are written once and never updated.

use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::services::perf_analyzer::models::BaselineMetrics;
use crate::utils::{DirEntryInfo, list_files, modified_time};

const EXTENSION: &str = ".json";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Baseline I/O failed for {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid baseline JSON in {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("No baseline matches '{pattern}'")]
    NotFound { pattern: String },

    #[error("Baseline {path} already exists")]
    AlreadyExists { path: PathBuf },
}

pub type StoreResult<T> = Result<T, StoreError>;

/// File-backed baseline store rooted at one directory
#[derive(Debug, Clone)]
pub struct BaselineStore {
    dir: PathBuf,
}

impl BaselineStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// `{testName}-{timestamp}.json` with `:` and `.` in the timestamp replaced by `-`
    pub fn file_name_for(baseline: &BaselineMetrics) -> String {
        let timestamp = baseline.timestamp.replace([':', '.'], "-");
        format!("{}-{}{}", baseline.test_name, timestamp, EXTENSION)
    }

    /// Write `baseline` and return its path; the directory is created on first use
    ///
    /// Never replaces an existing file.
    pub fn save(&self, baseline: &BaselineMetrics) -> StoreResult<PathBuf> {
        std::fs::create_dir_all(&self.dir)
            .map_err(|source| StoreError::Io { path: self.dir.clone(), source })?;

        let path = self.dir.join(Self::file_name_for(baseline));
        let json = serde_json::to_string_pretty(baseline)
            .map_err(|source| StoreError::Json { path: path.clone(), source })?;

        let mut file = std::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .map_err(|source| match source.kind() {
                std::io::ErrorKind::AlreadyExists => {
                    StoreError::AlreadyExists { path: path.clone() }
                },
                _ => StoreError::Io { path: path.clone(), source },
            })?;
        file.write_all(json.as_bytes())
            .map_err(|source| StoreError::Io { path: path.clone(), source })?;

        tracing::info!("Saved baseline '{}' to {}", baseline.test_name, path.display());
        Ok(path)
    }

    pub fn load(&self, path: &Path) -> StoreResult<BaselineMetrics> {
        let content = std::fs::read_to_string(path)
            .map_err(|source| StoreError::Io { path: path.to_path_buf(), source })?;
        serde_json::from_str(&content)
            .map_err(|source| StoreError::Json { path: path.to_path_buf(), source })
    }

    /// Resolve a name or prefix to a stored baseline file
    ///
    /// Resolution order:
    /// 1. a stored file whose stem equals the pattern
    /// 2. the most recently modified stored file whose name starts with it
    /// 3. the pattern itself, if it names an existing file
    pub fn find_by_pattern(&self, pattern: &str) -> StoreResult<PathBuf> {
        let stem = self.normalize_pattern(pattern);
        let candidates: Vec<DirEntryInfo> = self
            .stored_files()
            .into_iter()
            .filter(|f| f.name.starts_with(&stem))
            .collect();

        let exact = format!("{}{}", stem, EXTENSION);
        if let Some(found) = candidates.iter().find(|f| f.name == exact) {
            return Ok(found.path.clone());
        }

        if let Some(latest) = candidates.iter().max_by_key(|f| modified_time(&f.path)) {
            if candidates.len() > 1 {
                tracing::debug!(
                    "{} baselines match '{}', using most recent {}",
                    candidates.len(),
                    pattern,
                    latest.name
                );
            }
            return Ok(latest.path.clone());
        }

        let direct = Path::new(pattern);
        if direct.is_file() {
            return Ok(direct.to_path_buf());
        }

        Err(StoreError::NotFound { pattern: pattern.to_string() })
    }

    pub fn load_by_pattern(&self, pattern: &str) -> StoreResult<BaselineMetrics> {
        let path = self.find_by_pattern(pattern)?;
        self.load(&path)
    }

    /// Stored baselines, newest name first
    pub fn list(&self) -> Vec<DirEntryInfo> {
        let mut files = self.stored_files();
        files.sort_by(|a, b| b.name.cmp(&a.name));
        files
    }

    /// The first entry of [`list`](Self::list), loaded
    pub fn latest(&self) -> StoreResult<BaselineMetrics> {
        let newest = self
            .list()
            .into_iter()
            .next()
            .ok_or_else(|| StoreError::NotFound { pattern: "*".to_string() })?;
        self.load(&newest.path)
    }

    /// `.json` files of the store directory; empty when it does not exist yet
    fn stored_files(&self) -> Vec<DirEntryInfo> {
        match list_files(&self.dir) {
            Ok(files) => files.into_iter().filter(|f| f.name.ends_with(EXTENSION)).collect(),
            Err(e) => {
                tracing::debug!("Baselines directory {} not readable: {}", self.dir.display(), e);
                Vec::new()
            },
        }
    }

    /// Drop a trailing `.json` and a leading baselines-directory component
    fn normalize_pattern(&self, pattern: &str) -> String {
        let stem = pattern.strip_suffix(EXTENSION).unwrap_or(pattern);
        match Path::new(stem).strip_prefix(&self.dir) {
            Ok(rest) => rest.to_string_lossy().into_owned(),
            Err(_) => stem.to_string(),
        }
    }
}
