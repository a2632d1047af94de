//! Cache configuration types and defaults
//!
//! This module contains the `[output]` section of the configuration: where
//! cache files live, how they are encoded and how their dates are matched
//! against the days being replaced.

use std::path::PathBuf;

use encoding_rs::Encoding;
use serde::{Deserialize, Serialize};

use crate::constants::files;
use crate::errors::{CacheError, CacheResult};

/// How a cached `Date` cell is compared with a day being replaced
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DateMatch {
    /// Cell equals the day
    #[default]
    Exact,
    /// Cell contains the day, case-insensitive (legacy files with timestamps)
    Substring,
}

impl DateMatch {
    pub fn matches(&self, cell: &str, day: &str) -> bool {
        match self {
            DateMatch::Exact => cell.trim() == day,
            DateMatch::Substring => cell.to_lowercase().contains(&day.to_lowercase()),
        }
    }
}

/// Configuration for the cache store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Folder holding the cache files
    pub folder: PathBuf,
    /// Encoding label of the cache files (WHATWG label, e.g. `windows-1251`)
    pub encoding: String,
    /// Date matching policy
    pub date_match: DateMatch,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            folder: PathBuf::from(files::DEFAULT_FOLDER),
            encoding: files::DEFAULT_ENCODING.to_string(),
            date_match: DateMatch::default(),
        }
    }
}

impl CacheConfig {
    /// Create a configuration with a custom folder
    pub fn with_folder(folder: PathBuf) -> Self {
        Self {
            folder,
            ..Default::default()
        }
    }

    /// Set the date matching policy
    pub fn with_date_match(mut self, date_match: DateMatch) -> Self {
        self.date_match = date_match;
        self
    }

    /// Set the file encoding label
    pub fn with_encoding(mut self, label: impl Into<String>) -> Self {
        self.encoding = label.into();
        self
    }

    /// Look up the configured encoding
    ///
    /// # Errors
    ///
    /// Returns `CacheError::UnknownEncoding` for labels `encoding_rs` does
    /// not know.
    pub fn resolve_encoding(&self) -> CacheResult<&'static Encoding> {
        Encoding::for_label(self.encoding.trim().as_bytes()).ok_or_else(|| {
            CacheError::UnknownEncoding {
                label: self.encoding.clone(),
            }
        })
    }
}
