//! Cache file naming
//!
//! Every (client, source) pair owns one file, `{client}_{source}.csv`, directly
//! under the output folder.

use std::fmt;
use std::path::{Path, PathBuf};

use crate::app::models::Source;
use crate::constants::files;

/// Identifies one cache file
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    pub client: String,
    pub source: Source,
}

impl CacheKey {
    pub fn new(client: impl Into<String>, source: Source) -> Self {
        Self {
            client: client.into(),
            source,
        }
    }

    /// File name, e.g. `eapteka_direct.csv`
    pub fn file_name(&self) -> String {
        format!("{}_{}.{}", self.client, self.source.name(), files::EXTENSION)
    }

    /// Full path under `folder`
    pub fn path_in(&self, folder: &Path) -> PathBuf {
        folder.join(self.file_name())
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.client, self.source)
    }
}
