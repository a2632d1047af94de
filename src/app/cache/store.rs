//! Cache store with date-range replacement and atomic writes
//!
//! A save is a read-modify-write of one file: rows of the days being
//! replaced are dropped from the history, the fresh rows are written first
//! and the surviving history follows in its original order. The new content
//! goes to a temp file in the same folder which is then renamed over the
//! target, so a crash never leaves a half-written cache.

use std::borrow::Cow;
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use encoding_rs::Encoding;
use tracing::{debug, info, warn};

use crate::app::cache::config::CacheConfig;
use crate::app::cache::path::CacheKey;
use crate::app::dates::DateRange;
use crate::app::models::ReportTable;
use crate::constants::files;
use crate::errors::{CacheError, CacheResult};

/// What a save did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveOutcome {
    /// No usable history: the file now holds only the new rows
    Created { rows: usize },
    /// New rows written ahead of the surviving history
    Updated { new_rows: usize, kept_rows: usize },
    /// Nothing to write, file untouched
    NoNewRows,
}

/// Reads and writes the per-(client, source) cache files
#[derive(Debug, Clone)]
pub struct CacheStore {
    config: CacheConfig,
    encoding: &'static Encoding,
}

impl CacheStore {
    /// Create a store
    ///
    /// # Errors
    ///
    /// Returns `CacheError::UnknownEncoding` if the encoding label is unknown.
    pub fn new(config: CacheConfig) -> CacheResult<Self> {
        let encoding = config.resolve_encoding()?;
        Ok(Self { config, encoding })
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    /// Folder holding the cache files
    pub fn folder(&self) -> &Path {
        &self.config.folder
    }

    /// Path of the cache file for `key`
    pub fn path_for(&self, key: &CacheKey) -> PathBuf {
        key.path_in(&self.config.folder)
    }

    fn ensure_folder(&self) -> CacheResult<()> {
        fs::create_dir_all(&self.config.folder).map_err(|e| {
            warn!(
                "Cannot create output folder {}: {}",
                self.config.folder.display(),
                e
            );
            CacheError::DirectoryNotAccessible {
                path: self.config.folder.clone(),
            }
        })
    }

    /// Load the cache file of `key`
    ///
    /// An absent or empty file is not an error: it is logged and reported
    /// as `None`.
    pub fn load(&self, key: &CacheKey) -> CacheResult<Option<ReportTable>> {
        self.read_path(&self.path_for(key))
    }

    /// Load a cache file by path
    ///
    /// # Errors
    ///
    /// Bytes that are invalid in the configured encoding fail the load with
    /// `CacheError::Undecodable`, so a later save cannot rewrite them.
    pub fn read_path(&self, path: &Path) -> CacheResult<Option<ReportTable>> {
        let bytes = match fs::read(path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                warn!("Cache file {} not found, first run", path.display());
                return Ok(None);
            }
            Err(source) => {
                return Err(CacheError::Io {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };

        let (text, _, had_errors) = self.encoding.decode(&bytes);
        if had_errors {
            return Err(CacheError::Undecodable {
                path: path.to_path_buf(),
                encoding: self.encoding.name().to_string(),
            });
        }
        if text.trim().is_empty() {
            warn!("Cache file {} is empty", path.display());
            return Ok(None);
        }

        let mut reader = csv::ReaderBuilder::new()
            .delimiter(files::FIELD_SEPARATOR)
            .flexible(true)
            .from_reader(text.as_bytes());

        let mut table = ReportTable::new(reader.headers()?.iter());
        for record in reader.records() {
            let record = record?;
            table.push_row(record.iter().map(str::to_string).collect());
        }

        debug!("Loaded {} rows from {}", table.len(), path.display());
        Ok(Some(table))
    }

    /// Drop the rows whose `Date` matches one of the days in `dates`
    ///
    /// Returns the number of rows removed.
    ///
    /// # Errors
    ///
    /// Returns `CacheError::MissingColumn` when the table has no `Date`
    /// column.
    pub fn remove_dates(
        &self,
        table: &mut ReportTable,
        dates: &DateRange,
        path: &Path,
    ) -> CacheResult<usize> {
        let index = table
            .column_index(files::DATE_COLUMN)
            .ok_or_else(|| CacheError::MissingColumn {
                path: path.to_path_buf(),
                column: files::DATE_COLUMN.to_string(),
            })?;

        let days = dates.formatted();
        let date_match = self.config.date_match;
        let before = table.len();
        table.retain_rows(|row| {
            let cell = row[index].as_str();
            !days.iter().any(|day| date_match.matches(cell, day))
        });
        Ok(before - table.len())
    }

    /// Replace the rows of `dates` in the cache of `key` with `new_rows`
    ///
    /// # Errors
    ///
    /// Fails on I/O errors, undecodable history, a history without a `Date`
    /// column, or new content the cache encoding cannot represent.
    pub fn save(
        &self,
        key: &CacheKey,
        new_rows: ReportTable,
        dates: &DateRange,
    ) -> CacheResult<SaveOutcome> {
        let path = self.path_for(key);

        let history = match self.load(key)? {
            Some(mut old) => {
                let removed = self.remove_dates(&mut old, dates, &path)?;
                debug!(
                    "{}: {} cached rows fall in the replaced days, {} kept",
                    key,
                    removed,
                    old.len()
                );
                Some(old)
            }
            None => None,
        };

        if new_rows.is_empty() {
            warn!("{}: no new rows to save, cache left untouched", key);
            return Ok(SaveOutcome::NoNewRows);
        }

        let new_count = new_rows.len();
        match history.filter(|old| !old.is_empty()) {
            None => {
                self.write_table(&path, &new_rows)?;
                info!(
                    "{}: saved {} new rows, no history to keep",
                    key, new_count
                );
                Ok(SaveOutcome::Created { rows: new_count })
            }
            Some(old) => {
                let kept = old.len();
                let mut merged = new_rows;
                merged.extend_aligned(old);
                self.write_table(&path, &merged)?;
                info!(
                    "{}: saved {} new rows ahead of {} historical rows",
                    key, new_count, kept
                );
                Ok(SaveOutcome::Updated {
                    new_rows: new_count,
                    kept_rows: kept,
                })
            }
        }
    }

    fn encode_cell<'a>(&self, cell: &'a str, path: &Path) -> CacheResult<Cow<'a, [u8]>> {
        let (bytes, _, had_errors) = self.encoding.encode(cell);
        if had_errors {
            return Err(CacheError::Unencodable {
                path: path.to_path_buf(),
                encoding: self.encoding.name().to_string(),
            });
        }
        Ok(bytes)
    }

    fn encode_table(&self, table: &ReportTable, path: &Path) -> CacheResult<Vec<u8>> {
        let mut writer = csv::WriterBuilder::new()
            .delimiter(files::FIELD_SEPARATOR)
            .terminator(csv::Terminator::Any(b'\n'))
            .from_writer(Vec::new());

        let header = table
            .columns()
            .iter()
            .map(|cell| self.encode_cell(cell, path))
            .collect::<CacheResult<Vec<_>>>()?;
        writer.write_record(&header)?;

        for row in table.rows() {
            let record = row
                .iter()
                .map(|cell| self.encode_cell(cell, path))
                .collect::<CacheResult<Vec<_>>>()?;
            writer.write_record(&record)?;
        }

        writer.into_inner().map_err(|e| CacheError::Io {
            path: path.to_path_buf(),
            source: e.into_error(),
        })
    }

    /// Write `table` to `path` through a temp file and a rename
    pub fn write_table(&self, path: &Path, table: &ReportTable) -> CacheResult<()> {
        let bytes = self.encode_table(table, path)?;
        self.ensure_folder()?;

        let folder = path.parent().unwrap_or(&self.config.folder);
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();

        let io_error = |source: std::io::Error| CacheError::Io {
            path: path.to_path_buf(),
            source,
        };

        let mut temp = tempfile::Builder::new()
            .prefix(&format!(".{}", file_name))
            .suffix(files::TEMP_FILE_SUFFIX)
            .tempfile_in(folder)
            .map_err(io_error)?;
        temp.write_all(&bytes).map_err(io_error)?;
        temp.as_file().sync_all().map_err(io_error)?;

        temp.persist(path).map_err(|e| {
            warn!("Atomic rename to {} failed: {}", path.display(), e.error);
            CacheError::AtomicOperationFailed {
                temp_path: e.file.path().to_path_buf(),
                final_path: path.to_path_buf(),
            }
        })?;

        debug!("Wrote {} rows to {}", table.len(), path.display());
        Ok(())
    }
}
