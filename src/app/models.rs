//! Report data models
//!
//! Every source is normalized into a [`ReportTable`]: a header and rows of
//! string cells, the same shape the cache files have on disk. Keeping cells
//! as text means old cache files with a different column set can still be
//! merged without loss.

use std::collections::HashSet;
use std::fmt;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::app::campaign::CampaignSchema;
use crate::constants::{appmetrica, direct, metrica};

/// The three upstream report providers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Source {
    /// Direct ad-platform reports
    Direct,
    /// Metrica web analytics
    Metrica,
    /// AppMetrica mobile analytics
    #[value(name = "appmetrica")]
    AppMetrica,
}

impl Source {
    /// All sources in pipeline order
    pub const ALL: [Source; 3] = [Source::Direct, Source::Metrica, Source::AppMetrica];

    /// Name used in cache file names and logs
    pub fn name(&self) -> &'static str {
        match self {
            Source::Direct => "direct",
            Source::Metrica => "metrica",
            Source::AppMetrica => "appmetrica",
        }
    }

    /// Value written to the `Source` column
    pub fn tag(&self) -> &'static str {
        match self {
            Source::Direct => direct::SOURCE_TAG,
            Source::Metrica => metrica::SOURCE_TAG,
            Source::AppMetrica => appmetrica::SOURCE_TAG,
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Header plus rows of text cells
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReportTable {
    columns: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl ReportTable {
    /// Create an empty table with the given header
    pub fn new<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            columns: columns.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    /// Header
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Rows in order
    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Position of a column in the header
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|column| column == name)
    }

    /// Append a row, padding or truncating it to the header width
    pub fn push_row(&mut self, mut row: Vec<String>) {
        row.resize(self.columns.len(), String::new());
        self.rows.push(row);
    }

    /// Cell of a row by column name
    pub fn cell<'a>(&'a self, row: &'a [String], column: &str) -> Option<&'a str> {
        self.column_index(column)
            .and_then(|index| row.get(index))
            .map(String::as_str)
    }

    /// Values of one column, in row order
    pub fn column_values<'a>(&'a self, column: &str) -> Vec<&'a str> {
        match self.column_index(column) {
            Some(index) => self.rows.iter().map(|row| row[index].as_str()).collect(),
            None => Vec::new(),
        }
    }

    /// Distinct non-empty values of one column, in first-seen order
    pub fn unique_values(&self, column: &str) -> Vec<String> {
        let mut seen = HashSet::new();
        self.column_values(column)
            .into_iter()
            .filter(|value| !value.is_empty())
            .filter(|value| seen.insert(*value))
            .map(str::to_string)
            .collect()
    }

    /// Keep only rows for which the predicate holds
    pub fn retain_rows<F>(&mut self, mut keep: F)
    where
        F: FnMut(&[String]) -> bool,
    {
        self.rows.retain(|row| keep(row));
    }

    /// Apply a function to every cell of one column
    pub fn map_column<F>(&mut self, column: &str, mut f: F) -> bool
    where
        F: FnMut(&str) -> String,
    {
        let Some(index) = self.column_index(column) else {
            return false;
        };
        for row in &mut self.rows {
            row[index] = f(&row[index]);
        }
        true
    }

    /// Append a column whose value is derived from each row
    pub fn add_column<F>(&mut self, name: impl Into<String>, mut value: F)
    where
        F: FnMut(&[String]) -> String,
    {
        self.columns.push(name.into());
        for row in &mut self.rows {
            let cell = value(row);
            row.push(cell);
        }
    }

    /// Append the decomposed campaign attributes of `campaign_column`
    pub fn add_campaign_columns(&mut self, campaign_column: &str, schema: &CampaignSchema) {
        let index = self.column_index(campaign_column);
        for row in &mut self.rows {
            let raw = index.map(|i| row[i].as_str()).unwrap_or("");
            let attributes = schema.decompose(raw);
            row.extend(attributes.into_values());
        }
        self.columns.extend(schema.columns.iter().cloned());
    }

    /// Append the rows of `other` below this table's rows
    ///
    /// Cells are matched by column name. Columns only `other` has are added
    /// to the header and left empty in the existing rows.
    pub fn extend_aligned(&mut self, other: ReportTable) {
        if self.columns.is_empty() && self.rows.is_empty() {
            *self = other;
            return;
        }

        for column in &other.columns {
            if self.column_index(column).is_none() {
                self.columns.push(column.clone());
                for row in &mut self.rows {
                    row.push(String::new());
                }
            }
        }

        let mapping: Vec<Option<usize>> = self
            .columns
            .iter()
            .map(|column| other.column_index(column))
            .collect();

        for row in other.rows {
            let aligned = mapping
                .iter()
                .map(|source| {
                    source
                        .and_then(|i| row.get(i).cloned())
                        .unwrap_or_default()
                })
                .collect();
            self.rows.push(aligned);
        }
    }
}

/// Render a float the way cache files expect (`0.0`, `1.2`, `1200.5`)
pub fn format_decimal(value: f64) -> String {
    format!("{:?}", value)
}

/// Parse a numeric cell, treating empty and `--` (Direct's "no data") as zero
pub fn parse_number(raw: &str) -> Option<f64> {
    match raw.trim() {
        "" | "--" => Some(0.0),
        value => value.parse().ok(),
    }
}

/// Build a table from a header slice, for source parsers and tests
pub fn table_with_header(columns: &[&str]) -> ReportTable {
    ReportTable::new(columns.iter().copied())
}
