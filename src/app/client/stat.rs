//! Response model shared by the Metrica and AppMetrica stat APIs

use serde::Deserialize;

use crate::errors::FetchResult;

/// Top-level stat response; only `data` is used
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StatResponse {
    #[serde(default)]
    pub data: Vec<StatRow>,
}

/// One aggregated row
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StatRow {
    #[serde(default)]
    pub dimensions: Vec<StatDimension>,
    #[serde(default)]
    pub metrics: Vec<Option<f64>>,
}

/// Dimension value; the API sends `null` for undefined values
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StatDimension {
    #[serde(default)]
    pub name: Option<String>,
}

impl StatResponse {
    /// Decode a response body
    pub fn parse(body: &str) -> FetchResult<Self> {
        Ok(serde_json::from_str(body)?)
    }
}

impl StatRow {
    /// Name of the dimension at `index`, empty when missing or null
    pub fn dimension(&self, index: usize) -> &str {
        self.dimensions
            .get(index)
            .and_then(|dimension| dimension.name.as_deref())
            .unwrap_or("")
    }

    /// Metric at `index`, zero when missing or null
    pub fn metric(&self, index: usize) -> f64 {
        self.metrics.get(index).copied().flatten().unwrap_or(0.0)
    }
}
