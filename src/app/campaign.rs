//! Campaign name decomposition and device normalization
//!
//! Campaign names encode a fixed tuple of attributes separated by a single
//! character, e.g. `msk-search-auto-pharmacy-vitamins-listing`. Names with
//! fewer parts are right-padded with a placeholder so every row carries the
//! same attribute columns.

use serde::{Deserialize, Serialize};

use crate::constants::campaign;

/// Ordered attribute values of one campaign name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CampaignAttributes {
    fields: Vec<(String, String)>,
}

impl CampaignAttributes {
    /// Value for one attribute column
    pub fn get(&self, column: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, value)| value.as_str())
    }

    /// Values in column order
    pub fn values(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(_, value)| value.as_str())
    }

    /// (column, value) pairs in column order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields
            .iter()
            .map(|(name, value)| (name.as_str(), value.as_str()))
    }

    /// Number of attributes
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// True when no attribute columns are configured
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Consume into the values, in column order
    pub fn into_values(self) -> Vec<String> {
        self.fields.into_iter().map(|(_, value)| value).collect()
    }
}

/// Split a campaign name into exactly `columns.len()` attributes
///
/// When the name has fewer than `columns.len() - 1` delimiters it is padded
/// with `delimiter + placeholder` until it has enough. At most
/// `columns.len() - 1` splits are made, so the last attribute keeps any
/// further delimiters verbatim. Never fails.
///
/// # Examples
///
/// ```
/// use ad_report_sync::app::campaign::decompose_campaign_key;
///
/// let columns = vec!["Geo".to_string(), "Type".to_string(), "Rest".to_string()];
/// let attrs = decompose_campaign_key("msk-search", &columns, '-', "all");
/// assert_eq!(attrs.values().collect::<Vec<_>>(), ["msk", "search", "all"]);
/// ```
pub fn decompose_campaign_key(
    raw: &str,
    columns: &[String],
    delimiter: char,
    placeholder: &str,
) -> CampaignAttributes {
    let arity = columns.len();
    if arity == 0 {
        return CampaignAttributes { fields: Vec::new() };
    }

    let present = raw.matches(delimiter).count();
    let mut padded = String::from(raw);
    for _ in present..arity - 1 {
        padded.push(delimiter);
        padded.push_str(placeholder);
    }

    let fields = columns
        .iter()
        .cloned()
        .zip(padded.splitn(arity, delimiter).map(str::to_string))
        .collect();

    CampaignAttributes { fields }
}

/// Column layout and padding rules for campaign names
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CampaignSchema {
    /// Attribute column names, in campaign name order
    pub columns: Vec<String>,
    /// Attribute delimiter
    pub delimiter: char,
    /// Value used for attributes missing from a name
    pub placeholder: String,
}

impl Default for CampaignSchema {
    fn default() -> Self {
        Self {
            columns: campaign::COLUMNS.iter().map(|c| c.to_string()).collect(),
            delimiter: campaign::DELIMITER,
            placeholder: campaign::PLACEHOLDER.to_string(),
        }
    }
}

impl CampaignSchema {
    /// Decompose a campaign name with this schema
    pub fn decompose(&self, raw: &str) -> CampaignAttributes {
        decompose_campaign_key(raw, &self.columns, self.delimiter, &self.placeholder)
    }

    /// Whether a raw value looks like a tagged campaign name
    pub fn is_tagged(&self, raw: &str) -> bool {
        raw.contains(self.delimiter)
    }
}

/// Canonical device categories
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Device {
    Desktop,
    Mobile,
    SmartTv,
    Tablet,
}

impl Device {
    const LABELS: [(&'static str, Device); 4] = [
        ("PC", Device::Desktop),
        ("Smartphones", Device::Mobile),
        ("TV", Device::SmartTv),
        ("Tablets", Device::Tablet),
    ];

    /// Look up a platform device label (exact, case-sensitive)
    pub fn from_label(label: &str) -> Option<Self> {
        Self::LABELS
            .iter()
            .find(|(known, _)| *known == label)
            .map(|(_, device)| *device)
    }

    /// Canonical name written to cache files
    pub fn as_str(&self) -> &'static str {
        match self {
            Device::Desktop => "DESKTOP",
            Device::Mobile => "MOBILE",
            Device::SmartTv => "SMART_TV",
            Device::Tablet => "TABLET",
        }
    }
}

/// Map a platform device label to its canonical name
pub fn normalize_device(label: &str) -> Option<&'static str> {
    Device::from_label(label).map(|device| device.as_str())
}
