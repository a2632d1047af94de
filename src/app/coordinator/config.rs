//! Run selection and per-source date windows

use chrono::NaiveDate;

use crate::app::dates::DateRange;
use crate::app::models::Source;
use crate::config::AppConfig;

/// What one run processes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunOptions {
    /// Client names to process; empty means every configured client
    pub clients: Vec<String>,
    /// Sources to process; empty means all three
    pub sources: Vec<Source>,
    /// Day the date windows are counted back from (exclusive)
    pub anchor: NaiveDate,
}

impl RunOptions {
    /// Every client and source, anchored at `anchor`
    pub fn all(anchor: NaiveDate) -> Self {
        Self {
            clients: Vec::new(),
            sources: Vec::new(),
            anchor,
        }
    }

    /// Every client and source, anchored today
    pub fn today() -> Self {
        Self::all(DateRange::today())
    }

    pub fn with_clients(mut self, clients: Vec<String>) -> Self {
        self.clients = clients;
        self
    }

    pub fn with_sources(mut self, sources: Vec<Source>) -> Self {
        self.sources = sources;
        self
    }

    /// Selected sources in pipeline order
    ///
    /// Direct always comes first since AppMetrica reads its cache.
    pub fn selected_sources(&self) -> Vec<Source> {
        Source::ALL
            .into_iter()
            .filter(|source| self.sources.is_empty() || self.sources.contains(source))
            .collect()
    }
}

/// Date window of each source for one run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceRanges {
    pub direct: DateRange,
    pub metrica: DateRange,
    pub appmetrica: DateRange,
}

impl SourceRanges {
    /// The configured number of days before `anchor` for each source
    pub fn for_anchor(config: &AppConfig, anchor: NaiveDate) -> Self {
        Self {
            direct: DateRange::last_days(anchor, config.direct.days),
            metrica: DateRange::last_days(anchor, config.metrica.days),
            appmetrica: DateRange::last_days(anchor, config.appmetrica.days),
        }
    }

    pub fn get(&self, source: Source) -> &DateRange {
        match source {
            Source::Direct => &self.direct,
            Source::Metrica => &self.metrica,
            Source::AppMetrica => &self.appmetrica,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::dates::parse_date;

    #[test]
    fn test_selected_sources_keep_pipeline_order() {
        let anchor = parse_date("2024-01-10").unwrap();
        assert_eq!(RunOptions::all(anchor).selected_sources(), Source::ALL.to_vec());

        let options =
            RunOptions::all(anchor).with_sources(vec![Source::AppMetrica, Source::Direct]);
        assert_eq!(
            options.selected_sources(),
            vec![Source::Direct, Source::AppMetrica]
        );
    }

    #[test]
    fn test_default_windows() {
        let anchor = parse_date("2024-01-10").unwrap();
        let ranges = SourceRanges::for_anchor(&AppConfig::default(), anchor);

        assert_eq!(ranges.direct.len(), 45);
        assert_eq!(ranges.metrica.formatted().first().unwrap(), "2024-01-06");
        assert_eq!(ranges.appmetrica.formatted(), vec!["2024-01-09"]);
        assert_eq!(ranges.get(Source::Metrica).len(), 4);
    }
}
