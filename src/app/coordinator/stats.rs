//! Run statistics
//!
//! Collected per (client, source) as the coordinator goes and summarized at
//! the end of a run.

use std::time::Duration;

use crate::app::cache::SaveOutcome;
use crate::app::models::Source;

/// Result of one source for one client
#[derive(Debug, Clone, PartialEq)]
pub struct SourceStats {
    pub client: String,
    pub source: Source,
    /// Rows returned by the API after filtering
    pub rows_fetched: usize,
    pub outcome: SaveOutcome,
    pub duration: Duration,
}

impl SourceStats {
    /// Rows written ahead of the history
    pub fn rows_saved(&self) -> usize {
        match self.outcome {
            SaveOutcome::Created { rows } => rows,
            SaveOutcome::Updated { new_rows, .. } => new_rows,
            SaveOutcome::NoNewRows => 0,
        }
    }
}

/// Aggregated statistics of one run
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunStats {
    pub sources: Vec<SourceStats>,
    pub failed_clients: Vec<String>,
    pub duration: Duration,
}

impl RunStats {
    pub fn is_success(&self) -> bool {
        self.failed_clients.is_empty()
    }

    /// Total rows saved across all sources
    pub fn rows_saved(&self) -> usize {
        self.sources.iter().map(SourceStats::rows_saved).sum()
    }

    /// Stats of the sources of one client
    pub fn for_client<'a>(&'a self, client: &'a str) -> impl Iterator<Item = &'a SourceStats> {
        self.sources.iter().filter(move |stats| stats.client == client)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stats(client: &str, source: Source, outcome: SaveOutcome) -> SourceStats {
        SourceStats {
            client: client.to_string(),
            source,
            rows_fetched: 0,
            outcome,
            duration: Duration::ZERO,
        }
    }

    #[test]
    fn test_rows_saved() {
        let run = RunStats {
            sources: vec![
                stats("a", Source::Direct, SaveOutcome::Created { rows: 3 }),
                stats(
                    "a",
                    Source::Metrica,
                    SaveOutcome::Updated {
                        new_rows: 2,
                        kept_rows: 10,
                    },
                ),
                stats("b", Source::Direct, SaveOutcome::NoNewRows),
            ],
            ..Default::default()
        };
        assert_eq!(run.rows_saved(), 5);
        assert_eq!(run.for_client("a").count(), 2);
        assert!(run.is_success());
    }
}
