use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use log::info;
use std::fs;
use std::path::Path;

use crate::config::settings::EngineConfig;
use crate::domain::{MatchOutcomeEvent, MatchResultSummary};
use crate::errors::{parse_context, read_context};
use crate::season::{DecayReport, SeasonArchive, SeasonContext};
use crate::services::ranking::RankingService;
use crate::store::SnapshotStore;

#[derive(Debug, Default)]
pub struct ProcessingReport {
    pub processed: usize,
    pub upsets: u64,
    pub summaries: Vec<MatchResultSummary>,
}

/// Batch operations over a snapshot directory: load, mutate, save.
pub struct ProcessingService {
    store: SnapshotStore,
    ranking: RankingService,
}

impl ProcessingService {
    pub fn new(config: EngineConfig, store: SnapshotStore) -> Result<Self> {
        let ratings = store.load_ratings()?;
        let season = match store.load_season()? {
            Some(season) => season,
            None => {
                info!("  → No season snapshot, starting season 1");
                SeasonContext::first(Utc::now(), &config.season)
            }
        };
        let ranking = RankingService::restore(config, ratings, season)?;
        Ok(Self { store, ranking })
    }

    pub fn open<P: AsRef<Path>>(config: EngineConfig, store_dir: P) -> Result<Self> {
        Self::new(config, SnapshotStore::new(store_dir)?)
    }

    pub fn ranking(&self) -> &RankingService {
        &self.ranking
    }

    pub fn ranking_mut(&mut self) -> &mut RankingService {
        &mut self.ranking
    }

    /// Applies every event in `events_path`, in file order, then saves.
    pub fn run(&mut self, events_path: &Path) -> Result<ProcessingReport> {
        info!("=== Processing match events from {} ===", events_path.display());
        let events = load_events(events_path)?;
        info!("  → Loaded {} events", events.len());

        let upsets_before = self.ranking.season().analytics.upsets;
        let mut report = ProcessingReport::default();
        for (index, event) in events.iter().enumerate() {
            let summary = self.ranking.process_match_result(event).with_context(|| {
                format!(
                    "Event #{} ({} vs {}) could not be processed",
                    index + 1,
                    event.competitor_a,
                    event.competitor_b
                )
            })?;
            report.summaries.push(summary);
        }
        report.processed = report.summaries.len();
        report.upsets = self.ranking.season().analytics.upsets - upsets_before;

        self.save()?;
        info!("=== Processing Complete: {} matches ===", report.processed);
        Ok(report)
    }

    pub fn save(&self) -> Result<()> {
        self.store.save_ratings(self.ranking.ratings())?;
        self.store.save_season(self.ranking.season())?;
        Ok(())
    }

    pub fn roll_over(&mut self, now: DateTime<Utc>) -> Result<SeasonArchive> {
        let archive = self.ranking.roll_over_season(now);
        self.store.save_archive(&archive)?;
        self.save()?;
        Ok(archive)
    }

    pub fn decay(&mut self, now: DateTime<Utc>) -> Result<Vec<DecayReport>> {
        let reports = self.ranking.apply_decay(now);
        self.save()?;
        Ok(reports)
    }
}

/// Reads a JSON array of events, or one JSON event per line.
pub fn load_events(path: &Path) -> Result<Vec<MatchOutcomeEvent>> {
    let content = fs::read_to_string(path).with_context(|| read_context(path))?;
    if content.trim_start().starts_with('[') {
        return serde_json::from_str(&content).with_context(|| parse_context(path, &content));
    }
    content
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(number, line)| {
            serde_json::from_str(line)
                .with_context(|| format!("{} (line {})", parse_context(path, line), number + 1))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rating::Outcome;
    use tempfile::tempdir;

    #[test]
    fn test_events_load_from_array_or_lines() {
        let dir = tempdir().unwrap();
        let array = dir.path().join("events.json");
        fs::write(
            &array,
            r#"[{"competitorA":"a","competitorB":"b","result":"win"},
                {"competitorA":"b","competitorB":"c","result":"draw"}]"#,
        )
        .unwrap();
        let lines = dir.path().join("events.jsonl");
        fs::write(
            &lines,
            "{\"competitorA\":\"a\",\"competitorB\":\"b\",\"result\":\"loss\"}\n\n{\"competitorA\":\"c\",\"competitorB\":\"a\",\"result\":\"win\"}\n",
        )
        .unwrap();

        assert_eq!(load_events(&array).unwrap().len(), 2);
        let from_lines = load_events(&lines).unwrap();
        assert_eq!(from_lines.len(), 2);
        assert_eq!(from_lines[0].result, Outcome::Loss);
    }

    #[test]
    fn test_bad_line_reports_line_number() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("events.jsonl");
        fs::write(&path, "{\"competitorA\":\"a\",\"competitorB\":\"b\",\"result\":\"win\"}\nnope\n").unwrap();
        let err = load_events(&path).unwrap_err();
        assert!(format!("{err:#}").contains("line 2"));
    }

    #[test]
    fn test_run_persists_and_reloads() {
        let dir = tempdir().unwrap();
        let events = dir.path().join("events.json");
        fs::write(
            &events,
            r#"[{"competitorA":"a","competitorB":"b","result":"win"}]"#,
        )
        .unwrap();
        let store_dir = dir.path().join("store");

        let mut service = ProcessingService::open(EngineConfig::default(), &store_dir).unwrap();
        let report = service.run(&events).unwrap();
        assert_eq!(report.processed, 1);

        let reloaded = ProcessingService::open(EngineConfig::default(), &store_dir).unwrap();
        assert_eq!(reloaded.ranking().rating("a").unwrap().wins, 1);
        assert_eq!(reloaded.ranking().season().analytics.matches_processed, 1);
    }

    #[test]
    fn test_failed_event_names_its_position() {
        let dir = tempdir().unwrap();
        let events = dir.path().join("events.json");
        fs::write(
            &events,
            r#"[{"competitorA":"a","competitorB":"b","result":"win"},
                {"competitorA":"c","competitorB":"c","result":"draw"}]"#,
        )
        .unwrap();
        let mut service = ProcessingService::open(EngineConfig::default(), dir.path().join("store")).unwrap();
        let err = service.run(&events).unwrap_err();
        assert!(err.to_string().contains("Event #2"));
    }
}
