use std::collections::HashMap;

use log::debug;

use super::quality::MatchQuality;
use crate::rating::CompetitorId;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QualityKey {
    pub tournament_id: String,
    pub player1: CompetitorId,
    pub player2: CompetitorId,
    pub round: u32,
}

impl QualityKey {
    pub fn new(tournament_id: &str, player1: &str, player2: &str, round: u32) -> Self {
        Self {
            tournament_id: tournament_id.to_string(),
            player1: player1.to_string(),
            player2: player2.to_string(),
            round,
        }
    }

    fn involves(&self, competitor: &str) -> bool {
        self.player1 == competitor || self.player2 == competitor
    }
}

/// Memoised match qualities. Entries are dropped as soon as either
/// competitor's rating changes.
#[derive(Debug, Default)]
pub struct QualityCache {
    entries: HashMap<QualityKey, MatchQuality>,
    hits: u64,
    misses: u64,
}

impl QualityCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_or_insert_with<F>(&mut self, key: QualityKey, compute: F) -> MatchQuality
    where
        F: FnOnce() -> MatchQuality,
    {
        if let Some(quality) = self.entries.get(&key) {
            self.hits += 1;
            return *quality;
        }
        self.misses += 1;
        let quality = compute();
        self.entries.insert(key, quality);
        quality
    }

    pub fn invalidate_competitor(&mut self, competitor: &str) {
        let before = self.entries.len();
        self.entries.retain(|key, _| !key.involves(competitor));
        let dropped = before - self.entries.len();
        if dropped > 0 {
            debug!("Invalidated {} cached qualities for {}", dropped, competitor);
        }
    }

    pub fn invalidate_tournament(&mut self, tournament_id: &str) {
        self.entries.retain(|key, _| key.tournament_id != tournament_id);
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn stats(&self) -> (u64, u64) {
        (self.hits, self.misses)
    }
}
