use std::collections::{BTreeSet, VecDeque};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::bayesian::Belief;
use super::tiers::{self, Classification, ConfidenceBand, Tier};
use super::types::{
    ArchetypeRecord, CompetitorId, MatchRecord, Outcome, Playstyle, RatingValue, RecentResult,
};
use crate::config::settings::EngineConfig;
use crate::domain::achievements::Achievement;

/// Skill belief and progression state for one competitor in one rating context.
///
/// `mean` and `deviation` are only written through [`CompetitorRating::set_belief`],
/// which recomputes the conservative estimate, confidence and classification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompetitorRating {
    pub id: CompetitorId,
    mean: RatingValue,
    deviation: RatingValue,
    conservative_estimate: RatingValue,
    confidence: f64,
    classification: Classification,
    pub matches_played: u32,
    pub wins: u32,
    pub losses: u32,
    pub draws: u32,
    pub win_streak: u32,
    pub loss_streak: u32,
    pub experience_level: u32,
    pub placement_played: u32,
    pub placement_wins: u32,
    pub archetypes: Vec<ArchetypeRecord>,
    pub playstyle: Playstyle,
    pub recent_results: VecDeque<RecentResult>,
    pub match_history: Vec<MatchRecord>,
    pub achievements: BTreeSet<Achievement>,
    pub last_active: Option<DateTime<Utc>>,
    pub last_decay_at: Option<DateTime<Utc>>,
}

impl CompetitorRating {
    pub fn new(id: impl Into<CompetitorId>, config: &EngineConfig) -> Self {
        let belief = Belief::new(config.rating.initial_mean, config.rating.initial_deviation);
        Self::with_belief(id, belief, config)
    }

    pub fn with_belief(id: impl Into<CompetitorId>, belief: Belief, config: &EngineConfig) -> Self {
        let mut rating = Self {
            id: id.into(),
            mean: belief.mean,
            deviation: belief.deviation,
            conservative_estimate: 0.0,
            confidence: 0.0,
            classification: tiers::classify(0.0, 0.0, &config.tiers),
            matches_played: 0,
            wins: 0,
            losses: 0,
            draws: 0,
            win_streak: 0,
            loss_streak: 0,
            experience_level: 0,
            placement_played: 0,
            placement_wins: 0,
            archetypes: Vec::new(),
            playstyle: Playstyle::default(),
            recent_results: VecDeque::new(),
            match_history: Vec::new(),
            achievements: BTreeSet::new(),
            last_active: None,
            last_decay_at: None,
        };
        rating.set_belief(belief, config);
        rating
    }

    pub fn mean(&self) -> RatingValue {
        self.mean
    }

    pub fn deviation(&self) -> RatingValue {
        self.deviation
    }

    pub fn belief(&self) -> Belief {
        Belief::new(self.mean, self.deviation)
    }

    pub fn conservative_estimate(&self) -> RatingValue {
        self.conservative_estimate
    }

    pub fn confidence(&self) -> f64 {
        self.confidence
    }

    pub fn classification(&self) -> &Classification {
        &self.classification
    }

    pub fn tier(&self) -> Tier {
        self.classification.tier
    }

    pub fn band(&self) -> ConfidenceBand {
        self.classification.band
    }

    /// Commits a new belief, clamping the deviation into its bounds.
    pub fn set_belief(&mut self, belief: Belief, config: &EngineConfig) {
        let bounds = &config.rating;
        if belief.mean.is_finite() {
            self.mean = belief.mean;
        }
        if belief.deviation.is_finite() {
            self.deviation = belief.deviation;
        }
        self.deviation = self.deviation.clamp(bounds.min_deviation, bounds.max_deviation);
        self.refresh(config);
    }

    /// Recomputes every derived field. Loaded snapshots go through this too.
    pub fn refresh(&mut self, config: &EngineConfig) {
        self.conservative_estimate = self.belief().conservative_estimate();
        self.confidence = tiers::confidence(self.matches_played, self.deviation, &config.rating);
        self.classification = tiers::classify(
            self.conservative_estimate,
            self.confidence,
            &config.tiers,
        );
    }

    pub fn in_placement(&self, config: &EngineConfig) -> bool {
        self.placement_played < config.rating.placement_matches
    }

    /// Counters, streaks, recent-results ring buffer and history for one finished match.
    pub fn record_match(&mut self, record: MatchRecord, config: &EngineConfig) {
        let outcome = record.outcome;
        let in_placement = self.in_placement(config);

        self.matches_played += 1;
        self.experience_level = (self.experience_level + 1).min(100);
        match outcome {
            Outcome::Win => {
                self.wins += 1;
                self.win_streak += 1;
                self.loss_streak = 0;
            }
            Outcome::Loss => {
                self.losses += 1;
                self.loss_streak += 1;
                self.win_streak = 0;
            }
            Outcome::Draw => {
                self.draws += 1;
                self.win_streak = 0;
                self.loss_streak = 0;
            }
        }
        if in_placement {
            self.placement_played += 1;
            if outcome == Outcome::Win {
                self.placement_wins += 1;
            }
        }

        self.push_recent(RecentResult {
            outcome,
            rating_delta: record.rating_after - record.rating_before,
            timestamp: record.timestamp,
        }, config);
        self.last_active = Some(record.timestamp);
        self.push_history(record, config);
        self.refresh(config);
    }

    fn push_recent(&mut self, result: RecentResult, config: &EngineConfig) {
        let capacity = (config.rating.recent_results_window * 2).max(1);
        while self.recent_results.len() >= capacity {
            self.recent_results.pop_front();
        }
        self.recent_results.push_back(result);
    }

    fn push_history(&mut self, record: MatchRecord, config: &EngineConfig) {
        self.match_history.push(record);
        let cap = config.rating.match_history_cap.max(1);
        if self.match_history.len() > cap {
            let excess = self.match_history.len() - cap;
            self.match_history.drain(..excess);
        }
    }

    pub fn archetype(&self, name: &str) -> Option<&ArchetypeRecord> {
        self.archetypes.iter().find(|record| record.archetype == name)
    }

    /// The sub-rating for `name`, seeded from the top-level belief on first use.
    pub fn archetype_mut(&mut self, name: &str, config: &EngineConfig) -> &mut ArchetypeRecord {
        let index = match self.archetypes.iter().position(|record| record.archetype == name) {
            Some(index) => index,
            None => {
                self.archetypes.push(ArchetypeRecord {
                    archetype: name.to_string(),
                    mean: self.mean,
                    deviation: self
                        .deviation
                        .max(config.rating.archetype_deviation_floor)
                        .min(config.rating.max_deviation),
                    wins: 0,
                    losses: 0,
                    draws: 0,
                });
                self.archetypes.len() - 1
            }
        };
        &mut self.archetypes[index]
    }

    pub fn meetings_with(&self, opponent: &str) -> usize {
        self.match_history
            .iter()
            .filter(|record| record.opponent_id == opponent)
            .count()
    }

    pub fn last_meeting_with(&self, opponent: &str) -> Option<&MatchRecord> {
        self.match_history
            .iter()
            .rev()
            .find(|record| record.opponent_id == opponent)
    }

    /// Clears streaks and placement progress at season rollover.
    pub fn reset_progress(&mut self) {
        self.win_streak = 0;
        self.loss_streak = 0;
        self.placement_played = 0;
        self.placement_wins = 0;
    }
}
