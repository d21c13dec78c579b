use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::achievements::Achievement;
use crate::rating::{
    CompetitorId, ConfidenceBand, MatchStage, Outcome, PlaystyleObservation, RatingValue, Tier,
    Transition,
};

/// Finished match reported by the game engine. `result` is from A's side.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchOutcomeEvent {
    pub competitor_a: CompetitorId,
    pub competitor_b: CompetitorId,
    pub result: Outcome,
    #[serde(default)]
    pub metrics: MatchMetrics,
    #[serde(default)]
    pub tournament_id: Option<String>,
    #[serde(default)]
    pub round: Option<u32>,
    #[serde(default)]
    pub stage: MatchStage,
    #[serde(default)]
    pub high_stakes: bool,
    #[serde(default)]
    pub played_at: Option<DateTime<Utc>>,
}

impl MatchOutcomeEvent {
    pub fn new(a: impl Into<CompetitorId>, b: impl Into<CompetitorId>, result: Outcome) -> Self {
        Self {
            competitor_a: a.into(),
            competitor_b: b.into(),
            result,
            metrics: MatchMetrics::default(),
            tournament_id: None,
            round: None,
            stage: MatchStage::Regular,
            high_stakes: false,
            played_at: None,
        }
    }

    pub fn in_tournament(mut self, tournament_id: impl Into<String>, round: u32) -> Self {
        self.tournament_id = Some(tournament_id.into());
        self.round = Some(round);
        self
    }
}

/// Per-side analytics attached to a match.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MatchMetrics {
    pub archetype_a: Option<String>,
    pub archetype_b: Option<String>,
    pub playstyle_a: PlaystyleObservation,
    pub playstyle_b: PlaystyleObservation,
    pub games_won_a: Option<u32>,
    pub games_won_b: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompetitorResult {
    pub competitor_id: CompetitorId,
    pub rating_delta: RatingValue,
    pub new_mean: RatingValue,
    pub new_deviation: RatingValue,
    pub new_conservative: RatingValue,
    pub new_tier: Tier,
    pub new_band: ConfidenceBand,
    pub division_points: f64,
    pub k_factor: f64,
    pub transition: Option<Transition>,
    pub achievements: Vec<Achievement>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchResultSummary {
    pub competitor_a: CompetitorResult,
    pub competitor_b: CompetitorResult,
    pub win_probability: f64,
    pub surprise: f64,
}
