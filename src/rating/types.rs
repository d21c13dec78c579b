use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub type CompetitorId = String;
pub type RatingValue = f64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Win,
    Draw,
    Loss,
}

impl Outcome {
    /// Score used by the surprise factor: 1, 0.5 or 0.
    pub fn value(&self) -> f64 {
        match self {
            Outcome::Win => 1.0,
            Outcome::Draw => 0.5,
            Outcome::Loss => 0.0,
        }
    }

    /// The same result seen from the opponent's side.
    pub fn reversed(&self) -> Self {
        match self {
            Outcome::Win => Outcome::Loss,
            Outcome::Draw => Outcome::Draw,
            Outcome::Loss => Outcome::Win,
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Outcome::Win => "win",
            Outcome::Draw => "draw",
            Outcome::Loss => "loss",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchStage {
    #[default]
    Regular,
    Semifinal,
    Final,
}

/// Five bounded traits describing how a competitor tends to play.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Playstyle {
    pub aggression: f64,
    pub consistency: f64,
    pub complexity: f64,
    pub adaptability: f64,
    pub risk_taking: f64,
}

impl Default for Playstyle {
    fn default() -> Self {
        Self {
            aggression: 0.5,
            consistency: 0.5,
            complexity: 0.5,
            adaptability: 0.5,
            risk_taking: 0.5,
        }
    }
}

impl Playstyle {
    pub fn traits(&self) -> [f64; 5] {
        [
            self.aggression,
            self.consistency,
            self.complexity,
            self.adaptability,
            self.risk_taking,
        ]
    }

    /// Exponential smoothing toward the traits observed in one match.
    pub fn blend(&mut self, observed: &PlaystyleObservation, learning_rate: f64) {
        let rate = learning_rate.clamp(0.0, 1.0);
        let smooth = |current: &mut f64, seen: Option<f64>| {
            if let Some(seen) = seen.filter(|v| v.is_finite()) {
                *current = (*current + rate * (seen - *current)).clamp(0.0, 1.0);
            }
        };
        smooth(&mut self.aggression, observed.aggression);
        smooth(&mut self.consistency, observed.consistency);
        smooth(&mut self.complexity, observed.complexity);
        smooth(&mut self.adaptability, observed.adaptability);
        smooth(&mut self.risk_taking, observed.risk_taking);
    }
}

/// Post-match trait readings from the analytics collaborator; any may be missing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PlaystyleObservation {
    pub aggression: Option<f64>,
    pub consistency: Option<f64>,
    pub complexity: Option<f64>,
    pub adaptability: Option<f64>,
    pub risk_taking: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArchetypeRecord {
    pub archetype: String,
    pub mean: RatingValue,
    pub deviation: RatingValue,
    pub wins: u32,
    pub losses: u32,
    pub draws: u32,
}

impl ArchetypeRecord {
    pub fn conservative_estimate(&self) -> RatingValue {
        self.mean - 3.0 * self.deviation
    }

    pub fn matches_played(&self) -> u32 {
        self.wins + self.losses + self.draws
    }

    pub fn record(&mut self, outcome: Outcome) {
        match outcome {
            Outcome::Win => self.wins += 1,
            Outcome::Draw => self.draws += 1,
            Outcome::Loss => self.losses += 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecentResult {
    pub outcome: Outcome,
    pub rating_delta: RatingValue,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchRecord {
    pub opponent_id: CompetitorId,
    pub outcome: Outcome,
    pub rating_before: RatingValue,
    pub rating_after: RatingValue,
    pub timestamp: DateTime<Utc>,
    pub tournament_id: Option<String>,
    pub round: Option<u32>,
    pub stage: MatchStage,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_reversal() {
        assert_eq!(Outcome::Win.reversed(), Outcome::Loss);
        assert_eq!(Outcome::Draw.reversed(), Outcome::Draw);
        assert_eq!(Outcome::Loss.value() + Outcome::Win.value(), 1.0);
    }

    #[test]
    fn test_playstyle_blend_moves_toward_observation_and_stays_bounded() {
        let mut style = Playstyle::default();
        let observed = PlaystyleObservation {
            aggression: Some(1.0),
            risk_taking: Some(-4.0),
            ..Default::default()
        };
        style.blend(&observed, 0.2);

        assert!((style.aggression - 0.6).abs() < 1e-12);
        assert_eq!(style.risk_taking, 0.0);
        assert_eq!(style.consistency, 0.5);
    }
}
