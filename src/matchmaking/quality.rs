use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::archetypes::ArchetypeMatrix;
use crate::config::settings::{
    EngineConfig, PlaystyleSettings, QualitySettings, RatingSettings, TraitPreference,
    UncertaintyPolicy,
};
use crate::errors::EngineResult;
use crate::rating::weighting::{calculate_weight, time_weighting_factor};
use crate::rating::{CompetitorId, CompetitorRating, win_probability};

// Scores a pairing whose mean gap exceeds the allowed difference.
const MISMATCH_PENALTY: f64 = 0.1;
const TOO_PREDICTABLE_PENALTY: f64 = 0.8;
const NEUTRAL_SCORE: f64 = 0.5;
const UNCERTAINTY_FLOOR: f64 = 0.1;
// Outside a tournament, a past meeting's weight halves every week.
const REMATCH_MEMORY_HALF_LIFE_DAYS: f64 = 7.0;

/// What `a` wants from an opponent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MatchPreferences {
    /// 0 prefers easier opponents, 1 harder; `None` is indifferent.
    pub difficulty: Option<f64>,
    pub preferred_archetypes: Vec<String>,
    pub preferred_opponents: Vec<CompetitorId>,
    pub blocked_opponents: Vec<CompetitorId>,
}

/// Optional facts about a candidate pairing.
#[derive(Debug, Clone, Copy)]
pub struct QualityContext<'a> {
    pub now: DateTime<Utc>,
    /// Set inside a tournament; rematch penalties shrink as rounds advance.
    pub round: Option<u32>,
    /// Meetings to count instead of scanning `a`'s history.
    pub prior_meetings: Option<usize>,
    pub archetype_a: Option<&'a str>,
    pub archetype_b: Option<&'a str>,
    pub preferences: Option<&'a MatchPreferences>,
}

impl<'a> QualityContext<'a> {
    pub fn at(now: DateTime<Utc>) -> Self {
        Self {
            now,
            round: None,
            prior_meetings: None,
            archetype_a: None,
            archetype_b: None,
            preferences: None,
        }
    }

    pub fn in_round(mut self, round: u32, prior_meetings: usize) -> Self {
        self.round = Some(round);
        self.prior_meetings = Some(prior_meetings);
        self
    }

    pub fn with_archetypes(mut self, a: Option<&'a str>, b: Option<&'a str>) -> Self {
        self.archetype_a = a;
        self.archetype_b = b;
        self
    }

    pub fn with_preferences(mut self, preferences: Option<&'a MatchPreferences>) -> Self {
        self.preferences = preferences;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QualityBreakdown {
    pub skill: f64,
    pub uncertainty: f64,
    pub archetype: f64,
    pub history: f64,
    pub playstyle: f64,
    pub preferences: f64,
    pub time_factor: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchQuality {
    pub score: f64,
    pub win_probability: f64,
    pub skill_difference: f64,
    pub breakdown: QualityBreakdown,
}

pub struct MatchQualityScorer<'a> {
    settings: &'a QualitySettings,
    rating: &'a RatingSettings,
    matrix: &'a ArchetypeMatrix,
}

impl<'a> MatchQualityScorer<'a> {
    pub fn new(config: &'a EngineConfig, matrix: &'a ArchetypeMatrix) -> EngineResult<Self> {
        config.quality.weights.validate()?;
        Ok(Self {
            settings: &config.quality,
            rating: &config.rating,
            matrix,
        })
    }

    pub fn score(
        &self,
        a: &CompetitorRating,
        b: &CompetitorRating,
        context: &QualityContext<'_>,
    ) -> MatchQuality {
        let skill_difference = (a.mean() - b.mean()).abs();
        let time_factor = self.time_adjustment(a, b, context.now);

        let breakdown = QualityBreakdown {
            skill: self.skill_score(skill_difference),
            uncertainty: self.uncertainty_score(a.deviation(), b.deviation()),
            archetype: self
                .matrix
                .matchup_score(context.archetype_a, context.archetype_b),
            history: self.history_score(a, &b.id, context),
            playstyle: playstyle_score(a, b, &self.settings.playstyle),
            preferences: preferences_score(a, b, context),
            time_factor,
        };

        let w = &self.settings.weights;
        let weighted = breakdown.skill * w.skill
            + breakdown.uncertainty * w.uncertainty
            + breakdown.archetype * w.archetype
            + breakdown.history * w.history
            + breakdown.playstyle * w.playstyle
            + breakdown.preferences * w.preferences;

        MatchQuality {
            score: (weighted * time_factor).clamp(0.0, 1.0),
            win_probability: win_probability(&a.belief(), &b.belief(), self.rating),
            skill_difference,
            breakdown,
        }
    }

    fn skill_score(&self, difference: f64) -> f64 {
        let max = self.settings.max_allowed_difference.max(f64::EPSILON);
        let base = 1.0 - (difference / max).min(1.0);
        if difference > max {
            base * MISMATCH_PENALTY
        } else if difference < self.settings.min_desired_difference {
            base * TOO_PREDICTABLE_PENALTY
        } else {
            base
        }
    }

    fn uncertainty_score(&self, deviation_a: f64, deviation_b: f64) -> f64 {
        let max = self.rating.max_deviation.max(f64::EPSILON);
        let level = (1.0 - (deviation_a + deviation_b) / (2.0 * max)).max(UNCERTAINTY_FLOOR);

        match self.settings.uncertainty {
            UncertaintyPolicy::PreferSimilar { similarity_weight } => {
                let similarity =
                    (1.0 - (deviation_a - deviation_b).abs() / max).max(UNCERTAINTY_FLOOR);
                let weight = similarity_weight.clamp(0.0, 1.0);
                similarity * weight + level * (1.0 - weight)
            }
            UncertaintyPolicy::LowerIsBetter => level,
        }
    }

    fn history_score(&self, a: &CompetitorRating, opponent: &str, context: &QualityContext<'_>) -> f64 {
        let penalty = match context.round {
            Some(round) => {
                let meetings = context
                    .prior_meetings
                    .unwrap_or_else(|| a.meetings_with(opponent));
                self.settings.rematch_penalty / round.max(1) as f64 * meetings as f64
            }
            None => {
                let remembered: f64 = a
                    .match_history
                    .iter()
                    .filter(|record| record.opponent_id == opponent)
                    .map(|record| {
                        calculate_weight(record.timestamp, context.now, REMATCH_MEMORY_HALF_LIFE_DAYS)
                    })
                    .sum();
                self.settings.rematch_penalty * remembered
            }
        };
        (1.0 - penalty).clamp(0.0, 1.0)
    }

    /// Hot form favours stronger opponents, cold form weaker ones.
    fn time_adjustment(&self, a: &CompetitorRating, b: &CompetitorRating, now: DateTime<Utc>) -> f64 {
        let settings = &self.settings.time_weighting;
        if !settings.enabled || a.mean() == b.mean() {
            return 1.0;
        }
        let factor = time_weighting_factor(&a.recent_results, now, settings);
        if b.mean() > a.mean() { factor } else { 2.0 - factor }
    }
}

fn playstyle_score(a: &CompetitorRating, b: &CompetitorRating, settings: &PlaystyleSettings) -> f64 {
    let traits_a = a.playstyle.traits();
    let traits_b = b.playstyle.traits();
    let preferences = [
        settings.aggression,
        settings.consistency,
        settings.complexity,
        settings.adaptability,
        settings.risk_taking,
    ];

    let average_difference = traits_a
        .iter()
        .zip(&traits_b)
        .map(|(x, y)| (x - y).abs())
        .sum::<f64>()
        / traits_a.len() as f64;
    let similarity = 1.0 - average_difference;

    if !settings.complementary_matching {
        return similarity.clamp(0.0, 1.0);
    }

    let per_trait = traits_a
        .iter()
        .zip(&traits_b)
        .zip(&preferences)
        .map(|((x, y), preference)| match preference {
            TraitPreference::Similar => 1.0 - (x - y).abs(),
            TraitPreference::Complementary => 1.0 - (x + y - 1.0).abs(),
        })
        .sum::<f64>()
        / traits_a.len() as f64;

    (similarity * settings.similarity_weight + per_trait * settings.trait_weight).clamp(0.0, 1.0)
}

fn preferences_score(a: &CompetitorRating, b: &CompetitorRating, context: &QualityContext<'_>) -> f64 {
    let Some(preferences) = context.preferences else {
        return NEUTRAL_SCORE;
    };
    if preferences.blocked_opponents.contains(&b.id) {
        return 0.0;
    }

    let mut score = NEUTRAL_SCORE;
    if let Some(archetype) = context.archetype_b {
        if preferences.preferred_archetypes.iter().any(|p| p == archetype) {
            score += 0.2;
        }
    }
    if preferences.preferred_opponents.contains(&b.id) {
        score += 0.2;
    }
    if let Some(difficulty) = preferences.difficulty {
        let wants_easier = difficulty < 0.5 && b.mean() < a.mean();
        let wants_harder = difficulty > 0.5 && b.mean() > a.mean();
        if wants_easier || wants_harder {
            score += 0.1;
        }
    }
    score.clamp(0.0, 1.0)
}
