use std::collections::VecDeque;

use chrono::{DateTime, Utc};

use super::types::{MatchStage, RecentResult};
use crate::config::settings::{TimeWeightingSettings, WeightSettings};

/// What the K-factor depends on for one side of one match.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WeightContext {
    pub in_tournament: bool,
    pub stage: MatchStage,
    pub high_stakes: bool,
    pub experience_level: u32,
    pub deviation: f64,
    pub initial_deviation: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DynamicWeight {
    pub k_factor: f64,
    /// `k_factor` relative to the configured base; fed to the rating update.
    pub multiplier: f64,
}

pub fn calculate_dynamic_weight(context: &WeightContext, settings: &WeightSettings) -> DynamicWeight {
    let k_factor = (settings.base
        * stage_multiplier(context, settings)
        * stakes_multiplier(context, settings)
        * experience_dampener(context.experience_level, settings)
        * uncertainty_ratio(context.deviation, context.initial_deviation))
    .clamp(settings.min, settings.max);

    DynamicWeight {
        k_factor,
        multiplier: if settings.base > 0.0 { k_factor / settings.base } else { 0.0 },
    }
}

fn stage_multiplier(context: &WeightContext, settings: &WeightSettings) -> f64 {
    if !context.in_tournament {
        return 1.0;
    }
    let stage = match context.stage {
        MatchStage::Regular => 1.0,
        MatchStage::Semifinal => settings.semifinal_multiplier,
        MatchStage::Final => settings.final_multiplier,
    };
    settings.tournament_multiplier * stage
}

fn stakes_multiplier(context: &WeightContext, settings: &WeightSettings) -> f64 {
    if context.high_stakes {
        settings.high_stakes_multiplier
    } else {
        1.0
    }
}

fn experience_dampener(experience_level: u32, settings: &WeightSettings) -> f64 {
    if settings.experience_divisor <= 0.0 {
        return 1.0;
    }
    (1.0 - experience_level as f64 / settings.experience_divisor).max(0.5)
}

fn uncertainty_ratio(deviation: f64, initial_deviation: f64) -> f64 {
    if initial_deviation <= 0.0 {
        return 1.0;
    }
    (deviation / initial_deviation).clamp(0.5, 1.5)
}

pub fn calculate_weight(played_at: DateTime<Utc>, now: DateTime<Utc>, half_life_days: f64) -> f64 {
    let age_days = calculate_age_days(played_at, now);
    apply_exponential_decay(age_days, half_life_days)
}

fn calculate_age_days(played_at: DateTime<Utc>, now: DateTime<Utc>) -> f64 {
    let duration = now.signed_duration_since(played_at);
    (duration.num_seconds().max(0) as f64) / 86_400.0
}

fn apply_exponential_decay(age_days: f64, half_life_days: f64) -> f64 {
    // weight = exp(-λ × days_ago), λ = ln(2) / half_life_days
    if half_life_days <= 0.0 {
        return 1.0;
    }
    let lambda = std::f64::consts::LN_2 / half_life_days;
    (-lambda * age_days).exp()
}

/// Multiplier in `[min_factor, max_factor]` from the recency-weighted win rate
/// of the most recent results. Neutral (1.0) with no history.
pub fn time_weighting_factor(
    recent: &VecDeque<RecentResult>,
    now: DateTime<Utc>,
    settings: &TimeWeightingSettings,
) -> f64 {
    let mut weighted_score = 0.0;
    let mut total_weight = 0.0;

    for result in recent.iter().rev().take(settings.window) {
        let weight = calculate_weight(result.timestamp, now, settings.half_life_days);
        weighted_score += result.outcome.value() * weight;
        total_weight += weight;
    }

    if total_weight <= 0.0 {
        return 1.0;
    }
    let rate = weighted_score / total_weight;
    settings.min_factor + (settings.max_factor - settings.min_factor) * rate
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rating::types::Outcome;
    use chrono::Duration;

    fn context(in_tournament: bool, stage: MatchStage, high_stakes: bool, experience: u32, deviation: f64) -> WeightContext {
        WeightContext {
            in_tournament,
            stage,
            high_stakes,
            experience_level: experience,
            deviation,
            initial_deviation: 350.0,
        }
    }

    #[test]
    fn test_experienced_casual_match_sits_at_minimum() {
        let settings = WeightSettings::default();
        let weight = calculate_dynamic_weight(&context(false, MatchStage::Regular, false, 100, 80.0), &settings);
        assert_eq!(weight.k_factor, settings.min);
        assert!((weight.multiplier - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_new_competitor_in_final_sits_at_maximum() {
        let settings = WeightSettings::default();
        let weight = calculate_dynamic_weight(&context(true, MatchStage::Final, true, 0, 350.0), &settings);
        assert_eq!(weight.k_factor, settings.max);
        assert!((weight.multiplier - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_semifinal_amplifies_tournament_weight() {
        let settings = WeightSettings::default();
        let regular = calculate_dynamic_weight(&context(true, MatchStage::Regular, false, 0, 175.0), &settings);
        let semi = calculate_dynamic_weight(&context(true, MatchStage::Semifinal, false, 0, 175.0), &settings);
        assert!(semi.k_factor > regular.k_factor);
    }

    #[test]
    fn test_decay_halves_after_half_life() {
        let now = Utc::now();
        let weight = calculate_weight(now - Duration::days(30), now, 30.0);
        assert!((weight - 0.5).abs() < 1e-9);
        assert_eq!(calculate_weight(now + Duration::days(3), now, 30.0), 1.0);
    }

    #[test]
    fn test_time_factor_tracks_recent_form() {
        let now = Utc::now();
        let settings = TimeWeightingSettings::default();
        let streak = |outcome| {
            (0..5)
                .map(|i| RecentResult {
                    outcome,
                    rating_delta: 0.0,
                    timestamp: now - Duration::days(i),
                })
                .collect::<VecDeque<_>>()
        };

        assert!((time_weighting_factor(&streak(Outcome::Win), now, &settings) - 1.2).abs() < 1e-9);
        assert!((time_weighting_factor(&streak(Outcome::Loss), now, &settings) - 0.8).abs() < 1e-9);
        assert_eq!(time_weighting_factor(&VecDeque::new(), now, &settings), 1.0);
    }
}
