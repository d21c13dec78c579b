use std::fs;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::errors::{self, EngineError, EngineResult};
use crate::rating::tiers::Tier;

const WEIGHT_SUM_TOLERANCE: f64 = 1e-6;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RatingSettings {
    /// Skill-class width.
    pub beta: f64,
    pub draw_probability: f64,
    pub initial_mean: f64,
    pub initial_deviation: f64,
    pub min_deviation: f64,
    pub max_deviation: f64,
    /// Matches after which the match-count half of confidence saturates.
    pub confidence_match_horizon: u32,
    pub recent_results_window: usize,
    pub match_history_cap: usize,
    pub placement_matches: u32,
    pub playstyle_learning_rate: f64,
    pub archetype_deviation_floor: f64,
}

impl Default for RatingSettings {
    fn default() -> Self {
        Self {
            beta: 200.0,
            draw_probability: 0.1,
            initial_mean: 1500.0,
            initial_deviation: 350.0,
            min_deviation: 25.0,
            max_deviation: 350.0,
            confidence_match_horizon: 50,
            recent_results_window: 20,
            match_history_cap: 100,
            placement_matches: 10,
            playstyle_learning_rate: 0.2,
            archetype_deviation_floor: 300.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WeightSettings {
    pub base: f64,
    pub min: f64,
    pub max: f64,
    pub tournament_multiplier: f64,
    pub semifinal_multiplier: f64,
    pub final_multiplier: f64,
    pub high_stakes_multiplier: f64,
    pub experience_divisor: f64,
}

impl Default for WeightSettings {
    fn default() -> Self {
        Self {
            base: 32.0,
            min: 16.0,
            max: 64.0,
            tournament_multiplier: 1.5,
            semifinal_multiplier: 1.1,
            final_multiplier: 1.2,
            high_stakes_multiplier: 1.25,
            experience_divisor: 100.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TierRange {
    pub tier: Tier,
    pub floor: f64,
    /// `None` marks the unbounded top tier.
    pub ceiling: Option<f64>,
    pub divisions: u8,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TierSettings {
    pub ranges: Vec<TierRange>,
    pub developing_threshold: f64,
    pub established_threshold: f64,
    pub proven_threshold: f64,
    /// Width used for division points in the unbounded top tier.
    pub open_tier_width: f64,
}

impl Default for TierSettings {
    fn default() -> Self {
        let bounded = [
            (Tier::Bronze, 0.0, 4),
            (Tier::Silver, 1200.0, 4),
            (Tier::Gold, 1600.0, 4),
            (Tier::Platinum, 2000.0, 4),
            (Tier::Diamond, 2400.0, 4),
            (Tier::Master, 2800.0, 1),
            (Tier::Grandmaster, 3200.0, 1),
        ];
        let mut ranges: Vec<TierRange> = bounded
            .iter()
            .map(|&(tier, floor, divisions)| TierRange {
                tier,
                floor,
                ceiling: Some(floor + if floor == 0.0 { 1200.0 } else { 400.0 }),
                divisions,
            })
            .collect();
        ranges.push(TierRange {
            tier: Tier::Mythic,
            floor: 3600.0,
            ceiling: None,
            divisions: 1,
        });

        Self {
            ranges,
            developing_threshold: 0.3,
            established_threshold: 0.6,
            proven_threshold: 0.85,
            open_tier_width: 400.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QualityWeights {
    pub skill: f64,
    pub uncertainty: f64,
    pub archetype: f64,
    pub history: f64,
    pub playstyle: f64,
    pub preferences: f64,
}

impl Default for QualityWeights {
    fn default() -> Self {
        Self {
            skill: 0.4,
            uncertainty: 0.15,
            archetype: 0.15,
            history: 0.1,
            playstyle: 0.1,
            preferences: 0.1,
        }
    }
}

impl QualityWeights {
    pub fn sum(&self) -> f64 {
        self.as_array().iter().sum()
    }

    pub fn as_array(&self) -> [f64; 6] {
        [
            self.skill,
            self.uncertainty,
            self.archetype,
            self.history,
            self.playstyle,
            self.preferences,
        ]
    }

    pub fn validate(&self) -> EngineResult<()> {
        if self.as_array().iter().any(|w| !w.is_finite() || *w < 0.0) {
            return Err(EngineError::invalid_config(
                "quality weights must be finite and non-negative",
            ));
        }
        let sum = self.sum();
        if (sum - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
            return Err(EngineError::invalid_config(format!(
                "quality weights sum to {sum:.6}, expected 1"
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum UncertaintyPolicy {
    /// Blend deviation similarity (at `similarity_weight`) with low combined deviation.
    PreferSimilar { similarity_weight: f64 },
    LowerIsBetter,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TraitPreference {
    Similar,
    Complementary,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlaystyleSettings {
    pub complementary_matching: bool,
    pub similarity_weight: f64,
    pub trait_weight: f64,
    pub aggression: TraitPreference,
    pub consistency: TraitPreference,
    pub complexity: TraitPreference,
    pub adaptability: TraitPreference,
    pub risk_taking: TraitPreference,
}

impl Default for PlaystyleSettings {
    fn default() -> Self {
        Self {
            complementary_matching: true,
            similarity_weight: 0.3,
            trait_weight: 0.7,
            aggression: TraitPreference::Complementary,
            consistency: TraitPreference::Similar,
            complexity: TraitPreference::Similar,
            adaptability: TraitPreference::Similar,
            risk_taking: TraitPreference::Complementary,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimeWeightingSettings {
    pub enabled: bool,
    pub half_life_days: f64,
    pub window: usize,
    pub min_factor: f64,
    pub max_factor: f64,
}

impl Default for TimeWeightingSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            half_life_days: 30.0,
            window: 20,
            min_factor: 0.8,
            max_factor: 1.2,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QualitySettings {
    pub weights: QualityWeights,
    pub max_allowed_difference: f64,
    pub min_desired_difference: f64,
    pub uncertainty: UncertaintyPolicy,
    pub playstyle: PlaystyleSettings,
    pub time_weighting: TimeWeightingSettings,
    pub rematch_penalty: f64,
}

impl Default for QualitySettings {
    fn default() -> Self {
        Self {
            weights: QualityWeights::default(),
            max_allowed_difference: 500.0,
            min_desired_difference: 100.0,
            uncertainty: UncertaintyPolicy::PreferSimilar {
                similarity_weight: 0.2,
            },
            playstyle: PlaystyleSettings::default(),
            time_weighting: TimeWeightingSettings::default(),
            rematch_penalty: 0.5,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SeedingMethod {
    Skill,
    Random,
    Performance,
    Hybrid,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PairingSettings {
    pub avoid_rematches: f64,
    pub win_points: u32,
    pub draw_points: u32,
    pub loss_points: u32,
    pub bye_points: u32,
    pub seeding: SeedingMethod,
    pub hybrid_skill_weight: f64,
}

impl Default for PairingSettings {
    fn default() -> Self {
        Self {
            avoid_rematches: 0.9,
            win_points: 3,
            draw_points: 1,
            loss_points: 0,
            bye_points: 3,
            seeding: SeedingMethod::Skill,
            hybrid_skill_weight: 0.7,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SeasonSettings {
    pub length_days: i64,
    pub reset_strength: f64,
    pub deviation_boost: f64,
    pub decay_threshold_days: i64,
    pub decay_per_week: f64,
    pub decay_deviation_ratio: f64,
    pub mean_floor: f64,
    /// Surprise above which a result counts as an upset.
    pub upset_threshold: f64,
}

impl Default for SeasonSettings {
    fn default() -> Self {
        Self {
            length_days: 90,
            reset_strength: 0.3,
            deviation_boost: 100.0,
            decay_threshold_days: 28,
            decay_per_week: 15.0,
            decay_deviation_ratio: 0.5,
            mean_floor: 0.0,
            upset_threshold: 0.5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchSettings {
    pub initial_range: f64,
    pub range_step: f64,
    pub expansion_interval_secs: u64,
    pub max_range: f64,
    pub quality_threshold: f64,
    pub max_duration_secs: u64,
    pub poll_interval_secs: u64,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            initial_range: 100.0,
            range_step: 50.0,
            expansion_interval_secs: 5,
            max_range: 500.0,
            quality_threshold: 0.7,
            max_duration_secs: 300,
            poll_interval_secs: 5,
        }
    }
}

impl SearchSettings {
    pub fn expansion_interval(&self) -> Duration {
        Duration::from_secs(self.expansion_interval_secs)
    }

    pub fn max_duration(&self) -> Duration {
        Duration::from_secs(self.max_duration_secs)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub rating: RatingSettings,
    pub weight: WeightSettings,
    pub tiers: TierSettings,
    pub quality: QualitySettings,
    pub pairing: PairingSettings,
    pub season: SeasonSettings,
    pub search: SearchSettings,
}

impl EngineConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Defaults, overridden by any fields present in the JSON file at `path`.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let config = match path {
            Some(path) => {
                let json = fs::read_to_string(path).with_context(|| errors::read_context(path))?;
                serde_json::from_str(&json).with_context(|| errors::parse_context(path, &json))?
            }
            None => Self::default(),
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> EngineResult<()> {
        self.quality.weights.validate()?;
        self.validate_rating()?;
        self.validate_tiers()?;
        self.validate_pairing()
    }

    fn validate_rating(&self) -> EngineResult<()> {
        let r = &self.rating;
        if !(r.min_deviation > 0.0 && r.min_deviation <= r.max_deviation) {
            return Err(EngineError::invalid_config(format!(
                "deviation bounds [{}, {}] are inconsistent",
                r.min_deviation, r.max_deviation
            )));
        }
        if !(0.0..1.0).contains(&r.draw_probability) {
            return Err(EngineError::invalid_config(format!(
                "draw probability {} outside [0, 1)",
                r.draw_probability
            )));
        }
        if r.beta <= 0.0 {
            return Err(EngineError::invalid_config("beta must be positive"));
        }
        Ok(())
    }

    fn validate_tiers(&self) -> EngineResult<()> {
        let t = &self.tiers;
        if t.ranges.is_empty() {
            return Err(EngineError::invalid_config("no tier ranges configured"));
        }
        let ascending = t.ranges.windows(2).all(|w| w[0].floor < w[1].floor);
        if !ascending {
            return Err(EngineError::invalid_config("tier floors must be ascending"));
        }
        let thresholds_ordered = t.developing_threshold < t.established_threshold
            && t.established_threshold < t.proven_threshold;
        if !thresholds_ordered {
            return Err(EngineError::invalid_config(
                "confidence band thresholds must be ascending",
            ));
        }
        Ok(())
    }

    fn validate_pairing(&self) -> EngineResult<()> {
        let avoid = self.pairing.avoid_rematches;
        if !(0.0..=1.0).contains(&avoid) {
            return Err(EngineError::invalid_config(format!(
                "avoid_rematches {avoid} outside [0, 1]"
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(EngineConfig::default().validate().is_ok());
        assert!((QualityWeights::default().sum() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_weights_outside_tolerance_are_rejected() {
        let mut config = EngineConfig::default();
        config.quality.weights.skill = 0.5;
        let err = config.validate().unwrap_err();
        assert!(matches!(err, EngineError::InvalidFormatConfiguration { .. }));
    }

    #[test]
    fn test_partial_json_overrides_keep_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("engine.json");
        fs::write(&path, r#"{ "rating": { "beta": 250.0 }, "pairing": { "seeding": "hybrid" } }"#)
            .unwrap();

        let config = EngineConfig::load(Some(&path)).unwrap();
        assert_eq!(config.rating.beta, 250.0);
        assert_eq!(config.rating.initial_mean, 1500.0);
        assert_eq!(config.pairing.seeding, SeedingMethod::Hybrid);
    }

    #[test]
    fn test_default_tiers_are_contiguous() {
        let tiers = TierSettings::default();
        for pair in tiers.ranges.windows(2) {
            assert_eq!(pair[0].ceiling, Some(pair[1].floor));
        }
        assert_eq!(tiers.ranges.last().unwrap().ceiling, None);
    }
}
