use serde::{Deserialize, Serialize};

use crate::config::settings::{RatingSettings, TierRange, TierSettings};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    Bronze,
    Silver,
    Gold,
    Platinum,
    Diamond,
    Master,
    Grandmaster,
    Mythic,
}

impl Tier {
    pub fn as_str(&self) -> &str {
        match self {
            Tier::Bronze => "bronze",
            Tier::Silver => "silver",
            Tier::Gold => "gold",
            Tier::Platinum => "platinum",
            Tier::Diamond => "diamond",
            Tier::Master => "master",
            Tier::Grandmaster => "grandmaster",
            Tier::Mythic => "mythic",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfidenceBand {
    Uncertain,
    Developing,
    Established,
    Proven,
}

impl ConfidenceBand {
    pub fn from_confidence(confidence: f64, settings: &TierSettings) -> Self {
        if confidence >= settings.proven_threshold {
            ConfidenceBand::Proven
        } else if confidence >= settings.established_threshold {
            ConfidenceBand::Established
        } else if confidence >= settings.developing_threshold {
            ConfidenceBand::Developing
        } else {
            ConfidenceBand::Uncertain
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            ConfidenceBand::Uncertain => "uncertain",
            ConfidenceBand::Developing => "developing",
            ConfidenceBand::Established => "established",
            ConfidenceBand::Proven => "proven",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Classification {
    pub tier: Tier,
    /// Position of `tier` in the configured ranges; used for ordering.
    pub tier_index: usize,
    pub band: ConfidenceBand,
    /// 1 is the top division of a tier.
    pub division: u8,
    pub division_points: f64,
}

impl Classification {
    fn rank_key(&self) -> (usize, ConfidenceBand) {
        (self.tier_index, self.band)
    }
}

/// Change between two classifications, strongest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Transition {
    TierPromotion,
    BandPromotion,
    BandDemotion,
    TierDemotion,
}

/// Matches-played and deviation each contribute half of a `[0, 1]` confidence.
pub fn confidence(matches_played: u32, deviation: f64, settings: &RatingSettings) -> f64 {
    let horizon = settings.confidence_match_horizon.max(1) as f64;
    let from_matches = (matches_played as f64 / horizon).min(1.0);

    let span = settings.initial_deviation - settings.min_deviation;
    let from_deviation = if span > 0.0 {
        (1.0 - (deviation - settings.min_deviation) / span).clamp(0.0, 1.0)
    } else {
        1.0
    };

    ((from_matches + from_deviation) / 2.0).clamp(0.0, 1.0)
}

pub fn classify(estimate: f64, confidence: f64, settings: &TierSettings) -> Classification {
    let (tier_index, range) = locate_range(estimate, settings);
    let band = ConfidenceBand::from_confidence(confidence, settings);

    match range {
        Some(range) => {
            let width = range_width(range, settings);
            let position = ((estimate - range.floor) / width).clamp(0.0, 1.0);
            Classification {
                tier: range.tier,
                tier_index,
                band,
                division: division_for(position, range.divisions),
                division_points: position * 100.0,
            }
        }
        None => Classification {
            tier: Tier::Bronze,
            tier_index: 0,
            band,
            division: 1,
            division_points: 0.0,
        },
    }
}

fn locate_range(estimate: f64, settings: &TierSettings) -> (usize, Option<&TierRange>) {
    let found = settings.ranges.iter().enumerate().find(|(_, range)| {
        estimate >= range.floor && range.ceiling.is_none_or(|ceiling| estimate < ceiling)
    });

    match found {
        Some((index, range)) => (index, Some(range)),
        // Below the lowest floor (or NaN): lowest tier.
        None => (0, settings.ranges.first()),
    }
}

fn range_width(range: &TierRange, settings: &TierSettings) -> f64 {
    let width = match range.ceiling {
        Some(ceiling) => ceiling - range.floor,
        None => settings.open_tier_width,
    };
    width.max(f64::EPSILON)
}

fn division_for(position: f64, divisions: u8) -> u8 {
    let divisions = divisions.max(1);
    let from_bottom = ((position * divisions as f64).floor() as u8).min(divisions - 1);
    divisions - from_bottom
}

pub fn detect_transition(before: &Classification, after: &Classification) -> Option<Transition> {
    use std::cmp::Ordering;

    match after.tier_index.cmp(&before.tier_index) {
        Ordering::Greater => return Some(Transition::TierPromotion),
        Ordering::Less => return Some(Transition::TierDemotion),
        Ordering::Equal => {}
    }
    match after.rank_key().cmp(&before.rank_key()) {
        Ordering::Greater => Some(Transition::BandPromotion),
        Ordering::Less => Some(Transition::BandDemotion),
        Ordering::Equal => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tiers() -> TierSettings {
        TierSettings::default()
    }

    #[test]
    fn test_ranges_are_half_open() {
        assert_eq!(classify(1199.99, 0.5, &tiers()).tier, Tier::Bronze);
        assert_eq!(classify(1200.0, 0.5, &tiers()).tier, Tier::Silver);
        assert_eq!(classify(3600.0, 0.5, &tiers()).tier, Tier::Mythic);
        assert_eq!(classify(9000.0, 0.5, &tiers()).division_points, 100.0);
    }

    #[test]
    fn test_negative_estimate_lands_in_lowest_tier() {
        let c = classify(-250.0, 0.1, &tiers());
        assert_eq!(c.tier, Tier::Bronze);
        assert_eq!(c.division_points, 0.0);
        assert_eq!(c.band, ConfidenceBand::Uncertain);
    }

    #[test]
    fn test_division_points_are_linear_within_tier() {
        let c = classify(1700.0, 0.9, &tiers());
        assert_eq!(c.tier, Tier::Gold);
        assert!((c.division_points - 25.0).abs() < 1e-9);
        assert_eq!(c.division, 3);
        assert_eq!(c.band, ConfidenceBand::Proven);
    }

    #[test]
    fn test_band_thresholds() {
        let s = tiers();
        assert_eq!(ConfidenceBand::from_confidence(0.29, &s), ConfidenceBand::Uncertain);
        assert_eq!(ConfidenceBand::from_confidence(0.3, &s), ConfidenceBand::Developing);
        assert_eq!(ConfidenceBand::from_confidence(0.6, &s), ConfidenceBand::Established);
        assert_eq!(ConfidenceBand::from_confidence(0.85, &s), ConfidenceBand::Proven);
    }

    #[test]
    fn test_classification_is_idempotent() {
        for estimate in [-10.0, 450.0, 1599.0, 2400.0, 3999.0] {
            let first = classify(estimate, 0.7, &tiers());
            assert_eq!(first, classify(estimate, 0.7, &tiers()));
        }
    }

    #[test]
    fn test_transitions_follow_tier_then_band() {
        let s = tiers();
        let silver_proven = classify(1300.0, 0.9, &s);
        let gold_uncertain = classify(1650.0, 0.1, &s);
        let silver_uncertain = classify(1300.0, 0.1, &s);

        assert_eq!(detect_transition(&silver_proven, &gold_uncertain), Some(Transition::TierPromotion));
        assert_eq!(detect_transition(&gold_uncertain, &silver_proven), Some(Transition::TierDemotion));
        assert_eq!(detect_transition(&silver_uncertain, &silver_proven), Some(Transition::BandPromotion));
        assert_eq!(detect_transition(&silver_proven, &silver_uncertain), Some(Transition::BandDemotion));
        assert_eq!(detect_transition(&silver_proven, &classify(1350.0, 0.95, &s)), None);
        assert!(Transition::TierPromotion < Transition::BandPromotion);
    }

    #[test]
    fn test_confidence_grows_with_matches_and_certainty() {
        let s = RatingSettings::default();
        assert_eq!(confidence(0, 350.0, &s), 0.0);
        assert_eq!(confidence(50, 25.0, &s), 1.0);
        assert!(confidence(10, 200.0, &s) > confidence(5, 250.0, &s));
    }
}
