use serde::{Deserialize, Serialize};

use super::probability::{inverse_normal_cdf, normal_cdf, normal_pdf};
use super::types::{Outcome, RatingValue};
use crate::config::settings::RatingSettings;

// Below this the truncated-Gaussian ratios switch to their asymptotes.
const MIN_DENOMINATOR: f64 = 1e-12;

/// Mean and deviation of a skill belief.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Belief {
    pub mean: RatingValue,
    pub deviation: RatingValue,
}

impl Belief {
    pub fn new(mean: RatingValue, deviation: RatingValue) -> Self {
        Self { mean, deviation }
    }

    pub fn conservative_estimate(&self) -> RatingValue {
        self.mean - 3.0 * self.deviation
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RatingUpdate {
    pub player: Belief,
    pub opponent: Belief,
    pub win_probability: f64,
    pub surprise: f64,
}

impl RatingUpdate {
    pub fn player_delta(&self, before: &Belief) -> RatingValue {
        self.player.mean - before.mean
    }
}

pub fn combined_scale(player: &Belief, opponent: &Belief, settings: &RatingSettings) -> f64 {
    (2.0 * settings.beta.powi(2) + player.deviation.powi(2) + opponent.deviation.powi(2)).sqrt()
}

pub fn win_probability(player: &Belief, opponent: &Belief, settings: &RatingSettings) -> f64 {
    let c = combined_scale(player, opponent, settings);
    normal_cdf((player.mean - opponent.mean) / c)
}

/// Closed-form update of both beliefs after one match, seen from `player`'s side.
///
/// `weight_multiplier` scales the mean step, and its square root scales how
/// much uncertainty the match resolves. A zero weight leaves both beliefs
/// unchanged apart from the deviation bounds.
pub fn update(
    player: &Belief,
    opponent: &Belief,
    outcome: Outcome,
    weight_multiplier: f64,
    settings: &RatingSettings,
) -> RatingUpdate {
    let weight = if weight_multiplier.is_finite() {
        weight_multiplier.max(0.0)
    } else {
        0.0
    };
    let c = combined_scale(player, opponent, settings);
    let t = (player.mean - opponent.mean) / c;
    let win_probability = normal_cdf(t);

    let (lower, upper) = draw_margin_bounds(settings, c);
    let (v, w) = truncation_moments(t, lower, upper, outcome);
    let uncertainty_factor = weight.sqrt();

    let player_after = step(player, c, v, w, weight, uncertainty_factor, settings);
    let opponent_after = step(opponent, c, -v, w, weight, uncertainty_factor, settings);

    RatingUpdate {
        player: player_after,
        opponent: opponent_after,
        win_probability,
        surprise: (outcome.value() - win_probability).abs(),
    }
}

/// Draw region `[lower, upper]` on the normalised performance difference.
fn draw_margin_bounds(settings: &RatingSettings, c: f64) -> (f64, f64) {
    let draw = settings.draw_probability.clamp(0.0, 1.0);
    let scale = std::f64::consts::SQRT_2 * settings.beta / c;
    let lower = inverse_normal_cdf((1.0 - draw) / 2.0) * scale;
    let upper = inverse_normal_cdf((1.0 + draw) / 2.0) * scale;
    (lower.min(0.0), upper.max(0.0))
}

fn truncation_moments(t: f64, lower: f64, upper: f64, outcome: Outcome) -> (f64, f64) {
    match outcome {
        Outcome::Win => decisive_moments(t - upper),
        Outcome::Loss => {
            let (v, w) = decisive_moments(-t + lower);
            (-v, w)
        }
        Outcome::Draw => draw_moments(t, lower, upper),
    }
}

fn decisive_moments(x: f64) -> (f64, f64) {
    let denom = normal_cdf(x);
    let v = if denom < MIN_DENOMINATOR {
        -x
    } else {
        normal_pdf(x) / denom
    };
    let w = (v * (v + x)).clamp(0.0, 1.0);
    (v, w)
}

fn draw_moments(t: f64, lower: f64, upper: f64) -> (f64, f64) {
    let a = lower - t;
    let b = upper - t;
    let denom = normal_cdf(b) - normal_cdf(a);
    if denom < MIN_DENOMINATOR {
        return (-t, 1.0);
    }
    let v = (normal_pdf(a) - normal_pdf(b)) / denom;
    let w = v * v + (b * normal_pdf(b) - a * normal_pdf(a)) / denom;
    (v, w.clamp(0.0, 1.0))
}

fn step(
    belief: &Belief,
    c: f64,
    v: f64,
    w: f64,
    weight: f64,
    uncertainty_factor: f64,
    settings: &RatingSettings,
) -> Belief {
    let variance = belief.deviation.powi(2);
    let mean = belief.mean + (variance / c) * v * weight;

    let shrink = 1.0 - (variance / c.powi(2)) * w * uncertainty_factor;
    let new_variance = (variance * shrink)
        .max(settings.min_deviation.powi(2))
        .min(settings.max_deviation.powi(2));
    let deviation = new_variance.sqrt();

    Belief {
        mean: if mean.is_finite() { mean } else { belief.mean },
        deviation: if deviation.is_finite() {
            deviation
        } else {
            belief.deviation.clamp(settings.min_deviation, settings.max_deviation)
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings() -> RatingSettings {
        RatingSettings::default()
    }

    fn fresh() -> Belief {
        Belief::new(1500.0, 350.0)
    }

    #[test]
    fn test_identical_ratings_have_even_odds() {
        let p = win_probability(&fresh(), &fresh(), &settings());
        assert!((p - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_decisive_win_between_defaults() {
        let before_a = fresh();
        let before_b = fresh();
        let result = update(&before_a, &before_b, Outcome::Win, 1.0, &settings());

        let delta_a = result.player.mean - before_a.mean;
        let delta_b = result.opponent.mean - before_b.mean;
        assert!(delta_a > 0.0);
        assert!(delta_b < 0.0);
        assert!(delta_b.abs() <= delta_a.abs() + 1e-9);

        assert!(result.player.deviation < before_a.deviation);
        assert!(result.opponent.deviation < before_b.deviation);
        assert!(result.player.deviation >= settings().min_deviation);
        assert!((result.surprise - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_win_and_loss_mirror_each_other() {
        let a = Belief::new(1620.0, 180.0);
        let b = Belief::new(1480.0, 260.0);
        let from_a = update(&a, &b, Outcome::Win, 1.0, &settings());
        let from_b = update(&b, &a, Outcome::Loss, 1.0, &settings());

        assert!((from_a.player.mean - from_b.opponent.mean).abs() < 1e-9);
        assert!((from_a.opponent.mean - from_b.player.mean).abs() < 1e-9);
    }

    #[test]
    fn test_draw_between_equals_leaves_means() {
        let result = update(&fresh(), &fresh(), Outcome::Draw, 1.0, &settings());
        assert!((result.player.mean - 1500.0).abs() < 1e-9);
        assert!((result.opponent.mean - 1500.0).abs() < 1e-9);
    }

    #[test]
    fn test_draw_pulls_favourite_down() {
        let favourite = Belief::new(1800.0, 120.0);
        let underdog = Belief::new(1400.0, 120.0);
        let result = update(&favourite, &underdog, Outcome::Draw, 1.0, &settings());
        assert!(result.player.mean < favourite.mean);
        assert!(result.opponent.mean > underdog.mean);
    }

    #[test]
    fn test_upset_moves_more_than_expected_win() {
        let strong = Belief::new(1900.0, 150.0);
        let weak = Belief::new(1300.0, 150.0);
        let expected = update(&strong, &weak, Outcome::Win, 1.0, &settings());
        let upset = update(&weak, &strong, Outcome::Win, 1.0, &settings());

        assert!(upset.player.mean - weak.mean > expected.player.mean - strong.mean);
        assert!(upset.surprise > 0.9);
    }

    #[test]
    fn test_zero_weight_is_a_no_op() {
        let a = Belief::new(1550.0, 200.0);
        let b = Belief::new(1450.0, 90.0);
        let result = update(&a, &b, Outcome::Win, 0.0, &settings());
        assert_eq!(result.player, a);
        assert_eq!(result.opponent, b);
    }

    #[test]
    fn test_deviation_floor_holds_under_heavy_weight() {
        let a = Belief::new(1500.0, 26.0);
        let b = Belief::new(1500.0, 26.0);
        let result = update(&a, &b, Outcome::Win, 64.0, &settings());
        assert!(result.player.deviation >= 25.0);
        assert!(result.opponent.deviation >= 25.0);
    }

    #[test]
    fn test_extreme_gap_stays_finite() {
        let a = Belief::new(0.0, 25.0);
        let b = Belief::new(100_000.0, 25.0);
        for outcome in [Outcome::Win, Outcome::Draw, Outcome::Loss] {
            let result = update(&a, &b, outcome, 2.0, &settings());
            assert!(result.player.mean.is_finite());
            assert!(result.opponent.deviation.is_finite());
        }
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn prop_win_probabilities_sum_to_one(
                mean_a in 0.0f64..4000.0,
                mean_b in 0.0f64..4000.0,
                dev_a in 25.0f64..350.0,
                dev_b in 25.0f64..350.0,
            ) {
                let a = Belief::new(mean_a, dev_a);
                let b = Belief::new(mean_b, dev_b);
                let total = win_probability(&a, &b, &settings()) + win_probability(&b, &a, &settings());
                prop_assert!((total - 1.0).abs() < 1e-9);
            }

            #[test]
            fn prop_conservative_estimate_is_monotone(
                mean in 0.0f64..4000.0,
                dev in 25.0f64..300.0,
                bump in 0.1f64..50.0,
            ) {
                let base = Belief::new(mean, dev);
                prop_assert!(Belief::new(mean + bump, dev).conservative_estimate() > base.conservative_estimate());
                prop_assert!(Belief::new(mean, dev + bump).conservative_estimate() < base.conservative_estimate());
            }
        }
    }
}
