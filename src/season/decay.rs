use chrono::{DateTime, Utc};
use log::info;
use serde::{Deserialize, Serialize};

use crate::config::settings::EngineConfig;
use crate::rating::{Belief, CompetitorId, CompetitorRating};

const DAYS_PER_WEEK: i64 = 7;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DecayReport {
    pub competitor_id: CompetitorId,
    pub weeks_charged: i64,
    pub amount: f64,
    pub mean_before: f64,
    pub mean_after: f64,
    pub deviation_before: f64,
    pub deviation_after: f64,
}

fn whole_weeks(from: DateTime<Utc>, to: DateTime<Utc>) -> i64 {
    ((to - from).num_days() / DAYS_PER_WEEK).max(0)
}

/// Charges inactivity decay for the whole inactive weeks not yet charged.
///
/// Nothing happens until the competitor has been idle for the configured
/// threshold. From then on every inactive week since their last match costs
/// `decay_per_week` mean points, and half that amount (by default) is added
/// to the deviation. Weeks covered by an earlier application are skipped, so
/// calling this repeatedly never double-charges.
pub fn apply_decay(
    rating: &mut CompetitorRating,
    now: DateTime<Utc>,
    config: &EngineConfig,
) -> Option<DecayReport> {
    let settings = &config.season;
    let last_active = rating.last_active?;
    if (now - last_active).num_days() < settings.decay_threshold_days {
        return None;
    }

    let weeks_idle = whole_weeks(last_active, now);
    let already_charged = rating
        .last_decay_at
        .filter(|charged_at| *charged_at > last_active)
        .map_or(0, |charged_at| whole_weeks(last_active, charged_at));
    let weeks_due = weeks_idle - already_charged;
    if weeks_due <= 0 {
        return None;
    }

    let amount = weeks_due as f64 * settings.decay_per_week;
    let before = rating.belief();
    let mean = (before.mean - amount).max(settings.mean_floor);
    let deviation = (before.deviation + amount * settings.decay_deviation_ratio)
        .min(config.rating.max_deviation);
    rating.set_belief(Belief::new(mean, deviation), config);
    rating.last_decay_at = Some(now);

    info!(
        "Decay for {}: {} week(s), mean {:.1} → {:.1}",
        rating.id,
        weeks_due,
        before.mean,
        rating.mean()
    );
    Some(DecayReport {
        competitor_id: rating.id.clone(),
        weeks_charged: weeks_due,
        amount,
        mean_before: before.mean,
        mean_after: rating.mean(),
        deviation_before: before.deviation,
        deviation_after: rating.deviation(),
    })
}
