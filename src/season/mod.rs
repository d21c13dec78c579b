pub mod decay;
pub mod reset;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::config::settings::SeasonSettings;

pub use decay::{DecayReport, apply_decay};
pub use reset::{ArchivedRating, SeasonArchive, SeasonReward, reward_for, roll_over, soft_reset};

/// Running totals of how surprising the season's results were.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SeasonAnalytics {
    pub matches_processed: u64,
    pub total_surprise: f64,
    pub upsets: u64,
}

impl SeasonAnalytics {
    pub fn average_surprise(&self) -> f64 {
        if self.matches_processed == 0 {
            0.0
        } else {
            self.total_surprise / self.matches_processed as f64
        }
    }

    pub fn upset_rate(&self) -> f64 {
        if self.matches_processed == 0 {
            0.0
        } else {
            self.upsets as f64 / self.matches_processed as f64
        }
    }
}

/// The current season, passed explicitly to everything that needs it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeasonContext {
    pub number: u32,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
    #[serde(default)]
    pub analytics: SeasonAnalytics,
}

impl SeasonContext {
    pub fn new(number: u32, starts_at: DateTime<Utc>, settings: &SeasonSettings) -> Self {
        Self {
            number,
            starts_at,
            ends_at: starts_at + Duration::days(settings.length_days.max(1)),
            analytics: SeasonAnalytics::default(),
        }
    }

    pub fn first(now: DateTime<Utc>, settings: &SeasonSettings) -> Self {
        Self::new(1, now, settings)
    }

    pub fn next(&self, now: DateTime<Utc>, settings: &SeasonSettings) -> Self {
        Self::new(self.number + 1, now, settings)
    }

    pub fn is_over(&self, now: DateTime<Utc>) -> bool {
        now >= self.ends_at
    }

    pub fn days_remaining(&self, now: DateTime<Utc>) -> i64 {
        (self.ends_at - now).num_days().max(0)
    }

    /// Counts one processed match. Returns whether it was an upset.
    pub fn record_surprise(&mut self, surprise: f64, settings: &SeasonSettings) -> bool {
        let surprise = if surprise.is_finite() { surprise.clamp(0.0, 1.0) } else { 0.0 };
        self.analytics.matches_processed += 1;
        self.analytics.total_surprise += surprise;
        let upset = surprise > settings.upset_threshold;
        if upset {
            self.analytics.upsets += 1;
        }
        upset
    }
}
