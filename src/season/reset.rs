use chrono::{DateTime, Utc};
use log::info;
use serde::{Deserialize, Serialize};

use super::{SeasonAnalytics, SeasonContext};
use crate::config::settings::EngineConfig;
use crate::rating::{Belief, CompetitorId, CompetitorRating, Tier};
use crate::tournament::compare_ratings;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeasonReward {
    pub currency: u32,
    pub packs: u32,
    pub cosmetics: Vec<String>,
}

/// Season-end payout for finishing in `tier`.
pub fn reward_for(tier: Tier) -> SeasonReward {
    match tier {
        Tier::Bronze => reward(100, 1, &[]),
        Tier::Silver => reward(200, 2, &["silver_border"]),
        Tier::Gold => reward(400, 4, &["gold_border", "gold_avatar"]),
        Tier::Platinum => reward(800, 6, &["platinum_border", "platinum_avatar"]),
        Tier::Diamond => reward(1200, 8, &["diamond_border", "diamond_avatar", "diamond_cardback"]),
        Tier::Master => reward(1600, 12, &["master_border", "master_avatar", "master_cardback"]),
        Tier::Grandmaster => reward(2000, 16, &["gm_border", "gm_avatar", "gm_cardback", "gm_title"]),
        Tier::Mythic => reward(
            2500,
            20,
            &[
                "mythic_border",
                "mythic_avatar",
                "mythic_cardback",
                "mythic_title",
                "mythic_emote",
            ],
        ),
    }
}

fn reward(currency: u32, packs: u32, cosmetics: &[&str]) -> SeasonReward {
    SeasonReward {
        currency,
        packs,
        cosmetics: cosmetics.iter().map(|c| c.to_string()).collect(),
    }
}

/// A competitor's final standing in a closed season.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArchivedRating {
    pub competitor_id: CompetitorId,
    pub mean: f64,
    pub deviation: f64,
    pub conservative_estimate: f64,
    pub tier: Tier,
    pub reward: SeasonReward,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeasonArchive {
    pub season: u32,
    pub starts_at: DateTime<Utc>,
    pub ends_at: DateTime<Utc>,
    pub archived_at: DateTime<Utc>,
    pub analytics: SeasonAnalytics,
    /// Best first.
    pub ratings: Vec<ArchivedRating>,
}

/// Archives `rating` as it stands, then pulls it toward the initial mean
/// and widens its deviation for the new season.
pub fn soft_reset(rating: &mut CompetitorRating, config: &EngineConfig) -> ArchivedRating {
    let tier = rating.tier();
    let archived = ArchivedRating {
        competitor_id: rating.id.clone(),
        mean: rating.mean(),
        deviation: rating.deviation(),
        conservative_estimate: rating.conservative_estimate(),
        tier,
        reward: reward_for(tier),
    };

    let season = &config.season;
    let target = config.rating.initial_mean;
    let mean = rating.mean() + (target - rating.mean()) * season.reset_strength.clamp(0.0, 1.0);
    let deviation = (rating.deviation() + season.deviation_boost).min(config.rating.initial_deviation);
    rating.reset_progress();
    rating.set_belief(Belief::new(mean, deviation), config);
    archived
}

/// Closes `season`: archives and soft-resets every rating, and returns the
/// archive together with the season that follows.
pub fn roll_over<'a, I>(
    season: &SeasonContext,
    ratings: I,
    now: DateTime<Utc>,
    config: &EngineConfig,
) -> (SeasonArchive, SeasonContext)
where
    I: IntoIterator<Item = &'a mut CompetitorRating>,
{
    let mut ratings: Vec<&mut CompetitorRating> = ratings.into_iter().collect();
    ratings.sort_by(|a, b| compare_ratings(a, b));

    let archived: Vec<ArchivedRating> = ratings
        .into_iter()
        .map(|rating| soft_reset(rating, config))
        .collect();

    info!(
        "Season {} closed: {} ratings archived, {} matches, {} upsets",
        season.number,
        archived.len(),
        season.analytics.matches_processed,
        season.analytics.upsets
    );

    let archive = SeasonArchive {
        season: season.number,
        starts_at: season.starts_at,
        ends_at: season.ends_at,
        archived_at: now,
        analytics: season.analytics.clone(),
        ratings: archived,
    };
    (archive, season.next(now, &config.season))
}
