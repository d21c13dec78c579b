use serde::{Deserialize, Serialize};

use crate::config::settings::EngineConfig;
use crate::rating::{CompetitorRating, Tier};

const HOT_STREAK_LENGTH: u32 = 5;

/// One-shot milestones; once unlocked they stay in the rating's set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Achievement {
    FirstVictory,
    HotStreak,
    GoldenAscension,
    FlawlessPlacement,
}

impl Achievement {
    pub const ALL: [Achievement; 4] = [
        Achievement::FirstVictory,
        Achievement::HotStreak,
        Achievement::GoldenAscension,
        Achievement::FlawlessPlacement,
    ];

    pub fn title(&self) -> &str {
        match self {
            Achievement::FirstVictory => "First Victory",
            Achievement::HotStreak => "Hot Streak",
            Achievement::GoldenAscension => "Golden Ascension",
            Achievement::FlawlessPlacement => "Flawless Victory",
        }
    }

    pub fn currency_reward(&self) -> u32 {
        match self {
            Achievement::FirstVictory => 100,
            Achievement::HotStreak => 250,
            Achievement::GoldenAscension => 500,
            Achievement::FlawlessPlacement => 1000,
        }
    }

    fn is_met(&self, rating: &CompetitorRating, config: &EngineConfig) -> bool {
        match self {
            Achievement::FirstVictory => rating.wins >= 1,
            Achievement::HotStreak => rating.win_streak >= HOT_STREAK_LENGTH,
            Achievement::GoldenAscension => rating.tier() >= Tier::Gold,
            Achievement::FlawlessPlacement => {
                let required = config.rating.placement_matches;
                required > 0 && rating.placement_wins >= required
            }
        }
    }
}

/// Unlocks every newly met achievement and returns just those.
pub fn unlock_new(rating: &mut CompetitorRating, config: &EngineConfig) -> Vec<Achievement> {
    let unlocked: Vec<Achievement> = Achievement::ALL
        .iter()
        .copied()
        .filter(|achievement| !rating.achievements.contains(achievement))
        .filter(|achievement| achievement.is_met(rating, config))
        .collect();

    rating.achievements.extend(unlocked.iter().copied());
    unlocked
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rating::Belief;

    #[test]
    fn test_achievements_unlock_once() {
        let config = EngineConfig::default();
        let mut rating = CompetitorRating::new("alice", &config);
        rating.wins = 1;

        assert_eq!(unlock_new(&mut rating, &config), vec![Achievement::FirstVictory]);
        assert!(unlock_new(&mut rating, &config).is_empty());
    }

    #[test]
    fn test_gold_and_streak_unlock_together() {
        let config = EngineConfig::default();
        let mut rating = CompetitorRating::with_belief("bob", Belief::new(1900.0, 50.0), &config);
        rating.wins = 5;
        rating.win_streak = 5;

        let unlocked = unlock_new(&mut rating, &config);
        assert_eq!(
            unlocked,
            vec![
                Achievement::FirstVictory,
                Achievement::HotStreak,
                Achievement::GoldenAscension
            ]
        );
    }
}
