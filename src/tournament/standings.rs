use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use super::context::TournamentContext;
use crate::rating::{CompetitorId, CompetitorRating};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedCompetitor {
    pub rank: usize,
    pub rating: CompetitorRating,
}

/// Orders by conservative estimate, then mean, then matches played.
pub fn compare_ratings(a: &CompetitorRating, b: &CompetitorRating) -> Ordering {
    b.conservative_estimate()
        .total_cmp(&a.conservative_estimate())
        .then_with(|| b.mean().total_cmp(&a.mean()))
        .then_with(|| b.matches_played.cmp(&a.matches_played))
        .then_with(|| a.id.cmp(&b.id))
}

pub fn rank_ratings<'a, I>(ratings: I) -> Vec<RankedCompetitor>
where
    I: IntoIterator<Item = &'a CompetitorRating>,
{
    let mut sorted: Vec<&CompetitorRating> = ratings.into_iter().collect();
    sorted.sort_by(|a, b| compare_ratings(a, b));
    sorted
        .into_iter()
        .enumerate()
        .map(|(index, rating)| RankedCompetitor {
            rank: index + 1,
            rating: rating.clone(),
        })
        .collect()
}

/// Point-table row with the usual tiebreakers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StandingRow {
    pub rank: usize,
    pub competitor_id: CompetitorId,
    pub points: u32,
    pub wins: u32,
    pub losses: u32,
    pub draws: u32,
    pub byes: u32,
    pub opponent_match_win: f64,
    pub game_win: f64,
    pub opponent_game_win: f64,
    pub conservative_estimate: f64,
}

pub fn score_table(context: &TournamentContext) -> Vec<StandingRow> {
    let settings = &context.settings;
    let mut rows: Vec<StandingRow> = context
        .records()
        .map(|record| {
            let opponents: Vec<_> = record
                .opponents
                .iter()
                .filter_map(|opponent| context.record(opponent))
                .collect();
            let average = |values: Vec<f64>| {
                if values.is_empty() {
                    0.0
                } else {
                    values.iter().sum::<f64>() / values.len() as f64
                }
            };

            StandingRow {
                rank: 0,
                competitor_id: record.competitor_id.clone(),
                points: record.points,
                wins: record.wins,
                losses: record.losses,
                draws: record.draws,
                byes: record.byes,
                opponent_match_win: average(
                    opponents.iter().map(|o| o.match_win_percentage(settings)).collect(),
                ),
                game_win: record.game_win_percentage(settings),
                opponent_game_win: average(
                    opponents.iter().map(|o| o.game_win_percentage(settings)).collect(),
                ),
                conservative_estimate: context
                    .rating(&record.competitor_id)
                    .map_or(f64::MIN, |rating| rating.conservative_estimate()),
            }
        })
        .collect();

    rows.sort_by(|a, b| {
        b.points
            .cmp(&a.points)
            .then_with(|| b.opponent_match_win.total_cmp(&a.opponent_match_win))
            .then_with(|| b.game_win.total_cmp(&a.game_win))
            .then_with(|| b.opponent_game_win.total_cmp(&a.opponent_game_win))
            .then_with(|| b.conservative_estimate.total_cmp(&a.conservative_estimate))
            .then_with(|| a.competitor_id.cmp(&b.competitor_id))
    });
    for (index, row) in rows.iter_mut().enumerate() {
        row.rank = index + 1;
    }
    rows
}
