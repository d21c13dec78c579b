use serde::{Deserialize, Serialize};

use crate::config::settings::PairingSettings;
use crate::rating::{CompetitorId, Outcome};

// Win percentages used as tiebreakers never drop below one third.
const PERCENTAGE_FLOOR: f64 = 1.0 / 3.0;

/// Points and results one competitor has collected in a tournament.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScoreRecord {
    pub competitor_id: CompetitorId,
    pub points: u32,
    pub wins: u32,
    pub losses: u32,
    pub draws: u32,
    pub byes: u32,
    pub game_wins: u32,
    pub game_losses: u32,
    /// Opponents in the order they were met; byes are not listed.
    pub opponents: Vec<CompetitorId>,
}

impl ScoreRecord {
    pub fn new(competitor_id: &str) -> Self {
        Self {
            competitor_id: competitor_id.to_string(),
            ..Default::default()
        }
    }

    pub fn rounds_played(&self) -> u32 {
        self.wins + self.losses + self.draws + self.byes
    }

    pub fn record_result(
        &mut self,
        opponent: &str,
        outcome: Outcome,
        games: Option<(u32, u32)>,
        settings: &PairingSettings,
    ) {
        match outcome {
            Outcome::Win => {
                self.wins += 1;
                self.points += settings.win_points;
            }
            Outcome::Draw => {
                self.draws += 1;
                self.points += settings.draw_points;
            }
            Outcome::Loss => {
                self.losses += 1;
                self.points += settings.loss_points;
            }
        }
        if let Some((won, lost)) = games {
            self.game_wins += won;
            self.game_losses += lost;
        }
        self.opponents.push(opponent.to_string());
    }

    pub fn record_bye(&mut self, settings: &PairingSettings) {
        self.byes += 1;
        self.points += settings.bye_points;
    }

    pub fn revert_bye(&mut self, settings: &PairingSettings) {
        if self.byes > 0 {
            self.byes -= 1;
            self.points = self.points.saturating_sub(settings.bye_points);
        }
    }

    pub fn match_win_percentage(&self, settings: &PairingSettings) -> f64 {
        let rounds = self.rounds_played();
        if rounds == 0 || settings.win_points == 0 {
            return PERCENTAGE_FLOOR;
        }
        let possible = (rounds * settings.win_points) as f64;
        (self.points as f64 / possible).clamp(PERCENTAGE_FLOOR, 1.0)
    }

    /// Falls back to the match win percentage when no game scores were reported.
    pub fn game_win_percentage(&self, settings: &PairingSettings) -> f64 {
        let games = self.game_wins + self.game_losses;
        if games == 0 {
            return self.match_win_percentage(settings);
        }
        (self.game_wins as f64 / games as f64).max(PERCENTAGE_FLOOR)
    }
}
