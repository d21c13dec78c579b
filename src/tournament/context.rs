use std::collections::HashMap;

use log::info;

use super::records::ScoreRecord;
use crate::config::settings::PairingSettings;
use crate::errors::{EngineError, EngineResult};
use crate::pairing::{Pairing, PairingStatus, TournamentFormat};
use crate::rating::{Belief, CompetitorId, CompetitorRating, MatchRecord, Outcome};

#[derive(Debug, Clone, PartialEq)]
pub struct Round {
    pub number: u32,
    pub pairings: Vec<Pairing>,
}

impl Round {
    pub fn is_finished(&self) -> bool {
        self.pairings
            .iter()
            .all(|pairing| pairing.status != PairingStatus::Pending)
    }

    fn has_results(&self) -> bool {
        self.pairings
            .iter()
            .any(|pairing| matches!(pairing.status, PairingStatus::Completed { .. }))
    }
}

/// Isolated rating copies, standings and round history for one tournament.
///
/// Ratings are copied in at creation; nothing here touches the global
/// ratings until the owner reconciles.
#[derive(Debug, Clone)]
pub struct TournamentContext {
    pub id: String,
    pub format: TournamentFormat,
    pub settings: PairingSettings,
    roster: Vec<CompetitorId>,
    ratings: HashMap<CompetitorId, CompetitorRating>,
    seeded: HashMap<CompetitorId, Belief>,
    archetypes: HashMap<CompetitorId, String>,
    records: HashMap<CompetitorId, ScoreRecord>,
    rounds: Vec<Round>,
}

impl TournamentContext {
    pub fn new(
        id: &str,
        format: TournamentFormat,
        entrants: Vec<CompetitorRating>,
        settings: PairingSettings,
    ) -> EngineResult<Self> {
        let mut roster = Vec::new();
        let mut ratings = HashMap::new();
        for rating in entrants {
            if !ratings.contains_key(&rating.id) {
                roster.push(rating.id.clone());
                ratings.insert(rating.id.clone(), rating);
            }
        }
        if roster.len() < 2 {
            return Err(EngineError::InsufficientCompetitors {
                tournament_id: id.to_string(),
                round: None,
                available: roster.len(),
            });
        }

        let seeded = ratings
            .iter()
            .map(|(competitor, rating)| (competitor.clone(), rating.belief()))
            .collect();
        let records = roster
            .iter()
            .map(|competitor| (competitor.clone(), ScoreRecord::new(competitor)))
            .collect();

        info!("Tournament {} ({}) created with {} competitors", id, format, roster.len());
        Ok(Self {
            id: id.to_string(),
            format,
            settings,
            roster,
            ratings,
            seeded,
            archetypes: HashMap::new(),
            records,
            rounds: Vec::new(),
        })
    }

    /// Competitors in registration order.
    pub fn roster(&self) -> &[CompetitorId] {
        &self.roster
    }

    pub fn contains(&self, competitor: &str) -> bool {
        self.ratings.contains_key(competitor)
    }

    pub fn rating(&self, competitor: &str) -> EngineResult<&CompetitorRating> {
        self.ratings
            .get(competitor)
            .ok_or_else(|| EngineError::unknown_in(competitor, &self.id))
    }

    pub fn rating_mut(&mut self, competitor: &str) -> EngineResult<&mut CompetitorRating> {
        let id = &self.id;
        self.ratings
            .get_mut(competitor)
            .ok_or_else(|| EngineError::unknown_in(competitor, id))
    }

    pub fn ratings(&self) -> impl Iterator<Item = &CompetitorRating> {
        self.roster.iter().filter_map(|id| self.ratings.get(id))
    }

    pub fn seeded_belief(&self, competitor: &str) -> Option<Belief> {
        self.seeded.get(competitor).copied()
    }

    /// Matches this tournament added to `competitor`'s history.
    pub fn tournament_history(&self, competitor: &str) -> Vec<MatchRecord> {
        self.ratings
            .get(competitor)
            .map(|rating| {
                rating
                    .match_history
                    .iter()
                    .filter(|record| record.tournament_id.as_deref() == Some(self.id.as_str()))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn declare_archetype(&mut self, competitor: &str, archetype: &str) -> EngineResult<()> {
        if !self.contains(competitor) {
            return Err(EngineError::unknown_in(competitor, &self.id));
        }
        self.archetypes
            .insert(competitor.to_string(), archetype.to_string());
        Ok(())
    }

    pub fn declared_archetype(&self, competitor: &str) -> Option<&str> {
        self.archetypes.get(competitor).map(String::as_str)
    }

    pub fn record(&self, competitor: &str) -> Option<&ScoreRecord> {
        self.records.get(competitor)
    }

    pub fn records(&self) -> impl Iterator<Item = &ScoreRecord> {
        self.roster.iter().filter_map(|id| self.records.get(id))
    }

    pub fn points(&self, competitor: &str) -> u32 {
        self.records.get(competitor).map_or(0, |record| record.points)
    }

    pub fn prior_meetings(&self, a: &str, b: &str) -> usize {
        self.records.get(a).map_or(0, |record| {
            record.opponents.iter().filter(|opponent| *opponent == b).count()
        })
    }

    pub fn has_had_bye(&self, competitor: &str) -> bool {
        self.records
            .get(competitor)
            .is_some_and(|record| record.byes > 0)
    }

    fn has_installed_bye(&self, competitor: &str, round: u32) -> bool {
        self.round(round).is_some_and(|installed| {
            installed
                .pairings
                .iter()
                .any(|pairing| pairing.is_bye() && pairing.player1 == competitor)
        })
    }

    /// Points going into `round`, leaving out a bye already installed for it.
    pub fn points_before(&self, competitor: &str, round: u32) -> u32 {
        let points = self.points(competitor);
        if self.has_installed_bye(competitor, round) {
            points.saturating_sub(self.settings.bye_points)
        } else {
            points
        }
    }

    /// Whether a bye was received in any round other than `round`.
    pub fn has_had_bye_before(&self, competitor: &str, round: u32) -> bool {
        let own = u32::from(self.has_installed_bye(competitor, round));
        self.records
            .get(competitor)
            .is_some_and(|record| record.byes > own)
    }

    pub fn rounds(&self) -> &[Round] {
        &self.rounds
    }

    pub fn round(&self, number: u32) -> Option<&Round> {
        self.rounds.iter().find(|round| round.number == number)
    }

    /// Stores a generated round and credits its byes. A round that has no
    /// results yet may be regenerated; its byes are reverted first.
    pub fn install_round(&mut self, number: u32, pairings: Vec<Pairing>) -> EngineResult<()> {
        if let Some(position) = self.rounds.iter().position(|round| round.number == number) {
            if self.rounds[position].has_results() {
                return Err(EngineError::invalid_config(format!(
                    "tournament {} round {} already has results",
                    self.id, number
                )));
            }
            let replaced = self.rounds.remove(position);
            for pairing in replaced.pairings.iter().filter(|p| p.is_bye()) {
                if let Some(record) = self.records.get_mut(&pairing.player1) {
                    record.revert_bye(&self.settings);
                }
            }
        }

        for pairing in pairings.iter().filter(|p| p.is_bye()) {
            if let Some(record) = self.records.get_mut(&pairing.player1) {
                record.record_bye(&self.settings);
            }
        }
        self.rounds.push(Round { number, pairings });
        self.rounds.sort_by_key(|round| round.number);
        Ok(())
    }

    /// Updates standings for a played match and closes its pairing.
    /// `outcome` is from `a`'s side.
    pub fn record_result(
        &mut self,
        a: &str,
        b: &str,
        outcome: Outcome,
        games: Option<(u32, u32)>,
        round: Option<u32>,
    ) -> EngineResult<()> {
        for competitor in [a, b] {
            if !self.records.contains_key(competitor) {
                return Err(EngineError::unknown_in(competitor, &self.id));
            }
        }

        let settings = self.settings.clone();
        if let Some(record) = self.records.get_mut(a) {
            record.record_result(b, outcome, games, &settings);
        }
        if let Some(record) = self.records.get_mut(b) {
            let reversed_games = games.map(|(won, lost)| (lost, won));
            record.record_result(a, outcome.reversed(), reversed_games, &settings);
        }

        let winner = match outcome {
            Outcome::Win => Some(a.to_string()),
            Outcome::Loss => Some(b.to_string()),
            Outcome::Draw => None,
        };
        self.close_pairing(a, b, round, winner);
        Ok(())
    }

    fn close_pairing(&mut self, a: &str, b: &str, round: Option<u32>, winner: Option<CompetitorId>) {
        let target = match round {
            Some(number) => self.rounds.iter_mut().find(|r| r.number == number),
            None => self.rounds.last_mut(),
        };
        let Some(target) = target else {
            return;
        };
        if let Some(pairing) = target.pairings.iter_mut().find(|pairing| {
            pairing.status == PairingStatus::Pending && pairing.involves(a) && pairing.involves(b)
        }) {
            pairing.status = PairingStatus::Completed { winner };
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::settings::EngineConfig;
    use crate::pairing::Bracket;

    fn context(ids: &[&str]) -> EngineResult<TournamentContext> {
        let config = EngineConfig::default();
        let entrants = ids
            .iter()
            .map(|id| CompetitorRating::new(*id, &config))
            .collect();
        TournamentContext::new("cup", TournamentFormat::Swiss, entrants, PairingSettings::default())
    }

    #[test]
    fn test_needs_two_distinct_competitors() {
        let err = context(&["a", "a"]).unwrap_err();
        assert!(matches!(err, EngineError::InsufficientCompetitors { available: 1, .. }));
        assert_eq!(context(&["a", "b", "a"]).unwrap().roster().len(), 2);
    }

    #[test]
    fn test_results_update_both_records_and_close_pairing() {
        let mut ctx = context(&["a", "b", "c"]).unwrap();
        ctx.install_round(
            1,
            vec![
                Pairing::matched("a", "b", 1, 0.9, Bracket::Main),
                Pairing::bye("c", 1, Bracket::Main),
            ],
        )
        .unwrap();
        assert_eq!(ctx.points("c"), 3);
        assert!(ctx.has_had_bye("c"));

        ctx.record_result("a", "b", Outcome::Loss, Some((1, 2)), Some(1)).unwrap();

        assert_eq!(ctx.points("b"), 3);
        assert_eq!(ctx.points("a"), 0);
        assert_eq!(ctx.prior_meetings("a", "b"), 1);
        assert_eq!(ctx.record("b").unwrap().game_wins, 2);
        assert!(ctx.round(1).unwrap().is_finished());
        assert_eq!(ctx.round(1).unwrap().pairings[0].winner(), Some("b"));
    }

    #[test]
    fn test_pending_round_can_be_regenerated_without_double_byes() {
        let mut ctx = context(&["a", "b", "c"]).unwrap();
        ctx.install_round(1, vec![Pairing::bye("c", 1, Bracket::Main)]).unwrap();
        ctx.install_round(1, vec![Pairing::bye("a", 1, Bracket::Main)]).unwrap();

        assert_eq!(ctx.points("c"), 0);
        assert_eq!(ctx.points("a"), 3);
        assert_eq!(ctx.rounds().len(), 1);
    }

    #[test]
    fn test_standing_before_a_round_ignores_its_own_bye() {
        let mut ctx = context(&["a", "b", "c"]).unwrap();
        ctx.install_round(1, vec![Pairing::bye("c", 1, Bracket::Main)]).unwrap();

        assert_eq!(ctx.points_before("c", 1), 0);
        assert!(!ctx.has_had_bye_before("c", 1));
        assert_eq!(ctx.points_before("c", 2), 3);
        assert!(ctx.has_had_bye_before("c", 2));
    }

    #[test]
    fn test_round_with_results_cannot_be_replaced() {
        let mut ctx = context(&["a", "b"]).unwrap();
        ctx.install_round(1, vec![Pairing::matched("a", "b", 1, 0.5, Bracket::Main)]).unwrap();
        ctx.record_result("a", "b", Outcome::Win, None, Some(1)).unwrap();
        assert!(ctx.install_round(1, Vec::new()).is_err());
    }

    #[test]
    fn test_unknown_competitor_carries_tournament() {
        let ctx = context(&["a", "b"]).unwrap();
        assert_eq!(
            ctx.rating("zed").unwrap_err(),
            EngineError::unknown_in("zed", "cup")
        );
    }
}
