use anyhow::{Result, bail};
use log::info;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::collections::HashMap;

use crate::config::settings::EngineConfig;
use crate::domain::MatchOutcomeEvent;
use crate::pairing::{Pairing, PairingOptions, TournamentFormat};
use crate::rating::probability::normal_cdf;
use crate::rating::{CompetitorId, MatchStage, Outcome};
use crate::services::ranking::RankingService;
use crate::tournament::{RankedCompetitor, StandingRow};

const TOURNAMENT_ID: &str = "simulation";
const SKILL_RANGE: std::ops::Range<f64> = 1000.0..2200.0;

#[derive(Debug, Clone, PartialEq)]
pub struct SimulationSettings {
    pub players: usize,
    pub rounds: u32,
    pub format: TournamentFormat,
    pub seed: u64,
}

#[derive(Debug)]
pub struct SimulationReport {
    pub format: TournamentFormat,
    pub rounds: Vec<Vec<Pairing>>,
    pub table: Vec<StandingRow>,
    pub standings: Vec<RankedCompetitor>,
    /// Hidden skill each simulated player was drawn with.
    pub true_skill: HashMap<CompetitorId, f64>,
}

/// Plays a seeded demo tournament between players of hidden skill.
pub struct SimulationService {
    config: EngineConfig,
    settings: SimulationSettings,
}

impl SimulationService {
    pub fn new(config: EngineConfig, settings: SimulationSettings) -> Result<Self> {
        if settings.players < 2 {
            bail!("A simulation needs at least 2 players, got {}", settings.players);
        }
        config.validate()?;
        Ok(Self { config, settings })
    }

    pub fn run(&self) -> Result<SimulationReport> {
        let settings = &self.settings;
        info!(
            "=== Simulating {} {} players, {} rounds (seed {}) ===",
            settings.format, settings.players, settings.rounds, settings.seed
        );
        let mut rng = ChaCha8Rng::seed_from_u64(settings.seed);
        let mut ranking = RankingService::new(self.config.clone())?;

        let players: Vec<CompetitorId> = (1..=settings.players)
            .map(|n| format!("player_{n:02}"))
            .collect();
        let true_skill: HashMap<CompetitorId, f64> = players
            .iter()
            .map(|id| (id.clone(), rng.gen_range(SKILL_RANGE)))
            .collect();

        ranking.create_tournament(TOURNAMENT_ID, settings.format, &players, None)?;
        let options = PairingOptions {
            seed: settings.seed,
            ..Default::default()
        };

        let mut rounds = Vec::new();
        for round in 1..=settings.rounds {
            let outcome = ranking.generate_pairings(TOURNAMENT_ID, round, &players, &options)?;
            if outcome.pairings.is_empty() {
                info!("  → Nothing left to pair after round {}", round - 1);
                break;
            }
            let matches = outcome.pairings.iter().filter(|p| !p.is_bye()).count();
            for pairing in &outcome.pairings {
                let Some(opponent) = pairing.player2.as_deref() else {
                    continue;
                };
                let event = self.play(&mut rng, &true_skill, pairing, opponent, round, matches);
                ranking.process_match_result(&event)?;
            }
            info!("  → Round {}: {} pairings played", round, outcome.pairings.len());
            rounds.push(outcome.pairings);
        }

        let table = ranking.score_table(TOURNAMENT_ID)?;
        let standings = ranking.get_standings(TOURNAMENT_ID)?;
        ranking.reconcile_tournament(TOURNAMENT_ID)?;

        Ok(SimulationReport {
            format: settings.format,
            rounds,
            table,
            standings,
            true_skill,
        })
    }

    fn play(
        &self,
        rng: &mut ChaCha8Rng,
        true_skill: &HashMap<CompetitorId, f64>,
        pairing: &Pairing,
        opponent: &str,
        round: u32,
        matches_in_round: usize,
    ) -> MatchOutcomeEvent {
        let skill = |id: &str| true_skill.get(id).copied().unwrap_or(self.config.rating.initial_mean);
        let scale = std::f64::consts::SQRT_2 * self.config.rating.beta;
        let win_chance = normal_cdf((skill(&pairing.player1) - skill(opponent)) / scale);

        let elimination = matches!(
            self.settings.format,
            TournamentFormat::SingleElimination | TournamentFormat::DoubleElimination
        );
        let draw_chance = if elimination { 0.0 } else { self.config.rating.draw_probability };

        let result = if rng.gen_bool(draw_chance.clamp(0.0, 1.0)) {
            Outcome::Draw
        } else if rng.gen_bool(win_chance.clamp(0.0, 1.0)) {
            Outcome::Win
        } else {
            Outcome::Loss
        };
        let (games_a, games_b) = match result {
            Outcome::Win => (2, rng.gen_range(0..2)),
            Outcome::Loss => (rng.gen_range(0..2), 2),
            Outcome::Draw => (1, 1),
        };

        let mut event = MatchOutcomeEvent::new(pairing.player1.as_str(), opponent, result)
            .in_tournament(TOURNAMENT_ID, round);
        event.metrics.games_won_a = Some(games_a);
        event.metrics.games_won_b = Some(games_b);
        if elimination {
            event.high_stakes = true;
            event.stage = match matches_in_round {
                1 => MatchStage::Final,
                2 => MatchStage::Semifinal,
                _ => MatchStage::Regular,
            };
        }
        event
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(players: usize, rounds: u32, format: TournamentFormat, seed: u64) -> SimulationReport {
        let settings = SimulationSettings {
            players,
            rounds,
            format,
            seed,
        };
        SimulationService::new(EngineConfig::default(), settings)
            .unwrap()
            .run()
            .unwrap()
    }

    #[test]
    fn test_needs_two_players() {
        let settings = SimulationSettings {
            players: 1,
            rounds: 3,
            format: TournamentFormat::Swiss,
            seed: 1,
        };
        assert!(SimulationService::new(EngineConfig::default(), settings).is_err());
    }

    #[test]
    fn test_swiss_simulation_is_reproducible() {
        let first = run(8, 3, TournamentFormat::Swiss, 7);
        let again = run(8, 3, TournamentFormat::Swiss, 7);

        assert_eq!(first.rounds.len(), 3);
        let line_up = |report: &SimulationReport| -> Vec<Vec<(String, Option<String>)>> {
            report
                .rounds
                .iter()
                .map(|round| round.iter().map(|p| (p.player1.clone(), p.player2.clone())).collect())
                .collect()
        };
        assert_eq!(line_up(&first), line_up(&again));
        assert_eq!(first.table.len(), 8);
        let points: Vec<_> = first.table.iter().map(|row| row.points).collect();
        let points_again: Vec<_> = again.table.iter().map(|row| row.points).collect();
        assert_eq!(points, points_again);
    }

    #[test]
    fn test_single_elimination_stops_at_champion() {
        let report = run(8, 10, TournamentFormat::SingleElimination, 3);
        assert_eq!(report.rounds.len(), 3);
        assert_eq!(report.rounds[2].len(), 1);
    }

    #[test]
    fn test_round_robin_plays_full_schedule() {
        let report = run(5, 20, TournamentFormat::RoundRobin, 11);
        assert_eq!(report.rounds.len(), 5);
        let played: u32 = report.table.iter().map(|row| row.wins + row.losses + row.draws).sum();
        assert_eq!(played, 2 * 10);
    }
}
