use std::collections::HashSet;

use arena_rating::config::EngineConfig;
use arena_rating::domain::MatchOutcomeEvent;
use arena_rating::errors::EngineError;
use arena_rating::pairing::{PairingOptions, TournamentFormat};
use arena_rating::rating::{CompetitorId, Outcome};
use arena_rating::services::RankingService;

fn entrants(count: usize) -> Vec<CompetitorId> {
    (1..=count).map(|n| format!("p{n}")).collect()
}

// The lower-numbered player always wins.
fn play_round(service: &mut RankingService, tournament: &str, round: u32, players: &[CompetitorId]) -> usize {
    let outcome = service
        .generate_pairings(tournament, round, players, &PairingOptions::default())
        .unwrap();

    let mut seen = HashSet::new();
    for pairing in &outcome.pairings {
        for competitor in pairing.competitors() {
            assert!(seen.insert(competitor.to_string()), "{competitor} double booked in round {round}");
        }
    }
    assert!(outcome.unpaired.is_empty());

    let mut played = 0;
    for pairing in &outcome.pairings {
        let Some(opponent) = pairing.player2.as_deref() else {
            continue;
        };
        let number = |id: &str| id[1..].parse::<u32>().unwrap();
        let result = if number(&pairing.player1) < number(opponent) {
            Outcome::Win
        } else {
            Outcome::Loss
        };
        let event = MatchOutcomeEvent::new(pairing.player1.as_str(), opponent, result).in_tournament(tournament, round);
        service.process_match_result(&event).unwrap();
        played += 1;
    }
    played
}

#[test]
fn test_swiss_tournament_runs_end_to_end() {
    let mut service = RankingService::new(EngineConfig::default()).unwrap();
    let players = entrants(6);
    service
        .create_tournament("open", TournamentFormat::Swiss, &players, None)
        .unwrap();

    let played: usize = (1..=3).map(|round| play_round(&mut service, "open", round, &players)).sum();
    assert_eq!(played, 9);

    let table = service.score_table("open").unwrap();
    assert_eq!(table.len(), 6);
    assert_eq!(table.iter().map(|row| row.points).sum::<u32>(), 27);
    assert_eq!(table[0].competitor_id, "p1");
    assert_eq!(table[0].wins, 3);

    let standings = service.get_standings("open").unwrap();
    assert_eq!(standings.len(), 6);
    assert_eq!(standings[0].rating.id, "p1");
    assert!(standings.windows(2).all(|pair| pair[0].rank < pair[1].rank));

    // Ladder ratings stay untouched until the tournament is closed.
    assert_eq!(service.rating("p1").unwrap().matches_played, 0);
    service.reconcile_tournament("open").unwrap();
    for player in &players {
        assert_eq!(service.rating(player).unwrap().matches_played, 3);
    }
    assert!(service.rating("p1").unwrap().mean() > service.rating("p6").unwrap().mean());
    assert!(service.tournament("open").is_err());
}

#[test]
fn test_odd_round_robin_gives_each_player_one_bye() {
    let mut service = RankingService::new(EngineConfig::default()).unwrap();
    let players = entrants(5);
    service
        .create_tournament("league", TournamentFormat::RoundRobin, &players, None)
        .unwrap();

    let played: usize = (1..=5).map(|round| play_round(&mut service, "league", round, &players)).sum();
    assert_eq!(played, 10);

    let table = service.score_table("league").unwrap();
    assert!(table.iter().all(|row| row.byes == 1));
    assert!(table.iter().all(|row| row.wins + row.losses == 4));
}

#[test]
fn test_pairing_a_lone_competitor_is_rejected() {
    let mut service = RankingService::new(EngineConfig::default()).unwrap();
    let players = entrants(4);
    service
        .create_tournament("cup", TournamentFormat::SingleElimination, &players, None)
        .unwrap();

    let err = service
        .generate_pairings("cup", 1, &players[..1], &PairingOptions::default())
        .unwrap_err();
    assert!(matches!(err, EngineError::InsufficientCompetitors { available: 1, .. }));

    let stranger = vec!["ghost".to_string(), "p1".to_string()];
    let err = service
        .generate_pairings("cup", 1, &stranger, &PairingOptions::default())
        .unwrap_err();
    assert!(matches!(err, EngineError::UnknownCompetitor { .. }));
}

#[test]
fn test_ladder_quality_is_cached_until_a_result_lands() {
    let mut service = RankingService::new(EngineConfig::default()).unwrap();
    service.register("a");
    service.register("b");

    let first = service.get_match_quality("a", "b", None).unwrap();
    assert!(first.score > 0.0 && first.score <= 1.0);
    assert!((first.win_probability - 0.5).abs() < 1e-9);
    assert_eq!(service.cache().len(), 1);

    service
        .process_match_result(&MatchOutcomeEvent::new("a", "b", Outcome::Win))
        .unwrap();
    assert!(service.cache().is_empty());
    let after = service.get_match_quality("a", "b", None).unwrap();
    assert!(after.win_probability > 0.5);
}
