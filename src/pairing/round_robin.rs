use std::collections::HashSet;

use super::{Bracket, Pairing, PairingOutcome, PairingScorer};
use crate::rating::CompetitorId;
use crate::tournament::TournamentContext;

/// Rounds needed for everyone to meet once.
pub fn total_rounds(competitors: usize) -> u32 {
    match competitors {
        0 | 1 => 0,
        n if n % 2 == 0 => (n - 1) as u32,
        n => n as u32,
    }
}

/// Circle method over the tournament roster.
///
/// The first registered competitor stays fixed while the rest rotate one
/// seat per round. An odd roster gets an empty seat; whoever faces it has
/// the bye. The schedule depends only on the roster and the round number,
/// so any round can be generated independently.
pub fn pair_round(
    context: &TournamentContext,
    round: u32,
    available: &[CompetitorId],
    scorer: &mut PairingScorer<'_>,
) -> PairingOutcome {
    let roster = context.roster();
    let rounds = total_rounds(roster.len());
    let mut unpaired: Vec<CompetitorId> = available
        .iter()
        .filter(|id| !context.contains(id))
        .cloned()
        .collect();
    if round == 0 || round > rounds {
        return PairingOutcome::empty(unpaired);
    }

    let available: HashSet<&str> = available.iter().map(String::as_str).collect();
    let mut pairings = Vec::new();
    let mut byes = Vec::new();
    for (home, away) in schedule(roster, round) {
        match (home, away) {
            (Some(a), Some(b)) => match (available.contains(a.as_str()), available.contains(b.as_str())) {
                (true, true) => {
                    let quality = scorer.score(context, a, b, round);
                    pairings.push(Pairing::matched(a, b, round, quality, Bracket::Main));
                }
                (true, false) => unpaired.push(a.clone()),
                (false, true) => unpaired.push(b.clone()),
                (false, false) => {}
            },
            (Some(solo), None) | (None, Some(solo)) if available.contains(solo.as_str()) => {
                byes.push(Pairing::bye(solo, round, Bracket::Main));
            }
            _ => {}
        }
    }
    pairings.extend(byes);
    PairingOutcome { pairings, unpaired }
}

type Seat<'a> = Option<&'a CompetitorId>;

fn schedule(roster: &[CompetitorId], round: u32) -> Vec<(Seat<'_>, Seat<'_>)> {
    let mut seats: Vec<Seat<'_>> = roster.iter().map(Some).collect();
    if seats.len() % 2 == 1 {
        seats.push(None);
    }
    let size = seats.len();
    if size < 2 {
        return Vec::new();
    }

    let fixed = seats[0];
    let mut ring: Vec<Seat<'_>> = seats[1..].to_vec();
    let turns = (round as usize - 1) % ring.len();
    ring.rotate_right(turns);

    let mut table = Vec::with_capacity(size / 2);
    table.push((fixed, ring[0]));
    for i in 1..size / 2 {
        table.push((ring[i], ring[size - 1 - i]));
    }
    table
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::settings::{EngineConfig, PairingSettings};
    use crate::matchmaking::{ArchetypeMatrix, MatchQualityScorer, QualityCache};
    use crate::pairing::TournamentFormat;
    use crate::rating::CompetitorRating;
    use chrono::Utc;
    use std::collections::{BTreeSet, HashMap};

    fn league(size: usize) -> TournamentContext {
        let config = EngineConfig::default();
        let ratings = (0..size)
            .map(|i| CompetitorRating::new(format!("p{i}"), &config))
            .collect();
        TournamentContext::new("league", TournamentFormat::RoundRobin, ratings, PairingSettings::default())
            .unwrap()
    }

    fn pair(context: &TournamentContext, round: u32, available: &[CompetitorId]) -> PairingOutcome {
        let config = EngineConfig::default();
        let matrix = ArchetypeMatrix::default();
        let quality = MatchQualityScorer::new(&config, &matrix).unwrap();
        let mut cache = QualityCache::new();
        let preferences = HashMap::new();
        let mut scorer = PairingScorer::new(&quality, &mut cache, &preferences, Utc::now());
        pair_round(context, round, available, &mut scorer)
    }

    #[test]
    fn test_total_rounds() {
        assert_eq!(total_rounds(1), 0);
        assert_eq!(total_rounds(4), 3);
        assert_eq!(total_rounds(5), 5);
    }

    #[test]
    fn test_odd_league_gives_one_bye_per_round() {
        let ctx = league(5);
        let everyone = ctx.roster().to_vec();
        let mut bye_holders = BTreeSet::new();
        for round in 1..=5 {
            let outcome = pair(&ctx, round, &everyone);
            assert_eq!(outcome.pairings.len(), 3);
            let byes: Vec<_> = outcome.pairings.iter().filter(|p| p.is_bye()).collect();
            assert_eq!(byes.len(), 1);
            assert!(outcome.pairings.last().unwrap().is_bye());
            bye_holders.insert(byes[0].player1.clone());
        }
        assert_eq!(bye_holders.len(), 5);
    }

    #[test]
    fn test_rounds_past_the_schedule_are_empty() {
        let ctx = league(4);
        let everyone = ctx.roster().to_vec();
        assert!(pair(&ctx, 4, &everyone).pairings.is_empty());
        assert!(pair(&ctx, 0, &everyone).pairings.is_empty());
    }

    #[test]
    fn test_absent_opponent_leaves_partner_unpaired() {
        let ctx = league(4);
        let present: Vec<CompetitorId> = ctx.roster()[..3].to_vec();
        let outcome = pair(&ctx, 1, &present);
        assert_eq!(outcome.pairings.len(), 1);
        assert_eq!(outcome.unpaired.len(), 1);
        assert!(!outcome.pairings[0].involves("p3"));
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn prop_every_pair_meets_exactly_once(size in 2usize..13) {
                let ctx = league(size);
                let everyone = ctx.roster().to_vec();
                let mut meetings: HashMap<(String, String), u32> = HashMap::new();

                for round in 1..=total_rounds(size) {
                    let outcome = pair(&ctx, round, &everyone);
                    prop_assert_eq!(outcome.pairings.len(), size.div_ceil(2));
                    prop_assert!(outcome.unpaired.is_empty());
                    for pairing in outcome.pairings.iter().filter(|p| !p.is_bye()) {
                        let mut key = [pairing.player1.clone(), pairing.player2.clone().unwrap()];
                        key.sort();
                        let [a, b] = key;
                        *meetings.entry((a, b)).or_insert(0) += 1;
                    }
                }

                prop_assert_eq!(meetings.len(), size * (size - 1) / 2);
                prop_assert!(meetings.values().all(|count| *count == 1));
            }
        }
    }
}
