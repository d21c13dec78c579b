use std::collections::{HashMap, HashSet};

use log::debug;

use super::seeding::{bracket_order, seed_order};
use super::{Bracket, Pairing, PairingOptions, PairingOutcome, PairingScorer};
use crate::pairing::TournamentFormat;
use crate::rating::CompetitorId;
use crate::tournament::{Round, TournamentContext};

/// Single or double elimination, depending on `context.format`.
///
/// The first round (no earlier round installed) is seeded into a bracket of
/// the next power of two; missing slots become byes for the top seeds.
/// Later rounds pair adjacent winners in table order. Double elimination
/// also runs a losers bracket (surviving losers-bracket winners first, then
/// the latest winners-bracket losers) and a grand final once each bracket
/// is down to one competitor.
pub fn pair_round(
    context: &TournamentContext,
    round: u32,
    available: &[CompetitorId],
    options: &PairingOptions,
    scorer: &mut PairingScorer<'_>,
) -> PairingOutcome {
    let (pool, unpaired): (Vec<CompetitorId>, Vec<CompetitorId>) =
        available.iter().cloned().partition(|id| context.contains(id));

    let previous = context
        .rounds()
        .iter()
        .rev()
        .find(|candidate| candidate.number < round);

    let mut outcome = match previous {
        None => seeded_round(context, round, &pool, options, scorer),
        Some(previous) => progression_round(context, round, previous, &pool, scorer),
    };
    outcome.unpaired.extend(unpaired);
    outcome
}

fn main_bracket(format: TournamentFormat) -> Bracket {
    match format {
        TournamentFormat::DoubleElimination => Bracket::Winners,
        _ => Bracket::Main,
    }
}

fn seeded_round(
    context: &TournamentContext,
    round: u32,
    pool: &[CompetitorId],
    options: &PairingOptions,
    scorer: &mut PairingScorer<'_>,
) -> PairingOutcome {
    if pool.len() < 2 {
        return PairingOutcome::empty(pool.to_vec());
    }
    let method = options.seeding.unwrap_or(context.settings.seeding);
    let seeds = seed_order(
        context,
        pool,
        method,
        context.settings.hybrid_skill_weight,
        options.seed,
    );
    let field = seeds.len();
    let size = field.next_power_of_two();
    let bracket = main_bracket(context.format);
    debug!(
        "Tournament {}: seeding {} competitors into a bracket of {}",
        context.id, field, size
    );

    let mut matches = Vec::new();
    let mut byes = Vec::new();
    for slots in bracket_order(size).chunks(2) {
        let [top, bottom] = slots else {
            continue;
        };
        let favourite = &seeds[top - 1];
        if *bottom > field {
            byes.push(Pairing::bye(favourite, round, bracket));
        } else {
            let underdog = &seeds[bottom - 1];
            let quality = scorer.score(context, favourite, underdog, round);
            matches.push(Pairing::matched(favourite, underdog, round, quality, bracket));
        }
    }
    matches.extend(byes);
    PairingOutcome {
        pairings: matches,
        unpaired: Vec::new(),
    }
}

/// Losses each competitor has taken in completed pairings so far.
fn losses(context: &TournamentContext) -> HashMap<&str, u32> {
    let mut losses = HashMap::new();
    for round in context.rounds() {
        for pairing in &round.pairings {
            if let Some(loser) = pairing.loser() {
                *losses.entry(loser).or_insert(0) += 1;
            }
        }
    }
    losses
}

fn progression_round(
    context: &TournamentContext,
    round: u32,
    previous: &Round,
    pool: &[CompetitorId],
    scorer: &mut PairingScorer<'_>,
) -> PairingOutcome {
    let double = context.format == TournamentFormat::DoubleElimination;
    if previous.pairings.iter().any(|p| p.bracket == Bracket::GrandFinal) {
        debug!("Tournament {}: grand final played, bracket complete", context.id);
        return PairingOutcome::default();
    }

    let available: HashSet<&str> = pool.iter().map(String::as_str).collect();
    let mut unpaired: Vec<CompetitorId> = Vec::new();
    let mut winners_side: Vec<CompetitorId> = Vec::new();
    let mut losers_side: Vec<CompetitorId> = Vec::new();
    let mut dropped: Vec<CompetitorId> = Vec::new();
    let mut seen: HashSet<&str> = HashSet::new();

    let mut pairings: Vec<&Pairing> = previous.pairings.iter().collect();
    pairings.sort_by_key(|pairing| pairing.table);
    for pairing in pairings {
        seen.extend(pairing.competitors());
        let Some(winner) = pairing.winner() else {
            unpaired.extend(
                pairing
                    .competitors()
                    .filter(|id| available.contains(id))
                    .map(str::to_string),
            );
            continue;
        };
        match pairing.bracket {
            Bracket::Losers => losers_side.push(winner.to_string()),
            _ => {
                winners_side.push(winner.to_string());
                if let (true, Some(loser)) = (double, pairing.loser()) {
                    dropped.push(loser.to_string());
                }
            }
        }
    }
    losers_side.extend(dropped);

    // Competitors who sat the previous round out stay in their bracket.
    let losses = losses(context);
    for id in context.roster() {
        if seen.contains(id.as_str()) {
            continue;
        }
        match losses.get(id.as_str()).copied().unwrap_or(0) {
            0 => winners_side.push(id.clone()),
            1 if double => losers_side.push(id.clone()),
            _ => {}
        }
    }

    winners_side.retain(|id| available.contains(id.as_str()));
    losers_side.retain(|id| available.contains(id.as_str()));

    let mut outcome = PairingOutcome {
        pairings: Vec::new(),
        unpaired,
    };
    if double && winners_side.len() == 1 && losers_side.len() == 1 {
        let (champion, challenger) = (&winners_side[0], &losers_side[0]);
        let quality = scorer.score(context, champion, challenger, round);
        outcome
            .pairings
            .push(Pairing::matched(champion, challenger, round, quality, Bracket::GrandFinal));
        return outcome;
    }

    let mut byes = Vec::new();
    if winners_side.len() >= 2 {
        pair_adjacent(
            context,
            round,
            &winners_side,
            main_bracket(context.format),
            scorer,
            &mut outcome.pairings,
            &mut byes,
        );
    }
    if double && losers_side.len() >= 2 {
        pair_adjacent(
            context,
            round,
            &losers_side,
            Bracket::Losers,
            scorer,
            &mut outcome.pairings,
            &mut byes,
        );
    }
    outcome.pairings.extend(byes);
    outcome
}

fn pair_adjacent(
    context: &TournamentContext,
    round: u32,
    competitors: &[CompetitorId],
    bracket: Bracket,
    scorer: &mut PairingScorer<'_>,
    pairings: &mut Vec<Pairing>,
    byes: &mut Vec<Pairing>,
) {
    for chunk in competitors.chunks(2) {
        match chunk {
            [a, b] => {
                let quality = scorer.score(context, a, b, round);
                pairings.push(Pairing::matched(a, b, round, quality, bracket));
            }
            [odd] => byes.push(Pairing::bye(odd, round, bracket)),
            _ => {}
        }
    }
}
