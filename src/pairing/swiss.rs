use std::cmp::Ordering;

use log::debug;
use ndarray::Array2;

use super::{Bracket, Pairing, PairingOptions, PairingOutcome, PairingScorer};
use crate::rating::CompetitorId;
use crate::tournament::TournamentContext;

/// Swiss round: pair within point groups by descending match quality.
///
/// Odd groups float their lowest-rated member (lowest conservative estimate,
/// ties to the later id) down into the next group, where the floater is
/// treated as a regular member and may float again. With an odd total the
/// bye is taken out first, so the last group always comes out even.
pub fn pair_round(
    context: &TournamentContext,
    round: u32,
    available: &[CompetitorId],
    options: &PairingOptions,
    scorer: &mut PairingScorer<'_>,
) -> PairingOutcome {
    let avoid_rematches = options
        .avoid_rematches
        .unwrap_or(context.settings.avoid_rematches)
        .clamp(0.0, 1.0);

    let (mut pool, mut unpaired): (Vec<CompetitorId>, Vec<CompetitorId>) =
        available.iter().cloned().partition(|id| context.contains(id));
    if pool.len() < 2 {
        unpaired.extend(pool);
        return PairingOutcome::empty(unpaired);
    }
    pool.sort_by(|a, b| standing_order(context, round, a, b));

    let bye = if pool.len() % 2 == 1 {
        pick_bye(context, round, &pool).map(|index| pool.remove(index))
    } else {
        None
    };

    let mut pairings = Vec::new();
    let mut floaters: Vec<CompetitorId> = Vec::new();
    for group in group_by_points(context, round, &pool) {
        let mut members: Vec<CompetitorId> = floaters.drain(..).chain(group).collect();
        if members.len() % 2 == 1 {
            let floater = bump_lowest_rated(context, &mut members);
            debug!("Round {}: {} floats down a point group", round, floater);
            floaters.push(floater);
        }
        pairings.extend(pair_group(context, round, &members, avoid_rematches, scorer));
    }
    unpaired.extend(floaters);

    if let Some(bye) = bye {
        pairings.push(Pairing::bye(&bye, round, Bracket::Main));
    }
    PairingOutcome { pairings, unpaired }
}

fn standing_order(context: &TournamentContext, round: u32, a: &str, b: &str) -> Ordering {
    context
        .points_before(b, round)
        .cmp(&context.points_before(a, round))
        .then_with(|| rating_order(context, a, b))
}

/// Higher conservative estimate first, then id.
fn rating_order(context: &TournamentContext, a: &str, b: &str) -> Ordering {
    let estimate = |id: &str| {
        context
            .rating(id)
            .map_or(f64::MIN, |rating| rating.conservative_estimate())
    };
    estimate(b).total_cmp(&estimate(a)).then_with(|| a.cmp(b))
}

/// Lowest-point competitor without a bye; if everyone has had one, the lowest overall.
/// A bye already installed for `round` does not count, so regenerating the
/// round keeps it in place.
fn pick_bye(context: &TournamentContext, round: u32, sorted_pool: &[CompetitorId]) -> Option<usize> {
    let from_bottom = (0..sorted_pool.len()).rev();
    from_bottom
        .clone()
        .find(|&index| !context.has_had_bye_before(&sorted_pool[index], round))
        .or_else(|| from_bottom.clone().next())
}

fn group_by_points(
    context: &TournamentContext,
    round: u32,
    sorted_pool: &[CompetitorId],
) -> Vec<Vec<CompetitorId>> {
    let mut groups: Vec<Vec<CompetitorId>> = Vec::new();
    let mut current_points = None;
    for id in sorted_pool {
        let points = context.points_before(id, round);
        if current_points != Some(points) {
            groups.push(Vec::new());
            current_points = Some(points);
        }
        if let Some(group) = groups.last_mut() {
            group.push(id.clone());
        }
    }
    groups
}

fn bump_lowest_rated(context: &TournamentContext, members: &mut Vec<CompetitorId>) -> CompetitorId {
    let lowest = members
        .iter()
        .enumerate()
        .max_by(|(_, a), (_, b)| rating_order(context, a, b))
        .map_or(members.len() - 1, |(index, _)| index);
    members.remove(lowest)
}

fn pair_group(
    context: &TournamentContext,
    round: u32,
    members: &[CompetitorId],
    avoid_rematches: f64,
    scorer: &mut PairingScorer<'_>,
) -> Vec<Pairing> {
    let n = members.len();
    let raw = build_quality_matrix(context, round, members, scorer);

    let mut candidates: Vec<(usize, usize, f64)> = Vec::with_capacity(n * n.saturating_sub(1) / 2);
    for i in 0..n {
        for j in (i + 1)..n {
            let meetings = context.prior_meetings(&members[i], &members[j]) as i32;
            let penalty = (1.0 - avoid_rematches).powi(meetings);
            candidates.push((i, j, raw[[i, j]] * penalty));
        }
    }
    candidates.sort_by(|x, y| {
        y.2.total_cmp(&x.2)
            .then_with(|| x.0.cmp(&y.0))
            .then_with(|| x.1.cmp(&y.1))
    });

    let mut taken = vec![false; n];
    let mut pairings = Vec::with_capacity(n / 2);
    for (i, j, _) in candidates {
        if taken[i] || taken[j] {
            continue;
        }
        taken[i] = true;
        taken[j] = true;
        pairings.push(Pairing::matched(&members[i], &members[j], round, raw[[i, j]], Bracket::Main));
    }
    pairings
}

fn build_quality_matrix(
    context: &TournamentContext,
    round: u32,
    members: &[CompetitorId],
    scorer: &mut PairingScorer<'_>,
) -> Array2<f64> {
    let n = members.len();
    let mut matrix = Array2::<f64>::zeros((n, n));
    for i in 0..n {
        for j in (i + 1)..n {
            let score = scorer.score(context, &members[i], &members[j], round);
            matrix[[i, j]] = score;
            matrix[[j, i]] = score;
        }
    }
    matrix
}
