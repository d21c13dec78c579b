use std::cmp::Ordering;

use rand::SeedableRng;
use rand::seq::SliceRandom;
use rand_chacha::ChaCha8Rng;

use crate::config::settings::SeedingMethod;
use crate::rating::CompetitorId;
use crate::tournament::TournamentContext;

/// Orders `competitors` strongest seed first.
///
/// Skill uses the belief each competitor entered the tournament with.
/// Performance uses tournament points. Hybrid blends the two after
/// normalising each to [0, 1] across the field. Random is a ChaCha shuffle
/// of the id-sorted field, so the same `seed` always gives the same bracket.
pub fn seed_order(
    context: &TournamentContext,
    competitors: &[CompetitorId],
    method: SeedingMethod,
    hybrid_skill_weight: f64,
    seed: u64,
) -> Vec<CompetitorId> {
    let mut ordered: Vec<CompetitorId> = competitors.to_vec();
    ordered.sort();

    match method {
        SeedingMethod::Skill => {
            ordered.sort_by(|a, b| by_score_desc(skill(context, a), skill(context, b), a, b));
        }
        SeedingMethod::Performance => {
            ordered.sort_by(|a, b| {
                context
                    .points(b)
                    .cmp(&context.points(a))
                    .then_with(|| by_score_desc(skill(context, a), skill(context, b), a, b))
            });
        }
        SeedingMethod::Hybrid => {
            let weight = hybrid_skill_weight.clamp(0.0, 1.0);
            let scores = hybrid_scores(context, &ordered, weight);
            let mut indexed: Vec<(CompetitorId, f64)> = ordered.into_iter().zip(scores).collect();
            indexed.sort_by(|(a, x), (b, y)| by_score_desc(*x, *y, a, b));
            ordered = indexed.into_iter().map(|(id, _)| id).collect();
        }
        SeedingMethod::Random => {
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            ordered.shuffle(&mut rng);
        }
    }
    ordered
}

fn skill(context: &TournamentContext, competitor: &str) -> f64 {
    context
        .seeded_belief(competitor)
        .map(|belief| belief.conservative_estimate())
        .or_else(|| context.rating(competitor).ok().map(|r| r.conservative_estimate()))
        .unwrap_or(f64::MIN)
}

fn by_score_desc(x: f64, y: f64, a: &str, b: &str) -> Ordering {
    y.total_cmp(&x).then_with(|| a.cmp(b))
}

fn hybrid_scores(context: &TournamentContext, competitors: &[CompetitorId], skill_weight: f64) -> Vec<f64> {
    let skills: Vec<f64> = competitors.iter().map(|id| skill(context, id)).collect();
    let points: Vec<f64> = competitors.iter().map(|id| context.points(id) as f64).collect();
    let skills = normalise(&skills);
    let points = normalise(&points);
    skills
        .iter()
        .zip(points.iter())
        .map(|(s, p)| skill_weight * s + (1.0 - skill_weight) * p)
        .collect()
}

/// Min-max scaling; a flat field maps to all zeros.
fn normalise(values: &[f64]) -> Vec<f64> {
    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let span = max - min;
    if !span.is_finite() || span <= f64::EPSILON {
        return vec![0.0; values.len()];
    }
    values.iter().map(|value| (value - min) / span).collect()
}

/// Standard bracket slot order for `size` (a power of two): seed 1 meets
/// `size`, and the top two seeds can only meet in the final.
pub fn bracket_order(size: usize) -> Vec<usize> {
    let mut order = vec![1];
    while order.len() < size {
        let next_len = order.len() * 2;
        order = order
            .iter()
            .flat_map(|&seed| [seed, next_len + 1 - seed])
            .collect();
    }
    order
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::settings::{EngineConfig, PairingSettings};
    use crate::pairing::TournamentFormat;
    use crate::rating::{Belief, CompetitorRating, Outcome};

    fn field() -> TournamentContext {
        let config = EngineConfig::default();
        let ratings = [("a", 1400.0), ("b", 1800.0), ("c", 1600.0), ("d", 1200.0)]
            .iter()
            .map(|(id, mean)| CompetitorRating::with_belief(*id, Belief::new(*mean, 100.0), &config))
            .collect();
        TournamentContext::new("seeds", TournamentFormat::SingleElimination, ratings, PairingSettings::default())
            .unwrap()
    }

    fn ids(ctx: &TournamentContext) -> Vec<CompetitorId> {
        ctx.roster().to_vec()
    }

    #[test]
    fn test_skill_seeding_orders_by_entry_rating() {
        let ctx = field();
        let order = seed_order(&ctx, &ids(&ctx), SeedingMethod::Skill, 0.7, 0);
        assert_eq!(order, vec!["b", "c", "a", "d"]);
    }

    #[test]
    fn test_performance_seeding_prefers_points() {
        let mut ctx = field();
        ctx.record_result("d", "b", Outcome::Win, None, None).unwrap();
        let order = seed_order(&ctx, &ids(&ctx), SeedingMethod::Performance, 0.7, 0);
        assert_eq!(order[0], "d");
        assert_eq!(order[1..], ["b", "c", "a"]);
    }

    #[test]
    fn test_hybrid_blends_skill_and_points() {
        let mut ctx = field();
        ctx.record_result("d", "b", Outcome::Win, None, None).unwrap();

        // all skill keeps b on top, all points puts d there
        assert_eq!(seed_order(&ctx, &ids(&ctx), SeedingMethod::Hybrid, 1.0, 0)[0], "b");
        assert_eq!(seed_order(&ctx, &ids(&ctx), SeedingMethod::Hybrid, 0.0, 0)[0], "d");
    }

    #[test]
    fn test_random_seeding_is_reproducible() {
        let ctx = field();
        let first = seed_order(&ctx, &ids(&ctx), SeedingMethod::Random, 0.7, 42);
        let again = seed_order(&ctx, &ids(&ctx), SeedingMethod::Random, 0.7, 42);
        assert_eq!(first, again);

        let mut sorted = first.clone();
        sorted.sort();
        assert_eq!(sorted, vec!["a", "b", "c", "d"]);
    }

    #[test]
    fn test_bracket_order_keeps_top_seeds_apart() {
        assert_eq!(bracket_order(1), vec![1]);
        assert_eq!(bracket_order(2), vec![1, 2]);
        assert_eq!(bracket_order(4), vec![1, 4, 2, 3]);
        assert_eq!(bracket_order(8), vec![1, 8, 4, 5, 2, 7, 3, 6]);
    }
}
