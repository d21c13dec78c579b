use std::collections::HashMap;

use chrono::{DateTime, Utc};

use crate::matchmaking::{
    MatchPreferences, MatchQuality, MatchQualityScorer, QualityCache, QualityContext, QualityKey,
};
use crate::rating::CompetitorId;
use crate::tournament::TournamentContext;

/// Match quality lookups for pairing generation, memoised per round.
pub struct PairingScorer<'a> {
    scorer: &'a MatchQualityScorer<'a>,
    cache: &'a mut QualityCache,
    preferences: &'a HashMap<CompetitorId, MatchPreferences>,
    now: DateTime<Utc>,
}

impl<'a> PairingScorer<'a> {
    pub fn new(
        scorer: &'a MatchQualityScorer<'a>,
        cache: &'a mut QualityCache,
        preferences: &'a HashMap<CompetitorId, MatchPreferences>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            scorer,
            cache,
            preferences,
            now,
        }
    }

    /// Quality of `a` facing `b` in `round`, or `None` if either is not
    /// registered in the tournament.
    pub fn quality(
        &mut self,
        context: &TournamentContext,
        a: &str,
        b: &str,
        round: u32,
    ) -> Option<MatchQuality> {
        let rating_a = context.rating(a).ok()?;
        let rating_b = context.rating(b).ok()?;
        let key = QualityKey::new(&context.id, a, b, round);

        let scorer = self.scorer;
        let all_preferences = self.preferences;
        let preferences = all_preferences.get(a);
        let quality_context = QualityContext::at(self.now)
            .in_round(round, context.prior_meetings(a, b))
            .with_archetypes(context.declared_archetype(a), context.declared_archetype(b))
            .with_preferences(preferences);

        Some(
            self.cache
                .get_or_insert_with(key, || scorer.score(rating_a, rating_b, &quality_context)),
        )
    }

    pub fn score(&mut self, context: &TournamentContext, a: &str, b: &str, round: u32) -> f64 {
        self.quality(context, a, b, round)
            .map(|quality| quality.score)
            .unwrap_or(0.0)
    }
}
