use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use log::{debug, info};

use crate::config::settings::{EngineConfig, PairingSettings};
use crate::domain::achievements::unlock_new;
use crate::domain::{CompetitorResult, MatchOutcomeEvent, MatchResultSummary};
use crate::errors::{EngineError, EngineResult};
use crate::matchmaking::{
    ArchetypeMatrix, CancellationToken, Clock, MatchPreferences, MatchQuality, MatchQualityScorer,
    OpponentSearch, QualityCache, QualityContext, QualityKey, SearchOutcome, run_search,
};
use crate::pairing::{self, PairingOptions, PairingOutcome, PairingScorer, TournamentFormat};
use crate::rating::{
    self, Belief, CompetitorId, CompetitorRating, DynamicWeight, MatchRecord, Outcome,
    PlaystyleObservation, RatingUpdate, WeightContext, calculate_dynamic_weight, detect_transition,
};
use crate::season::{self, DecayReport, SeasonArchive, SeasonContext};
use crate::tournament::{RankedCompetitor, StandingRow, TournamentContext, rank_ratings, score_table};

// Cache namespace for qualities computed outside any tournament.
const LADDER: &str = "";

fn unknown_tournament(tournament_id: &str) -> EngineError {
    EngineError::invalid_config(format!("unknown tournament '{tournament_id}'"))
}

/// Owns the global ladder ratings, open tournaments and the current season.
///
/// Every mutation goes through `&mut self`, so one service instance is the
/// single writer for the ratings it holds.
pub struct RankingService {
    config: EngineConfig,
    matrix: ArchetypeMatrix,
    ratings: HashMap<CompetitorId, CompetitorRating>,
    tournaments: HashMap<String, TournamentContext>,
    preferences: HashMap<CompetitorId, MatchPreferences>,
    cache: QualityCache,
    season: SeasonContext,
}

impl RankingService {
    pub fn new(config: EngineConfig) -> EngineResult<Self> {
        let season = SeasonContext::first(Utc::now(), &config.season);
        Self::restore(config, Vec::new(), season)
    }

    /// Rebuilds the service from persisted ratings and season state.
    pub fn restore(
        config: EngineConfig,
        ratings: Vec<CompetitorRating>,
        season: SeasonContext,
    ) -> EngineResult<Self> {
        config.validate()?;
        let ratings = ratings
            .into_iter()
            .map(|mut rating| {
                rating.refresh(&config);
                (rating.id.clone(), rating)
            })
            .collect();

        Ok(Self {
            config,
            matrix: ArchetypeMatrix::default(),
            ratings,
            tournaments: HashMap::new(),
            preferences: HashMap::new(),
            cache: QualityCache::new(),
            season,
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn season(&self) -> &SeasonContext {
        &self.season
    }

    pub fn cache(&self) -> &QualityCache {
        &self.cache
    }

    pub fn set_archetype_matrix(&mut self, matrix: ArchetypeMatrix) {
        self.matrix = matrix;
        self.cache.clear();
    }

    /// Returns the competitor's rating, creating a default one on first sight.
    pub fn register(&mut self, competitor: &str) -> &CompetitorRating {
        let config = &self.config;
        self.ratings.entry(competitor.to_string()).or_insert_with(|| {
            info!("Registered {}", competitor);
            CompetitorRating::new(competitor, config)
        })
    }

    pub fn rating(&self, competitor: &str) -> EngineResult<&CompetitorRating> {
        self.ratings
            .get(competitor)
            .ok_or_else(|| EngineError::unknown(competitor))
    }

    pub fn ratings(&self) -> impl Iterator<Item = &CompetitorRating> {
        self.ratings.values()
    }

    pub fn set_preferences(&mut self, competitor: &str, preferences: MatchPreferences) -> EngineResult<()> {
        self.rating(competitor)?;
        self.cache.invalidate_competitor(competitor);
        self.preferences.insert(competitor.to_string(), preferences);
        Ok(())
    }

    pub fn tournament(&self, tournament_id: &str) -> EngineResult<&TournamentContext> {
        self.tournaments
            .get(tournament_id)
            .ok_or_else(|| unknown_tournament(tournament_id))
    }

    /// Rates one finished match and returns what changed for both sides.
    ///
    /// Events naming an open tournament update that tournament's rating copies
    /// and standings. Anything else, including events tagged with a tournament
    /// this service does not run, updates the ladder ratings directly.
    pub fn process_match_result(&mut self, event: &MatchOutcomeEvent) -> EngineResult<MatchResultSummary> {
        if event.competitor_a == event.competitor_b {
            return Err(EngineError::invalid_config(format!(
                "{} cannot play against themselves",
                event.competitor_a
            )));
        }
        let now = event.played_at.unwrap_or_else(Utc::now);
        let managed = event
            .tournament_id
            .as_deref()
            .filter(|tournament_id| self.tournaments.contains_key(*tournament_id));

        let (mut a, mut b) = match managed {
            Some(tournament_id) => {
                let context = self.tournament(tournament_id)?;
                (
                    context.rating(&event.competitor_a)?.clone(),
                    context.rating(&event.competitor_b)?.clone(),
                )
            }
            None => {
                if let Some(tournament_id) = &event.tournament_id {
                    debug!("Tournament {} is not open here; rating on the ladder", tournament_id);
                }
                let a = self.register(&event.competitor_a).clone();
                let b = self.register(&event.competitor_b).clone();
                (a, b)
            }
        };

        let (result_a, result_b, update) = rate_match(&mut a, &mut b, event, now, &self.config);

        match managed {
            Some(tournament_id) => {
                let context = self
                    .tournaments
                    .get_mut(tournament_id)
                    .ok_or_else(|| unknown_tournament(tournament_id))?;
                let games = match (event.metrics.games_won_a, event.metrics.games_won_b) {
                    (Some(won), Some(lost)) => Some((won, lost)),
                    _ => None,
                };
                context.record_result(&a.id, &b.id, event.result, games, event.round)?;
                *context.rating_mut(&event.competitor_a)? = a;
                *context.rating_mut(&event.competitor_b)? = b;
            }
            None => {
                self.ratings.insert(a.id.clone(), a);
                self.ratings.insert(b.id.clone(), b);
            }
        }

        self.cache.invalidate_competitor(&event.competitor_a);
        self.cache.invalidate_competitor(&event.competitor_b);
        let upset = self.season.record_surprise(update.surprise, &self.config.season);

        info!(
            "{} {} {} ({:+.1} / {:+.1}){}",
            event.competitor_a,
            event.result.as_str(),
            event.competitor_b,
            result_a.rating_delta,
            result_b.rating_delta,
            if upset { " upset" } else { "" }
        );
        Ok(MatchResultSummary {
            competitor_a: result_a,
            competitor_b: result_b,
            win_probability: update.win_probability,
            surprise: update.surprise,
        })
    }

    /// Quality of `a` facing `b`, on the ladder or inside a tournament.
    pub fn get_match_quality(
        &mut self,
        a: &str,
        b: &str,
        tournament_id: Option<&str>,
    ) -> EngineResult<MatchQuality> {
        let now = Utc::now();
        let scorer = MatchQualityScorer::new(&self.config, &self.matrix)?;

        match tournament_id {
            Some(tournament_id) => {
                let context = self
                    .tournaments
                    .get(tournament_id)
                    .ok_or_else(|| unknown_tournament(tournament_id))?;
                context.rating(a)?;
                context.rating(b)?;
                let round = context.rounds().last().map_or(1, |round| round.number + 1);
                let mut pairing_scorer =
                    PairingScorer::new(&scorer, &mut self.cache, &self.preferences, now);
                pairing_scorer
                    .quality(context, a, b, round)
                    .ok_or_else(|| EngineError::unknown_in(a, tournament_id))
            }
            None => {
                let rating_a = self.ratings.get(a).ok_or_else(|| EngineError::unknown(a))?;
                let rating_b = self.ratings.get(b).ok_or_else(|| EngineError::unknown(b))?;
                let context = QualityContext::at(now)
                    .with_archetypes(main_archetype(rating_a), main_archetype(rating_b))
                    .with_preferences(self.preferences.get(a));
                Ok(self
                    .cache
                    .get_or_insert_with(QualityKey::new(LADDER, a, b, 0), || {
                        scorer.score(rating_a, rating_b, &context)
                    }))
            }
        }
    }

    /// Opens a tournament over copies of the entrants' ladder ratings.
    /// Entrants without a rating are registered first.
    pub fn create_tournament(
        &mut self,
        tournament_id: &str,
        format: TournamentFormat,
        entrants: &[CompetitorId],
        settings: Option<PairingSettings>,
    ) -> EngineResult<&TournamentContext> {
        if self.tournaments.contains_key(tournament_id) {
            return Err(EngineError::invalid_config(format!(
                "tournament '{tournament_id}' already exists"
            )));
        }
        let seeded: Vec<CompetitorRating> = entrants
            .iter()
            .map(|entrant| self.register(entrant).clone())
            .collect();
        let settings = settings.unwrap_or_else(|| self.config.pairing.clone());
        let context = TournamentContext::new(tournament_id, format, seeded, settings)?;
        Ok(self
            .tournaments
            .entry(tournament_id.to_string())
            .or_insert(context))
    }

    pub fn declare_archetype(&mut self, tournament_id: &str, competitor: &str, archetype: &str) -> EngineResult<()> {
        let context = self
            .tournaments
            .get_mut(tournament_id)
            .ok_or_else(|| unknown_tournament(tournament_id))?;
        context.declare_archetype(competitor, archetype)?;
        self.cache.invalidate_competitor(competitor);
        Ok(())
    }

    /// Generates and installs `round` for the tournament.
    pub fn generate_pairings(
        &mut self,
        tournament_id: &str,
        round: u32,
        available: &[CompetitorId],
        options: &PairingOptions,
    ) -> EngineResult<PairingOutcome> {
        if round == 0 {
            return Err(EngineError::invalid_config("rounds are numbered from 1"));
        }
        let context = self
            .tournaments
            .get(tournament_id)
            .ok_or_else(|| unknown_tournament(tournament_id))?;
        if let Some(stranger) = available.iter().find(|id| !context.contains(id)) {
            return Err(EngineError::unknown_in(stranger, tournament_id));
        }
        let distinct = available.iter().collect::<HashSet<_>>().len();
        if distinct < 2 {
            return Err(EngineError::InsufficientCompetitors {
                tournament_id: tournament_id.to_string(),
                round: Some(round),
                available: distinct,
            });
        }

        let scorer = MatchQualityScorer::new(&self.config, &self.matrix)?;
        let mut pairing_scorer = PairingScorer::new(&scorer, &mut self.cache, &self.preferences, Utc::now());
        let outcome = pairing::generate(context, round, available, options, &mut pairing_scorer);

        if !outcome.pairings.is_empty() {
            self.tournaments
                .get_mut(tournament_id)
                .ok_or_else(|| unknown_tournament(tournament_id))?
                .install_round(round, outcome.pairings.clone())?;
        }
        Ok(outcome)
    }

    /// Tournament entrants ranked by conservative estimate.
    pub fn get_standings(&self, tournament_id: &str) -> EngineResult<Vec<RankedCompetitor>> {
        Ok(rank_ratings(self.tournament(tournament_id)?.ratings()))
    }

    /// Point table with tiebreakers for a tournament.
    pub fn score_table(&self, tournament_id: &str) -> EngineResult<Vec<StandingRow>> {
        Ok(score_table(self.tournament(tournament_id)?))
    }

    /// Every ladder rating, ranked.
    pub fn ladder(&self) -> Vec<RankedCompetitor> {
        rank_ratings(self.ratings.values())
    }

    /// Closes a tournament and folds its rating movement into the ladder.
    ///
    /// Each entrant's ladder mean moves by the tournament's mean delta and its
    /// deviation is scaled by the tournament's deviation ratio; the matches
    /// played are replayed into the ladder counters and history.
    pub fn reconcile_tournament(&mut self, tournament_id: &str) -> EngineResult<Vec<CompetitorId>> {
        let context = self
            .tournaments
            .remove(tournament_id)
            .ok_or_else(|| unknown_tournament(tournament_id))?;
        self.cache.invalidate_tournament(tournament_id);

        let config = &self.config;
        let mut updated = Vec::new();
        for rating in context.ratings() {
            let Some(seeded) = context.seeded_belief(&rating.id) else {
                continue;
            };
            let ladder = self
                .ratings
                .entry(rating.id.clone())
                .or_insert_with(|| CompetitorRating::with_belief(&rating.id, seeded, config));

            let before = ladder.belief();
            for record in context.tournament_history(&rating.id) {
                ladder.record_match(record, config);
            }
            let deviation_ratio = if seeded.deviation > 0.0 {
                rating.deviation() / seeded.deviation
            } else {
                1.0
            };
            ladder.set_belief(
                Belief::new(
                    before.mean + (rating.mean() - seeded.mean),
                    before.deviation * deviation_ratio,
                ),
                config,
            );
            ladder.playstyle = rating.playstyle;
            ladder.archetypes = rating.archetypes.clone();
            ladder.achievements.extend(rating.achievements.iter().copied());

            self.cache.invalidate_competitor(&rating.id);
            updated.push(rating.id.clone());
        }

        info!("Tournament {} reconciled into {} ladder ratings", tournament_id, updated.len());
        Ok(updated)
    }

    /// Archives the season, soft-resets every ladder rating and starts the next season.
    pub fn roll_over_season(&mut self, now: DateTime<Utc>) -> SeasonArchive {
        let (archive, next) = season::roll_over(&self.season, self.ratings.values_mut(), now, &self.config);
        self.season = next;
        self.cache.clear();
        archive
    }

    /// Rolls over only once the current season has ended.
    pub fn roll_over_if_due(&mut self, now: DateTime<Utc>) -> Option<SeasonArchive> {
        if self.season.is_over(now) {
            Some(self.roll_over_season(now))
        } else {
            None
        }
    }

    pub fn apply_decay(&mut self, now: DateTime<Utc>) -> Vec<DecayReport> {
        let mut ids: Vec<CompetitorId> = self.ratings.keys().cloned().collect();
        ids.sort();

        let mut reports = Vec::new();
        for id in ids {
            let Some(rating) = self.ratings.get_mut(&id) else {
                continue;
            };
            if let Some(report) = season::apply_decay(rating, now, &self.config) {
                self.cache.invalidate_competitor(&id);
                reports.push(report);
            }
        }
        info!("Decay applied to {} ratings", reports.len());
        reports
    }

    /// Open-queue search for `seeker` among `queue`, polled on `clock`.
    pub async fn find_opponent(
        &self,
        seeker: &str,
        queue: &[CompetitorId],
        clock: &dyn Clock,
        token: &CancellationToken,
    ) -> EngineResult<SearchOutcome> {
        self.rating(seeker)?;
        let scorer = MatchQualityScorer::new(&self.config, &self.matrix)?;
        let search = OpponentSearch::begin(seeker, self.config.search.clone(), clock);
        let snapshot = || -> EngineResult<(CompetitorRating, Vec<CompetitorRating>)> {
            let me = self.rating(seeker)?.clone();
            let pool = queue
                .iter()
                .filter_map(|id| self.ratings.get(id))
                .cloned()
                .collect();
            Ok((me, pool))
        };
        run_search(search, snapshot, &scorer, clock, token).await
    }
}

/// Most-played archetype, if any has been recorded.
fn main_archetype(rating: &CompetitorRating) -> Option<&str> {
    rating
        .archetypes
        .iter()
        .max_by(|x, y| {
            x.matches_played()
                .cmp(&y.matches_played())
                .then_with(|| y.archetype.cmp(&x.archetype))
        })
        .map(|record| record.archetype.as_str())
}

/// One side's view of a match.
struct Side<'e> {
    opponent: &'e str,
    outcome: Outcome,
    archetype: Option<&'e str>,
    playstyle: &'e PlaystyleObservation,
}

fn side_weight(rating: &CompetitorRating, event: &MatchOutcomeEvent, config: &EngineConfig) -> DynamicWeight {
    calculate_dynamic_weight(
        &WeightContext {
            in_tournament: event.tournament_id.is_some(),
            stage: event.stage,
            high_stakes: event.high_stakes,
            experience_level: rating.experience_level,
            deviation: rating.deviation(),
            initial_deviation: config.rating.initial_deviation,
        },
        &config.weight,
    )
}

/// Updates both ratings in place. Each side is updated from its own
/// perspective with its own weight, against the other's prior belief.
fn rate_match(
    a: &mut CompetitorRating,
    b: &mut CompetitorRating,
    event: &MatchOutcomeEvent,
    now: DateTime<Utc>,
    config: &EngineConfig,
) -> (CompetitorResult, CompetitorResult, RatingUpdate) {
    let prior_a = a.belief();
    let prior_b = b.belief();
    let weight_a = side_weight(a, event, config);
    let weight_b = side_weight(b, event, config);

    let update_a = rating::update(&prior_a, &prior_b, event.result, weight_a.multiplier, &config.rating);
    let update_b = rating::update(
        &prior_b,
        &prior_a,
        event.result.reversed(),
        weight_b.multiplier,
        &config.rating,
    );

    let side_a = Side {
        opponent: &event.competitor_b,
        outcome: event.result,
        archetype: event.metrics.archetype_a.as_deref(),
        playstyle: &event.metrics.playstyle_a,
    };
    let side_b = Side {
        opponent: &event.competitor_a,
        outcome: event.result.reversed(),
        archetype: event.metrics.archetype_b.as_deref(),
        playstyle: &event.metrics.playstyle_b,
    };

    let result_a = apply_side(a, &side_a, update_a.player, &prior_b, weight_a, event, now, config);
    let result_b = apply_side(b, &side_b, update_b.player, &prior_a, weight_b, event, now, config);
    (result_a, result_b, update_a)
}

#[allow(clippy::too_many_arguments)]
fn apply_side(
    rating: &mut CompetitorRating,
    side: &Side<'_>,
    posterior: Belief,
    opponent_prior: &Belief,
    weight: DynamicWeight,
    event: &MatchOutcomeEvent,
    now: DateTime<Utc>,
    config: &EngineConfig,
) -> CompetitorResult {
    let before = rating.belief();
    let classification_before = rating.classification().clone();
    rating.set_belief(posterior, config);

    if let Some(archetype) = side.archetype {
        let record = rating.archetype_mut(archetype, config);
        let sub_rating = rating::update(
            &Belief::new(record.mean, record.deviation),
            opponent_prior,
            side.outcome,
            weight.multiplier,
            &config.rating,
        );
        record.mean = sub_rating.player.mean;
        record.deviation = sub_rating.player.deviation;
        record.record(side.outcome);
    }
    rating
        .playstyle
        .blend(side.playstyle, config.rating.playstyle_learning_rate);

    rating.record_match(
        MatchRecord {
            opponent_id: side.opponent.to_string(),
            outcome: side.outcome,
            rating_before: before.mean,
            rating_after: rating.mean(),
            timestamp: now,
            tournament_id: event.tournament_id.clone(),
            round: event.round,
            stage: event.stage,
        },
        config,
    );

    let achievements = unlock_new(rating, config);
    let transition = detect_transition(&classification_before, rating.classification());
    if let Some(transition) = transition {
        info!("  → {} {:?}: now {} {:?}", rating.id, transition, rating.tier().as_str(), rating.band());
    }
    for achievement in &achievements {
        info!("  → {} unlocked {}", rating.id, achievement.title());
    }

    let classification = rating.classification();
    CompetitorResult {
        competitor_id: rating.id.clone(),
        rating_delta: rating.mean() - before.mean,
        new_mean: rating.mean(),
        new_deviation: rating.deviation(),
        new_conservative: rating.conservative_estimate(),
        new_tier: classification.tier,
        new_band: classification.band,
        division_points: classification.division_points,
        k_factor: weight.k_factor,
        transition,
        achievements,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Achievement;
    use crate::matchmaking::VirtualClock;
    use crate::rating::Tier;
    use chrono::Duration;

    fn service() -> RankingService {
        RankingService::new(EngineConfig::default()).unwrap()
    }

    fn ids(names: &[&str]) -> Vec<CompetitorId> {
        names.iter().map(|name| name.to_string()).collect()
    }

    #[test]
    fn test_first_match_registers_and_moves_both_sides() {
        let mut service = service();
        let summary = service
            .process_match_result(&MatchOutcomeEvent::new("alice", "bob", Outcome::Win))
            .unwrap();

        assert!(summary.competitor_a.rating_delta > 0.0);
        assert!(summary.competitor_b.rating_delta < 0.0);
        assert!((summary.win_probability - 0.5).abs() < 1e-9);
        assert!((summary.surprise - 0.5).abs() < 1e-9);
        assert_eq!(summary.competitor_a.achievements, vec![Achievement::FirstVictory]);

        let alice = service.rating("alice").unwrap();
        assert_eq!(alice.wins, 1);
        assert!(alice.deviation() < 350.0);
        assert_eq!(service.rating("bob").unwrap().losses, 1);
        assert_eq!(service.season().analytics.matches_processed, 1);
    }

    #[test]
    fn test_self_match_is_rejected() {
        let mut service = service();
        let err = service
            .process_match_result(&MatchOutcomeEvent::new("alice", "alice", Outcome::Draw))
            .unwrap_err();
        assert!(matches!(err, EngineError::InvalidFormatConfiguration { .. }));
    }

    #[test]
    fn test_archetype_and_playstyle_metrics_are_applied() {
        let mut service = service();
        let mut event = MatchOutcomeEvent::new("alice", "bob", Outcome::Win);
        event.metrics.archetype_a = Some("Aggro".into());
        event.metrics.playstyle_a.aggression = Some(1.0);
        service.process_match_result(&event).unwrap();

        let alice = service.rating("alice").unwrap();
        let aggro = alice.archetype("Aggro").unwrap();
        assert_eq!(aggro.wins, 1);
        assert!(aggro.mean > 1500.0);
        assert!((alice.playstyle.aggression - 0.6).abs() < 1e-9);
    }

    #[test]
    fn test_quality_cache_is_invalidated_by_results() {
        let mut service = service();
        service.register("alice");
        service.register("bob");
        service.register("carol");

        service.get_match_quality("alice", "bob", None).unwrap();
        service.get_match_quality("alice", "carol", None).unwrap();
        assert_eq!(service.cache().len(), 2);

        service
            .process_match_result(&MatchOutcomeEvent::new("alice", "bob", Outcome::Win))
            .unwrap();
        assert_eq!(service.cache().len(), 0);
    }

    #[test]
    fn test_quality_for_unknown_competitor() {
        let mut service = service();
        service.register("alice");
        assert_eq!(
            service.get_match_quality("alice", "ghost", None).unwrap_err(),
            EngineError::unknown("ghost")
        );
    }

    #[test]
    fn test_pairing_requires_two_available() {
        let mut service = service();
        service
            .create_tournament("cup", TournamentFormat::Swiss, &ids(&["a", "b", "c"]), None)
            .unwrap();

        let err = service
            .generate_pairings("cup", 1, &ids(&["a", "a"]), &PairingOptions::default())
            .unwrap_err();
        assert_eq!(
            err,
            EngineError::InsufficientCompetitors {
                tournament_id: "cup".into(),
                round: Some(1),
                available: 1,
            }
        );

        let err = service
            .generate_pairings("cup", 1, &ids(&["a", "zed"]), &PairingOptions::default())
            .unwrap_err();
        assert_eq!(err, EngineError::unknown_in("zed", "cup"));
    }

    #[test]
    fn test_tournament_results_stay_isolated_until_reconciled() {
        let mut service = service();
        let entrants = ids(&["a", "b"]);
        service
            .create_tournament("cup", TournamentFormat::RoundRobin, &entrants, None)
            .unwrap();
        service
            .generate_pairings("cup", 1, &entrants, &PairingOptions::default())
            .unwrap();
        service
            .process_match_result(&MatchOutcomeEvent::new("a", "b", Outcome::Win).in_tournament("cup", 1))
            .unwrap();

        assert_eq!(service.rating("a").unwrap().matches_played, 0);
        let in_cup = service.tournament("cup").unwrap().rating("a").unwrap().mean();
        assert!(in_cup > 1500.0);
        assert_eq!(service.tournament("cup").unwrap().points("a"), 3);
        assert!(service.tournament("cup").unwrap().round(1).unwrap().is_finished());

        let updated = service.reconcile_tournament("cup").unwrap();
        assert_eq!(updated.len(), 2);
        let a = service.rating("a").unwrap();
        assert!((a.mean() - in_cup).abs() < 1e-9);
        assert_eq!(a.matches_played, 1);
        assert!(service.tournament("cup").is_err());
    }

    #[test]
    fn test_unmanaged_tournament_events_rate_the_ladder_with_tournament_weight() {
        let mut ladder = service();
        let casual = ladder
            .process_match_result(&MatchOutcomeEvent::new("a", "b", Outcome::Win))
            .unwrap();

        let mut external = service();
        let event = MatchOutcomeEvent::new("a", "b", Outcome::Win).in_tournament("elsewhere", 2);
        let rated = external.process_match_result(&event).unwrap();

        assert_eq!(external.rating("a").unwrap().matches_played, 1);
        assert!(rated.competitor_a.k_factor > casual.competitor_a.k_factor);
    }

    #[test]
    fn test_season_rollover_soft_resets_ladder() {
        let config = EngineConfig::default();
        let strong = CompetitorRating::with_belief("strong", Belief::new(2600.0, 80.0), &config);
        let season = SeasonContext::first(Utc::now(), &config.season);
        let mut service = RankingService::restore(config, vec![strong], season).unwrap();

        assert!(service.roll_over_if_due(Utc::now()).is_none());
        let archive = service
            .roll_over_if_due(Utc::now() + Duration::days(91))
            .unwrap();

        assert_eq!(archive.ratings[0].tier, Tier::Platinum);
        assert_eq!(service.season().number, 2);
        assert!((service.rating("strong").unwrap().mean() - 2270.0).abs() < 1e-9);
    }

    #[test]
    fn test_decay_only_touches_inactive() {
        let mut service = service();
        let now = Utc::now();
        let mut event = MatchOutcomeEvent::new("old", "recent", Outcome::Draw);
        event.played_at = Some(now - Duration::days(40));
        service.process_match_result(&event).unwrap();
        let mut event = MatchOutcomeEvent::new("recent", "other", Outcome::Draw);
        event.played_at = Some(now - Duration::days(1));
        service.process_match_result(&event).unwrap();

        let reports = service.apply_decay(now);
        let decayed: Vec<_> = reports.iter().map(|r| r.competitor_id.as_str()).collect();
        assert_eq!(decayed, vec!["old"]);
        assert_eq!(reports[0].weeks_charged, 5);
    }

    #[tokio::test]
    async fn test_find_opponent_matches_close_rival() {
        let mut config = EngineConfig::default();
        config.search.quality_threshold = 0.0;
        let ratings = vec![
            CompetitorRating::with_belief("seeker", Belief::new(1500.0, 60.0), &config),
            CompetitorRating::with_belief("rival", Belief::new(1520.0, 60.0), &config),
            CompetitorRating::with_belief("far", Belief::new(2300.0, 60.0), &config),
        ];
        let season = SeasonContext::first(Utc::now(), &config.season);
        let service = RankingService::restore(config, ratings, season).unwrap();
        let clock = VirtualClock::new();

        let outcome = service
            .find_opponent("seeker", &ids(&["rival", "far"]), &clock, &CancellationToken::new())
            .await
            .unwrap();
        match outcome {
            SearchOutcome::Matched { opponent, .. } => assert_eq!(opponent, "rival"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_find_opponent_times_out_with_nobody_in_reach() {
        let config = EngineConfig::default();
        let ratings = vec![
            CompetitorRating::with_belief("seeker", Belief::new(1500.0, 60.0), &config),
            CompetitorRating::with_belief("far", Belief::new(2600.0, 60.0), &config),
        ];
        let season = SeasonContext::first(Utc::now(), &config.season);
        let service = RankingService::restore(config, ratings, season).unwrap();
        let clock = VirtualClock::new();

        let err = service
            .find_opponent("seeker", &ids(&["far"]), &clock, &CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::MatchmakingTimeout { ref competitor_id, .. } if competitor_id == "seeker"));
        assert!(err.is_retryable());
    }
}
